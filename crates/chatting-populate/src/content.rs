//! Synthetic message text: template + filler, canned sentences, and short
//! acknowledgements, picked with equal weight.

use std::ops::Range;

use rand::Rng;
use rand::seq::IndexedRandom;
use uuid::Uuid;

use chatting_types::Participant;

/// Messages per group conversation.
pub const GROUP_MESSAGES: Range<usize> = 20..70;
/// Messages per 1:1 conversation.
pub const DIRECT_MESSAGES: Range<usize> = 10..40;

/// Each template has exactly one `{}` slot.
const TEMPLATES: &[&str] = &[
    "Hey {}! How are you doing?",
    "Did you see {}?",
    "I'm running a bit late, be there {}!",
    "Thanks for your help with {}!",
    "What's everyone up to {}?",
    "Check out this {} I found!",
    "Happy {}! Hope you have an amazing day!",
    "Can't believe it's already been {}",
    "Just finished my {}, it was awesome!",
    "Anyone free to {}?",
    "Good morning! Ready for {}?",
    "That {} was incredible!",
    "Looking forward to {}",
    "Sorry I'm late to the {}",
    "Congratulations on {}!",
    "Let me know about {}",
    "Thinking about {}",
    "Excited for {}!",
    "Thanks again for {}",
    "How did {} go?",
];

const FILLERS: &[&str] = &[
    "today", "yesterday", "tomorrow", "this week", "this weekend",
    "the news", "that movie", "the game", "the meeting", "the party",
    "soon", "in a few minutes", "later", "after work", "tonight",
    "the project", "the presentation", "the homework", "the cooking", "the planning",
    "next week", "for lunch", "cool thing", "awesome article", "funny video",
    "interesting post", "great deal", "birthday", "anniversary", "graduation",
    "promotion", "holiday", "a week", "a month", "a year",
    "so long", "forever", "assignment", "workout", "meal",
    "trip", "chat", "hang out", "meet up", "call",
    "video call", "the day", "the interview", "the exam", "the workout",
    "experience", "concert", "show", "event", "performance",
    "the weekend", "vacation", "celebration", "conversation", "discussion",
    "gathering", "achievement", "success", "win", "milestone",
    "the details", "the plan", "the schedule", "the update", "the information",
    "you", "the future", "life", "everything", "the opportunity",
    "the adventure", "the challenge", "the journey", "your help", "the support",
    "your time", "the date",
];

const CANNED: &[&str] = &[
    "Hey! 👋",
    "Good morning! ☀️",
    "Good night! 🌙",
    "How are you?",
    "What's up?",
    "LOL 😂",
    "Thanks! 😊",
    "You're welcome!",
    "See you later!",
    "Take care!",
    "Awesome! 🎉",
    "Sounds good!",
    "I agree",
    "Perfect!",
    "Great idea!",
    "Looking forward to it",
    "Can't wait!",
    "So excited!",
    "That's amazing!",
    "Wow! 😮",
];

const SHORT: &[&str] = &[
    "👍", "👎", "❤️", "😂", "😊", "😢", "😮", "🎉", "🔥", "💯",
    "ok", "yes", "no", "maybe", "sure", "yep", "nope", "definitely",
    "absolutely", "probably", "I think so", "I don't think so",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStrategy {
    Template,
    Canned,
    Short,
}

impl ContentStrategy {
    pub const ALL: [ContentStrategy; 3] = [Self::Template, Self::Canned, Self::Short];

    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn body<R: Rng + ?Sized>(self, rng: &mut R) -> String {
        match self {
            Self::Template => {
                let template = pick(TEMPLATES, rng);
                template.replacen("{}", pick(FILLERS, rng), 1)
            }
            Self::Canned => pick(CANNED, rng).to_string(),
            Self::Short => pick(SHORT, rng).to_string(),
        }
    }
}

/// One message body using a uniformly chosen strategy.
pub fn message_body<R: Rng + ?Sized>(rng: &mut R) -> String {
    ContentStrategy::draw(rng).body(rng)
}

pub fn message_count<R: Rng + ?Sized>(is_group: bool, rng: &mut R) -> usize {
    if is_group {
        rng.random_range(GROUP_MESSAGES)
    } else {
        rng.random_range(DIRECT_MESSAGES)
    }
}

/// A message ready to be written: who sends it and what it says.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftMessage {
    pub sender_id: Uuid,
    pub content: String,
}

/// `count` messages, each from a uniformly chosen participant.
/// An empty participant list yields no messages.
pub fn draft_messages<R: Rng + ?Sized>(
    participants: &[Participant],
    count: usize,
    rng: &mut R,
) -> Vec<DraftMessage> {
    if participants.is_empty() {
        return Vec::new();
    }
    (0..count)
        .filter_map(|_| {
            let sender = participants.choose(rng)?;
            Some(DraftMessage {
                sender_id: sender.user_id,
                content: message_body(rng),
            })
        })
        .collect()
}

fn pick<R: Rng + ?Sized>(pool: &[&'static str], rng: &mut R) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}
