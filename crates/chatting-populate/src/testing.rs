//! Gateway double: a real in-memory database with switchable faults.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use uuid::Uuid;

use chatting_db::{Database, DbError, Gateway, NewMessage, Result};
use chatting_types::{Contact, Conversation, Message, Participant, Role, User};

pub(crate) struct ScriptedGateway {
    pub db: Database,
    /// The next N `create_user` calls fail as duplicate phone numbers.
    pub duplicate_users: AtomicUsize,
    /// The next N `add_contact` calls fail as already-existing edges.
    pub duplicate_contacts: AtomicUsize,
    pub break_users: AtomicBool,
    pub break_conversations: AtomicBool,
    pub break_participants: AtomicBool,
    pub break_messages: AtomicBool,
    seeded: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            db: Database::open_in_memory().expect("in-memory database"),
            duplicate_users: AtomicUsize::new(0),
            duplicate_contacts: AtomicUsize::new(0),
            break_users: AtomicBool::new(false),
            break_conversations: AtomicBool::new(false),
            break_participants: AtomicBool::new(false),
            break_messages: AtomicBool::new(false),
            seeded: AtomicUsize::new(0),
        }
    }

    /// `n` users created straight through the database.
    pub fn seed_users(&self, n: usize) -> Vec<User> {
        let first = self.seeded.fetch_add(n, Ordering::SeqCst);
        (first..first + n)
            .map(|i| {
                self.db
                    .create_user(&format!("+1555{:07}", i), &format!("Seed {}", i), "")
                    .expect("seed user")
            })
            .collect()
    }
}

fn broken(flag: &AtomicBool) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(DbError::LockPoisoned);
    }
    Ok(())
}

/// Decrement `budget` if it is non-zero, reporting whether it was.
fn take_one(budget: &AtomicUsize) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl Gateway for ScriptedGateway {
    fn create_user(&self, phone_number: &str, display_name: &str, bio: &str) -> Result<User> {
        broken(&self.break_users)?;
        if take_one(&self.duplicate_users) {
            return Err(DbError::Duplicate(format!("phone_number {}", phone_number)));
        }
        self.db.create_user(phone_number, display_name, bio)
    }

    fn add_contact(&self, user_id: Uuid, contact_id: Uuid, contact_name: &str) -> Result<Contact> {
        if take_one(&self.duplicate_contacts) {
            return Err(DbError::Duplicate(format!("contact {} -> {}", user_id, contact_id)));
        }
        self.db.add_contact(user_id, contact_id, contact_name)
    }

    fn list_user_contacts(&self, user_id: Uuid) -> Result<Vec<Contact>> {
        self.db.list_user_contacts(user_id)
    }

    fn create_conversation(
        &self,
        is_group: bool,
        title: Option<&str>,
        created_by: Uuid,
    ) -> Result<Conversation> {
        broken(&self.break_conversations)?;
        self.db.create_conversation(is_group, title, created_by)
    }

    fn add_conversation_participant(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<Participant> {
        broken(&self.break_participants)?;
        self.db.add_conversation_participant(conversation_id, user_id, role)
    }

    fn list_conversation_participants(&self, conversation_id: Uuid) -> Result<Vec<Participant>> {
        self.db.list_conversation_participants(conversation_id)
    }

    fn create_message(&self, msg: &NewMessage<'_>) -> Result<Message> {
        broken(&self.break_messages)?;
        self.db.create_message(msg)
    }
}
