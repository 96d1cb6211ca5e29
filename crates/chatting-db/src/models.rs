//! Database row types. These map directly to SQLite rows and are converted
//! into the `chatting-types` models at the crate boundary.

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use chatting_types::{Contact, Conversation, Message, Participant, Reaction, Role, User};

use crate::error::DbError;

pub struct UserRow {
    pub id: String,
    pub phone_number: String,
    pub display_name: String,
    pub bio: String,
    pub created_at: String,
}

pub struct ContactRow {
    pub user_id: String,
    pub contact_id: String,
    pub contact_name: String,
    pub added_at: String,
}

pub struct ConversationRow {
    pub id: String,
    pub is_group: bool,
    pub title: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

pub struct ParticipantRow {
    pub conversation_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub message_type: String,
    pub reply_to_id: Option<String>,
    pub created_at: String,
}

pub struct ReactionRow {
    pub message_id: String,
    pub user_id: String,
    pub reaction: String,
    pub reacted_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: parse_uuid(&row.id)?,
            phone_number: row.phone_number,
            display_name: row.display_name,
            bio: row.bio,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<ContactRow> for Contact {
    type Error = DbError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Contact {
            user_id: parse_uuid(&row.user_id)?,
            contact_id: parse_uuid(&row.contact_id)?,
            contact_name: row.contact_name,
            added_at: parse_timestamp(&row.added_at)?,
        })
    }
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = DbError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        Ok(Conversation {
            id: parse_uuid(&row.id)?,
            is_group: row.is_group,
            title: row.title,
            created_by: parse_uuid(&row.created_by)?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<ParticipantRow> for Participant {
    type Error = DbError;

    fn try_from(row: ParticipantRow) -> Result<Self, Self::Error> {
        Ok(Participant {
            conversation_id: parse_uuid(&row.conversation_id)?,
            user_id: parse_uuid(&row.user_id)?,
            role: row
                .role
                .parse::<Role>()
                .map_err(|e| DbError::Corrupt(e.to_string()))?,
            joined_at: parse_timestamp(&row.joined_at)?,
        })
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = DbError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Message {
            id: parse_uuid(&row.id)?,
            conversation_id: parse_uuid(&row.conversation_id)?,
            sender_id: parse_uuid(&row.sender_id)?,
            content: row.content,
            message_type: row.message_type,
            reply_to_id: row.reply_to_id.as_deref().map(parse_uuid).transpose()?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<ReactionRow> for Reaction {
    type Error = DbError;

    fn try_from(row: ReactionRow) -> Result<Self, Self::Error> {
        Ok(Reaction {
            message_id: parse_uuid(&row.message_id)?,
            user_id: parse_uuid(&row.user_id)?,
            reaction: row.reaction,
            reacted_at: parse_timestamp(&row.reacted_at)?,
        })
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, DbError> {
    raw.parse()
        .map_err(|e| DbError::Corrupt(format!("bad uuid '{}': {}", raw, e)))
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// RFC 3339 is accepted too for rows written by other tools.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| DbError::Corrupt(format!("bad timestamp '{}': {}", raw, e)))
}
