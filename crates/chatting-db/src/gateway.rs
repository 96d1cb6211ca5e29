//! The persistence boundary consumed by the data generator.
//!
//! Only the operations the generator needs are exposed here; the rest of
//! the CRUD surface stays as inherent methods on [`Database`].

use uuid::Uuid;

use chatting_types::models::DEFAULT_MESSAGE_TYPE;
use chatting_types::{Contact, Conversation, Message, Participant, Role, User};

use crate::Database;
use crate::error::Result;

/// Parameters for a new message row.
#[derive(Debug, Clone)]
pub struct NewMessage<'a> {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: &'a str,
    pub message_type: &'a str,
    pub reply_to_id: Option<Uuid>,
}

impl<'a> NewMessage<'a> {
    /// A plain text message with no reply reference.
    pub fn text(conversation_id: Uuid, sender_id: Uuid, content: &'a str) -> Self {
        Self {
            conversation_id,
            sender_id,
            content,
            message_type: DEFAULT_MESSAGE_TYPE,
            reply_to_id: None,
        }
    }
}

/// Synchronous, single-attempt CRUD calls. Errors are returned as-is;
/// callers decide whether a [`DbError`](crate::DbError) is skippable.
pub trait Gateway: Send + Sync {
    fn create_user(&self, phone_number: &str, display_name: &str, bio: &str) -> Result<User>;

    fn add_contact(&self, user_id: Uuid, contact_id: Uuid, contact_name: &str) -> Result<Contact>;

    fn list_user_contacts(&self, user_id: Uuid) -> Result<Vec<Contact>>;

    fn create_conversation(
        &self,
        is_group: bool,
        title: Option<&str>,
        created_by: Uuid,
    ) -> Result<Conversation>;

    fn add_conversation_participant(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<Participant>;

    fn list_conversation_participants(&self, conversation_id: Uuid) -> Result<Vec<Participant>>;

    fn create_message(&self, msg: &NewMessage<'_>) -> Result<Message>;
}

impl Gateway for Database {
    fn create_user(&self, phone_number: &str, display_name: &str, bio: &str) -> Result<User> {
        Database::create_user(self, phone_number, display_name, bio)
    }

    fn add_contact(&self, user_id: Uuid, contact_id: Uuid, contact_name: &str) -> Result<Contact> {
        Database::add_contact(self, user_id, contact_id, contact_name)
    }

    fn list_user_contacts(&self, user_id: Uuid) -> Result<Vec<Contact>> {
        Database::list_user_contacts(self, user_id)
    }

    fn create_conversation(
        &self,
        is_group: bool,
        title: Option<&str>,
        created_by: Uuid,
    ) -> Result<Conversation> {
        Database::create_conversation(self, is_group, title, created_by)
    }

    fn add_conversation_participant(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<Participant> {
        Database::add_conversation_participant(self, conversation_id, user_id, role)
    }

    fn list_conversation_participants(&self, conversation_id: Uuid) -> Result<Vec<Participant>> {
        Database::list_conversation_participants(self, conversation_id)
    }

    fn create_message(&self, msg: &NewMessage<'_>) -> Result<Message> {
        Database::create_message(self, msg)
    }
}
