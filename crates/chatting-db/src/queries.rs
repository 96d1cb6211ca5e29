use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use chatting_types::{Contact, Conversation, Message, Participant, Reaction, Role, User};

use crate::Database;
use crate::error::{DbError, Result};
use crate::gateway::NewMessage;
use crate::models::{
    ContactRow, ConversationRow, MessageRow, ParticipantRow, ReactionRow, UserRow,
};

impl Database {
    // -- Users --

    pub fn create_user(&self, phone_number: &str, display_name: &str, bio: &str) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            let row = conn.query_row(
                "INSERT INTO users (id, phone_number, display_name, bio) VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, phone_number, display_name, bio, created_at",
                params![id, phone_number, display_name, bio],
                user_row,
            )?;
            User::try_from(row)
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, phone_number, display_name, bio, created_at FROM users WHERE id = ?1",
                [id.to_string()],
                user_row,
            )
            .optional()?
            .map(User::try_from)
            .transpose()
        })
    }

    pub fn get_user_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, phone_number, display_name, bio, created_at FROM users
                 WHERE phone_number = ?1",
                [phone_number],
                user_row,
            )
            .optional()?
            .map(User::try_from)
            .transpose()
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, phone_number, display_name, bio, created_at FROM users
                 ORDER BY created_at, rowid",
            )?;
            let rows = stmt.query_map([], user_row)?;
            convert_rows(rows)
        })
    }

    pub fn delete_user(&self, id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM users WHERE id = ?1", [id.to_string()])?;
            expect_affected(n, "user", id)
        })
    }

    // -- Contacts --

    pub fn add_contact(&self, user_id: Uuid, contact_id: Uuid, contact_name: &str) -> Result<Contact> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                "INSERT INTO contacts (user_id, contact_id, contact_name) VALUES (?1, ?2, ?3)
                 RETURNING user_id, contact_id, contact_name, added_at",
                params![user_id.to_string(), contact_id.to_string(), contact_name],
                contact_row,
            )?;
            Contact::try_from(row)
        })
    }

    /// Contacts of `user_id` in the order they were added.
    pub fn list_user_contacts(&self, user_id: Uuid) -> Result<Vec<Contact>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, contact_id, contact_name, added_at FROM contacts
                 WHERE user_id = ?1
                 ORDER BY rowid",
            )?;
            let rows = stmt.query_map([user_id.to_string()], contact_row)?;
            convert_rows(rows)
        })
    }

    pub fn remove_contact(&self, user_id: Uuid, contact_id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM contacts WHERE user_id = ?1 AND contact_id = ?2",
                [user_id.to_string(), contact_id.to_string()],
            )?;
            expect_affected(n, "contact", contact_id)
        })
    }

    // -- Conversations --

    pub fn create_conversation(
        &self,
        is_group: bool,
        title: Option<&str>,
        created_by: Uuid,
    ) -> Result<Conversation> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            let row = conn.query_row(
                "INSERT INTO conversations (id, is_group, title, created_by) VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, is_group, title, created_by, created_at",
                params![id, is_group, title, created_by.to_string()],
                conversation_row,
            )?;
            Conversation::try_from(row)
        })
    }

    pub fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, is_group, title, created_by, created_at FROM conversations WHERE id = ?1",
                [id.to_string()],
                conversation_row,
            )
            .optional()?
            .map(Conversation::try_from)
            .transpose()
        })
    }

    /// Conversations `user_id` participates in, oldest first.
    pub fn list_user_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.is_group, c.title, c.created_by, c.created_at
                 FROM conversations c
                 JOIN conversation_participants p ON p.conversation_id = c.id
                 WHERE p.user_id = ?1
                 ORDER BY c.created_at, c.rowid",
            )?;
            let rows = stmt.query_map([user_id.to_string()], conversation_row)?;
            convert_rows(rows)
        })
    }

    /// Deletes the conversation along with its participants and messages.
    pub fn delete_conversation(&self, id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM conversations WHERE id = ?1", [id.to_string()])?;
            expect_affected(n, "conversation", id)
        })
    }

    // -- Participants --

    pub fn add_conversation_participant(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<Participant> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                "INSERT INTO conversation_participants (conversation_id, user_id, role)
                 VALUES (?1, ?2, ?3)
                 RETURNING conversation_id, user_id, role, joined_at",
                params![conversation_id.to_string(), user_id.to_string(), role.as_str()],
                participant_row,
            )?;
            Participant::try_from(row)
        })
    }

    pub fn remove_conversation_participant(&self, conversation_id: Uuid, user_id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM conversation_participants WHERE conversation_id = ?1 AND user_id = ?2",
                [conversation_id.to_string(), user_id.to_string()],
            )?;
            expect_affected(n, "participant", user_id)
        })
    }

    /// Participants in join order.
    pub fn list_conversation_participants(&self, conversation_id: Uuid) -> Result<Vec<Participant>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT conversation_id, user_id, role, joined_at FROM conversation_participants
                 WHERE conversation_id = ?1
                 ORDER BY rowid",
            )?;
            let rows = stmt.query_map([conversation_id.to_string()], participant_row)?;
            convert_rows(rows)
        })
    }

    pub fn is_user_in_conversation(&self, conversation_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM conversation_participants
                               WHERE conversation_id = ?1 AND user_id = ?2)",
                [conversation_id.to_string(), user_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(found)
        })
    }

    // -- Messages --

    pub fn create_message(&self, msg: &NewMessage<'_>) -> Result<Message> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            let row = conn.query_row(
                "INSERT INTO messages (id, conversation_id, sender_id, content, message_type, reply_to_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING id, conversation_id, sender_id, content, message_type, reply_to_id, created_at",
                params![
                    id,
                    msg.conversation_id.to_string(),
                    msg.sender_id.to_string(),
                    msg.content,
                    msg.message_type,
                    msg.reply_to_id.map(|r| r.to_string()),
                ],
                message_row,
            )?;
            Message::try_from(row)
        })
    }

    pub fn get_message(&self, id: Uuid) -> Result<Option<Message>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, conversation_id, sender_id, content, message_type, reply_to_id, created_at
                 FROM messages WHERE id = ?1",
                [id.to_string()],
                message_row,
            )
            .optional()?
            .map(Message::try_from)
            .transpose()
        })
    }

    /// Newest first.
    pub fn list_conversation_messages(
        &self,
        conversation_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Message>> {
        self.with_conn(|conn| query_messages(conn, conversation_id, limit, offset))
    }

    pub fn latest_conversation_message(&self, conversation_id: Uuid) -> Result<Option<Message>> {
        self.with_conn(|conn| {
            Ok(query_messages(conn, conversation_id, 1, 0)?.into_iter().next())
        })
    }

    pub fn count_conversation_messages(&self, conversation_id: Uuid) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
                [conversation_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    pub fn delete_message(&self, id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM messages WHERE id = ?1", [id.to_string()])?;
            expect_affected(n, "message", id)
        })
    }

    // -- Reactions --

    /// One reaction per (message, user): reacting again replaces the token.
    pub fn add_reaction(&self, message_id: Uuid, user_id: Uuid, reaction: &str) -> Result<Reaction> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                "INSERT INTO message_reactions (message_id, user_id, reaction) VALUES (?1, ?2, ?3)
                 ON CONFLICT (message_id, user_id)
                 DO UPDATE SET reaction = excluded.reaction, reacted_at = datetime('now')
                 RETURNING message_id, user_id, reaction, reacted_at",
                params![message_id.to_string(), user_id.to_string(), reaction],
                reaction_row,
            )?;
            Reaction::try_from(row)
        })
    }

    pub fn remove_reaction(&self, message_id: Uuid, user_id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM message_reactions WHERE message_id = ?1 AND user_id = ?2",
                [message_id.to_string(), user_id.to_string()],
            )?;
            expect_affected(n, "reaction", message_id)
        })
    }

    pub fn list_message_reactions(&self, message_id: Uuid) -> Result<Vec<Reaction>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, user_id, reaction, reacted_at FROM message_reactions
                 WHERE message_id = ?1
                 ORDER BY reacted_at, rowid",
            )?;
            let rows = stmt.query_map([message_id.to_string()], reaction_row)?;
            convert_rows(rows)
        })
    }
}

fn query_messages(
    conn: &Connection,
    conversation_id: Uuid,
    limit: u32,
    offset: u32,
) -> Result<Vec<Message>> {
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, sender_id, content, message_type, reply_to_id, created_at
         FROM messages
         WHERE conversation_id = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt.query_map(
        params![conversation_id.to_string(), limit, offset],
        message_row,
    )?;
    convert_rows(rows)
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        phone_number: row.get(1)?,
        display_name: row.get(2)?,
        bio: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn contact_row(row: &Row<'_>) -> rusqlite::Result<ContactRow> {
    Ok(ContactRow {
        user_id: row.get(0)?,
        contact_id: row.get(1)?,
        contact_name: row.get(2)?,
        added_at: row.get(3)?,
    })
}

fn conversation_row(row: &Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        is_group: row.get(1)?,
        title: row.get(2)?,
        created_by: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn participant_row(row: &Row<'_>) -> rusqlite::Result<ParticipantRow> {
    Ok(ParticipantRow {
        conversation_id: row.get(0)?,
        user_id: row.get(1)?,
        role: row.get(2)?,
        joined_at: row.get(3)?,
    })
}

fn message_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        message_type: row.get(4)?,
        reply_to_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn reaction_row(row: &Row<'_>) -> rusqlite::Result<ReactionRow> {
    Ok(ReactionRow {
        message_id: row.get(0)?,
        user_id: row.get(1)?,
        reaction: row.get(2)?,
        reacted_at: row.get(3)?,
    })
}

fn convert_rows<R, T>(rows: impl Iterator<Item = rusqlite::Result<R>>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.map(|row| T::try_from(row?)).collect()
}

fn expect_affected(n: usize, entity: &'static str, id: Uuid) -> Result<()> {
    if n == 0 {
        return Err(DbError::NotFound {
            entity,
            id: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn user(db: &Database, phone: &str) -> User {
        db.create_user(phone, &format!("User {}", phone), "Tester passionate about sqlite")
            .unwrap()
    }

    #[test]
    fn create_user_assigns_id_and_timestamp() {
        let db = db();
        let alice = user(&db, "+15550000001");

        assert_eq!(db.get_user(alice.id).unwrap(), Some(alice.clone()));
        assert_eq!(db.get_user_by_phone("+15550000001").unwrap(), Some(alice));
        assert_eq!(db.get_user_by_phone("+15550000009").unwrap(), None);
    }

    #[test]
    fn lookups_of_unknown_ids_return_none() {
        let db = db();
        let missing = Uuid::new_v4();

        assert_eq!(db.get_user(missing).unwrap(), None);
        assert_eq!(db.get_conversation(missing).unwrap(), None);
        assert_eq!(db.get_message(missing).unwrap(), None);
    }

    #[test]
    fn duplicate_phone_is_classified() {
        let db = db();
        user(&db, "+447000000001");

        let err = db.create_user("+447000000001", "Again", "").unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)), "got {:?}", err);
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn contact_constraints_are_classified() {
        let db = db();
        let a = user(&db, "+1");
        let b = user(&db, "+2");

        db.add_contact(a.id, b.id, &b.display_name).unwrap();

        let dup = db.add_contact(a.id, b.id, &b.display_name).unwrap_err();
        assert!(matches!(dup, DbError::Duplicate(_)), "got {:?}", dup);

        let self_edge = db.add_contact(a.id, a.id, &a.display_name).unwrap_err();
        assert!(matches!(self_edge, DbError::Constraint(_)), "got {:?}", self_edge);

        let dangling = db.add_contact(a.id, Uuid::new_v4(), "ghost").unwrap_err();
        assert!(matches!(dangling, DbError::ForeignKey(_)), "got {:?}", dangling);
    }

    #[test]
    fn contacts_list_in_insertion_order() {
        let db = db();
        let owner = user(&db, "+10");
        let friends: Vec<User> = (0..4).map(|i| user(&db, &format!("+2{}", i))).collect();
        for f in friends.iter().rev() {
            db.add_contact(owner.id, f.id, &f.display_name).unwrap();
        }

        let listed: Vec<Uuid> = db
            .list_user_contacts(owner.id)
            .unwrap()
            .iter()
            .map(|c| c.contact_id)
            .collect();
        let expected: Vec<Uuid> = friends.iter().rev().map(|f| f.id).collect();
        assert_eq!(listed, expected);

        db.remove_contact(owner.id, friends[0].id).unwrap();
        assert_eq!(db.list_user_contacts(owner.id).unwrap().len(), 3);
        assert!(matches!(
            db.remove_contact(owner.id, friends[0].id),
            Err(DbError::NotFound { .. })
        ));
    }

    #[test]
    fn participants_and_membership() {
        let db = db();
        let a = user(&db, "+1");
        let b = user(&db, "+2");
        let c = user(&db, "+3");

        let conv = db.create_conversation(true, Some("Book Club"), a.id).unwrap();
        assert!(conv.is_group);
        assert_eq!(conv.title.as_deref(), Some("Book Club"));

        db.add_conversation_participant(conv.id, a.id, Role::Admin).unwrap();
        db.add_conversation_participant(conv.id, b.id, Role::Member).unwrap();
        assert_eq!(db.list_user_conversations(b.id).unwrap(), vec![conv.clone()]);
        assert!(db.list_user_conversations(c.id).unwrap().is_empty());

        let parts = db.list_conversation_participants(conv.id).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].role, Role::Admin);
        assert_eq!(parts[1].user_id, b.id);

        assert!(db.is_user_in_conversation(conv.id, b.id).unwrap());
        assert!(!db.is_user_in_conversation(conv.id, c.id).unwrap());

        let again = db
            .add_conversation_participant(conv.id, b.id, Role::Member)
            .unwrap_err();
        assert!(again.is_constraint_violation());

        db.remove_conversation_participant(conv.id, b.id).unwrap();
        assert!(!db.is_user_in_conversation(conv.id, b.id).unwrap());
    }

    #[test]
    fn messages_paginate_newest_first() {
        let db = db();
        let a = user(&db, "+1");
        let conv = db.create_conversation(false, None, a.id).unwrap();
        db.add_conversation_participant(conv.id, a.id, Role::Member).unwrap();

        let sent: Vec<Message> = (0..5)
            .map(|i| {
                let body = format!("message {}", i);
                db.create_message(&NewMessage::text(conv.id, a.id, &body)).unwrap()
            })
            .collect();
        assert!(sent.iter().all(|m| m.message_type == "text" && m.reply_to_id.is_none()));

        let page = db.list_conversation_messages(conv.id, 2, 0).unwrap();
        assert_eq!(page[0].content, "message 4");
        assert_eq!(page[1].content, "message 3");

        let page = db.list_conversation_messages(conv.id, 2, 4).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].content, "message 0");

        assert_eq!(db.count_conversation_messages(conv.id).unwrap(), 5);
        assert_eq!(
            db.latest_conversation_message(conv.id).unwrap().map(|m| m.id),
            Some(sent[4].id)
        );
    }

    #[test]
    fn reply_reference_round_trips() {
        let db = db();
        let a = user(&db, "+1");
        let conv = db.create_conversation(false, None, a.id).unwrap();
        let first = db.create_message(&NewMessage::text(conv.id, a.id, "hi")).unwrap();

        let reply = NewMessage {
            reply_to_id: Some(first.id),
            ..NewMessage::text(conv.id, a.id, "hello again")
        };
        let second = db.create_message(&reply).unwrap();
        assert_eq!(db.get_message(second.id).unwrap().unwrap().reply_to_id, Some(first.id));

        db.delete_message(first.id).unwrap();
        assert_eq!(db.get_message(second.id).unwrap().unwrap().reply_to_id, None);
    }

    #[test]
    fn reacting_twice_replaces_the_reaction() {
        let db = db();
        let a = user(&db, "+1");
        let b = user(&db, "+2");
        let conv = db.create_conversation(false, None, a.id).unwrap();
        let msg = db.create_message(&NewMessage::text(conv.id, a.id, "lunch?")).unwrap();

        db.add_reaction(msg.id, b.id, "👍").unwrap();
        db.add_reaction(msg.id, b.id, "❤️").unwrap();
        db.add_reaction(msg.id, a.id, "😂").unwrap();

        let reactions = db.list_message_reactions(msg.id).unwrap();
        assert_eq!(reactions.len(), 2);
        let from_b = reactions.iter().find(|r| r.user_id == b.id).unwrap();
        assert_eq!(from_b.reaction, "❤️");

        db.remove_reaction(msg.id, b.id).unwrap();
        assert_eq!(db.list_message_reactions(msg.id).unwrap().len(), 1);
    }

    #[test]
    fn deleting_a_conversation_removes_its_messages() {
        let db = db();
        let a = user(&db, "+1");
        let conv = db.create_conversation(false, None, a.id).unwrap();
        db.add_conversation_participant(conv.id, a.id, Role::Member).unwrap();
        let msg = db.create_message(&NewMessage::text(conv.id, a.id, "bye")).unwrap();

        db.delete_conversation(conv.id).unwrap();

        assert_eq!(db.get_conversation(conv.id).unwrap(), None);
        assert_eq!(db.get_message(msg.id).unwrap(), None);
        assert!(db.list_conversation_participants(conv.id).unwrap().is_empty());
        assert!(matches!(
            db.delete_conversation(conv.id),
            Err(DbError::NotFound { entity: "conversation", .. })
        ));
    }

    #[test]
    fn deleting_a_user_cascades() {
        let db = db();
        let a = user(&db, "+1");
        let b = user(&db, "+2");
        db.add_contact(b.id, a.id, &a.display_name).unwrap();

        db.delete_user(a.id).unwrap();

        assert_eq!(db.get_user(a.id).unwrap(), None);
        assert!(db.list_user_contacts(b.id).unwrap().is_empty());
        assert_eq!(db.list_users().unwrap(), vec![b]);
    }
}
