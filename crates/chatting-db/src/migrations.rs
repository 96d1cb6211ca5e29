use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            phone_number    TEXT NOT NULL UNIQUE,
            display_name    TEXT NOT NULL,
            bio             TEXT NOT NULL DEFAULT '',
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS contacts (
            user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            contact_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            contact_name    TEXT NOT NULL,
            added_at        TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, contact_id),
            CHECK (user_id <> contact_id)
        );

        CREATE TABLE IF NOT EXISTS conversations (
            id              TEXT PRIMARY KEY,
            is_group        INTEGER NOT NULL DEFAULT 0,
            title           TEXT,
            created_by      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS conversation_participants (
            conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
            user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            role            TEXT NOT NULL DEFAULT 'member' CHECK (role IN ('member', 'admin')),
            joined_at       TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (conversation_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_participants_user
            ON conversation_participants(user_id);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
            sender_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content         TEXT NOT NULL,
            message_type    TEXT NOT NULL DEFAULT 'text',
            reply_to_id     TEXT REFERENCES messages(id) ON DELETE SET NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages(conversation_id, created_at);

        CREATE TABLE IF NOT EXISTS message_reactions (
            message_id      TEXT NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            reaction        TEXT NOT NULL,
            reacted_at      TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (message_id, user_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
