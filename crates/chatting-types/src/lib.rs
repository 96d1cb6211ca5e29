pub mod models;

pub use models::{Contact, Conversation, Message, Participant, Reaction, Role, User};
