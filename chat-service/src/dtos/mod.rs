pub mod chat;

pub use chat::{ChatContent, ChatQuery};
