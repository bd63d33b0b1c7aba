pub mod credentials;
pub mod providers;

pub use credentials::{MetadataServerToken, StaticToken, TokenSource};
pub use providers::{ChatModel, ChatSession, GenerationParams, ProviderError};
