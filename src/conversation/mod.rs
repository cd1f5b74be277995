pub mod engine;
pub mod models;

pub use engine::ConversationEngine;
pub use models::{ConversationState, EngineReply, Role, Step};
