pub mod attachment;
pub mod conversation;
pub mod settings;

pub use attachment::Attachment;
pub use conversation::{ChatMessage, CompletionRequest, ConversationDetails, ROOT_MESSAGE_ID};
pub use settings::{ConversationSettings, ToolSpec};
