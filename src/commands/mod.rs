pub mod conversations;

pub use conversations::{
    conversation_link, handle_delete, handle_name, handle_new, handle_sync, SyncOutcome,
};
