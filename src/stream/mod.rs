//! Decoding and rendering of the completion event stream.

pub mod artifact;
pub mod event;
pub mod sink;
pub mod state;

pub use event::{decode_line, Delta, StreamEvent};
pub use sink::{LiveSink, OutputMode, OutputSink, RawSink};
pub use state::{drive, StreamState};
