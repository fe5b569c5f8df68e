pub mod controller;
pub mod message;
pub mod segmenter;

pub use controller::{ChatController, TranscriptUpdate, TurnError, TurnPhase};
pub use message::{Message, MessageKind, Origin};
pub use segmenter::{classify, finalize, strip_markers, Classification, Segment};
