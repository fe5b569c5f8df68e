pub mod error;
pub mod logging;
pub mod models;
pub mod runner;
pub mod session;
pub mod spawn;

pub use error::EngineError;
pub use models::{model_identifier, parse_model_list, ModelEntry};
pub use runner::{engine_installed, list_models, run_capture, send_once};
pub use session::{SessionEvent, StreamSession, CANCELLED_SENTINEL};
