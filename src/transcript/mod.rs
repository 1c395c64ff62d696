pub mod manager;
pub mod store;
pub mod types;

pub use manager::{Hypothesis, TranscriptManager};
pub use store::TranscriptStore;
pub use types::{TranscriptEntry, TranscriptVersion};
