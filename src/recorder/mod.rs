pub mod library;
pub mod writer;

pub use library::{RecordingInfo, RecordingLibrary};
pub use writer::RecordingWriter;
