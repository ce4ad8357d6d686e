//! Services separated from the batch loop: image I/O and progress output

pub mod io;
pub mod progress;

pub use io::ImageIOService;
pub use progress::{
    format_item_line, format_summary, ConsoleProgressReporter, NoOpProgressReporter,
    ProcessingStage, ProgressEvent, ProgressReporter, RecordingProgressReporter,
};
