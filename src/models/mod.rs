pub mod process;
pub mod sample;
pub mod suggestion;

pub use process::{ProcessEntry, SortKey};
pub use sample::{Alert, Metric, Sample, Threshold, Thresholds};
pub use suggestion::{ImageAnalysis, SuggestionRecord};
