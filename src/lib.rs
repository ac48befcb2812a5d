mod capture;
mod cli;
mod config;
mod error;
mod fs_utils;
mod manifest;
mod progress;
mod restore;
mod timestamp;

// Re-export public APIs
pub use capture::{capture, CaptureStats};
pub use cli::{Cli, Commands, OutputArgs};
pub use config::{Config, find_config_file, CONFIG_FILENAME};
pub use error::{LineError, MtimeError, Result};
pub use manifest::{Manifest, Record, RecordReader, parse_line, MANIFEST_FILENAME};
pub use progress::{ProgressConfig, Spinner};
pub use restore::{restore, RestoreStats};
pub use timestamp::{Timestamp, TIME_LAYOUT};
