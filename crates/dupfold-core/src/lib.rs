pub mod analysis;
pub mod config;
pub mod error;
pub mod executor;
pub mod hasher;
pub mod paths;
pub mod progress;
pub mod scanner;
pub mod snapshot;
pub mod storage;

pub use config::AppConfig;
pub use error::Error;
pub use executor::{Executor, LogSink, ProgressUpdate, TracingLogSink};
pub use progress::{ScanReporter, SilentReporter};
pub use scanner::Scanner;
pub use storage::MemoryStorage;
