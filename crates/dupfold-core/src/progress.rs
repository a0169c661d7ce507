/// Trait for reporting scan progress.
///
/// The CLI implements it with an indicatif spinner; tests collect calls.
/// All methods have default no-op implementations.
pub trait ScanReporter: Send + Sync {
    fn on_file_scanned(&self, _path: &str, _fingerprint: &str) {}
    fn on_scan_complete(&self, _total_files: usize) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl ScanReporter for SilentReporter {}
