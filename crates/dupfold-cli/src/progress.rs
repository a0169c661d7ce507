use colored::*;
use dupfold_core::ScanReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Scan feedback for the terminal. The walk length is unknown up front, so
/// the bar is a spinner tracking a running count plus the file last
/// touched.
pub struct CliReporter {
    bar: ProgressBar,
}

impl CliReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} {human_pos} files indexed  {wide_msg:.dim}",
            )
            .unwrap(),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl ScanReporter for CliReporter {
    fn on_file_scanned(&self, path: &str, _fingerprint: &str) {
        self.bar.inc(1);
        self.bar.set_message(path.to_string());
    }

    fn on_scan_complete(&self, total_files: usize) {
        self.bar.finish_and_clear();
        eprintln!("{} {} files indexed", "done:".green().bold(), total_files);
    }
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}
