use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "dupfold")]
#[command(about = "Find and reconcile duplicate folders under a directory tree", long_about = None)]
pub struct Cli {
    /// Root directory to scan
    #[arg(value_name = "PATH")]
    pub root: Option<String>,

    /// Root directory to scan (alternative to the positional argument)
    #[arg(long = "path", value_name = "DIR")]
    pub path: Option<String>,

    /// Load a previously exported snapshot instead of scanning
    #[arg(long, value_name = "FILE")]
    pub data: Option<String>,

    /// Write the scanned index to a snapshot file
    #[arg(long, value_name = "FILE")]
    pub export: Option<String>,

    /// Maximum similar-folder pairs to print per folder
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

impl Cli {
    /// The scan root: `--path` wins over the positional argument.
    pub fn root_path(&self) -> Option<&str> {
        self.path.as_deref().or(self.root.as_deref())
    }
}
