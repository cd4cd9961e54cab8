//! Test session controller
//!
//! One [`SessionController`] drives one test: stage the profile, launch NVDA,
//! attach to the spy, forward keywords, then quit NVDA and archive its log.

mod controller;
#[cfg(test)]
pub(crate) mod mock;

pub use controller::{Collaborators, SessionController};

use std::path::PathBuf;

/// Directory under the output dir that receives the archived NVDA logs
pub const LOG_ARCHIVE_DIR: &str = "nvdaTestRunLogs";

/// Values supplied by the surrounding test runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub output_dir: PathBuf,
    pub suite_name: String,
    pub test_name: String,
}

impl RunContext {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        suite_name: impl Into<String>,
        test_name: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            suite_name: suite_name.into(),
            test_name: test_name.into(),
        }
    }

    /// `<output dir>/nvdaTestRunLogs/<suite>-<test>-nvda.log`
    pub fn log_archive_path(&self) -> PathBuf {
        self.output_dir
            .join(LOG_ARCHIVE_DIR)
            .join(log_archive_file_name(&self.suite_name, &self.test_name))
    }
}

/// Archive file name for a test's NVDA log, with spaces replaced by underscores
pub fn log_archive_file_name(suite_name: &str, test_name: &str) -> String {
    format!("{}-{}-nvda.log", suite_name, test_name).replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_file_name_replaces_spaces() {
        assert_eq!(
            log_archive_file_name("My Suite", "Test One"),
            "My_Suite-Test_One-nvda.log"
        );
    }

    #[test]
    fn test_archive_path() {
        let context = RunContext::new("/out", "Startup", "starts  quietly");
        assert_eq!(
            context.log_archive_path(),
            PathBuf::from("/out/nvdaTestRunLogs/Startup-starts__quietly-nvda.log")
        );
    }
}
