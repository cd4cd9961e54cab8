//! NVDA profile workspace
//!
//! The system tests run NVDA against a scratch profile directory. Before a
//! test the chosen settings file is copied in as `nvda.ini` and the spy is
//! installed as the `systemTestSpy` global plugin package; afterwards both
//! are removed so a manual run against the same profile is not affected.

mod fs;

pub use fs::{FileOps, LocalFs};

use std::path::PathBuf;

use crate::common::config::Config;
use crate::common::{paths, Result};

/// Canonical settings file name inside the profile
pub const PROFILE_SETTINGS_FILE: &str = "nvda.ini";

/// Name of the global plugin package the spy is installed as
pub const SPY_PACKAGE_NAME: &str = "systemTestSpy";

/// Spy module, installed as the package entry point
const SPY_SOURCE_FILE: &str = "systemTestSpy.py";
const PACKAGE_ENTRY_FILE: &str = "__init__.py";

/// Helper module the spy imports
const TEST_UTILS_FILE: &str = "testutils.py";

/// Absolute paths of everything the workspace touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLayout {
    /// Directory holding the selectable settings files
    pub settings_dir: PathBuf,
    /// Directory holding the spy sources
    pub libraries_dir: PathBuf,
    /// Scratch profile NVDA is pointed at with `-c`
    pub profile_dir: PathBuf,
}

impl ProfileLayout {
    /// Build the layout rooted at a system test directory
    pub fn new(system_test_dir: impl Into<PathBuf>) -> Self {
        let system_test_dir = system_test_dir.into();
        Self {
            settings_dir: system_test_dir.join("nvdaSettingsFiles"),
            libraries_dir: system_test_dir.join("libraries"),
            profile_dir: system_test_dir.join("nvdaProfile"),
        }
    }

    /// Build the layout from configuration, resolving against the repo root
    pub fn from_config(config: &Config) -> Result<Self> {
        let root = &config.paths.repo_root;
        Ok(Self::new(paths::resolve(root, &config.paths.system_test_dir)?))
    }

    /// `nvda.ini` inside the profile
    pub fn settings_file(&self) -> PathBuf {
        self.profile_dir.join(PROFILE_SETTINGS_FILE)
    }

    /// `globalPlugins` inside the profile
    pub fn global_plugins_dir(&self) -> PathBuf {
        self.profile_dir.join("globalPlugins")
    }

    /// The spy plugin package directory
    pub fn spy_package_dir(&self) -> PathBuf {
        self.global_plugins_dir().join(SPY_PACKAGE_NAME)
    }
}

/// Copy the settings file and install the spy package into the profile.
///
/// Fails if `settings_file_name` does not exist in the settings directory.
/// Meant to be called once per session, paired with [`teardown_workspace`].
pub async fn prepare_workspace(
    fs: &dyn FileOps,
    layout: &ProfileLayout,
    settings_file_name: &str,
) -> Result<()> {
    tracing::info!("Copying files into NVDA profile");

    fs.copy_file(
        &layout.settings_dir.join(settings_file_name),
        &layout.settings_file(),
    )
    .await?;

    // create a package to use as the globalPlugin
    let package_dir = layout.spy_package_dir();
    fs.create_dir_all(&package_dir).await?;
    fs.copy_file(
        &layout.libraries_dir.join(SPY_SOURCE_FILE),
        &package_dir.join(PACKAGE_ENTRY_FILE),
    )
    .await?;
    fs.copy_file(
        &layout.libraries_dir.join(TEST_UTILS_FILE),
        &package_dir.join(TEST_UTILS_FILE),
    )
    .await?;

    Ok(())
}

/// Remove the settings file and the spy package from the profile.
///
/// Targets that are already gone are not an error.
pub async fn teardown_workspace(fs: &dyn FileOps, layout: &ProfileLayout) -> Result<()> {
    tracing::info!("Removing files from NVDA profile");

    fs.remove_file(&layout.settings_file()).await?;
    fs.remove_dir_all(&layout.spy_package_dir()).await?;

    Ok(())
}
