//! Configuration file handling
//!
//! Every setting has a default that matches the NVDA source tree layout, so a
//! missing config file means "run from the repository root".

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Repository layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// How NVDA is started and stopped
    #[serde(default)]
    pub launch: LaunchConfig,

    /// Spy remote library settings
    #[serde(default)]
    pub spy: SpyConfig,
}

/// Repository layout, relative to `repo_root` unless absolute
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// Root of the NVDA checkout
    #[serde(default = "default_repo_root")]
    pub repo_root: PathBuf,

    /// Directory NVDA is launched from
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// System test sources (settings files, spy library, profile)
    #[serde(default = "default_system_test_dir")]
    pub system_test_dir: PathBuf,

    /// Log file written by NVDA with `--debug-logging`
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            repo_root: default_repo_root(),
            source_dir: default_source_dir(),
            system_test_dir: default_system_test_dir(),
            log_file: default_log_file(),
        }
    }
}

fn default_repo_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_source_dir() -> PathBuf {
    PathBuf::from("source")
}
fn default_system_test_dir() -> PathBuf {
    PathBuf::from("tests").join("system")
}
fn default_log_file() -> PathBuf {
    PathBuf::from("source").join("nvda.log")
}

/// Command line pieces for starting and quitting NVDA
#[derive(Debug, Deserialize, Clone)]
pub struct LaunchConfig {
    /// Interpreter used to run NVDA from source
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// NVDA entry script, relative to the source dir
    #[serde(default = "default_entry_script")]
    pub entry_script: String,

    /// Flags for the launch: debug logging, replace the running instance
    #[serde(default = "default_start_flags")]
    pub start_flags: Vec<String>,

    /// Flags for the quit request: quit, add-ons disabled
    #[serde(default = "default_quit_flags")]
    pub quit_flags: Vec<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            entry_script: default_entry_script(),
            start_flags: default_start_flags(),
            quit_flags: default_quit_flags(),
        }
    }
}

fn default_interpreter() -> String {
    "pythonw".to_string()
}
fn default_entry_script() -> String {
    "nvda.pyw".to_string()
}
fn default_start_flags() -> Vec<String> {
    vec!["--debug-logging".to_string(), "-r".to_string()]
}
fn default_quit_flags() -> Vec<String> {
    vec!["-q".to_string(), "--disable-addons".to_string()]
}

/// Spy remote server settings
#[derive(Debug, Deserialize, Clone)]
pub struct SpyConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// 8270 is registered with IANA for Robot Framework remote servers
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long to wait for the spy to become reachable after launch
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Delay between reachability probes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Timeout for a single reachability probe
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// Upper bound for any single remote keyword; longer calls drop the connection
    #[serde(default = "default_max_keyword_duration")]
    pub max_keyword_duration_secs: u64,
}

impl Default for SpyConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_secs: default_connect_timeout(),
            poll_interval_ms: default_poll_interval(),
            probe_timeout_ms: default_probe_timeout(),
            max_keyword_duration_secs: default_max_keyword_duration(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8270
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_poll_interval() -> u64 {
    100
}
fn default_probe_timeout() -> u64 {
    1000
}
fn default_max_keyword_duration() -> u64 {
    30
}

impl SpyConfig {
    /// URI of the spy's remote server
    pub fn uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
