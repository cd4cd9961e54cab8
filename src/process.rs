//! Starting, quitting and waiting for NVDA
//!
//! Both command lines go through the platform shell (`sh -c` / `cmd /C`) in
//! NVDA's source directory, the same way a developer would type them.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::common::config::Config;
use crate::common::{paths, Error, Result};

/// A shell command line and the directory it runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub line: String,
    pub cwd: PathBuf,
}

/// How a process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, `None` if terminated by a signal
    pub code: Option<i32>,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// The launch and quit command lines for NVDA
#[derive(Debug, Clone)]
pub struct LaunchCommands {
    source_dir: PathBuf,
    program: String,
    start_flags: Vec<String>,
    quit_flags: Vec<String>,
}

impl LaunchCommands {
    pub fn from_config(config: &Config) -> Result<Self> {
        let launch = &config.launch;
        Ok(Self {
            source_dir: paths::resolve(&config.paths.repo_root, &config.paths.source_dir)?,
            program: format!("{} {}", launch.interpreter, launch.entry_script),
            start_flags: launch.start_flags.clone(),
            quit_flags: launch.quit_flags.clone(),
        })
    }

    /// Start NVDA with the configured flags against `profile_dir`
    pub fn start(&self, profile_dir: &Path) -> ShellCommand {
        let mut line = self.program.clone();
        for flag in &self.start_flags {
            line.push(' ');
            line.push_str(flag);
        }
        line.push_str(&format!(" -c \"{}\"", profile_dir.display()));
        ShellCommand {
            line,
            cwd: self.source_dir.clone(),
        }
    }

    /// Ask the running NVDA to quit
    pub fn quit(&self) -> ShellCommand {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.quit_flags.iter().cloned());
        ShellCommand {
            line: parts.join(" "),
            cwd: self.source_dir.clone(),
        }
    }
}

/// A launched NVDA process
#[async_trait]
pub trait AppProcess: Send {
    /// OS process id, if known
    fn pid(&self) -> Option<u32>;

    /// Whether the process has not exited yet
    fn is_running(&mut self) -> Result<bool>;

    /// Wait for the process to exit
    async fn wait(&mut self) -> Result<ProcessOutcome>;
}

/// Process control capability
#[async_trait]
pub trait ProcessControl: Send + Sync {
    /// Start `command` and return immediately
    async fn start(&self, command: &ShellCommand) -> Result<Box<dyn AppProcess>>;

    /// Run `command` to completion
    async fn run(&self, command: &ShellCommand) -> Result<ProcessOutcome>;
}

/// [`ProcessControl`] through the platform shell
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellProcessControl;

impl ShellProcessControl {
    fn command(command: &ShellCommand) -> Command {
        #[cfg(unix)]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(&command.line);
            cmd
        };

        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&command.line);
            cmd
        };

        cmd.current_dir(&command.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

#[async_trait]
impl ProcessControl for ShellProcessControl {
    async fn start(&self, command: &ShellCommand) -> Result<Box<dyn AppProcess>> {
        tracing::debug!("Starting '{}' in {}", command.line, command.cwd.display());
        let child = Self::command(command).spawn().map_err(|e| {
            Error::ProcessSpawn(format!("'{}' in {}: {}", command.line, command.cwd.display(), e))
        })?;
        Ok(Box::new(ShellProcess { child }))
    }

    async fn run(&self, command: &ShellCommand) -> Result<ProcessOutcome> {
        tracing::debug!("Running '{}' in {}", command.line, command.cwd.display());
        let status = Self::command(command).status().await.map_err(|e| {
            Error::ProcessSpawn(format!("'{}' in {}: {}", command.line, command.cwd.display(), e))
        })?;
        Ok(ProcessOutcome {
            code: status.code(),
        })
    }
}

struct ShellProcess {
    child: Child,
}

#[async_trait]
impl AppProcess for ShellProcess {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn is_running(&mut self) -> Result<bool> {
        Ok(self.child.try_wait()?.is_none())
    }

    async fn wait(&mut self) -> Result<ProcessOutcome> {
        let status = self.child.wait().await?;
        Ok(ProcessOutcome {
            code: status.code(),
        })
    }
}
