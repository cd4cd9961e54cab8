//! Recording test doubles for the session collaborators

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::process::{AppProcess, ProcessControl, ProcessOutcome, ShellCommand};
use crate::profile::FileOps;
use crate::spy::{KeywordCall, SpyClient, SpyConnector, Value};

use super::{Collaborators, RunContext, SessionController};

const ROOT: &str = "/nvda";

type Events = Arc<Mutex<Vec<String>>>;

fn record(events: &Events, event: impl Into<String>) {
    events.lock().unwrap().push(event.into());
}

/// Show paths relative to the system test dir, or else to the repo root
fn short(path: &Path) -> String {
    let system_test = Path::new(ROOT).join("tests").join("system");
    let relative = path
        .strip_prefix(&system_test)
        .or_else(|_| path.strip_prefix(ROOT))
        .unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

#[derive(Clone, Copy)]
pub enum ProbeBehaviour {
    /// The n-th probe is the first to succeed
    SucceedAfter(usize),
    /// Probes succeed once this much time has passed since the session was built
    ReachableAfter(Duration),
    Never,
}

#[derive(Default)]
pub struct MockHarness {
    events: Events,
    exits_after: Option<Duration>,
    failing_removal: bool,
    failing_quit: bool,
}

impl MockHarness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exits_immediately(self) -> Self {
        self.exits_after(Duration::ZERO)
    }

    /// NVDA exits with code 1 this long after it was started
    pub fn exits_after(mut self, after: Duration) -> Self {
        self.exits_after = Some(after);
        self
    }

    pub fn failing_removal(mut self) -> Self {
        self.failing_removal = true;
        self
    }

    pub fn failing_quit(mut self) -> Self {
        self.failing_quit = true;
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn session(&self, probe: ProbeBehaviour) -> SessionController {
        let mut config = Config::default();
        config.paths.repo_root = PathBuf::from(ROOT);

        let collaborators = Collaborators {
            process: Box::new(MockProcessControl {
                events: self.events.clone(),
                exits_after: self.exits_after,
                failing_quit: self.failing_quit,
            }),
            fs: Box::new(MockFs {
                events: self.events.clone(),
                failing_removal: self.failing_removal,
            }),
            connector: Box::new(MockConnector {
                events: self.events.clone(),
                probe,
                probes: Mutex::new(0),
                created: Instant::now(),
            }),
        };
        let context = RunContext::new(Path::new(ROOT).join("out"), "Suite Name", "Test Name");
        SessionController::new(&config, context, collaborators).unwrap()
    }
}

struct MockFs {
    events: Events,
    failing_removal: bool,
}

#[async_trait]
impl FileOps for MockFs {
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        record(&self.events, format!("copy {} -> {}", short(from), short(to)));
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        record(&self.events, format!("mkdir {}", short(path)));
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        record(&self.events, format!("rm {}", short(path)));
        if self.failing_removal {
            return Err(Error::file_remove(
                path,
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ));
        }
        Ok(())
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        record(&self.events, format!("rm -r {}", short(path)));
        Ok(())
    }
}

struct MockProcessControl {
    events: Events,
    exits_after: Option<Duration>,
    failing_quit: bool,
}

#[async_trait]
impl ProcessControl for MockProcessControl {
    async fn start(&self, _command: &ShellCommand) -> Result<Box<dyn AppProcess>> {
        record(&self.events, "start");
        Ok(Box::new(MockProcess {
            events: self.events.clone(),
            exits_at: self.exits_after.map(|after| Instant::now() + after),
            quit: false,
        }))
    }

    async fn run(&self, _command: &ShellCommand) -> Result<ProcessOutcome> {
        record(&self.events, "run quit");
        if self.failing_quit {
            return Err(Error::ProcessSpawn("quit command could not start".to_string()));
        }
        Ok(ProcessOutcome { code: Some(0) })
    }
}

struct MockProcess {
    events: Events,
    /// When NVDA exits on its own
    exits_at: Option<Instant>,
    quit: bool,
}

impl MockProcess {
    fn crashed(&self) -> bool {
        self.exits_at.is_some_and(|at| Instant::now() >= at)
    }
}

#[async_trait]
impl AppProcess for MockProcess {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn is_running(&mut self) -> Result<bool> {
        Ok(!self.quit && !self.crashed())
    }

    async fn wait(&mut self) -> Result<ProcessOutcome> {
        record(&self.events, "wait");
        let code = if self.crashed() { 1 } else { 0 };
        self.quit = true;
        Ok(ProcessOutcome { code: Some(code) })
    }
}

struct MockConnector {
    events: Events,
    probe: ProbeBehaviour,
    probes: Mutex<usize>,
    created: Instant,
}

#[async_trait]
impl SpyConnector for MockConnector {
    fn uri(&self) -> &str {
        "http://127.0.0.1:8270"
    }

    async fn probe(&self) -> bool {
        let count = {
            let mut probes = self.probes.lock().unwrap();
            *probes += 1;
            *probes
        };
        match self.probe {
            ProbeBehaviour::SucceedAfter(n) => {
                record(&self.events, "probe");
                count >= n
            }
            ProbeBehaviour::ReachableAfter(after) => self.created.elapsed() >= after,
            ProbeBehaviour::Never => false,
        }
    }

    async fn bind(&self, max_call_duration: Duration) -> Result<Box<dyn SpyClient>> {
        record(&self.events, format!("bind {}s", max_call_duration.as_secs()));
        Ok(Box::new(MockSpy {
            events: self.events.clone(),
        }))
    }

    async fn stop(&self) -> bool {
        record(&self.events, "stop");
        true
    }
}

struct MockSpy {
    events: Events,
}

#[async_trait]
impl SpyClient for MockSpy {
    async fn run_keyword(&self, call: &KeywordCall) -> Result<Value> {
        record(&self.events, format!("keyword {}", call));
        Ok(Value::Nil)
    }
}
