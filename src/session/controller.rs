//! Session controller implementation

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::common::config::Config;
use crate::common::{paths, poll, Error, Result};
use crate::process::{AppProcess, LaunchCommands, ProcessControl, ShellProcessControl};
use crate::profile::{self, FileOps, LocalFs, ProfileLayout};
use crate::spy::{KeywordCall, RemoteSpyConnector, SpyClient, SpyConnector, Value};

use super::RunContext;

/// Diagnostic for a spy that never became reachable
const SPY_UNREACHABLE_MESSAGE: &str = "Unable to connect to nvdaSpy";

/// The capabilities a session acts through
pub struct Collaborators {
    pub process: Box<dyn ProcessControl>,
    pub fs: Box<dyn FileOps>,
    pub connector: Box<dyn SpyConnector>,
}

impl Collaborators {
    /// Shell processes, the local filesystem and the XML-RPC spy endpoint
    pub fn local(config: &Config) -> Result<Self> {
        Ok(Self {
            process: Box::new(ShellProcessControl),
            fs: Box::new(LocalFs),
            connector: Box::new(RemoteSpyConnector::from_config(&config.spy)?),
        })
    }
}

/// Drives NVDA through one test
pub struct SessionController {
    context: RunContext,
    layout: ProfileLayout,
    commands: LaunchCommands,
    log_file: PathBuf,
    connect_timeout: Duration,
    poll_interval: Duration,
    max_keyword_duration: Duration,
    collaborators: Collaborators,
    /// Launched NVDA, owned until it has exited
    app: Option<Box<dyn AppProcess>>,
    /// Bound spy client, dropped with the session
    spy: Option<Box<dyn SpyClient>>,
}

impl SessionController {
    pub fn new(config: &Config, context: RunContext, collaborators: Collaborators) -> Result<Self> {
        Ok(Self {
            context,
            layout: ProfileLayout::from_config(config)?,
            commands: LaunchCommands::from_config(config)?,
            log_file: paths::resolve(&config.paths.repo_root, &config.paths.log_file)?,
            connect_timeout: Duration::from_secs(config.spy.connect_timeout_secs),
            poll_interval: Duration::from_millis(config.spy.poll_interval_ms),
            max_keyword_duration: Duration::from_secs(config.spy.max_keyword_duration_secs),
            collaborators,
            app: None,
            spy: None,
        })
    }

    /// Controller wired to the real process, filesystem and spy endpoint
    pub fn local(config: &Config, context: RunContext) -> Result<Self> {
        let collaborators = Collaborators::local(config)?;
        Self::new(config, context, collaborators)
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Pid of the launched NVDA process
    pub fn pid(&self) -> Option<u32> {
        self.app.as_ref().and_then(|app| app.pid())
    }

    pub fn is_connected(&self) -> bool {
        self.spy.is_some()
    }

    /// Copy `settings_file_name` into the profile and install the spy
    pub async fn prepare_workspace(&self, settings_file_name: &str) -> Result<()> {
        profile::prepare_workspace(self.collaborators.fs.as_ref(), &self.layout, settings_file_name)
            .await
    }

    /// Remove the settings file and the spy from the profile
    pub async fn teardown_workspace(&self) -> Result<()> {
        profile::teardown_workspace(self.collaborators.fs.as_ref(), &self.layout).await
    }

    /// Start NVDA with debug logging, replacing any running instance,
    /// against the test profile
    pub async fn launch_application(&mut self) -> Result<Option<u32>> {
        let command = self.commands.start(&self.layout.profile_dir);
        tracing::info!("Starting NVDA: {}", command.line);
        let app = self.collaborators.process.start(&command).await?;
        let pid = app.pid();
        self.app = Some(app);
        Ok(pid)
    }

    /// Fail if the launched process has already exited
    async fn ensure_running(&mut self) -> Result<()> {
        let app = self.app.as_mut().ok_or(Error::NoApplicationProcess)?;
        if app.is_running()? {
            return Ok(());
        }
        let outcome = app.wait().await?;
        Err(Error::ProcessNotRunning {
            exit_code: outcome.code,
        })
    }

    /// Wait for the spy's remote server, then bind a client to it.
    ///
    /// How far NVDA is through startup is unknown, so reachability is polled
    /// up to the connect timeout before binding. Polling stops early with
    /// [`Error::ProcessNotRunning`] if the launched NVDA exits meanwhile.
    /// The bound client and the spy are both given the same per-keyword
    /// duration limit.
    pub async fn connect_to_spy(&mut self) -> Result<()> {
        let connector = self.collaborators.connector.as_ref();
        tracing::info!("Waiting for nvdaSpy to be available at: {}", connector.uri());

        let mut app = self.app.as_deref_mut();
        let mut exited = false;
        let reachable = poll::wait_until(
            || {
                if let Some(app) = app.as_mut() {
                    exited = matches!(app.is_running(), Ok(false));
                }
                let exited = exited;
                async move { exited || connector.probe().await }
            },
            self.connect_timeout,
            self.poll_interval,
        )
        .await;

        if exited {
            self.ensure_running().await?;
        }
        if !reachable {
            return Err(Error::SpyUnreachable {
                message: SPY_UNREACHABLE_MESSAGE.to_string(),
                secs: self.connect_timeout.as_secs(),
            });
        }

        tracing::info!("Connecting to nvdaSpy");
        let spy = self
            .collaborators
            .connector
            .bind(self.max_keyword_duration)
            .await?;
        let spy = self.spy.insert(Box::new(LoggedSpy(spy)));

        spy.set_max_keyword_duration(self.max_keyword_duration.as_secs())
            .await
    }

    fn bound_spy(&self) -> Result<&dyn SpyClient> {
        self.spy.as_deref().ok_or(Error::SpyNotConnected)
    }

    /// Forward a keyword to the spy and return its value
    pub async fn run_spy_keyword(&self, call: KeywordCall) -> Result<Value> {
        self.bound_spy()?.run_keyword(&call).await
    }

    /// Stage the profile, start NVDA and wait until it has finished starting.
    ///
    /// Returns the NVDA pid.
    pub async fn start_session(&mut self, settings_file_name: &str) -> Result<Option<u32>> {
        self.prepare_workspace(settings_file_name).await?;
        let pid = self.launch_application().await?;
        self.ensure_running().await?;
        self.connect_to_spy().await?;
        self.bound_spy()?.wait_for_nvda_startup_to_complete().await?;
        Ok(pid)
    }

    /// Copy NVDA's log to the per-test archive path and return that path
    pub async fn save_application_log(&self) -> Result<PathBuf> {
        tracing::info!("saving NVDA log");
        let destination = self.context.log_archive_path();
        self.collaborators
            .fs
            .copy_file(&self.log_file, &destination)
            .await?;
        Ok(destination)
    }

    /// Stop the spy, clean the profile, quit NVDA and archive its log.
    ///
    /// The profile is cleaned before NVDA quits. A failed cleanup is logged
    /// and does not stop the quit; it is reported after the log is saved, or
    /// together with whichever later step failed.
    pub async fn quit_session(&mut self) -> Result<()> {
        let connector = self.collaborators.connector.as_ref();
        tracing::info!("Stopping nvdaSpy server: {}", connector.uri());
        if !connector.stop().await {
            tracing::warn!(
                "nvdaSpy server at {} could not be reached to stop it",
                connector.uri()
            );
        }
        self.spy = None;

        let mut errors = Vec::new();

        // the profile must not keep the spy once the session ends
        if let Err(e) = self.teardown_workspace().await {
            tracing::warn!("Failed to clean NVDA profile: {}", e);
            errors.push(e);
        }

        if let Err(e) = self.quit_application().await {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::shutdown(errors))
        }
    }

    async fn quit_application(&mut self) -> Result<()> {
        let mut app = self.app.take().ok_or(Error::NoApplicationProcess)?;

        let command = self.commands.quit();
        tracing::info!("Quitting NVDA: {}", command.line);
        let outcome = self.collaborators.process.run(&command).await?;
        if !outcome.success() {
            tracing::warn!("NVDA quit command exited with {:?}", outcome.code);
        }

        let exited = app.wait().await?;
        tracing::info!("NVDA exited with {:?}", exited.code);

        self.save_application_log().await?;
        Ok(())
    }
}

/// Logs every keyword before it is sent to the spy
struct LoggedSpy(Box<dyn SpyClient>);

#[async_trait]
impl SpyClient for LoggedSpy {
    async fn run_keyword(&self, call: &KeywordCall) -> Result<Value> {
        tracing::info!("nvdaSpy keyword: {}", call);
        self.0.run_keyword(call).await
    }
}
