//! Client side of the spy's Robot Framework remote server
//!
//! The spy runs inside NVDA and serves the remote library protocol as
//! XML-RPC over HTTP. Importing a remote library never fails even when the
//! server is down, so the session first probes reachability and only then
//! binds a client whose calls are bounded in time.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::common::config::SpyConfig;
use crate::common::{Error, Result};

use super::keyword::KeywordCall;
use super::xmlrpc::{self, Value};

/// A bound connection to the spy
#[async_trait]
pub trait SpyClient: Send + Sync {
    /// Run a keyword and return its return value
    async fn run_keyword(&self, call: &KeywordCall) -> Result<Value>;

    /// Block until the spy reports that NVDA has finished starting
    async fn wait_for_nvda_startup_to_complete(&self) -> Result<()> {
        self.run_keyword(&KeywordCall::wait_for_nvda_startup_to_complete())
            .await?;
        Ok(())
    }

    /// Tell the spy how long a single keyword may take
    async fn set_max_keyword_duration(&self, secs: u64) -> Result<()> {
        self.run_keyword(&KeywordCall::set_max_keyword_duration(secs))
            .await?;
        Ok(())
    }
}

/// Reaching, binding and stopping the spy's remote endpoint
#[async_trait]
pub trait SpyConnector: Send + Sync {
    /// Endpoint URI, for diagnostics
    fn uri(&self) -> &str;

    /// Whether the endpoint answers right now. Never logs above TRACE.
    async fn probe(&self) -> bool;

    /// Bind a client whose calls fail once they exceed `max_call_duration`
    async fn bind(&self, max_call_duration: Duration) -> Result<Box<dyn SpyClient>>;

    /// Ask the remote server to stop. Returns whether it could be reached.
    async fn stop(&self) -> bool;
}

/// [`SpyConnector`] for the XML-RPC remote server
pub struct RemoteSpyConnector {
    uri: String,
    probe_client: reqwest::Client,
    probe_timeout: Duration,
}

impl RemoteSpyConnector {
    pub fn new(uri: impl Into<String>, probe_timeout: Duration) -> Result<Self> {
        Ok(Self {
            uri: uri.into(),
            probe_client: http_client(probe_timeout)?,
            probe_timeout,
        })
    }

    pub fn from_config(config: &SpyConfig) -> Result<Self> {
        Self::new(config.uri(), Duration::from_millis(config.probe_timeout_ms))
    }
}

#[async_trait]
impl SpyConnector for RemoteSpyConnector {
    fn uri(&self) -> &str {
        &self.uri
    }

    async fn probe(&self) -> bool {
        let probe = call(
            &self.probe_client,
            &self.uri,
            "get_keyword_names",
            &[],
            self.probe_timeout,
        );
        match probe.await {
            Ok(_) => true,
            Err(e) => {
                tracing::trace!("nvdaSpy not reachable at {}: {}", self.uri, e);
                false
            }
        }
    }

    async fn bind(&self, max_call_duration: Duration) -> Result<Box<dyn SpyClient>> {
        Ok(Box::new(RemoteSpy {
            uri: self.uri.clone(),
            client: http_client(max_call_duration)?,
            max_call_duration,
        }))
    }

    async fn stop(&self) -> bool {
        let stop = call(
            &self.probe_client,
            &self.uri,
            "stop_remote_server",
            &[],
            self.probe_timeout,
        );
        match stop.await {
            Ok(_) => true,
            Err(e) => {
                tracing::trace!("Could not stop nvdaSpy at {}: {}", self.uri, e);
                false
            }
        }
    }
}

/// A bound remote library client
pub struct RemoteSpy {
    uri: String,
    client: reqwest::Client,
    max_call_duration: Duration,
}

#[async_trait]
impl SpyClient for RemoteSpy {
    async fn run_keyword(&self, keyword_call: &KeywordCall) -> Result<Value> {
        let name = keyword_call.keyword.as_str();
        let mut params = vec![Value::from(name), Value::Array(keyword_call.args.clone())];
        if !keyword_call.kwargs.is_empty() {
            params.push(Value::Struct(keyword_call.kwargs.clone()));
        }

        let result = call(
            &self.client,
            &self.uri,
            "run_keyword",
            &params,
            self.max_call_duration,
        )
        .await?;
        keyword_result(name, result)
    }
}

/// Interpret the remote library's result struct
fn keyword_result(keyword: &str, result: Value) -> Result<Value> {
    let Value::Struct(mut fields) = result else {
        return Err(Error::RemoteProtocol(format!(
            "run_keyword '{}' returned a non-struct result",
            keyword
        )));
    };

    if let Some(output) = fields.get("output").and_then(Value::as_str) {
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            tracing::debug!(target: "nvda_systest::spy_output", "{}", line);
        }
    }

    let status = fields
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match status.as_str() {
        "PASS" => Ok(fields.remove("return").unwrap_or(Value::Nil)),
        "FAIL" => {
            if let Some(traceback) = fields.get("traceback").and_then(Value::as_str) {
                tracing::debug!("nvdaSpy traceback for '{}':\n{}", keyword, traceback);
            }
            let message = fields
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("no error message");
            Err(Error::keyword_failed(keyword, message))
        }
        other => Err(Error::RemoteProtocol(format!(
            "run_keyword '{}' returned unknown status '{}'",
            keyword, other
        ))),
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::RemoteTransport(e.to_string()))
}

/// One XML-RPC round trip
async fn call(
    client: &reqwest::Client,
    uri: &str,
    method: &str,
    params: &[Value],
    timeout: Duration,
) -> Result<Value> {
    let body = xmlrpc::encode_call(method, params);

    let response = client
        .post(uri)
        .header(CONTENT_TYPE, "text/xml")
        .body(body)
        .send()
        .await
        .map_err(|e| transport_error(method, timeout, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::RemoteTransport(format!(
            "{} returned HTTP {}",
            method, status
        )));
    }

    let text = response
        .text()
        .await
        .map_err(|e| transport_error(method, timeout, e))?;
    xmlrpc::decode_response(&text)
}

fn transport_error(method: &str, timeout: Duration, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::RemoteTimeout {
            method: method.to_string(),
            secs: timeout.as_secs(),
        }
    } else {
        Error::RemoteTransport(e.to_string())
    }
}
