//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios.

use serde::Deserialize;
use std::collections::BTreeMap;

/// A complete test scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct TestScenario {
    /// Suite the test belongs to, used for the archived log name
    pub suite: String,
    /// Name of the test
    pub name: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// Settings file from the settings directory to start NVDA with
    pub settings: String,
    /// Spy keywords to run once NVDA has started
    #[serde(default)]
    pub steps: Vec<TestStep>,
}

/// One spy keyword invocation
#[derive(Deserialize, Debug)]
pub struct TestStep {
    /// Keyword name as served by the spy, e.g. `wait_for_specific_speech`
    pub keyword: String,
    /// Positional arguments
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
    /// Named arguments
    #[serde(default)]
    pub kwargs: BTreeMap<String, serde_json::Value>,
    /// Optional expectations for the keyword result
    pub expect: Option<StepExpectation>,
}

/// Expectations for a keyword result
#[derive(Deserialize, Debug)]
pub struct StepExpectation {
    /// Whether the keyword should succeed (default: true)
    pub success: Option<bool>,
    /// Expected return value (exact match)
    pub returns: Option<serde_json::Value>,
    /// Expected substring of a string return value
    pub returns_contains: Option<String>,
}
