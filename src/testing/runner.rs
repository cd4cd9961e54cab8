//! Test runner implementation
//!
//! Executes scenarios through a [`SessionController`], asserting against the
//! structured keyword results returned by the spy.

use std::path::Path;

use colored::Colorize;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::session::{RunContext, SessionController};
use crate::spy::{KeywordCall, SpyKeyword, Value};

use super::config::{StepExpectation, TestScenario, TestStep};

/// Result of a test run
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub error: Option<String>,
}

/// Run a test scenario from a YAML file against a real NVDA
pub async fn run_scenario(
    path: &Path,
    config: &Config,
    output_dir: &Path,
    verbose: bool,
) -> Result<TestResult> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read test scenario '{}': {}",
            path.display(),
            e
        ))
    })?;

    let scenario: TestScenario = serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse test scenario: {}", e)))?;

    let context = RunContext::new(output_dir, scenario.suite.clone(), scenario.name.clone());
    let mut session = SessionController::local(config, context)?;

    Ok(run_with_session(&scenario, &mut session, verbose).await)
}

/// Run a parsed scenario on an existing session.
///
/// NVDA is always quit at the end, also when starting it or a step failed.
pub async fn run_with_session(
    scenario: &TestScenario,
    session: &mut SessionController,
    verbose: bool,
) -> TestResult {
    let steps_total = scenario.steps.len();

    println!(
        "\n{} {} {}",
        "Running Test:".blue().bold(),
        scenario.suite.white(),
        scenario.name.white().bold()
    );

    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    println!("\n{}", "Starting NVDA...".cyan());
    match session.start_session(&scenario.settings).await {
        Ok(pid) => {
            if verbose {
                println!("  Settings: {}", scenario.settings.dimmed());
                if let Some(pid) = pid {
                    println!("  PID: {}", pid.to_string().dimmed());
                }
            }
            println!("  {} NVDA started", "✓".green());
        }
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
            quit(session).await;
            return TestResult {
                name: scenario.name.clone(),
                passed: false,
                steps_run: 0,
                steps_total,
                error: Some(e.to_string()),
            };
        }
    }

    println!("\n{}", "Steps:".cyan());

    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;

        if let Err(e) = execute_step(session, step, step_num, verbose).await {
            println!("  {} Step {}: {}", "✗".red(), step_num, e);
            quit(session).await;
            return TestResult {
                name: scenario.name.clone(),
                passed: false,
                steps_run: step_num,
                steps_total,
                error: Some(e.to_string()),
            };
        }
    }

    if let Some(e) = quit(session).await {
        return TestResult {
            name: scenario.name.clone(),
            passed: false,
            steps_run: steps_total,
            steps_total,
            error: Some(e.to_string()),
        };
    }

    println!(
        "\n{} {}\n",
        "✓".green().bold(),
        "Test Passed".green().bold()
    );

    TestResult {
        name: scenario.name.clone(),
        passed: true,
        steps_run: steps_total,
        steps_total,
        error: None,
    }
}

/// Quit NVDA, reporting but not propagating failure
async fn quit(session: &mut SessionController) -> Option<Error> {
    println!("\n{}", "Quitting NVDA...".cyan());
    match session.quit_session().await {
        Ok(()) => {
            println!(
                "  {} Log saved to {}",
                "✓".green(),
                session.context().log_archive_path().display().to_string().dimmed()
            );
            None
        }
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
            Some(e)
        }
    }
}

/// Execute a single keyword step
async fn execute_step(
    session: &SessionController,
    step: &TestStep,
    step_num: usize,
    verbose: bool,
) -> Result<()> {
    let call = build_call(step)?;
    if verbose {
        println!("  $ {}", call.to_string().dimmed());
    }

    let result = session.run_spy_keyword(call).await;
    check_expectation(&step.keyword, result, step.expect.as_ref())?;

    println!("  {} Step {}: {}", "✓".green(), step_num, step.keyword.dimmed());
    Ok(())
}

fn build_call(step: &TestStep) -> Result<KeywordCall> {
    let keyword: SpyKeyword = step.keyword.parse()?;
    let mut call = KeywordCall::new(keyword);
    call.args = step.args.iter().cloned().map(Value::from).collect();
    call.kwargs = step
        .kwargs
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.clone())))
        .collect();
    Ok(call)
}

/// Compare a keyword result with the step's expectations
fn check_expectation(
    keyword: &str,
    result: Result<Value>,
    expect: Option<&StepExpectation>,
) -> Result<()> {
    let expect_success = expect.and_then(|e| e.success).unwrap_or(true);

    let value = match (result, expect_success) {
        (Ok(value), true) => value,
        (Err(e), true) => return Err(e),
        (Err(_), false) => return Ok(()),
        (Ok(value), false) => {
            return Err(Error::TestAssertion(format!(
                "Keyword '{}': expected failure but got {:?}",
                keyword, value
            )))
        }
    };

    let Some(exp) = expect else {
        return Ok(());
    };

    if let Some(expected) = &exp.returns {
        let expected = Value::from(expected.clone());
        if value != expected {
            return Err(Error::TestAssertion(format!(
                "Keyword '{}': expected {:?}, got {:?}",
                keyword, expected, value
            )));
        }
    }

    if let Some(expected_substr) = &exp.returns_contains {
        let actual = value.as_str().unwrap_or_default();
        if !actual.contains(expected_substr.as_str()) {
            return Err(Error::TestAssertion(format!(
                "Keyword '{}': expected result containing '{}', got {:?}",
                keyword, expected_substr, value
            )));
        }
    }

    Ok(())
}
