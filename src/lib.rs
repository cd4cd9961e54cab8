//! NVDA system-test session controller
//!
//! Stages a scratch NVDA profile, launches NVDA, attaches to the spy plugin's
//! remote library and forwards keywords to it, then quits NVDA and archives
//! its log for the test.

pub mod cli;
pub mod commands;
pub mod common;
pub mod process;
pub mod profile;
pub mod session;
pub mod spy;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use session::{RunContext, SessionController};
pub use spy::{KeywordCall, SpyKeyword};
