//! The NVDA spy remote library
//!
//! The spy is a global plugin installed into the test profile. It exposes
//! introspection keywords (speech, startup state, key emulation) through a
//! Robot Framework remote server on the loopback interface.

pub mod client;
pub mod keyword;
pub mod xmlrpc;

pub use client::{RemoteSpy, RemoteSpyConnector, SpyClient, SpyConnector};
pub use keyword::{KeywordCall, SpyKeyword};
pub use xmlrpc::Value;
