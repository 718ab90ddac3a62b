//! A terminal assistant that answers questions with live web search.
//!
//! The crate includes the `websage` CLI. It can also be used as a library
//! to bring the same search-backed chat into other programs.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod bootstrap;
pub mod flows;
mod session;
#[cfg(feature = "cli")]
pub mod shell;
pub mod tools;

pub use session::{SYSTEM_PROMPT, Session, SessionBuilder};

/// Re-exports of [`websage_core`] crate.
pub mod core {
    pub use websage_core::*;
}
