//! An abstraction layer for the generative model backends.
//!
//! This crate establishes the protocol the agent uses to talk to a hosted
//! model: a request made of ordered messages and tool definitions, and a
//! response that streams text deltas and tool call requests back.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that provider implementations should adhere to.

#![deny(missing_docs)]

mod error;
mod opaque;
mod provider;
mod request;
mod response;

pub use error::*;
pub use opaque::*;
pub use provider::*;
pub use request::*;
pub use response::*;
