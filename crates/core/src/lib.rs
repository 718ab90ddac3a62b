//! Core logic: the conversation agent, tool calling and flows.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod conversation;
mod error;
pub mod flow;
mod generate;
mod model_client;
pub mod tool;

pub use agent::{Agent, AgentBuilder};
pub use error::GenerationError;
pub use generate::Generator;
