use serde_json::Value;

use crate::OpaqueMessage;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelRequest {
    /// The input messages, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Tools the model may call while answering.
    pub tools: Vec<ModelTool>,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// A plain model text.
    Assistant(String),
    /// The output of a tool the model asked for.
    Tool(ToolCallResult),
    /// A provider-native model turn, usually one that requested tools.
    Opaque(OpaqueMessage),
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolCallResult {
    /// The identifier of the tool call request this answers.
    pub id: String,
    /// Name of the tool that was called.
    pub name: String,
    /// The tool output, or a description of why it failed.
    pub content: String,
}

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Natural-language description the model uses to decide when to call
    /// the tool.
    pub description: String,
    /// A [JSON schema](https://json-schema.org/) of the tool arguments.
    pub parameters: Value,
}
