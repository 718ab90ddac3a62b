use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use websage_model::{ModelMessage, ModelRequest, ModelTool, ToolCallResult};

use crate::PROVIDER_NAME;

// -----------------------------
// Types shared in both directions
// -----------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Whether this part is plain answer text that can absorb more text.
    #[inline]
    pub fn is_plain_text(&self) -> bool {
        self.text.is_some()
            && self.thought != Some(true)
            && self.thought_signature.is_none()
            && self.function_call.is_none()
            && self.function_response.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub response_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub status: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters_json_schema: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

// -----------
// Conversions
// -----------

pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    let mut system_parts = vec![];
    let mut contents: Vec<Content> = vec![];

    for msg in &req.messages {
        match msg {
            ModelMessage::System(text) => system_parts.push(Part::text(text)),
            ModelMessage::User(text) => {
                contents.push(content_of("user", Part::text(text)));
            }
            ModelMessage::Assistant(text) => {
                contents.push(content_of("model", Part::text(text)));
            }
            ModelMessage::Tool(result) => {
                // Results of one model turn travel together in one user turn.
                let part = function_response_part(result);
                match contents.last_mut() {
                    Some(last) if is_function_responses(last) => {
                        last.parts.push(part)
                    }
                    _ => contents.push(content_of("user", part)),
                }
            }
            ModelMessage::Opaque(opaque) => {
                match opaque.to_raw::<Content>() {
                    Some(content) if opaque.provider() == PROVIDER_NAME => {
                        contents.push(content.clone());
                    }
                    _ => warn!(
                        "dropping opaque message from provider `{}`",
                        opaque.provider()
                    ),
                }
            }
        }
    }

    let system_instruction = if system_parts.is_empty() {
        None
    } else {
        Some(Content {
            role: None,
            parts: system_parts,
        })
    };

    let tools = if req.tools.is_empty() {
        vec![]
    } else {
        vec![Tool {
            function_declarations: req
                .tools
                .iter()
                .map(create_function_declaration)
                .collect(),
        }]
    };

    GenerateContentRequest {
        contents,
        system_instruction,
        tools,
    }
}

#[inline]
fn content_of(role: &str, part: Part) -> Content {
    Content {
        role: Some(role.to_owned()),
        parts: vec![part],
    }
}

#[inline]
fn is_function_responses(content: &Content) -> bool {
    content.role.as_deref() == Some("user")
        && !content.parts.is_empty()
        && content.parts.iter().all(|p| p.function_response.is_some())
}

#[inline]
fn function_response_part(result: &ToolCallResult) -> Part {
    Part {
        function_response: Some(FunctionResponse {
            name: result.name.clone(),
            response: json!({ "content": result.content }),
        }),
        ..Default::default()
    }
}

fn create_function_declaration(tool: &ModelTool) -> FunctionDeclaration {
    // Generators like schemars add metadata keys the API rejects.
    let mut parameters = tool.parameters.clone();
    if let Some(object) = parameters.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters_json_schema: parameters,
    }
}
