use std::sync::Arc;

use websage_model::{ModelTool, ToolCallRequest, ToolCallResult};

use super::object::ToolObject;
use super::{Error, Tool};

/// An object that manages the toolset and answers tool call requests from
/// the model.
///
/// Cloning is cheap, clones share the registered tools.
#[derive(Clone, Default)]
pub(crate) struct Manager {
    tools: Vec<Arc<dyn ToolObject>>,
}

impl Manager {
    /// Registers a tool, replacing any tool with the same name.
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        let name = Tool::name(&tool);
        self.tools.retain(|t| t.name() != name);
        self.tools.push(Arc::new(tool));
    }

    #[inline]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    #[inline]
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .iter()
            .map(|tool| tool.definition())
            .collect()
    }

    /// Runs the requested tool and renders its outcome as the text the
    /// model will read. Failures are reported as `Error: <reason>`.
    pub async fn call(&self, req: ToolCallRequest) -> ToolCallResult {
        let ToolCallRequest {
            id,
            name,
            arguments,
        } = req;

        let result = match self.tools.iter().find(|tool| tool.name() == name) {
            Some(tool) => {
                trace!("calling tool `{name}` ({id}) with args: {arguments}");
                tool.call(arguments).await
            }
            None => {
                warn!("tool not found: {name}");
                Err(Error::unknown_tool(&name))
            }
        };

        let content = match result {
            Ok(output) => output,
            Err(err) => {
                debug!("tool `{name}` ({id}) failed: {err}");
                err.to_tool_output()
            }
        };
        ToolCallResult { id, name, content }
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::tool::ToolResult;

    static EMPTY_SCHEMA: &Value = &Value::Null;

    #[derive(Deserialize)]
    struct EchoInput {
        text: String,
    }

    struct EchoTool;

    impl Tool for EchoTool {
        type Input = EchoInput;

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the text back"
        }

        fn parameter_schema(&self) -> &Value {
            EMPTY_SCHEMA
        }

        fn execute(
            &self,
            input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok(input.text))
        }
    }

    fn request(name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: "call:1".to_owned(),
            name: name.to_owned(),
            arguments,
        }
    }

    #[tokio::test]
    async fn test_call() {
        let mut manager = Manager::default();
        manager.add_tool(EchoTool);
        assert_eq!(manager.names(), ["echo"]);
        assert_eq!(manager.definitions()[0].description, "Echoes the text back");

        let result = manager
            .call(request("echo", json!({ "text": "hello" })))
            .await;
        assert_eq!(
            result,
            ToolCallResult {
                id: "call:1".to_owned(),
                name: "echo".to_owned(),
                content: "hello".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn test_call_failures() {
        let mut manager = Manager::default();
        manager.add_tool(EchoTool);

        let result = manager.call(request("missing", json!({}))).await;
        assert_eq!(result.content, "Error: unknown tool `missing`");

        let result = manager.call(request("echo", json!({ "txt": 1 }))).await;
        assert!(
            result
                .content
                .starts_with("Error: invalid arguments for `echo`: missing field")
        );
    }

    #[test]
    fn test_replace_tool() {
        let mut manager = Manager::default();
        manager.add_tool(EchoTool);
        manager.add_tool(EchoTool);
        assert_eq!(manager.names().len(), 1);
    }
}
