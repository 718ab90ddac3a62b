use std::future::ready;
use std::pin::Pin;

use serde_json::Value;
use tracing::Instrument;
use websage_model::ModelTool;

use super::{Error, Tool, ToolResult};

pub(crate) type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// A [`Tool`] with its input type erased: it takes the raw JSON arguments
/// the model produced.
pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn definition(&self) -> ModelTool;

    fn call(&self, arguments: Value) -> ToolFuture;
}

impl<T: Tool> ToolObject for T {
    #[inline]
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn definition(&self) -> ModelTool {
        ModelTool {
            name: Tool::name(self).to_owned(),
            description: self.description().to_owned(),
            parameters: self.parameter_schema().clone(),
        }
    }

    fn call(&self, arguments: Value) -> ToolFuture {
        match serde_json::from_value::<T::Input>(arguments) {
            Ok(input) => {
                let span = debug_span!("tool execute", tool = Tool::name(self));
                Box::pin(self.execute(input).instrument(span))
            }
            Err(err) => Box::pin(ready(Err(Error::invalid_input(format!(
                "invalid arguments for `{}`: {err}",
                Tool::name(self)
            ))))),
        }
    }
}
