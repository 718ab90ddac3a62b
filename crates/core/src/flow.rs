//! Named, stateless question-answering entry points.
//!
//! A [`Flow`] answers one input with no memory of earlier calls: it checks
//! the input, renders it into a prompt template and asks a [`Generator`].
//! Flows are collected in a [`FlowRegistry`] so they can be invoked by name.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::ops::RangeInclusive;

use websage_model::ModelMessage;

use crate::error::GenerationError;
use crate::generate::Generator;

/// The placeholder replaced by the flow input in a prompt template.
pub const QUERY_PLACEHOLDER: &str = "{{query}}";

/// The error returned by a flow.
#[derive(Debug)]
pub enum FlowError {
    /// The input was rejected before contacting the model.
    InvalidInput(String),
    /// No flow is registered under the requested name.
    NotFound(String),
    /// The model could not produce an answer.
    Generation(GenerationError),
}

impl Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::InvalidInput(reason) => {
                write!(f, "invalid input: {reason}")
            }
            FlowError::NotFound(name) => write!(f, "no flow named `{name}`"),
            FlowError::Generation(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for FlowError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            FlowError::Generation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GenerationError> for FlowError {
    #[inline]
    fn from(err: GenerationError) -> Self {
        FlowError::Generation(err)
    }
}

/// A named question-answering flow.
#[derive(Clone)]
pub struct Flow {
    name: String,
    system_prompt: String,
    template: String,
    input_chars: RangeInclusive<usize>,
    generator: Generator,
}

impl Flow {
    /// Creates a flow that passes its input to `generator` unchanged.
    pub fn new<S: Into<String>>(name: S, generator: Generator) -> Self {
        Self {
            name: name.into(),
            system_prompt: String::new(),
            template: QUERY_PLACEHOLDER.to_owned(),
            input_chars: 1..=usize::MAX,
            generator,
        }
    }

    /// Sets the system prompt of every generation.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the prompt template. Every [`QUERY_PLACEHOLDER`] in it is
    /// replaced by the input.
    #[inline]
    pub fn with_prompt_template<S: Into<String>>(
        mut self,
        template: S,
    ) -> Self {
        self.template = template.into();
        self
    }

    /// Restricts how many characters the input may have.
    #[inline]
    pub fn with_input_chars(mut self, range: RangeInclusive<usize>) -> Self {
        self.input_chars = range;
        self
    }

    /// Returns the name of the flow.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the names of the tools the model may call.
    #[inline]
    pub fn tool_names(&self) -> Vec<&str> {
        self.generator.tool_names()
    }

    /// Renders the prompt for `input`.
    #[inline]
    pub fn render(&self, input: &str) -> String {
        self.template.replace(QUERY_PLACEHOLDER, input)
    }

    /// Answers `input`.
    pub async fn run(&self, input: &str) -> Result<String, FlowError> {
        let chars = input.chars().count();
        if !self.input_chars.contains(&chars) {
            debug!("flow `{}` rejected an input of {chars} chars", self.name);
            return Err(FlowError::InvalidInput(format!(
                "expected {} to {} characters, got {chars}",
                self.input_chars.start(),
                self.input_chars.end()
            )));
        }

        let messages = [ModelMessage::User(self.render(input))];
        let answer = self
            .generator
            .generate(&self.system_prompt, &messages)
            .await?;
        Ok(answer)
    }
}

/// Flows stored by name.
#[derive(Clone, Default)]
pub struct FlowRegistry {
    flows: Vec<Flow>,
}

impl FlowRegistry {
    /// Registers a flow, replacing any flow with the same name.
    pub fn register(&mut self, flow: Flow) {
        self.flows.retain(|f| f.name != flow.name);
        info!("registered flow `{}`", flow.name);
        self.flows.push(flow);
    }

    /// Returns the flow registered under `name`.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Flow> {
        self.flows.iter().find(|f| f.name == name)
    }

    /// Returns the names of all flows, in registration order.
    #[inline]
    pub fn names(&self) -> Vec<&str> {
        self.flows.iter().map(|f| f.name.as_str()).collect()
    }

    /// Runs the flow registered under `name`.
    pub async fn run(
        &self,
        name: &str,
        input: &str,
    ) -> Result<String, FlowError> {
        let Some(flow) = self.get(name) else {
            return Err(FlowError::NotFound(name.to_owned()));
        };
        flow.run(input).await
    }
}
