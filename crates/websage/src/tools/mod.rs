//! Tools the model can call.

mod search;

pub use search::{SearchWebParameters, SearchWebTool, format_results};
