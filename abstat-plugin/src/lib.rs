//! abstat Plugin System
//!
//! Calculators are registered as plugins so that outer surfaces (the MCP
//! server, tests, embedding programs) can discover and call them by name
//! with JSON arguments.

mod traits;
mod registry;
mod context;

pub use traits::{CalculatorPlugin, FunctionMeta, ArgMeta};
pub use registry::PluginRegistry;
pub use context::CalcContext;

/// Re-export core types for plugin authors
pub mod prelude {
    pub use crate::{CalculatorPlugin, FunctionMeta, ArgMeta, PluginRegistry, CalcContext};
    pub use abstat_core::prelude::*;
    pub use serde_json::{json, Value as JsonValue};
}
