//! Plugin traits

use abstat_core::AbError;
use crate::CalcContext;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Metadata about a function argument
#[derive(Debug, Clone, Serialize)]
pub struct ArgMeta {
    pub name: &'static str,
    pub typ: &'static str,
    pub description: &'static str,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

impl ArgMeta {
    pub const fn required(name: &'static str, typ: &'static str, description: &'static str) -> Self {
        Self { name, typ, description, optional: false, default: None }
    }

    pub const fn optional(name: &'static str, typ: &'static str, description: &'static str, default: &'static str) -> Self {
        Self { name, typ, description, optional: true, default: Some(default) }
    }

    /// JSON Schema type keyword for this argument
    pub fn json_type(&self) -> &'static str {
        match self.typ {
            "Number" => "number",
            "Integer" => "integer",
            "Text" => "string",
            "Bool" => "boolean",
            t if t.starts_with("List") => "array",
            _ => "object",
        }
    }
}

/// Metadata for a calculator plugin
#[derive(Debug, Clone, Serialize)]
pub struct FunctionMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub args: &'static [ArgMeta],
    pub returns: &'static str,
    pub examples: &'static [&'static str],
    pub category: &'static str,
    pub related: &'static [&'static str],
}

/// Pure calculator plugin.
///
/// `args` is a JSON object keyed by argument name. Implementations must not
/// hold mutable state; one instance serves concurrent callers.
pub trait CalculatorPlugin: Send + Sync {
    fn meta(&self) -> FunctionMeta;
    fn call(&self, args: &JsonValue, ctx: &CalcContext) -> Result<JsonValue, AbError>;
}
