//! Plugin Registry

use crate::{CalculatorPlugin, FunctionMeta};
use crate::CalcContext;
use abstat_core::AbError;
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Central plugin registry
pub struct PluginRegistry {
    functions: BTreeMap<String, Arc<dyn CalculatorPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    pub fn with_function<F: CalculatorPlugin + 'static>(mut self, f: F) -> Self {
        let name = f.meta().name.to_lowercase();
        self.functions.insert(name, Arc::new(f));
        self
    }

    pub fn get_function(&self, name: &str) -> Option<&dyn CalculatorPlugin> {
        self.functions.get(&name.to_lowercase()).map(|f| f.as_ref())
    }

    /// Metadata of every registered function, ordered by name
    pub fn metas(&self) -> Vec<FunctionMeta> {
        self.functions.values().map(|f| f.meta()).collect()
    }

    pub fn call_function(&self, name: &str, args: &JsonValue, ctx: &CalcContext) -> Result<JsonValue, AbError> {
        match self.get_function(name) {
            Some(f) => {
                tracing::debug!(function = name, "dispatching calculator");
                f.call(args, ctx)
            }
            None => {
                tracing::warn!(function = name, "unknown calculator requested");
                // Find similar function names for better error message
                let similar = self.find_similar_functions(name);
                let mut err = AbError::undefined_func(name);
                if !similar.is_empty() {
                    let suggestions: Vec<&str> = similar.iter().take(5).map(|s| s.as_str()).collect();
                    err = err.with_suggestion(format!(
                        "Similar: {}. Use list_functions for full list.",
                        suggestions.join(", ")
                    ));
                }
                Err(err)
            }
        }
    }

    /// Find function names similar to the given name (for error suggestions)
    fn find_similar_functions(&self, name: &str) -> Vec<String> {
        let name_lower = name.to_lowercase();
        let mut matches: Vec<(String, usize)> = self.functions.keys()
            .filter_map(|func_name| {
                let score = Self::similarity_score(&name_lower, func_name);
                if score > 0 {
                    Some((func_name.clone(), score))
                } else {
                    None
                }
            })
            .collect();

        // Higher score first; ties keep name order
        matches.sort_by(|a, b| b.1.cmp(&a.1));
        matches.into_iter().map(|(name, _)| name).collect()
    }

    /// Calculate similarity score between two strings
    fn similarity_score(query: &str, candidate: &str) -> usize {
        let mut score = 0;

        if candidate.starts_with(query) {
            score += 100;
        } else if candidate.contains(query) {
            score += 50;
        } else if query.contains(candidate) {
            score += 30;
        }

        // Shared word fragments ("plan", "test", "mean", ...)
        let query_parts: HashSet<&str> = query.split('_').filter(|p| !p.is_empty()).collect();
        let shared = candidate.split('_').filter(|p| query_parts.contains(p)).count();
        score += shared * 20;

        if score > 0 {
            let len_diff = (query.len() as i32 - candidate.len() as i32).unsigned_abs() as usize;
            if len_diff < 5 {
                score += 5 - len_diff;
            }
        }

        score
    }

    pub fn help(&self, name: Option<&str>) -> Result<JsonValue, AbError> {
        match name {
            Some(n) => self.help_for(n),
            None => Ok(self.general_help()),
        }
    }

    fn help_for(&self, name: &str) -> Result<JsonValue, AbError> {
        match self.functions.get(&name.to_lowercase()) {
            Some(f) => Ok(Self::function_to_help(&f.meta())),
            None => Err(AbError::undefined_func(name)),
        }
    }

    fn general_help(&self) -> JsonValue {
        let mut funcs_by_cat: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();
        for f in self.functions.values() {
            let meta = f.meta();
            funcs_by_cat.entry(meta.category).or_default().push(meta.name);
        }

        json!({
            "functions": funcs_by_cat,
            "usage": "Call help with a function name for detailed help.",
        })
    }

    fn function_to_help(meta: &FunctionMeta) -> JsonValue {
        json!({
            "name": meta.name,
            "type": "function",
            "description": meta.description,
            "usage": meta.usage,
            "returns": meta.returns,
            "category": meta.category,
            "args": meta.args,
            "examples": meta.examples,
            "related": meta.related,
        })
    }

    pub fn list_functions(&self, category: Option<&str>) -> JsonValue {
        let funcs: Vec<JsonValue> = self.functions.values()
            .map(|f| f.meta())
            .filter(|meta| category.map_or(true, |c| meta.category == c))
            .map(|meta| json!({
                "name": meta.name,
                "description": meta.description,
                "usage": meta.usage,
                "category": meta.category,
            }))
            .collect();
        JsonValue::Array(funcs)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
