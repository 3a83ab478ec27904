use super::id::FunctionId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record of the ranked function list (`GET /functions?include_stats=true`).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct FunctionStats {
    pub function_name: String,
    pub filepath: String,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub avg_complexity: Option<f64>,
    #[serde(default)]
    pub avg_impact: Option<f64>,
}

impl FunctionStats {
    pub fn complexity(&self) -> f64 {
        self.avg_complexity.unwrap_or(0.0)
    }

    pub fn impact(&self) -> f64 {
        self.avg_impact.unwrap_or(0.0)
    }
}

/// A declared parameter of a function, as stored by the analysis backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.default {
            Some(Value::String(s)) => write!(f, "{} = {}", self.name, s),
            Some(other) => write!(f, "{} = {}", self.name, other),
            None => f.write_str(&self.name),
        }
    }
}

/// Full body of one function (`GET /code/{function_id}`).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct FunctionDocument {
    /// The `/code` endpoint does not echo the id; callers fill it in.
    #[serde(default)]
    pub function_id: Option<FunctionId>,
    pub function_name: String,
    /// Serialized parameter list. Usually a JSON-encoded string, sometimes an
    /// inline array; see [`FunctionDocument::parameters`].
    #[serde(default)]
    pub parameters: Option<Value>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
}

pub const EMPTY_CODE_PLACEHOLDER: &str = "// No source code found";

impl FunctionDocument {
    /// Absolute line of the first rendered row.
    pub fn anchor(&self) -> u32 {
        self.start_line.unwrap_or(0)
    }

    /// Decoded parameter list. A payload that does not parse as a list of
    /// `{name, default?}` yields an empty list.
    pub fn parameters(&self) -> Vec<Parameter> {
        match &self.parameters {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(raw)) => parse_parameters(raw),
            Some(inline @ Value::Array(_)) => decode_parameters(inline.clone()),
            Some(other) => {
                tracing::warn!("Unexpected parameter payload shape: {}", other);
                Vec::new()
            }
        }
    }

    /// `name(a, b = 1)`
    pub fn signature(&self) -> String {
        let params = self
            .parameters()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.function_name, params)
    }

    /// Text shown in the code pane: the signature header followed by the body.
    pub fn display_text(&self) -> String {
        let code = match self.code.as_deref() {
            Some(code) if !code.is_empty() => code,
            _ => EMPTY_CODE_PLACEHOLDER,
        };
        format!("{} {}", self.signature(), code)
    }
}

/// Parses a JSON-encoded parameter list.
pub fn parse_parameters(raw: &str) -> Vec<Parameter> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => decode_parameters(value),
        Err(e) => {
            tracing::warn!("Parameter parsing failed: {}", e);
            Vec::new()
        }
    }
}

fn decode_parameters(value: Value) -> Vec<Parameter> {
    if !value.is_array() {
        return Vec::new();
    }
    match serde_json::from_value::<Vec<Parameter>>(value) {
        Ok(params) => params,
        Err(e) => {
            tracing::warn!("Parameter list has unexpected entries: {}", e);
            Vec::new()
        }
    }
}
