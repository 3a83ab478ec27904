use super::id::FunctionId;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Source location shared by every recognized result variant.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct SourceRef {
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default)]
    pub function_id: Option<FunctionId>,
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
}

/// A search hit referencing a contiguous source span.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct ChunkHit {
    #[serde(flatten)]
    pub source: SourceRef,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub complexity_score: Option<f64>,
    #[serde(default)]
    pub business_impact_score: Option<f64>,
}

/// A function the backend resolved from a stack frame.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct FunctionSummary {
    #[serde(flatten)]
    pub source: SourceRef,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub complexity_score: Option<f64>,
}

/// A frame the backend could not resolve, or a per-frame failure.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct FrameError {
    #[serde(flatten)]
    pub source: SourceRef,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl FrameError {
    pub fn text(&self) -> &str {
        self.message
            .as_deref()
            .or(self.summary.as_deref())
            .unwrap_or("Error occurred")
    }
}

/// Discriminator of the three recognized result variants.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Chunk,
    FunctionSummary,
    Error,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Chunk => "chunk",
            ItemKind::FunctionSummary => "function_summary",
            ItemKind::Error => "error",
        }
    }

    /// Maps a wire `type` value to a known variant. The backend reports
    /// unresolvable stack frames as `missing`; those are relabelled as errors.
    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "chunk" => Some(ItemKind::Chunk),
            "function_summary" => Some(ItemKind::FunctionSummary),
            "error" | "missing" => Some(ItemKind::Error),
            _ => None,
        }
    }
}

/// One element of a search or analysis response.
///
/// Decoding never fails: items whose `type` is unknown, or whose shape does
/// not match their declared variant, become [`ResultItem::Unrecognized`] and
/// are excluded by the classifier.
#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultItem {
    Chunk(ChunkHit),
    FunctionSummary(FunctionSummary),
    Error(FrameError),
    Unrecognized { kind: Option<String>, raw: Value },
}

impl ResultItem {
    pub fn from_wire(value: Value) -> Self {
        let tag = value.get("type").and_then(Value::as_str).map(str::to_owned);
        let Some(kind) = tag.as_deref().and_then(ItemKind::from_wire) else {
            return ResultItem::Unrecognized { kind: tag, raw: value };
        };

        let decoded = match kind {
            ItemKind::Chunk => serde_json::from_value(value.clone()).map(ResultItem::Chunk),
            ItemKind::FunctionSummary => {
                serde_json::from_value(value.clone()).map(ResultItem::FunctionSummary)
            }
            ItemKind::Error => serde_json::from_value(value.clone()).map(ResultItem::Error),
        };

        decoded.unwrap_or_else(|e| {
            tracing::warn!("Dropping malformed '{}' result item: {}", kind.as_str(), e);
            ResultItem::Unrecognized { kind: tag, raw: value }
        })
    }

    pub fn kind(&self) -> Option<ItemKind> {
        match self {
            ResultItem::Chunk(_) => Some(ItemKind::Chunk),
            ResultItem::FunctionSummary(_) => Some(ItemKind::FunctionSummary),
            ResultItem::Error(_) => Some(ItemKind::Error),
            ResultItem::Unrecognized { .. } => None,
        }
    }

    pub fn source(&self) -> Option<&SourceRef> {
        match self {
            ResultItem::Chunk(c) => Some(&c.source),
            ResultItem::FunctionSummary(s) => Some(&s.source),
            ResultItem::Error(e) => Some(&e.source),
            ResultItem::Unrecognized { .. } => None,
        }
    }

    pub fn filepath(&self) -> Option<&str> {
        self.source().and_then(|s| s.filepath.as_deref())
    }

    pub fn function_id(&self) -> Option<&FunctionId> {
        self.source().and_then(|s| s.function_id.as_ref())
    }

    pub fn function_name(&self) -> Option<&str> {
        self.source().and_then(|s| s.function_name.as_deref())
    }

    /// Span of the item, when the backend reported both ends.
    pub fn line_range(&self) -> Option<HighlightRange> {
        let source = self.source()?;
        Some(HighlightRange::new(source.start_line?, source.end_line?))
    }
}

impl<'de> Deserialize<'de> for ResultItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ResultItem::from_wire)
    }
}

/// Inclusive span in absolute source coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
pub struct HighlightRange {
    pub start_line: u32,
    pub end_line: u32,
}

impl HighlightRange {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    pub fn contains(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    pub fn is_empty(&self) -> bool {
        self.start_line > self.end_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_mixed_analysis_response() {
        let items: Vec<ResultItem> = serde_json::from_value(json!([
            {"type": "function_summary", "filepath": "src/auth.ext", "function_name": "login",
             "function_id": 7, "start_line": 42, "end_line": 60},
            {"type": "error", "message": "frame 2 unresolved"},
            {"type": "missing", "summary": "No function found: a::b", "filepath": "a"},
            {"id": 3, "type": "chunk", "summary": "validates token", "start_line": 10,
             "end_line": 20, "complexity_score": 0.5},
            {"type": "telemetry", "value": 1},
        ]))
        .unwrap();

        assert_eq!(items.len(), 5);
        assert_eq!(items[0].kind(), Some(ItemKind::FunctionSummary));
        assert_eq!(items[0].function_id().map(FunctionId::as_str), Some("7"));
        match &items[1] {
            ResultItem::Error(e) => assert_eq!(e.text(), "frame 2 unresolved"),
            other => panic!("expected error, got {:?}", other),
        }
        match &items[2] {
            ResultItem::Error(e) => assert_eq!(e.text(), "No function found: a::b"),
            other => panic!("expected relabelled error, got {:?}", other),
        }
        assert_eq!(items[3].line_range(), Some(HighlightRange::new(10, 20)));
        assert!(matches!(
            &items[4],
            ResultItem::Unrecognized { kind: Some(k), .. } if k == "telemetry"
        ));
    }

    #[test]
    fn test_shape_mismatch_is_opaque() {
        let item = ResultItem::from_wire(json!({"type": "chunk", "start_line": "ten"}));
        assert_eq!(item.kind(), None);

        let untagged = ResultItem::from_wire(json!({"summary": "no type"}));
        assert!(matches!(untagged, ResultItem::Unrecognized { kind: None, .. }));
    }

    #[test]
    fn test_error_text_fallbacks() {
        assert_eq!(FrameError::default().text(), "Error occurred");
    }
}
