//! Normalization of a backend result stream into the views the dashboard
//! renders: the result list, the function tree and the stack-trace summary
//! panel.

use crate::router::QueryKind;
use codedash_api::models::{FunctionId, ItemKind, ResultItem};
use indexmap::IndexMap;
use serde::Serialize;

/// Group label for summaries the backend did not attach to a file.
pub const UNKNOWN_FILE: &str = "(unknown file)";

/// Items split by their `type` discriminator. Unrecognized items appear in
/// none of the partitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub chunks: Vec<ResultItem>,
    pub summaries: Vec<ResultItem>,
    pub errors: Vec<ResultItem>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.chunks.len() + self.summaries.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn classify(items: &[ResultItem]) -> Partition {
    let mut partition = Partition::default();
    for item in items {
        match item.kind() {
            Some(ItemKind::Chunk) => partition.chunks.push(item.clone()),
            Some(ItemKind::FunctionSummary) => partition.summaries.push(item.clone()),
            Some(ItemKind::Error) => partition.errors.push(item.clone()),
            None => {}
        }
    }
    partition
}

/// Stable group-by on `filepath`: groups appear in first-seen order and each
/// group keeps the relative order of its items.
pub fn group_by_filepath(items: &[ResultItem]) -> IndexMap<String, Vec<ResultItem>> {
    let mut groups: IndexMap<String, Vec<ResultItem>> = IndexMap::new();
    for item in items {
        let key = item.filepath().unwrap_or(UNKNOWN_FILE).to_string();
        groups.entry(key).or_default().push(item.clone());
    }
    groups
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "layout", content = "items", rename_all = "snake_case")]
pub enum FunctionTree {
    #[default]
    Empty,
    /// A lone function summary from a plain search, shown without a file group.
    Single(ResultItem),
    Grouped(IndexMap<String, Vec<ResultItem>>),
}

/// A selectable leaf of the tree, numbered in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLeaf<'a> {
    pub index: usize,
    pub group: Option<&'a str>,
    pub item: &'a ResultItem,
}

impl FunctionTree {
    pub fn leaves(&self) -> Vec<TreeLeaf<'_>> {
        match self {
            FunctionTree::Empty => Vec::new(),
            FunctionTree::Single(item) => vec![TreeLeaf {
                index: 0,
                group: None,
                item,
            }],
            FunctionTree::Grouped(groups) => groups
                .iter()
                .flat_map(|(path, items)| items.iter().map(move |item| (path.as_str(), item)))
                .enumerate()
                .map(|(index, (group, item))| TreeLeaf {
                    index,
                    group: Some(group),
                    item,
                })
                .collect(),
        }
    }

    pub fn leaf(&self, index: usize) -> Option<&ResultItem> {
        self.leaves().into_iter().nth(index).map(|leaf| leaf.item)
    }

    pub fn len(&self) -> usize {
        match self {
            FunctionTree::Empty => 0,
            FunctionTree::Single(_) => 1,
            FunctionTree::Grouped(groups) => groups.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryOutcome {
    Resolved,
    Unresolved,
}

/// One line of the stack-trace summary panel: a resolved frame or a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub outcome: SummaryOutcome,
    pub text: String,
    pub function_id: Option<FunctionId>,
}

impl SummaryEntry {
    fn from_item(item: &ResultItem) -> Option<Self> {
        match item {
            ResultItem::FunctionSummary(summary) => Some(Self {
                outcome: SummaryOutcome::Resolved,
                text: format!(
                    "Found function: {} in {}",
                    summary.source.function_name.as_deref().unwrap_or("?"),
                    summary.source.filepath.as_deref().unwrap_or(UNKNOWN_FILE)
                ),
                function_id: summary.source.function_id.clone(),
            }),
            ResultItem::Error(error) => Some(Self {
                outcome: SummaryOutcome::Unresolved,
                text: error.text().to_string(),
                function_id: None,
            }),
            ResultItem::Chunk(_) | ResultItem::Unrecognized { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome == SummaryOutcome::Resolved
    }
}

/// Everything the result-related views render, derived from one response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultView {
    pub kind: Option<QueryKind>,
    pub display_items: Vec<ResultItem>,
    pub tree: FunctionTree,
    pub summaries: Vec<SummaryEntry>,
    pub errors: Vec<ResultItem>,
}

impl ResultView {
    pub fn build(kind: QueryKind, items: &[ResultItem]) -> Self {
        let partition = classify(items);
        match kind {
            QueryKind::StacktraceAnalysis => {
                // Summaries and errors interleave in frame order.
                let summaries = items.iter().filter_map(SummaryEntry::from_item).collect();
                let tree = if partition.summaries.is_empty() {
                    FunctionTree::Empty
                } else {
                    FunctionTree::Grouped(group_by_filepath(&partition.summaries))
                };
                Self {
                    kind: Some(kind),
                    display_items: partition.chunks,
                    tree,
                    summaries,
                    errors: partition.errors,
                }
            }
            QueryKind::PlainSearch => {
                let tree = partition
                    .summaries
                    .into_iter()
                    .next()
                    .map(FunctionTree::Single)
                    .unwrap_or_default();
                Self {
                    kind: Some(kind),
                    display_items: partition.chunks,
                    tree,
                    summaries: Vec::new(),
                    errors: partition.errors,
                }
            }
        }
    }

    /// The result card at `index` of the display list.
    pub fn item(&self, index: usize) -> Option<&ResultItem> {
        self.display_items.get(index)
    }
}
