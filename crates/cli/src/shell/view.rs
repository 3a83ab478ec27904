use codedash_api::models::{FunctionStats, ProgressSnapshot, ResultItem};
use codedash_core::classify::{FunctionTree, SummaryEntry};
use codedash_core::code_view::CodeRow;
use codedash_core::config::InsightConfig;
use codedash_core::insights::{debt_candidates, summarize_progress, top_complex_functions};
use nu_ansi_term::Color;
use tabled::{Table, Tabled, settings::Style};

const SUMMARY_WIDTH: usize = 60;

#[derive(Tabled)]
pub struct MetricView {
    pub metric: String,
    pub value: String,
}

#[derive(Tabled)]
pub struct FunctionView {
    #[tabled(rename = "#")]
    pub index: usize,
    pub function: String,
    pub file: String,
    pub complexity: String,
    pub impact: String,
}

impl FunctionView {
    fn from_stats(index: usize, stats: &FunctionStats) -> Self {
        let function = match &stats.class_name {
            Some(class) => format!("{}::{}", class, stats.function_name),
            None => stats.function_name.clone(),
        };
        Self {
            index,
            function,
            file: stats.filepath.clone(),
            complexity: score(stats.avg_complexity),
            impact: score(stats.avg_impact),
        }
    }
}

#[derive(Tabled)]
pub struct ResultView {
    #[tabled(rename = "#")]
    pub index: usize,
    pub function: String,
    pub location: String,
    pub complexity: String,
    pub impact: String,
    pub summary: String,
}

impl ResultView {
    fn from_item(index: usize, item: &ResultItem) -> Self {
        let (complexity, impact, summary) = match item {
            ResultItem::Chunk(hit) => (
                score(hit.complexity_score),
                score(hit.business_impact_score),
                hit.summary.clone().unwrap_or_default(),
            ),
            ResultItem::FunctionSummary(s) => (
                score(s.complexity_score),
                "-".to_string(),
                s.summary.clone().unwrap_or_default(),
            ),
            ResultItem::Error(e) => ("-".to_string(), "-".to_string(), e.text().to_string()),
            ResultItem::Unrecognized { .. } => ("-".to_string(), "-".to_string(), String::new()),
        };
        Self {
            index,
            function: item.function_name().unwrap_or("-").to_string(),
            location: location(item),
            complexity,
            impact,
            summary: truncate(&summary, SUMMARY_WIDTH),
        }
    }
}

#[derive(Tabled)]
pub struct TreeView {
    #[tabled(rename = "#")]
    pub index: usize,
    pub file: String,
    pub function: String,
    pub id: String,
}

#[derive(Tabled)]
pub struct SummaryView {
    pub status: String,
    pub detail: String,
    pub id: String,
}

fn score(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn location(item: &ResultItem) -> String {
    let file = item.filepath().unwrap_or("-");
    match item.line_range() {
        Some(range) => format!("{}:{}-{}", file, range.start_line, range.end_line),
        None => file.to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= width {
        single_line
    } else {
        let cut: String = single_line.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

pub fn render_progress(progress: Option<&ProgressSnapshot>, insights: &InsightConfig) -> String {
    let Some(progress) = progress else {
        return "No progress data loaded. Run 'refresh'.".to_string();
    };
    let summary = summarize_progress(progress, insights.chunks_per_minute);
    let rows = vec![
        MetricView {
            metric: "Total chunks".to_string(),
            value: summary.total_chunks.to_string(),
        },
        MetricView {
            metric: "Enriched".to_string(),
            value: summary.enriched_chunks.to_string(),
        },
        MetricView {
            metric: "Pending".to_string(),
            value: summary.pending_chunks.to_string(),
        },
        MetricView {
            metric: "Progress".to_string(),
            value: format!("{:.1}%", summary.percentage),
        },
        MetricView {
            metric: "ETA".to_string(),
            value: format!("{} min", summary.eta_minutes),
        },
        MetricView {
            metric: "Status".to_string(),
            value: summary.status.to_string(),
        },
        MetricView {
            metric: "Avg complexity".to_string(),
            value: score(progress.avg_complexity),
        },
        MetricView {
            metric: "Avg impact".to_string(),
            value: score(progress.avg_impact),
        },
    ];
    Table::new(rows).with(Style::psql()).to_string()
}

pub fn render_functions(functions: &[FunctionStats]) -> String {
    if functions.is_empty() {
        return "NO FUNCTIONS LOADED".to_string();
    }
    let views: Vec<FunctionView> = functions
        .iter()
        .enumerate()
        .map(|(i, f)| FunctionView::from_stats(i, f))
        .collect();
    Table::new(views).with(Style::psql()).to_string()
}

pub fn render_analytics(functions: &[FunctionStats], insights: &InsightConfig) -> String {
    let top = top_complex_functions(functions, insights.max_complex_shown);
    let debt = debt_candidates(functions, insights);

    let mut out = String::from("Most complex functions\n");
    if top.is_empty() {
        out.push_str("  (none)\n");
    } else {
        let views: Vec<FunctionView> = top
            .iter()
            .enumerate()
            .map(|(i, f)| FunctionView::from_stats(i, f))
            .collect();
        out.push_str(&Table::new(views).with(Style::psql()).to_string());
        out.push('\n');
    }

    out.push_str(&format!(
        "\nTechnical debt candidates: {} (complexity > {}, impact < {})\n",
        debt.total, insights.high_complexity, insights.low_impact
    ));
    if !debt.shown.is_empty() {
        let views: Vec<FunctionView> = debt
            .shown
            .iter()
            .enumerate()
            .map(|(i, f)| FunctionView::from_stats(i, f))
            .collect();
        out.push_str(&Table::new(views).with(Style::psql()).to_string());
    }
    out
}

pub fn render_results(items: &[ResultItem]) -> String {
    if items.is_empty() {
        return "NO RECORDS FOUND".to_string();
    }
    let views: Vec<ResultView> = items
        .iter()
        .enumerate()
        .map(|(i, item)| ResultView::from_item(i, item))
        .collect();
    Table::new(views).with(Style::psql()).to_string()
}

pub fn render_tree(tree: &FunctionTree) -> String {
    let leaves = tree.leaves();
    if leaves.is_empty() {
        return "NO FUNCTIONS IN TREE".to_string();
    }
    let views: Vec<TreeView> = leaves
        .iter()
        .map(|leaf| TreeView {
            index: leaf.index,
            file: leaf.group.unwrap_or("-").to_string(),
            function: leaf.item.function_name().unwrap_or("-").to_string(),
            id: leaf
                .item
                .function_id()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    Table::new(views).with(Style::psql()).to_string()
}

pub fn render_summaries(entries: &[SummaryEntry]) -> String {
    if entries.is_empty() {
        return "NO STACK TRACE SUMMARY".to_string();
    }
    let views: Vec<SummaryView> = entries
        .iter()
        .map(|entry| SummaryView {
            status: if entry.is_resolved() {
                "found".to_string()
            } else {
                "error".to_string()
            },
            detail: entry.text.clone(),
            id: entry
                .function_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    Table::new(views).with(Style::psql()).to_string()
}

/// Numbered code listing; highlighted rows are marked and colored.
pub fn render_code(rows: &[CodeRow], color: bool) -> String {
    let width = rows
        .last()
        .map(|row| row.line.to_string().len())
        .unwrap_or(1);
    let mut out = String::new();
    for row in rows {
        let marker = if row.highlighted { ">" } else { " " };
        let line = format!("{} {:>width$} | {}", marker, row.line, row.text, width = width);
        if color && row.highlighted {
            out.push_str(&Color::Yellow.bold().paint(line).to_string());
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use codedash_api::models::FunctionDocument;
    use codedash_api::models::HighlightRange;
    use codedash_core::code_view::CodeNavigator;
    use serde_json::json;

    #[test]
    fn test_truncate_collapses_whitespace() {
        assert_eq!(truncate("a\n  b", 10), "a b");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_render_code_marks_highlighted_rows() {
        let doc = FunctionDocument {
            function_name: "f".to_string(),
            code: Some("{\n  x();\n}".to_string()),
            start_line: Some(9),
            ..Default::default()
        };
        let mut nav = CodeNavigator::default();
        nav.display(&doc);
        nav.highlight(HighlightRange::new(10, 10));

        let out = render_code(nav.pane().unwrap().rows(), false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "   9 | f() {");
        assert_eq!(lines[1], "> 10 |   x();");
    }

    #[test]
    fn test_render_results_lists_location() {
        let item = ResultItem::from_wire(json!({
            "type": "chunk", "function_name": "login", "filepath": "auth.ext",
            "start_line": 3, "end_line": 7, "complexity_score": 0.5
        }));
        let out = render_results(&[item]);
        assert!(out.contains("auth.ext:3-7"));
        assert!(out.contains("0.50"));
    }
}
