use crate::shell::view;
use codedash_core::{Dashboard, DispatchOutcome, QueryKind};
use tracing::info;

pub async fn run(
    dashboard: &Dashboard,
    query: &str,
    fuzzy: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = dashboard.query(query, fuzzy).await?;
    let DispatchOutcome::Applied { kind, displayed, .. } = outcome else {
        return Err("Query text is empty".into());
    };
    info!("{} returned {} displayed items", kind.as_str(), displayed);
    print_view(dashboard, kind, json)
}

/// Prints the result view the last dispatch produced.
pub fn print_view(
    dashboard: &Dashboard,
    kind: QueryKind,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = dashboard.state();
    if json {
        println!("{}", serde_json::to_string_pretty(&state.search_results)?);
        return Ok(());
    }
    if kind == QueryKind::StacktraceAnalysis {
        println!("{}\n", view::render_summaries(&state.view.summaries));
    }
    if !state.view.tree.is_empty() {
        println!("{}\n", view::render_tree(&state.view.tree));
    }
    println!("{}", view::render_results(&state.view.display_items));
    Ok(())
}
