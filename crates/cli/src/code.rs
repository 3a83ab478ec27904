use crate::shell::view;
use codedash_api::models::{FunctionId, HighlightRange};
use codedash_core::Dashboard;
use codedash_core::dashboard::OpenOutcome;

pub fn parse_span(raw: &str) -> Result<(u32, u32), String> {
    let (start, end) = raw
        .split_once('-')
        .ok_or_else(|| format!("expected START-END, got '{}'", raw))?;
    let start: u32 = start.trim().parse().map_err(|e| format!("bad start line: {}", e))?;
    let end: u32 = end.trim().parse().map_err(|e| format!("bad end line: {}", e))?;
    if start > end {
        return Err(format!("start line {} is after end line {}", start, end));
    }
    Ok((start, end))
}

pub async fn run(
    dashboard: &Dashboard,
    id: &str,
    highlight: Option<(u32, u32)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let function_id = FunctionId::from(id);
    if let OpenOutcome::Superseded = dashboard.open_function(&function_id).await? {
        return Ok(());
    }
    if let Some((start, end)) = highlight {
        let focus = dashboard.highlight(HighlightRange::new(start, end));
        if focus.marked == 0 {
            eprintln!("Lines {}-{} are outside this function", start, end);
        }
    }
    if let Some(pane) = dashboard.code_pane() {
        println!("{}", pane.signature);
        print!("{}", view::render_code(pane.rows(), highlight.is_some()));
    }
    Ok(())
}
