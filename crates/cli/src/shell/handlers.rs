use super::command::ShellCommand;
use super::context::ShellContext;
use super::view;
use codedash_api::models::FunctionId;
use codedash_core::classify::FunctionTree;
use codedash_core::dashboard::OpenOutcome;
use codedash_core::{DispatchOutcome, QueryKind};

const DEFAULT_CODE_CONTEXT: usize = 12;

pub trait CommandHandler {
    fn handle(
        &self,
        cmd: &ShellCommand,
        context: &mut ShellContext,
    ) -> Result<String, Box<dyn std::error::Error>>;
}

pub struct RefreshHandler;
impl CommandHandler for RefreshHandler {
    fn handle(
        &self,
        _cmd: &ShellCommand,
        context: &mut ShellContext,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let dashboard = context.dashboard.clone();
        match context.rt_handle.block_on(dashboard.load()) {
            Ok(_) => {
                let state = context.state();
                Ok(view::render_progress(
                    state.progress.as_ref(),
                    &dashboard.config().insights,
                ))
            }
            Err(e) => {
                tracing::debug!("Refresh failed: {}", e);
                let message = context
                    .state()
                    .load_error
                    .clone()
                    .unwrap_or_else(|| e.to_string());
                Err(message.into())
            }
        }
    }
}

/// Read-only views over the current state.
pub struct PanelHandler;
impl CommandHandler for PanelHandler {
    fn handle(
        &self,
        cmd: &ShellCommand,
        context: &mut ShellContext,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let state = context.state();
        let insights = &context.dashboard.config().insights;
        let output = match cmd {
            ShellCommand::Progress => view::render_progress(state.progress.as_ref(), insights),
            ShellCommand::Functions => view::render_functions(&state.functions),
            ShellCommand::Analytics => view::render_analytics(&state.functions, insights),
            ShellCommand::Results => view::render_results(&state.view.display_items),
            ShellCommand::Tree => view::render_tree(&state.view.tree),
            ShellCommand::Summaries => view::render_summaries(&state.view.summaries),
            ShellCommand::State => serde_json::to_string_pretty(&*state)?,
            ShellCommand::Config => serde_json::to_string_pretty(context.dashboard.config())?,
            _ => String::new(),
        };
        Ok(output)
    }
}

pub struct QueryHandler;
impl QueryHandler {
    pub fn run(
        &self,
        text: &str,
        fuzzy: bool,
        context: &mut ShellContext,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let dashboard = context.dashboard.clone();
        match context.rt_handle.block_on(dashboard.query(text, fuzzy)) {
            Ok(DispatchOutcome::Ignored) => Ok(String::new()),
            Ok(DispatchOutcome::Superseded { .. }) => Ok(String::new()),
            Ok(DispatchOutcome::Applied { kind, .. }) => Ok(render_query_view(kind, context)),
            Err(e) => {
                tracing::debug!("Query failed: {}", e);
                let message = context
                    .state()
                    .search_error
                    .clone()
                    .unwrap_or_else(|| e.to_string());
                Err(message.into())
            }
        }
    }
}

impl CommandHandler for QueryHandler {
    fn handle(
        &self,
        cmd: &ShellCommand,
        context: &mut ShellContext,
    ) -> Result<String, Box<dyn std::error::Error>> {
        if let ShellCommand::Query { text, fuzzy } = cmd {
            let fuzzy = *fuzzy || context.fuzzy();
            self.run(&text.join(" "), fuzzy, context)
        } else {
            Ok(String::new())
        }
    }
}

fn render_query_view(kind: QueryKind, context: &ShellContext) -> String {
    let state = context.state();
    let view_state = &state.view;
    let mut sections = Vec::new();
    match kind {
        QueryKind::StacktraceAnalysis => {
            sections.push(format!(
                "Stack trace summary\n{}",
                view::render_summaries(&view_state.summaries)
            ));
            if !view_state.tree.is_empty() {
                sections.push(format!("Functions\n{}", view::render_tree(&view_state.tree)));
            }
        }
        QueryKind::PlainSearch => {
            if let FunctionTree::Single(_) = view_state.tree {
                sections.push(format!("Function\n{}", view::render_tree(&view_state.tree)));
            }
        }
    }
    sections.push(format!(
        "Results\n{}",
        view::render_results(&view_state.display_items)
    ));
    sections.join("\n\n")
}

pub struct ToggleHandler;
impl CommandHandler for ToggleHandler {
    fn handle(
        &self,
        cmd: &ShellCommand,
        context: &mut ShellContext,
    ) -> Result<String, Box<dyn std::error::Error>> {
        match cmd {
            ShellCommand::Fuzzy { mode } => {
                context.set_fuzzy(mode.enabled());
                Ok(format!("Fuzzy search {}", on_off(mode.enabled())))
            }
            ShellCommand::Auto { mode } => {
                context.set_auto_refresh(mode.enabled());
                Ok(format!(
                    "Auto-refresh {} (every {}s)",
                    on_off(mode.enabled()),
                    context.dashboard.config().refresh_interval_secs
                ))
            }
            _ => Ok(String::new()),
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

pub struct CodeHandler;
impl CodeHandler {
    fn open(
        &self,
        context: &ShellContext,
        target: OpenTarget,
    ) -> Result<OpenOutcome, Box<dyn std::error::Error>> {
        let dashboard = context.dashboard.clone();
        let outcome = match target {
            OpenTarget::Leaf(index) => context.rt_handle.block_on(dashboard.open_tree_leaf(index))?,
            OpenTarget::Id(id) => context.rt_handle.block_on(dashboard.open_function(&id))?,
        };
        Ok(outcome)
    }

    fn render_pane(&self, context: &ShellContext, rows: Option<usize>) -> String {
        match context.dashboard.code_pane() {
            Some(pane) => {
                let rows = match rows {
                    Some(radius) => pane.window(radius),
                    None => pane.rows(),
                };
                format!("{}\n{}", pane.signature, view::render_code(rows, true))
            }
            None => "No function open. Use 'open <tree-index>' or 'open --id <id>'.".to_string(),
        }
    }
}

enum OpenTarget {
    Leaf(usize),
    Id(FunctionId),
}

impl CommandHandler for CodeHandler {
    fn handle(
        &self,
        cmd: &ShellCommand,
        context: &mut ShellContext,
    ) -> Result<String, Box<dyn std::error::Error>> {
        match cmd {
            ShellCommand::Open { index, id } => {
                let target = match (index, id) {
                    (_, Some(id)) => OpenTarget::Id(FunctionId::from(id.as_str())),
                    (Some(index), None) => OpenTarget::Leaf(*index),
                    (None, None) => return Err("Specify a tree index or --id".into()),
                };
                match self.open(context, target)? {
                    OpenOutcome::Displayed { .. } => Ok(self.render_pane(context, None)),
                    OpenOutcome::Superseded => Ok(String::new()),
                }
            }
            ShellCommand::Select { index, open } => {
                if *open {
                    let function_id = context
                        .state()
                        .view
                        .item(*index)
                        .and_then(|item| item.function_id().cloned())
                        .ok_or_else(|| format!("Result #{} has no function id", index))?;
                    self.open(context, OpenTarget::Id(function_id))?;
                }
                let selection = context.dashboard.select_result(*index)?;
                if context.dashboard.code_pane().is_none() {
                    return Ok(format!(
                        "Lines {}-{} selected; no function open.",
                        selection.range.start_line, selection.range.end_line
                    ));
                }
                if selection.focus.marked == 0 {
                    return Ok(format!(
                        "Lines {}-{} are outside the displayed function.",
                        selection.range.start_line, selection.range.end_line
                    ));
                }
                Ok(self.render_pane(context, Some(DEFAULT_CODE_CONTEXT)))
            }
            ShellCommand::Code { context: rows } => Ok(self.render_pane(context, *rows)),
            _ => Ok(String::new()),
        }
    }
}

pub struct ClearHandler;
impl CommandHandler for ClearHandler {
    fn handle(
        &self,
        _cmd: &ShellCommand,
        _context: &mut ShellContext,
    ) -> Result<String, Box<dyn std::error::Error>> {
        Ok(String::new())
    }
}

pub fn get_handler(cmd: &ShellCommand) -> Box<dyn CommandHandler> {
    match cmd {
        ShellCommand::Refresh => Box::new(RefreshHandler),
        ShellCommand::Query { .. } => Box::new(QueryHandler),
        ShellCommand::Fuzzy { .. } | ShellCommand::Auto { .. } => Box::new(ToggleHandler),
        ShellCommand::Open { .. } | ShellCommand::Select { .. } | ShellCommand::Code { .. } => {
            Box::new(CodeHandler)
        }
        ShellCommand::Clear => Box::new(ClearHandler),
        _ => Box::new(PanelHandler),
    }
}
