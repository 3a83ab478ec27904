use super::context::ShellContext;
use reedline::{Completer, Span, Suggestion};

const TOGGLE_VALUES: [&str; 2] = ["on", "off"];

pub struct CodedashCompleter {
    pub commands: Vec<String>,
    pub context: ShellContext,
}

impl CodedashCompleter {
    pub fn new(commands: Vec<String>, context: ShellContext) -> Self {
        Self { commands, context }
    }

    /// Index candidates with a short description, for `open` and `select`.
    fn index_candidates(&self, cmd: &str) -> Vec<(String, Option<String>)> {
        let state = self.context.state();
        match cmd {
            "open" => state
                .view
                .tree
                .leaves()
                .iter()
                .map(|leaf| {
                    (
                        leaf.index.to_string(),
                        leaf.item.function_name().map(str::to_string),
                    )
                })
                .collect(),
            "select" => state
                .view
                .display_items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.line_range().is_some())
                .map(|(i, item)| (i.to_string(), item.function_name().map(str::to_string)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn suggestion(value: String, description: Option<String>, start: usize, end: usize) -> Suggestion {
    Suggestion {
        value,
        description,
        style: None,
        extra: None,
        span: Span { start, end },
        append_whitespace: true,
        match_indices: None,
    }
}

impl Completer for CodedashCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let line = &line[..pos.min(line.len())];
        let trimmed = line.trim_start();

        // 1. Command completion (at start of line)
        if !trimmed.contains(' ') {
            return self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(trimmed))
                .map(|cmd| suggestion(cmd.clone(), None, pos - trimmed.len(), pos))
                .collect();
        }

        // 2. Argument completion
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let Some(cmd) = parts.first().copied() else {
            return vec![];
        };
        let last_word = if line.ends_with(' ') {
            ""
        } else {
            parts.last().copied().unwrap_or_default()
        };
        let span_start = pos - last_word.len();

        let candidates: Vec<(String, Option<String>)> = match cmd {
            "fuzzy" | "auto" => TOGGLE_VALUES
                .iter()
                .map(|v| (v.to_string(), None))
                .collect(),
            "open" | "select" => self.index_candidates(cmd),
            _ => Vec::new(),
        };

        candidates
            .into_iter()
            .filter(|(value, _)| value.starts_with(last_word))
            .map(|(value, description)| suggestion(value, description, span_start, pos))
            .collect()
    }
}
