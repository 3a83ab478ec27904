use codedash_core::router::SCOPE_SEPARATOR;
use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

pub struct CodedashHighlighter {
    commands: Vec<String>,
}

impl CodedashHighlighter {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    fn is_command(&self, word: &str) -> bool {
        self.commands.iter().any(|c| c == word)
    }
}

impl Highlighter for CodedashHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled_text = StyledText::new();
        let first = line.split_whitespace().next().unwrap_or_default();

        // Free text goes to the router; show which way it will be routed.
        if !first.is_empty() && !self.is_command(first) {
            let style = if line.contains(SCOPE_SEPARATOR) {
                Style::new().fg(Color::Magenta)
            } else {
                Style::new()
            };
            styled_text.push((style, line.to_string()));
            return styled_text;
        }

        let mut seen_command = false;
        for word in line.split_inclusive(char::is_whitespace) {
            let trimmed = word.trim();
            let style = if trimmed.is_empty() {
                Style::new()
            } else if !seen_command {
                seen_command = true;
                Style::new().fg(Color::LightGreen).bold()
            } else if trimmed.starts_with('-') {
                Style::new().fg(Color::Cyan)
            } else if trimmed.contains(SCOPE_SEPARATOR) {
                Style::new().fg(Color::Magenta)
            } else if trimmed.chars().all(|c| c.is_ascii_digit()) {
                Style::new().fg(Color::Yellow)
            } else {
                Style::new()
            };
            styled_text.push((style, word.to_string()));
        }

        styled_text
    }
}
