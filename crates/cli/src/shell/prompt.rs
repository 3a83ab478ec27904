use nu_ansi_term::Color;
use reedline::{Prompt, PromptEditMode, PromptHistorySearch};
use std::borrow::Cow;

const MAX_NAME_WIDTH: usize = 30;

pub struct DefaultPrompt {
    current_function: Option<String>,
    fuzzy: bool,
    auto_refresh: bool,
}

impl DefaultPrompt {
    pub fn new(current_function: Option<String>, fuzzy: bool, auto_refresh: bool) -> Self {
        Self {
            current_function,
            fuzzy,
            auto_refresh,
        }
    }

    fn flags(&self) -> String {
        let mut flags = Vec::new();
        if self.fuzzy {
            flags.push("fuzzy");
        }
        if self.auto_refresh {
            flags.push("auto");
        }
        if flags.is_empty() {
            String::new()
        } else {
            format!("[{}] ", flags.join(","))
        }
    }
}

impl Prompt for DefaultPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let prefix = Color::LightBlue.bold().paint("codedash");
        let flags = Color::DarkGray.paint(self.flags());
        let location = match &self.current_function {
            Some(name) => shorten_name(name),
            None => "-".to_string(),
        };
        let location = Color::Yellow.paint(location);
        Cow::Owned(format!("{} {}{} > ", prefix, flags, location))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(".. ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        Cow::Borrowed("(search) ")
    }
}

fn shorten_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_WIDTH {
        return name.to_string();
    }
    let tail: Vec<char> = name.chars().rev().take(MAX_NAME_WIDTH - 3).collect();
    format!("...{}", tail.into_iter().rev().collect::<String>())
}
