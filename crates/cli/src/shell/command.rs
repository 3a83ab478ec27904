use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        matches!(self, Toggle::On)
    }
}

/// Helper struct for Clap parsing within the shell
#[derive(Parser, Clone, Debug, PartialEq)]
#[command(no_binary_name = true)]
pub enum ShellCommand {
    /// Reload progress and the function list
    Refresh,
    /// Show enrichment progress
    Progress,
    /// List the ranked functions
    Functions,
    /// Show the most complex functions and technical-debt candidates
    Analytics,
    /// Search code, or analyze a stack trace when the text contains '::'
    Query {
        /// Query text or stack-trace fragment
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
        /// Use fuzzy matching for this search
        #[arg(long)]
        fuzzy: bool,
    },
    /// Set the default fuzzy flag for bare queries
    Fuzzy { mode: Toggle },
    /// List the result cards of the last query
    Results,
    /// Show the function tree of the last query
    Tree,
    /// Show the stack-trace summary panel
    Summaries,
    /// Open a function in the code pane
    Open {
        /// Index in the function tree
        #[arg(required_unless_present = "id")]
        index: Option<usize>,
        /// Open by function id instead
        #[arg(long, conflicts_with = "index")]
        id: Option<String>,
    },
    /// Highlight a result's lines in the code pane
    Select {
        /// Index in the result list
        index: usize,
        /// Open the result's function first
        #[arg(long)]
        open: bool,
    },
    /// Show the code pane
    Code {
        /// Only show this many rows around the scroll position
        #[arg(long)]
        context: Option<usize>,
    },
    /// Toggle periodic background refresh
    Auto { mode: Toggle },
    /// Dump the dashboard state as JSON
    State,
    /// Show the effective configuration
    Config,
    /// Clear the screen
    Clear,
}

impl ShellCommand {
    /// Automatically generates the list of available command names from the enum.
    pub fn command_names() -> Vec<String> {
        use clap::CommandFactory;
        let cmd = Self::command();
        let mut names = vec!["help".to_string(), "exit".to_string(), "quit".to_string()];
        names.extend(cmd.get_subcommands().map(|s| s.get_name().to_string()));
        names
    }
}

/// What the shell should do with one input line.
#[derive(Debug, PartialEq)]
pub enum ParsedLine {
    Command(ShellCommand),
    /// Free text that is not a command; dispatched as a query.
    Query(String),
    /// Help was printed by clap.
    Handled,
}

pub fn parse_shell_command(input: &str) -> Result<ParsedLine, Box<dyn std::error::Error>> {
    let first = input.split_whitespace().next().unwrap_or_default();
    if !ShellCommand::command_names().iter().any(|name| name == first) {
        return Ok(ParsedLine::Query(input.to_string()));
    }

    if first == "query" {
        if let Some(parsed) = parse_raw_query(input) {
            return Ok(parsed);
        }
    }

    // Use shlex to split arguments while respecting quotes
    let args = shlex::split(input).ok_or("Invalid quoting")?;

    match ShellCommand::try_parse_from(args) {
        Ok(c) => Ok(ParsedLine::Command(c)),
        Err(e) => {
            // Handle help/version display without returning an error
            if e.kind() == ErrorKind::DisplayHelp || e.kind() == ErrorKind::DisplayVersion {
                println!("{}", e);
                return Ok(ParsedLine::Handled);
            }
            Err(Box::new(e))
        }
    }
}

/// `query` keeps the rest of the line verbatim; quote and backslash
/// handling would corrupt stack-trace text. Help requests and empty queries
/// fall through to clap.
fn parse_raw_query(input: &str) -> Option<ParsedLine> {
    let mut rest = input.trim_start().strip_prefix("query")?.trim_start();
    let mut fuzzy = false;
    if let Some(after) = rest.strip_prefix("--fuzzy") {
        if after.is_empty() || after.starts_with(char::is_whitespace) {
            fuzzy = true;
            rest = after.trim_start();
        }
    }
    if rest.is_empty() || rest == "-h" || rest == "--help" {
        return None;
    }
    Some(ParsedLine::Command(ShellCommand::Query {
        text: vec![rest.trim_end().to_string()],
        fuzzy,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_text_is_query() {
        assert_eq!(
            parse_shell_command("parseToken").unwrap(),
            ParsedLine::Query("parseToken".to_string())
        );
        assert_eq!(
            parse_shell_command("App\\Auth::login() at line 4").unwrap(),
            ParsedLine::Query("App\\Auth::login() at line 4".to_string())
        );
    }

    #[test]
    fn test_query_keeps_rest_of_line() {
        let parsed = parse_shell_command("query --fuzzy parse token").unwrap();
        assert_eq!(
            parsed,
            ParsedLine::Command(ShellCommand::Query {
                text: vec!["parse token".to_string()],
                fuzzy: true,
            })
        );
        assert!(parse_shell_command("query").is_err());
    }

    #[test]
    fn test_query_preserves_backslashes_and_quotes() {
        let parsed = parse_shell_command(r#"query App\Auth::login() said "no""#).unwrap();
        assert_eq!(
            parsed,
            ParsedLine::Command(ShellCommand::Query {
                text: vec![r#"App\Auth::login() said "no""#.to_string()],
                fuzzy: false,
            })
        );
        assert_eq!(
            parse_shell_command(r"App\Auth::login").unwrap(),
            ParsedLine::Query(r"App\Auth::login".to_string())
        );
    }

    #[test]
    fn test_open_by_index_or_id() {
        assert_eq!(
            parse_shell_command("open 2").unwrap(),
            ParsedLine::Command(ShellCommand::Open {
                index: Some(2),
                id: None
            })
        );
        assert_eq!(
            parse_shell_command("open --id 17").unwrap(),
            ParsedLine::Command(ShellCommand::Open {
                index: None,
                id: Some("17".to_string())
            })
        );
        assert!(parse_shell_command("open").is_err());
    }

    #[test]
    fn test_toggles() {
        assert_eq!(
            parse_shell_command("auto on").unwrap(),
            ParsedLine::Command(ShellCommand::Auto { mode: Toggle::On })
        );
        assert!(parse_shell_command("fuzzy maybe").is_err());
    }

    #[test]
    fn test_command_names_cover_subcommands() {
        let names = ShellCommand::command_names();
        for expected in ["refresh", "query", "select", "auto", "exit"] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }
}
