mod analyze;
mod code;
mod schema;
mod search;
mod shell;

use clap::{Args, Parser, Subcommand};
use codedash_core::config::ConfigOverrides;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "codedash",
    version,
    about = "Terminal dashboard for a code-analysis API",
    long_about = "Codedash talks to a code-analysis service: it shows enrichment progress and \
                  function rankings, runs code searches, analyzes stack traces and displays \
                  function bodies with the matching lines highlighted."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings that override `CODEDASH_*` environment variables.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Base URL of the analysis API
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Auto-refresh period in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub refresh_secs: Option<u64>,

    /// Maximum number of search results
    #[arg(long, global = true)]
    pub search_limit: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Start with auto-refresh enabled
    #[arg(long, global = true)]
    pub auto_refresh: bool,
}

impl GlobalArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            refresh_interval_secs: self.refresh_secs,
            search_limit: self.search_limit,
            functions_limit: None,
            request_timeout_secs: self.timeout_secs,
            auto_refresh: self.auto_refresh.then_some(true),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive dashboard shell (default)
    Shell,
    /// Run one query and print the results
    #[command(
        long_about = "Routes the query like the shell does: text containing '::' is analyzed \
                      as a stack trace, anything else is a code search."
    )]
    Search {
        #[arg(value_name = "QUERY", required = true, num_args = 1.., trailing_var_arg = true)]
        query: Vec<String>,
        /// Use fuzzy matching
        #[arg(long)]
        fuzzy: bool,
        /// Print the raw result items as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyze a stack trace read from a file, or stdin with '-'
    Analyze {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print the raw result items as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the source of one function
    Code {
        #[arg(value_name = "FUNCTION_ID")]
        id: String,
        /// Highlight an inclusive line span, e.g. 12-18
        #[arg(long, value_name = "START-END", value_parser = code::parse_span)]
        highlight: Option<(u32, u32)>,
    },
    /// Print the JSON Schema of the analysis API models
    Schema,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Shell);

    let (component, to_stderr) = match &command {
        Commands::Shell => ("shell", false),
        _ => ("cli", true),
    };
    let _guard = codedash_runtime::init_logging(component, to_stderr);

    if let Commands::Schema = command {
        return schema::run();
    }

    let config = codedash_runtime::load_config(cli.global.overrides())?;
    let rt = tokio::runtime::Runtime::new()?;
    let dashboard = {
        let _enter = rt.enter();
        codedash_runtime::build_default_dashboard(config)?
    };

    match command {
        // The shell blocks on the runtime from its own thread.
        Commands::Shell => shell::run(dashboard, rt.handle().clone()),
        Commands::Search { query, fuzzy, json } => {
            rt.block_on(search::run(&dashboard, &query.join(" "), fuzzy, json))
        }
        Commands::Analyze { file, json } => rt.block_on(analyze::run(&dashboard, &file, json)),
        Commands::Code { id, highlight } => rt.block_on(code::run(&dashboard, &id, highlight)),
        Commands::Schema => Ok(()),
    }
}
