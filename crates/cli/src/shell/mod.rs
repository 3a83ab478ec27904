mod command;
mod completer;
mod context;
mod handlers;
mod highlighter;
mod prompt;
pub(crate) mod view;

use reedline::{
    ColumnarMenu, DefaultHinter, Emacs, FileBackedHistory, KeyCode, KeyModifiers, MenuBuilder,
    Reedline, ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use self::command::{ParsedLine, ShellCommand, parse_shell_command};
use self::completer::CodedashCompleter;
use self::context::ShellContext;
use self::handlers::QueryHandler;
use self::highlighter::CodedashHighlighter;
use self::prompt::DefaultPrompt;
use codedash_core::Dashboard;

// Shell configuration constants
const SHELL_HISTORY_SIZE: usize = 500;

pub struct ReplServer {
    context: ShellContext,
}

impl ReplServer {
    pub fn new(dashboard: Arc<Dashboard>, rt_handle: tokio::runtime::Handle) -> Self {
        Self {
            context: ShellContext::new(dashboard, rt_handle),
        }
    }

    /// Runs the interactive loop on the calling thread. Must not be called
    /// from inside the runtime whose handle the context holds.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        println!("API: {}", self.context.dashboard.config().api_url);

        self.initialize_dashboard();
        let _refresh_notices = self.context.watch_background_refresh();

        println!("Type 'help' for commands. Any other text is sent as a query.");

        let line_editor = self.setup_line_editor()?;
        let result = self.run_loop(line_editor);
        self.context.dashboard.shutdown();
        result
    }

    fn initialize_dashboard(&self) {
        let dashboard = Arc::clone(&self.context.dashboard);
        let start = std::time::Instant::now();

        match self.context.rt_handle.block_on(dashboard.load()) {
            Ok(_) => {
                let state = dashboard.state();
                let (enriched, total) = state
                    .progress
                    .as_ref()
                    .map(|p| (p.enriched_chunks, p.total_chunks))
                    .unwrap_or_default();
                println!(
                    "Dashboard loaded in {:?}. Chunks enriched: {}/{}, Functions: {}",
                    start.elapsed(),
                    enriched,
                    total,
                    state.functions.len()
                );
            }
            Err(e) => {
                warn!("Initial load failed: {}", e);
                let message = dashboard
                    .state()
                    .load_error
                    .clone()
                    .unwrap_or_else(|| e.to_string());
                println!("Warning: {}", message);
            }
        }

        let _guard = self.context.rt_handle.enter();
        dashboard.resume();
        if dashboard.is_refresh_running() {
            info!(
                "Auto-refresh running every {}s",
                dashboard.config().refresh_interval_secs
            );
        }
    }

    fn setup_line_editor(&self) -> Result<Reedline, Box<dyn std::error::Error>> {
        let commands = ShellCommand::command_names();

        let completer = Box::new(CodedashCompleter::new(
            commands.clone(),
            self.context.clone(),
        ));

        let completion_menu = Box::new(ColumnarMenu::default().with_name("completion_menu"));

        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu("completion_menu".to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        let history = match history_file() {
            Some(path) => FileBackedHistory::with_file(SHELL_HISTORY_SIZE, path)
                .or_else(|_| FileBackedHistory::new(SHELL_HISTORY_SIZE))?,
            None => FileBackedHistory::new(SHELL_HISTORY_SIZE)?,
        };

        let highlighter = Box::new(CodedashHighlighter::new(commands));

        Ok(Reedline::create()
            .with_history(Box::new(history))
            .with_completer(completer)
            .with_highlighter(highlighter)
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_hinter(Box::new(
                DefaultHinter::default().with_style(
                    nu_ansi_term::Style::new()
                        .italic()
                        .fg(nu_ansi_term::Color::LightGray),
                ),
            ))
            .with_edit_mode(Box::new(Emacs::new(keybindings))))
    }

    fn run_loop(&self, mut line_editor: Reedline) -> Result<(), Box<dyn std::error::Error>> {
        let mut context = self.context.clone();

        loop {
            for notice in context.take_notices() {
                println!("{}", nu_ansi_term::Color::Cyan.paint(notice));
            }

            let state = context.state();
            let prompt = DefaultPrompt::new(
                state.current_function.as_ref().map(|f| f.function_name.clone()),
                context.fuzzy(),
                state.auto_refresh,
            );
            let sig = line_editor.read_line(&prompt);

            match sig {
                Ok(Signal::Success(buffer)) => {
                    let trimmed = buffer.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if trimmed == "exit" || trimmed == "quit" {
                        break;
                    }

                    context.set_busy(true);
                    let outcome = match parse_shell_command(trimmed) {
                        Ok(ParsedLine::Command(cmd)) => {
                            let handler = self::handlers::get_handler(&cmd);
                            let result = handler.handle(&cmd, &mut context);
                            if result.is_ok() && matches!(cmd, ShellCommand::Clear) {
                                let _ = line_editor.clear_screen();
                            }
                            result
                        }
                        Ok(ParsedLine::Query(text)) => {
                            let fuzzy = context.fuzzy();
                            QueryHandler.run(&text, fuzzy, &mut context)
                        }
                        Ok(ParsedLine::Handled) => Ok(String::new()),
                        Err(e) => Err(e),
                    };
                    context.set_busy(false);

                    match outcome {
                        Ok(output) => {
                            if !output.is_empty() {
                                println!("{}", output);
                            }
                        }
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => {
                    println!("Bye!");
                    break;
                }
                x => println!("Event: {:?}", x),
            }
        }
        Ok(())
    }
}

fn history_file() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".codedash");
    path.push("shell");
    std::fs::create_dir_all(&path).ok()?;
    path.push("history");
    Some(path)
}

pub fn run(
    dashboard: Arc<Dashboard>,
    rt_handle: tokio::runtime::Handle,
) -> Result<(), Box<dyn std::error::Error>> {
    ReplServer::new(dashboard, rt_handle).run()
}
