use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_subscriber::EnvFilter;

use weby_core::chat::{ChatSession, GenerationClient, Speaker, SubmitOutcome, Turn};
use weby_core::config::ChatConfig;
use weby_core::site::SiteState;
use weby_infrastructure::{ConfigService, SecretServiceImpl, WebyPaths};
use weby_interaction::{AssistantPersona, GeminiApiAgent};

const COMMANDS: [&str; 5] = ["/history", "/contact", "/projects", "/reset", "/help"];

#[derive(Parser)]
#[command(name = "weby")]
#[command(about = "Weby AI - chat with the Webhub assistant", long_about = None)]
struct Cli {
    /// Gemini model to use (overrides config.toml and secret.json)
    #[arg(long)]
    model: Option<String>,

    /// Directory holding config.toml and secret.json (default: ~/.config/weby)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Per-request timeout in seconds, 0 disables it
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Create a secret.json template and exit
    #[arg(long)]
    init: bool,
}

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|cmd| cmd.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    History,
    Contact,
    Projects,
    Reset,
    Help,
    Unknown(String),
    Message(String),
}

/// Returns `None` for blank lines.
fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let command = match trimmed {
        "quit" | "exit" | "/quit" | "/exit" => Command::Quit,
        "/history" => Command::History,
        "/contact" => Command::Contact,
        "/projects" => Command::Projects,
        "/reset" => Command::Reset,
        "/help" => Command::Help,
        other if other.starts_with('/') => Command::Unknown(other.to_string()),
        _ => Command::Message(line.to_string()),
    };
    Some(command)
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_turn(turn: &Turn) {
    match turn.speaker {
        Speaker::User => println!("{}", format!("> {}", turn.text).green()),
        Speaker::Assistant => {
            println!("{}", "[Weby AI]".bright_magenta());
            for line in turn.text.lines() {
                println!("{}", line.bright_blue());
            }
            println!();
        }
    }
}

fn print_help() {
    println!("{}", "Ask anything about Webhub's services, or use a command:".bright_black());
    println!("{}", "  /history   show the conversation so far".bright_black());
    println!("{}", "  /contact   show direct contact channels".bright_black());
    println!("{}", "  /projects  list portfolio projects".bright_black());
    println!("{}", "  /reset     start a new conversation".bright_black());
    println!("{}", "  quit       leave".bright_black());
}

fn print_contact(site: &SiteState) {
    let contact = &site.contact;
    println!("{}", "Contact Webhub directly:".bright_yellow());
    println!("  WhatsApp (chat): +{}", contact.whatsapp);
    println!("  Phone (call):    {}", contact.phone);
    println!("  Email:           {}", contact.email);
    println!(
        "  {}",
        contact
            .whatsapp_link("Hi Webhub! I'd like to discuss a project.")
            .underline()
    );
}

fn print_projects(site: &SiteState) {
    for project in &site.projects {
        println!(
            "{} {}",
            format!("#{} {}", project.id, project.title).bright_yellow(),
            format!("({})", project.category).bright_black()
        );
        println!("  {}", project.description);
        println!("  {}", project.tech.join(", ").bright_black());
    }
}

async fn print_transcript(session: &ChatSession) {
    for turn in &session.transcript().await {
        print_turn(turn);
    }
}

/// Opens a session and prints its greeting.
async fn open_session(client: &Arc<dyn GenerationClient>, config: &ChatConfig) -> ChatSession {
    let session = ChatSession::new(Arc::clone(client), config.clone());
    print_transcript(&session).await;
    session
}

/// The main entry point for the Weby REPL.
///
/// 1. Loads config.toml and secret.json
/// 2. Builds the Gemini client with the Weby persona
/// 3. Hosts one chat session, forwarding each line to `submit`
/// 4. Waits for the reply before reading the next line
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let base_path = cli.config_dir.as_deref();

    if cli.init {
        let path = WebyPaths::new(base_path)?.ensure_secret_file()?;
        println!("Add your Gemini API key to {}", path.display());
        return Ok(());
    }

    // ===== Backend Initialization =====
    let mut chat_config = ConfigService::new(base_path)?.get_config().await?.chat;
    if let Some(secs) = cli.timeout_secs {
        chat_config = chat_config.with_request_timeout_secs(secs);
    }

    let secrets = SecretServiceImpl::new(base_path)?;
    let mut agent = GeminiApiAgent::from_secrets(&secrets, &chat_config)
        .await?
        .with_system_instruction(AssistantPersona::default().system_instruction());
    if let Some(model) = cli.model {
        agent = agent.with_model(model);
    }
    if !agent.has_api_key() {
        println!(
            "{}",
            format!(
                "No Gemini API key found. Set GEMINI_API_KEY or edit {} (run with --init to create it).",
                secrets.secret_file().display()
            )
            .yellow()
        );
    }
    tracing::info!(model = %agent.model(), "generation client ready");

    let client: Arc<dyn GenerationClient> = Arc::new(agent);
    let site = SiteState::default();

    // ===== REPL Setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Weby AI ===".bright_magenta().bold());
    println!("{}", "Type '/help' for commands or 'quit' to exit.".bright_black());
    println!();

    let mut session = open_session(&client, &chat_config).await;

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let Some(command) = parse_command(&line) else {
                    continue;
                };
                let _ = rl.add_history_entry(line.as_str());

                match command {
                    Command::Quit => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Command::History => print_transcript(&session).await,
                    Command::Contact => print_contact(&site),
                    Command::Projects => print_projects(&site),
                    Command::Help => print_help(),
                    Command::Reset => {
                        session.close().await;
                        println!("{}", "Started a new conversation.".bright_green());
                        session = open_session(&client, &chat_config).await;
                    }
                    Command::Unknown(name) => {
                        println!("{}", format!("Unknown command: {name}").bright_black());
                    }
                    Command::Message(text) => match session.submit(&text).await {
                        SubmitOutcome::Accepted => {
                            println!("{}", "Weby AI is typing...".bright_black());
                            session.wait_idle().await;
                            if let Some(reply) = session.transcript().await.last() {
                                print_turn(reply);
                            }
                        }
                        outcome => tracing::debug!(?outcome, "input not submitted"),
                    },
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    session.close().await;
    Ok(())
}
