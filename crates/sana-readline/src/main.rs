use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::time::timeout;

use sana_application::ScreeningSession;
use sana_core::assessment::Assessment;
use sana_core::config::{ScreeningConfig, SecretConfig};
use sana_core::session::{MessageRole, SessionState};
use sana_interaction::{AgentRegistry, GeminiApiAgent, KnowledgeContextBuilder};

const DISCLAIMER: &str = "This application is not a substitute for professional medical \
advice, diagnosis, or treatment. Always seek the advice of your physician or other \
qualified health provider with any questions you may have regarding a medical condition.";

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec!["/reset".to_string(), "/upload".to_string()],
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

/// The main entry point for the SANA screening REPL.
///
/// Sets up a rustyline-based chat loop that:
/// 1. Loads configuration and credentials (env var wins over secret.toml)
/// 2. Wires the Gemini binding, agent registry, and knowledge builder
/// 3. Provides command completion for /reset and /upload
/// 4. Processes one turn at a time, wrapped in a timeout
/// 5. Renders colored, agent-labelled messages and the final assessment
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // ===== Backend Initialization =====
    let config = ScreeningConfig::load_or_default(None)?;
    let secrets = SecretConfig::resolve()?;
    let api_key = secrets.require_gemini_key()?.to_string();

    let turn_timeout = Duration::from_secs(config.turn_timeout_secs);
    let binding = GeminiApiAgent::new(api_key, config.model.clone());
    let registry = Arc::new(AgentRegistry::new(binding));
    let knowledge = Arc::new(KnowledgeContextBuilder::new(
        config.default_knowledge.clone(),
    ));
    let session = ScreeningSession::new(config, registry, Arc::clone(&knowledge));

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== SANA Mental Health Screening ===".bright_magenta().bold());
    println!(
        "{}",
        "Type your responses below. '/upload <path>' attaches a .pdf or .txt resource, \
         '/reset' starts a new assessment, 'quit' exits."
            .bright_black()
    );
    println!("{}", DISCLAIMER.yellow());
    println!();

    render_history(&session.state().await);

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Take care. Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if trimmed == "/reset" {
                    session.reset().await;
                    println!("{}", "Starting a new assessment.".bright_green());
                    println!();
                    render_history(&session.state().await);
                    continue;
                }

                if trimmed == "/upload" || trimmed.starts_with("/upload ") {
                    let path = trimmed["/upload".len()..].trim();
                    if path.is_empty() {
                        println!("{}", "Usage: /upload <path to .pdf or .txt>".yellow());
                        continue;
                    }
                    match knowledge.add_upload(PathBuf::from(path)).await {
                        Ok(name) => {
                            println!(
                                "{}",
                                format!("File uploaded successfully: {name}").green()
                            );
                        }
                        Err(err) => {
                            eprintln!("{}", format!("Upload failed: {err}").red());
                        }
                    }
                    continue;
                }

                if session.state().await.complete {
                    println!(
                        "{}",
                        "The assessment is complete. Type '/reset' to start a new one."
                            .bright_yellow()
                    );
                    continue;
                }

                println!("{}", "Processing your response...".bright_black());

                // One turn at a time: the next prompt is not shown until
                // this turn's response (or fallback) has been rendered.
                match timeout(turn_timeout, session.process(trimmed)).await {
                    Ok(turn) => {
                        for warning in &turn.warnings {
                            println!("{}", warning.yellow());
                        }

                        println!(
                            "{}",
                            format!("[{}]", turn.message.author_label()).bright_magenta()
                        );
                        for line in turn.message.content.lines() {
                            println!("{}", line.bright_blue());
                        }
                        println!();

                        if turn.complete {
                            if let Some(assessment) = &turn.assessment {
                                render_assessment(assessment);
                            }
                        }
                    }
                    Err(_) => {
                        eprintln!(
                            "{}",
                            "Error: the response timed out. Please try again.".red()
                        );
                    }
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

    Ok(())
}

/// Prints the message log, labelling each assistant message with its agent.
fn render_history(state: &SessionState) {
    for message in state.history.messages() {
        match message.role {
            MessageRole::User => {
                println!("{}", format!("> {}", message.content).green());
            }
            MessageRole::Assistant => {
                println!(
                    "{}",
                    format!("[{}]", message.author_label()).bright_magenta()
                );
                for line in message.content.lines() {
                    println!("{}", line.bright_blue());
                }
            }
        }
        println!();
    }
}

/// Prints the final assessment block.
fn render_assessment(assessment: &Assessment) {
    println!("{}", "=== Mental Health Assessment Results ===".bright_green().bold());
    println!(
        "{}",
        format!(
            "PHQ-9 Score: {} - {} Depression",
            assessment.phq9_score, assessment.severity
        )
        .bright_green()
    );

    println!("{}", "Key Concerns:".bold());
    for concern in &assessment.key_concerns {
        println!("  - {concern}");
    }

    println!("{}", "Recommendations:".bold());
    for recommendation in &assessment.recommendations {
        println!("  - {recommendation}");
    }

    println!("{}", "Helpful Resources:".bold());
    for resource in &assessment.resources {
        println!("  - {resource}");
    }

    if assessment.follow_up_needed {
        println!(
            "{}",
            "Follow-up with a professional is recommended.".bright_yellow().bold()
        );
    }
    println!();
}
