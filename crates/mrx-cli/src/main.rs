//! mrx - conversational market-research study intake

mod commands;
mod config;
mod presenter;

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use mrx_agent::{
    LlmServices, MachineConfig, OrchestratorConfig, ProviderTransport, RetryConfig, ServiceConfig,
    SessionState, TurnEvent, TurnOrchestrator, brief,
};
use mrx_ai::providers::{LlmProvider, openai::OpenAIProvider};
use mrx_ai::{Model, Provider};
use tokio::sync::broadcast::error::RecvError;

/// mrx - study intake assistant
#[derive(Parser, Debug)]
#[command(name = "mrx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: gpt-4o-mini)
    #[arg(short, long)]
    model: Option<String>,

    /// Provider (openai, groq, openrouter, ollama, custom)
    #[arg(short, long)]
    provider: Option<String>,

    /// API base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// Run every study for this company
    #[arg(long)]
    company: Option<String>,

    /// Show templated agent messages without LLM rephrasing
    #[arg(long)]
    no_polish: bool,

    /// Seconds allowed for one LLM call
    #[arg(long)]
    timeout: Option<u64>,

    /// Retries for transient provider failures
    #[arg(long)]
    retries: Option<u32>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("mrx=debug,mrx_agent=debug,mrx_ai=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file
    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let provider = Provider::parse(
        &args
            .provider
            .or(cfg.provider.clone())
            .unwrap_or_else(|| "openai".to_string()),
    );
    let model_id = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| "gpt-4o-mini".to_string());
    let base_url = args.base_url.or(cfg.base_url.clone());

    let model = mrx_ai::models::resolve(provider, &model_id, base_url.as_deref());
    if model.base_url.is_empty() {
        eprintln!("Error: No API base URL for provider {}", provider.name());
        eprintln!("Pass --base-url or set base_url in the config file (mrx --init-config)");
        std::process::exit(1);
    }

    let llm: Arc<dyn LlmProvider> = match cfg.get_api_key(provider) {
        Some(key) => Arc::new(OpenAIProvider::new(key)),
        None => match provider.api_key_env_var() {
            Some(api_key_var) => {
                eprintln!("Error: No API key found for {}", provider.name());
                eprintln!();
                eprintln!("Set your API key with: export {}=your-key", api_key_var);
                eprintln!("Or put it in a .env file, or in the config file: mrx --init-config");
                std::process::exit(1);
            }
            None => Arc::new(OpenAIProvider::unauthenticated()),
        },
    };

    let retry_config = RetryConfig {
        max_retries: args.retries.or(cfg.transport_retries).unwrap_or(0),
        ..Default::default()
    };
    let transport = Arc::new(ProviderTransport::new(llm).with_retry_config(retry_config));

    let mut service_config = ServiceConfig::new(model.clone());
    if let Some(secs) = args.timeout.or(cfg.timeout_secs) {
        service_config.timeout = Duration::from_secs(secs);
    }
    if cfg.temperature.is_some() {
        service_config.temperature = cfg.temperature;
    }
    if cfg.max_tokens.is_some() {
        service_config.max_tokens = cfg.max_tokens;
    }
    let services = Arc::new(LlmServices::new(transport, service_config));

    let max_brief_attempts = cfg
        .max_brief_attempts
        .unwrap_or(brief::DEFAULT_MAX_ATTEMPTS);
    let orchestrator = TurnOrchestrator::new(
        services,
        OrchestratorConfig {
            polish: !args.no_polish && cfg.polish.unwrap_or(true),
            machine: MachineConfig {
                client_company: args.company.or(cfg.client_company.clone()),
                max_brief_attempts,
            },
        },
    );

    run_interactive(&orchestrator, &model, max_brief_attempts).await
}

async fn run_interactive(
    orchestrator: &TurnOrchestrator,
    model: &Model,
    max_brief_attempts: u32,
) -> anyhow::Result<()> {
    use std::io::{self, Write};

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        let model_short = model.id.split('/').next_back().unwrap_or(&model.id);
        eprintln!("mrx ({})", model_short);
        eprintln!("Say hello to start a study intake. Type /help for commands.");
        eprintln!();
    }

    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TurnEvent::BriefAttempt {
                    attempt,
                    accepted: false,
                }) => {
                    eprintln!("{}", rejected_draft_notice(attempt, max_brief_attempts));
                }
                Ok(event) => tracing::debug!(?event, "Turn event"),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut state = SessionState::new();

    loop {
        print!("{}", presenter::prompt(&state.options));
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        // Handle slash commands
        if let Some(result) = commands::execute_command(&line, &state, model) {
            match result {
                commands::CommandResult::Reset => {
                    state = SessionState::new();
                    println!("Started a new study intake.");
                }
                commands::CommandResult::Exit => {
                    break;
                }
                commands::CommandResult::Message(msg) => {
                    println!("{}", msg);
                }
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            println!();
            continue;
        }

        let input = match presenter::resolve_input(&line, &state.options) {
            presenter::Input::Submit(input) => input,
            presenter::Input::Retry(hint) => {
                println!("{}", hint);
                continue;
            }
            presenter::Input::Skip => continue,
        };

        let (reply, next) = orchestrator.process(&input, state).await;
        state = next;

        println!();
        println!("{}", reply);
        if let Some(options) = presenter::render_options(&state.options) {
            println!("{}", options);
        }
        println!();
    }

    Ok(())
}

fn rejected_draft_notice(attempt: u32, max_attempts: u32) -> String {
    if attempt < max_attempts {
        format!("[brief draft {} was unusable, retrying]", attempt)
    } else {
        format!("[brief draft {} was unusable, giving up]", attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_draft_notice_on_last_attempt() {
        assert_eq!(
            rejected_draft_notice(2, 5),
            "[brief draft 2 was unusable, retrying]"
        );
        assert_eq!(
            rejected_draft_notice(5, 5),
            "[brief draft 5 was unusable, giving up]"
        );
    }

    #[test]
    fn test_args_parse_retries_and_company() {
        let args = Args::parse_from(["mrx", "--retries", "2", "--company", "Acme Co", "--no-polish"]);
        assert_eq!(args.retries, Some(2));
        assert_eq!(args.company.as_deref(), Some("Acme Co"));
        assert!(args.no_polish);
    }
}
