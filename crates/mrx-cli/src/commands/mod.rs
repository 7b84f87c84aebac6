//! Slash commands for interactive mode

mod state;

pub use state::StateCommand;

use mrx_agent::SessionState;
use mrx_ai::Model;

/// Result of executing a slash command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Start a fresh session
    Reset,
    /// Show a message to the user (not sent to the agent)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, state: &SessionState, model: &Model) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "reset" | "r" => CommandResult::Reset,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "state" | "s" => StateCommand::execute(args, state, model),

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /state, /s [json]    Show the current session (json for the full record)
  /reset, /r           Start a new study intake
  /quit, /exit, /q     Exit mrx

When options are listed, answer with a number or the option text.
When a block is offered for editing, press Enter to keep it or type a replacement."#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Model {
        mrx_ai::models::resolve(mrx_ai::Provider::OpenAI, "gpt-4o-mini", None)
    }

    #[test]
    fn test_plain_input_is_not_a_command() {
        assert!(execute_command("Acme Co", &SessionState::new(), &model()).is_none());
    }

    #[test]
    fn test_aliases() {
        let state = SessionState::new();
        assert_eq!(execute_command("/q", &state, &model()), Some(CommandResult::Exit));
        assert_eq!(execute_command(" /RESET ", &state, &model()), Some(CommandResult::Reset));
        assert!(matches!(
            execute_command("/help", &state, &model()),
            Some(CommandResult::Message(_))
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            execute_command("/upload brief.pdf", &SessionState::new(), &model()),
            Some(CommandResult::Unknown("upload".to_string()))
        );
    }
}
