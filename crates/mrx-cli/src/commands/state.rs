//! /state command - show the session record

use super::CommandResult;
use mrx_agent::SessionState;
use mrx_ai::Model;

pub struct StateCommand;

impl StateCommand {
    pub fn execute(args: &str, state: &SessionState, model: &Model) -> CommandResult {
        if args.eq_ignore_ascii_case("json") {
            return match serde_json::to_string_pretty(state) {
                Ok(json) => CommandResult::Message(json),
                Err(e) => CommandResult::Message(format!("Failed to serialize session: {}", e)),
            };
        }

        let mut output = String::from("Session Info\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        output.push_str(&format!(
            "Model:      {} ({})\n",
            model.id,
            model.provider.name()
        ));
        output.push_str(&format!("Session:    {}\n", state.id));
        output.push_str(&format!("Status:     {}\n", state.status));
        output.push_str(&format!(
            "Messages:   {}\n",
            state.conversation_history.len()
        ));
        output.push('\n');

        output.push_str(&format!("Study type: {}\n", field(&state.study_type)));
        output.push_str(&format!("Objective:  {}\n", field(&state.research_objective)));
        output.push_str(&format!("Company:    {}\n", field(&state.company)));
        output.push_str(&format!("Product:    {}\n", field(&state.product)));

        if let Some(ref brief) = state.study_brief {
            output.push_str(&format!(
                "Brief:      {} challenges, {} opportunities\n",
                brief.challenges.len(),
                brief.opportunities.len()
            ));
        }

        CommandResult::Message(output.trim_end().to_string())
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}
