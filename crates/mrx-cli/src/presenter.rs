//! Terminal rendering of agent replies and option affordances

use mrx_agent::OptionPayload;

/// What the user's next line means given the options on screen
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    /// Send this text to the agent
    Submit(String),
    /// Show this hint and read another line
    Retry(String),
    /// Nothing to send
    Skip,
}

/// Numbered option list shown under the reply, if any
pub fn render_options(options: &OptionPayload) -> Option<String> {
    match options {
        OptionPayload::Choices {
            items,
            allow_free_text,
        } => {
            let mut out = String::new();
            for (i, item) in items.iter().enumerate() {
                out.push_str(&format!("  [{}] {}\n", i + 1, item));
            }
            if *allow_free_text {
                out.push_str("  ...or type your own answer\n");
            }
            Some(out.trim_end().to_string())
        }
        OptionPayload::Text { editable: true, .. } => {
            Some("  (press Enter to keep the text above, or type a replacement)".to_string())
        }
        _ => None,
    }
}

/// Input prompt matching the current affordance
pub fn prompt(options: &OptionPayload) -> &'static str {
    match options {
        OptionPayload::Choices { .. } => "choice> ",
        OptionPayload::Text { editable: true, .. } => "edit> ",
        _ => "> ",
    }
}

/// Map a raw input line onto what gets sent to the agent.
///
/// Choices accept a 1-based number or the label itself; free text only when
/// the payload allows it. An empty line accepts an editable prefill.
pub fn resolve_input(line: &str, options: &OptionPayload) -> Input {
    let line = line.trim();

    match options {
        OptionPayload::Choices {
            items,
            allow_free_text,
        } => {
            let picked = line
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| items.get(i));
            if let Some(item) = picked {
                return Input::Submit(item.clone());
            }
            if let Some(item) = items.iter().find(|i| i.eq_ignore_ascii_case(line)) {
                return Input::Submit(item.clone());
            }
            if *allow_free_text && !line.is_empty() {
                return Input::Submit(line.to_string());
            }
            Input::Retry(format!("Please choose an option between 1 and {}.", items.len()))
        }
        OptionPayload::Text {
            body,
            editable: true,
        } if line.is_empty() => Input::Submit(body.clone()),
        _ if line.is_empty() => Input::Skip,
        _ => Input::Submit(line.to_string()),
    }
}
