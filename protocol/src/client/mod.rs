use anyhow::Result;

use crate::ParseError;

/// Commands the operator sends to control the automation
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    /// /run
    Run,

    /// /pause
    Pause,

    /// /custom - show the attack selection menu
    Custom,

    /// /guide
    Guide,

    /// /status
    Status,

    /// /set_attack N
    ///
    /// The number is not range-checked here, that is the preference store's job.
    SetAttack(i64),
}

impl OperatorCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Pause => "pause",
            Self::Custom => "custom",
            Self::Guide => "guide",
            Self::Status => "status",
            Self::SetAttack(_) => "set_attack",
        }
    }

    /// Serialize back to the text the operator would type
    pub fn to_command_string(&self) -> String {
        match self {
            Self::SetAttack(n) => format!("/set_attack {}", n),
            other => format!("/{}", other.name()),
        }
    }
}

/// Parse an operator message.
///
/// Returns `Ok(None)` for text that is not one of our commands, so ordinary
/// chatter and other bots' commands pass through untouched.
pub fn parse_operator_command(text: &str) -> Result<Option<OperatorCommand>> {
    let text = text.trim();
    let Some(body) = text.strip_prefix('/') else {
        return Ok(None);
    };

    let mut parts = body.split_whitespace();
    let Some(head) = parts.next() else {
        return Err(ParseError::EmptyMessage.into());
    };

    // "/run@SomeBot" addresses a specific bot in group chats
    let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

    let command = match name.as_str() {
        "run" => OperatorCommand::Run,
        "pause" => OperatorCommand::Pause,
        "custom" => OperatorCommand::Custom,
        "guide" | "help" => OperatorCommand::Guide,
        "status" => OperatorCommand::Status,
        "set_attack" => {
            let arg = parts
                .next()
                .ok_or_else(|| ParseError::MissingField("attack number".to_string()))?;
            let number = arg
                .parse::<i64>()
                .map_err(|_| ParseError::InvalidFormat(format!("not a number: {}", arg)))?;
            OperatorCommand::SetAttack(number)
        }
        _ => return Ok(None),
    };

    Ok(Some(command))
}
