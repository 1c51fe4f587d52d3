//! Reply texts for operator commands.

use hexa_battle::{AttackPreference, AttackSlot, ButtonCoordinate, Phase, ValidationError};
use hexa_protocol::OperatorCommand;

/// Snapshot of the automation, answered by `/status`
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub phase: Phase,
    pub running: bool,
    pub in_battle: bool,
    pub watchdog_armed: bool,
    pub attack: ButtonCoordinate,
    pub opponent: String,
}

pub fn guide() -> String {
    let line = |command: OperatorCommand, what: &str| {
        format!("{} - {}", command.to_command_string(), what)
    };

    [
        "Commands:".to_string(),
        line(OperatorCommand::Run, "start challenging and fighting"),
        line(OperatorCommand::Pause, "stop after the current step"),
        line(OperatorCommand::Custom, "choose which attack to use"),
        format!("/{} <1-4> - set your attack directly", OperatorCommand::SetAttack(0).name()),
        line(OperatorCommand::Status, "show what the bot is doing"),
        line(OperatorCommand::Guide, "show this message"),
    ]
    .join("\n")
}

/// Attack menu for `/custom`. `saved` is the user's stored choice, if any.
pub fn attack_menu(current: ButtonCoordinate, saved: Option<&AttackPreference>) -> String {
    let mut lines = vec![match saved {
        Some(preference) => format!("Your attack: {}", preference.label),
        None => format!("Your attack: default ({})", current),
    }];
    lines.push("Pick an attack with /set_attack <number>:".to_string());
    for n in 1..=4 {
        if let Ok(slot) = AttackSlot::new(n) {
            let marker = if slot.coordinate() == current { " (current)" } else { "" };
            lines.push(format!("{} - {}{}", n, slot.coordinate(), marker));
        }
    }
    lines.join("\n")
}

pub fn started(already: bool) -> String {
    if already {
        "Automation is already running.".to_string()
    } else {
        "Automation started. Sending challenge...".to_string()
    }
}

pub fn paused(already: bool) -> String {
    if already {
        "Automation is already paused.".to_string()
    } else {
        "Automation paused.".to_string()
    }
}

pub fn attack_set(preference: &AttackPreference) -> String {
    format!(
        "{} selected ({}).",
        preference.label,
        preference.coordinate()
    )
}

pub fn invalid_attack(error: &ValidationError) -> String {
    format!("Invalid attack: {}. Use /set_attack 1, 2, 3 or 4.", error)
}

pub fn usage_error(error: &anyhow::Error) -> String {
    format!("Could not read command: {}. Send /guide for help.", error)
}

pub fn status(report: &StatusReport) -> String {
    format!(
        "Status: {}\nRunning: {}\nIn battle: {}\nWatchdog armed: {}\nAttack: {}\nOpponent: {}",
        report.phase,
        yes_no(report.running),
        yes_no(report.in_battle),
        yes_no(report.watchdog_armed),
        report.attack,
        report.opponent,
    )
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
