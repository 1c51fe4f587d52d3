use serde::{Deserialize, Serialize};

/// Game state announced by the opponent bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEvent {
    BattleStarted,
    OpponentSwitched,
    OpponentSpecialMove,
    Forfeited,
    CurrentlyBattling,
    DailyLimitReached,
    PrizeReceived,
    Unclassified,
}

impl GameEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameEvent::BattleStarted => "battle_started",
            GameEvent::OpponentSwitched => "opponent_switched",
            GameEvent::OpponentSpecialMove => "opponent_special_move",
            GameEvent::Forfeited => "forfeited",
            GameEvent::CurrentlyBattling => "currently_battling",
            GameEvent::DailyLimitReached => "daily_limit_reached",
            GameEvent::PrizeReceived => "prize_received",
            GameEvent::Unclassified => "unclassified",
        }
    }

    /// Events after which the opponent presents a fresh move keyboard
    pub fn needs_click(&self) -> bool {
        matches!(
            self,
            GameEvent::BattleStarted | GameEvent::OpponentSwitched | GameEvent::OpponentSpecialMove
        )
    }
}

impl std::fmt::Display for GameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
