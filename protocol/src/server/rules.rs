//! Ordered phrase rules that turn opponent messages into [`GameEvent`]s
//!
//! The opponent's wording is not under our control, so the table is plain data:
//! it deserializes from configuration and the built-in defaults can be replaced
//! wholesale. Rules are evaluated top to bottom and the first match wins.

use serde::{Deserialize, Serialize};

use super::GameEvent;

pub const BATTLE_START: &str = "Battle begins!";
pub const OPPONENT_SWITCH: &str = "switched to Blissey";
pub const OPPONENT_SPECIAL_MOVE: &str = "Blissey used Double-Edge";
pub const FORFEIT: &str = "forfeited the battle";
pub const CURRENTLY_BATTLING: &str = "is currently battling";
pub const DAILY_LIMIT: &str = "Daily limit for battling has been reached";
pub const NO_PRIZE: &str = "no prize will be given";
pub const PRIZE: &str = "You have received";
pub const CURRENCY_GLYPH: &str = "💵";

/// Words that count as evidence of an ongoing battle in recent history
pub const BATTLE_KEYWORDS: [&str; 5] = [BATTLE_START, "battle", "opponent", "blissey", "pokemon"];

/// Phrase condition, matched case-insensitively against the whole text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// Every phrase must appear, in any order
    All(Vec<String>),
    /// At least one nested matcher must hold
    Any(Vec<Matcher>),
}

impl Matcher {
    pub fn phrase(phrase: &str) -> Self {
        Matcher::All(vec![phrase.to_string()])
    }

    pub fn all(phrases: &[&str]) -> Self {
        Matcher::All(phrases.iter().map(|p| p.to_string()).collect())
    }

    /// `lowered` must already be lowercase
    fn matches(&self, lowered: &str) -> bool {
        match self {
            // an empty conjunction would match every message
            Matcher::All(phrases) => {
                !phrases.is_empty()
                    && phrases
                        .iter()
                        .all(|p| lowered.contains(p.to_lowercase().as_str()))
            }
            Matcher::Any(matchers) => matchers.iter().any(|m| m.matches(lowered)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub event: GameEvent,
    pub matcher: Matcher,
}

impl Rule {
    pub fn new(event: GameEvent, matcher: Matcher) -> Self {
        Self { event, matcher }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassifierRules {
    rules: Vec<Rule>,
}

impl ClassifierRules {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify a message. Total: anything unmatched is `Unclassified`.
    pub fn classify(&self, text: &str) -> GameEvent {
        let lowered = text.to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(&lowered))
            .map(|rule| rule.event)
            .unwrap_or(GameEvent::Unclassified)
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self::new(vec![
            Rule::new(GameEvent::BattleStarted, Matcher::phrase(BATTLE_START)),
            Rule::new(GameEvent::OpponentSwitched, Matcher::phrase(OPPONENT_SWITCH)),
            Rule::new(
                GameEvent::OpponentSpecialMove,
                Matcher::phrase(OPPONENT_SPECIAL_MOVE),
            ),
            Rule::new(
                GameEvent::Forfeited,
                Matcher::Any(vec![
                    Matcher::phrase(FORFEIT),
                    // timeout wording, which never contains the literal phrase
                    Matcher::all(&["has not moved", "forfeits", "loses 15"]),
                ]),
            ),
            Rule::new(
                GameEvent::CurrentlyBattling,
                Matcher::phrase(CURRENTLY_BATTLING),
            ),
            Rule::new(
                GameEvent::DailyLimitReached,
                Matcher::all(&[DAILY_LIMIT, NO_PRIZE]),
            ),
            Rule::new(GameEvent::PrizeReceived, Matcher::all(&[PRIZE, CURRENCY_GLYPH])),
        ])
    }
}
