//! Transitions driven by classified game events

use std::time::Duration;

use hexa_protocol::GameEvent;

use super::state::AutomationState;
use crate::types::Timings;

/// Network action requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Click the configured attack on the message that triggered the event
    ClickButton,
    /// Send the challenge command
    SendChallenge,
}

/// What the runtime must do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reaction {
    /// The armed watchdog timer must be cancelled
    pub cancel_watchdog: bool,
    /// Wait this long before acting
    pub delay: Duration,
    pub action: Option<Action>,
}

impl Reaction {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn now(action: Action) -> Self {
        Self::after(Duration::ZERO, action)
    }

    pub fn after(delay: Duration, action: Action) -> Self {
        Self {
            cancel_watchdog: false,
            delay,
            action: Some(action),
        }
    }

    pub fn cancelling_watchdog(mut self) -> Self {
        self.cancel_watchdog = true;
        self
    }

    pub fn is_none(&self) -> bool {
        self.action.is_none() && !self.cancel_watchdog
    }
}

impl AutomationState {
    /// Update the automation from a classified opponent message
    ///
    /// While the automation is off nothing changes and nothing is requested.
    pub fn update(&mut self, event: GameEvent, timings: &Timings) -> Reaction {
        if !self.is_running() {
            return Reaction::none();
        }

        let reaction = match event {
            GameEvent::BattleStarted => {
                self.begin_battle();
                Reaction::after(timings.smoothing, Action::ClickButton).cancelling_watchdog()
            }

            // the opponent's move re-presents the keyboard, it has to be clicked again
            GameEvent::OpponentSwitched | GameEvent::OpponentSpecialMove => {
                Reaction::after(timings.smoothing, Action::ClickButton)
            }

            GameEvent::Forfeited => {
                self.end_battle();
                Reaction::now(Action::SendChallenge).cancelling_watchdog()
            }

            // someone else holds the shared battle slot
            GameEvent::CurrentlyBattling => {
                self.disarm_watchdog();
                Reaction::after(timings.currently_battling, Action::SendChallenge)
                    .cancelling_watchdog()
            }

            // keep polling, the limit resets
            GameEvent::DailyLimitReached => {
                self.disarm_watchdog();
                Reaction::after(timings.daily_limit, Action::SendChallenge).cancelling_watchdog()
            }

            GameEvent::PrizeReceived => {
                self.end_battle();
                Reaction::after(timings.restart, Action::SendChallenge).cancelling_watchdog()
            }

            GameEvent::Unclassified => Reaction::none(),
        };

        debug_assert_eq!(reaction.action == Some(Action::ClickButton), event.needs_click());
        debug_assert!(self.is_consistent());
        reaction
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::Phase;

    const ALL_EVENTS: [GameEvent; 8] = [
        GameEvent::BattleStarted,
        GameEvent::OpponentSwitched,
        GameEvent::OpponentSpecialMove,
        GameEvent::Forfeited,
        GameEvent::CurrentlyBattling,
        GameEvent::DailyLimitReached,
        GameEvent::PrizeReceived,
        GameEvent::Unclassified,
    ];

    fn challenging() -> AutomationState {
        let mut state = AutomationState::new();
        state.start();
        state.challenge_sent(Instant::now());
        state
    }

    #[test]
    fn test_update_idle_ignores_everything() {
        let timings = Timings::default();

        for event in ALL_EVENTS {
            let mut state = AutomationState::new();
            let reaction = state.update(event, &timings);

            assert!(reaction.is_none(), "{event}");
            assert_eq!(state.phase(), Phase::Idle);
            assert!(!state.in_battle());
            assert!(state.challenge_sent_at().is_none());
        }
    }

    #[test]
    fn test_click_events_match_event_table() {
        let timings = Timings::default();

        for event in ALL_EVENTS {
            let mut state = challenging();
            let reaction = state.update(event, &timings);

            assert_eq!(
                reaction.action == Some(Action::ClickButton),
                event.needs_click(),
                "{event}"
            );
        }
    }

    #[test]
    fn test_update_battle_started() {
        let timings = Timings::default();
        let mut state = challenging();

        let reaction = state.update(GameEvent::BattleStarted, &timings);

        assert_eq!(state.phase(), Phase::InBattle);
        assert!(state.watchdog().is_none());
        assert!(reaction.cancel_watchdog);
        assert_eq!(reaction.action, Some(Action::ClickButton));
        assert_eq!(reaction.delay, timings.smoothing);
    }

    #[test]
    fn test_update_opponent_moves_click_again() {
        let timings = Timings::default();
        let mut state = challenging();
        state.update(GameEvent::BattleStarted, &timings);

        for event in [GameEvent::OpponentSwitched, GameEvent::OpponentSpecialMove] {
            let reaction = state.update(event, &timings);

            assert_eq!(state.phase(), Phase::InBattle);
            assert_eq!(reaction, Reaction::after(timings.smoothing, Action::ClickButton));
        }
    }

    #[test]
    fn test_update_forfeit_challenges_immediately() {
        let timings = Timings::default();
        let mut state = challenging();
        state.update(GameEvent::BattleStarted, &timings);

        let reaction = state.update(GameEvent::Forfeited, &timings);

        assert_eq!(state.phase(), Phase::Waiting);
        assert!(reaction.cancel_watchdog);
        assert_eq!(reaction.delay, Duration::ZERO);
        assert_eq!(reaction.action, Some(Action::SendChallenge));
    }

    #[test]
    fn test_update_currently_battling_waits() {
        let timings = Timings::default();
        let mut state = challenging();

        let reaction = state.update(GameEvent::CurrentlyBattling, &timings);

        assert!(state.watchdog().is_none());
        assert!(reaction.cancel_watchdog);
        assert_eq!(reaction.delay, Duration::from_secs(120));
        assert_eq!(reaction.action, Some(Action::SendChallenge));
    }

    #[test]
    fn test_update_daily_limit_polls() {
        let timings = Timings::default();
        let mut state = challenging();

        let reaction = state.update(GameEvent::DailyLimitReached, &timings);

        assert_eq!(reaction.delay, timings.daily_limit);
        assert_eq!(reaction.action, Some(Action::SendChallenge));
    }

    #[test]
    fn test_update_prize_restarts() {
        let timings = Timings::default();
        let mut state = challenging();
        state.update(GameEvent::BattleStarted, &timings);

        let reaction = state.update(GameEvent::PrizeReceived, &timings);

        assert_eq!(state.phase(), Phase::Waiting);
        assert!(!state.in_battle());
        assert_eq!(reaction.delay, timings.restart);
        assert_eq!(reaction.action, Some(Action::SendChallenge));
    }

    #[test]
    fn test_update_unclassified_is_noop() {
        let timings = Timings::default();
        let mut state = challenging();
        let ticket = state.watchdog();

        let reaction = state.update(GameEvent::Unclassified, &timings);

        assert!(reaction.is_none());
        assert_eq!(state.phase(), Phase::Challenging);
        assert_eq!(state.watchdog(), ticket);
    }

    #[test]
    fn test_update_keeps_invariant() {
        let timings = Timings::default();

        for event in ALL_EVENTS {
            let mut state = challenging();
            state.update(event, &timings);
            assert!(state.is_consistent(), "{event}");
        }
    }
}
