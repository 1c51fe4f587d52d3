//! The two network actions: clicking an attack and sending the challenge.
//!
//! Both are retry loops without an attempt ceiling. They only end on success,
//! on a failure retrying cannot fix, or when the operator stops the automation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use hexa_battle::ButtonCoordinate;
use hexa_protocol::{Button, CallbackAnswer, IncomingMessage, MessageId};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::BotConfig;
use crate::policy::{Backoff, RetryPolicy};
use crate::transport::{CallbackRequest, CallbackVariant, Transport, TransportError};

/// Reply phrases that mean "ask again later"
const SOFT_REJECTIONS: [&str; 2] = ["too many requests", "please try again"];

/// Click failures caused by the message itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("message has no inline keyboard")]
    NoKeyboard,

    #[error("no button at {target} (keyboard has {rows} rows, {row_len} buttons in target row)")]
    OutOfBounds {
        target: ButtonCoordinate,
        rows: usize,
        row_len: usize,
    },

    #[error("button {0:?} is not a callback button")]
    NotCallback(String),
}

/// Attempt bookkeeping for one click or send chain
#[derive(Debug, Default)]
pub struct RetryContext {
    pub attempt: u32,
    pub last_error: Option<String>,
}

impl RetryContext {
    fn next_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    fn record(&mut self, error: impl ToString) {
        self.last_error = Some(error.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Clicked,
    Structural(StructuralError),
    /// Both request variants failed
    Failed(String),
    /// Automation was stopped while retrying
    Abandoned,
}

#[derive(Debug)]
pub struct ClickReport {
    pub outcome: ClickOutcome,
    pub context: RetryContext,
}

/// Why a flooded challenge was not resent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandDown {
    /// We already know a battle is running
    InBattle,
    /// Recent channel history shows battle activity
    BattleDetected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Sent(MessageId),
    StoodDown(StandDown),
    Failed(String),
    Abandoned,
}

#[derive(Debug)]
pub struct ChallengeReport {
    pub outcome: ChallengeOutcome,
    pub context: RetryContext,
}

enum CallbackResult {
    Answered(CallbackAnswer),
    TimedOut,
    Error(TransportError),
}

pub struct ActionExecutor<T> {
    transport: Arc<T>,
    channel: String,
    opponent: String,
    challenge_command: String,
    target_message_id: MessageId,
    history_limit: usize,
    battle_keywords: Vec<String>,
    policy: RetryPolicy,
    smoothing: Duration,
    running: Arc<AtomicBool>,
}

impl<T: Transport> ActionExecutor<T> {
    pub fn new(transport: Arc<T>, config: &BotConfig, running: Arc<AtomicBool>) -> Self {
        Self {
            transport,
            channel: config.channel.clone(),
            opponent: config.opponent.clone(),
            challenge_command: config.challenge_command.clone(),
            target_message_id: config.target_message_id,
            history_limit: config.history_limit,
            battle_keywords: config
                .battle_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            policy: config.retry.clone(),
            smoothing: config.timings.smoothing,
            running,
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Click the button at `target` on `message`
    pub async fn click_button(
        &self,
        message: &IncomingMessage,
        target: ButtonCoordinate,
    ) -> ClickReport {
        let mut context = RetryContext::default();

        let button = match locate_button(message, target) {
            Ok(button) => button,
            Err(e) => {
                warn!(message_id = message.id, error = %e, "cannot click");
                return ClickReport {
                    outcome: ClickOutcome::Structural(e),
                    context,
                };
            }
        };

        let mut variant = CallbackVariant::Standard;

        let outcome = loop {
            if !self.is_running() {
                debug!(attempt = context.attempt, "automation stopped, abandoning click");
                break ClickOutcome::Abandoned;
            }

            // the alternate variant is a fallback within an attempt, not a new one
            if variant == CallbackVariant::Standard {
                context.next_attempt();
            }
            info!(attempt = context.attempt, button = %button.text, ?variant, "clicking button");

            let request = CallbackRequest {
                channel: self.channel.clone(),
                message_id: message.id,
                data: button.data.clone(),
                variant,
                timeout: self.policy.click_timeout,
            };

            match self.invoke_callback(request).await {
                CallbackResult::Answered(answer) => {
                    if let Some(reply) = soft_rejection(&answer) {
                        let delay = self.policy.delay(Backoff::ClickRejected);
                        warn!(attempt = context.attempt, reply, ?delay, "click rejected, retrying");
                        context.record(reply);
                        variant = CallbackVariant::Standard;
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    info!(attempt = context.attempt, answer = ?answer.message, "button clicked");
                    tokio::time::sleep(self.smoothing).await;
                    break ClickOutcome::Clicked;
                }
                CallbackResult::TimedOut => {
                    let delay = self.policy.delay(Backoff::ClickTimedOut);
                    warn!(
                        attempt = context.attempt,
                        timeout = ?self.policy.click_timeout,
                        ?delay,
                        "click timed out, retrying"
                    );
                    context.record(TransportError::Timeout);
                    variant = CallbackVariant::Standard;
                    tokio::time::sleep(delay).await;
                }
                CallbackResult::Error(e) if variant == CallbackVariant::Standard => {
                    warn!(attempt = context.attempt, error = %e, "click failed, trying alternate request");
                    context.record(&e);
                    variant = CallbackVariant::NonGame;
                }
                CallbackResult::Error(e) => {
                    error!(attempt = context.attempt, error = %e, "click failed with both request variants");
                    context.record(&e);
                    break ClickOutcome::Failed(e.to_string());
                }
            }
        };

        ClickReport { outcome, context }
    }

    async fn invoke_callback(&self, request: CallbackRequest) -> CallbackResult {
        let timeout = request.timeout;
        match tokio::time::timeout(timeout, self.transport.request_callback(request)).await {
            Ok(Ok(answer)) => CallbackResult::Answered(answer),
            Ok(Err(TransportError::Timeout)) | Err(_) => CallbackResult::TimedOut,
            Ok(Err(e)) => CallbackResult::Error(e),
        }
    }

    /// Send the challenge command as a reply to the target message
    ///
    /// `in_battle` is the automation's belief at call time; it decides whether
    /// a flood error means "battle running, stand down" or "send again".
    pub async fn send_challenge(&self, in_battle: bool) -> ChallengeReport {
        let mut context = RetryContext::default();

        let outcome = loop {
            if !self.is_running() {
                debug!(attempt = context.attempt, "automation stopped, abandoning challenge");
                break ChallengeOutcome::Abandoned;
            }
            context.next_attempt();

            let sent = self
                .transport
                .send_reply(&self.channel, &self.challenge_command, self.target_message_id)
                .await;

            match sent {
                Ok(id) => {
                    info!(attempt = context.attempt, message_id = id, "challenge sent");
                    break ChallengeOutcome::Sent(id);
                }
                Err(e) if e.is_flood() => {
                    warn!(attempt = context.attempt, error = %e, "challenge rate limited");
                    context.record(&e);

                    if in_battle {
                        let delay = self.policy.delay(Backoff::FloodInBattle);
                        info!(?delay, "battle already running, not resending");
                        tokio::time::sleep(delay).await;
                        break ChallengeOutcome::StoodDown(StandDown::InBattle);
                    }

                    if self.battle_in_progress().await {
                        let delay = self.policy.delay(Backoff::FloodBattleDetected);
                        info!(?delay, "battle activity in channel, not resending");
                        tokio::time::sleep(delay).await;
                        break ChallengeOutcome::StoodDown(StandDown::BattleDetected);
                    }

                    let delay = self.policy.delay(Backoff::FloodNoBattle);
                    info!(?delay, "no battle running, resending challenge");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(attempt = context.attempt, error = %e, "failed to send challenge");
                    context.record(&e);
                    break ChallengeOutcome::Failed(e.to_string());
                }
            }
        };

        ChallengeReport { outcome, context }
    }

    /// Scan recent channel history for opponent messages that look like a battle
    pub async fn battle_in_progress(&self) -> bool {
        let mut history = self
            .transport
            .recent_messages(&self.channel, self.history_limit);

        while let Some(item) = history.next().await {
            let message = match item {
                Ok(message) => message,
                Err(e) => {
                    error!(error = %e, "failed to read channel history");
                    return false;
                }
            };

            if !message.is_from(&self.opponent) {
                continue;
            }

            let text = message.text.to_lowercase();
            if self.battle_keywords.iter().any(|k| text.contains(k.as_str())) {
                debug!(message_id = message.id, "found recent battle activity");
                return true;
            }
        }

        debug!("no recent battle activity");
        false
    }
}

/// Find the target button, or explain why it cannot be clicked
pub fn locate_button(
    message: &IncomingMessage,
    target: ButtonCoordinate,
) -> Result<&Button, StructuralError> {
    let keyboard = message
        .keyboard
        .as_ref()
        .filter(|k| !k.is_empty())
        .ok_or(StructuralError::NoKeyboard)?;

    for (i, row) in keyboard.rows.iter().enumerate() {
        for (j, button) in row.buttons.iter().enumerate() {
            let marker = if i == target.row && j == target.col { ">" } else { " " };
            debug!("{marker} [{i}][{j}] {} ({:?})", button.text, button.kind);
        }
    }

    let button = keyboard
        .button(target.row, target.col)
        .ok_or(StructuralError::OutOfBounds {
            target,
            rows: keyboard.rows.len(),
            row_len: keyboard.row_len(target.row),
        })?;

    if !button.is_callback() {
        return Err(StructuralError::NotCallback(button.text.clone()));
    }
    Ok(button)
}

fn soft_rejection(answer: &CallbackAnswer) -> Option<&str> {
    let reply = answer.message.as_deref()?;
    let lowered = reply.to_lowercase();
    SOFT_REJECTIONS
        .iter()
        .any(|p| lowered.contains(p))
        .then_some(reply)
}

#[cfg(test)]
mod tests {
    use hexa_protocol::Keyboard;
    use tokio::time::Instant;

    use super::*;
    use crate::test_support::{CallbackScript, MockTransport, battle_message, config};

    fn executor(transport: &Arc<MockTransport>) -> ActionExecutor<MockTransport> {
        ActionExecutor::new(
            transport.clone(),
            &config(),
            Arc::new(AtomicBool::new(true)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_rejected_then_clicked() {
        let transport = Arc::new(MockTransport::new());
        transport.push_callback(CallbackScript::answer("Receiving too many requests"));
        transport.push_callback(CallbackScript::answer(""));
        let executor = executor(&transport);
        let started = Instant::now();

        let report = executor
            .click_button(&battle_message(7), ButtonCoordinate::DEFAULT)
            .await;

        assert_eq!(report.outcome, ClickOutcome::Clicked);
        assert_eq!(report.context.attempt, 2);
        assert_eq!(transport.callbacks().len(), 2);
        // one rejection backoff, then exactly one smoothing delay
        assert_eq!(started.elapsed(), Duration::from_secs(3) + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_targets_configured_button() {
        let transport = Arc::new(MockTransport::new());
        let executor = executor(&transport);

        executor
            .click_button(&battle_message(7), ButtonCoordinate::new(0, 1))
            .await;

        let calls = transport.callbacks();
        assert_eq!(calls[0].data, b"move-2".to_vec());
        assert_eq!(calls[0].message_id, 7);
        assert_eq!(calls[0].channel, "@hexamon_arena");
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_timeout_retries() {
        let transport = Arc::new(MockTransport::new());
        transport.push_callback(CallbackScript::Hang);
        let executor = executor(&transport);
        let started = Instant::now();

        let report = executor
            .click_button(&battle_message(7), ButtonCoordinate::DEFAULT)
            .await;

        assert_eq!(report.outcome, ClickOutcome::Clicked);
        assert_eq!(report.context.attempt, 2);
        assert_eq!(
            started.elapsed(),
            Duration::from_secs(10) + Duration::from_secs(5) + Duration::from_secs(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_error_uses_alternate_variant_once() {
        let transport = Arc::new(MockTransport::new());
        transport.push_callback(CallbackScript::error("BOT_RESPONSE_TIMEOUT"));
        transport.push_callback(CallbackScript::answer(""));
        let executor = executor(&transport);

        let report = executor
            .click_button(&battle_message(7), ButtonCoordinate::DEFAULT)
            .await;

        let calls = transport.callbacks();
        assert_eq!(report.outcome, ClickOutcome::Clicked);
        assert_eq!(report.context.attempt, 1);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].variant, CallbackVariant::Standard);
        assert_eq!(calls[1].variant, CallbackVariant::NonGame);
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_gives_up_after_alternate_fails() {
        let transport = Arc::new(MockTransport::new());
        transport.push_callback(CallbackScript::error("DATA_INVALID"));
        transport.push_callback(CallbackScript::error("DATA_INVALID"));
        let executor = executor(&transport);

        let report = executor
            .click_button(&battle_message(7), ButtonCoordinate::DEFAULT)
            .await;

        assert_eq!(report.outcome, ClickOutcome::Failed("DATA_INVALID".to_string()));
        assert_eq!(transport.callbacks().len(), 2);
        assert_eq!(report.context.last_error.as_deref(), Some("DATA_INVALID"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_structural_errors_do_not_retry() {
        let transport = Arc::new(MockTransport::new());
        let executor = executor(&transport);

        let bare = IncomingMessage::new(7, "HeXamonbot", "Battle begins!");
        let report = executor.click_button(&bare, ButtonCoordinate::DEFAULT).await;
        assert_eq!(
            report.outcome,
            ClickOutcome::Structural(StructuralError::NoKeyboard)
        );

        let empty = IncomingMessage::new(7, "HeXamonbot", "Battle begins!")
            .with_keyboard(Keyboard::default());
        let report = executor.click_button(&empty, ButtonCoordinate::DEFAULT).await;
        assert_eq!(
            report.outcome,
            ClickOutcome::Structural(StructuralError::NoKeyboard)
        );

        let report = executor
            .click_button(&battle_message(7), ButtonCoordinate::new(3, 0))
            .await;
        assert!(matches!(
            report.outcome,
            ClickOutcome::Structural(StructuralError::OutOfBounds { rows: 2, .. })
        ));

        let links = IncomingMessage::new(8, "HeXamonbot", "Battle begins!")
            .with_keyboard(Keyboard::new(vec![vec![Button::url("Rules")]]));
        let report = executor
            .click_button(&links, ButtonCoordinate::new(0, 0))
            .await;
        assert_eq!(
            report.outcome,
            ClickOutcome::Structural(StructuralError::NotCallback("Rules".to_string()))
        );

        assert!(transport.callbacks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_abandoned_when_stopped() {
        let transport = Arc::new(MockTransport::new());
        let running = Arc::new(AtomicBool::new(false));
        let executor = ActionExecutor::new(transport.clone(), &config(), running);

        let report = executor
            .click_button(&battle_message(7), ButtonCoordinate::DEFAULT)
            .await;

        assert_eq!(report.outcome, ClickOutcome::Abandoned);
        assert!(transport.callbacks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_challenge_sent_as_reply() {
        let transport = Arc::new(MockTransport::new());
        let executor = executor(&transport);

        let report = executor.send_challenge(false).await;

        assert!(matches!(report.outcome, ChallengeOutcome::Sent(_)));
        assert_eq!(
            transport.sends(),
            vec![("@hexamon_arena".to_string(), "/challenge".to_string(), 4512)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_challenge_flood_in_battle_stands_down() {
        let transport = Arc::new(MockTransport::new());
        transport.push_send(Err(TransportError::Flood("A wait of 5 seconds".into())));
        let executor = executor(&transport);
        let started = Instant::now();

        let report = executor.send_challenge(true).await;

        assert_eq!(
            report.outcome,
            ChallengeOutcome::StoodDown(StandDown::InBattle)
        );
        assert_eq!(transport.sends().len(), 1);
        assert_eq!(transport.history_reads(), 0);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_challenge_flood_with_battle_history_stands_down() {
        let transport = Arc::new(MockTransport::new());
        transport.push_send(Err(TransportError::Rpc("Too many commands".into())));
        transport.set_history(vec![
            IncomingMessage::new(3, "someone", "battle?"),
            IncomingMessage::new(2, "HeXamonbot", "Your opponent is thinking..."),
        ]);
        let executor = executor(&transport);
        let started = Instant::now();

        let report = executor.send_challenge(false).await;

        assert_eq!(
            report.outcome,
            ChallengeOutcome::StoodDown(StandDown::BattleDetected)
        );
        assert_eq!(transport.sends().len(), 1);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_challenge_flood_without_battle_resends() {
        let transport = Arc::new(MockTransport::new());
        transport.push_send(Err(TransportError::Flood("slow down".into())));
        transport.push_send(Err(TransportError::Flood("slow down".into())));
        // only other users talk about battles
        transport.set_history(vec![IncomingMessage::new(3, "someone", "battle time")]);
        let executor = executor(&transport);
        let started = Instant::now();

        let report = executor.send_challenge(false).await;

        assert!(matches!(report.outcome, ChallengeOutcome::Sent(_)));
        assert_eq!(report.context.attempt, 3);
        assert_eq!(transport.sends().len(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_challenge_other_error_is_terminal() {
        let transport = Arc::new(MockTransport::new());
        transport.push_send(Err(TransportError::Rpc("CHAT_WRITE_FORBIDDEN".into())));
        let executor = executor(&transport);

        let report = executor.send_challenge(false).await;

        assert_eq!(
            report.outcome,
            ChallengeOutcome::Failed("CHAT_WRITE_FORBIDDEN".to_string())
        );
        assert_eq!(transport.sends().len(), 1);
    }

    #[tokio::test]
    async fn test_history_error_counts_as_no_battle() {
        let transport = Arc::new(MockTransport::new());
        transport.fail_history();
        let executor = executor(&transport);

        assert!(!executor.battle_in_progress().await);
    }

    #[test]
    fn test_soft_rejection_phrases() {
        assert!(soft_rejection(&CallbackAnswer::with_message("Please try again later")).is_some());
        assert!(soft_rejection(&CallbackAnswer::with_message("Nice hit!")).is_none());
        assert!(soft_rejection(&CallbackAnswer::empty()).is_none());
    }
}
