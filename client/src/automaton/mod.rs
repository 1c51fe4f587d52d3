//! The battle automation actor.
//!
//! ```text
//!  chat library ──dispatch()──▶ AutomatonHandle ──Input──▶ Automaton::run
//!                                                            │
//!                       classify ─▶ AutomationState::update ─▶ Reaction
//!                                                            │
//!                  ActionExecutor (click / challenge) ◀──────┘
//!                  Watchdog ──WatchdogFired──▶ inbox
//! ```
//!
//! Every state change happens on the actor task. Delayed reactions and the
//! watchdog post back into the inbox, tagged so that work scheduled before a
//! stop is recognised and dropped.


use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, anyhow};
use hexa_battle::{Action, AutomationState, ButtonCoordinate, GameEvent, Reaction, WatchdogTicket};
use hexa_protocol::{IncomingMessage, OperatorCommand, parse_operator_command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::commands::{self, StatusReport};
use crate::config::BotConfig;
use crate::executor::{ActionExecutor, ChallengeOutcome, ClickOutcome};
use crate::preferences::PreferenceStore;
use crate::transport::Transport;
use crate::watchdog::Watchdog;

/// Preference key used when a command carries no sender
const DEFAULT_PLAYER: &str = "default";

enum Input {
    Message(IncomingMessage),
    Command {
        issuer: Option<String>,
        command: OperatorCommand,
        reply: oneshot::Sender<String>,
    },
    Deferred {
        session: u64,
        action: Action,
        message: Option<IncomingMessage>,
    },
    WatchdogFired(WatchdogTicket),
    Status(oneshot::Sender<StatusReport>),
    Shutdown,
}

/// Cloneable handle used to feed messages and commands to a running [`Automaton`]
#[derive(Clone)]
pub struct AutomatonHandle {
    tx: mpsc::UnboundedSender<Input>,
    running: Arc<AtomicBool>,
}

impl AutomatonHandle {
    fn send(&self, input: Input) -> Result<()> {
        self.tx
            .send(input)
            .map_err(|_| anyhow!("Automaton stopped"))
    }

    /// Hand a channel message to the automation
    pub fn deliver(&self, message: IncomingMessage) -> Result<()> {
        self.send(Input::Message(message))
    }

    /// Route a message from the chat library.
    ///
    /// Our own messages that parse as operator commands are executed and the
    /// reply text is returned for the caller to show. Everything else goes to
    /// [`deliver`](Self::deliver).
    pub async fn dispatch(&self, message: IncomingMessage) -> Result<Option<String>> {
        if message.outgoing {
            match parse_operator_command(&message.text) {
                Ok(Some(OperatorCommand::Pause)) => return self.stop().await.map(Some),
                Ok(Some(command)) => {
                    return self.command(message.sender_key(), command).await.map(Some);
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(error = %e, text = %message.text, "unparseable command");
                    return Ok(Some(commands::usage_error(&e)));
                }
            }
        }

        self.deliver(message)?;
        Ok(None)
    }

    /// Run an operator command and wait for its reply text
    pub async fn command(&self, issuer: Option<String>, command: OperatorCommand) -> Result<String> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::Command {
            issuer,
            command,
            reply,
        })?;
        rx.await.map_err(|_| anyhow!("Automaton stopped before replying"))
    }

    pub async fn start(&self, issuer: Option<String>) -> Result<String> {
        self.command(issuer, OperatorCommand::Run).await
    }

    /// Stop the automation. Retry loops already in flight see the flag
    /// immediately and give up.
    pub async fn stop(&self) -> Result<String> {
        self.running.store(false, Ordering::Relaxed);
        self.command(None, OperatorCommand::Pause).await
    }

    pub async fn set_preference(&self, issuer: &str, attack: i64) -> Result<String> {
        self.command(Some(issuer.to_string()), OperatorCommand::SetAttack(attack))
            .await
    }

    pub async fn status(&self) -> Result<StatusReport> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::Status(reply))?;
        rx.await.map_err(|_| anyhow!("Automaton stopped before replying"))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ask the actor to exit after the input it is currently handling
    pub fn shutdown(&self) -> Result<()> {
        self.send(Input::Shutdown)
    }
}

pub struct Automaton<T> {
    transport: Arc<T>,
    config: BotConfig,
    state: AutomationState,
    executor: ActionExecutor<T>,
    preferences: PreferenceStore,
    watchdog: Watchdog,
    /// Preference key of whoever last issued /run
    player: Option<String>,
    running: Arc<AtomicBool>,
    inbox: mpsc::UnboundedReceiver<Input>,
    outbox: mpsc::WeakUnboundedSender<Input>,
}

impl<T: Transport + 'static> Automaton<T> {
    /// Build the actor, loading preferences from `config.preferences_path`
    pub fn new(transport: Arc<T>, config: BotConfig) -> (Self, AutomatonHandle) {
        let preferences =
            PreferenceStore::load(config.preferences_path.clone(), config.default_coordinate());
        Self::with_preferences(transport, config, preferences)
    }

    pub fn with_preferences(
        transport: Arc<T>,
        config: BotConfig,
        preferences: PreferenceStore,
    ) -> (Self, AutomatonHandle) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(false));
        let executor = ActionExecutor::new(transport.clone(), &config, running.clone());

        let automaton = Self {
            transport,
            config,
            state: AutomationState::new(),
            executor,
            preferences,
            watchdog: Watchdog::new(),
            player: None,
            running: running.clone(),
            inbox,
            outbox: tx.downgrade(),
        };
        (automaton, AutomatonHandle { tx, running })
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    /// Process inputs until shutdown or until every handle is dropped
    pub async fn run(mut self) -> Result<()> {
        let channel = self
            .transport
            .resolve_channel(&self.config.channel)
            .await
            .with_context(|| format!("cannot access channel {}", self.config.channel))?;

        info!(
            channel = %channel.title,
            channel_id = channel.id,
            opponent = %self.config.opponent,
            "automaton ready, send /run to start"
        );

        while let Some(input) = self.inbox.recv().await {
            if matches!(input, Input::Shutdown) {
                break;
            }
            self.handle(input).await;
        }

        self.watchdog.cancel();
        self.running.store(false, Ordering::Relaxed);
        info!("automaton stopped");
        Ok(())
    }

    async fn handle(&mut self, input: Input) {
        match input {
            Input::Message(message) => self.on_message(message).await,
            Input::Command {
                issuer,
                command,
                reply,
            } => {
                let (text, follow_up) = self.on_command(issuer, command);
                let _ = reply.send(text);
                self.apply(follow_up, None).await;
            }
            Input::Deferred {
                session,
                action,
                message,
            } => {
                if session != self.state.session() {
                    debug!(?action, session, current = self.state.session(), "dropping stale action");
                    return;
                }
                self.perform(action, message.as_ref()).await;
            }
            Input::WatchdogFired(ticket) => self.on_watchdog(ticket).await,
            Input::Status(reply) => {
                let _ = reply.send(self.status_report());
            }
            Input::Shutdown => {}
        }
    }

    async fn on_message(&mut self, message: IncomingMessage) {
        if !self.state.is_running() {
            return;
        }
        if !message.is_from(&self.config.opponent) {
            trace!(message_id = message.id, sender = ?message.sender, "ignoring message");
            return;
        }

        let event = self.config.rules.classify(&message.text);
        if event == GameEvent::Unclassified {
            trace!(message_id = message.id, "unclassified opponent message");
            return;
        }
        info!(message_id = message.id, %event, edited = message.edited, "opponent event");

        let reaction = self.state.update(event, &self.config.timings);
        self.apply(reaction, Some(message)).await;
    }

    fn on_command(&mut self, issuer: Option<String>, command: OperatorCommand) -> (String, Reaction) {
        info!(command = command.name(), issuer = ?issuer, "operator command");

        match command {
            OperatorCommand::Run => {
                if !self.state.start() {
                    return (commands::started(true), Reaction::none());
                }
                self.running.store(true, Ordering::Relaxed);
                self.player = issuer;
                info!(player = ?self.player, attack = %self.current_attack(), "automation started");
                (
                    commands::started(false),
                    Reaction::now(Action::SendChallenge),
                )
            }
            OperatorCommand::Pause => {
                self.running.store(false, Ordering::Relaxed);
                if !self.state.stop() {
                    return (commands::paused(true), Reaction::none());
                }
                self.watchdog.cancel();
                info!("automation paused");
                (commands::paused(false), Reaction::none())
            }
            OperatorCommand::Custom => {
                let key = issuer.unwrap_or_else(|| DEFAULT_PLAYER.to_string());
                let menu = commands::attack_menu(
                    self.preferences.get(&key),
                    self.preferences.preference(&key),
                );
                (menu, Reaction::none())
            }
            OperatorCommand::Guide => (commands::guide(), Reaction::none()),
            OperatorCommand::Status => (commands::status(&self.status_report()), Reaction::none()),
            OperatorCommand::SetAttack(number) => {
                let key = issuer.unwrap_or_else(|| DEFAULT_PLAYER.to_string());
                let text = match self.preferences.set(&key, number) {
                    Ok(preference) => commands::attack_set(&preference),
                    Err(e) => {
                        warn!(user = %key, error = %e, "rejected attack preference");
                        commands::invalid_attack(&e)
                    }
                };
                (text, Reaction::none())
            }
        }
    }

    async fn on_watchdog(&mut self, ticket: WatchdogTicket) {
        if !self.state.watchdog_fired(ticket) {
            debug!(ticket = ticket.0, "ignoring stale watchdog");
            return;
        }

        warn!(
            timeout = ?self.config.timings.watchdog,
            "no battle started after challenge, resending"
        );
        self.send_challenge().await;
    }

    /// Carry out a reaction now, or schedule it if it carries a delay
    async fn apply(&mut self, reaction: Reaction, message: Option<IncomingMessage>) {
        if reaction.cancel_watchdog {
            self.watchdog.cancel();
        }

        let Some(action) = reaction.action else {
            return;
        };

        if reaction.delay.is_zero() {
            self.perform(action, message.as_ref()).await;
            return;
        }

        let Some(tx) = self.outbox.upgrade() else {
            return;
        };
        let session = self.state.session();
        let delay = reaction.delay;
        debug!(?action, ?delay, "scheduling action");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Input::Deferred {
                session,
                action,
                message,
            });
        });
    }

    async fn perform(&mut self, action: Action, message: Option<&IncomingMessage>) {
        match action {
            Action::ClickButton => {
                let Some(message) = message else {
                    warn!("click requested without a message");
                    return;
                };
                self.click(message).await;
            }
            Action::SendChallenge => self.send_challenge().await,
        }
    }

    async fn click(&mut self, message: &IncomingMessage) {
        let target = self.current_attack();
        let report = self.executor.click_button(message, target).await;

        match report.outcome {
            ClickOutcome::Clicked => {
                debug!(message_id = message.id, %target, attempts = report.context.attempt, "attack clicked")
            }
            ClickOutcome::Structural(e) => {
                warn!(message_id = message.id, error = %e, "attack not clickable")
            }
            ClickOutcome::Failed(e) => {
                error!(message_id = message.id, attempts = report.context.attempt, error = %e, "attack click failed")
            }
            ClickOutcome::Abandoned => debug!(message_id = message.id, "click abandoned"),
        }
    }

    async fn send_challenge(&mut self) {
        let report = self.executor.send_challenge(self.state.in_battle()).await;

        match report.outcome {
            ChallengeOutcome::Sent(id) => {
                let ticket = self.state.challenge_sent(Instant::now().into_std());
                self.arm_watchdog(ticket);
                debug!(message_id = id, ticket = ticket.0, "waiting for battle");
                tokio::time::sleep(self.config.timings.smoothing).await;
            }
            ChallengeOutcome::StoodDown(reason) => {
                info!(?reason, attempts = report.context.attempt, "challenge not resent")
            }
            ChallengeOutcome::Failed(e) => {
                error!(attempts = report.context.attempt, error = %e, "challenge failed")
            }
            ChallengeOutcome::Abandoned => debug!("challenge abandoned"),
        }
    }

    fn arm_watchdog(&mut self, ticket: WatchdogTicket) {
        let Some(tx) = self.outbox.upgrade() else {
            return;
        };
        self.watchdog
            .arm(ticket, self.config.timings.watchdog, move |ticket| {
                let _ = tx.send(Input::WatchdogFired(ticket));
            });
    }

    fn current_attack(&self) -> ButtonCoordinate {
        self.preferences
            .get(self.player.as_deref().unwrap_or(DEFAULT_PLAYER))
    }

    fn status_report(&self) -> StatusReport {
        StatusReport {
            phase: self.state.phase(),
            running: self.state.is_running(),
            in_battle: self.state.in_battle(),
            watchdog_armed: self.watchdog.is_armed(),
            attack: self.current_attack(),
            opponent: self.config.opponent.clone(),
        }
    }
}
