//! AutomationState - the one record the automation runs on

use std::time::Instant;

/// Identifies one arming of the battle watchdog
///
/// A firing is only honoured if its ticket is still the armed one, so a timer
/// that raced a cancel or a re-arm turns into a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchdogTicket(pub u64);

/// Coarse automation phase, derived from [`AutomationState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Automation off
    Idle,
    /// On, no challenge outstanding and no battle
    Waiting,
    /// Challenge outstanding; the watchdog may be disarmed while a
    /// scheduled resend is pending
    Challenging,
    /// Battle confirmed
    InBattle,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Waiting => "waiting",
            Phase::Challenging => "challenging",
            Phase::InBattle => "in battle",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the battle automation
///
/// Invariant: `watchdog` is set only while `challenge_sent_at` is set and
/// `in_battle` is false. Every mutation goes through methods that keep it.
#[derive(Debug, Clone)]
pub struct AutomationState {
    running: bool,
    in_battle: bool,
    challenge_sent_at: Option<Instant>,
    watchdog: Option<WatchdogTicket>,

    /// Bumped on every start and stop; delayed work scheduled in an earlier
    /// session is discarded
    session: u64,
    next_ticket: u64,
}

impl AutomationState {
    pub fn new() -> Self {
        Self {
            running: false,
            in_battle: false,
            challenge_sent_at: None,
            watchdog: None,
            session: 0,
            next_ticket: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        if !self.running {
            Phase::Idle
        } else if self.in_battle {
            Phase::InBattle
        } else if self.challenge_sent_at.is_some() {
            Phase::Challenging
        } else {
            Phase::Waiting
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn in_battle(&self) -> bool {
        self.in_battle
    }

    pub fn challenge_sent_at(&self) -> Option<Instant> {
        self.challenge_sent_at
    }

    pub fn watchdog(&self) -> Option<WatchdogTicket> {
        self.watchdog
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Turn the automation on. Returns false if it already was.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }

        self.running = true;
        self.in_battle = false;
        self.challenge_sent_at = None;
        self.watchdog = None;
        self.session += 1;
        true
    }

    /// Turn the automation off and forget any battle or challenge.
    /// Returns false if it already was off.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.running = false;
        self.in_battle = false;
        self.challenge_sent_at = None;
        self.watchdog = None;
        self.session += 1;
        true
    }

    /// Record a successfully sent challenge and arm a fresh watchdog,
    /// superseding any earlier one
    pub fn challenge_sent(&mut self, now: Instant) -> WatchdogTicket {
        self.next_ticket += 1;
        let ticket = WatchdogTicket(self.next_ticket);

        self.challenge_sent_at = Some(now);
        self.in_battle = false;
        self.watchdog = Some(ticket);
        ticket
    }

    /// Handle a watchdog firing. Returns true if the challenge should be resent.
    pub fn watchdog_fired(&mut self, ticket: WatchdogTicket) -> bool {
        let live = self.running
            && self.watchdog == Some(ticket)
            && !self.in_battle
            && self.challenge_sent_at.is_some();

        if live {
            self.watchdog = None;
        }
        live
    }

    /// Drop the armed watchdog, if any. Returns the ticket that was armed.
    pub fn disarm_watchdog(&mut self) -> Option<WatchdogTicket> {
        self.watchdog.take()
    }

    pub(crate) fn begin_battle(&mut self) {
        self.in_battle = true;
        self.challenge_sent_at = None;
        self.watchdog = None;
    }

    pub(crate) fn end_battle(&mut self) {
        self.in_battle = false;
        self.challenge_sent_at = None;
        self.watchdog = None;
    }

    /// Check the watchdog invariant
    pub fn is_consistent(&self) -> bool {
        self.watchdog.is_none() || (self.challenge_sent_at.is_some() && !self.in_battle)
    }
}

impl Default for AutomationState {
    fn default() -> Self {
        Self::new()
    }
}
