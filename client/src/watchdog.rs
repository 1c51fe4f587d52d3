use std::time::Duration;

use hexa_battle::WatchdogTicket;
use tokio::task::JoinHandle;
use tracing::debug;

/// Single-shot timer that fires if a challenge is never answered.
///
/// At most one timer is pending. Arming again cancels the previous one, and
/// the ticket passed to `on_fire` lets the owner ignore a timer that raced
/// with a cancellation.
#[derive(Default)]
pub struct Watchdog {
    pending: Option<(WatchdogTicket, JoinHandle<()>)>,
}

impl Watchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F>(&mut self, ticket: WatchdogTicket, timeout: Duration, on_fire: F)
    where
        F: FnOnce(WatchdogTicket) + Send + 'static,
    {
        self.cancel();

        debug!(ticket = ticket.0, ?timeout, "watchdog armed");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            on_fire(ticket);
        });
        self.pending = Some((ticket, handle));
    }

    /// Cancel the pending timer. Returns whether one was still pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some((ticket, handle)) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                if was_pending {
                    debug!(ticket = ticket.0, "watchdog cancelled");
                }
                was_pending
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }

    pub fn ticket(&self) -> Option<WatchdogTicket> {
        self.pending.as_ref().map(|(ticket, _)| *ticket)
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.pending.take() {
            handle.abort();
        }
    }
}
