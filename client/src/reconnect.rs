//! Reconnect bookkeeping for the status socket.
//!
//! The machine performs no I/O. The socket driver feeds it transport events
//! and carries out the action it returns.

use restream_types::NORMAL_CLOSE_CODE;
use std::time::Duration;

/// Reconnect attempts allowed after the first connection fails.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Fixed wait between a drop and the next attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Connection state as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket and no attempt in progress
    Disconnected,
    /// Handshake in progress
    Connecting,
    /// Socket open, frames flowing
    Open,
    /// Retry budget exhausted; only a manual enable leaves this state
    GivenUp,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Open => "Connected",
            ConnectionState::GivenUp => "Connection lost",
        }
    }
}

/// What the driver should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectAction {
    /// Open a new socket
    Connect,
    /// Wait, then report `retry_elapsed`
    ScheduleReconnect(Duration),
    /// Close the open socket with the normal close code
    CloseNormally,
    /// Stop trying and surface a persistent error
    GiveUp,
    /// Nothing to do
    None,
}

#[derive(Debug, Clone)]
pub struct ReconnectMachine {
    state: ConnectionState,
    failures: u32,
    retry_pending: bool,
    delay: Duration,
}

impl Default for ReconnectMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconnectMachine {
    pub fn new() -> Self {
        Self::with_delay(RECONNECT_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            failures: 0,
            retry_pending: false,
            delay,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consecutive abnormal closes since the last successful open.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    /// Manual enable. Starts from a fresh budget unless already connecting or open.
    pub fn enable(&mut self) -> ReconnectAction {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => ReconnectAction::None,
            ConnectionState::Disconnected | ConnectionState::GivenUp => {
                self.failures = 0;
                self.retry_pending = false;
                self.state = ConnectionState::Connecting;
                ReconnectAction::Connect
            }
        }
    }

    /// Handshake completed.
    pub fn opened(&mut self) -> ReconnectAction {
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Open;
            self.failures = 0;
        }
        ReconnectAction::None
    }

    /// Socket closed or failed to open. `code` is the close code from the
    /// peer's close frame, `None` when there was none.
    pub fn closed(&mut self, code: Option<u16>) -> ReconnectAction {
        if !matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Open
        ) {
            return ReconnectAction::None;
        }

        if code == Some(NORMAL_CLOSE_CODE) {
            self.state = ConnectionState::Disconnected;
            return ReconnectAction::None;
        }

        self.failures += 1;
        if self.failures > MAX_RECONNECT_ATTEMPTS {
            self.state = ConnectionState::GivenUp;
            ReconnectAction::GiveUp
        } else {
            self.state = ConnectionState::Disconnected;
            self.retry_pending = true;
            ReconnectAction::ScheduleReconnect(self.delay)
        }
    }

    /// The reconnect delay has passed.
    pub fn retry_elapsed(&mut self) -> ReconnectAction {
        if self.state != ConnectionState::Disconnected || !self.retry_pending {
            return ReconnectAction::None;
        }
        self.retry_pending = false;
        self.state = ConnectionState::Connecting;
        ReconnectAction::Connect
    }

    /// Feature turned off. Drops any pending retry; an open or opening socket
    /// must be closed normally.
    pub fn disable(&mut self) -> ReconnectAction {
        let action = match self.state {
            ConnectionState::Connecting | ConnectionState::Open => ReconnectAction::CloseNormally,
            _ => ReconnectAction::None,
        };
        self.state = ConnectionState::Disconnected;
        self.retry_pending = false;
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive one failed attempt: report the close, let the delay pass.
    fn fail_once(machine: &mut ReconnectMachine) -> ReconnectAction {
        match machine.closed(None) {
            ReconnectAction::ScheduleReconnect(delay) => {
                assert_eq!(delay, RECONNECT_DELAY);
                machine.retry_elapsed()
            }
            other => other,
        }
    }

    #[test]
    fn test_enable_connects() {
        let mut machine = ReconnectMachine::new();
        assert_eq!(machine.enable(), ReconnectAction::Connect);
        assert_eq!(machine.state(), ConnectionState::Connecting);
        assert_eq!(machine.enable(), ReconnectAction::None);
    }

    #[test]
    fn test_normal_close_does_not_reconnect() {
        let mut machine = ReconnectMachine::new();
        machine.enable();
        machine.opened();

        assert_eq!(machine.closed(Some(1000)), ReconnectAction::None);
        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert_eq!(machine.retry_elapsed(), ReconnectAction::None);
    }

    #[test]
    fn test_abnormal_close_schedules_reconnect() {
        let mut machine = ReconnectMachine::new();
        machine.enable();
        machine.opened();

        assert_eq!(
            machine.closed(Some(1006)),
            ReconnectAction::ScheduleReconnect(RECONNECT_DELAY)
        );
        assert!(machine.retry_pending());
        assert_eq!(machine.retry_elapsed(), ReconnectAction::Connect);
        assert_eq!(machine.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_gives_up_after_budget() {
        let mut machine = ReconnectMachine::new();
        machine.enable();

        for _ in 0..MAX_RECONNECT_ATTEMPTS {
            assert_eq!(fail_once(&mut machine), ReconnectAction::Connect);
        }
        assert_eq!(machine.closed(None), ReconnectAction::GiveUp);
        assert_eq!(machine.state(), ConnectionState::GivenUp);
        assert_eq!(machine.failures(), MAX_RECONNECT_ATTEMPTS + 1);

        // Terminal until enabled again
        assert_eq!(machine.retry_elapsed(), ReconnectAction::None);
        assert_eq!(machine.closed(None), ReconnectAction::None);
        assert_eq!(machine.opened(), ReconnectAction::None);
        assert_eq!(machine.state(), ConnectionState::GivenUp);
    }

    #[test]
    fn test_enable_after_give_up_resets_budget() {
        let mut machine = ReconnectMachine::new();
        machine.enable();
        for _ in 0..MAX_RECONNECT_ATTEMPTS {
            fail_once(&mut machine);
        }
        assert_eq!(machine.closed(None), ReconnectAction::GiveUp);

        assert_eq!(machine.enable(), ReconnectAction::Connect);
        assert_eq!(machine.failures(), 0);
        assert_eq!(
            machine.closed(None),
            ReconnectAction::ScheduleReconnect(RECONNECT_DELAY)
        );
    }

    #[test]
    fn test_open_resets_counter() {
        let mut machine = ReconnectMachine::new();
        machine.enable();
        for _ in 0..MAX_RECONNECT_ATTEMPTS {
            fail_once(&mut machine);
        }
        machine.opened();
        assert_eq!(machine.failures(), 0);

        // A fresh budget after the successful open
        for _ in 0..MAX_RECONNECT_ATTEMPTS {
            assert_eq!(fail_once(&mut machine), ReconnectAction::Connect);
        }
        assert_eq!(machine.closed(None), ReconnectAction::GiveUp);
    }

    #[test]
    fn test_disable_cancels_pending_retry() {
        let mut machine = ReconnectMachine::new();
        machine.enable();
        machine.closed(None);
        assert!(machine.retry_pending());

        assert_eq!(machine.disable(), ReconnectAction::None);
        assert!(!machine.retry_pending());
        assert_eq!(machine.retry_elapsed(), ReconnectAction::None);
    }

    #[test]
    fn test_disable_closes_open_socket() {
        let mut machine = ReconnectMachine::new();
        machine.enable();
        machine.opened();

        assert_eq!(machine.disable(), ReconnectAction::CloseNormally);
        assert_eq!(machine.state(), ConnectionState::Disconnected);
        // The close that follows is not a failure
        assert_eq!(machine.closed(Some(1000)), ReconnectAction::None);
        assert_eq!(machine.failures(), 0);
    }
}
