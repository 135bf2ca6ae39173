//! Working and stopped clocks.
//!
//! Peer expiry and connection-cookie issue times are derived from the
//! [`crate::CurrentClock`] alias rather than from [`std::time::SystemTime`]
//! directly, so that tests can stop the clock and move it by hand.
use std::cell::RefCell;
use std::time::{Duration, SystemTime};

use crate::primitives::DurationSinceUnixEpoch;

/// A source of "now", expressed as a duration since the Unix epoch.
pub trait Time {
    fn now() -> DurationSinceUnixEpoch;
}

/// The system clock.
#[derive(Debug)]
pub struct Working;

impl Time for Working {
    fn now() -> DurationSinceUnixEpoch {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("the system clock should be set after the unix epoch")
    }
}

/// A clock that only moves when told to.
///
/// The stopped time is thread-local: every test thread starts at the
/// Unix epoch and owns its own timeline.
#[derive(Debug)]
pub struct Stopped;

thread_local! {
    static STOPPED_TIME: RefCell<DurationSinceUnixEpoch> = const { RefCell::new(Duration::ZERO) };
}

impl Time for Stopped {
    fn now() -> DurationSinceUnixEpoch {
        STOPPED_TIME.with(|t| *t.borrow())
    }
}

impl Stopped {
    /// Sets the stopped time for the calling thread.
    pub fn local_set(unix_time: &DurationSinceUnixEpoch) {
        STOPPED_TIME.with(|t| *t.borrow_mut() = *unix_time);
    }

    /// Moves the stopped time forward for the calling thread.
    pub fn local_add(period: &Duration) {
        STOPPED_TIME.with(|t| {
            let new_time = *t.borrow() + *period;
            *t.borrow_mut() = new_time;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Stopped, Time, Working};

    #[test]
    fn it_should_start_the_stopped_clock_at_the_unix_epoch() {
        Stopped::local_set(&Duration::ZERO);

        assert_eq!(Stopped::now(), Duration::ZERO);
    }

    #[test]
    fn it_should_set_and_advance_the_stopped_clock() {
        Stopped::local_set(&Duration::from_secs(100));
        Stopped::local_add(&Duration::from_secs(20));

        assert_eq!(Stopped::now(), Duration::from_secs(120));
    }

    #[test]
    fn the_working_clock_should_be_past_the_unix_epoch() {
        assert!(Working::now() > Duration::ZERO);
    }
}
