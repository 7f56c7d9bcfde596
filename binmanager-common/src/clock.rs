//! # Clock Abstraction
//!
//! The engine depends on nothing from the outside world except a UTC clock
//! to stamp newly created tombstones and to evaluate `Prune`. `UtcInstant`
//! is the wire-visible time unit: 100-nanosecond ticks since a fixed epoch,
//! matching the `ExpiryTicks` field of the snapshot codec bit-for-bit.
//!
//! The fixed epoch is the Unix epoch (1970-01-01T00:00:00Z). Any other
//! fixed point would work equally well for the invariants the engine
//! cares about (only relative ordering and equality matter); Unix epoch is
//! chosen because it keeps `UtcInstant::from_system_time` a direct,
//! infallible multiply instead of a calendar conversion.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Number of 100ns ticks in one second, used to convert to/from `SystemTime`.
const TICKS_PER_SEC: i64 = 10_000_000;

/// A UTC instant expressed in 100-nanosecond ticks since the Unix epoch.
///
/// This is the type persisted in the wire format (`ExpiryTicks`), so its
/// representation must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UtcInstant {
    ticks: i64,
}

impl UtcInstant {
    /// The Unix epoch itself.
    pub const EPOCH: UtcInstant = UtcInstant { ticks: 0 };

    /// Builds an instant directly from its tick count.
    #[inline]
    pub const fn from_ticks(ticks: i64) -> Self {
        UtcInstant { ticks }
    }

    /// Returns the raw tick count (100ns units since the Unix epoch).
    #[inline]
    pub const fn ticks(&self) -> i64 {
        self.ticks
    }

    /// Converts a `SystemTime` to ticks, saturating at the representable range.
    pub fn from_system_time(time: SystemTime) -> Self {
        let ticks = match time.duration_since(UNIX_EPOCH) {
            Ok(since_epoch) => duration_to_ticks(since_epoch),
            Err(before_epoch) => -duration_to_ticks(before_epoch.duration()),
        };
        UtcInstant { ticks }
    }

    /// Converts back to `SystemTime`, for callers that want std types.
    pub fn to_system_time(&self) -> SystemTime {
        if self.ticks >= 0 {
            UNIX_EPOCH + ticks_to_duration(self.ticks)
        } else {
            UNIX_EPOCH - ticks_to_duration(-self.ticks)
        }
    }

    /// Returns `self + duration`.
    pub fn add(&self, duration: Duration) -> Self {
        UtcInstant {
            ticks: self.ticks.saturating_add(duration_to_ticks(duration)),
        }
    }
}

fn duration_to_ticks(d: Duration) -> i64 {
    (d.as_secs() as i64).saturating_mul(TICKS_PER_SEC) + (d.subsec_nanos() as i64) / 100
}

fn ticks_to_duration(ticks: i64) -> Duration {
    let secs = ticks / TICKS_PER_SEC;
    let rem_ticks = ticks % TICKS_PER_SEC;
    Duration::new(secs as u64, (rem_ticks * 100) as u32)
}

/// A source of the current UTC instant.
///
/// The engine never calls into the OS clock directly so that tests and
/// alternate deployments (e.g. a hybrid-logical-clock-backed service) can
/// supply their own notion of "now".
pub trait Clock {
    fn utc_now(&self) -> UtcInstant;
}

/// The default clock, backed by `SystemTime::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn utc_now(&self) -> UtcInstant {
        UtcInstant::from_system_time(SystemTime::now())
    }
}

/// A settable clock for deterministic tests.
///
/// Holds the current instant in an `Arc<AtomicI64>` so a clone can be kept
/// by the test driver and advanced from outside the `Engine` that owns the
/// other handle, and cheaply shared into any engine that takes `C: Clock`
/// by value.
#[derive(Debug, Clone)]
pub struct ManualClock {
    ticks: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: UtcInstant) -> Self {
        ManualClock {
            ticks: Arc::new(AtomicI64::new(start.ticks())),
        }
    }

    /// Advances the clock by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.ticks
            .fetch_add(duration_to_ticks(duration), Ordering::Relaxed);
    }

    /// Sets the clock to an explicit instant.
    pub fn set(&self, instant: UtcInstant) {
        self.ticks.store(instant.ticks(), Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn utc_now(&self) -> UtcInstant {
        UtcInstant::from_ticks(self.ticks.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_system_time() {
        let now = SystemTime::now();
        let instant = UtcInstant::from_system_time(now);
        let back = instant.to_system_time();
        let drift = now.duration_since(back).unwrap_or_else(|e| e.duration());
        assert!(drift < Duration::from_micros(1));
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(UtcInstant::EPOCH);
        assert_eq!(clock.utc_now(), UtcInstant::EPOCH);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.utc_now().ticks(), TICKS_PER_SEC);
    }

    #[test]
    fn ordering_matches_ticks() {
        let a = UtcInstant::from_ticks(10);
        let b = UtcInstant::from_ticks(20);
        assert!(a < b);
    }
}
