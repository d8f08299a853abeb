//! Cooperative, time-gated status polling.

/// Refresh interval used by [`crate::Holoprojector::initialize`].
pub const DEFAULT_REFRESH_MS: u32 = 125;

/// Monotonic millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        C::now_ms(self)
    }
}

/// Status query schedule.
///
/// `Idle` never fires. `Armed` fires once the clock has moved strictly past
/// the deadline, then pushes the deadline one interval beyond the current
/// time, so repeated ticks inside one interval fire at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Schedule {
    #[default]
    Idle,
    Armed { interval_ms: u32, deadline_ms: u64 },
}

impl Schedule {
    /// Schedule that fires on the first tick after `now_ms`, then every
    /// `interval_ms`. A zero interval leaves the schedule idle.
    #[must_use]
    pub fn new(interval_ms: u32, now_ms: u64) -> Self {
        if interval_ms == 0 {
            Self::Idle
        } else {
            Self::Armed {
                interval_ms,
                deadline_ms: now_ms,
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed { .. })
    }

    /// Configured interval, zero when idle.
    #[must_use]
    pub fn interval_ms(&self) -> u32 {
        match self {
            Self::Idle => 0,
            Self::Armed { interval_ms, .. } => *interval_ms,
        }
    }

    /// Advance to `now_ms`; returns `true` if a status query is due.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        match self {
            Self::Armed {
                interval_ms,
                deadline_ms,
            } if now_ms > *deadline_ms => {
                *deadline_ms = now_ms + u64::from(*interval_ms);
                true
            }
            _ => false,
        }
    }
}
