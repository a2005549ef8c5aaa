use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use jiff::Timestamp;

/// Source of "now" for deciding whether a start date already lies in the past.
pub trait Clock {
    /// Current UTC civil datetime.
    fn now(&self) -> DateTime;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        Timestamp::now().to_zoned(TimeZone::UTC).datetime()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime);

impl Clock for FixedClock {
    fn now(&self) -> DateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime {
        (**self).now()
    }
}
