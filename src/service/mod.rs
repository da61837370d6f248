pub mod attendance;

use chrono::{DateTime, Utc};

/// Injected clock so the attendance state machine is deterministic under
/// test. "Today" is always the server's current UTC calendar day, never a
/// client-supplied timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
