use time::OffsetDateTime;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    now: parking_lot::Mutex<OffsetDateTime>,
}

#[cfg(test)]
impl ManualClock {
    pub fn at_unix_millis(millis: i64) -> Self {
        let now = OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
            .expect("timestamp in range");
        Self {
            now: parking_lot::Mutex::new(now),
        }
    }

    pub fn advance(&self, by: std::time::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock()
    }
}
