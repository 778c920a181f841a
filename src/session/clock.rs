use log::debug;
use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior};

/// One-second countdown source owned by a single session.
///
/// Stopping drops the underlying interval, so no tick can be observed
/// afterwards. A stopped clock's [`Clock::tick`] never resolves.
pub struct Clock {
    period: Duration,
    interval: Option<Interval>,
}

impl Clock {
    pub fn new() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// First tick arrives one period after start. Starting twice is a no-op.
    pub fn start(&mut self) {
        if self.interval.is_some() {
            return;
        }
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        // Late ticks are delivered in a burst so the local estimate keeps pace with wall time.
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        self.interval = Some(interval);
        debug!("Clock started");
    }

    pub fn stop(&mut self) {
        if self.interval.take().is_some() {
            debug!("Clock stopped");
        }
    }

    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
