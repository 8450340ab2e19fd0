use std::pin::Pin;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{sleep_until, Instant, Sleep};
use tracing::warn;

/// A single resettable timer.
///
/// Scheduling while a timer is pending pushes its deadline back instead of
/// arming a second one, so a burst of triggers collapses into one firing one
/// quiet period after the last trigger.
#[derive(Debug)]
pub struct Debouncer {
    quiet_period: Duration,
    timer: Option<Pin<Box<Sleep>>>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            timer: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Arm the timer, or reset the pending one.
    ///
    /// Returns `false` without arming anything when called outside a tokio
    /// runtime.
    pub fn schedule(&mut self) -> bool {
        if Handle::try_current().is_err() {
            warn!("no tokio runtime; restoration pass not scheduled");
            return false;
        }
        let deadline = Instant::now() + self.quiet_period;
        match self.timer.as_mut() {
            Some(timer) => timer.as_mut().reset(deadline),
            None => self.timer = Some(Box::pin(sleep_until(deadline))),
        }
        true
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.as_ref().map(|timer| timer.deadline())
    }

    pub fn cancel(&mut self) {
        self.timer = None;
    }

    /// Wait for the pending timer and disarm it. Returns `false` at once when
    /// nothing is pending.
    pub async fn elapsed(&mut self) -> bool {
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        timer.await;
        self.timer = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rescheduling_pushes_the_deadline_back() {
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        let start = Instant::now();
        debouncer.schedule();
        tokio::time::advance(Duration::from_millis(300)).await;
        debouncer.schedule();

        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(800))
        );
        assert!(debouncer.elapsed().await);
        assert_eq!(Instant::now(), start + Duration::from_millis(800));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.elapsed().await);
    }

    #[test]
    fn scheduling_without_a_runtime_is_refused() {
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        assert!(!debouncer.schedule());
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_disarms() {
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.schedule();
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert!(!debouncer.elapsed().await);
    }
}
