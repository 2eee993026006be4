//! The "engine is thinking" ticker. It checks the clock every half second and
//! reports each whole second since it was started once, until it is stopped or
//! restarted.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;

pub const TICK: Duration = Duration::from_millis(500);

pub struct ThinkingTimer {
    report: Arc<dyn Fn(u64) + Send + Sync>,
    task: Option<AbortHandle>,
}

impl ThinkingTimer {
    pub fn new(report: impl Fn(u64) + Send + Sync + 'static) -> Self {
        ThinkingTimer {
            report: Arc::new(report),
            task: None,
        }
    }

    /// Starts counting from zero. A running ticker is replaced, so there is
    /// never more than one.
    pub fn start(&mut self) {
        self.stop();
        let report = self.report.clone();
        let started = Instant::now();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            let mut reported = None;
            loop {
                // The first tick completes immediately.
                interval.tick().await;
                let secs = started.elapsed().as_secs();
                if reported != Some(secs) {
                    reported = Some(secs);
                    report(secs);
                }
            }
        });
        self.task = Some(task.abort_handle());
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for ThinkingTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording() -> (ThinkingTimer, Arc<Mutex<Vec<u64>>>) {
        let seen = Arc::new(Mutex::new(vec![]));
        let sink = seen.clone();
        let timer = ThinkingTimer::new(move |secs| sink.lock().unwrap().push(secs));
        (timer, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn reports_elapsed_seconds_until_stopped() {
        let (mut timer, seen) = recording();
        timer.start();
        assert!(timer.is_running());
        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);

        timer.stop();
        assert!(!timer.is_running());
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_replaces_the_running_ticker() {
        let (mut timer, seen) = recording();
        timer.start();
        timer.start();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn each_second_is_reported_once() {
        let (mut timer, seen) = recording();
        timer.start();
        tokio::time::sleep(Duration::from_millis(10_100)).await;
        assert_eq!(*seen.lock().unwrap(), (0..=10).collect::<Vec<u64>>());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stops_the_ticker() {
        let (mut timer, seen) = recording();
        timer.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(timer);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }
}
