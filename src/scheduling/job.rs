use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{
    task::{self, JoinHandle},
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;

/// Work driven by a fixed interval timer. The job owns its state; the runner
/// never calls `run` again before the previous call returned.
#[async_trait]
pub trait PeriodicJob: Send + 'static {
    fn name(&self) -> &'static str;

    async fn run(&mut self, now: DateTime<Utc>) -> anyhow::Result<()>;
}

/// Spawns `job` on its own task. The first run happens immediately. A failed
/// run is logged and the timer keeps going.
pub fn spawn_periodic<J: PeriodicJob>(
    mut job: J,
    period: Duration,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    task::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!("Starting {} job every {:?}", job.name(), period);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    log::info!("{} job shutting down", job.name());
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(error) = job.run(clock.now()).await {
                        log::error!("{} job failed: {error:#}", job.name());
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::{ManualClock, SystemClock},
        test_utils::utc,
    };
    use chrono::TimeDelta;
    use std::sync::Mutex;

    type Runs = Arc<Mutex<Vec<DateTime<Utc>>>>;

    struct FlakyJob {
        runs: Runs,
    }

    #[async_trait]
    impl PeriodicJob for FlakyJob {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn run(&mut self, now: DateTime<Utc>) -> anyhow::Result<()> {
            let count = {
                let mut runs = self.runs.lock().unwrap();
                runs.push(now);
                runs.len()
            };
            anyhow::ensure!(count % 2 == 0, "odd run {count}");
            Ok(())
        }
    }

    struct SlowJob {
        active: Arc<Mutex<bool>>,
        overlaps: Arc<Mutex<u32>>,
        runs: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl PeriodicJob for SlowJob {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn run(&mut self, _now: DateTime<Utc>) -> anyhow::Result<()> {
            {
                let mut active = self.active.lock().unwrap();
                if *active {
                    *self.overlaps.lock().unwrap() += 1;
                }
                *active = true;
            }
            tokio::time::sleep(Duration::from_secs(45)).await;
            *self.active.lock().unwrap() = false;
            *self.runs.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_running_after_failures() {
        let runs: Runs = Arc::new(Mutex::new(Vec::new()));
        let shutdown = CancellationToken::new();
        let clock = Arc::new(ManualClock::new(utc("2026-03-10T10:00:00Z")));
        let handle = spawn_periodic(
            FlakyJob { runs: runs.clone() },
            Duration::from_secs(30),
            clock,
            shutdown.clone(),
        );

        tokio::time::sleep(Duration::from_secs(95)).await;
        shutdown.cancel();
        handle.await.unwrap();

        // ticks at 0s, 30s, 60s, 90s
        assert_eq!(runs.lock().unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn reads_the_clock_on_every_tick() {
        let runs: Runs = Arc::new(Mutex::new(Vec::new()));
        let shutdown = CancellationToken::new();
        let clock = Arc::new(ManualClock::new(utc("2026-03-10T10:59:30Z")));
        let handle = spawn_periodic(
            FlakyJob { runs: runs.clone() },
            Duration::from_secs(30),
            clock.clone(),
            shutdown.clone(),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        clock.advance(TimeDelta::seconds(30));
        tokio::time::sleep(Duration::from_secs(30)).await;
        clock.set(utc("2026-03-11T04:00:00Z"));
        tokio::time::sleep(Duration::from_secs(30)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(
            *runs.lock().unwrap(),
            vec![
                utc("2026-03-10T10:59:30Z"),
                utc("2026-03-10T11:00:00Z"),
                utc("2026-03-11T04:00:00Z"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn runs_of_the_same_job_never_overlap() {
        let overlaps = Arc::new(Mutex::new(0));
        let runs = Arc::new(Mutex::new(0));
        let shutdown = CancellationToken::new();
        let job = SlowJob {
            active: Arc::new(Mutex::new(false)),
            overlaps: overlaps.clone(),
            runs: runs.clone(),
        };
        let handle = spawn_periodic(job, Duration::from_secs(30), Arc::new(SystemClock), shutdown.clone());

        tokio::time::sleep(Duration::from_secs(200)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(*overlaps.lock().unwrap(), 0);
        assert!(*runs.lock().unwrap() >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_cancellation() {
        let runs: Runs = Arc::new(Mutex::new(Vec::new()));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let handle = spawn_periodic(
            FlakyJob { runs: runs.clone() },
            Duration::from_secs(30),
            Arc::new(SystemClock),
            shutdown,
        );
        handle.await.unwrap();

        assert!(runs.lock().unwrap().len() <= 1);
    }
}
