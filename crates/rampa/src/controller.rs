//! Ramp controller: drives the pool of virtual-user tasks through a plan.
//!
//! ```text
//! Idle ──▶ Ramping(stage 0) ──▶ … ──▶ Ramping(stage n) ──▶ Draining ──▶ Done
//!                 │                                          ▲
//!                 └──────────────── shutdown ────────────────┘
//! ```
//!
//! Within a stage the controller wakes every tick, computes the linear
//! target for the elapsed fraction and spawns or stops users to match it.
//! Users are stopped highest index first. A stopped user finishes its
//! in-flight request ([`DrainPolicy::Graceful`]) or is aborted
//! ([`DrainPolicy::Abandon`]).

use crate::client::LoginClient;
use crate::config::RunConfig;
use crate::duration::format_duration;
use crate::plan::RunPlan;
use crate::request::RequestGenerator;
use crate::result::{RampaError, RampaResult};
use crate::summary::{OutcomeTally, RunSummary, StageReport};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep_until, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// What happens to the in-flight request of a user stopped by a ramp-down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrainPolicy {
    /// Let the request complete and record it
    #[default]
    Graceful,
    /// Abort the request immediately; it is not recorded
    Abandon,
}

impl std::fmt::Display for DrainPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Graceful => write!(f, "graceful"),
            Self::Abandon => write!(f, "abandon"),
        }
    }
}

/// Drives virtual users through a [`RunPlan`]
#[derive(Debug)]
pub struct RampController {
    tick: Duration,
    grace: Duration,
    drain: DrainPolicy,
    active: Arc<AtomicUsize>,
    running: Arc<AtomicUsize>,
}

impl RampController {
    /// Create a controller from the timing fields of `config`
    pub fn new(config: &RunConfig) -> Self {
        Self {
            tick: config.tick_interval.max(Duration::from_millis(1)),
            grace: config.effective_grace_period(),
            drain: config.drain_policy,
            active: Arc::new(AtomicUsize::new(0)),
            running: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Live count of users that have not been signaled to stop
    pub fn active_users(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.active)
    }

    /// Live count of user tasks that have not exited yet, stopped ones
    /// included
    pub fn running_users(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.running)
    }

    /// Execute every stage of `plan`, then drain
    pub async fn run(
        &self,
        plan: &RunPlan,
        generator: RequestGenerator,
        client: Arc<dyn LoginClient>,
    ) -> RampaResult<RunSummary> {
        self.run_until(plan, generator, client, std::future::pending())
            .await
    }

    /// Like [`run`](Self::run), but stop early and drain once `shutdown`
    /// resolves
    pub async fn run_until<F>(
        &self,
        plan: &RunPlan,
        generator: RequestGenerator,
        client: Arc<dyn LoginClient>,
        shutdown: F,
    ) -> RampaResult<RunSummary>
    where
        F: Future<Output = ()>,
    {
        plan.validate()?;

        let started = Instant::now();
        let started_at = chrono::Utc::now().to_rfc3339();
        self.active.store(0, Ordering::Release);

        let tally = Arc::new(OutcomeTally::new());
        let mut pool = Pool {
            users: Vec::new(),
            retired: Vec::new(),
            next_index: 0,
            generator: Arc::new(generator),
            client,
            tally: Arc::clone(&tally),
            active: Arc::clone(&self.active),
            running: Arc::clone(&self.running),
            drain: self.drain,
            panicked: 0,
        };

        info!(
            stages = plan.len(),
            peak = plan.peak_target(),
            duration = %format_duration(plan.total_duration()),
            url = %pool.generator.url(),
            mode = %pool.generator.mode(),
            timeout = %format_duration(pool.generator.timeout()),
            "starting ramp"
        );

        let mut reports = Vec::with_capacity(plan.len());
        tokio::pin!(shutdown);

        'stages: for (index, stage) in plan.iter().enumerate() {
            let stage_start = Instant::now();
            let start = pool.active();
            let kind = if stage.is_ramp_from(start) { "ramp" } else { "hold" };
            info!(stage = index, from = start, target = stage.target, kind, "stage started");

            let deadline = sleep_until(stage_start + stage.duration);
            tokio::pin!(deadline);
            let mut ticker = interval(self.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = &mut shutdown => {
                        info!(stage = index, active = pool.active(), "shutdown requested");
                        break 'stages;
                    }
                    () = &mut deadline => break,
                    _ = ticker.tick() => {
                        pool.reap().await;
                        let desired = stage.users_at(start, stage_start.elapsed());
                        pool.reconcile(desired);
                    }
                }
            }

            pool.reap().await;
            pool.reconcile(stage.target);
            let report = StageReport {
                index,
                target: stage.target,
                active_at_end: pool.active(),
                elapsed: stage_start.elapsed(),
            };
            info!(
                stage = index,
                active = report.active_at_end,
                requests = tally.total_requests(),
                "stage finished"
            );
            reports.push(report);
        }

        let panicked = self.drain(pool).await;
        let summary = tally.summarize(reports, started.elapsed(), started_at);
        info!(
            requests = summary.total_requests,
            failed = summary.failed_outcomes,
            elapsed = %format_duration(summary.elapsed),
            "ramp finished"
        );

        if panicked > 0 {
            return Err(RampaError::runtime(format!(
                "{panicked} virtual user(s) panicked"
            )));
        }
        Ok(summary)
    }

    /// Signal every user, then wait for them up to the grace period.
    /// Returns how many user tasks panicked.
    async fn drain(&self, mut pool: Pool) -> usize {
        pool.reap().await;
        let users = pool.stop_all();
        let deadline = Instant::now() + self.grace;
        debug!(users = users.len(), grace = %format_duration(self.grace), "draining");

        let mut abandoned = 0;
        let mut panicked = pool.panicked;
        for mut user in users {
            match timeout_at(deadline, &mut user.handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_panic() => {
                    warn!(user = user.index, "virtual user panicked");
                    panicked += 1;
                }
                Ok(Err(_)) => {}
                Err(_) => {
                    user.handle.abort();
                    abandoned += 1;
                }
            }
        }
        if abandoned > 0 {
            warn!(abandoned, "virtual users still in flight after grace period were abandoned");
        }
        panicked
    }
}

struct VirtualUser {
    index: u64,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

struct Pool {
    users: Vec<VirtualUser>,
    retired: Vec<VirtualUser>,
    next_index: u64,
    generator: Arc<RequestGenerator>,
    client: Arc<dyn LoginClient>,
    tally: Arc<OutcomeTally>,
    active: Arc<AtomicUsize>,
    running: Arc<AtomicUsize>,
    drain: DrainPolicy,
    panicked: usize,
}

impl Pool {
    fn active(&self) -> usize {
        self.users.len()
    }

    fn reconcile(&mut self, desired: usize) {
        if desired > self.users.len() {
            debug!(from = self.users.len(), to = desired, "spawning virtual users");
            while self.users.len() < desired {
                self.spawn();
            }
        } else if desired < self.users.len() {
            debug!(from = self.users.len(), to = desired, "stopping virtual users");
            while self.users.len() > desired {
                self.stop_highest();
            }
        }
        self.active.store(self.users.len(), Ordering::Release);
    }

    fn spawn(&mut self) {
        let index = self.next_index;
        self.next_index += 1;

        let stop = Arc::new(AtomicBool::new(false));
        let guard = RunningGuard::new(Arc::clone(&self.running));
        let handle = tokio::spawn(virtual_user(
            Arc::clone(&stop),
            Arc::clone(&self.generator),
            Arc::clone(&self.client),
            Arc::clone(&self.tally),
            guard,
        ));
        self.users.push(VirtualUser {
            index,
            stop,
            handle,
        });
    }

    fn stop_highest(&mut self) {
        let Some(user) = self.users.pop() else {
            return;
        };
        user.stop.store(true, Ordering::Release);
        match self.drain {
            DrainPolicy::Graceful => self.retired.push(user),
            DrainPolicy::Abandon => user.handle.abort(),
        }
    }

    /// Drop users whose task has exited, counting panics. An active user
    /// only exits by panicking, so the next reconcile replaces it.
    async fn reap(&mut self) {
        let (finished, live): (Vec<_>, Vec<_>) = self
            .users
            .drain(..)
            .partition(|user| user.handle.is_finished());
        self.users = live;
        let (retired, live): (Vec<_>, Vec<_>) = self
            .retired
            .drain(..)
            .partition(|user| user.handle.is_finished());
        self.retired = live;

        for user in finished.into_iter().chain(retired) {
            if let Err(e) = user.handle.await {
                if e.is_panic() {
                    warn!(user = user.index, "virtual user panicked");
                    self.panicked += 1;
                }
            }
        }
        self.active.store(self.users.len(), Ordering::Release);
    }

    fn stop_all(&mut self) -> Vec<VirtualUser> {
        let mut users: Vec<VirtualUser> = self.users.drain(..).rev().collect();
        users.append(&mut self.retired);
        for user in &users {
            user.stop.store(true, Ordering::Release);
        }
        self.active.store(0, Ordering::Release);
        users
    }
}

/// Counts a user task as running until the task is dropped
struct RunningGuard(Arc<AtomicUsize>);

impl RunningGuard {
    fn new(running: Arc<AtomicUsize>) -> Self {
        running.fetch_add(1, Ordering::AcqRel);
        Self(running)
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn virtual_user(
    stop: Arc<AtomicBool>,
    generator: Arc<RequestGenerator>,
    client: Arc<dyn LoginClient>,
    tally: Arc<OutcomeTally>,
    _guard: RunningGuard,
) {
    while !stop.load(Ordering::Acquire) {
        let request = generator.build_request();
        let outcome = client.send(&request).await;
        tally.record(&outcome);
        tokio::task::yield_now().await;
    }
}
