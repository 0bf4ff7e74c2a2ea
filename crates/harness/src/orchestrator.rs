//! Test Case Orchestrator
//!
//! Runs configured load tests one after another. Each case moves through
//! `Created -> Running -> Draining -> Reporting -> Done`; any failure aborts
//! the whole run and no completion signal is sent.

use alert_model::{Event, FiredEvent};
use dataset::Dataset;
use event_merge::merge_events;
use load_producer::{AlertBatcher, LoadProducer, ProducerConfig, ProducerError};
use receiver::NotificationReceiver;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::{TestCaseConfig, DEFAULT_DRAIN_PERIOD};
use crate::error::HarnessError;

/// File name of the per-case report inside its result directory
pub const REPORT_FILE: &str = "report";

/// Lifecycle of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Created,
    Running,
    Draining,
    Reporting,
    Done,
}

impl fmt::Display for CaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaseState::Created => "created",
            CaseState::Running => "running",
            CaseState::Draining => "draining",
            CaseState::Reporting => "reporting",
            CaseState::Done => "done",
        };
        f.write_str(name)
    }
}

type ProducerOutcome = (usize, Result<Vec<FiredEvent>, ProducerError>);

/// Drives test cases against a fixed set of targets
pub struct Orchestrator {
    cases: Vec<TestCaseConfig>,
    targets: Arc<[String]>,
    receiver: Arc<NotificationReceiver>,
    client: reqwest::Client,
    results_dir: PathBuf,
    drain: Duration,
}

impl Orchestrator {
    pub fn new(
        cases: Vec<TestCaseConfig>,
        targets: Vec<String>,
        receiver: Arc<NotificationReceiver>,
    ) -> Self {
        Self {
            cases,
            targets: targets.into(),
            receiver,
            client: reqwest::Client::new(),
            results_dir: PathBuf::from("test_results"),
            drain: DEFAULT_DRAIN_PERIOD,
        }
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    /// Wait after each deadline before reading the receiver's log
    pub fn with_drain_period(mut self, drain: Duration) -> Self {
        self.drain = drain;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Run every case in order, then signal `done` once.
    ///
    /// Returns the written report paths. On error `done` is dropped unsent.
    pub async fn run(self, done: oneshot::Sender<()>) -> Result<Vec<PathBuf>, HarnessError> {
        info!(
            "Running {} load test(s) against {} target(s)",
            self.cases.len(),
            self.targets.len()
        );

        let mut reports = Vec::with_capacity(self.cases.len());
        for case in &self.cases {
            match self.run_case(case).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("Load test {} failed: {}", case.name, e);
                    return Err(e);
                }
            }
        }

        info!("All {} load test(s) complete", reports.len());
        if done.send(()).is_err() {
            debug!("Nobody waiting for load test completion");
        }
        Ok(reports)
    }

    async fn run_case(&self, case: &TestCaseConfig) -> Result<PathBuf, HarnessError> {
        let mut state = CaseState::Created;
        let case_dir = self.results_dir.join(&case.name);
        let report_path = case_dir.join(REPORT_FILE);

        fs::create_dir_all(&case_dir).map_err(|source| HarnessError::Report {
            path: case_dir.clone(),
            source,
        })?;
        let report = File::create(&report_path).map_err(|source| HarnessError::Report {
            path: report_path.clone(),
            source,
        })?;
        let dataset = Arc::new(Dataset::open(&case.dataset_file)?);
        info!(
            "Load test {} {}: {} producer(s), batch {}, rotate every {}, fire every {:?} for {:?}",
            case.name,
            state,
            case.concurrency,
            case.batch_size,
            case.rotation_interval,
            case.fire_interval,
            case.duration
        );

        transition(case, &mut state, CaseState::Running);
        let deadline = Instant::now() + case.duration;
        let cancel = CancellationToken::new();
        let mut producers = self.spawn_producers(case, dataset, deadline, &cancel);
        let mut fired: Vec<Vec<Event>> = (0..case.concurrency).map(|_| Vec::new()).collect();

        // Producers stop on their own once no cycle is left before the deadline
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                Some(joined) = producers.join_next() => {
                    if let Err(e) = store_outcome(joined, &mut fired) {
                        cancel.cancel();
                        producers.shutdown().await;
                        return Err(e);
                    }
                }
            }
        }

        transition(case, &mut state, CaseState::Draining);
        cancel.cancel();
        while let Some(joined) = producers.join_next().await {
            if let Err(e) = store_outcome(joined, &mut fired) {
                producers.shutdown().await;
                return Err(e);
            }
        }
        tokio::time::sleep_until(deadline + self.drain).await;

        transition(case, &mut state, CaseState::Reporting);
        // Taken and cleared in one step; later arrivals belong to the next case
        let received: Vec<Event> = self.receiver.reset().into_iter().map(Event::from).collect();
        let mut streams = fired;
        streams.push(received);
        let events = merge_events(streams);
        write_report(&report_path, report, &events)?;

        transition(case, &mut state, CaseState::Done);
        info!("Load test {} wrote {} events to {}", case.name, events.len(), report_path.display());
        Ok(report_path)
    }

    fn spawn_producers(
        &self,
        case: &TestCaseConfig,
        dataset: Arc<Dataset>,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> JoinSet<ProducerOutcome> {
        let config = ProducerConfig {
            fire_interval: case.fire_interval,
            targets: self.targets.clone(),
            deadline: Some(deadline),
        };

        let mut producers = JoinSet::new();
        for slot in 0..case.concurrency {
            let batcher = AlertBatcher::new(
                dataset.clone(),
                slot * case.batch_size,
                case.batch_size,
                case.rotation_interval,
            );
            let producer = LoadProducer::new(slot, batcher, self.client.clone(), config.clone());
            let cancel = cancel.clone();
            producers.spawn(async move { (slot, producer.run(cancel).await) });
        }
        producers
    }
}

fn transition(case: &TestCaseConfig, state: &mut CaseState, next: CaseState) {
    info!("Load test {}: {} -> {}", case.name, state, next);
    *state = next;
}

fn store_outcome(
    joined: Result<ProducerOutcome, JoinError>,
    fired: &mut [Vec<Event>],
) -> Result<(), HarnessError> {
    let (slot, outcome) = joined?;
    let events = outcome?;
    debug!("Producer {} finished with {} deliveries", slot, events.len());
    fired[slot] = events.into_iter().map(Event::from).collect();
    Ok(())
}

fn write_report(path: &Path, file: File, events: &[Event]) -> Result<(), HarnessError> {
    let report_error = |source| HarnessError::Report {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(file);
    for event in events {
        writeln!(writer, "{}", event).map_err(report_error)?;
    }
    writer.flush().map_err(report_error)
}
