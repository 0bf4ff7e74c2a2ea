//! Load Producer Implementation

use alert_model::FiredEvent;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::batcher::AlertBatcher;
use crate::error::ProducerError;

/// Counter of deliveries, labeled by target and response status
pub const ALERTS_FIRED_METRIC: &str = "alert_load_producer_alerts_fired_total";

/// Settings shared by every producer of one test case
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Time between firing cycles
    pub fire_interval: Duration,
    /// Normalized target URLs, delivered to in this order
    pub targets: Arc<[String]>,
    /// No cycle is started at or after this instant
    pub deadline: Option<Instant>,
}

/// Fires one batch per cycle at every target
pub struct LoadProducer {
    slot: usize,
    batcher: AlertBatcher,
    client: reqwest::Client,
    config: ProducerConfig,
    events: Vec<FiredEvent>,
}

impl LoadProducer {
    /// Create a producer for concurrency slot `slot`
    pub fn new(slot: usize, batcher: AlertBatcher, client: reqwest::Client, config: ProducerConfig) -> Self {
        Self {
            slot,
            batcher,
            client,
            config,
            events: Vec::new(),
        }
    }

    /// Fire until the deadline or until `cancel` triggers, returning the
    /// deliveries in firing order.
    ///
    /// Cycles are scheduled on `[start, deadline)`, so a case lasting `n`
    /// fire intervals fires exactly `n` times. Cancellation is only observed
    /// between cycles. Ticks that come due while a cycle is still delivering
    /// are skipped rather than queued.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<Vec<FiredEvent>, ProducerError> {
        info!(
            "Producer {} starting: every {:?} to {} target(s)",
            self.slot,
            self.config.fire_interval,
            self.config.targets.len()
        );

        let mut ticker = tokio::time::interval(self.config.fire_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                scheduled = ticker.tick() => {
                    if self.config.deadline.is_some_and(|deadline| scheduled >= deadline) {
                        break;
                    }
                    if let Err(e) = self.fire().await {
                        error!("Producer {} failed: {}", self.slot, e);
                        return Err(e);
                    }
                }
            }
        }

        info!("Producer {} stopped after {} deliveries", self.slot, self.events.len());
        Ok(self.events)
    }

    /// One firing cycle: draw a batch, encode it once, post it everywhere
    async fn fire(&mut self) -> Result<(), ProducerError> {
        let alerts = self.batcher.next_batch()?;
        let body = serde_json::to_vec(&alerts)?;

        for target in self.config.targets.iter() {
            let response = self
                .client
                .post(target.as_str())
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone())
                .send()
                .await
                .map_err(|source| ProducerError::Transport {
                    target: target.clone(),
                    source,
                })?;

            let status = response.status().as_u16();
            metrics::counter!(
                ALERTS_FIRED_METRIC,
                "alertmanager" => target.clone(),
                "response_code" => status.to_string()
            )
            .increment(1);
            debug!(
                "Producer {} delivered {} alerts from {:?} to {} ({})",
                self.slot,
                alerts.len(),
                self.batcher.window(),
                target,
                status
            );

            self.events.push(FiredEvent {
                target: target.clone(),
                alerts: alerts.clone(),
                timestamp: Utc::now(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_model::{fingerprint, Alert};
    use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
    use dataset::Dataset;
    use std::io::Cursor;
    use std::sync::Mutex;

    type Received = Arc<Mutex<Vec<(String, Vec<Alert>)>>>;

    async fn record(State((name, seen)): State<(String, Received)>, body: Bytes) -> StatusCode {
        let alerts: Vec<Alert> = serde_json::from_slice(&body).unwrap();
        seen.lock().unwrap().push((name, alerts));
        StatusCode::OK
    }

    /// Spawn a target that records every posted batch, returning its URL
    async fn spawn_target(name: &str, seen: Received) -> String {
        let app = Router::new()
            .route("/api/v1/alerts", post(record))
            .with_state((name.to_string(), seen));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/v1/alerts", addr)
    }

    fn batcher(batch_size: usize) -> AlertBatcher {
        let text: String = (0..100).map(|i| format!("a{{i=\"{i}\"}} 1\n")).collect();
        AlertBatcher::new(Arc::new(Dataset::new(Cursor::new(text))), 0, batch_size, 2)
    }

    #[tokio::test]
    async fn test_delivers_identical_batch_to_all_targets_in_order() {
        let seen: Received = Arc::new(Mutex::new(Vec::new()));
        let t1 = spawn_target("one", seen.clone()).await;
        let t2 = spawn_target("two", seen.clone()).await;

        let config = ProducerConfig {
            fire_interval: Duration::from_millis(40),
            targets: vec![t1.clone(), t2.clone()].into(),
            deadline: None,
        };
        let producer = LoadProducer::new(0, batcher(3), reqwest::Client::new(), config);

        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            stop.cancel();
        });

        let events = producer.run(cancel).await.unwrap();
        assert!(events.len() >= 4, "expected at least two cycles, got {}", events.len());
        assert_eq!(events.len() % 2, 0);

        for pair in events.chunks(2) {
            assert_eq!(pair[0].target, t1);
            assert_eq!(pair[1].target, t2);
            assert_eq!(pair[0].alerts.len(), 3);
            assert_eq!(fingerprint(&pair[0].alerts), fingerprint(&pair[1].alerts));
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), events.len());
        assert_eq!(seen[0].0, "one");
        assert_eq!(seen[0].1, events[0].alerts);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_fires_nothing() {
        let config = ProducerConfig {
            fire_interval: Duration::from_millis(10),
            targets: vec!["http://127.0.0.1:1/api/v1/alerts".to_string()].into(),
            deadline: None,
        };
        let producer = LoadProducer::new(0, batcher(1), reqwest::Client::new(), config);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let events = producer.run(cancel).await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_target_is_fatal() {
        let config = ProducerConfig {
            fire_interval: Duration::from_millis(10),
            targets: vec!["http://127.0.0.1:1/api/v1/alerts".to_string()].into(),
            deadline: None,
        };
        let producer = LoadProducer::new(0, batcher(1), reqwest::Client::new(), config);

        let err = producer.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ProducerError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_error_status_is_recorded_not_fatal() {
        let app = Router::new().route(
            "/api/v1/alerts",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = ProducerConfig {
            fire_interval: Duration::from_secs(60),
            targets: vec![format!("http://{}/api/v1/alerts", addr)].into(),
            deadline: None,
        };
        let producer = LoadProducer::new(0, batcher(2), reqwest::Client::new(), config);
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            stop.cancel();
        });

        // first tick is immediate, the next one is a minute away
        let events = producer.run(cancel).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    /// Spawn a target that takes `delay` to acknowledge each batch
    async fn spawn_slow_target(delay: Duration) -> String {
        let app = Router::new().route(
            "/api/v1/alerts",
            post(move || async move {
                tokio::time::sleep(delay).await;
                StatusCode::OK
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/v1/alerts", addr)
    }

    #[tokio::test]
    async fn test_fires_once_per_interval_before_deadline() {
        let seen: Received = Arc::new(Mutex::new(Vec::new()));
        let target = spawn_target("one", seen.clone()).await;

        let interval = Duration::from_millis(100);
        let config = ProducerConfig {
            fire_interval: interval,
            targets: vec![target].into(),
            deadline: Some(Instant::now() + 3 * interval),
        };
        let producer = LoadProducer::new(0, batcher(2), reqwest::Client::new(), config);

        // never cancelled: the deadline alone ends the run
        let events = producer.run(CancellationToken::new()).await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_slow_target_coalesces_ticks() {
        let interval = Duration::from_millis(50);
        let latency = 3 * interval;
        let config = ProducerConfig {
            fire_interval: interval,
            targets: vec![spawn_slow_target(latency).await].into(),
            deadline: None,
        };
        let producer = LoadProducer::new(0, batcher(1), reqwest::Client::new(), config);

        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        let started = Instant::now();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(600)).await;
            stop.cancel();
        });

        let events = producer.run(cancel).await.unwrap();
        let elapsed = started.elapsed();

        // paced by the target (~elapsed / latency), not by the interval
        let by_latency = (elapsed.as_millis() / latency.as_millis()) as usize;
        let by_interval = (elapsed.as_millis() / interval.as_millis()) as usize;
        assert!(events.len() <= by_latency + 1, "{} cycles in {:?}", events.len(), elapsed);
        assert!(events.len() >= 3, "{} cycles in {:?}", events.len(), elapsed);
        assert!(events.len() < by_interval / 2);
    }

    #[tokio::test]
    async fn test_cancel_during_delivery_keeps_in_flight_cycle() {
        let latency = Duration::from_millis(300);
        let config = ProducerConfig {
            fire_interval: Duration::from_secs(60),
            targets: vec![spawn_slow_target(latency).await].into(),
            deadline: None,
        };
        let producer = LoadProducer::new(0, batcher(2), reqwest::Client::new(), config);

        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            stop.cancel();
        });

        let started = Instant::now();
        let events = producer.run(cancel).await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].alerts.len(), 2);
        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
