//! Fakes of the engine's collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use probe_core::{
    Clock, EngineConfig, MeasurementClient, MockClock, ProbeError, Renderer, Result,
    RunRequest, SessionEngine, SessionStore,
};
use probe_types::{
    Measurement, MeasurementCreate, MeasurementCreateResponse, MeasurementOptions,
    MeasurementStatus, MeasurementType, PingStats, ProbeDetails, ProbeMeasurement, ProbeResult,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const MIN_INTERVAL: Duration = Duration::from_millis(500);

pub fn default_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// A ping measurement with one result per probe status.
pub fn measurement(id: &str, status: MeasurementStatus, probes: &[MeasurementStatus]) -> Measurement {
    Measurement {
        id: id.to_string(),
        kind: MeasurementType::Ping,
        status,
        target: "jsdelivr.com".to_string(),
        probes_count: probes.len() as u32,
        results: probes
            .iter()
            .map(|probe_status| ProbeMeasurement {
                probe: ProbeDetails {
                    continent: "EU".to_string(),
                    country: "DE".to_string(),
                    city: "Berlin".to_string(),
                    asn: 3320,
                    network: "Deutsche Telekom AG".to_string(),
                    ..Default::default()
                },
                result: ProbeResult {
                    status: *probe_status,
                    raw_output: "PING jsdelivr.com".to_string(),
                    resolved_address: None,
                    resolved_hostname: None,
                    stats: Some(PingStats {
                        min: Some(1.0),
                        avg: Some(2.0),
                        max: Some(3.0),
                        total: 16,
                        rcv: 16,
                        drop: 0,
                        loss: 0.0,
                    }),
                },
            })
            .collect(),
    }
}

/// A measurement that has no results yet.
pub fn pending(id: &str) -> Measurement {
    measurement(id, MeasurementStatus::InProgress, &[])
}

pub fn ping_request(from: &str) -> RunRequest {
    RunRequest {
        kind: MeasurementType::Ping,
        target: "jsdelivr.com".to_string(),
        from: from.to_string(),
        limit: 1,
        in_progress_updates: true,
        options: MeasurementOptions::default(),
        continuous: false,
    }
}

pub fn continuous_request(from: &str) -> RunRequest {
    RunRequest {
        continuous: true,
        options: MeasurementOptions {
            packets: Some(16),
            ..Default::default()
        },
        ..ping_request(from)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    Create(MeasurementCreate),
    Get(String),
}

#[derive(Default)]
struct ClientState {
    created: usize,
    create_failures: HashMap<usize, String>,
    polls: HashMap<String, VecDeque<Measurement>>,
    poll_failures: HashMap<String, String>,
    calls: Vec<ClientCall>,
    poll_times: Vec<(String, tokio::time::Instant)>,
}

/// Scripted measurement API. Created ids are `m1`, `m2`, ...
///
/// Polls replay the scripted states of a measurement in order and repeat the
/// last one once the script is exhausted.
#[derive(Default)]
pub struct FakeClient {
    state: Mutex<ClientState>,
}

impl FakeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, id: &str, states: Vec<Measurement>) {
        self.state
            .lock()
            .unwrap()
            .polls
            .insert(id.to_string(), states.into());
    }

    /// Fail the n-th create call (1-based).
    pub fn fail_create(&self, nth: usize, message: &str) {
        self.state
            .lock()
            .unwrap()
            .create_failures
            .insert(nth, message.to_string());
    }

    pub fn fail_get(&self, id: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .poll_failures
            .insert(id.to_string(), message.to_string());
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn creates(&self) -> Vec<MeasurementCreate> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ClientCall::Create(create) => Some(create),
                ClientCall::Get(_) => None,
            })
            .collect()
    }

    pub fn gets(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ClientCall::Get(id) => Some(id),
                ClientCall::Create(_) => None,
            })
            .collect()
    }

    pub fn poll_times(&self) -> Vec<(String, tokio::time::Instant)> {
        self.state.lock().unwrap().poll_times.clone()
    }
}

#[async_trait]
impl MeasurementClient for FakeClient {
    async fn create_measurement(
        &self,
        request: &MeasurementCreate,
    ) -> Result<MeasurementCreateResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ClientCall::Create(request.clone()));
        let nth = state.calls.iter().filter(|c| matches!(c, ClientCall::Create(_))).count();

        if let Some(message) = state.create_failures.get(&nth) {
            return Err(ProbeError::Api {
                message: message.clone(),
                show_help: false,
            });
        }

        state.created += 1;
        Ok(MeasurementCreateResponse {
            id: format!("m{}", state.created),
            probes_count: request.limit,
        })
    }

    async fn get_measurement(&self, id: &str) -> Result<Measurement> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ClientCall::Get(id.to_string()));
        state
            .poll_times
            .push((id.to_string(), tokio::time::Instant::now()));

        if let Some(message) = state.poll_failures.get(id) {
            return Err(ProbeError::Api {
                message: message.clone(),
                show_help: false,
            });
        }

        let Some(queue) = state.polls.get_mut(id) else {
            return Ok(pending(id));
        };
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(next.unwrap_or_else(|| pending(id)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Once(String),
    Incremental(String, MeasurementStatus),
    Summary,
    Warning(String),
}

#[derive(Debug, Clone, Default)]
pub struct RenderLog(Arc<Mutex<Vec<RenderEvent>>>);

impl RenderLog {
    pub fn events(&self) -> Vec<RenderEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, RenderEvent::Summary))
            .count()
    }

    fn push(&self, event: RenderEvent) {
        self.0.lock().unwrap().push(event);
    }
}

/// Renderer that records calls and can fail or cancel on a given
/// incremental render (1-based).
#[derive(Default)]
pub struct FakeRenderer {
    log: RenderLog,
    incremental: usize,
    fail_at: Option<usize>,
    cancel_at: Option<(usize, CancellationToken)>,
}

impl FakeRenderer {
    pub fn new() -> (Self, RenderLog) {
        let renderer = Self::default();
        let log = renderer.log.clone();
        (renderer, log)
    }

    pub fn fail_at(mut self, nth: usize) -> Self {
        self.fail_at = Some(nth);
        self
    }

    pub fn cancel_at(mut self, nth: usize, token: CancellationToken) -> Self {
        self.cancel_at = Some((nth, token));
        self
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render_once(&mut self, id: &str, _request: &MeasurementCreate) -> Result<()> {
        self.log.push(RenderEvent::Once(id.to_string()));
        Ok(())
    }

    fn render_incremental(&mut self, measurement: &Measurement) -> Result<()> {
        self.incremental += 1;
        if self.fail_at == Some(self.incremental) {
            return Err(ProbeError::Render("error message".to_string()));
        }
        self.log.push(RenderEvent::Incremental(
            measurement.id.clone(),
            measurement.status,
        ));
        if let Some((nth, token)) = &self.cancel_at {
            if *nth == self.incremental {
                token.cancel();
            }
        }
        Ok(())
    }

    fn render_summary(&mut self) {
        self.log.push(RenderEvent::Summary);
    }

    fn render_warning(&mut self, message: &str) {
        self.log.push(RenderEvent::Warning(message.to_string()));
    }
}

/// In-memory session record.
#[derive(Default)]
pub struct MemoryStore {
    ids: Mutex<Vec<String>>,
    fail_append: bool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_ids(ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            ids: Mutex::new(ids.iter().map(|id| id.to_string()).collect()),
            fail_append: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            ids: Mutex::new(Vec::new()),
            fail_append: true,
        })
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.lock().unwrap().clone()
    }
}

impl SessionStore for MemoryStore {
    fn append_id(&self, id: &str) -> Result<()> {
        if self.fail_append {
            return Err(ProbeError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only session directory",
            )));
        }
        self.ids.lock().unwrap().push(id.to_string());
        Ok(())
    }

    fn load_ids(&self) -> Result<Vec<String>> {
        Ok(self.ids())
    }
}

pub fn engine_with_config(
    client: &Arc<FakeClient>,
    renderer: FakeRenderer,
    store: &Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
) -> SessionEngine {
    SessionEngine::new(
        config,
        client.clone(),
        Box::new(renderer),
        clock,
        store.clone(),
    )
}

pub fn engine_with_clock(
    client: &Arc<FakeClient>,
    renderer: FakeRenderer,
    store: &Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
) -> SessionEngine {
    let config = EngineConfig {
        min_interval: MIN_INTERVAL,
        ..Default::default()
    };
    engine_with_config(client, renderer, store, clock, config)
}

pub fn engine(
    client: &Arc<FakeClient>,
    renderer: FakeRenderer,
    store: &Arc<MemoryStore>,
) -> SessionEngine {
    engine_with_clock(client, renderer, store, Arc::new(MockClock::new(default_time())))
}
