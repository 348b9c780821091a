//! Session engine driving one-shot and continuous measurement runs.

use crate::clock::elapsed_between;
use crate::location::{parse_from, LocationSelector};
use crate::{
    Clock, HistoryBuffer, HistoryHandle, HistoryItem, MeasurementClient, PollingWindow,
    ProbeError, Renderer, Result, SessionStore, DEFAULT_HISTORY_CAPACITY,
    DEFAULT_WINDOW_CAPACITY,
};
use probe_types::{Location, MeasurementCreate, MeasurementOptions, MeasurementType};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Highest probe limit accepted in continuous mode.
pub const CONTINUOUS_PROBE_LIMIT: u32 = 5;

/// Configuration for the session engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub history_capacity: usize,
    /// Overlapping measurements allowed in continuous mode.
    pub window_capacity: usize,
    /// Minimum time between continuous-mode rounds.
    pub min_interval: Duration,
    pub continuous_probe_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            min_interval: Duration::from_millis(500),
            continuous_probe_limit: CONTINUOUS_PROBE_LIMIT,
        }
    }
}

/// A measurement command as entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub kind: MeasurementType,
    pub target: String,
    /// Raw `from` clause; empty means the default location.
    pub from: String,
    pub limit: u32,
    pub in_progress_updates: bool,
    pub options: MeasurementOptions,
    /// Keep measuring until interrupted.
    pub continuous: bool,
}

impl RunRequest {
    fn to_create(&self, locations: Vec<Location>) -> MeasurementCreate {
        MeasurementCreate {
            kind: self.kind,
            target: self.target.clone(),
            locations,
            limit: self.limit,
            in_progress_updates: self.in_progress_updates,
            options: self.options.clone(),
        }
    }
}

/// Lifecycle of a continuous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Cancelling,
    Stopped,
}

/// Orchestrates measurement runs for one session.
pub struct SessionEngine {
    config: EngineConfig,
    client: Arc<dyn MeasurementClient>,
    renderer: Box<dyn Renderer>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn SessionStore>,
    history: HistoryBuffer,
    history_loaded: bool,
    state: RunState,
}

impl SessionEngine {
    pub fn new(
        config: EngineConfig,
        client: Arc<dyn MeasurementClient>,
        renderer: Box<dyn Renderer>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let history = HistoryBuffer::new(config.history_capacity);
        Self {
            config,
            client,
            renderer,
            clock,
            store,
            history,
            history_loaded: false,
            state: RunState::Idle,
        }
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run a command in the mode it asks for.
    pub async fn run(&mut self, request: &RunRequest, cancel: &CancellationToken) -> Result<()> {
        if request.continuous {
            self.run_continuous(request, cancel).await
        } else {
            self.run_once(request).await
        }
    }

    /// Create one measurement and render it.
    pub async fn run_once(&mut self, request: &RunRequest) -> Result<()> {
        self.load_history();
        let locations = self.resolve_locations(&request.from)?;
        let create = request.to_create(locations);

        let handle = self.create_measurement(&create, true).await?;
        self.renderer.render_once(&handle.id(), &create).await
    }

    /// Keep creating overlapping measurements until `cancel` fires.
    ///
    /// A summary is rendered only when the run ends without an error.
    pub async fn run_continuous(
        &mut self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if request.limit > self.config.continuous_probe_limit {
            return Err(ProbeError::ContinuousLimitExceeded(
                self.config.continuous_probe_limit,
            ));
        }

        self.load_history();
        let locations = self.resolve_locations(&request.from)?;
        let mut create = request.to_create(locations);

        self.state = RunState::Running;
        info!(target: "probe::session", "Continuous {} of {} started", request.kind, request.target);

        let result = self.poll_rounds(&mut create, cancel).await;
        match &result {
            Ok(()) => self.renderer.render_summary(),
            Err(e) => debug!(target: "probe::session", "Continuous run failed: {}", e),
        }

        self.state = RunState::Stopped;
        info!(
            target: "probe::session",
            "Continuous run stopped after {} measurements",
            self.history.created_count()
        );
        result
    }

    async fn poll_rounds(
        &mut self,
        create: &mut MeasurementCreate,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut window = PollingWindow::new(self.config.window_capacity);
        let initial_locations = create.locations.clone();
        let run_start = self.history.created_count();
        let mut deferred: Option<ProbeError> = None;
        let mut persist = true;

        loop {
            if cancel.is_cancelled() {
                self.state = RunState::Cancelling;
                return match deferred.take() {
                    Some(e) => Err(e),
                    None => Ok(()),
                };
            }

            window.restart();
            let mut elapsed = Duration::ZERO;

            while let Some(item) = window.next() {
                let measurement = self.client.get_measurement(&item.id()).await?;
                if measurement.results.is_empty() {
                    continue;
                }

                item.update(|i| i.apply(&measurement));
                self.renderer.render_incremental(&measurement)?;

                if measurement.status.is_terminal() {
                    debug!(target: "probe::session", "Measurement {} finished", measurement.id);
                    window.remove(&item);
                } else {
                    let partial = measurement.is_partially_finished();
                    item.update(|i| i.partially_finished = partial);
                }

                if deferred.is_none() && !cancel.is_cancelled() && window.can_append() {
                    if let Some(last) = self.history.last() {
                        create.locations = vec![Location::magic(last.id())];
                    }
                    let start = self.clock.now();
                    match self.create_measurement(create, persist).await {
                        Ok(handle) => {
                            persist = false;
                            window.append(handle);
                        }
                        Err(e) => {
                            warn!(target: "probe::session", "Creating overlapping measurement failed: {}", e);
                            deferred = Some(e);
                        }
                    }
                    elapsed += elapsed_between(start, self.clock.now());
                }
            }

            if !window.is_empty() {
                let wait = self.config.min_interval.saturating_sub(elapsed);
                if !wait.is_zero() {
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {}
                        _ = cancel.cancelled() => {}
                    }
                }
                continue;
            }

            if let Some(e) = deferred.take() {
                return Err(e);
            }
            if cancel.is_cancelled() {
                continue;
            }

            create.locations = match self.history.last() {
                Some(last) if self.history.created_count() > run_start => {
                    vec![Location::magic(last.id())]
                }
                _ => initial_locations.clone(),
            };
            let handle = self.create_measurement(create, persist).await?;
            persist = false;
            window.append(handle);
        }
    }

    /// Bootstrap the in-memory history from the session record once per engine.
    fn load_history(&mut self) {
        if self.history_loaded {
            return;
        }
        self.history_loaded = true;

        match self.store.load_ids() {
            Ok(ids) if !ids.is_empty() => {
                debug!(target: "probe::history", "Restored {} measurements from session", ids.len());
                self.history =
                    HistoryBuffer::restore(self.config.history_capacity, ids, self.clock.now());
            }
            Ok(_) => {}
            Err(e) => {
                warn!(target: "probe::history", "Failed to read session history: {}", e);
                self.renderer.render_warning(&e.to_string());
            }
        }
    }

    fn resolve_locations(&self, from: &str) -> Result<Vec<Location>> {
        match parse_from(from)? {
            LocationSelector::History(reference) => {
                let item = self.history.resolve_ref(reference)?;
                debug!(target: "probe::history", "Resolved {:?} to measurement {}", reference, item.id());
                Ok(vec![Location::magic(item.id())])
            }
            LocationSelector::Magic(selectors) => {
                Ok(selectors.into_iter().map(Location::magic).collect())
            }
        }
    }

    async fn create_measurement(
        &mut self,
        create: &MeasurementCreate,
        persist: bool,
    ) -> Result<HistoryHandle> {
        let created = self.client.create_measurement(create).await?;
        let handle = self
            .history
            .push(HistoryItem::new(created.id.clone(), self.clock.now()));

        if persist {
            if let Err(e) = self.store.append_id(&created.id) {
                warn!(target: "probe::store", "Failed to save measurement {} to session: {}", created.id, e);
                self.renderer.render_warning(&e.to_string());
            }
        }

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.window_capacity, 2);
        assert_eq!(config.min_interval, Duration::from_millis(500));
        assert_eq!(config.continuous_probe_limit, 5);
    }

    #[test]
    fn test_request_to_create() {
        let request = RunRequest {
            kind: MeasurementType::Ping,
            target: "jsdelivr.com".to_string(),
            from: String::new(),
            limit: 2,
            in_progress_updates: true,
            options: MeasurementOptions {
                packets: Some(16),
                ..Default::default()
            },
            continuous: true,
        };

        let create = request.to_create(vec![Location::magic("world")]);
        assert_eq!(create.kind, MeasurementType::Ping);
        assert_eq!(create.limit, 2);
        assert_eq!(create.options.packets, Some(16));
        assert_eq!(create.locations, vec![Location::magic("world")]);
    }
}
