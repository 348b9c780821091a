//! Measurement session engine: history, polling window, and the runs that
//! drive the measurement API.

mod client;
mod clock;
mod error;
mod history;
mod location;
mod render;
mod session;
mod signal;
mod store;
mod window;

pub use client::{HttpClient, HttpClientConfig, MeasurementClient, DEFAULT_API_URL};
pub use clock::{elapsed_between, AdvancingClock, Clock, MockClock, SystemClock};
pub use error::ProbeError;
pub use history::{
    HistoryBuffer, HistoryHandle, HistoryItem, HistoryRef, DEFAULT_HISTORY_CAPACITY,
};
pub use location::{parse_from, LocationSelector, DEFAULT_LOCATION};
pub use render::Renderer;
pub use session::{
    EngineConfig, RunRequest, RunState, SessionEngine, CONTINUOUS_PROBE_LIMIT,
};
pub use signal::spawn_signal_listener;
pub use store::{FileSessionStore, SessionStore};
pub use window::{PollingWindow, DEFAULT_WINDOW_CAPACITY};

/// Result type for probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;
