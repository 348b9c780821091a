//! Output side of the engine.

use crate::Result;
use async_trait::async_trait;
use probe_types::{Measurement, MeasurementCreate};

/// Renders measurement results.
///
/// The engine never calls a renderer concurrently; calls for one run arrive
/// in poll order.
#[async_trait]
pub trait Renderer: Send {
    /// Render a one-shot measurement to completion.
    async fn render_once(&mut self, id: &str, request: &MeasurementCreate) -> Result<()>;

    /// Render the latest state of a measurement in continuous mode.
    fn render_incremental(&mut self, measurement: &Measurement) -> Result<()>;

    /// Render the aggregate of a finished continuous run.
    fn render_summary(&mut self);

    /// Show a non-fatal advisory message.
    fn render_warning(&mut self, message: &str);
}
