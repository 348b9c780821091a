//! Terminal rendering of measurement results.

use async_trait::async_trait;
use probe_core::{MeasurementClient, ProbeError, Renderer, Result};
use probe_types::{
    Measurement, MeasurementCreate, MeasurementType, PingStats, ProbeDetails, ProbeMeasurement,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub json: bool,
    pub latency: bool,
    /// Delay between polls while waiting for a one-shot measurement.
    pub poll_interval: Duration,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            json: false,
            latency: false,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Ping statistics of one probe across every measurement of a run.
#[derive(Debug, Clone, Default, PartialEq)]
struct ProbeSummary {
    min: Option<f64>,
    max: Option<f64>,
    rtt_sum: f64,
    sent: u32,
    received: u32,
    dropped: u32,
}

impl ProbeSummary {
    fn add(&mut self, stats: &PingStats) {
        self.min = min_of(self.min, stats.min);
        self.max = max_of(self.max, stats.max);
        if let Some(avg) = stats.avg {
            self.rtt_sum += avg * f64::from(stats.rcv);
        }
        self.sent += stats.total;
        self.received += stats.rcv;
        self.dropped += stats.drop;
    }

    fn avg(&self) -> Option<f64> {
        (self.received > 0).then(|| self.rtt_sum / f64::from(self.received))
    }

    fn loss(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            f64::from(self.dropped) / f64::from(self.sent) * 100.0
        }
    }
}

fn min_of(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_of(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Renders to a terminal: results on `out`, warnings on `err`.
pub struct TerminalRenderer {
    client: Arc<dyn MeasurementClient>,
    options: ViewOptions,
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    target: Option<String>,
    /// Probe headers in first-seen order.
    probes: Vec<String>,
    /// Latest stats per (measurement id, probe header).
    latest: HashMap<(String, String), PingStats>,
}

impl TerminalRenderer {
    pub fn new(client: Arc<dyn MeasurementClient>, options: ViewOptions) -> Self {
        Self::with_writers(
            client,
            options,
            Box::new(std::io::stdout()),
            Box::new(std::io::stderr()),
        )
    }

    pub fn with_writers(
        client: Arc<dyn MeasurementClient>,
        options: ViewOptions,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            client,
            options,
            out,
            err,
            target: None,
            probes: Vec::new(),
            latest: HashMap::new(),
        }
    }

    fn write_json(&mut self, measurement: &Measurement, pretty: bool) -> Result<()> {
        let body = if pretty {
            serde_json::to_string_pretty(measurement)?
        } else {
            serde_json::to_string(measurement)?
        };
        writeln!(self.out, "{}", body).map_err(output_error)
    }

    fn write_results(&mut self, measurement: &Measurement, latency: bool) -> io::Result<()> {
        for result in &measurement.results {
            writeln!(self.out, "{}", probe_header(&result.probe))?;
            match (&result.result.stats, latency) {
                (Some(stats), true) => {
                    writeln!(self.out, "Min: {} ms", ms(stats.min))?;
                    writeln!(self.out, "Max: {} ms", ms(stats.max))?;
                    writeln!(self.out, "Avg: {} ms", ms(stats.avg))?;
                }
                _ => writeln!(self.out, "{}", result.result.raw_output.trim_end())?,
            }
            writeln!(self.out)?;
        }
        self.out.flush()
    }

    fn write_progress(&mut self, measurement: &Measurement) -> io::Result<()> {
        for result in &measurement.results {
            writeln!(self.out, "{}", probe_header(&result.probe))?;
            writeln!(self.out, "{}", progress_line(result))?;
        }
        self.out.flush()
    }

    fn write_summary(&mut self) -> io::Result<()> {
        if self.probes.is_empty() {
            return Ok(());
        }

        let mut totals: HashMap<&str, ProbeSummary> = HashMap::new();
        for ((_, header), stats) in &self.latest {
            totals.entry(header.as_str()).or_default().add(stats);
        }

        writeln!(self.out)?;
        writeln!(
            self.out,
            "--- {} ping statistics ---",
            self.target.as_deref().unwrap_or_default()
        )?;
        for header in &self.probes {
            let summary = totals.get(header.as_str()).cloned().unwrap_or_default();
            writeln!(self.out, "{}", header)?;
            writeln!(
                self.out,
                "{} packets transmitted, {} received, {:.1}% packet loss",
                summary.sent,
                summary.received,
                summary.loss()
            )?;
            writeln!(
                self.out,
                "rtt min/avg/max = {}/{}/{} ms",
                ms(summary.min),
                ms(summary.avg()),
                ms(summary.max)
            )?;
        }
        self.out.flush()
    }
}

/// Poll until the measurement reaches a terminal status.
async fn wait_until_finished(
    client: &dyn MeasurementClient,
    id: &str,
    poll_interval: Duration,
) -> Result<Measurement> {
    loop {
        let measurement = client.get_measurement(id).await?;
        if measurement.status.is_terminal() {
            return Ok(measurement);
        }
        debug!(
            target: "probe::client",
            "Measurement {} has {} of {} results",
            id,
            measurement.results.len(),
            measurement.probes_count
        );
        tokio::time::sleep(poll_interval).await;
    }
}

fn output_error(e: io::Error) -> ProbeError {
    ProbeError::Render(format!("failed to write output: {}", e))
}

#[async_trait]
impl Renderer for TerminalRenderer {
    async fn render_once(&mut self, id: &str, request: &MeasurementCreate) -> Result<()> {
        let client = self.client.clone();
        let measurement =
            wait_until_finished(client.as_ref(), id, self.options.poll_interval).await?;

        if self.options.json {
            return self.write_json(&measurement, true);
        }
        let latency = self.options.latency && request.kind == MeasurementType::Ping;
        self.write_results(&measurement, latency)
            .map_err(output_error)
    }

    fn render_incremental(&mut self, measurement: &Measurement) -> Result<()> {
        if self.target.is_none() {
            self.target = Some(measurement.target.clone());
        }
        for result in &measurement.results {
            let header = probe_header(&result.probe);
            if !self.probes.contains(&header) {
                self.probes.push(header.clone());
            }
            if let Some(stats) = &result.result.stats {
                self.latest
                    .insert((measurement.id.clone(), header), stats.clone());
            }
        }

        if self.options.json {
            return self.write_json(measurement, false);
        }
        self.write_progress(measurement).map_err(output_error)
    }

    fn render_summary(&mut self) {
        if self.options.json {
            return;
        }
        if let Err(e) = self.write_summary() {
            warn!(target: "probe::session", "Failed to write summary: {}", e);
        }
    }

    fn render_warning(&mut self, message: &str) {
        if let Err(e) = writeln!(self.err, "Warning: {}", message) {
            warn!(target: "probe::session", "Failed to write warning: {}", e);
        }
    }
}

/// `> city (state), country, ASN:asn, network`
pub fn probe_header(probe: &ProbeDetails) -> String {
    let location = match &probe.state {
        Some(state) => format!("{} ({})", probe.city, state),
        None => probe.city.clone(),
    };
    format!(
        "> {}, {}, ASN:{}, {}",
        location, probe.country, probe.asn, probe.network
    )
}

fn progress_line(result: &ProbeMeasurement) -> String {
    match &result.result.stats {
        Some(stats) => format!(
            "{} sent, {} received, {:.1}% loss, min/avg/max = {}/{}/{} ms",
            stats.total,
            stats.rcv,
            stats.loss,
            ms(stats.min),
            ms(stats.avg),
            ms(stats.max)
        ),
        None => result
            .result
            .raw_output
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default()
            .to_string(),
    }
}

fn ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}
