//! Command-line interface.

use crate::logging::LogFormat;
use clap::{Args, Parser, Subcommand};
use probe_core::{ProbeError, RunRequest};
use probe_types::{DnsQuery, MeasurementOptions, MeasurementType};
use std::path::PathBuf;

/// Run ping, traceroute, dns and mtr measurements from probes around the world.
#[derive(Parser, Debug)]
#[command(name = "probe")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every measurement command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// A continent, region, country, US state, city, ASN, network or measurement id [default: world]
    #[arg(short = 'F', long, global = true)]
    pub from: Option<String>,

    /// Number of probes to use
    #[arg(short = 'L', long, default_value_t = 1, global = true)]
    pub limit: u32,

    /// Output results as JSON
    #[arg(short = 'J', long, global = true)]
    pub json: bool,

    /// Disable in-progress updates for scripted environments
    #[arg(long, global = true)]
    pub ci: bool,

    /// Output only latency stats
    #[arg(long, global = true)]
    pub latency: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Enable trace logging
    #[arg(long, global = true)]
    pub trace: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Set log level for specific targets (e.g., "client=debug"). Targets are
    /// prefixed with "probe::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL", global = true)]
    pub overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text", global = true)]
    pub format: LogFormat,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Send ICMP echo requests to a target
    Ping(PingArgs),
    /// Trace the route to a target
    Traceroute(TracerouteArgs),
    /// Resolve a DNS record
    Dns(DnsArgs),
    /// Combined traceroute and ping statistics per hop
    Mtr(MtrArgs),
}

/// `TARGET [from LOCATION...]`
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(
        required = true,
        num_args = 1..,
        value_name = "TARGET [from LOCATION...]"
    )]
    pub words: Vec<String>,
}

impl TargetArgs {
    /// Split into the target and the raw `from` clause. The positional clause
    /// wins over `--from`.
    pub fn split(&self, from_flag: Option<&str>) -> Result<(String, String), ProbeError> {
        let Some((target, rest)) = self.words.split_first() else {
            return Err(invalid_format());
        };
        match rest.split_first() {
            None => Ok((target.clone(), from_flag.unwrap_or_default().trim().to_string())),
            Some((keyword, locations)) if keyword == "from" => {
                Ok((target.clone(), locations.join(" ").trim().to_string()))
            }
            Some(_) => Err(invalid_format()),
        }
    }
}

fn invalid_format() -> ProbeError {
    ProbeError::InvalidCommand("invalid command format".to_string())
}

#[derive(Args, Debug, Clone)]
pub struct PingArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Number of echo requests to send [default: 3]
    #[arg(long)]
    pub packets: Option<u16>,

    /// Keep pinging until interrupted
    #[arg(long)]
    pub infinite: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TracerouteArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// ICMP, TCP or UDP
    #[arg(long)]
    pub protocol: Option<String>,

    /// Destination port for TCP
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug, Clone)]
pub struct DnsArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Record type (A, AAAA, MX, TXT, ...)
    #[arg(long = "type")]
    pub query_type: Option<String>,

    /// Resolver to query instead of the probe's default
    #[arg(long)]
    pub resolver: Option<String>,

    /// UDP or TCP
    #[arg(long)]
    pub protocol: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Trace delegation from the root servers
    #[arg(long)]
    pub trace: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MtrArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// ICMP, TCP or UDP
    #[arg(long)]
    pub protocol: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Packets sent to each hop
    #[arg(long)]
    pub packets: Option<u16>,
}

/// Packets per measurement in continuous ping.
pub const CONTINUOUS_PING_PACKETS: u16 = 16;

impl Command {
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn kind(&self) -> MeasurementType {
        match self {
            Command::Ping(_) => MeasurementType::Ping,
            Command::Traceroute(_) => MeasurementType::Traceroute,
            Command::Dns(_) => MeasurementType::Dns,
            Command::Mtr(_) => MeasurementType::Mtr,
        }
    }

    /// Build the engine request for this command.
    pub fn to_request(&self, global: &GlobalArgs) -> Result<RunRequest, ProbeError> {
        let (target_args, options, continuous) = match self {
            Command::Ping(args) => {
                let packets = if args.infinite {
                    Some(CONTINUOUS_PING_PACKETS)
                } else {
                    args.packets
                };
                let options = MeasurementOptions {
                    packets,
                    ..Default::default()
                };
                (&args.target, options, args.infinite)
            }
            Command::Traceroute(args) => {
                let options = MeasurementOptions {
                    protocol: args.protocol.clone(),
                    port: args.port,
                    ..Default::default()
                };
                (&args.target, options, false)
            }
            Command::Dns(args) => {
                let options = MeasurementOptions {
                    query: args.query_type.clone().map(|record_type| DnsQuery { record_type }),
                    resolver: args.resolver.clone(),
                    protocol: args.protocol.clone(),
                    port: args.port,
                    trace: args.trace.then_some(true),
                    ..Default::default()
                };
                (&args.target, options, false)
            }
            Command::Mtr(args) => {
                let options = MeasurementOptions {
                    protocol: args.protocol.clone(),
                    port: args.port,
                    packets: args.packets,
                    ..Default::default()
                };
                (&args.target, options, false)
            }
        };

        let (target, from) = target_args.split(global.from.as_deref())?;
        Ok(RunRequest {
            kind: self.kind(),
            target,
            from,
            limit: global.limit,
            in_progress_updates: !global.ci,
            options,
            continuous,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(words: &[&str]) -> TargetArgs {
        TargetArgs {
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    #[test]
    fn test_split_without_from() {
        assert_eq!(
            words(&["jsdelivr.com"]).split(None).unwrap(),
            ("jsdelivr.com".to_string(), String::new())
        );
        assert_eq!(
            words(&["jsdelivr.com"]).split(Some(" Berlin ")).unwrap(),
            ("jsdelivr.com".to_string(), "Berlin".to_string())
        );
    }

    #[test]
    fn test_split_joins_location_words() {
        assert_eq!(
            words(&["jsdelivr.com", "from", "New", "York"])
                .split(Some("Berlin"))
                .unwrap(),
            ("jsdelivr.com".to_string(), "New York".to_string())
        );
    }

    #[test]
    fn test_split_rejects_other_keyword() {
        let err = words(&["jsdelivr.com", "to", "Berlin"]).split(None).unwrap_err();
        assert_eq!(err.to_string(), "invalid command format");
        assert!(err.shows_help());
    }
}
