//! Command line interface for the `framecast` binary.
//!
//! Every flag overrides the matching field of the configuration file, which
//! in turn overrides the built-in defaults.

use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command line arguments for the `framecast` binary.
#[derive(Debug, Parser)]
#[command(
    name = "framecast",
    version,
    about = "Stream sensor frames over UDP with chunk reassembly and RTT feedback"
)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Serve Prometheus metrics on this address.
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send synthetic point cloud frames in chunks and measure per-frame RTT.
    Send(SendArgs),
    /// Reassemble chunked frames and acknowledge them.
    Receive(ReceiveArgs),
    /// Send synthetic frames as single packets and track aggregate feedback.
    StreamSend(StreamSendArgs),
    /// Receive single-packet frames and report loss back to the sender.
    StreamReceive(StreamReceiveArgs),
}

/// Options shared by both senders.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Frames per second.
    #[arg(long)]
    pub rate: Option<f64>,

    /// Stop after this many frames instead of running until interrupted.
    #[arg(long)]
    pub frames: Option<usize>,

    /// Points per synthetic frame.
    #[arg(long, default_value_t = 2_000)]
    pub points: usize,

    /// Omit the intensity column.
    #[arg(long)]
    pub xyz_only: bool,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Consumer address for chunk datagrams.
    #[arg(long)]
    pub peer: Option<SocketAddr>,

    /// Local address on which acknowledgements arrive.
    #[arg(long)]
    pub feedback_bind: Option<SocketAddr>,

    /// Point rows per chunk.
    #[arg(long)]
    pub rows_per_chunk: Option<usize>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct ReceiveArgs {
    /// Local address on which chunks arrive.
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// IPv4 multicast group to join.
    #[arg(long)]
    pub group: Option<Ipv4Addr>,

    /// Producer address for acknowledgements.
    #[arg(long)]
    pub feedback: Option<SocketAddr>,

    /// Maximum number of partial frames buffered at once.
    #[arg(long)]
    pub max_lag: Option<usize>,

    /// What to do with partial frames on shutdown.
    #[arg(long, value_enum)]
    pub on_shutdown: Option<ShutdownArg>,
}

#[derive(Debug, Args)]
pub struct StreamSendArgs {
    /// Receiver (or multicast group) address for stream packets.
    #[arg(long)]
    pub peer: Option<SocketAddr>,

    /// Local address on which feedback reports arrive.
    #[arg(long)]
    pub feedback_bind: Option<SocketAddr>,

    /// Label stamped on every packet.
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct StreamReceiveArgs {
    /// Local address on which stream packets arrive.
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// IPv4 multicast group to join.
    #[arg(long)]
    pub group: Option<Ipv4Addr>,

    /// Sender address for feedback reports.
    #[arg(long)]
    pub feedback: Option<SocketAddr>,
}

/// Shutdown handling for partially received frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ShutdownArg {
    /// Deliver them as partial frames.
    Flush,
    /// Drop them.
    Discard,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parses_send_overrides() {
        let cli = Cli::parse_from([
            "framecast",
            "-v",
            "send",
            "--peer",
            "10.0.0.2:5555",
            "--rate",
            "20",
            "--frames",
            "50",
        ]);
        assert!(cli.verbose);
        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.peer, Some("10.0.0.2:5555".parse().expect("addr")));
        assert_eq!(args.source.rate, Some(20.0));
        assert_eq!(args.source.frames, Some(50));
        assert_eq!(args.source.points, 2_000);
    }

    #[test]
    fn parses_receive_policy_and_global_config() {
        let cli = Cli::parse_from([
            "framecast",
            "receive",
            "--on-shutdown",
            "discard",
            "--group",
            "239.1.1.1",
            "--config",
            "framecast.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("framecast.toml")));
        let Command::Receive(args) = cli.command else {
            panic!("expected receive");
        };
        assert_eq!(args.on_shutdown, Some(ShutdownArg::Discard));
        assert_eq!(args.group, Some(Ipv4Addr::new(239, 1, 1, 1)));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["framecast", "broadcast"]).is_err());
    }
}
