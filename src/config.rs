//! Runtime configuration.
//!
//! Each role has its own section. Every field has a default matching the
//! deployed system, so an empty file (or no file at all) yields a working
//! loopback setup:
//!
//! ```toml
//! [producer]
//! data_peer = "127.0.0.1:5555"
//! send_rate_hz = 10.0
//!
//! [consumer]
//! max_frame_lag = 5
//! shutdown_policy = "flush"
//! ```

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fragment::{DEFAULT_MAX_FRAME_LAG, DEFAULT_MAX_ROWS_PER_CHUNK, FragmentationConfig};

/// Deliveries queued for a slow application before receivers start dropping.
pub const DEFAULT_DELIVERY_CAPACITY: usize = 256;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value parsed but is out of range.
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// What a consumer does with partially collected frames when it stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Finalize and deliver them as partial frames.
    #[default]
    Flush,
    /// Drop them silently.
    Discard,
}

/// Settings for the chunked frame producer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Where chunk datagrams are sent.
    pub data_peer: SocketAddr,
    /// Local address of the data socket.
    pub data_bind: SocketAddr,
    /// Local address on which acknowledgements arrive.
    pub feedback_bind: SocketAddr,
    /// Frames emitted per second.
    pub send_rate_hz: f64,
    /// Point rows per chunk.
    pub max_rows_per_chunk: usize,
    /// Emit zero-row frames as a single empty chunk instead of rejecting them.
    pub allow_empty_frames: bool,
    /// Age after which an unacknowledged frame is written off.
    pub ack_timeout_ms: u64,
    /// How long shutdown waits for the ack listener to stop.
    pub join_timeout_ms: u64,
    /// Interval between statistics log lines.
    pub stats_interval_ms: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            data_peer: SocketAddr::from((Ipv4Addr::LOCALHOST, 5555)),
            data_bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            feedback_bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 5556)),
            send_rate_hz: 10.0,
            max_rows_per_chunk: DEFAULT_MAX_ROWS_PER_CHUNK.get(),
            allow_empty_frames: false,
            ack_timeout_ms: 5_000,
            join_timeout_ms: 1_000,
            stats_interval_ms: 5_000,
        }
    }
}

impl ProducerConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_rate("producer.send_rate_hz", self.send_rate_hz)?;
        non_zero("producer.max_rows_per_chunk", self.max_rows_per_chunk)?;
        non_zero_ms("producer.ack_timeout_ms", self.ack_timeout_ms)?;
        non_zero_ms("producer.stats_interval_ms", self.stats_interval_ms)
    }

    /// Fragmentation settings derived from this section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `max_rows_per_chunk` is zero.
    pub fn fragmentation(&self) -> Result<FragmentationConfig, ConfigError> {
        Ok(FragmentationConfig {
            max_rows_per_chunk: non_zero("producer.max_rows_per_chunk", self.max_rows_per_chunk)?,
            allow_empty_frames: self.allow_empty_frames,
        })
    }

    #[must_use]
    pub const fn ack_timeout(&self) -> Duration { Duration::from_millis(self.ack_timeout_ms) }

    #[must_use]
    pub const fn join_timeout(&self) -> Duration { Duration::from_millis(self.join_timeout_ms) }

    #[must_use]
    pub const fn stats_interval(&self) -> Duration { Duration::from_millis(self.stats_interval_ms) }
}

/// Settings for the chunked frame consumer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Local address on which chunks arrive.
    pub data_bind: SocketAddr,
    /// IPv4 multicast group to join on the data socket.
    pub multicast_group: Option<Ipv4Addr>,
    /// Interface used for the multicast join.
    pub multicast_interface: Ipv4Addr,
    /// Where acknowledgements are sent.
    pub feedback_peer: SocketAddr,
    /// Maximum number of partial frames buffered at once.
    pub max_frame_lag: usize,
    /// Finalized frames queued for the application before new ones are
    /// dropped.
    pub delivery_capacity: usize,
    pub shutdown_policy: ShutdownPolicy,
    /// Interval between statistics log lines.
    pub stats_interval_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            data_bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 5555)),
            multicast_group: None,
            multicast_interface: Ipv4Addr::UNSPECIFIED,
            feedback_peer: SocketAddr::from((Ipv4Addr::LOCALHOST, 5556)),
            max_frame_lag: DEFAULT_MAX_FRAME_LAG.get(),
            delivery_capacity: DEFAULT_DELIVERY_CAPACITY,
            shutdown_policy: ShutdownPolicy::default(),
            stats_interval_ms: 5_000,
        }
    }
}

impl ConsumerConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_zero("consumer.max_frame_lag", self.max_frame_lag)?;
        non_zero("consumer.delivery_capacity", self.delivery_capacity)?;
        validate_group("consumer.multicast_group", self.multicast_group)?;
        non_zero_ms("consumer.stats_interval_ms", self.stats_interval_ms)
    }

    /// Lag bound for the reassembler.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `max_frame_lag` is zero.
    pub fn max_frame_lag(&self) -> Result<NonZeroUsize, ConfigError> {
        non_zero("consumer.max_frame_lag", self.max_frame_lag)
    }

    #[must_use]
    pub const fn stats_interval(&self) -> Duration { Duration::from_millis(self.stats_interval_ms) }
}

/// Settings for the single-packet stream sender.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSenderConfig {
    /// Where stream packets are sent. May be a multicast group.
    pub data_peer: SocketAddr,
    /// Local address of the data socket.
    pub data_bind: SocketAddr,
    /// Local address on which feedback reports arrive.
    pub feedback_bind: SocketAddr,
    /// Packets emitted per second.
    pub send_rate_hz: f64,
    /// Label stamped on every packet.
    pub name: String,
    /// How long shutdown waits for the report listener to stop.
    pub join_timeout_ms: u64,
    /// Interval between statistics log lines.
    pub stats_interval_ms: u64,
}

impl Default for StreamSenderConfig {
    fn default() -> Self {
        Self {
            data_peer: SocketAddr::from((Ipv4Addr::LOCALHOST, 5004)),
            data_bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            feedback_bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 5005)),
            send_rate_hz: 10.0,
            name: "synthetic.bin".to_owned(),
            join_timeout_ms: 1_000,
            stats_interval_ms: 5_000,
        }
    }
}

impl StreamSenderConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_rate("stream_sender.send_rate_hz", self.send_rate_hz)?;
        non_zero_ms("stream_sender.stats_interval_ms", self.stats_interval_ms)
    }

    #[must_use]
    pub const fn join_timeout(&self) -> Duration { Duration::from_millis(self.join_timeout_ms) }

    #[must_use]
    pub const fn stats_interval(&self) -> Duration { Duration::from_millis(self.stats_interval_ms) }
}

/// Settings for the single-packet stream receiver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamReceiverConfig {
    /// Local address on which stream packets arrive.
    pub data_bind: SocketAddr,
    /// IPv4 multicast group to join on the data socket.
    pub multicast_group: Option<Ipv4Addr>,
    /// Interface used for the multicast join.
    pub multicast_interface: Ipv4Addr,
    /// Where feedback reports are sent.
    pub feedback_peer: SocketAddr,
    /// Packets queued for the application before new ones are dropped.
    pub delivery_capacity: usize,
    /// Interval between statistics log lines.
    pub stats_interval_ms: u64,
}

impl Default for StreamReceiverConfig {
    fn default() -> Self {
        Self {
            data_bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 5004)),
            multicast_group: None,
            multicast_interface: Ipv4Addr::UNSPECIFIED,
            feedback_peer: SocketAddr::from((Ipv4Addr::LOCALHOST, 5005)),
            delivery_capacity: DEFAULT_DELIVERY_CAPACITY,
            stats_interval_ms: 5_000,
        }
    }
}

impl StreamReceiverConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_group("stream_receiver.multicast_group", self.multicast_group)?;
        non_zero("stream_receiver.delivery_capacity", self.delivery_capacity)?;
        non_zero_ms("stream_receiver.stats_interval_ms", self.stats_interval_ms)
    }

    #[must_use]
    pub const fn stats_interval(&self) -> Duration { Duration::from_millis(self.stats_interval_ms) }
}

/// All configuration sections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub producer: ProducerConfig,
    pub consumer: ConsumerConfig,
    pub stream_sender: StreamSenderConfig,
    pub stream_receiver: StreamReceiverConfig,
}

impl Config {
    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown value
    /// types and [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`Config::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.producer.validate()?;
        self.consumer.validate()?;
        self.stream_sender.validate()?;
        self.stream_receiver.validate()
    }
}

fn non_zero(field: &'static str, value: usize) -> Result<NonZeroUsize, ConfigError> {
    NonZeroUsize::new(value).ok_or(ConfigError::Invalid {
        field,
        reason: "must be greater than zero",
    })
}

fn non_zero_ms(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field,
            reason: "must be greater than zero",
        });
    }
    Ok(())
}

fn validate_rate(field: &'static str, rate_hz: f64) -> Result<(), ConfigError> {
    if rate_hz.is_finite() && rate_hz > 0.0 {
        return Ok(());
    }
    Err(ConfigError::Invalid {
        field,
        reason: "must be a positive, finite rate",
    })
}

fn validate_group(field: &'static str, group: Option<Ipv4Addr>) -> Result<(), ConfigError> {
    match group {
        Some(group) if !group.is_multicast() => Err(ConfigError::Invalid {
            field,
            reason: "not an IPv4 multicast address",
        }),
        _ => Ok(()),
    }
}
