//! The `/ipfs/ping/1.0.0` liveness protocol.
//!
//! A minimal echo protocol over an already established, multiplexed stream.
//!
//! # Protocol
//!
//! - Path: `/ipfs/ping/1.0.0`
//! - No framing: every message is exactly [`PING_LENGTH`] opaque bytes
//! - The responder echoes each message back byte-for-byte
//!
//! # Flow
//!
//! 1. The [`Initiator`] writes its payload and arms a read deadline
//! 2. The [`Responder`] reads [`PING_LENGTH`] bytes and writes them back
//! 3. The initiator clears the deadline, verifies the echo, sleeps and repeats
//!
//! Transport failures and timeouts end a loop; an echo that does not match is
//! reported through the [`PingObserver`] and the loop carries on. Reconnecting
//! after a failure is left to the caller.

mod error;
mod event;
mod host;
mod initiator;
mod metrics;
mod payload;
mod responder;
mod stream;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use error::{ClientError, PingError};
pub use event::{PingEvent, PingObserver, TracingObserver};
#[cfg(any(test, feature = "test-utils"))]
pub use event::RecordingObserver;
pub use host::{StreamHandler, StreamHost, run_client, serve};
pub use initiator::{Initiator, PingConfig, Probe};
pub use self::metrics::PingMetrics;
pub use payload::Payload;
pub use responder::Responder;
pub use stream::{DeadlineStream, PingStream, read_message};

use std::time::Duration;

use libp2p::StreamProtocol;

/// Protocol name for ping.
pub const PROTOCOL_NAME: &str = "/ipfs/ping/1.0.0";

/// Protocol identifier used to route inbound streams to the [`Responder`].
pub const PROTOCOL: StreamProtocol = StreamProtocol::new(PROTOCOL_NAME);

/// Size of every ping message in bytes.
pub const PING_LENGTH: usize = 32;

/// Pause between two probes.
pub const PING_INTERVAL: Duration = Duration::from_secs(1);

/// How long the initiator waits for an echo.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);
