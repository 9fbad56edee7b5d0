#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The sending-side core of a KCP-style ARQ protocol.
//! KCP 风格 ARQ 协议的发送核心。

pub mod config;
pub mod connection;
pub mod error;
pub mod packet;

pub mod core;

pub use crate::config::Config;
pub use crate::connection::{ChannelSink, Connection, Endpoint, SegmentSink, State};
pub use crate::core::reliability::{
    rtt::{RoundTrip, RttEstimator},
    sending_worker::SendingWorker,
};
pub use crate::core::updater::{Clock, Updater};
pub use crate::error::{Error, Result};
