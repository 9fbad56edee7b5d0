//! 定义了发送核心所依赖的连接接口。
//! Defines the connection interface the sending core depends on.
//!
//! The handshake and teardown state machine lives outside this crate; the
//! sending worker only needs to read the connection's identity, configuration
//! and lifecycle state, reach its RTT estimator, and hand segments to its
//! outbound queue.

use crate::{
    config::Config,
    core::reliability::rtt::{RoundTrip, RttEstimator},
    error::{Error, Result},
    packet::{
        command::{Command, SegmentOption},
        segment::{CommandSegment, DataSegment, Segment},
    },
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// The state of a connection.
/// 连接的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// The connection is open in both directions.
    /// 连接在两个方向上均处于打开状态。
    #[default]
    Active,
    /// The local side asked to close and is draining its sending buffer.
    /// 本地请求关闭，正在排空发送缓冲区。
    ReadyToClose,
    /// The peer asked to close.
    /// 对端请求关闭。
    PeerClosed,
    /// Both sides are closing.
    /// 双方都在关闭。
    Terminating,
    /// The peer is terminating.
    /// 对端正在终止。
    PeerTerminating,
    /// The connection is gone.
    /// 连接已终止。
    Terminated,
}

/// What the sending worker needs from its owning connection.
///
/// 发送工作者对其所属连接的需求。
pub trait Connection: Send + Sync {
    /// The connection id stamped on every outgoing segment.
    fn conv(&self) -> u16;

    fn config(&self) -> &Config;

    fn state(&self) -> State;

    fn round_trip(&self) -> &dyn RoundTrip;

    /// Maximum payload per data segment.
    /// 每个数据分段的最大载荷。
    fn mss(&self) -> u32 {
        self.config().mss()
    }

    /// Sends a payload-less probe. Must not block.
    /// 发送一个无载荷的探测分段。不得阻塞。
    fn ping(&self, current: u32, command: Command);

    /// Queues a data segment for transmission. Must not block.
    /// 将数据分段排入发送队列。不得阻塞。
    fn output(&self, segment: DataSegment);
}

/// Where outgoing segments end up.
///
/// 出站分段的去处。
pub trait SegmentSink: Send + Sync {
    fn send(&self, segment: Segment) -> Result<()>;
}

/// A [`SegmentSink`] backed by an unbounded tokio channel, so sending never
/// blocks the caller.
///
/// 基于无界 tokio 通道的 [`SegmentSink`]，发送永不阻塞调用方。
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Segment>,
}

impl ChannelSink {
    /// Creates a sink and the receiver the transport drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Segment>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SegmentSink for ChannelSink {
    fn send(&self, segment: Segment) -> Result<()> {
        self.tx.send(segment).map_err(|_| Error::ChannelClosed)
    }
}

/// A connection endpoint that owns its configuration, RTT estimator and
/// outbound sink, with the lifecycle state driven from outside.
///
/// 连接端点，持有配置、RTT 估算器和出站通道，生命周期状态由外部驱动。
#[derive(Debug)]
pub struct Endpoint<S: SegmentSink> {
    conv: u16,
    config: Config,
    state: Mutex<State>,
    round_trip: RttEstimator,
    sink: S,
}

impl<S: SegmentSink> Endpoint<S> {
    /// Creates an endpoint after checking `config`.
    ///
    /// 检查 `config` 后创建端点。
    pub fn new(conv: u16, config: Config, sink: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            conv,
            round_trip: RttEstimator::new(config.tti),
            config,
            state: Mutex::new(State::Active),
            sink,
        })
    }

    pub fn set_state(&self, state: State) {
        let mut current = self.state.lock();
        if *current != state {
            debug!(conv = self.conv, from = ?*current, to = ?state, "Connection state changed");
            *current = state;
        }
    }

    /// The concrete RTT estimator.
    pub fn rtt(&self) -> &RttEstimator {
        &self.round_trip
    }

    fn deliver(&self, segment: Segment) {
        let command = segment.command();
        if let Err(e) = self.sink.send(segment) {
            warn!(conv = self.conv, %command, error = %e, "Dropping outbound segment");
        }
    }
}

impl<S: SegmentSink> Connection for Endpoint<S> {
    fn conv(&self) -> u16 {
        self.conv
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn state(&self) -> State {
        *self.state.lock()
    }

    fn round_trip(&self) -> &dyn RoundTrip {
        &self.round_trip
    }

    fn ping(&self, current: u32, command: Command) {
        let option = if self.state() == State::ReadyToClose {
            SegmentOption::Close
        } else {
            SegmentOption::None
        };
        self.deliver(Segment::Command(CommandSegment {
            conv: self.conv,
            command,
            option,
            timestamp: current,
        }));
    }

    fn output(&self, segment: DataSegment) {
        self.deliver(Segment::Data(segment));
    }
}
