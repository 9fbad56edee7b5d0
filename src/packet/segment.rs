//! 定义了发送核心读写的数据分段和确认分段。
//! Defines the data and acknowledgment segments the sending core works with.

use super::command::{Command, SegmentOption};
use bytes::Bytes;

/// Bytes a data segment adds on top of its payload: conv (2), command (1),
/// option (1), timestamp (4), number (4), sending-next (4), length (2).
///
/// 数据分段在载荷之外附加的字节数。
pub const DATA_SEGMENT_OVERHEAD: u32 = 18;

/// A data segment owned by the sending window until it is acknowledged.
///
/// 由发送窗口持有、直到被确认的数据分段。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSegment {
    /// The connection id. Filled in at send time.
    /// 连接ID，发送时填写。
    pub conv: u16,
    /// Option flags. Filled in at send time.
    /// 选项标志，发送时填写。
    pub option: SegmentOption,
    /// The time this segment was last sent.
    /// 最后一次发送的时间。
    pub timestamp: u32,
    /// The sequence number.
    /// 序列号。
    pub number: u32,
    /// The sender's first unacknowledged number, echoed to the peer.
    /// 发送方第一个未确认的序号。
    pub sending_next: u32,
    pub payload: Bytes,
    pub(crate) timeout: u32,
    pub(crate) transmit: u32,
}

impl DataSegment {
    /// Retransmission deadline.
    /// 重传截止时间。
    pub fn timeout(&self) -> u32 {
        self.timeout
    }

    /// How many times this segment has been sent.
    /// 此分段已被发送的次数。
    pub fn transmit(&self) -> u32 {
        self.transmit
    }

    /// Replaces the payload and clears the retransmission state.
    pub(crate) fn reset(&mut self, number: u32, payload: Bytes) {
        self.number = number;
        self.payload = payload;
        self.timeout = 0;
        self.transmit = 0;
    }

    /// Drops the payload buffer.
    pub(crate) fn release(&mut self) {
        self.payload = Bytes::new();
    }
}

/// An acknowledgment segment from the peer's receiving side.
///
/// 来自对端接收侧的确认分段。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AckSegment {
    pub conv: u16,
    /// The receiver's window ceiling, as an absolute sequence number.
    /// 接收方窗口上限（绝对序列号）。
    pub receiving_window: u32,
    /// Every number below this has been received.
    /// 低于此序号的所有分段均已收到。
    pub receiving_next: u32,
    /// Send timestamp of the segment that triggered this ack.
    /// 触发此确认的分段的发送时间戳。
    pub timestamp: u32,
    /// Individually acknowledged sequence numbers.
    /// 单独确认的序列号。
    pub number_list: Vec<u32>,
}

impl AckSegment {
    /// Number of selective acks carried.
    pub fn count(&self) -> usize {
        self.number_list.len()
    }
}

/// A payload-less segment carrying only a command, such as a keep-alive ping.
///
/// 仅携带指令的无载荷分段，例如保活心跳。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSegment {
    pub conv: u16,
    pub command: Command,
    pub option: SegmentOption,
    pub timestamp: u32,
}

/// Any segment leaving the sending side.
/// 离开发送侧的任意分段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Data(DataSegment),
    Command(CommandSegment),
}

impl Segment {
    /// The command byte this segment is encoded with.
    pub fn command(&self) -> Command {
        match self {
            Segment::Data(_) => Command::Data,
            Segment::Command(segment) => segment.command,
        }
    }
}
