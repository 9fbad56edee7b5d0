//! 定义协议的所有命令/分段类型。
//! Defines all commands/segment types for the protocol.

use std::fmt;

/// The type of a segment. The first byte after the connection id on the wire.
/// 分段类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Terminates the connection.
    /// 终止连接。
    Terminate = 0,
    /// Data segment.
    /// 数据分段。
    Data = 1,
    /// Acknowledgment segment with selective ack numbers.
    /// 带有选择性确认序号的确认分段。
    Ack = 2,
    /// Keep-alive and window probing segment.
    /// 用于保活和窗口探测的心跳分段。
    Ping = 3,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Command::Terminate => "TERMINATE",
            Command::Data => "DATA",
            Command::Ack => "ACK",
            Command::Ping => "PING",
        };
        write!(f, "{}", s)
    }
}

/// Option flags carried by a segment.
/// 分段携带的选项标志。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SegmentOption {
    #[default]
    None = 0,
    /// The sender is draining and will close after its buffer empties.
    /// 发送方正在排空，缓冲区清空后将关闭。
    Close = 1,
}
