//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the KCP sending core.
/// KCP 发送核心的主要错误类型。
///
/// Acknowledgment anomalies never surface here: duplicate, late or
/// out-of-range acks are silently ignored by the sending worker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A configuration value is outside of its accepted range.
    /// 配置值超出了允许范围。
    #[error("invalid config: {field} = {value} (expected {expected})")]
    InvalidConfig {
        field: &'static str,
        value: u32,
        expected: &'static str,
    },

    /// The outbound segment channel was closed by its receiver.
    /// 出站分段通道已被接收方关闭。
    #[error("Internal channel is broken")]
    ChannelClosed,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::InvalidConfig { .. } => {
                std::io::Error::new(ErrorKind::InvalidInput, err.to_string())
            }
            Error::ChannelClosed => ErrorKind::BrokenPipe.into(),
        }
    }
}
