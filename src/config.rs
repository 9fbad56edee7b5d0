//! 定义了连接的可配置参数。
//! Defines configurable parameters for a connection's sending side.

use crate::error::{Error, Result};
use crate::packet::segment::DATA_SEGMENT_OVERHEAD;
use std::time::Duration;

/// A structure containing all configurable parameters for a connection.
///
/// 包含所有连接可配置参数的结构体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum transmission unit of a single datagram, in bytes.
    /// 单个数据报的最大传输单元（字节）。
    pub mtu: u32,
    /// Transmission time interval in milliseconds. The flush tick runs at this
    /// period, and it is the floor of the smoothed RTT.
    /// 传输时间间隔（毫秒）。
    pub tti: u32,
    /// Uplink capacity in MB/s. Bounds how many segments may be in flight.
    /// 上行容量（MB/s）。
    pub uplink_capacity: u32,
    /// Enables the loss-based congestion window.
    /// 是否启用基于丢包的拥塞窗口。
    pub congestion: bool,
    /// Size of the sending buffer in bytes.
    /// 发送缓冲区大小（字节）。
    pub write_buffer: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mtu: 1350,
            tti: 50,
            uplink_capacity: 5,
            congestion: false,
            write_buffer: 2 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Checks that every field is within the range the protocol supports.
    ///
    /// 检查每个字段是否处于协议支持的范围内。
    pub fn validate(&self) -> Result<()> {
        if !(576..=1460).contains(&self.mtu) {
            return Err(Error::InvalidConfig {
                field: "mtu",
                value: self.mtu,
                expected: "576..=1460",
            });
        }
        if !(10..=100).contains(&self.tti) {
            return Err(Error::InvalidConfig {
                field: "tti",
                value: self.tti,
                expected: "10..=100",
            });
        }
        if self.uplink_capacity == 0 {
            return Err(Error::InvalidConfig {
                field: "uplink_capacity",
                value: 0,
                expected: "> 0",
            });
        }
        if self.write_buffer < self.mtu {
            return Err(Error::InvalidConfig {
                field: "write_buffer",
                value: self.write_buffer,
                expected: ">= mtu",
            });
        }
        Ok(())
    }

    /// Maximum payload carried by one data segment.
    /// 单个数据分段可携带的最大载荷。
    pub fn mss(&self) -> u32 {
        self.mtu.saturating_sub(DATA_SEGMENT_OVERHEAD)
    }

    /// The flush period as a `Duration`.
    pub fn tti_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.tti))
    }

    /// Number of segments allowed in flight per flush, derived from the uplink
    /// capacity. Never below 8.
    ///
    /// 每次刷新允许的在途分段数，由上行容量推导，最小为 8。
    pub fn sending_in_flight_size(&self) -> u32 {
        let per_second = u64::from(self.uplink_capacity) * 1024 * 1024 / u64::from(self.mtu.max(1));
        let ticks_per_second = u64::from((1000 / self.tti.max(1)).max(1));
        let size = (per_second / ticks_per_second).min(u64::from(u32::MAX)) as u32;
        size.max(8)
    }

    /// Capacity of the sending ring, in segments.
    /// 发送环的容量（以分段为单位）。
    pub fn sending_buffer_size(&self) -> u32 {
        (self.write_buffer / self.mtu.max(1)).max(1)
    }
}
