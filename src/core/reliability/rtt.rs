//! An estimator for the round-trip time (RTT).
//! RTT 估算器。

use parking_lot::Mutex;

/// Upper bound for the computed retransmission timeout, in milliseconds.
const MAX_RTO: u32 = 10000;

/// The round-trip estimator interface the sending worker relies on.
///
/// 发送工作者所依赖的往返时间估算器接口。
pub trait RoundTrip: Send + Sync {
    /// Feeds a round-trip sample measured at `current`.
    /// 输入在 `current` 时刻测得的往返样本。
    fn update(&self, sample: u32, current: u32);

    /// The current retransmission timeout. Zero until the first sample.
    /// 当前的重传超时。在第一个样本之前为零。
    fn timeout(&self) -> u32;
}

#[derive(Debug, Default, Clone)]
struct RttState {
    variation: u32,
    srtt: u32,
    rto: u32,
}

/// An estimator for the round-trip time, based on RFC 6298 in integer
/// milliseconds.
///
/// 一个基于 RFC 6298 的整数毫秒 RTT 估算器。
#[derive(Debug)]
pub struct RttEstimator {
    /// Floor of the smoothed RTT, usually the flush interval.
    /// 平滑 RTT 的下限，通常为刷新间隔。
    min_rtt: u32,
    state: Mutex<RttState>,
}

impl RttEstimator {
    /// Creates a new RTT estimator with a given minimum RTT.
    ///
    /// 使用给定的最小 RTT 创建一个新的 RTT 估算器。
    pub fn new(min_rtt: u32) -> Self {
        Self {
            min_rtt,
            state: Mutex::new(RttState::default()),
        }
    }

    /// Returns the smoothed RTT.
    pub fn smoothed_time(&self) -> u32 {
        self.state.lock().srtt
    }
}

impl RoundTrip for RttEstimator {
    fn update(&self, sample: u32, _current: u32) {
        if sample > 0x7FFF_FFFF {
            return;
        }
        let mut state = self.state.lock();

        // Samples reach 2^31, so the arithmetic is widened to stay exact.
        let sample = u64::from(sample);
        let min_rtt = u64::from(self.min_rtt);
        let (srtt, variation) = if state.srtt == 0 {
            // First sample
            (sample, sample / 2)
        } else {
            let srtt = u64::from(state.srtt);
            let variation = (3 * u64::from(state.variation) + srtt.abs_diff(sample)) / 4;
            (((7 * srtt + sample) / 8).max(min_rtt), variation)
        };

        let rto = if min_rtt < 4 * variation {
            srtt + 4 * variation
        } else {
            srtt + variation
        };
        // Both averages stay below 2^31.
        state.srtt = srtt as u32;
        state.variation = variation as u32;
        state.rto = (rto.min(u64::from(MAX_RTO)) * 5 / 4) as u32;
    }

    fn timeout(&self) -> u32 {
        self.state.lock().rto
    }
}
