//! Common testing infrastructure for the sending core.

use crate::{
    config::Config,
    connection::{Connection, State},
    core::reliability::rtt::{RoundTrip, RttEstimator},
    packet::{command::Command, segment::DataSegment},
};
use parking_lot::Mutex;

/// A connection that records everything the worker sends.
#[derive(Debug)]
pub struct MockConnection {
    pub conv: u16,
    pub mss: u32,
    pub config: Config,
    pub state: Mutex<State>,
    pub rtt: RttEstimator,
    pub sent: Mutex<Vec<DataSegment>>,
    pub pings: Mutex<Vec<(u32, Command)>>,
}

impl MockConnection {
    /// A connection with `capacity` window slots and one-byte segments.
    pub fn with_capacity(capacity: u32) -> Self {
        let config = Config::default();
        Self::new(Config {
            write_buffer: capacity * config.mtu,
            ..config
        })
    }

    pub fn new(config: Config) -> Self {
        Self {
            conv: 42,
            mss: 1,
            rtt: RttEstimator::new(config.tti),
            config,
            state: Mutex::new(State::Active),
            sent: Mutex::new(Vec::new()),
            pings: Mutex::new(Vec::new()),
        }
    }

    /// Gives the RTT estimator a first sample so its timeout is non-zero.
    pub fn with_rtt_sample(self, sample: u32) -> Self {
        self.rtt.update(sample, 0);
        self
    }

    pub fn sent_numbers(&self) -> Vec<u32> {
        self.sent.lock().iter().map(|segment| segment.number).collect()
    }

    pub fn take_sent(&self) -> Vec<DataSegment> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl Connection for MockConnection {
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
        &self.rtt
    }

    fn mss(&self) -> u32 {
        self.mss
    }

    fn ping(&self, current: u32, command: Command) {
        self.pings.lock().push((current, command));
    }

    fn output(&self, segment: DataSegment) {
        self.sent.lock().push(segment);
    }
}
