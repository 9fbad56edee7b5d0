//! tests/common/harness.rs
use bytes::Bytes;
use kcp_arq::{
    ChannelSink, Config, Endpoint, SendingWorker,
    packet::segment::{AckSegment, DataSegment, Segment},
};
use std::collections::BTreeMap;
use std::sync::{Arc, Once};
use tokio::sync::mpsc::UnboundedReceiver;

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "kcp_arq=info".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// A sending worker wired to a real endpoint and channel sink.
pub struct TestHarness {
    pub endpoint: Arc<Endpoint<ChannelSink>>,
    pub worker: Arc<SendingWorker<Endpoint<ChannelSink>>>,
    pub rx: UnboundedReceiver<Segment>,
}

impl TestHarness {
    pub fn new(config: Config) -> Self {
        init_tracing();
        let (sink, rx) = ChannelSink::new();
        let endpoint = Arc::new(Endpoint::new(1, config, sink).unwrap());
        let worker = Arc::new(SendingWorker::new(endpoint.clone()));
        Self {
            endpoint,
            worker,
            rx,
        }
    }

    /// Takes everything queued on the outbound channel.
    pub fn drain_outbound(&mut self) -> Vec<Segment> {
        let mut segments = Vec::new();
        while let Ok(segment) = self.rx.try_recv() {
            segments.push(segment);
        }
        segments
    }

    pub fn drain_data(&mut self) -> Vec<DataSegment> {
        self.drain_outbound()
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Data(data) => Some(data),
                Segment::Command(_) => None,
            })
            .collect()
    }
}

/// A minimal in-order reassembling receiver that answers every data segment
/// with an ack.
#[derive(Default)]
pub struct PeerReceiver {
    pub next_expected: u32,
    pub window: u32,
    pending: BTreeMap<u32, Bytes>,
    pub delivered: Vec<u8>,
}

impl PeerReceiver {
    pub fn new(window: u32) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn receive(&mut self, segment: &DataSegment) -> AckSegment {
        if segment.number >= self.next_expected {
            self.pending.insert(segment.number, segment.payload.clone());
        }
        while let Some(payload) = self.pending.remove(&self.next_expected) {
            self.delivered.extend_from_slice(&payload);
            self.next_expected += 1;
        }
        AckSegment {
            conv: segment.conv,
            receiving_window: self.next_expected + self.window,
            receiving_next: self.next_expected,
            timestamp: segment.timestamp,
            number_list: vec![segment.number],
        }
    }
}
