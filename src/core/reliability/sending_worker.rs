//! 发送工作者 - 序号分配、确认处理、重传驱动和拥塞窗口
//! Sending Worker - sequence assignment, ack processing, retransmission and
//! the loss-based congestion window
//!
//! All state sits behind one read/write lock: ack processing and flushing
//! must see the window contents and `first_unacknowledged` change together.

use super::{
    send_window::{SegmentWriter, SendingWindow},
    sequence::{at_or_before, before, earliest},
};
use crate::{
    connection::{Connection, State},
    packet::{
        command::{Command, SegmentOption},
        segment::{AckSegment, DataSegment},
    },
};
use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

/// Echoed timestamps older than this are not used as RTT samples.
const MAX_RTT_SAMPLE_AGE: u32 = 10000;

/// Bounds of the loss-based congestion window.
const MIN_CONTROL_WINDOW: u32 = 16;
const LOSS_RATE_DECREASE: u32 = 15;
const LOSS_RATE_INCREASE: u32 = 5;

/// The peer's window ceiling assumed until its first ack arrives.
const INITIAL_REMOTE_NEXT_NUMBER: u32 = 32;
const DEFAULT_FAST_RESEND: u32 = 2;

#[derive(Debug)]
struct SendingState {
    /// `None` once the worker has been released.
    window: Option<SendingWindow>,
    first_unacknowledged: u32,
    first_unacknowledged_updated: bool,
    next_number: u32,
    remote_next_number: u32,
    control_window: u32,
    fast_resend: u32,
}

impl SendingState {
    fn find_first_unacknowledged(&mut self) {
        let previous = self.first_unacknowledged;
        self.first_unacknowledged = self
            .window
            .as_ref()
            .and_then(SendingWindow::first_number)
            .unwrap_or(self.next_number);
        if previous != self.first_unacknowledged {
            self.first_unacknowledged_updated = true;
        }
    }

    fn process_receiving_next(&mut self, next_number: u32) {
        if let Some(window) = self.window.as_mut() {
            window.clear(next_number);
        }
        self.find_first_unacknowledged();
    }

    fn process_ack(&mut self, number: u32) -> bool {
        // number < first_unacknowledged || number >= next_number
        if !at_or_before(self.first_unacknowledged, number) || !before(number, self.next_number) {
            return false;
        }
        let Some(window) = self.window.as_mut() else {
            return false;
        };
        let removed = window.remove(number.wrapping_sub(self.first_unacknowledged));
        if removed {
            self.find_first_unacknowledged();
        }
        removed
    }
}

/// Applies one loss report to the congestion window.
fn adjust_control_window<C: Connection + ?Sized>(control_window: &mut u32, loss_rate: u32, conn: &C) {
    let config = conn.config();
    if !config.congestion || conn.round_trip().timeout() == 0 {
        return;
    }

    let old_cwnd = *control_window;
    let mut cwnd = old_cwnd;
    if loss_rate >= LOSS_RATE_DECREASE {
        cwnd = cwnd.saturating_mul(3) / 4;
    } else if loss_rate <= LOSS_RATE_INCREASE {
        cwnd = cwnd.saturating_add(cwnd / 4);
    }
    let upper = config.sending_in_flight_size().saturating_mul(2);
    cwnd = cwnd.max(MIN_CONTROL_WINDOW).min(upper);
    *control_window = cwnd;

    if old_cwnd != cwnd {
        debug!(old_cwnd, new_cwnd = cwnd, loss_rate, "Congestion window updated on packet loss");
    }
}

/// Fills in the fields only the connection knows and forwards the segment.
struct WorkerWriter<'a, C: Connection + ?Sized> {
    conn: &'a C,
    first_unacknowledged: u32,
    control_window: &'a mut u32,
}

impl<C: Connection + ?Sized> SegmentWriter for WorkerWriter<'_, C> {
    fn write(&mut self, segment: &mut DataSegment) {
        segment.conv = self.conn.conv();
        segment.sending_next = self.first_unacknowledged;
        segment.option = if self.conn.state() == State::ReadyToClose {
            SegmentOption::Close
        } else {
            SegmentOption::None
        };
        trace!(number = segment.number, transmit = segment.transmit(), "Writing data segment");
        self.conn.output(segment.clone());
    }

    fn on_packet_loss(&mut self, loss_rate: u32) {
        adjust_control_window(self.control_window, loss_rate, self.conn);
    }
}

/// The sending half of a connection.
///
/// 连接的发送端。
#[derive(Debug)]
pub struct SendingWorker<C: Connection> {
    conn: Arc<C>,
    state: RwLock<SendingState>,
}

impl<C: Connection> SendingWorker<C> {
    /// Creates a worker whose window is sized from the connection's config.
    ///
    /// 创建一个窗口大小由连接配置决定的发送工作者。
    pub fn new(conn: Arc<C>) -> Self {
        let config = conn.config();
        let state = SendingState {
            window: Some(SendingWindow::new(config.sending_buffer_size())),
            first_unacknowledged: 0,
            first_unacknowledged_updated: false,
            next_number: 0,
            remote_next_number: INITIAL_REMOTE_NEXT_NUMBER,
            control_window: config.sending_in_flight_size(),
            fast_resend: DEFAULT_FAST_RESEND,
        };
        Self {
            conn,
            state: RwLock::new(state),
        }
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.conn
    }

    /// Applies a cumulative ack: everything below `next_number` was received.
    ///
    /// 处理累计确认：`next_number` 之前的所有分段均已收到。
    pub fn process_receiving_next(&self, next_number: u32) {
        self.state.write().process_receiving_next(next_number);
    }

    /// Applies a selective ack. Returns whether a segment was removed; numbers
    /// outside `[first_unacknowledged, next_number)` and repeats are ignored.
    ///
    /// 处理选择性确认。返回是否移除了分段。
    pub fn process_ack(&self, number: u32) -> bool {
        self.state.write().process_ack(number)
    }

    /// Processes an ack segment from the peer.
    ///
    /// 处理来自对端的确认分段。
    pub fn process_segment(&self, current: u32, ack: AckSegment, rto: u32) {
        let mut state = self.state.write();

        if before(state.remote_next_number, ack.receiving_window) {
            state.remote_next_number = ack.receiving_window;
        }
        state.process_receiving_next(ack.receiving_next);

        let mut max_ack: Option<(u32, bool)> = None;
        for &number in &ack.number_list {
            let removed = state.process_ack(number);
            match max_ack {
                Some((max, _)) if !before(max, number) => {}
                _ => max_ack = Some((number, removed)),
            }
        }

        trace!(
            receiving_next = ack.receiving_next,
            count = ack.count(),
            first_unacknowledged = state.first_unacknowledged,
            "Processed ack segment"
        );

        if let Some((max_ack, true)) = max_ack {
            if let Some(window) = state.window.as_mut() {
                window.handle_fast_ack(max_ack, rto);
            }
            let age = current.wrapping_sub(ack.timestamp);
            if age < MAX_RTT_SAMPLE_AGE {
                self.conn.round_trip().update(age, current);
            }
        }
    }

    /// Queues as much of `data` as the window can take, in segments of at most
    /// one MSS. Returns the number of bytes accepted; never blocks.
    ///
    /// 将尽可能多的 `data` 按 MSS 分段放入窗口。返回接受的字节数；从不阻塞。
    pub fn push(&self, data: &[u8]) -> usize {
        let mss = self.conn.mss() as usize;
        if mss == 0 {
            return 0;
        }

        let mut state = self.state.write();
        let SendingState {
            window, next_number, ..
        } = &mut *state;
        let Some(window) = window.as_mut() else {
            return 0;
        };

        let mut accepted = 0;
        for chunk in data.chunks(mss) {
            if !window.push(*next_number, Bytes::copy_from_slice(chunk)) {
                break;
            }
            *next_number = next_number.wrapping_add(1);
            accepted += chunk.len();
        }
        accepted
    }

    /// Adapts the congestion window to a reported loss percentage.
    ///
    /// 根据报告的丢包百分比调整拥塞窗口。
    pub fn on_packet_loss(&self, loss_rate: u32) {
        let mut state = self.state.write();
        adjust_control_window(&mut state.control_window, loss_rate, &*self.conn);
    }

    /// Sends due segments, or a keep-alive ping if nothing is buffered but
    /// the first unacknowledged number moved since the last flush.
    ///
    /// 发送到期的分段；若缓冲区为空但第一个未确认序号自上次刷新后发生变化，则发送心跳。
    pub fn flush(&self, current: u32) {
        let mut state = self.state.write();
        let config = self.conn.config();

        let una = state.first_unacknowledged;
        let mut ceiling = earliest(
            una.wrapping_add(config.sending_in_flight_size()),
            state.remote_next_number,
        );
        if config.congestion {
            ceiling = earliest(ceiling, una.wrapping_add(state.control_window));
        }
        let max_in_flight = if before(una, ceiling) {
            ceiling.wrapping_sub(una)
        } else {
            0
        };

        let SendingState {
            window,
            first_unacknowledged_updated,
            control_window,
            ..
        } = &mut *state;
        let Some(window) = window.as_mut() else {
            return;
        };

        if !window.is_empty() {
            let mut writer = WorkerWriter {
                conn: &*self.conn,
                first_unacknowledged: una,
                control_window,
            };
            window.flush(current, self.conn.round_trip().timeout(), max_in_flight, &mut writer);
        } else if *first_unacknowledged_updated {
            debug!(first_unacknowledged = una, "Sending window idle, probing peer");
            self.conn.ping(current, Command::Ping);
        }

        *first_unacknowledged_updated = false;
    }

    /// Drops everything still buffered, acknowledged or not.
    ///
    /// 丢弃所有仍在缓冲的数据，无论是否已确认。
    pub fn close_write(&self) {
        let mut state = self.state.write();
        if let Some(window) = state.window.as_mut() {
            debug!(len = window.len(), "Draining sending window on close");
            window.drain();
        }
        state.find_first_unacknowledged();
    }

    /// Whether no unacknowledged data remains.
    pub fn is_empty(&self) -> bool {
        self.state
            .read()
            .window
            .as_ref()
            .is_none_or(SendingWindow::is_empty)
    }

    /// Whether the periodic updater still has work for this worker.
    ///
    /// 周期性更新器是否仍需要驱动此工作者。
    pub fn update_necessary(&self) -> bool {
        !self.is_empty()
    }

    /// Tears the window down. Later calls, and every other operation on a
    /// released worker, do nothing.
    ///
    /// 释放窗口。之后的调用以及对已释放工作者的其他操作均为空操作。
    pub fn release(&self) {
        if let Some(mut window) = self.state.write().window.take() {
            window.release();
        }
    }

    pub fn first_unacknowledged(&self) -> u32 {
        self.state.read().first_unacknowledged
    }

    pub fn next_number(&self) -> u32 {
        self.state.read().next_number
    }

    pub fn remote_next_number(&self) -> u32 {
        self.state.read().remote_next_number
    }

    pub fn control_window(&self) -> u32 {
        self.state.read().control_window
    }

    pub fn fast_resend(&self) -> u32 {
        self.state.read().fast_resend
    }

    /// Segments sent at least once and still unacknowledged.
    pub fn in_flight(&self) -> u32 {
        self.state
            .read()
            .window
            .as_ref()
            .map_or(0, SendingWindow::total_in_flight)
    }
}
