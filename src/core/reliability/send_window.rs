//! 发送窗口 - 固定容量的在途分段环形缓冲区
//! Sending Window - fixed-capacity ring of in-flight segments
//!
//! Slots are assigned in push order, so the slot of a live segment is always
//! `(start + (number - first_number)) % cap`. Removing a segment never moves
//! the survivors: removal only advances `start`, retreats `last`, or relinks
//! the neighbours through the `prev`/`next` index arrays. `len` is therefore
//! the span from `start` to one past the newest pushed slot, not the number of
//! live segments; the sending worker relies on this to turn a sequence number
//! into an offset without searching.

use super::sequence::{at_or_before, before};
use crate::packet::segment::DataSegment;
use bytes::Bytes;
use tracing::trace;

/// Receives the segments a window flush decides to send.
///
/// 接收窗口刷新时决定发送的分段。
pub trait SegmentWriter {
    /// Called for every segment that is due. Must not block.
    /// 每个到期的分段都会调用此方法。不得阻塞。
    fn write(&mut self, segment: &mut DataSegment);

    /// Called once per flush with the retransmission percentage.
    /// 每次刷新调用一次，参数为重传百分比。
    fn on_packet_loss(&mut self, _loss_rate: u32) {}
}

/// The sending window.
///
/// 发送窗口。
#[derive(Debug)]
pub struct SendingWindow {
    start: u32,
    cap: u32,
    len: u32,
    last: u32,

    data: Vec<DataSegment>,
    inuse: Vec<bool>,
    prev: Vec<u32>,
    next: Vec<u32>,

    /// Segments sent at least once and not yet removed.
    /// 至少发送过一次且尚未移除的分段数。
    total_in_flight: u32,
}

impl SendingWindow {
    /// Creates a window holding up to `size` segments.
    ///
    /// 创建一个最多容纳 `size` 个分段的窗口。
    pub fn new(size: u32) -> Self {
        let cap = size.max(1);
        Self {
            start: 0,
            cap,
            len: 0,
            last: 0,
            data: vec![DataSegment::default(); cap as usize],
            inuse: vec![false; cap as usize],
            prev: vec![0; cap as usize],
            next: vec![0; cap as usize],
            total_in_flight: 0,
        }
    }

    /// The span of slots between the oldest live segment and the newest push.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Capacity in segments.
    pub fn size(&self) -> u32 {
        self.cap
    }

    pub fn is_full(&self) -> bool {
        self.len == self.cap
    }

    pub fn total_in_flight(&self) -> u32 {
        self.total_in_flight
    }

    /// Appends a segment. Returns false if the window is full.
    ///
    /// 追加一个分段。窗口已满时返回 false。
    pub fn push(&mut self, number: u32, data: Bytes) -> bool {
        if self.is_full() {
            return false;
        }
        let pos = (self.start + self.len) % self.cap;
        self.data[pos as usize].reset(number, data);
        self.inuse[pos as usize] = true;
        if self.len > 0 {
            self.next[self.last as usize] = pos;
            self.prev[pos as usize] = self.last;
        }
        self.last = pos;
        self.len += 1;
        trace!(number, pos, len = self.len, "Pushed segment into sending window");
        true
    }

    /// Sequence number of the oldest live segment.
    ///
    /// 最早的存活分段的序列号。
    pub fn first_number(&self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            Some(self.data[self.start as usize].number)
        }
    }

    /// Removes the oldest segments while their number precedes `threshold`.
    ///
    /// 移除序号在 `threshold` 之前的最早分段。
    pub fn clear(&mut self, threshold: u32) {
        while let Some(first) = self.first_number() {
            if !before(first, threshold) || !self.remove(0) {
                break;
            }
        }
    }

    /// Removes every segment regardless of its number.
    ///
    /// 无条件移除所有分段。
    pub fn drain(&mut self) {
        while !self.is_empty() {
            if !self.remove(0) {
                break;
            }
        }
    }

    /// Removes the segment `offset` slots after the head.
    ///
    /// Returns false if the offset is past the window or the slot was already
    /// removed; duplicate acks end up here.
    ///
    /// 移除头部之后第 `offset` 个槽位的分段。
    pub fn remove(&mut self, offset: u32) -> bool {
        if self.len == 0 || offset >= self.len {
            return false;
        }

        let pos = (self.start + offset) % self.cap;
        let slot = pos as usize;
        if !self.inuse[slot] {
            return false;
        }
        self.inuse[slot] = false;
        if self.data[slot].transmit > 0 {
            self.total_in_flight = self.total_in_flight.saturating_sub(1);
        }
        trace!(number = self.data[slot].number, pos, "Removed segment from sending window");
        self.data[slot].release();

        if pos == self.start && pos == self.last {
            self.len = 0;
            self.start = 0;
            self.last = 0;
        } else if pos == self.start {
            let successor = self.next[slot];
            let delta = (successor + self.cap - self.start) % self.cap;
            self.start = successor;
            self.len -= delta;
        } else if pos == self.last {
            self.last = self.prev[slot];
        } else {
            let (prev, next) = (self.prev[slot], self.next[slot]);
            self.next[prev as usize] = next;
            self.prev[next as usize] = prev;
        }
        true
    }

    /// Pulls in the retransmission deadline of every sent segment before
    /// `number` by a third of `rto`.
    ///
    /// 将 `number` 之前所有已发送分段的重传截止时间提前 `rto` 的三分之一。
    pub fn handle_fast_ack(&mut self, number: u32, rto: u32) {
        if self.is_empty() {
            return;
        }
        let shrink = rto / 3;
        self.visit(|segment| {
            if !before(segment.number, number) {
                return false;
            }
            if segment.transmit > 0 {
                segment.timeout = segment.timeout.wrapping_sub(shrink);
            }
            true
        });
    }

    /// Walks the live segments from oldest to newest. The visitor returns
    /// false to stop.
    ///
    /// 从最早到最新遍历存活分段。
    pub fn visit<F>(&mut self, mut visitor: F)
    where
        F: FnMut(&mut DataSegment) -> bool,
    {
        if self.is_empty() {
            return;
        }
        let mut i = self.start;
        loop {
            if !visitor(&mut self.data[i as usize]) || i == self.last {
                break;
            }
            i = self.next[i as usize];
        }
    }

    /// Iterates the live segments from oldest to newest.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            window: self,
            cursor: (!self.is_empty()).then_some(self.start),
        }
    }

    /// Sends every segment whose deadline has arrived, at most
    /// `max_in_flight` of them, and reports the share of retransmissions.
    ///
    /// A segment that was never sent is always due.
    ///
    /// 发送所有到期的分段（最多 `max_in_flight` 个），并报告重传比例。
    pub fn flush<W>(&mut self, current: u32, rto: u32, max_in_flight: u32, writer: &mut W)
    where
        W: SegmentWriter + ?Sized,
    {
        if self.is_empty() || max_in_flight == 0 {
            return;
        }

        let mut lost: u32 = 0;
        let mut sent: u32 = 0;
        let mut i = self.start;
        loop {
            let segment = &mut self.data[i as usize];
            let due = segment.transmit == 0 || at_or_before(segment.timeout, current);
            if due {
                if segment.transmit == 0 {
                    self.total_in_flight += 1;
                } else {
                    lost += 1;
                }
                segment.timeout = current.wrapping_add(rto);
                segment.timestamp = current;
                segment.transmit += 1;
                writer.write(segment);
                sent += 1;
                if sent >= max_in_flight {
                    break;
                }
            }
            if i == self.last {
                break;
            }
            i = self.next[i as usize];
        }

        if sent > 0 {
            trace!(sent, lost, in_flight = self.total_in_flight, "Flushed sending window");
        }
        if sent > 0 && self.total_in_flight != 0 {
            let rate = (u64::from(lost) * 100 / u64::from(self.total_in_flight)) as u32;
            writer.on_packet_loss(rate);
        }
    }

    /// Drops every buffered payload and empties the window.
    ///
    /// 释放所有缓冲的载荷并清空窗口。
    pub fn release(&mut self) {
        for segment in &mut self.data {
            segment.release();
        }
        self.inuse.fill(false);
        self.start = 0;
        self.len = 0;
        self.last = 0;
        self.total_in_flight = 0;
    }
}

/// Iterator over the live segments of a [`SendingWindow`].
pub struct Iter<'a> {
    window: &'a SendingWindow,
    cursor: Option<u32>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a DataSegment;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.cursor?;
        self.cursor = if i == self.window.last {
            None
        } else {
            Some(self.window.next[i as usize])
        };
        Some(&self.window.data[i as usize])
    }
}
