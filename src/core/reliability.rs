//! The reliability layer of the sending side.
//!
//! This layer is responsible for sequencing, acknowledgments, retransmissions
//! (RTO and fast-ack), and the loss-based congestion window.
//!
//! 发送侧的可靠性层。
//!
//! 该层负责序列化、确认、重传（RTO 与快速确认）以及基于丢包的拥塞窗口。

pub mod rtt;
pub mod send_window;
pub mod sending_worker;
pub mod sequence;
