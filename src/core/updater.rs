//! 周期性驱动发送工作者的时钟与更新器。
//! The clock and periodic updater that drive a sending worker.

use crate::{connection::Connection, core::reliability::sending_worker::SendingWorker};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::Notify,
    task::JoinHandle,
    time::{Instant, sleep},
};
use tracing::trace;

/// A millisecond clock that wraps around at `u32::MAX`, matching the
/// timestamps carried in segments.
///
/// 一个在 `u32::MAX` 处回绕的毫秒时钟，与分段中携带的时间戳一致。
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Milliseconds since the clock was created, truncated to 32 bits.
    pub fn now(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }
}

/// Runs an update function every `interval` while `should_continue` holds.
///
/// When there is nothing to do the task parks until [`Updater::wake_up`] is
/// called. Dropping the updater stops the task.
///
/// 当 `should_continue` 成立时，每隔 `interval` 运行一次更新函数。
/// 无事可做时任务会挂起，直到调用 [`Updater::wake_up`]。丢弃更新器会停止任务。
#[derive(Debug)]
pub struct Updater {
    wake: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl Updater {
    pub fn spawn<P, F>(interval: Duration, should_continue: P, mut update: F) -> Self
    where
        P: Fn() -> bool + Send + 'static,
        F: FnMut() + Send + 'static,
    {
        let wake = Arc::new(Notify::new());
        let notified = wake.clone();
        let handle = tokio::spawn(async move {
            loop {
                if !should_continue() {
                    trace!("Updater idle, waiting for wake-up");
                    notified.notified().await;
                    continue;
                }
                update();
                tokio::select! {
                    _ = sleep(interval) => {}
                    _ = notified.notified() => {}
                }
            }
        });
        Self { wake, handle }
    }

    /// Flushes `worker` every config tick while it has unacknowledged data.
    ///
    /// 当 `worker` 仍有未确认数据时，每个配置周期刷新一次。
    pub fn for_worker<C: Connection + 'static>(worker: Arc<SendingWorker<C>>, clock: Clock) -> Self {
        let interval = worker.connection().config().tti_duration();
        let pending = worker.clone();
        Self::spawn(
            interval,
            move || pending.update_necessary(),
            move || worker.flush(clock.now()),
        )
    }

    /// Re-evaluates `should_continue` right away, e.g. after a push.
    ///
    /// 立即重新评估 `should_continue`，例如在写入数据之后。
    pub fn wake_up(&self) {
        self.wake.notify_one();
    }
}

impl Drop for Updater {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_clock_tracks_elapsed_millis() {
        let clock = Clock::new();
        assert_eq!(clock.now(), 0);
        tokio::time::advance(Duration::from_millis(1234)).await;
        assert_eq!(clock.now(), 1234);
    }

    #[tokio::test(start_paused = true)]
    async fn test_updater_ticks_while_work_remains() {
        let count = Arc::new(AtomicU32::new(0));
        let active = Arc::new(AtomicBool::new(true));

        let counter = count.clone();
        let flag = active.clone();
        let updater = Updater::spawn(
            Duration::from_millis(50),
            move || flag.load(Ordering::SeqCst),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        sleep(Duration::from_millis(175)).await;
        let ticks = count.load(Ordering::SeqCst);
        assert!((3..=4).contains(&ticks), "unexpected tick count {}", ticks);

        // Idle: no more updates.
        active.store(false, Ordering::SeqCst);
        sleep(Duration::from_millis(100)).await;
        let idle = count.load(Ordering::SeqCst);
        sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), idle);

        // Woken up with work pending: updates resume.
        active.store(true, Ordering::SeqCst);
        updater.wake_up();
        sleep(Duration::from_millis(120)).await;
        assert!(count.load(Ordering::SeqCst) > idle);

        drop(updater);
        let stopped = count.load(Ordering::SeqCst);
        sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), stopped);
    }
}
