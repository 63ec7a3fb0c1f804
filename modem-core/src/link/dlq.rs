//! Data Link Queue: the single funnel for events moving from the
//! demodulator/receive chain and the transmit sequencer up to the link
//! layer (or, here, any consumer waiting on `remove`/`wait_while_empty`).
//!
//! Ported from `dlq.c`/`dlq.h`: a singly-linked FIFO guarded by a mutex
//! and condvar, three event kinds, and a length warning threshold.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::ax25::Packet;
use crate::logging::SignalLogger;

/// Length past which `dlq_append` logs a warning; matches the
/// original's hard-coded threshold.
const WARN_QUEUE_LEN: usize = 10;

/// Auxiliary, non-frame channel data (`cdata_t` in the original).
#[derive(Debug, Clone)]
pub struct ChannelData {
    pub pid: i32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum DlqEvent {
    RecFrame {
        packet: Packet,
        symbols_corrected: usize,
    },
    ChannelBusy {
        activity: i32,
        status: i32,
    },
    SeizeConfirm,
}

#[derive(Debug, Clone)]
pub struct DlqItem {
    pub event: DlqEvent,
    pub channel_data: Option<ChannelData>,
}

pub struct Dlq {
    queue: Mutex<VecDeque<DlqItem>>,
    not_empty: Condvar,
    logger: Option<Arc<Mutex<SignalLogger>>>,
}

impl Default for Dlq {
    fn default() -> Self {
        Self::new()
    }
}

impl Dlq {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            logger: None,
        }
    }

    /// Attaches a logger so `dlq_append`'s length-warning branch is
    /// visible once this queue is owned by a running node.
    pub fn with_logger(logger: Arc<Mutex<SignalLogger>>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            logger: Some(logger),
        }
    }

    fn push(&self, item: DlqItem) {
        let mut q = self.queue.lock().unwrap();
        q.push_back(item);
        let len = q.len();
        drop(q);
        if len > WARN_QUEUE_LEN {
            if let Some(logger) = &self.logger {
                logger
                    .lock()
                    .unwrap()
                    .warn("DLQ", format!("queue length {len} exceeds warning threshold"));
            }
        }
        self.not_empty.notify_all();
    }

    pub fn rec_frame(&self, packet: Packet, symbols_corrected: usize) {
        self.push(DlqItem {
            event: DlqEvent::RecFrame {
                packet,
                symbols_corrected,
            },
            channel_data: None,
        });
    }

    pub fn channel_busy(&self, activity: i32, status: i32) {
        self.push(DlqItem {
            event: DlqEvent::ChannelBusy { activity, status },
            channel_data: None,
        });
    }

    pub fn seize_confirm(&self) {
        self.push(DlqItem {
            event: DlqEvent::SeizeConfirm,
            channel_data: None,
        });
    }

    pub fn remove(&self) -> Option<DlqItem> {
        self.queue.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block up to `timeout` for an item to arrive. Returns `true` if
    /// the queue is non-empty on return, mirroring `dlq_wait_while_empty`'s
    /// boolean result.
    pub fn wait_while_empty(&self, timeout: Duration) -> bool {
        let guard = self.queue.lock().unwrap();
        if !guard.is_empty() {
            return true;
        }
        let (guard, _timeout_result) = self.not_empty.wait_timeout(guard, timeout).unwrap();
        !guard.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ax25::{Address, PID_NO_LAYER_3};

    fn packet() -> Packet {
        let dest = Address::new("DEST", 0).unwrap();
        let src = Address::new("SRC", 0).unwrap();
        Packet::new_ui(dest, src, PID_NO_LAYER_3, b"hi".to_vec()).unwrap()
    }

    #[test]
    fn fifo_ordering_across_event_kinds() {
        let dlq = Dlq::new();
        dlq.seize_confirm();
        dlq.rec_frame(packet(), 0);
        dlq.channel_busy(1, 0);

        assert!(matches!(
            dlq.remove().unwrap().event,
            DlqEvent::SeizeConfirm
        ));
        assert!(matches!(dlq.remove().unwrap().event, DlqEvent::RecFrame { .. }));
        assert!(matches!(
            dlq.remove().unwrap().event,
            DlqEvent::ChannelBusy { .. }
        ));
        assert!(dlq.is_empty());
    }

    #[test]
    fn wait_while_empty_returns_true_immediately_when_populated() {
        let dlq = Dlq::new();
        dlq.seize_confirm();
        assert!(dlq.wait_while_empty(Duration::from_millis(10)));
    }

    #[test]
    fn wait_while_empty_times_out_on_empty_queue() {
        let dlq = Dlq::new();
        assert!(!dlq.wait_while_empty(Duration::from_millis(5)));
    }

    #[test]
    fn queue_length_past_threshold_logs_a_warning() {
        use crate::logging::{LogConfig, SignalLogger};

        let logger = Arc::new(Mutex::new(SignalLogger::new(LogConfig::default())));
        let dlq = Dlq::with_logger(logger.clone());
        for _ in 0..=WARN_QUEUE_LEN {
            dlq.seize_confirm();
        }
        let entries = logger.lock().unwrap();
        assert!(entries
            .entries_for_subsystem("DLQ")
            .iter()
            .any(|e| e.level == crate::logging::LogLevel::Warn));
    }
}
