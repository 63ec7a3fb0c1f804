//! Two-priority transmit queue, ported from `tq.h`/`tq_append`/
//! `tq_remove`/`tq_peek`/`tq_wait_while_empty`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::ax25::Packet;
use crate::errors::QueueError;

pub const PRIO_HI: usize = 0;
pub const PRIO_LO: usize = 1;
const NUM_PRIO: usize = 2;

pub struct TxQueue {
    queues: [Mutex<VecDeque<Packet>>; NUM_PRIO],
    not_empty: Condvar,
    next_seq: AtomicI64,
}

impl Default for TxQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TxQueue {
    pub fn new() -> Self {
        Self {
            queues: [Mutex::new(VecDeque::new()), Mutex::new(VecDeque::new())],
            not_empty: Condvar::new(),
            next_seq: AtomicI64::new(0),
        }
    }

    /// Append a packet to the given priority's FIFO, stamping its
    /// sequence number, and wake any thread blocked in
    /// `wait_while_empty`.
    pub fn append(&self, priority: usize, mut packet: Packet) -> Result<(), QueueError> {
        if priority >= NUM_PRIO {
            return Err(QueueError::InvalidPriority { level: priority });
        }
        packet.seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut q = self.queues[priority].lock().unwrap();
        q.push_back(packet);
        drop(q);
        self.not_empty.notify_all();
        Ok(())
    }

    /// Non-blocking check: is there a packet at this priority?
    pub fn peek(&self, priority: usize) -> bool {
        !self.queues[priority].lock().unwrap().is_empty()
    }

    /// Remove and return the oldest packet at this priority, if any.
    pub fn remove(&self, priority: usize) -> Option<Packet> {
        self.queues[priority].lock().unwrap().pop_front()
    }

    pub fn count(&self, priority: usize) -> usize {
        self.queues[priority].lock().unwrap().len()
    }

    /// Block until either priority has at least one packet, or the node
    /// is shutting down (checked via `shutdown`). Mirrors
    /// `tq_wait_while_empty`'s condition-variable wait.
    pub fn wait_while_empty(&self, shutdown: &std::sync::atomic::AtomicBool) {
        let mut guard = self.queues[PRIO_HI].lock().unwrap();
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            if !guard.is_empty() || self.peek(PRIO_LO) {
                return;
            }
            let (g, _timeout) = self
                .not_empty
                .wait_timeout(guard, Duration::from_millis(100))
                .unwrap();
            guard = g;
        }
    }
}
