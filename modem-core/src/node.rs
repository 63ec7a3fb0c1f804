//! Thread lifecycle glue: the receive thread (audio in -> demodulator ->
//! bit receiver -> DLQ) and the transmit thread (the channel-access
//! sequencer draining the TX queue), both joined on a shared shutdown
//! flag. Mirrors the two worker threads spawned around `dlq`/`tq` in the
//! original's `main.c`, minus the AX.25 data-link state machine that
//! consumes the DLQ (out of scope).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::audio::{AudioSink, AudioSource, Dcd, PttLine};
use crate::config::ModemConfig;
use crate::dsp::{Demodulator, Modulator};
use crate::errors::InitError;
use crate::il2p::{BitReceiver, BitReceiverEvent};
use crate::link::sequencer::Sequencer;
use crate::link::{Dlq, TxQueue};
use crate::logging::SignalLogger;

/// Number of PCM I/Q bytes in one demodulator block (4 bytes/sample).
fn block_bytes(config: &ModemConfig) -> usize {
    config.wire.samples_per_symbol() * 4
}

/// Owns the receive thread: reads PCM blocks from `source`, runs them
/// through the demodulator and bit-level receiver, and pushes completed
/// frames (or drops) onto the shared DLQ. Runs until `source` returns
/// fewer bytes than requested (end of stream) or `shutdown` is set.
fn rx_loop(
    mut source: Box<dyn AudioSource>,
    mut demod: Demodulator,
    dlq: Arc<Dlq>,
    logger: Option<Arc<Mutex<SignalLogger>>>,
    block_len: usize,
    shutdown: Arc<AtomicBool>,
) {
    let mut rx = BitReceiver::new();
    let mut buf = vec![0u8; block_len];

    while !shutdown.load(Ordering::Relaxed) {
        let n = source.read(&mut buf);
        if n < block_len {
            break;
        }

        let result = demod.process_block(&buf);
        if result.frequency_lock_lost {
            if let Some(logger) = &logger {
                logger.lock().unwrap().warn(
                    "CARRIER",
                    format!("frequency lock lost, offset {:.1} Hz", result.offset_hz),
                );
            }
            break;
        }

        if let Some(dibit) = result.dibit {
            for bit in [dibit >> 1, dibit & 1] {
                match rx.push_bit(bit) {
                    Some(BitReceiverEvent::Frame {
                        packet,
                        symbols_corrected,
                    }) => {
                        if let Some(logger) = &logger {
                            logger.lock().unwrap().info(
                                "FRAME",
                                format!(
                                    "decoded {} byte frame, {} symbols corrected",
                                    packet.info().len(),
                                    symbols_corrected
                                ),
                            );
                        }
                        dlq.rec_frame(packet, symbols_corrected);
                    }
                    Some(BitReceiverEvent::Dropped) => {
                        if let Some(logger) = &logger {
                            logger.lock().unwrap().warn("FRAME", "frame dropped");
                        }
                    }
                    None => {}
                }
            }
        }
    }
}

/// Owns both worker threads of a running node: receive and transmit.
/// Dropping a `Node` does not join its threads; call `shutdown` followed
/// by `join` for an orderly stop.
pub struct Node {
    shutdown: Arc<AtomicBool>,
    rx_handle: Option<JoinHandle<()>>,
    tx_handle: Option<JoinHandle<()>>,
}

impl Node {
    /// Spawns the receive and transmit threads. `txqueue`/`dlq` are
    /// shared with whatever owns the data-link state machine consuming
    /// them; this crate only runs the threads that feed and drain them.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        config: &ModemConfig,
        source: Box<dyn AudioSource>,
        sink: Arc<Mutex<dyn AudioSink>>,
        dcd: Arc<dyn Dcd>,
        ptt: Arc<dyn PttLine>,
        txqueue: Arc<TxQueue>,
        dlq: Arc<Dlq>,
        logger: Option<Arc<Mutex<SignalLogger>>>,
    ) -> Result<Self, InitError> {
        let shutdown = Arc::new(AtomicBool::new(false));

        let demod = Demodulator::new(&config.wire, &config.costas).map_err(|e| InitError::RsTableInit {
            nroots: 0,
            reason: e.to_string(),
        })?;
        let modulator =
            Modulator::new(&config.wire).map_err(|e| InitError::RsTableInit {
                nroots: 0,
                reason: e.to_string(),
            })?;

        let block_len = block_bytes(config);
        let rx_dlq = dlq.clone();
        let rx_logger = logger.clone();
        let rx_shutdown = shutdown.clone();
        let rx_handle = thread::Builder::new()
            .name("modem-rx".to_string())
            .spawn(move || rx_loop(source, demod, rx_dlq, rx_logger, block_len, rx_shutdown))
            .map_err(|e| InitError::ThreadSpawn {
                thread_name: "modem-rx",
                reason: e.to_string(),
            })?;

        let mut sequencer = Sequencer::new(
            config.channel_access.clone(),
            modulator,
            dcd,
            ptt,
            sink,
            txqueue,
            dlq,
        );
        let tx_shutdown = shutdown.clone();
        let tx_handle = thread::Builder::new()
            .name("modem-tx".to_string())
            .spawn(move || sequencer.run(&tx_shutdown))
            .map_err(|e| InitError::ThreadSpawn {
                thread_name: "modem-tx",
                reason: e.to_string(),
            })?;

        Ok(Self {
            shutdown,
            rx_handle: Some(rx_handle),
            tx_handle: Some(tx_handle),
        })
    }

    /// Signals both threads to stop at their next suspension point.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Waits for both threads to exit. Call after `request_shutdown`, or
    /// after the RX side has hit end-of-stream on its own.
    pub fn join(&mut self) {
        if let Some(handle) = self.rx_handle.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.tx_handle.take() {
            let _ = handle.join();
        }
    }
}
