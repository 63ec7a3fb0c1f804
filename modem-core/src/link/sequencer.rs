//! Channel-access arbitration and transmit-burst keying, ported
//! unchanged in sequencing from `tx.c`'s `wait_for_clear_channel`/
//! `tx_frames`: p-persistent CSMA, PTT-on, seize-confirm, TX-delay idle,
//! the seized frame plus up to 256 more queued frames (HI before LO),
//! TX-tail idle, device flush/wait, and a wall-clock-aligned PTT-off
//! sleep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::Rng;

use crate::ax25::Packet;
use crate::audio::{AudioSink, Dcd, PttLine};
use crate::config::ChannelAccessConfig;
use crate::dsp::Modulator;
use crate::il2p::encode_frame;
use crate::link::dlq::Dlq;
use crate::link::txqueue::{TxQueue, PRIO_HI, PRIO_LO};

const WAIT_TIMEOUT_MS: u64 = 60_000;
const WAIT_CHECK_EVERY_MS: u64 = 10;
const MAX_FRAMES_PER_BURST: usize = 256;
/// Nominal bit rate used only for TX-delay/TX-tail/burst-duration
/// arithmetic (`tx.c`'s `tx_bits_per_sec`), independent of the QPSK
/// symbol rate.
const TX_BITS_PER_SEC: u32 = 2400;

fn ms_to_bits(ms: u32) -> u32 {
    ms * TX_BITS_PER_SEC / 1000
}

fn bits_to_ms(bits: u32) -> u32 {
    bits * 1000 / TX_BITS_PER_SEC
}

pub struct Sequencer {
    config: ChannelAccessConfig,
    dcd: Arc<dyn Dcd>,
    ptt: Arc<dyn PttLine>,
    audio_out: Arc<Mutex<dyn AudioSink>>,
    /// Stands in for `audio_out_dev_mutex`'s try-lock/unlock idiom: one
    /// burst owns the output device at a time. A plain `Mutex` can't be
    /// held across the gap between `wait_for_clear_channel` acquiring it
    /// and `run()` releasing it after `run_burst` returns, so an atomic
    /// flag plays the same role.
    device_busy: AtomicBool,
    modulator: Modulator,
    txqueue: Arc<TxQueue>,
    dlq: Arc<Dlq>,
}

impl Sequencer {
    pub fn new(
        config: ChannelAccessConfig,
        modulator: Modulator,
        dcd: Arc<dyn Dcd>,
        ptt: Arc<dyn PttLine>,
        audio_out: Arc<Mutex<dyn AudioSink>>,
        txqueue: Arc<TxQueue>,
        dlq: Arc<Dlq>,
    ) -> Self {
        Self {
            config,
            dcd,
            ptt,
            audio_out,
            device_busy: AtomicBool::new(false),
            modulator,
            txqueue,
            dlq,
        }
    }

    /// Runs until `shutdown` is set: wait for the queue to have work,
    /// then arbitrate and burst until both priorities drain.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::Relaxed) {
            self.txqueue.wait_while_empty(shutdown);
            if shutdown.load(Ordering::Relaxed) {
                return;
            }

            while self.txqueue.peek(PRIO_HI) || self.txqueue.peek(PRIO_LO) {
                let ok = self.wait_for_clear_channel();

                let (prio, packet) = match self.txqueue.remove(PRIO_HI) {
                    Some(p) => (PRIO_HI, Some(p)),
                    None => (PRIO_LO, self.txqueue.remove(PRIO_LO)),
                };

                if let Some(packet) = packet {
                    if ok {
                        self.run_burst(prio, packet);
                        self.device_busy.store(false, Ordering::Release);
                    }
                    // `ok == false` (60s CSMA timeout): the packet is
                    // dropped, matching `ax25_delete(pp)` on the
                    // original's timeout path.
                }
            }
        }
    }

    /// `wait_for_clear_channel`: p-persistent CSMA, restarting on busy at
    /// every stage, followed by claiming the (single) output device.
    /// `run()` releases the claim after `run_burst` returns.
    fn wait_for_clear_channel(&self) -> bool {
        let mut elapsed_ms: u64 = 0;
        let max_polls = WAIT_TIMEOUT_MS / WAIT_CHECK_EVERY_MS;

        if !self.config.fulldup {
            'start_over: loop {
                let mut n = 0u64;
                while self.dcd.dcd() {
                    std::thread::sleep(Duration::from_millis(WAIT_CHECK_EVERY_MS));
                    n += 1;
                    elapsed_ms += WAIT_CHECK_EVERY_MS;
                    if n > max_polls {
                        return false;
                    }
                }

                if self.config.dwait > 0 {
                    std::thread::sleep(Duration::from_millis(self.config.dwait as u64 * 10));
                }
                if self.dcd.dcd() {
                    continue 'start_over;
                }

                while !self.txqueue.peek(PRIO_HI) {
                    std::thread::sleep(Duration::from_millis(self.config.slottime as u64 * 10));
                    if self.dcd.dcd() {
                        continue 'start_over;
                    }
                    let roll: u8 = rand::thread_rng().gen();
                    if roll <= self.config.persist {
                        break;
                    }
                }
                break;
            }
        }

        let mut n = 0u64;
        loop {
            if self
                .device_busy
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
            std::thread::sleep(Duration::from_millis(WAIT_CHECK_EVERY_MS));
            n += 1;
            if n > max_polls {
                return false;
            }
        }
    }

    /// `tx_frames`: key up, send the seized frame plus queued backlog,
    /// unkey with wall-clock-aligned timing.
    fn run_burst(&mut self, mut prio: usize, packet: Packet) {
        let time_ptt = Instant::now();
        self.ptt.set(true);
        self.dlq.seize_confirm();

        let mut num_bits: u32 = 0;

        let delay_bits = ms_to_bits(self.config.txdelay * 10);
        self.send_idle(delay_bits / 8);
        num_bits += delay_bits;

        std::thread::sleep(Duration::from_millis(10));

        let mut numframe = 0usize;
        num_bits += self.send_one_frame(&packet);
        numframe += 1;

        while numframe < MAX_FRAMES_PER_BURST {
            let next = match self.txqueue.remove(PRIO_HI) {
                Some(p) => {
                    prio = PRIO_HI;
                    Some(p)
                }
                None => {
                    prio = PRIO_LO;
                    self.txqueue.remove(PRIO_LO)
                }
            };
            match next {
                Some(pp) => {
                    num_bits += self.send_one_frame(&pp);
                    numframe += 1;
                }
                None => break,
            }
        }
        let _ = prio;

        let tail_bits = ms_to_bits(self.config.txtail * 10);
        self.send_idle(tail_bits / 8);
        num_bits += tail_bits;

        {
            let mut sink = self.audio_out.lock().unwrap();
            sink.flush();
            sink.wait();
        }

        let duration_ms = bits_to_ms(num_bits);
        let already_ms = time_ptt.elapsed().as_millis() as i64;
        let wait_more = duration_ms as i64 - already_ms;
        if wait_more > 0 {
            std::thread::sleep(Duration::from_millis(wait_more as u64));
        }

        self.ptt.set(false);
    }

    fn send_idle(&mut self, n_octets: u32) {
        let pcm = self.modulator.send_idle(n_octets as usize);
        self.audio_out.lock().unwrap().write(&pcm);
    }

    /// Encode and modulate one frame, returning its bit count (`send_one_frame`).
    fn send_one_frame(&mut self, packet: &Packet) -> u32 {
        let frame = match encode_frame(packet) {
            Ok(bytes) => bytes,
            Err(_) => return 0,
        };
        let bits = crate::utils::bytes_to_bitstream(&frame);
        let num_bits = bits.len() as u32;
        let pcm = self.modulator.modulate_bits(&bits);
        self.audio_out.lock().unwrap().write(&pcm);
        num_bits
    }
}
