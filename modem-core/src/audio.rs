//! Audio device seams: carrier detect, PTT keying, and the PCM sink the
//! transmit sequencer writes modulated bursts to. Concrete
//! implementations (real soundcard, file, in-memory test fixture) live
//! outside `modem-core`; these traits are the boundary.

/// Carrier/data detect: true while the channel is busy.
pub trait Dcd: Send + Sync {
    fn dcd(&self) -> bool;
}

/// Push-to-talk control line.
pub trait PttLine: Send + Sync {
    fn set(&self, on: bool);
}

/// The audio output device a transmit burst is written to.
pub trait AudioSink: Send {
    fn write(&mut self, pcm: &[u8]);
    /// Request any buffered audio be pushed out.
    fn flush(&mut self);
    /// Block until the device has finished playing buffered audio.
    fn wait(&mut self);
}

/// The audio input device a receive chain reads PCM I/Q blocks from.
pub trait AudioSource: Send {
    /// Read exactly `buf.len()` bytes, or fewer at end-of-stream.
    fn read(&mut self, buf: &mut [u8]) -> usize;
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, Default)]
    pub struct AlwaysClear;
    impl Dcd for AlwaysClear {
        fn dcd(&self) -> bool {
            false
        }
    }

    #[derive(Debug, Default)]
    pub struct AlwaysBusy;
    impl Dcd for AlwaysBusy {
        fn dcd(&self) -> bool {
            true
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingPtt {
        pub on: AtomicBool,
    }
    impl PttLine for RecordingPtt {
        fn set(&self, on: bool) {
            self.on.store(on, Ordering::SeqCst);
        }
    }

    #[derive(Debug, Default)]
    pub struct MemorySink {
        pub written: Vec<u8>,
        pub flushed: bool,
    }
    impl AudioSink for MemorySink {
        fn write(&mut self, pcm: &[u8]) {
            self.written.extend_from_slice(pcm);
        }
        fn flush(&mut self) {
            self.flushed = true;
        }
        fn wait(&mut self) {}
    }
}
