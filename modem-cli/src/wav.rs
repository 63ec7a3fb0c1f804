//! WAV-backed `AudioSink`/`AudioSource` adapters so the CLI's demo mode can
//! drive the core modulator/demodulator against a file instead of a real
//! soundcard. PCM I/Q is stereo 16-bit (I on the left channel, Q on the
//! right), matching `modem_core::utils::iq_to_pcm_bytes`/`pcm_bytes_to_iq`.

use color_eyre::eyre::Result;
use modem_core::audio::{AudioSink, AudioSource};
use std::path::Path;

/// Buffers PCM bytes in memory; `finalize` writes them out as a WAV file.
#[derive(Default)]
pub struct WavSink {
    samples: Vec<u8>,
    sample_rate: u32,
}

impl WavSink {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
        }
    }

    pub fn finalize(self, path: impl AsRef<Path>) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for chunk in self.samples.chunks_exact(2) {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

impl AudioSink for WavSink {
    fn write(&mut self, pcm: &[u8]) {
        self.samples.extend_from_slice(pcm);
    }

    fn flush(&mut self) {}

    fn wait(&mut self) {}
}

/// Reads an entire WAV file's stereo 16-bit samples into memory up front
/// and serves them as little-endian I/Q PCM bytes.
pub struct WavSource {
    samples: Vec<u8>,
    pos: usize,
}

impl WavSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let mut samples = Vec::with_capacity(reader.len() as usize * 2);
        match spec.sample_format {
            hound::SampleFormat::Int => {
                for sample in reader.samples::<i16>() {
                    samples.extend_from_slice(&sample?.to_le_bytes());
                }
            }
            hound::SampleFormat::Float => {
                for sample in reader.samples::<f32>() {
                    let scaled = (sample? * i16::MAX as f32) as i16;
                    samples.extend_from_slice(&scaled.to_le_bytes());
                }
            }
        }
        Ok(Self { samples, pos: 0 })
    }
}

impl AudioSource for WavSource {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let remaining = self.samples.len() - self.pos;
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&self.samples[self.pos..self.pos + n]);
        self.pos += n;
        n
    }
}
