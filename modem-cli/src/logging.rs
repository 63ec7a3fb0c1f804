//! Structured logging for the CLI frontend: frame decode/drop events and
//! general info/warn/error messages, in JSON, logfmt, or human-readable
//! pretty form.

use crate::config::{LogFormat, LogTarget, LoggingConfig};
use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Structured log event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// A frame was successfully decoded off the air.
    FrameDecoded {
        timestamp: DateTime<Utc>,
        source: String,
        destination: String,
        info_len: usize,
        symbols_corrected: usize,
    },

    /// A frame failed RS correction or named an unusable address and was
    /// dropped.
    FrameDropped { timestamp: DateTime<Utc>, reason: String },

    /// The CSMA wait-for-clear-channel loop hit its 60-second bound.
    CsmaTimeout { timestamp: DateTime<Utc> },

    /// General info message.
    Info { message: String },

    /// Warning message.
    Warn { message: String },

    /// Error message.
    Error { message: String, details: Option<String> },
}

/// Logger that outputs structured logs.
pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| color_eyre::eyre::eyre!("File path required for file logging"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self {
            config,
            writer,
            start_time: Utc::now(),
        })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => self.format_json(&event)?,
            LogFormat::Logfmt => self.format_logfmt(&event),
            LogFormat::Pretty => self.format_pretty(&event),
        };

        writeln!(self.writer, "{}", output)?;
        self.writer.flush()?;

        Ok(())
    }

    fn format_json(&self, event: &LogEvent) -> Result<String> {
        Ok(serde_json::to_string(event)?)
    }

    fn format_logfmt(&self, event: &LogEvent) -> String {
        let ts = Utc::now().to_rfc3339();
        match event {
            LogEvent::FrameDecoded {
                source,
                destination,
                info_len,
                symbols_corrected,
                ..
            } => format!(
                "ts=\"{ts}\" type=frame_decoded src=\"{source}\" dst=\"{destination}\" info_len={info_len} corrected={symbols_corrected}"
            ),
            LogEvent::FrameDropped { reason, .. } => {
                format!("ts=\"{ts}\" type=frame_dropped reason=\"{reason}\"")
            }
            LogEvent::CsmaTimeout { .. } => format!("ts=\"{ts}\" type=csma_timeout"),
            LogEvent::Info { message } => format!("ts=\"{ts}\" level=info msg=\"{message}\""),
            LogEvent::Warn { message } => format!("ts=\"{ts}\" level=warn msg=\"{message}\""),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("ts=\"{ts}\" level=error msg=\"{message}\" details=\"{d}\""),
                None => format!("ts=\"{ts}\" level=error msg=\"{message}\""),
            },
        }
    }

    fn format_pretty(&self, event: &LogEvent) -> String {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        match event {
            LogEvent::FrameDecoded {
                source,
                destination,
                info_len,
                symbols_corrected,
                ..
            } => format!(
                "[{ts}] FRAME {source} -> {destination}: {info_len} bytes, {symbols_corrected} symbols corrected"
            ),
            LogEvent::FrameDropped { reason, .. } => format!("[{ts}] DROPPED: {reason}"),
            LogEvent::CsmaTimeout { .. } => format!("[{ts}] CSMA wait-for-clear-channel timed out"),
            LogEvent::Info { message } => format!("[{ts}] INFO: {message}"),
            LogEvent::Warn { message } => format!("[{ts}] WARN: {message}"),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("[{ts}] ERROR: {message} | {d}"),
                None => format!("[{ts}] ERROR: {message}"),
            },
        }
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
