mod config;
mod logging;
mod wav;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};

use config::CliConfig;
use logging::{LogEvent, StructuredLogger};
use modem_core::ax25::{Address, Packet, PID_NO_LAYER_3};
use modem_core::dsp::{Demodulator, Modulator};
use modem_core::il2p::{decode_frame, encode_frame, BitReceiver, BitReceiverEvent};

fn format_addr(addr: &Address) -> String {
    if addr.ssid == 0 {
        addr.callsign.clone()
    } else {
        format!("{}-{}", addr.callsign, addr.ssid)
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "QPSK/IL2P packet-radio modem core CLI", long_about = None)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose (debug-level) logging, overriding the config file.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a message into an IL2P/AX.25 frame, modulate it, and write
    /// the resulting QPSK audio to a WAV file.
    Tx {
        /// Text payload to encode.
        #[arg(short, long)]
        message: String,
        /// Source callsign, optionally with an SSID suffix (e.g. N0CALL-1).
        #[arg(long, default_value = "N0CALL")]
        source: String,
        /// Destination callsign, optionally with an SSID suffix.
        #[arg(long, default_value = "CQ")]
        destination: String,
        /// WAV file to write (overrides the config file's terminal.wav_output).
        #[arg(short = 'w', long)]
        wav_output: Option<PathBuf>,
    },
    /// Read QPSK audio from a WAV file and decode any IL2P frames found.
    Rx {
        /// WAV file to read.
        #[arg(short = 'i', long)]
        wav_input: PathBuf,
    },
    /// Encode, modulate, demodulate, and decode a message in memory, with
    /// no file I/O, to demonstrate the full round trip.
    Demo {
        /// Text payload to encode.
        #[arg(short, long)]
        message: String,
        /// Source callsign, optionally with an SSID suffix.
        #[arg(long, default_value = "N0CALL")]
        source: String,
        /// Destination callsign, optionally with an SSID suffix.
        #[arg(long, default_value = "CQ")]
        destination: String,
    },
}

fn parse_address(spec: &str) -> Result<Address> {
    let (callsign, ssid) = match spec.split_once('-') {
        Some((call, ssid)) => (
            call,
            ssid.parse::<u8>()
                .wrap_err_with(|| format!("invalid SSID in {spec:?}"))?,
        ),
        None => (spec, 0),
    };
    Address::new(callsign, ssid).map_err(|e| eyre!("invalid address {spec:?}: {e}"))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => CliConfig::from_file(path)
            .wrap_err_with(|| format!("Failed to load config from {path}"))?,
        None => CliConfig::default(),
    };

    if args.verbose {
        config.terminal.logging.level = config::LogLevel::Debug;
    }

    config.modem.wire.validate().wrap_err("invalid wire configuration")?;
    config
        .modem
        .channel_access
        .validate()
        .wrap_err("invalid channel-access configuration")?;

    let mut logger = StructuredLogger::new(config.terminal.logging.clone())?;

    match args.command {
        Command::Tx {
            message,
            source,
            destination,
            wav_output,
        } => run_tx(&config, &mut logger, &message, &source, &destination, wav_output.or(config.terminal.wav_output.clone())),
        Command::Rx { wav_input } => run_rx(&config, &mut logger, &wav_input),
        Command::Demo {
            message,
            source,
            destination,
        } => run_demo(&config, &mut logger, &message, &source, &destination),
    }
}

fn run_tx(
    config: &CliConfig,
    logger: &mut StructuredLogger,
    message: &str,
    source: &str,
    destination: &str,
    wav_output: Option<PathBuf>,
) -> Result<()> {
    let wav_output = wav_output.ok_or_else(|| eyre!("--wav-output is required for tx"))?;

    let src = parse_address(source)?;
    let dest = parse_address(destination)?;
    let packet = Packet::new_ui(dest, src, PID_NO_LAYER_3, message.as_bytes().to_vec())
        .map_err(|e| eyre!("failed to build packet: {e}"))?;

    logger.log(LogEvent::Info {
        message: format!("encoding {} byte message from {source} to {destination}", message.len()),
    })?;

    let frame = encode_frame(&packet).map_err(|e| eyre!("IL2P encode failed: {e}"))?;
    let bits = modem_core::utils::bytes_to_bitstream(&frame);

    let mut modulator = Modulator::new(&config.modem.wire).map_err(|e| eyre!("{e}"))?;
    let pcm = modulator.modulate_bits(&bits);

    let mut sink = wav::WavSink::new(config.modem.wire.sample_rate);
    {
        use modem_core::audio::AudioSink;
        sink.write(&pcm);
    }
    sink.finalize(&wav_output)?;

    logger.log(LogEvent::Info {
        message: format!("wrote {} PCM bytes to {}", pcm.len(), wav_output.display()),
    })?;
    Ok(())
}

fn run_rx(config: &CliConfig, logger: &mut StructuredLogger, wav_input: &PathBuf) -> Result<()> {
    use modem_core::audio::AudioSource;

    let mut source = wav::WavSource::open(wav_input)?;
    let mut demod = Demodulator::new(&config.modem.wire, &config.modem.costas).map_err(|e| eyre!("{e}"))?;
    let mut rx = BitReceiver::new();

    let block_len = config.modem.wire.samples_per_symbol() * 4;
    let mut buf = vec![0u8; block_len];
    let mut decoded = 0usize;

    loop {
        let n = source.read(&mut buf);
        if n < block_len {
            break;
        }
        let result = demod.process_block(&buf);
        if result.frequency_lock_lost {
            logger.log(LogEvent::Warn {
                message: format!("frequency lock lost, offset {:.1} Hz", result.offset_hz),
            })?;
            break;
        }
        let Some(dibit) = result.dibit else { continue };
        for bit in [dibit >> 1, dibit & 1] {
            match rx.push_bit(bit) {
                Some(BitReceiverEvent::Frame { packet, symbols_corrected }) => {
                    decoded += 1;
                    logger.log(LogEvent::FrameDecoded {
                        timestamp: chrono::Utc::now(),
                        source: format_addr(&packet.source),
                        destination: format_addr(&packet.destination),
                        info_len: packet.info().len(),
                        symbols_corrected,
                    })?;
                    println!("{}", String::from_utf8_lossy(packet.info()));
                }
                Some(BitReceiverEvent::Dropped) => {
                    logger.log(LogEvent::FrameDropped {
                        timestamp: chrono::Utc::now(),
                        reason: "RS correction failed or address invalid".to_string(),
                    })?;
                }
                None => {}
            }
        }
    }

    logger.log(LogEvent::Info {
        message: format!("decoded {decoded} frame(s) in {:.2}s", logger.elapsed()),
    })?;
    Ok(())
}

fn run_demo(
    config: &CliConfig,
    logger: &mut StructuredLogger,
    message: &str,
    source: &str,
    destination: &str,
) -> Result<()> {
    let src = parse_address(source)?;
    let dest = parse_address(destination)?;
    let packet = Packet::new_ui(dest, src, PID_NO_LAYER_3, message.as_bytes().to_vec())
        .map_err(|e| eyre!("failed to build packet: {e}"))?;

    let frame = encode_frame(&packet).map_err(|e| eyre!("IL2P encode failed: {e}"))?;
    let (decoded_direct, corrected) = decode_frame(&frame).map_err(|e| eyre!("IL2P decode failed: {e}"))?;
    logger.log(LogEvent::Info {
        message: format!(
            "direct frame round trip: {} bytes, {corrected} symbols corrected",
            decoded_direct.info().len()
        ),
    })?;

    let bits = modem_core::utils::bytes_to_bitstream(&frame);
    let mut modulator = Modulator::new(&config.modem.wire).map_err(|e| eyre!("{e}"))?;
    let pcm = modulator.modulate_bits(&bits);

    let mut demod = Demodulator::new(&config.modem.wire, &config.modem.costas).map_err(|e| eyre!("{e}"))?;
    let mut rx = BitReceiver::new();
    let block_len = config.modem.wire.samples_per_symbol() * 4;

    let mut recovered = None;
    for block in pcm.chunks_exact(block_len) {
        let result = demod.process_block(block);
        let Some(dibit) = result.dibit else { continue };
        for bit in [dibit >> 1, dibit & 1] {
            match rx.push_bit(bit) {
                Some(BitReceiverEvent::Frame { packet, symbols_corrected }) => {
                    logger.log(LogEvent::FrameDecoded {
                        timestamp: chrono::Utc::now(),
                        source: format_addr(&packet.source),
                        destination: format_addr(&packet.destination),
                        info_len: packet.info().len(),
                        symbols_corrected,
                    })?;
                    recovered = Some(packet);
                }
                Some(BitReceiverEvent::Dropped) => {
                    logger.log(LogEvent::FrameDropped {
                        timestamp: chrono::Utc::now(),
                        reason: "RS correction failed or address invalid".to_string(),
                    })?;
                }
                None => {}
            }
        }
    }

    match recovered {
        Some(packet) => println!("recovered: {}", String::from_utf8_lossy(packet.info())),
        None => logger.log(LogEvent::Warn {
            message: "no frame recovered through the modulated/demodulated round trip".to_string(),
        })?,
    }

    Ok(())
}
