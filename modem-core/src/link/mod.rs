//! Link-layer glue: the transmit queue, the data-link queue, and the
//! channel-access sequencer that drains them onto the audio device.

pub mod dlq;
pub mod sequencer;
pub mod txqueue;

pub use dlq::{ChannelData, Dlq, DlqEvent, DlqItem};
pub use sequencer::Sequencer;
pub use txqueue::{TxQueue, PRIO_HI, PRIO_LO};
