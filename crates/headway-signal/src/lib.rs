//! Headway signal crate - sensor line/frame decoding and the transport
//! boundary.
//!
//! The decoder is a pure function of input bytes plus immutable
//! configuration; the transport trait abstracts where those bytes come
//! from. A mock transport and a file-replay transport ship in-crate so
//! the whole stack runs without hardware.

pub mod decoder;
pub mod transport;

pub use decoder::{DecodeError, Decoder, DecoderConfig};
pub use transport::{MockSensorTransport, ReplayTransport, SensorTransport};
