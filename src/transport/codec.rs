//! NDJSON codec for the server's stdio streams.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a maximum line length so a
//! server that never terminates a line cannot make the probe buffer without
//! bound.
//!
//! # Usage
//!
//! Use [`ProbeCodec`] with [`tokio_util::codec::FramedRead`] over the
//! server's stdout and [`tokio_util::codec::FramedWrite`] over its stdin.
//!
//! ```rust,ignore
//! use tokio_util::codec::FramedRead;
//! use yr_weather_probe::transport::codec::ProbeCodec;
//!
//! let lines = FramedRead::new(child_stdout, ProbeCodec::new());
//! ```

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Maximum line length accepted from the server: 1 MiB.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Line codec for JSON-RPC traffic.
///
/// Each `\n`-terminated UTF-8 string is one complete message. A trailing
/// `\r` is stripped on decode.
///
/// # Decoder
///
/// Lines longer than [`MAX_LINE_BYTES`] yield
/// [`AppError::Protocol`]`("line too long: …")`. I/O failures map to
/// [`AppError::Io`].
///
/// # Encoder
///
/// Outbound strings are written as `item\n`; the length limit is not
/// enforced on encode.
#[derive(Debug)]
pub struct ProbeCodec(LinesCodec);

impl ProbeCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_BYTES))
    }
}

impl Default for ProbeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ProbeCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode(src).map_err(map_codec_error)
    }

    /// A final unterminated line is still delivered at EOF.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode_eof(src).map_err(map_codec_error)
    }
}

impl Encoder<String> for ProbeCodec {
    type Error = AppError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        self.0.encode(item, dst).map_err(map_codec_error)
    }
}

fn map_codec_error(e: LinesCodecError) -> AppError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            AppError::Protocol(format!("line too long: exceeded {MAX_LINE_BYTES} bytes"))
        }
        LinesCodecError::Io(io_err) => AppError::Io(io_err.to_string()),
    }
}
