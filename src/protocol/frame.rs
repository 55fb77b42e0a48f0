//! Length-prefixed frames.
//!
//! A frame is four ASCII decimal digits holding the payload length,
//! followed by the payload itself: `0019{"fake":"response"}`.

use std::io::Write;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{BrokerError, BrokerResult, ProtocolErrorKind};

use super::format;

/// Width of the decimal length prefix.
pub const PREFIX_LEN: usize = 4;

/// Largest payload a four-digit prefix can describe.
pub const MAX_PAYLOAD_SIZE: usize = 9999;

/// A single framed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    length_prefix: [u8; PREFIX_LEN],
    payload: Vec<u8>,
}

impl Frame {
    /// Serialize a value into a frame.
    pub fn build<T>(value: &T) -> BrokerResult<Self>
    where
        T: ?Sized + Serialize,
    {
        Self::from_payload(format::to_vec(value)?)
    }

    /// Wrap already-encoded payload bytes.
    pub fn from_payload(payload: Vec<u8>) -> BrokerResult<Self> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(BrokerError::protocol(ProtocolErrorKind::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            }));
        }

        let mut length_prefix = [0u8; PREFIX_LEN];
        length_prefix.copy_from_slice(format!("{:04}", payload.len()).as_bytes());

        Ok(Self {
            length_prefix,
            payload,
        })
    }

    /// The raw four-byte prefix.
    pub fn length_prefix(&self) -> &[u8; PREFIX_LEN] {
        &self.length_prefix
    }

    /// The payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The payload length as encoded in the prefix.
    pub fn unpack_length(&self) -> usize {
        digits_value(&self.length_prefix)
    }

    /// The exact bytes that cross the wire.
    pub fn output(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PREFIX_LEN + self.payload.len());
        out.extend_from_slice(&self.length_prefix);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse the payload as untyped JSON.
    pub fn json(&self) -> BrokerResult<serde_json::Value> {
        self.parse()
    }

    /// Parse the payload into a typed value.
    pub fn parse<T: DeserializeOwned>(&self) -> BrokerResult<T> {
        serde_json::from_slice(&self.payload).map_err(|e| {
            BrokerError::protocol(ProtocolErrorKind::InvalidJson {
                message: e.to_string(),
            })
        })
    }

    /// Write the frame to a blocking sink.
    pub fn write<W: Write + ?Sized>(&self, sink: &mut W) -> BrokerResult<()> {
        sink.write_all(&self.output())?;
        sink.flush()?;
        Ok(())
    }

    /// Write the frame to an async sink and wait for the flush.
    pub async fn async_write<W>(&self, sink: &mut W) -> BrokerResult<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        sink.write_all(&self.output()).await?;
        sink.flush().await?;
        Ok(())
    }

    /// Read one frame from an async source.
    ///
    /// A source that ends before the prefix or the declared payload is
    /// complete is a protocol error; partial frames are never resumed.
    pub async fn async_read<R>(source: &mut R) -> BrokerResult<Self>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut length_prefix = [0u8; PREFIX_LEN];
        match source.read_exact(&mut length_prefix).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(BrokerError::protocol(ProtocolErrorKind::ConnectionClosed));
            }
            Err(e) => return Err(BrokerError::Io(e)),
        }

        let len = decode_prefix(&length_prefix)?;

        let mut payload = vec![0u8; len];
        match source.read_exact(&mut payload).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(BrokerError::protocol(ProtocolErrorKind::TruncatedFrame {
                    expected: len,
                }));
            }
            Err(e) => return Err(BrokerError::Io(e)),
        }

        Ok(Self {
            length_prefix,
            payload,
        })
    }
}

fn decode_prefix(prefix: &[u8; PREFIX_LEN]) -> BrokerResult<usize> {
    if !prefix.iter().all(u8::is_ascii_digit) {
        return Err(BrokerError::protocol(ProtocolErrorKind::InvalidLengthPrefix {
            prefix: String::from_utf8_lossy(prefix).into_owned(),
        }));
    }
    Ok(digits_value(prefix))
}

fn digits_value(digits: &[u8]) -> usize {
    digits
        .iter()
        .fold(0, |acc, digit| acc * 10 + usize::from(digit - b'0'))
}
