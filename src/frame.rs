//! Framing of requests and responses.
//!
//! A frame is a run of bytes followed by one checksum byte holding the sum of
//! all preceding bytes modulo 256. There is no length field, each command
//! defines the size of its response.

use crate::protocol::Error;

/// Sum of `bytes` modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// Builds a frame from command bytes and payload, appending the checksum.
pub fn encode_frame(command: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(command.len() + payload.len() + 1);
    frame.extend_from_slice(command);
    frame.extend_from_slice(payload);
    frame.push(checksum(&frame));
    frame
}

/// Verifies the trailing checksum and returns the bytes in front of it.
pub fn decode_frame(raw: &[u8]) -> Result<&[u8], Error> {
    let (actual, body) = raw.split_last().ok_or(Error::FrameLength {
        expected: 1,
        actual: 0,
    })?;
    let expected = checksum(body);
    if expected == *actual {
        Ok(body)
    } else {
        Err(Error::ChecksumMismatch {
            expected,
            actual: *actual,
        })
    }
}
