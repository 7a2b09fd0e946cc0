//! Length-prefixed frame codec.
//!
//! Wire shape: `[2 bytes LE total length, header included][payload]`.
//! `total length` must satisfy `MIN_FRAME_LEN <= len <= MAX_FRAME_LEN`.

use crate::constants::{MAX_FRAME_LEN, MIN_FRAME_LEN};
use crate::errors::GameError;
use std::io::{self, Read, Write};

/// Reads one frame from `r`, returning the payload (header stripped).
pub fn read_frame<R: Read>(r: &mut R) -> Result<Vec<u8>, GameError> {
    let mut len_buf = [0u8; 2];
    r.read_exact(&mut len_buf)
        .map_err(|e| map_eof(e, "short read of frame header"))?;
    let total_len = u16::from_le_bytes(len_buf) as usize;

    if total_len < MIN_FRAME_LEN || total_len > MAX_FRAME_LEN {
        return Err(GameError::Framing(format!(
            "invalid frame length {total_len}"
        )));
    }

    let payload_len = total_len - 2;
    let mut payload = vec![0u8; payload_len];
    r.read_exact(&mut payload)
        .map_err(|e| map_eof(e, "short read of frame payload"))?;
    Ok(payload)
}

/// Writes `payload` as one frame to `w`. Fails if the resulting frame would
/// exceed `MAX_FRAME_LEN`.
pub fn write_frame<W: Write>(w: &mut W, payload: &[u8]) -> Result<(), GameError> {
    let total_len = payload.len() + 2;
    if total_len > MAX_FRAME_LEN {
        return Err(GameError::Framing(format!(
            "frame too large: {total_len} bytes"
        )));
    }
    let mut buf = Vec::with_capacity(total_len);
    buf.extend_from_slice(&(total_len as u16).to_le_bytes());
    buf.extend_from_slice(payload);
    w.write_all(&buf)
        .map_err(|e| GameError::Framing(format!("short write: {e}")))
}

fn map_eof(e: io::Error, msg: &str) -> GameError {
    GameError::Framing(format!("{msg}: {e}"))
}
