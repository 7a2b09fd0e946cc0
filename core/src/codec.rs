//! Typed field reader/writer over a packet payload, plus the legacy
//! double-byte text encoding used for chat, names, and item descriptions.
//!
//! Field layout: an opcode byte, then little-endian primitives (`C`=u8/i8,
//! `H`=u16/i16, `D`=u32/i32), then null-terminated legacy text padded to a
//! 4-byte boundary. One handshake-era variant of the writer skips the
//! trailing pad; callers opt into that with [`PacketWriter::skip_padding`].

use crate::errors::GameError;
use crate::string_operations::c_string_to_str;

pub struct PacketReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn opcode(&mut self) -> Result<u8, GameError> {
        self.u8()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], GameError> {
        if self.remaining() < n {
            return Err(GameError::Decode(format!(
                "need {n} bytes, {} remain",
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> Result<u8, GameError> {
        Ok(self.take(1)?[0])
    }

    pub fn i8(&mut self) -> Result<i8, GameError> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn u16(&mut self) -> Result<u16, GameError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> Result<i16, GameError> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32, GameError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32(&mut self) -> Result<i32, GameError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a null-terminated legacy-text field, converts it to UTF-8, and
    /// consumes the trailing zero padding up to the next 4-byte boundary
    /// (measured from the start of the text field).
    pub fn legacy_text(&mut self) -> Result<String, GameError> {
        let start = self.pos;
        let null_at = self.buf[self.pos..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| GameError::Decode("unterminated text field".into()))?;
        let raw = self.take(null_at + 1)?;
        let text = c_string_to_str(raw).to_string();

        let consumed = self.pos - start;
        let pad = (4 - (consumed % 4)) % 4;
        if pad > 0 {
            self.take(pad)?;
        }
        Ok(text)
    }
}

pub struct PacketWriter {
    buf: Vec<u8>,
    skip_padding: bool,
}

impl PacketWriter {
    pub fn new(opcode: u8) -> Self {
        Self {
            buf: vec![opcode],
            skip_padding: false,
        }
    }

    /// Disables 4-byte padding after `legacy_text` writes, matching the
    /// handshake packet's unpadded layout.
    pub fn skip_padding(mut self) -> Self {
        self.skip_padding = true;
        self
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.buf.push(v);
        self
    }

    pub fn i8(self, v: i8) -> Self {
        self.u8(v as u8)
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i16(self, v: i16) -> Self {
        self.u16(v as u16)
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(self, v: i32) -> Self {
        self.u32(v as u32)
    }

    pub fn legacy_text(mut self, s: &str) -> Self {
        let start = self.buf.len();
        for &b in s.as_bytes() {
            self.buf.push(if (32..=126).contains(&b) { b } else { b' ' });
        }
        self.buf.push(0);

        if !self.skip_padding {
            let written = self.buf.len() - start;
            let pad = (4 - (written % 4)) % 4;
            self.buf.extend(std::iter::repeat(0u8).take(pad));
        }
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
