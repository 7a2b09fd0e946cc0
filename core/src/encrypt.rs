//! Per-session rolling stream cipher.
//!
//! Each session holds two 8-byte key buffers (`eb` for outbound packets,
//! `db` for inbound packets). Both start from the same 32-bit handshake seed
//! and the same derivation: XOR the seed against two fixed constants,
//! rotate the result 19 bits left, then splat it across the buffer with a
//! per-byte index mix. Because `eb` on one end of a session and `db` on the
//! other both start identical and are advanced with the same four
//! plaintext bytes every packet, the two sides stay in lockstep for the
//! life of the session without exchanging anything beyond the initial seed.
//!
//! A packet is transformed in three steps: an initial XOR of byte 0, a
//! running XOR-chain across the rest of the buffer, and a 4-byte scramble
//! of the header that reverses and re-keys it. Decryption undoes the same
//! three steps in reverse order. Packets shorter than 4 bytes carry no
//! scramble-able header and are left untouched.

const SEED_MIX_A: u32 = 0x4d37_f159;
const SEED_MIX_B: u32 = 0x2c6b_19a7;
const UPDATE_CONST: u32 = 0x1000_0001;

/// One direction's rolling key state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBuffer {
    buf: [u8; 8],
}

impl KeyBuffer {
    fn from_seed(seed: u32) -> Self {
        let mixed = (seed ^ SEED_MIX_A).rotate_left(19) ^ SEED_MIX_B;
        let mut buf = [0u8; 8];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (mixed >> ((i % 4) * 8)) as u8 ^ (i as u8).wrapping_mul(0x9e);
        }
        Self { buf }
    }

    /// Advances the key buffer using the 4 plaintext bytes both sides just
    /// agreed on: XORs them into the low half, and increments the high half
    /// (read as a little-endian counter) by a fixed constant.
    fn update(&mut self, plain_header: &[u8; 4]) {
        for i in 0..4 {
            self.buf[i] ^= plain_header[i];
        }
        let counter = u32::from_le_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]])
            .wrapping_add(UPDATE_CONST);
        self.buf[4..8].copy_from_slice(&counter.to_le_bytes());
    }

    /// Reverses the 4-byte header and re-keys each byte with `buf[2..6]`.
    fn scramble(&self, header: &mut [u8]) {
        let orig = [header[0], header[1], header[2], header[3]];
        for i in 0..4 {
            header[i] = orig[3 - i] ^ self.buf[2 + i];
        }
    }

    /// Inverse of [`Self::scramble`].
    fn unscramble(&self, header: &mut [u8]) {
        let orig = [header[0], header[1], header[2], header[3]];
        for j in 0..4 {
            header[j] = orig[3 - j] ^ self.buf[5 - j];
        }
    }
}

/// Session-scoped cipher: one buffer for outbound (encode), one for inbound
/// (decode). Constructed once from the handshake seed.
#[derive(Clone, Debug)]
pub struct SessionCipher {
    eb: KeyBuffer,
    db: KeyBuffer,
}

impl SessionCipher {
    pub fn new(seed: u32) -> Self {
        Self {
            eb: KeyBuffer::from_seed(seed),
            db: KeyBuffer::from_seed(seed),
        }
    }

    /// Encrypts an outbound packet payload in place. Payloads shorter than
    /// 4 bytes are returned untouched.
    pub fn encrypt(&mut self, data: &mut [u8]) {
        if data.len() < 4 {
            return;
        }
        let scratch = [data[0], data[1], data[2], data[3]];

        data[0] ^= self.eb.buf[0];
        for i in 1..data.len() {
            data[i] ^= data[i - 1] ^ self.eb.buf[i % 8];
        }
        self.eb.scramble(&mut data[0..4]);

        self.eb.update(&scratch);
    }

    /// Decrypts an inbound packet payload in place. Payloads shorter than
    /// 4 bytes are returned untouched.
    pub fn decrypt(&mut self, data: &mut [u8]) {
        if data.len() < 4 {
            return;
        }
        self.db.unscramble(&mut data[0..4]);

        for i in (1..data.len()).rev() {
            data[i] ^= data[i - 1] ^ self.db.buf[i % 8];
        }
        data[0] ^= self.db.buf[0];

        let plain = [data[0], data[1], data[2], data[3]];
        self.db.update(&plain);
    }
}
