//! Minimal RLP encoder, enough to serialize legacy transactions.

use ethereum_types::{Address, U256};

pub trait RLPEncode {
    fn encode(&self, buf: &mut Vec<u8>);

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}

fn encode_length(len: usize, offset: u8, buf: &mut Vec<u8>) {
    if len < 56 {
        // `len` < 56 so the sum always fits in a byte.
        buf.push(offset + len as u8);
    } else {
        let be = len.to_be_bytes();
        let start = be.iter().position(|b| *b != 0).unwrap_or(be.len() - 1);
        let len_bytes = &be[start..];
        buf.push(offset + 55 + len_bytes.len() as u8);
        buf.extend_from_slice(len_bytes);
    }
}

impl RLPEncode for [u8] {
    fn encode(&self, buf: &mut Vec<u8>) {
        if self.len() == 1 && self[0] < 0x80 {
            buf.push(self[0]);
        } else {
            encode_length(self.len(), 0x80, buf);
            buf.extend_from_slice(self);
        }
    }
}

impl RLPEncode for bytes::Bytes {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.as_ref().encode(buf)
    }
}

impl RLPEncode for u64 {
    fn encode(&self, buf: &mut Vec<u8>) {
        let be = self.to_be_bytes();
        let start = be.iter().position(|b| *b != 0).unwrap_or(be.len());
        be[start..].encode(buf)
    }
}

impl RLPEncode for U256 {
    fn encode(&self, buf: &mut Vec<u8>) {
        let be = self.to_big_endian();
        let start = be.iter().position(|b| *b != 0).unwrap_or(be.len());
        be[start..].encode(buf)
    }
}

impl RLPEncode for Address {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.as_bytes().encode(buf)
    }
}

impl<T: RLPEncode> RLPEncode for Option<T> {
    /// `None` encodes as the empty string, as used for contract-creation `to`.
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Some(value) => value.encode(buf),
            None => buf.push(0x80),
        }
    }
}

/// Builds an RLP list from already encoded fields.
#[derive(Default)]
pub struct Encoder {
    payload: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode_field<T: RLPEncode + ?Sized>(mut self, value: &T) -> Self {
        value.encode(&mut self.payload);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 9);
        encode_length(self.payload.len(), 0xc0, &mut out);
        out.extend_from_slice(&self.payload);
        out
    }
}
