//! Minimal protobuf cursor used by the tile, layer and feature decoders.
//!
//! Varints and field keys are read with `prost::encoding`; everything else is
//! a bounds-checked slice split, so sub-messages borrow from the tile buffer
//! without copying.

use prost::bytes::Buf;
use prost::encoding::{decode_key, decode_varint, WireType};

use crate::error::WireError;

#[derive(Debug, Clone, Copy)]
pub struct PbfReader<'a> {
    buf: &'a [u8],
}

impl<'a> PbfReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Next field key, or `None` once the message is exhausted.
    pub fn next_field(&mut self) -> Result<Option<(u32, WireType)>, WireError> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        let key = decode_key(&mut self.buf)?;
        Ok(Some(key))
    }

    pub fn varint(&mut self) -> Result<u64, WireError> {
        Ok(decode_varint(&mut self.buf)?)
    }

    pub fn varint_u32(&mut self) -> Result<u32, WireError> {
        let value = self.varint()?;
        u32::try_from(value).map_err(|_| WireError::Overflow(value))
    }

    pub fn bytes(&mut self) -> Result<&'a [u8], WireError> {
        let len = self.varint()?;
        let len = usize::try_from(len).map_err(|_| WireError::Overflow(len))?;
        self.take(len)
    }

    pub fn message(&mut self) -> Result<PbfReader<'a>, WireError> {
        self.bytes().map(PbfReader::new)
    }

    pub fn string(&mut self) -> Result<&'a str, WireError> {
        let raw = self.bytes()?;
        Ok(std::str::from_utf8(raw)?)
    }

    pub fn float(&mut self) -> Result<f32, WireError> {
        let mut raw = self.take(4)?;
        Ok(raw.get_f32_le())
    }

    pub fn double(&mut self) -> Result<f64, WireError> {
        let mut raw = self.take(8)?;
        Ok(raw.get_f64_le())
    }

    /// Appends a repeated uint32 field to `out`, accepting both the packed
    /// and the one-value-per-key encodings.
    pub fn repeated_u32(&mut self, wire_type: WireType, out: &mut Vec<u32>) -> Result<(), WireError> {
        match wire_type {
            WireType::LengthDelimited => {
                let mut packed = self.message()?;
                while !packed.is_empty() {
                    out.push(packed.varint_u32()?);
                }
                Ok(())
            }
            WireType::Varint => {
                out.push(self.varint_u32()?);
                Ok(())
            }
            other => Err(WireError::UnsupportedWireType(format!("{:?}", other))),
        }
    }

    pub fn skip(&mut self, wire_type: WireType) -> Result<(), WireError> {
        match wire_type {
            WireType::Varint => self.varint().map(|_| ()),
            WireType::SixtyFourBit => self.take(8).map(|_| ()),
            WireType::LengthDelimited => self.bytes().map(|_| ()),
            WireType::ThirtyTwoBit => self.take(4).map(|_| ()),
            other => Err(WireError::UnsupportedWireType(format!("{:?}", other))),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if len > self.buf.len() {
            return Err(WireError::Truncated {
                needed: len,
                remaining: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }
}
