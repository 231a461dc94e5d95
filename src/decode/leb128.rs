// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! LEB128 decoding over a byte cursor.
//!
//! An encoding of width W spans at most ceil(W/7) bytes. The terminal byte
//! (continuation bit clear) must zero-extend the value for unsigned types,
//! or sign-extend it for signed types; the maximal-length byte is checked
//! even when its continuation bit is set, so over-long encodings are
//! rejected with the extension diagnostics rather than read past their
//! width.

use core::ops;

use super::{Cursor, Error, Errors, ReadContext};

// A LEB128-decodable integral type.
pub(crate) trait Leb128:
    From<u8>                       //
    + ops::BitOrAssign             //
    + ops::Not<Output = Self>      //
    + ops::Shl<u32, Output = Self> //
{
    const MAX_BITS: u32;
    const IS_SIGNED: bool;

    // The name the type goes by in diagnostics.
    const KIND: &'static str;
}

impl Leb128 for u32 {
    const MAX_BITS: u32 = 32;
    const IS_SIGNED: bool = false;
    const KIND: &'static str = "u32";
}

impl Leb128 for i32 {
    const MAX_BITS: u32 = 32;
    const IS_SIGNED: bool = true;
    const KIND: &'static str = "s32";
}

impl Leb128 for i64 {
    const MAX_BITS: u32 = 64;
    const IS_SIGNED: bool = true;
    const KIND: &'static str = "s64";
}

// Reads a LEB128-encoded value from the cursor, reporting truncation and
// terminal-byte extension failures into the sink.
pub(crate) fn read<T: Leb128, E: Errors>(
    cursor: &mut Cursor<'_>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<T> {
    const CONTENT_MASK: u8 = 0x7f;
    const LAST_CHUNK_MASK: u8 = 0x80;
    const SIGN_EXTEND_MASK: u8 = 0x40;

    let mut value = T::from(0);
    let mut shift = 0u32;
    loop {
        let byte = cursor.read_u8(ctx)?;

        if shift + 7 >= T::MAX_BITS {
            // The maximal-length byte: only `remaining` value bits are
            // left, and the bits above them (including the continuation
            // bit) must extend the value.
            let remaining = T::MAX_BITS - shift;
            if T::IS_SIGNED {
                // The unused bits must be consistent with the sign bit.
                let low_mask = (1u8 << (remaining - 1)) - 1;
                let positive = byte & low_mask;
                let negative = positive | (CONTENT_MASK & !low_mask);
                if byte != positive && byte != negative {
                    ctx.report(
                        cursor.pos(),
                        Error::SignedLebExtension {
                            kind: T::KIND,
                            positive,
                            negative,
                            got: byte,
                        },
                    );
                    return None;
                }
                value |= T::from(byte & ((1u8 << remaining) - 1)) << shift;
            } else {
                // The unused bits must be zero.
                let mask = (1u8 << remaining) - 1;
                if byte & !mask != 0 {
                    ctx.report(
                        cursor.pos(),
                        Error::UnsignedLebExtension {
                            kind: T::KIND,
                            expected: byte & mask,
                            got: byte,
                        },
                    );
                    return None;
                }
                value |= T::from(byte) << shift;
            }
            return Some(value);
        }

        value |= T::from(byte & CONTENT_MASK) << shift;
        shift += 7;

        if byte & LAST_CHUNK_MASK == 0 {
            // Sign extend if this is a signed type and the sign bit is
            // set.
            if T::IS_SIGNED && shift < T::MAX_BITS && byte & SIGN_EXTEND_MASK != 0 {
                value |= !T::from(0) << shift;
            }
            return Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Cursor, ErrorLog, ReadContext};
    use super::*;
    use crate::Features;

    fn read_value<T: Leb128>(data: &[u8]) -> Result<T, Vec<(usize, String)>> {
        let mut errors = ErrorLog::new();
        let mut cursor = Cursor::new(data);
        let mut ctx = ReadContext::new(Features::MVP, &mut errors);
        read::<T, _>(&mut cursor, &mut ctx).ok_or_else(|| errors.errors()[0].trace())
    }

    fn read_u32(data: &[u8]) -> Result<u32, Vec<(usize, String)>> {
        read_value(data)
    }

    fn read_s32(data: &[u8]) -> Result<i32, Vec<(usize, String)>> {
        read_value(data)
    }

    fn read_s64(data: &[u8]) -> Result<i64, Vec<(usize, String)>> {
        read_value(data)
    }

    #[test]
    fn test_u32_values() {
        assert_eq!(read_u32(&[0x20]), Ok(32));
        assert_eq!(read_u32(&[0xc0, 0x03]), Ok(448));
        assert_eq!(read_u32(&[0xd0, 0x84, 0x02]), Ok(33360));
        assert_eq!(read_u32(&[0xa0, 0xb0, 0xc0, 0x30]), Ok(101_718_048));
        assert_eq!(read_u32(&[0xf0, 0xf0, 0xf0, 0xf0, 0x03]), Ok(1_042_036_848));
        assert_eq!(read_u32(&[0xff, 0xff, 0xff, 0xff, 0x0f]), Ok(u32::MAX));
    }

    #[test]
    fn test_u32_non_minimal_is_accepted() {
        assert_eq!(read_u32(&[0x80, 0x00]), Ok(0));
        assert_eq!(read_u32(&[0x82, 0x80, 0x80, 0x80, 0x00]), Ok(2));
    }

    #[test]
    fn test_u32_too_long() {
        assert_eq!(
            read_u32(&[0xf0, 0xf0, 0xf0, 0xf0, 0x12]),
            Err(vec![(
                5,
                "Last byte of u32 must be zero extension: expected 0x2, got 0x12".to_string()
            )])
        );
    }

    #[test]
    fn test_u32_past_end() {
        for data in [
            &[][..],
            &[0xc0],
            &[0xd0, 0x84],
            &[0xa0, 0xb0, 0xc0],
            &[0xf0, 0xf0, 0xf0, 0xf0],
        ] {
            assert_eq!(
                read_u32(data),
                Err(vec![(data.len(), "Unable to read u8".to_string())])
            );
        }
    }

    #[test]
    fn test_s32_values() {
        assert_eq!(read_s32(&[0x20]), Ok(32));
        assert_eq!(read_s32(&[0x70]), Ok(-16));
        assert_eq!(read_s32(&[0xc0, 0x03]), Ok(448));
        assert_eq!(read_s32(&[0xc0, 0x63]), Ok(-3648));
        assert_eq!(read_s32(&[0xd0, 0x84, 0x02]), Ok(33360));
        assert_eq!(read_s32(&[0xd0, 0x84, 0x52]), Ok(-753_072));
        assert_eq!(read_s32(&[0xa0, 0xb0, 0xc0, 0x30]), Ok(101_718_048));
        assert_eq!(read_s32(&[0xa0, 0xb0, 0xc0, 0x70]), Ok(-32_499_680));
        assert_eq!(read_s32(&[0xf0, 0xf0, 0xf0, 0xf0, 0x03]), Ok(1_042_036_848));
        assert_eq!(read_s32(&[0xf0, 0xf0, 0xf0, 0xf0, 0x7c]), Ok(-837_011_344));
    }

    #[test]
    fn test_s32_too_long() {
        assert_eq!(
            read_s32(&[0xf0, 0xf0, 0xf0, 0xf0, 0x15]),
            Err(vec![(
                5,
                "Last byte of s32 must be sign extension: expected 0x5 or 0x7d, got 0x15"
                    .to_string()
            )])
        );
        assert_eq!(
            read_s32(&[0xff, 0xff, 0xff, 0xff, 0x73]),
            Err(vec![(
                5,
                "Last byte of s32 must be sign extension: expected 0x3 or 0x7b, got 0x73"
                    .to_string()
            )])
        );
    }

    #[test]
    fn test_s64_values() {
        assert_eq!(read_s64(&[0x20]), Ok(32));
        assert_eq!(read_s64(&[0x70]), Ok(-16));
        assert_eq!(read_s64(&[0xe0, 0xe0, 0xe0, 0xe0, 0x33]), Ok(13_893_120_096));
        assert_eq!(
            read_s64(&[0xe0, 0xe0, 0xe0, 0xe0, 0x51]),
            Ok(-12_413_554_592)
        );
        assert_eq!(
            read_s64(&[0xd0, 0xd0, 0xd0, 0xd0, 0xd0, 0x2c]),
            Ok(1_533_472_417_872)
        );
        assert_eq!(
            read_s64(&[0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa0, 0xb0, 0x02]),
            Ok(1_338_117_014_066_474)
        );
        assert_eq!(
            read_s64(&[0xfe, 0xed, 0xfe, 0xed, 0xfe, 0xed, 0xfe, 0xed, 0x0e]),
            Ok(1_070_725_794_579_330_814)
        );
        assert_eq!(
            read_s64(&[0xfe, 0xed, 0xfe, 0xed, 0xfe, 0xed, 0xfe, 0xed, 0x4e]),
            Ok(-3_540_960_223_848_057_090)
        );
    }

    #[test]
    fn test_s64_extremes() {
        assert_eq!(
            read_s64(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00]),
            Ok(i64::MAX)
        );
        assert_eq!(
            read_s64(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x7f]),
            Ok(i64::MIN)
        );
        assert_eq!(
            read_s64(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f]),
            Ok(-1)
        );
    }

    #[test]
    fn test_s64_too_long() {
        assert_eq!(
            read_s64(&[0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0]),
            Err(vec![(
                10,
                "Last byte of s64 must be sign extension: expected 0x0 or 0x7f, got 0xf0"
                    .to_string()
            )])
        );
        assert_eq!(
            read_s64(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]),
            Err(vec![(
                10,
                "Last byte of s64 must be sign extension: expected 0x0 or 0x7f, got 0x1"
                    .to_string()
            )])
        );
    }

    #[test]
    fn test_s64_past_end() {
        assert_eq!(
            read_s64(&[0xc0]),
            Err(vec![(1, "Unable to read u8".to_string())])
        );
        assert_eq!(
            read_s64(&[0xfe, 0xed, 0xfe, 0xed, 0xfe, 0xed, 0xfe, 0xed, 0xfe]),
            Err(vec![(9, "Unable to read u8".to_string())])
        );
    }
}
