//! Range-size estimation over variable-length binary keys.
//!
//! A key is read as a big-endian number after padding or truncating it to
//! `cardinality` bytes. Two fixed sentinel bytes (`0x01 0x00`) are prepended so
//! the value is always positive and leading zero bytes are preserved. An open
//! start reads as all-zero bytes, an open end as all-`0xFF` bytes.
//!
//! Ranges of different key lengths are only comparable at a shared
//! cardinality, and widths grow by 256x per extra byte, hence `BigInt`.

use keysplit_core::range::KeyRange;
use num_bigint::{BigInt, Sign};

const SENTINEL: [u8; 2] = [0x01, 0x00];

fn extract_bytes(key: &[u8], cardinality: usize, fill: u8) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(cardinality + SENTINEL.len());
    bytes.extend_from_slice(&SENTINEL);
    for i in 0..cardinality {
        bytes.push(key.get(i).copied().unwrap_or(fill));
    }
    bytes
}

/// Significant bytes needed to compare this range: its longest bound.
pub fn required_cardinality(range: &KeyRange) -> usize {
    range.max_key_len()
}

pub fn start_at(range: &KeyRange, cardinality: usize) -> BigInt {
    let key = range.start.as_deref().unwrap_or(&[]);
    BigInt::from_bytes_be(Sign::Plus, &extract_bytes(key, cardinality, 0x00))
}

pub fn end_at(range: &KeyRange, cardinality: usize) -> BigInt {
    let bytes = match range.end.as_deref() {
        Some(key) => extract_bytes(key, cardinality, 0x00),
        None => extract_bytes(&[], cardinality, 0xFF),
    };
    BigInt::from_bytes_be(Sign::Plus, &bytes)
}

/// `end - start` at `cardinality`.
pub fn magnitude_at(range: &KeyRange, cardinality: usize) -> BigInt {
    end_at(range, cardinality) - start_at(range, cardinality)
}

/// Inverse of `start_at`/`end_at`: the low `cardinality` bytes of `value`,
/// left-padded with zeros.
pub fn key_at(value: &BigInt, cardinality: usize) -> Vec<u8> {
    let (_, digits) = value.to_bytes_be();
    let mut key = vec![0u8; cardinality];
    for (dst, src) in key.iter_mut().rev().zip(digits.iter().rev()) {
        *dst = *src;
    }
    key
}
