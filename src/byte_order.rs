//! Helpers for explicit byte-order conversions.
//!
//! Feedback reports travel in network byte order while stream packet headers
//! use little-endian. These helpers keep Clippy expectations scoped to the
//! conversion points so protocol code stays explicit about wire endianness
//! without repeating lint annotations.

/// Serialise a `u32` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use framecast::byte_order::write_network_u32;
///
/// assert_eq!(write_network_u32(0x5254_4650), *b"RTFP");
/// ```
#[must_use]
pub fn write_network_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u32` from its on-wire representation.
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes(bytes)
}

/// Serialise a `u64` in network byte order (big-endian).
#[must_use]
pub fn write_network_u64(value: u64) -> [u8; 8] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u64` from its on-wire representation.
#[must_use]
pub fn read_network_u64(bytes: [u8; 8]) -> u64 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u64::from_be_bytes(bytes)
}

/// Serialise an IEEE-754 `f64` in network byte order.
///
/// # Examples
///
/// ```
/// use framecast::byte_order::{read_network_f64, write_network_f64};
///
/// assert_eq!(read_network_f64(write_network_f64(1.5)), 1.5);
/// ```
#[must_use]
pub fn write_network_f64(value: f64) -> [u8; 8] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `f64` from its on-wire representation.
#[must_use]
pub fn read_network_f64(bytes: [u8; 8]) -> f64 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    f64::from_be_bytes(bytes)
}

/// Serialise a `u32` in little-endian order.
#[must_use]
pub fn write_le_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Stream packet headers are little-endian."
    )]
    value.to_le_bytes()
}

/// Parse a little-endian `u32`.
#[must_use]
pub fn read_le_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Stream packet headers are little-endian."
    )]
    u32::from_le_bytes(bytes)
}

/// Serialise a `u64` in little-endian order.
#[must_use]
pub fn write_le_u64(value: u64) -> [u8; 8] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Stream packet headers are little-endian."
    )]
    value.to_le_bytes()
}

/// Parse a little-endian `u64`.
#[must_use]
pub fn read_le_u64(bytes: [u8; 8]) -> u64 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Stream packet headers are little-endian."
    )]
    u64::from_le_bytes(bytes)
}

/// Serialise an `f64` in little-endian order.
#[must_use]
pub fn write_le_f64(value: f64) -> [u8; 8] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Stream packet headers are little-endian."
    )]
    value.to_le_bytes()
}

/// Parse a little-endian `f64`.
#[must_use]
pub fn read_le_f64(bytes: [u8; 8]) -> f64 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Stream packet headers are little-endian."
    )]
    f64::from_le_bytes(bytes)
}
