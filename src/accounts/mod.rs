use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

pub mod curve;
pub mod profile;
pub mod stats;

/// Result type for account decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Error types for fixed-layout account records
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Record truncated: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("Record not initialized")]
    NotInitialized,

    #[error("Mint mismatch: expected {expected}, found {found}")]
    MintMismatch { expected: Pubkey, found: Pubkey },

    #[error("Unknown curve type tag: {0}")]
    UnknownCurveType(u8),
}

// Byte-level readers over raw account data. Offsets come from the layout
// modules next to each record type; every multi-byte integer is little-endian.

/// Read a u64 from a byte slice at the given offset (little-endian).
/// Returns None if there aren't enough bytes.
#[inline]
pub fn read_u64_le(data: &[u8], offset: usize) -> Option<u64> {
    if data.len() < offset + 8 {
        return None;
    }
    let bytes: [u8; 8] = data[offset..offset + 8].try_into().ok()?;
    Some(u64::from_le_bytes(bytes))
}

/// Read a u32 from a byte slice at the given offset (little-endian).
/// Returns None if there aren't enough bytes.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    if data.len() < offset + 4 {
        return None;
    }
    let bytes: [u8; 4] = data[offset..offset + 4].try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

/// Read a u16 from a byte slice at the given offset (little-endian).
/// Returns None if there aren't enough bytes.
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    if data.len() < offset + 2 {
        return None;
    }
    let bytes: [u8; 2] = data[offset..offset + 2].try_into().ok()?;
    Some(u16::from_le_bytes(bytes))
}

/// Read a Pubkey (32 bytes) from a byte slice at the given offset.
/// Returns None if there aren't enough bytes.
#[inline]
pub fn read_pubkey(data: &[u8], offset: usize) -> Option<Pubkey> {
    if data.len() < offset + 32 {
        return None;
    }
    let bytes: [u8; 32] = data[offset..offset + 32].try_into().ok()?;
    Some(Pubkey::from(bytes))
}

/// Read a bool from a byte slice at the given offset.
/// Returns None if there aren't enough bytes.
#[inline]
pub fn read_bool(data: &[u8], offset: usize) -> Option<bool> {
    data.get(offset).map(|&b| b != 0)
}

/// Read a fixed-slot string: slice the slot to `min(stated_len, cap)`, decode
/// as UTF-8 (lossy), then strip trailing zero bytes. The stated length is
/// authoritative; records written before a resize may still zero-pad.
pub fn read_str(data: &[u8], offset: usize, cap: usize, stated_len: usize) -> Option<String> {
    let slot = data.get(offset..offset + cap)?;
    let take = stated_len.min(cap);
    let text = String::from_utf8_lossy(&slot[..take]);
    Some(text.trim_end_matches('\0').to_string())
}

// Writers for the dual encode path. Callers size the buffer from the layout's
// record length, so the offset arithmetic cannot overrun.

#[inline]
pub fn put_u64_le(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn put_u32_le(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn put_u16_le(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn put_pubkey(buf: &mut [u8], offset: usize, key: &Pubkey) {
    buf[offset..offset + 32].copy_from_slice(key.as_ref());
}

/// Write a string into a fixed slot, clamped to the slot capacity, and return
/// the number of bytes written (the stated length for the record).
pub fn put_str(buf: &mut [u8], offset: usize, cap: usize, value: &str) -> usize {
    let bytes = value.as_bytes();
    let take = bytes.len().min(cap);
    buf[offset..offset + take].copy_from_slice(&bytes[..take]);
    take
}
