//! IPv4 Bitmap Helpers
//!
//! Bit-addressing over a [`BigArray`]: each IPv4 address is one bit, the
//! array is the bitmap. An address parses to a `u32`; that value is the bit
//! index, `index >> 3` the containing byte, `1 << (index & 7)` the mask.
//! The byte layout lines up with the array's big-endian int encoding, so
//! ints and bitmap bytes can alias the same pages.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::Ipv4Addr;
use std::path::Path;

use crate::array::BigArray;
use crate::error::{BigArrayError, Result};

/// Parse a dotted-quad address into its 32-bit value
pub fn parse(ip: &str) -> Result<u32> {
    let addr: Ipv4Addr = ip
        .trim()
        .parse()
        .map_err(|_| BigArrayError::Config(format!("invalid ip: {}", ip)))?;
    Ok(u32::from(addr))
}

/// Format a 32-bit value back into dotted-quad notation
pub fn format(bits: u32) -> String {
    Ipv4Addr::from(bits).to_string()
}

/// Byte index holding the bit for `ip`
pub fn byte_indicator(ip: u32) -> u64 {
    (ip >> 3) as u64
}

/// Mask selecting the bit for `ip` within its byte
pub fn byte_mask(ip: u32) -> u8 {
    1 << (ip & 7)
}

/// Mark `ip` present in the bitmap
pub fn set_ip(array: &BigArray, ip: u32) -> Result<()> {
    let index = byte_indicator(ip);
    let current = array.get_or_put_byte(index)?;
    array.put_byte(index, current | byte_mask(ip))
}

/// Whether `ip` is marked present; untouched pages count as absent
pub fn has_ip(array: &BigArray, ip: u32) -> Result<bool> {
    let index = byte_indicator(ip);
    match array.get_byte(index) {
        Ok(byte) => Ok(byte & byte_mask(ip) != 0),
        Err(BigArrayError::IndexOutOfRange(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Feed every non-empty line of an address list file to `processor`
pub fn read_ip_file(path: impl AsRef<Path>, mut processor: impl FnMut(&str) -> Result<()>) -> Result<()> {
    let file = File::open(path.as_ref())?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            processor(line)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_round_trip() {
        assert_eq!(parse("0.0.0.0").unwrap(), 0);
        assert_eq!(parse("0.0.0.1").unwrap(), 1);
        assert_eq!(parse("192.168.0.1").unwrap(), 0xC0A8_0001);
        assert_eq!(format(0xC0A8_0001), "192.168.0.1");
        assert_eq!(format(parse("255.255.255.255").unwrap()), "255.255.255.255");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse("not-an-ip"), Err(BigArrayError::Config(_))));
        assert!(matches!(parse("1.2.3"), Err(BigArrayError::Config(_))));
        assert!(matches!(parse("256.0.0.1"), Err(BigArrayError::Config(_))));
    }

    #[test]
    fn test_bit_addressing() {
        // 0.0.0.8 is bit 8: second byte, lowest bit
        assert_eq!(byte_indicator(8), 1);
        assert_eq!(byte_mask(8), 0b0000_0001);
        // 0.0.0.15 is bit 15: second byte, highest bit
        assert_eq!(byte_indicator(15), 1);
        assert_eq!(byte_mask(15), 0b1000_0000);
    }
}
