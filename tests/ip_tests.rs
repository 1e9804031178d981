//! Tests for IPv4 bitmap addressing over a BigArray
//!
//! These tests verify:
//! - The bit convention: bit index = address value, byte = index >> 3,
//!   mask = 1 << (index & 7)
//! - The range scenario: every address in 0.0.0.0 ..= 0.15.66.63 present,
//!   192.168.0.1 absent

use bigarray::{iputil, BigArray, Config, UNBOUNDED};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Bitmap geometry: 64 KiB pages, 8 KiB windows, ceiling high enough that
/// any IPv4 address is addressable while only touched pages ever exist
fn bitmap_array(dir: &TempDir) -> BigArray {
    BigArray::open(
        Config::builder(dir.path())
            .page_size_in_bytes(64 * 1024)
            .sub_page_size_in_bytes(8 * 1024)
            .max_page_count(8192)
            .max_page_in_mem(UNBOUNDED)
            .max_sub_page_in_mem(4)
            .build(),
    )
    .unwrap()
}

// =============================================================================
// Bit Convention Tests
// =============================================================================

#[test]
fn test_set_bit_lands_in_expected_byte() {
    let dir = TempDir::new().unwrap();
    let array = bitmap_array(&dir);

    let ip = iputil::parse("0.0.0.13").unwrap();
    iputil::set_ip(&array, ip).unwrap();

    // Bit 13: byte 1, mask 1 << 5
    assert_eq!(array.get_byte(1).unwrap(), 1 << 5);
    assert!(iputil::has_ip(&array, ip).unwrap());
    assert!(!iputil::has_ip(&array, ip + 1).unwrap());
}

#[test]
fn test_bits_accumulate_within_a_byte() {
    let dir = TempDir::new().unwrap();
    let array = bitmap_array(&dir);

    for bit in [8u32, 10, 15] {
        iputil::set_ip(&array, bit).unwrap();
    }
    assert_eq!(array.get_byte(1).unwrap(), 0b1000_0101);
    for bit in [8u32, 10, 15] {
        assert!(iputil::has_ip(&array, bit).unwrap());
    }
    for bit in [9u32, 11, 12, 13, 14] {
        assert!(!iputil::has_ip(&array, bit).unwrap());
    }
}

#[test]
fn test_untouched_pages_report_absent() {
    let dir = TempDir::new().unwrap();
    let array = bitmap_array(&dir);

    // No page exists yet; nothing is present
    assert!(!iputil::has_ip(&array, iputil::parse("10.0.0.1").unwrap()).unwrap());
    assert_eq!(array.page_count(), 0);
}

// =============================================================================
// Range Scenario
// =============================================================================

#[test]
fn test_sequential_range_present_and_outsider_absent() {
    let dir = TempDir::new().unwrap();
    let array = bitmap_array(&dir);

    let last = iputil::parse("0.15.66.63").unwrap();
    assert_eq!(last, 999_999);

    for ip in 0..=last {
        iputil::set_ip(&array, ip).unwrap();
    }

    for ip in 0..=last {
        assert!(iputil::has_ip(&array, ip).unwrap(), "{} missing", iputil::format(ip));
    }
    assert!(!iputil::has_ip(&array, last + 1).unwrap());
    assert!(!iputil::has_ip(&array, iputil::parse("192.168.0.1").unwrap()).unwrap());
}

// =============================================================================
// Address File Tests
// =============================================================================

#[test]
fn test_read_ip_file_feeds_trimmed_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("addrs.txt");
    std::fs::write(&path, "1.2.3.4\n\n  5.6.7.8  \n").unwrap();

    let array = bitmap_array(&dir);
    let mut seen = Vec::new();
    iputil::read_ip_file(&path, |line| {
        let ip = iputil::parse(line)?;
        seen.push(line.to_string());
        iputil::set_ip(&array, ip)
    })
    .unwrap();

    assert_eq!(seen, ["1.2.3.4", "5.6.7.8"]);
    assert!(iputil::has_ip(&array, iputil::parse("1.2.3.4").unwrap()).unwrap());
    assert!(iputil::has_ip(&array, iputil::parse("5.6.7.8").unwrap()).unwrap());
}
