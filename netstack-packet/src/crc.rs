//! CRC-32 checksum
//!
//! The IEEE 802.3 variant (reflected polynomial 0xEDB88320, seeded with all
//! ones, result complemented), as used by the Ethernet frame check sequence.

/// Calculates the CRC-32 of `data`.
///
/// # Examples
///
/// ```
/// use netstack_packet::crc::crc32;
///
/// assert_eq!(crc32(b"123456789"), 0xCBF43926);
/// ```
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(data);
    hasher.finalize()
}

/// Incremental CRC-32 for data that arrives in pieces
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Crc32 {
    pub fn new() -> Self {
        Crc32 {
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// Resume from a previously finalized checksum
    pub fn with_initial(crc: u32) -> Self {
        Crc32 {
            hasher: crc32fast::Hasher::new_with_initial(crc),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_crc32_nul_terminated_fixture() {
        // A C string literal hashed with its terminator is 10 bytes and does
        // not produce the check value.
        assert_eq!(crc32(b"123456789\0"), 0x00C49E49);
    }

    #[test]
    fn test_crc32_empty() {
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn test_crc32_incremental_matches_one_shot() {
        let mut hasher = Crc32::new();
        hasher.update(b"1234");
        hasher.update(b"56789");
        assert_eq!(hasher.finalize(), 0xCBF43926);
    }

    #[test]
    fn test_crc32_resume() {
        let head = crc32(b"12345");
        let mut hasher = Crc32::with_initial(head);
        hasher.update(b"6789");
        assert_eq!(hasher.finalize(), 0xCBF43926);
    }
}
