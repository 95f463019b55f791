//! Script checksums.

use sha2::{Digest, Sha256};

/// 32-bit integrity value over a script's raw bytes.
pub trait Checksum: Send + Sync {
    /// Compute the checksum of `bytes`.
    fn checksum(&self, bytes: &[u8]) -> u32;
}

/// CRC-32 (ISO-HDLC), the checksum schema history tables conventionally store.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32;

impl Checksum for Crc32 {
    fn checksum(&self, bytes: &[u8]) -> u32 {
        crc32fast::hash(bytes)
    }
}

/// First four bytes of the SHA-256 digest, big-endian.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Truncated;

impl Checksum for Sha256Truncated {
    fn checksum(&self, bytes: &[u8]) -> u32 {
        let digest = Sha256::digest(bytes);
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }
}

impl<F> Checksum for F
where
    F: Fn(&[u8]) -> u32 + Send + Sync,
{
    fn checksum(&self, bytes: &[u8]) -> u32 {
        self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_value() {
        assert_eq!(Crc32.checksum(b"123456789"), 0xCBF4_3926);
        assert_eq!(Crc32.checksum(b""), 0);
    }

    #[test]
    fn test_sha256_truncated_known_value() {
        // sha256("abc") = ba7816bf...
        assert_eq!(Sha256Truncated.checksum(b"abc"), 0xBA78_16BF);
    }

    #[test]
    fn test_checksums_detect_changes() {
        let a = b"CREATE TABLE users();";
        let b = b"DROP TABLE users;";
        assert_eq!(Crc32.checksum(a), Crc32.checksum(a));
        assert_ne!(Crc32.checksum(a), Crc32.checksum(b));
        assert_ne!(Sha256Truncated.checksum(a), Sha256Truncated.checksum(b));
    }

    #[test]
    fn test_closure_checksum() {
        let len = |bytes: &[u8]| bytes.len() as u32;
        assert_eq!(len.checksum(b"four"), 4);
    }
}
