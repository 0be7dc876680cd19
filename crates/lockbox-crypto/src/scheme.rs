//! Envelope scheme tags. The numeric values are a stable wire contract.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EncryptionScheme {
    AesCbc256B64 = 0,
    AesCbc128HmacSha256B64 = 1,
    AesCbc256HmacSha256B64 = 2,
    Rsa2048OaepSha256B64 = 3,
    Rsa2048OaepSha1B64 = 4,
    Rsa2048OaepSha256HmacSha256B64 = 5,
    Rsa2048OaepSha1HmacSha256B64 = 6,
}

impl EncryptionScheme {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::AesCbc256B64),
            1 => Some(Self::AesCbc128HmacSha256B64),
            2 => Some(Self::AesCbc256HmacSha256B64),
            3 => Some(Self::Rsa2048OaepSha256B64),
            4 => Some(Self::Rsa2048OaepSha1B64),
            5 => Some(Self::Rsa2048OaepSha256HmacSha256B64),
            6 => Some(Self::Rsa2048OaepSha1HmacSha256B64),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Number of `|`-separated segments the canonical form carries for this scheme.
    pub fn segment_count(self) -> usize {
        match self {
            Self::AesCbc256B64 => 2,
            Self::AesCbc128HmacSha256B64 | Self::AesCbc256HmacSha256B64 => 3,
            Self::Rsa2048OaepSha256B64 | Self::Rsa2048OaepSha1B64 => 1,
            Self::Rsa2048OaepSha256HmacSha256B64 | Self::Rsa2048OaepSha1HmacSha256B64 => 2,
        }
    }

    pub fn has_iv(self) -> bool {
        self.is_symmetric()
    }

    pub fn has_mac(self) -> bool {
        matches!(
            self,
            Self::AesCbc128HmacSha256B64
                | Self::AesCbc256HmacSha256B64
                | Self::Rsa2048OaepSha256HmacSha256B64
                | Self::Rsa2048OaepSha1HmacSha256B64
        )
    }

    pub fn is_symmetric(self) -> bool {
        matches!(
            self,
            Self::AesCbc256B64 | Self::AesCbc128HmacSha256B64 | Self::AesCbc256HmacSha256B64
        )
    }
}

impl fmt::Display for EncryptionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}
