//! Binary envelope used for attachment and file payloads
//!
//! ```text
//! scheme 2: [type:1][iv:16][mac:32][data:N]   N >= 1
//! scheme 0: [type:1][iv:16][data:N]           N >= 1
//! ```

use crate::error::{DecryptError, EnvelopeError};
use crate::scheme::EncryptionScheme;
use crate::service::Encrypted;
use crate::{IV_SIZE, MAC_SIZE};

const MIN_DATA_SIZE: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncArrayBuffer {
    buffer: Vec<u8>,
    scheme: EncryptionScheme,
    iv: Vec<u8>,
    mac: Option<Vec<u8>>,
    data: Vec<u8>,
}

impl EncArrayBuffer {
    pub fn from_bytes(buffer: Vec<u8>) -> Result<Self, EnvelopeError> {
        let tag = *buffer.first().ok_or(EnvelopeError::Empty)?;
        let scheme = EncryptionScheme::from_u8(tag).ok_or(EnvelopeError::UnsupportedScheme(tag))?;

        let (iv, mac, data) = match scheme {
            EncryptionScheme::AesCbc256HmacSha256B64 => {
                let min = 1 + IV_SIZE + MAC_SIZE + MIN_DATA_SIZE;
                if buffer.len() < min {
                    return Err(EnvelopeError::TooShort {
                        len: buffer.len(),
                        min,
                    });
                }
                let iv_end = 1 + IV_SIZE;
                let mac_end = iv_end + MAC_SIZE;
                (
                    buffer[1..iv_end].to_vec(),
                    Some(buffer[iv_end..mac_end].to_vec()),
                    buffer[mac_end..].to_vec(),
                )
            }
            EncryptionScheme::AesCbc256B64 => {
                let min = 1 + IV_SIZE + MIN_DATA_SIZE;
                if buffer.len() < min {
                    return Err(EnvelopeError::TooShort {
                        len: buffer.len(),
                        min,
                    });
                }
                let iv_end = 1 + IV_SIZE;
                (buffer[1..iv_end].to_vec(), None, buffer[iv_end..].to_vec())
            }
            other => return Err(EnvelopeError::UnsupportedScheme(other.as_u8())),
        };

        Ok(Self {
            buffer,
            scheme,
            iv,
            mac,
            data,
        })
    }

    /// Assemble a buffer from components produced by the encryptor.
    pub fn from_parts(
        scheme: EncryptionScheme,
        iv: &[u8],
        mac: Option<&[u8]>,
        data: &[u8],
    ) -> Result<Self, EnvelopeError> {
        if iv.len() != IV_SIZE {
            return Err(EnvelopeError::FieldLength {
                field: "iv",
                len: iv.len(),
                expected: IV_SIZE,
            });
        }
        if let Some(mac) = mac {
            if mac.len() != MAC_SIZE {
                return Err(EnvelopeError::FieldLength {
                    field: "mac",
                    len: mac.len(),
                    expected: MAC_SIZE,
                });
            }
        }

        let mut buffer = Vec::with_capacity(1 + IV_SIZE + MAC_SIZE + data.len());
        buffer.push(scheme.as_u8());
        buffer.extend_from_slice(iv);
        if let Some(mac) = mac {
            buffer.extend_from_slice(mac);
        }
        buffer.extend_from_slice(data);
        Self::from_bytes(buffer)
    }

    pub fn scheme(&self) -> EncryptionScheme {
        self.scheme
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Encrypted for EncArrayBuffer {
    fn scheme(&self) -> Option<EncryptionScheme> {
        Some(self.scheme)
    }

    fn iv_bytes(&self) -> Result<Option<Vec<u8>>, DecryptError> {
        Ok(Some(self.iv.clone()))
    }

    fn data_bytes(&self) -> Result<Vec<u8>, DecryptError> {
        Ok(self.data.clone())
    }

    fn mac_bytes(&self) -> Result<Option<Vec<u8>>, DecryptError> {
        Ok(self.mac.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scheme_2() {
        let mut raw = vec![2u8];
        raw.extend_from_slice(&[1u8; IV_SIZE]);
        raw.extend_from_slice(&[2u8; MAC_SIZE]);
        raw.extend_from_slice(&[3u8; 5]);

        let buf = EncArrayBuffer::from_bytes(raw.clone()).unwrap();
        assert_eq!(buf.scheme(), EncryptionScheme::AesCbc256HmacSha256B64);
        assert_eq!(buf.iv_bytes().unwrap().unwrap(), vec![1u8; IV_SIZE]);
        assert_eq!(buf.mac_bytes().unwrap().unwrap(), vec![2u8; MAC_SIZE]);
        assert_eq!(buf.data_bytes().unwrap(), vec![3u8; 5]);
        assert_eq!(buf.as_bytes(), raw.as_slice());
    }

    #[test]
    fn test_parse_scheme_0() {
        let mut raw = vec![0u8];
        raw.extend_from_slice(&[1u8; IV_SIZE]);
        raw.push(9);

        let buf = EncArrayBuffer::from_bytes(raw).unwrap();
        assert_eq!(buf.mac_bytes().unwrap(), None);
        assert_eq!(buf.data_bytes().unwrap(), vec![9]);
    }

    #[test]
    fn test_minimum_lengths() {
        assert_eq!(
            EncArrayBuffer::from_bytes(vec![2u8; 49]),
            Err(EnvelopeError::TooShort { len: 49, min: 50 })
        );
        assert!(EncArrayBuffer::from_bytes(vec![2u8; 50]).is_ok());
        assert_eq!(
            EncArrayBuffer::from_bytes(vec![0u8; 17]),
            Err(EnvelopeError::TooShort { len: 17, min: 18 })
        );
        assert_eq!(EncArrayBuffer::from_bytes(vec![]), Err(EnvelopeError::Empty));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert_eq!(
            EncArrayBuffer::from_bytes(vec![1u8; 64]),
            Err(EnvelopeError::UnsupportedScheme(1))
        );
        assert_eq!(
            EncArrayBuffer::from_bytes(vec![3u8; 64]),
            Err(EnvelopeError::UnsupportedScheme(3))
        );
        assert_eq!(
            EncArrayBuffer::from_bytes(vec![42u8; 64]),
            Err(EnvelopeError::UnsupportedScheme(42))
        );
    }

    #[test]
    fn test_from_parts_checks_lengths() {
        let err = EncArrayBuffer::from_parts(
            EncryptionScheme::AesCbc256HmacSha256B64,
            &[0u8; 8],
            Some(&[0u8; MAC_SIZE]),
            b"x",
        )
        .unwrap_err();
        assert!(matches!(err, EnvelopeError::FieldLength { field: "iv", .. }));
    }
}
