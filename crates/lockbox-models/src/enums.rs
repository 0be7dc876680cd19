//! Numeric vault enums. Values are persisted and must not be renumbered.

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Kind of cipher item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CipherType {
    Login = 1,
    SecureNote = 2,
    Card = 3,
    Identity = 4,
}

impl TryFrom<u8> for CipherType {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Login),
            2 => Ok(Self::SecureNote),
            3 => Ok(Self::Card),
            4 => Ok(Self::Identity),
            other => Err(ModelError::UnknownEnumValue {
                kind: "CipherType",
                value: other.into(),
            }),
        }
    }
}

impl From<CipherType> for u8 {
    fn from(value: CipherType) -> Self {
        value as u8
    }
}

/// Kind of custom field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FieldType {
    #[default]
    Text = 0,
    Hidden = 1,
    Boolean = 2,
    /// Value comes from another property of the same cipher
    Linked = 3,
}

impl TryFrom<u8> for FieldType {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Text),
            1 => Ok(Self::Hidden),
            2 => Ok(Self::Boolean),
            3 => Ok(Self::Linked),
            other => Err(ModelError::UnknownEnumValue {
                kind: "FieldType",
                value: other.into(),
            }),
        }
    }
}

impl From<FieldType> for u8 {
    fn from(value: FieldType) -> Self {
        value as u8
    }
}

/// Target of a linked custom field.
///
/// Ranges: login 100.., card 300.., identity 400...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum LinkedId {
    LoginUsername = 100,
    LoginPassword = 101,

    CardCardholderName = 300,
    CardExpMonth = 301,
    CardExpYear = 302,
    CardCode = 303,
    CardBrand = 304,
    CardNumber = 305,

    IdentityTitle = 400,
    IdentityMiddleName = 401,
    IdentityAddress1 = 402,
    IdentityAddress2 = 403,
    IdentityAddress3 = 404,
    IdentityCity = 405,
    IdentityState = 406,
    IdentityPostalCode = 407,
    IdentityCountry = 408,
    IdentityCompany = 409,
    IdentityEmail = 410,
    IdentityPhone = 411,
    IdentitySsn = 412,
    IdentityUsername = 413,
    IdentityPassportNumber = 414,
    IdentityLicenseNumber = 415,
    IdentityFirstName = 416,
    IdentityLastName = 417,
    IdentityFullName = 418,
}

impl TryFrom<u16> for LinkedId {
    type Error = ModelError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        use LinkedId::*;
        let id = match value {
            100 => LoginUsername,
            101 => LoginPassword,
            300 => CardCardholderName,
            301 => CardExpMonth,
            302 => CardExpYear,
            303 => CardCode,
            304 => CardBrand,
            305 => CardNumber,
            400 => IdentityTitle,
            401 => IdentityMiddleName,
            402 => IdentityAddress1,
            403 => IdentityAddress2,
            404 => IdentityAddress3,
            405 => IdentityCity,
            406 => IdentityState,
            407 => IdentityPostalCode,
            408 => IdentityCountry,
            409 => IdentityCompany,
            410 => IdentityEmail,
            411 => IdentityPhone,
            412 => IdentitySsn,
            413 => IdentityUsername,
            414 => IdentityPassportNumber,
            415 => IdentityLicenseNumber,
            416 => IdentityFirstName,
            417 => IdentityLastName,
            418 => IdentityFullName,
            other => {
                return Err(ModelError::UnknownEnumValue {
                    kind: "LinkedId",
                    value: other.into(),
                })
            }
        };
        Ok(id)
    }
}

impl From<LinkedId> for u16 {
    fn from(value: LinkedId) -> Self {
        value as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_type_wire_value() {
        assert_eq!(serde_json::to_string(&CipherType::Card).unwrap(), "3");
        let t: CipherType = serde_json::from_str("4").unwrap();
        assert_eq!(t, CipherType::Identity);
        assert!(serde_json::from_str::<CipherType>("9").is_err());
    }

    #[test]
    fn test_linked_id_ranges() {
        for raw in (100u16..=101).chain(300..=305).chain(400..=418) {
            let id = LinkedId::try_from(raw).unwrap();
            assert_eq!(u16::from(id), raw);
        }
        assert!(LinkedId::try_from(102).is_err());
        assert!(LinkedId::try_from(419).is_err());
    }
}
