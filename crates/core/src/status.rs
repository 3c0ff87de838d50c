use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server-supplied status discriminator carried in every response envelope.
///
/// The blog API reports outcomes in the body, independently of the HTTP
/// status line. Only a handful of codes carry meaning for the client.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ApiStatus {
    /// `0`: success / token valid.
    Ok,
    /// `1`: business-rule failure, the server supplies a user-facing message.
    BusinessRule,
    /// `2`: the credential is invalid or expired.
    CredentialInvalid,
    /// `7`: the caller lacks the required privilege (or is not signed in).
    Forbidden,
    /// Any other code.
    Other(i64),
}

impl ApiStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::BusinessRule,
            2 => Self::CredentialInvalid,
            7 => Self::Forbidden,
            other => Self::Other(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Ok => 0,
            Self::BusinessRule => 1,
            Self::CredentialInvalid => 2,
            Self::Forbidden => 7,
            Self::Other(code) => *code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<i64> for ApiStatus {
    fn from(value: i64) -> Self {
        Self::from_code(value)
    }
}

impl core::fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok (0)"),
            Self::BusinessRule => write!(f, "business rule (1)"),
            Self::CredentialInvalid => write!(f, "credential invalid (2)"),
            Self::Forbidden => write!(f, "forbidden (7)"),
            Self::Other(code) => write!(f, "status {code}"),
        }
    }
}

impl Serialize for ApiStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for ApiStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::from_code)
    }
}
