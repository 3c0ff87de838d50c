use serde::{Deserialize, Serialize};

use blogdesk_core::UserId;

/// Denormalized profile of the signed-in user.
///
/// A fresh session holds the default value (empty strings, id `0`). The
/// record is only ever updated through [`Principal::merge`] because
/// validation responses may carry a subset of the fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub ip: String,
    pub name: String,
    pub role: String,
    pub sex: String,
    pub avatar: String,
    #[serde(rename = "nick_name", alias = "nickName")]
    pub nickname: String,
}

/// Partial principal as returned by the validation / profile endpoints.
///
/// Absent fields leave the current value untouched when merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrincipalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(
        rename = "nick_name",
        alias = "nickName",
        skip_serializing_if = "Option::is_none"
    )]
    pub nickname: Option<String>,
}

impl PrincipalPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Principal {
    /// Apply every field present in `patch`.
    pub fn merge(&mut self, patch: PrincipalPatch) {
        let PrincipalPatch {
            id,
            email,
            ip,
            name,
            role,
            sex,
            avatar,
            nickname,
        } = patch;

        if let Some(id) = id {
            self.id = id;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(ip) = ip {
            self.ip = ip;
        }
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(role) = role {
            self.role = role;
        }
        if let Some(sex) = sex {
            self.sex = sex;
        }
        if let Some(avatar) = avatar {
            self.avatar = avatar;
        }
        if let Some(nickname) = nickname {
            self.nickname = nickname;
        }
    }

    /// Whether the record still holds its default (never populated) value.
    pub fn is_anonymous(&self) -> bool {
        *self == Self::default()
    }
}
