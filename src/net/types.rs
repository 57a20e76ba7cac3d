//! Wire DTOs for login payloads, verification replies, and the cached user.
//!
//! DESIGN
//! ======
//! Backends disagree on field spelling (`_id` vs `id`, numeric vs string
//! hotel ids, missing roles), so deserialization is lenient and normalizes
//! everything into one `UserRecord` shape. Serialization always produces the
//! canonical camelCase form that is cached under the `user` storage key.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LoginError;

/// Account role. Unknown role names normalize to [`Role::User`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Seller,
    Hotel,
    Admin,
}

impl Role {
    /// Parse a role name case-insensitively, defaulting to `User`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "seller" => Self::Seller,
            "hotel" => Self::Hotel,
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Seller => "seller",
            Self::Hotel => "hotel",
            Self::Admin => "admin",
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Role::parse).unwrap_or_default())
    }
}

/// Identity of the signed-in account, mirrored into storage under `user`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Backend identifier. Accepts `_id` or `id`, string or number.
    #[serde(rename = "_id", alias = "id", default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "isHotel", default, deserialize_with = "deserialize_bool_or_null")]
    pub is_hotel: bool,
    #[serde(
        rename = "hotelId",
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub hotel_id: Option<String>,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_seller(&self) -> bool {
        self.role == Role::Seller
    }

    /// Hotel-operator capability: both the flag and the role must agree.
    pub fn has_hotel_permissions(&self) -> bool {
        self.is_hotel && self.role == Role::Hotel
    }
}

/// Bearer credential owned by the token store.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Strip a leading `Bearer ` scheme (any case) and surrounding whitespace.
pub fn strip_bearer_prefix(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("bearer") {
        return "";
    }
    match trimmed.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim(),
        _ => trimmed,
    }
}

/// Identity fields as they may appear in a login payload, all optional.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserFields {
    #[serde(rename = "_id", alias = "id", default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(rename = "isHotel", default)]
    pub is_hotel: Option<bool>,
    #[serde(rename = "hotelId", default, deserialize_with = "deserialize_optional_id")]
    pub hotel_id: Option<String>,
}

/// Input to `Session::login`. Identity may be flat or nested under `user`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserFields>,
    #[serde(flatten)]
    pub fields: UserFields,
}

impl LoginPayload {
    /// Parse a payload from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Malformed`] when the value is not an object of
    /// the expected shape.
    pub fn from_json(value: serde_json::Value) -> Result<Self, LoginError> {
        serde_json::from_value(value).map_err(|e| LoginError::Malformed(e.to_string()))
    }

    /// Split into the credential to persist and the normalized user record.
    ///
    /// Nested `user` fields win over flat ones. Absent `role` becomes `user`
    /// and absent `isHotel` becomes `false`.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::MissingToken`] if no non-empty token remains
    /// after stripping a bearer prefix.
    pub fn into_parts(self) -> Result<(Credential, UserRecord), LoginError> {
        let token = self
            .token
            .as_deref()
            .map(strip_bearer_prefix)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .ok_or(LoginError::MissingToken)?;
        let refresh_token = self
            .refresh_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);

        let nested = self.user.unwrap_or_default();
        let flat = self.fields;
        let user = UserRecord {
            id: nested.id.or(flat.id).unwrap_or_default(),
            name: nested.name.or(flat.name).unwrap_or_default(),
            email: nested.email.or(flat.email).unwrap_or_default(),
            phone: nested.phone.or(flat.phone),
            role: nested.role.or(flat.role).unwrap_or_default(),
            is_hotel: nested.is_hotel.or(flat.is_hotel).unwrap_or(false),
            hotel_id: nested.hotel_id.or(flat.hotel_id),
        };

        Ok((Credential { token, refresh_token }, user))
    }
}

/// Success body of a verification endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct VerifyResponse {
    #[serde(rename = "isAuthenticated", alias = "authenticated", default)]
    pub is_authenticated: Option<bool>,
    #[serde(default)]
    pub user: Option<UserRecord>,
}

impl VerifyResponse {
    /// True only when the body explicitly says the caller is not authenticated.
    pub fn is_soft_reject(&self) -> bool {
        self.is_authenticated == Some(false)
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_optional_id(deserializer)?.unwrap_or_default())
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(D::Error::custom("expected string or number id")),
    }
}

fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_bool_or_null<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
