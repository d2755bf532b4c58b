use serde::{Deserialize, Deserializer, Serialize};

// Clients send `null` for fields they leave empty; treat it like a blank
// value so validation answers instead of the JSON extractor.
pub(crate) fn blank_if_null<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

pub(crate) fn zero_if_null<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    Ok(Option::<i32>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignUpRequest {
    #[serde(deserialize_with = "blank_if_null")]
    pub first_name: String,
    #[serde(deserialize_with = "blank_if_null")]
    pub last_name: String,
    #[serde(deserialize_with = "blank_if_null")]
    pub email: String,
    #[serde(deserialize_with = "blank_if_null")]
    pub phone: String,
    #[serde(deserialize_with = "blank_if_null")]
    pub password: String,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    #[serde(deserialize_with = "blank_if_null")]
    pub email_or_phone: String,
    #[serde(deserialize_with = "blank_if_null")]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeactivateRequest {
    #[serde(alias = "userID", deserialize_with = "zero_if_null")]
    pub user_id: i32,
    #[serde(deserialize_with = "blank_if_null")]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePasswordRequest {
    #[serde(alias = "userID", deserialize_with = "zero_if_null")]
    pub user_id: i32,
    #[serde(deserialize_with = "blank_if_null")]
    pub old_password: String,
    #[serde(deserialize_with = "blank_if_null")]
    pub new_password: String,
}

/// Profile returned by the signup procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Profile returned by the login procedure, with verification flags.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginProfile {
    pub profile: UserProfile,
    pub email_is_verified: bool,
    pub phone_is_verified: bool,
}
