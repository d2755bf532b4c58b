use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::models::SqlValue;
use crate::domain::user::blank_if_null;

pub const DEFAULT_CHANNEL: &str = "sms";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendOtpRequest {
    #[serde(deserialize_with = "blank_if_null")]
    pub phone_number: String,
    #[serde(deserialize_with = "blank_if_null")]
    pub channel: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyOtpRequest {
    #[serde(deserialize_with = "blank_if_null")]
    pub phone_number: String,
    #[serde(deserialize_with = "blank_if_null")]
    pub otp: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Approved,
    Canceled,
    MaxAttemptsReached,
    Deleted,
    Failed,
    Expired,
    Other(String),
}

impl VerificationStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => VerificationStatus::Pending,
            "approved" => VerificationStatus::Approved,
            "canceled" => VerificationStatus::Canceled,
            "max_attempts_reached" => VerificationStatus::MaxAttemptsReached,
            "deleted" => VerificationStatus::Deleted,
            "failed" => VerificationStatus::Failed,
            "expired" => VerificationStatus::Expired,
            other => VerificationStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Canceled => "canceled",
            VerificationStatus::MaxAttemptsReached => "max_attempts_reached",
            VerificationStatus::Deleted => "deleted",
            VerificationStatus::Failed => "failed",
            VerificationStatus::Expired => "expired",
            VerificationStatus::Other(raw) => raw,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, VerificationStatus::Approved)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VerificationStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A provider-side verification challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub sid: String,
    pub status: VerificationStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OtpCheckOutcome {
    /// Provider approved the code and the phone was marked verified.
    Verified(Verification),
    /// Provider approved the code but the procedure reported no update.
    NotRecorded {
        verification: Verification,
        affected: Option<SqlValue>,
    },
    NotApproved(Verification),
}
