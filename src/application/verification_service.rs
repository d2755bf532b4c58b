use crate::domain::error::DomainError;
use crate::domain::models::ProcedureParams;
use crate::domain::repository::{ProcedureGateway, ProviderError, VerificationProvider};
use crate::domain::verification::{
    DEFAULT_CHANNEL, OtpCheckOutcome, SendOtpRequest, Verification, VerifyOtpRequest,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub const VALIDATE_PHONE_PROCEDURE: &str = "sp_validate_phone_number";

fn provider_failure(err: ProviderError, rejected: &str, unexpected: &str) -> DomainError {
    match err {
        ProviderError::Api { .. } => {
            warn!(error = %err, "Verification provider rejected the request");
            DomainError::Provider {
                message: rejected.to_string(),
                details: err.to_string(),
            }
        }
        ProviderError::Transport(details) => {
            error!(error = %details, "Verification provider call failed");
            DomainError::Internal {
                message: unexpected.to_string(),
                details,
            }
        }
    }
}

/// Phone verification: the provider owns the one-time codes, the database
/// records which numbers have been confirmed.
pub struct VerificationService<G, P>
where
    G: ProcedureGateway + ?Sized,
    P: VerificationProvider + ?Sized,
{
    gateway: Arc<G>,
    provider: Arc<P>,
}

impl<G, P> VerificationService<G, P>
where
    G: ProcedureGateway + ?Sized,
    P: VerificationProvider + ?Sized,
{
    pub fn new(gateway: Arc<G>, provider: Arc<P>) -> Self {
        Self { gateway, provider }
    }

    #[instrument(skip(self, req), fields(channel = %req.channel))]
    pub async fn send_otp(&self, req: SendOtpRequest) -> Result<Verification> {
        if req.phone_number.trim().is_empty() {
            return Err(DomainError::Validation("Phone number is required.".to_string()).into());
        }
        let channel = match req.channel.trim() {
            "" => DEFAULT_CHANNEL,
            channel => channel,
        };

        let verification = self
            .provider
            .start_verification(&req.phone_number, channel)
            .await
            .map_err(|e| {
                provider_failure(
                    e,
                    "An error occurred while sending OTP through the verification provider.",
                    "An unexpected error occurred while sending OTP.",
                )
            })?;

        info!(sid = %verification.sid, status = %verification.status, "OTP sent");
        Ok(verification)
    }

    #[instrument(skip(self, req))]
    pub async fn verify_otp(&self, req: VerifyOtpRequest) -> Result<OtpCheckOutcome> {
        if req.phone_number.trim().is_empty() || req.otp.trim().is_empty() {
            return Err(
                DomainError::Validation("Phone number and OTP are required.".to_string()).into(),
            );
        }

        let verification = self
            .provider
            .check_verification(&req.phone_number, &req.otp)
            .await
            .map_err(|e| {
                provider_failure(
                    e,
                    "An error occurred while verifying OTP through the verification provider.",
                    "An unexpected error occurred during OTP verification.",
                )
            })?;

        if !verification.status.is_approved() {
            warn!(sid = %verification.sid, status = %verification.status, "OTP not approved");
            return Ok(OtpCheckOutcome::NotApproved(verification));
        }

        let affected = self
            .gateway
            .execute_scalar(
                VALIDATE_PHONE_PROCEDURE,
                ProcedureParams::new().with("phone_number", req.phone_number),
            )
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to mark phone number verified");
                DomainError::persistence("An unexpected error occurred during OTP verification.", e)
            })?;

        let updated = affected.as_ref().and_then(|v| v.as_i64()).unwrap_or(0);
        info!(sid = %verification.sid, updated, "Phone verification recorded");

        if updated > 0 {
            Ok(OtpCheckOutcome::Verified(verification))
        } else {
            Ok(OtpCheckOutcome::NotRecorded {
                verification,
                affected,
            })
        }
    }
}
