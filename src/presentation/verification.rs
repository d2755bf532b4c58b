use crate::domain::models::SqlValue;
use crate::domain::verification::{
    OtpCheckOutcome, SendOtpRequest, VerificationStatus, VerifyOtpRequest,
};
use crate::presentation::handlers::{ApiError, AppState};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub message: &'static str,
    pub verification_sid: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpCheckResponse {
    pub response: &'static str,
    pub verification_sid: String,
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<SqlValue>,
}

#[instrument(skip(state, req))]
pub async fn send_otp(
    state: web::Data<AppState>,
    req: web::Json<SendOtpRequest>,
) -> Result<HttpResponse, ApiError> {
    info!(channel = %req.channel, "OTP send request received");

    let verification = state
        .verification
        .send_otp(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to send OTP");
            state.api_error(e)
        })?;

    info!(sid = %verification.sid, "OTP sent successfully");
    Ok(HttpResponse::Ok().json(SendOtpResponse {
        message: "OTP sent successfully.",
        verification_sid: verification.sid,
    }))
}

#[instrument(skip(state, req))]
pub async fn check_otp(
    state: web::Data<AppState>,
    req: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("OTP check request received");

    let outcome = state
        .verification
        .verify_otp(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to verify OTP");
            state.api_error(e)
        })?;

    let response = match outcome {
        OtpCheckOutcome::Verified(verification) => {
            info!(sid = %verification.sid, "Phone number verified");
            HttpResponse::Ok().json(OtpCheckResponse {
                response: "success",
                verification_sid: verification.sid,
                status: verification.status,
                affected_rows: None,
            })
        }
        OtpCheckOutcome::NotRecorded {
            verification,
            affected,
        } => {
            error!(sid = %verification.sid, affected = ?affected, "Approved OTP was not recorded");
            HttpResponse::InternalServerError().json(OtpCheckResponse {
                response: "fail",
                verification_sid: verification.sid,
                status: verification.status,
                affected_rows: Some(affected.unwrap_or(SqlValue::Null)),
            })
        }
        OtpCheckOutcome::NotApproved(verification) => {
            warn!(sid = %verification.sid, status = %verification.status, "OTP not approved");
            HttpResponse::BadRequest().json(OtpCheckResponse {
                response: "fail",
                verification_sid: verification.sid,
                status: verification.status,
                affected_rows: None,
            })
        }
    };

    Ok(response)
}
