use crate::domain::user::{
    DeactivateRequest, LoginProfile, LoginRequest, SignUpRequest, UpdatePasswordRequest,
    UserProfile,
};
use crate::presentation::handlers::{ApiError, AppState};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{error, info, instrument};

#[derive(Serialize)]
pub struct SignUpResponse {
    pub response: &'static str,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl From<UserProfile> for SignUpResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            response: "success",
            user_id: profile.user_id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            phone: profile.phone,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub response: &'static str,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub email_is_verified: bool,
    pub phone: String,
    pub phone_is_verified: bool,
    pub message: &'static str,
}

impl From<LoginProfile> for LoginResponse {
    fn from(login: LoginProfile) -> Self {
        Self {
            response: "success",
            user_id: login.profile.user_id,
            first_name: login.profile.first_name,
            last_name: login.profile.last_name,
            email: login.profile.email,
            email_is_verified: login.email_is_verified,
            phone: login.profile.phone,
            phone_is_verified: login.phone_is_verified,
            message: "Login successful.",
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub response: &'static str,
    pub message: &'static str,
}

#[instrument(skip(state, req))]
pub async fn sign_up(
    state: web::Data<AppState>,
    req: web::Json<SignUpRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Signup request received");

    let profile = state
        .accounts
        .sign_up(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to sign up user");
            state.api_error(e)
        })?;

    info!(user_id = profile.user_id, "User signed up successfully");
    Ok(HttpResponse::Ok().json(SignUpResponse::from(profile)))
}

#[instrument(skip(state, req))]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let login = state.accounts.login(req.into_inner()).await.map_err(|e| {
        error!(error = %e, "Failed to login");
        state.api_error(e).reported_as("error")
    })?;

    info!(user_id = login.profile.user_id, "Login successful");
    Ok(HttpResponse::Ok().json(LoginResponse::from(login)))
}

#[instrument(skip(state, req), fields(user_id = req.user_id))]
pub async fn deactivate(
    state: web::Data<AppState>,
    req: web::Json<DeactivateRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Deactivation request received");

    state
        .accounts
        .deactivate(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to deactivate account");
            state.api_error(e)
        })?;

    Ok(HttpResponse::Ok().json(StatusResponse {
        response: "success",
        message: "Account deactivated successfully.",
    }))
}

#[instrument(skip(state, req), fields(user_id = req.user_id))]
pub async fn update_password(
    state: web::Data<AppState>,
    req: web::Json<UpdatePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Password update request received");

    state
        .accounts
        .update_password(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to update password");
            state.api_error(e)
        })?;

    Ok(HttpResponse::Ok().json(StatusResponse {
        response: "success",
        message: "Password updated successfully.",
    }))
}
