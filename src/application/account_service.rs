use crate::domain::error::DomainError;
use crate::domain::models::{ProcedureParams, ProcedureRow};
use crate::domain::repository::ProcedureGateway;
use crate::domain::user::{
    DeactivateRequest, LoginProfile, LoginRequest, SignUpRequest, UpdatePasswordRequest,
    UserProfile,
};
use crate::infrastructure::security::hash_password;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

pub const SIGNUP_PROCEDURE: &str = "sp_signup_user";
pub const LOGIN_PROCEDURE: &str = "sp_login_user";
pub const DEACTIVATE_PROCEDURE: &str = "sp_deactivate_user";
pub const UPDATE_PASSWORD_PROCEDURE: &str = "sp_update_user_password";

pub const ACCOUNT_BLOCKED: &str = "Account is blocked. Please contact support.";
pub const INVALID_CREDENTIALS: &str = "Invalid email/phone or password.";
pub const INCORRECT_PASSWORD: &str = "Incorrect password.";
pub const INCORRECT_OLD_PASSWORD: &str = "Incorrect old password.";

const PERSISTENCE_FAILURE: &str = "An internal error occurred while processing your request.";

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn persistence(err: anyhow::Error) -> DomainError {
    error!(error = %err, "Stored procedure call failed");
    DomainError::persistence(PERSISTENCE_FAILURE, err)
}

fn profile_from_row(row: &ProcedureRow) -> Result<UserProfile> {
    let user_id = row.int("user_id").ok_or_else(|| {
        warn!("Procedure reported success without a user_id");
        DomainError::UnexpectedShape
    })?;
    Ok(UserProfile {
        user_id,
        first_name: row.text("first_name"),
        last_name: row.text("last_name"),
        email: row.text("email"),
        phone: row.text("phone"),
    })
}

fn required_flag(row: &ProcedureRow, column: &str) -> Result<bool> {
    row.flag(column).ok_or_else(|| {
        warn!(column, "Procedure returned no usable flag");
        DomainError::UnexpectedShape.into()
    })
}

/// Account operations. All business rules live in the stored procedures;
/// this service validates input, hashes passwords and reads the first row.
pub struct AccountService<G: ProcedureGateway + ?Sized> {
    gateway: Arc<G>,
}

impl<G: ProcedureGateway + ?Sized> AccountService<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    #[instrument(skip(self, req))]
    pub async fn sign_up(&self, req: SignUpRequest) -> Result<UserProfile> {
        trace!("Starting signup");

        if [&req.first_name, &req.last_name, &req.phone, &req.email, &req.password]
            .iter()
            .any(|v| is_blank(v))
        {
            warn!("Signup rejected: missing fields");
            return Err(DomainError::Validation("All fields are mandatory.".to_string()).into());
        }

        let params = ProcedureParams::new()
            .with("first_name", req.first_name)
            .with("last_name", req.last_name)
            .with("email", req.email)
            .with("phone", req.phone)
            .with("password", hash_password(&req.password))
            .with("created_by", req.created_by)
            .with("created_at", Utc::now());

        let rows = self
            .gateway
            .execute_query(SIGNUP_PROCEDURE, params)
            .await
            .map_err(persistence)?;
        let row = rows.first().ok_or(DomainError::UnexpectedShape)?;

        match row.text("response").as_str() {
            "success" => {
                let profile = profile_from_row(row)?;
                info!(user_id = profile.user_id, "User signed up");
                Ok(profile)
            }
            "fail" => {
                let msg = row.text("msg");
                warn!(reason = %msg, "Signup refused by procedure");
                Err(DomainError::Rejected(msg).into())
            }
            other => {
                warn!(response = %other, "Unknown signup discriminator");
                Err(DomainError::UnexpectedShape.into())
            }
        }
    }

    #[instrument(skip(self, req))]
    pub async fn login(&self, req: LoginRequest) -> Result<LoginProfile> {
        trace!("Starting login");

        if is_blank(&req.email_or_phone) || is_blank(&req.password) {
            return Err(DomainError::Validation(
                "Email/Phone and password are mandatory.".to_string(),
            )
            .into());
        }

        let params = ProcedureParams::new()
            .with("email_or_phone", req.email_or_phone)
            .with("password", hash_password(&req.password));

        let rows = self
            .gateway
            .execute_query(LOGIN_PROCEDURE, params)
            .await
            .map_err(persistence)?;

        let Some(row) = rows.first() else {
            warn!("Login procedure returned no rows");
            return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
        };

        match (row.text("response").as_str(), row.text("msg").as_str()) {
            ("success", _) => {
                let profile = profile_from_row(row)?;
                let login = LoginProfile {
                    email_is_verified: required_flag(row, "email_is_verified")?,
                    phone_is_verified: required_flag(row, "phone_is_verified")?,
                    profile,
                };
                info!(user_id = login.profile.user_id, "Login successful");
                Ok(login)
            }
            ("fail", "account blocked") => {
                warn!("Login refused: account blocked");
                Err(DomainError::Unauthorized(ACCOUNT_BLOCKED.to_string()).into())
            }
            (response, msg) => {
                debug!(response, msg, "Login refused");
                Err(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()).into())
            }
        }
    }

    #[instrument(skip(self, req), fields(user_id = req.user_id))]
    pub async fn deactivate(&self, req: DeactivateRequest) -> Result<()> {
        if req.user_id <= 0 || is_blank(&req.password) {
            return Err(
                DomainError::Validation("UserID and password are mandatory.".to_string()).into(),
            );
        }

        let params = ProcedureParams::new()
            .with("user_id", req.user_id)
            .with("password", hash_password(&req.password));

        self.expect_single_update(DEACTIVATE_PROCEDURE, params, INCORRECT_PASSWORD)
            .await?;
        info!(user_id = req.user_id, "Account deactivated");
        Ok(())
    }

    #[instrument(skip(self, req), fields(user_id = req.user_id))]
    pub async fn update_password(&self, req: UpdatePasswordRequest) -> Result<()> {
        if req.user_id <= 0 || is_blank(&req.old_password) || is_blank(&req.new_password) {
            return Err(DomainError::Validation("All fields are mandatory.".to_string()).into());
        }

        let params = ProcedureParams::new()
            .with("user_id", req.user_id)
            .with("old_password", hash_password(&req.old_password))
            .with("new_password", hash_password(&req.new_password));

        self.expect_single_update(UPDATE_PASSWORD_PROCEDURE, params, INCORRECT_OLD_PASSWORD)
            .await?;
        info!(user_id = req.user_id, "Password updated");
        Ok(())
    }

    /// Both mutating procedures report a `RowCount` column; exactly one
    /// updated row means the password matched.
    async fn expect_single_update(
        &self,
        procedure: &str,
        params: ProcedureParams,
        mismatch: &str,
    ) -> Result<()> {
        let rows = self
            .gateway
            .execute_query(procedure, params)
            .await
            .map_err(persistence)?;
        let row = rows.first().ok_or(DomainError::UnexpectedShape)?;

        match row.int("RowCount") {
            Some(1) => Ok(()),
            Some(count) => {
                warn!(procedure, row_count = count, "Password did not match");
                Err(DomainError::Rejected(mismatch.to_string()).into())
            }
            None => {
                warn!(procedure, "Procedure returned no usable RowCount");
                Err(DomainError::UnexpectedShape.into())
            }
        }
    }
}
