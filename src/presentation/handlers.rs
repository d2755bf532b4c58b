use crate::application::account_service::AccountService;
use crate::application::verification_service::VerificationService;
use crate::domain::error::DomainError;
use crate::domain::repository::{ProcedureGateway, VerificationProvider};
use crate::presentation::{accounts, verification};
use actix_web::{HttpResponse, ResponseError, http::StatusCode, web};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

const INTERNAL_FAILURE: &str = "An internal error occurred while processing your request.";
const FAIL: &str = "fail";

// AppState holding the services
pub struct AppState {
    pub accounts: AccountService<dyn ProcedureGateway>,
    pub verification: VerificationService<dyn ProcedureGateway, dyn VerificationProvider>,
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(
        gateway: Arc<dyn ProcedureGateway>,
        provider: Arc<dyn VerificationProvider>,
        expose_error_details: bool,
    ) -> Self {
        Self {
            accounts: AccountService::new(gateway.clone()),
            verification: VerificationService::new(gateway, provider),
            expose_error_details,
        }
    }

    /// Converts a service failure into the HTTP error, dropping internal
    /// details when they must not reach the client.
    pub fn api_error(&self, err: anyhow::Error) -> ApiError {
        let api_error = ApiError::from(err);
        if self.expose_error_details {
            api_error
        } else {
            api_error.without_details()
        }
    }
}

// Uniform error response format
#[derive(Serialize)]
struct ErrorResponse {
    response: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        details: Option<String>,
    },
    #[error("Database error: {message}")]
    Persistence {
        message: String,
        details: Option<String>,
        response: &'static str,
    },
    #[error("Unexpected procedure result")]
    UnexpectedShape,
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn without_details(self) -> Self {
        match self {
            ApiError::Provider { message, .. } => ApiError::Provider {
                message,
                details: None,
            },
            ApiError::Persistence {
                message, response, ..
            } => ApiError::Persistence {
                message,
                details: None,
                response,
            },
            ApiError::Internal { message, .. } => ApiError::Internal {
                message,
                details: None,
            },
            other => other,
        }
    }

    /// Sets the body discriminator of a database failure. Login reports
    /// database failures as "error" rather than "fail".
    pub fn reported_as(self, discriminator: &'static str) -> Self {
        match self {
            ApiError::Persistence {
                message, details, ..
            } => ApiError::Persistence {
                message,
                details,
                response: discriminator,
            },
            other => other,
        }
    }

    fn body(&self) -> ErrorResponse {
        let (response, message, details) = match self {
            ApiError::Validation(msg) | ApiError::Rejected(msg) | ApiError::Unauthorized(msg) => {
                (FAIL, msg.clone(), None)
            }
            ApiError::Persistence {
                message,
                details,
                response,
            } => (*response, message.clone(), details.clone()),
            ApiError::Provider { message, details } | ApiError::Internal { message, details } => {
                (FAIL, message.clone(), details.clone())
            }
            ApiError::UnexpectedShape => (FAIL, "An unexpected error occurred.".to_string(), None),
        };
        ErrorResponse {
            response,
            message,
            details,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Rejected(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Provider { .. }
            | ApiError::Persistence { .. }
            | ApiError::UnexpectedShape
            | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        // Log error based on severity
        if status.is_server_error() {
            error!(error = %error_msg, status = %status, "Request failed");
        } else {
            warn!(error = %error_msg, status = %status, "Request rejected");
        }

        HttpResponse::build(status).json(self.body())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<DomainError>() {
            Ok(DomainError::Validation(msg)) => ApiError::Validation(msg),
            Ok(DomainError::Rejected(msg)) => ApiError::Rejected(msg),
            Ok(DomainError::Unauthorized(msg)) => ApiError::Unauthorized(msg),
            Ok(DomainError::Provider { message, details }) => ApiError::Provider {
                message,
                details: Some(details),
            },
            Ok(DomainError::Persistence { message, details }) => ApiError::Persistence {
                message,
                details: Some(details),
                response: FAIL,
            },
            Ok(DomainError::UnexpectedShape) => ApiError::UnexpectedShape,
            Ok(DomainError::Internal { message, details }) => ApiError::Internal {
                message,
                details: Some(details),
            },
            Err(err) => ApiError::Internal {
                message: INTERNAL_FAILURE.to_string(),
                details: Some(err.to_string()),
            },
        }
    }
}

/// Registers every public route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/accounts")
                .route("/signup", web::post().to(accounts::sign_up))
                .route("/login", web::post().to(accounts::login))
                .route("/deactivate", web::post().to(accounts::deactivate))
                .route("/update-password", web::post().to(accounts::update_password)),
        )
        .service(
            web::scope("/verify")
                .route("/send-otp", web::post().to(verification::send_otp))
                .route("/check-otp", web::post().to(verification::check_otp)),
        );
}

/// JSON extractor config: malformed bodies answer with the standard error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::Validation(err.to_string()).into())
}

// Handlers

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}
