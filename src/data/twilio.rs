use crate::domain::repository::{ProviderError, VerificationProvider};
use crate::domain::verification::{Verification, VerificationStatus};
use crate::infrastructure::config::TwilioConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct VerificationResource {
    sid: String,
    status: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResource {
    code: Option<u32>,
    message: Option<String>,
}

/// Twilio Verify v2 client. Credentials are injected at construction.
pub struct TwilioVerifyClient {
    client: Client,
    config: TwilioConfig,
}

impl TwilioVerifyClient {
    pub fn new(config: TwilioConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, resource: &str) -> String {
        format!(
            "{}/v2/Services/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.service_sid,
            resource
        )
    }

    async fn post(
        &self,
        resource: &str,
        form: &[(&str, &str)],
    ) -> Result<Verification, ProviderError> {
        let url = self.endpoint(resource);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: ErrorResource = response.json().await.unwrap_or_default();
            warn!(url = %url, status = %status, code = ?body.code, "Verification provider rejected request");
            return Err(api_error(status.as_u16(), body));
        }

        let resource: VerificationResource = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        debug!(sid = %resource.sid, status = %resource.status, "Verification provider responded");

        Ok(Verification {
            sid: resource.sid,
            status: VerificationStatus::parse(&resource.status),
        })
    }
}

fn api_error(status: u16, body: ErrorResource) -> ProviderError {
    ProviderError::Api {
        status,
        code: body.code,
        message: body
            .message
            .unwrap_or_else(|| format!("provider returned HTTP {}", status)),
    }
}

#[async_trait]
impl VerificationProvider for TwilioVerifyClient {
    #[instrument(skip(self, phone_number))]
    async fn start_verification(
        &self,
        phone_number: &str,
        channel: &str,
    ) -> Result<Verification, ProviderError> {
        self.post("Verifications", &[("To", phone_number), ("Channel", channel)])
            .await
    }

    #[instrument(skip(self, phone_number, code))]
    async fn check_verification(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<Verification, ProviderError> {
        self.post("VerificationCheck", &[("To", phone_number), ("Code", code)])
            .await
    }
}
