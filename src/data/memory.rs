use crate::domain::models::{ProcedureParams, ProcedureResult, ProcedureRow, SqlValue};
use crate::domain::repository::{ProcedureGateway, ProviderError, VerificationProvider};
use crate::domain::verification::{Verification, VerificationStatus};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;
use uuid::Uuid;

/// A recorded procedure invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureCall {
    pub procedure: String,
    pub params: ProcedureParams,
}

#[derive(Debug, Clone)]
enum Scripted {
    Result(ProcedureResult),
    Error(String),
}

/// Procedure gateway that answers from scripted results and records every
/// call it receives.
#[derive(Clone, Default)]
pub struct InMemoryProcedureGateway {
    scripts: Arc<RwLock<HashMap<String, Scripted>>>,
    calls: Arc<RwLock<Vec<ProcedureCall>>>,
}

impl InMemoryProcedureGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn script(&self, procedure: &str, result: ProcedureResult) {
        self.scripts
            .write()
            .await
            .insert(procedure.to_string(), Scripted::Result(result));
    }

    pub async fn script_rows(&self, procedure: &str, rows: Vec<ProcedureRow>) {
        self.script(procedure, ProcedureResult::Rows(rows)).await;
    }

    pub async fn fail(&self, procedure: &str, message: &str) {
        self.scripts
            .write()
            .await
            .insert(procedure.to_string(), Scripted::Error(message.to_string()));
    }

    pub async fn calls(&self) -> Vec<ProcedureCall> {
        self.calls.read().await.clone()
    }

    async fn run(&self, procedure: &str, params: ProcedureParams) -> Result<ProcedureResult> {
        trace!(procedure, "Recording procedure call");
        self.calls.write().await.push(ProcedureCall {
            procedure: procedure.to_string(),
            params,
        });

        match self.scripts.read().await.get(procedure) {
            Some(Scripted::Result(result)) => Ok(result.clone()),
            Some(Scripted::Error(message)) => Err(anyhow!(message.clone())),
            None => Err(anyhow!("Could not find stored procedure '{}'.", procedure)),
        }
    }
}

#[async_trait]
impl ProcedureGateway for InMemoryProcedureGateway {
    async fn execute_scalar(
        &self,
        procedure: &str,
        params: ProcedureParams,
    ) -> Result<Option<SqlValue>> {
        Ok(self.run(procedure, params).await?.into_scalar())
    }

    async fn execute_non_query(&self, procedure: &str, params: ProcedureParams) -> Result<u64> {
        Ok(self.run(procedure, params).await?.into_row_count())
    }

    async fn execute_query(
        &self,
        procedure: &str,
        params: ProcedureParams,
    ) -> Result<Vec<ProcedureRow>> {
        Ok(self.run(procedure, params).await?.into_rows())
    }
}

/// How the in-memory provider answers the next request.
#[derive(Debug, Clone)]
pub enum ProviderReply {
    Status(VerificationStatus),
    Rejected { status: u16, message: String },
    Unreachable(String),
}

impl ProviderReply {
    fn into_result(self, sid: String) -> Result<Verification, ProviderError> {
        match self {
            ProviderReply::Status(status) => Ok(Verification { sid, status }),
            ProviderReply::Rejected { status, message } => Err(ProviderError::Api {
                status,
                code: None,
                message,
            }),
            ProviderReply::Unreachable(message) => Err(ProviderError::Transport(message)),
        }
    }
}

/// A recorded provider request; `value` is the channel or the submitted code.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub operation: &'static str,
    pub phone_number: String,
    pub value: String,
}

#[derive(Clone)]
pub struct InMemoryVerificationProvider {
    start_reply: Arc<RwLock<ProviderReply>>,
    check_reply: Arc<RwLock<ProviderReply>>,
    requests: Arc<RwLock<Vec<ProviderRequest>>>,
}

impl InMemoryVerificationProvider {
    /// Starts answer "pending", checks answer "approved".
    pub fn new() -> Self {
        Self {
            start_reply: Arc::new(RwLock::new(ProviderReply::Status(
                VerificationStatus::Pending,
            ))),
            check_reply: Arc::new(RwLock::new(ProviderReply::Status(
                VerificationStatus::Approved,
            ))),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn reply_to_start(&self, reply: ProviderReply) {
        *self.start_reply.write().await = reply;
    }

    pub async fn reply_to_check(&self, reply: ProviderReply) {
        *self.check_reply.write().await = reply;
    }

    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.read().await.clone()
    }

    async fn record(&self, operation: &'static str, phone_number: &str, value: &str) {
        self.requests.write().await.push(ProviderRequest {
            operation,
            phone_number: phone_number.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for InMemoryVerificationProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn new_sid() -> String {
    format!("VE{}", Uuid::new_v4().simple())
}

#[async_trait]
impl VerificationProvider for InMemoryVerificationProvider {
    async fn start_verification(
        &self,
        phone_number: &str,
        channel: &str,
    ) -> Result<Verification, ProviderError> {
        self.record("start", phone_number, channel).await;
        self.start_reply.read().await.clone().into_result(new_sid())
    }

    async fn check_verification(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<Verification, ProviderError> {
        self.record("check", phone_number, code).await;
        self.check_reply.read().await.clone().into_result(new_sid())
    }
}
