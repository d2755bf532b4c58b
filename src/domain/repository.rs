use crate::domain::models::{ProcedureParams, ProcedureRow, SqlValue};
use crate::domain::verification::Verification;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

/// Executes named stored procedures. Every call owns its connection for the
/// duration of the call only; database errors are returned unchanged.
#[async_trait]
pub trait ProcedureGateway: Send + Sync {
    /// First column of the first row, `None` when no row came back.
    async fn execute_scalar(
        &self,
        procedure: &str,
        params: ProcedureParams,
    ) -> Result<Option<SqlValue>>;
    /// Row count reported by the driver for the call statement. On
    /// PostgreSQL the call is a `SELECT`, so this is the number of rows the
    /// procedure returned, not the number of rows it modified.
    async fn execute_non_query(&self, procedure: &str, params: ProcedureParams) -> Result<u64>;
    async fn execute_query(
        &self,
        procedure: &str,
        params: ProcedureParams,
    ) -> Result<Vec<ProcedureRow>>;
}

#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider answered and refused the request.
    #[error("{message} (status {status}, code {code:?})")]
    Api {
        status: u16,
        code: Option<u32>,
        message: String,
    },
    #[error("verification provider unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait VerificationProvider: Send + Sync {
    async fn start_verification(
        &self,
        phone_number: &str,
        channel: &str,
    ) -> Result<Verification, ProviderError>;
    async fn check_verification(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<Verification, ProviderError>;
}
