use crate::domain::models::{ProcedureParams, ProcedureRow, SqlValue};
use crate::domain::repository::ProcedureGateway;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::{PgArguments, PgColumn, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::types::Decimal;
use sqlx::{Column, Postgres, Row, TypeInfo};
use tracing::{Instrument, debug, instrument, warn};
use uuid::Uuid;

/// Stored-procedure gateway backed by a PostgreSQL pool. Each call checks a
/// connection out of the pool and returns it when the call finishes.
#[derive(Clone)]
pub struct PgProcedureGateway {
    pool: PgPool,
}

impl PgProcedureGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds the pool without opening a connection; the first call does.
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(database_url)
            .context("invalid DATABASE_URL")?;
        Ok(Self::new(pool))
    }

    async fn fetch(&self, procedure: &str, params: &ProcedureParams) -> Result<Vec<PgRow>> {
        let (sql, binds) = build_call(procedure, params)?;
        let span = query_span(&sql);

        let mut conn = self.pool.acquire().await?;
        let query = binds.into_iter().fold(sqlx::query(&sql), bind_value);
        let rows = query.fetch_all(&mut *conn).instrument(span).await?;
        Ok(rows)
    }
}

#[async_trait]
impl ProcedureGateway for PgProcedureGateway {
    #[instrument(skip(self, params), fields(params = params.len()))]
    async fn execute_scalar(
        &self,
        procedure: &str,
        params: ProcedureParams,
    ) -> Result<Option<SqlValue>> {
        let rows = self.fetch(procedure, &params).await?;
        let value = match rows.first() {
            Some(row) if !row.columns().is_empty() => Some(decode_column(row, &row.columns()[0])?),
            _ => None,
        };
        debug!(procedure, found = value.is_some(), "Scalar procedure executed");
        Ok(value)
    }

    #[instrument(skip(self, params), fields(params = params.len()))]
    async fn execute_non_query(&self, procedure: &str, params: ProcedureParams) -> Result<u64> {
        let (sql, binds) = build_call(procedure, &params)?;
        let span = query_span(&sql);

        let mut conn = self.pool.acquire().await?;
        let query = binds.into_iter().fold(sqlx::query(&sql), bind_value);
        let affected = query
            .execute(&mut *conn)
            .instrument(span)
            .await?
            .rows_affected();
        debug!(procedure, affected, "Non-query procedure executed");
        Ok(affected)
    }

    #[instrument(skip(self, params), fields(params = params.len()))]
    async fn execute_query(
        &self,
        procedure: &str,
        params: ProcedureParams,
    ) -> Result<Vec<ProcedureRow>> {
        let rows = self.fetch(procedure, &params).await?;
        let decoded = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
        debug!(procedure, rows = decoded.len(), "Query procedure executed");
        Ok(decoded)
    }
}

fn query_span(sql: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %sql
    )
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Renders `SELECT * FROM proc(name => $n, ...)`. NULL parameters are written
/// as literal `NULL` so PostgreSQL resolves their type from the routine
/// signature; every other value becomes a positional bind.
pub(crate) fn build_call<'p>(
    procedure: &str,
    params: &'p ProcedureParams,
) -> Result<(String, Vec<&'p SqlValue>)> {
    if !is_identifier(procedure) {
        bail!("invalid procedure name `{}`", procedure);
    }

    let mut args = Vec::with_capacity(params.len());
    let mut binds = Vec::new();
    for (name, value) in params.iter() {
        if !is_identifier(name) {
            bail!("invalid parameter name `{}` for `{}`", name, procedure);
        }
        if value.is_null() {
            args.push(format!("{} => NULL", name));
        } else {
            binds.push(value);
            args.push(format!("{} => ${}", name, binds.len()));
        }
    }

    Ok((
        format!("SELECT * FROM {}({})", procedure, args.join(", ")),
        binds,
    ))
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::BigInt(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.clone()),
        SqlValue::Timestamp(v) => query.bind(*v),
    }
}

fn decode_row(row: &PgRow) -> Result<ProcedureRow, sqlx::Error> {
    let mut out = ProcedureRow::new();
    for column in row.columns() {
        out.push(column.name(), decode_column(row, column)?);
    }
    Ok(out)
}

/// How a PostgreSQL column type is read into a [`SqlValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    TimestampTz,
    Timestamp,
    Date,
    Time,
    Uuid,
    Json,
    Text,
    Void,
    Unsupported,
}

fn column_kind(type_name: &str) -> ColumnKind {
    match type_name {
        "BOOL" => ColumnKind::Bool,
        "INT2" => ColumnKind::Int2,
        "INT4" => ColumnKind::Int4,
        "INT8" => ColumnKind::Int8,
        "FLOAT4" => ColumnKind::Float4,
        "FLOAT8" => ColumnKind::Float8,
        "NUMERIC" => ColumnKind::Numeric,
        "TIMESTAMPTZ" => ColumnKind::TimestampTz,
        "TIMESTAMP" => ColumnKind::Timestamp,
        "DATE" => ColumnKind::Date,
        "TIME" => ColumnKind::Time,
        "UUID" => ColumnKind::Uuid,
        "JSON" | "JSONB" => ColumnKind::Json,
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" | "CITEXT" | "UNKNOWN" => ColumnKind::Text,
        "VOID" => ColumnKind::Void,
        _ => ColumnKind::Unsupported,
    }
}

/// NUMERIC keeps integral values as integers; anything else becomes a float.
fn numeric_value(value: Decimal) -> SqlValue {
    let text = value.normalize().to_string();
    if let Ok(v) = text.parse::<i64>() {
        SqlValue::BigInt(v)
    } else if let Ok(v) = text.parse::<f64>() {
        SqlValue::Float(v)
    } else {
        SqlValue::Text(text)
    }
}

fn decode_column(row: &PgRow, column: &PgColumn) -> Result<SqlValue, sqlx::Error> {
    let idx = column.ordinal();
    let type_name = column.type_info().name();
    let value = match column_kind(type_name) {
        ColumnKind::Bool => row.try_get::<Option<bool>, _>(idx)?.map(SqlValue::Bool),
        ColumnKind::Int2 => row
            .try_get::<Option<i16>, _>(idx)?
            .map(|v| SqlValue::Int(i32::from(v))),
        ColumnKind::Int4 => row.try_get::<Option<i32>, _>(idx)?.map(SqlValue::Int),
        ColumnKind::Int8 => row.try_get::<Option<i64>, _>(idx)?.map(SqlValue::BigInt),
        ColumnKind::Float4 => row
            .try_get::<Option<f32>, _>(idx)?
            .map(|v| SqlValue::Float(f64::from(v))),
        ColumnKind::Float8 => row.try_get::<Option<f64>, _>(idx)?.map(SqlValue::Float),
        ColumnKind::Numeric => row.try_get::<Option<Decimal>, _>(idx)?.map(numeric_value),
        ColumnKind::TimestampTz => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(SqlValue::Timestamp),
        ColumnKind::Timestamp => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|v| SqlValue::Timestamp(v.and_utc())),
        ColumnKind::Date => row
            .try_get::<Option<NaiveDate>, _>(idx)?
            .map(|v| SqlValue::Text(v.to_string())),
        ColumnKind::Time => row
            .try_get::<Option<NaiveTime>, _>(idx)?
            .map(|v| SqlValue::Text(v.to_string())),
        ColumnKind::Uuid => row
            .try_get::<Option<Uuid>, _>(idx)?
            .map(|v| SqlValue::Text(v.to_string())),
        ColumnKind::Json => row
            .try_get::<Option<serde_json::Value>, _>(idx)?
            .map(|v| SqlValue::Text(v.to_string())),
        ColumnKind::Text => row.try_get::<Option<String>, _>(idx)?.map(SqlValue::Text),
        ColumnKind::Void => None,
        ColumnKind::Unsupported => {
            warn!(
                column = column.name(),
                type_name, "Unsupported column type, reading it as NULL"
            );
            None
        }
    };
    Ok(value.unwrap_or(SqlValue::Null))
}
