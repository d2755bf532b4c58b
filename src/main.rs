use account_verify_api::data::sql_executor::PgProcedureGateway;
use account_verify_api::data::twilio::TwilioVerifyClient;
use account_verify_api::infrastructure::config::AppConfig;
use account_verify_api::infrastructure::logging::init_logging;
use account_verify_api::presentation::handlers::{AppState, configure};
use account_verify_api::presentation::middleware::{RequestIdMiddleware, TimingMiddleware};
use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use std::io;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    init_logging();
    info!("Logging initialized");

    let config = AppConfig::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    info!(config = ?config, "Configuration loaded");
    if config.expose_error_details {
        warn!("Internal error details will be echoed to clients (EXPOSE_ERROR_DETAILS=true)");
    }

    let gateway = PgProcedureGateway::connect_lazy(&config.database_url, config.db_max_connections)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    info!(max_connections = config.db_max_connections, "Procedure gateway created");

    let provider = TwilioVerifyClient::new(config.twilio.clone())
        .map_err(|e| io::Error::other(e.to_string()))?;
    info!(base_url = %config.twilio.base_url, "Verification provider created");

    let state = web::Data::new(AppState::new(
        Arc::new(gateway),
        Arc::new(provider),
        config.expose_error_details,
    ));

    let server = HttpServer::new(move || {
        tracing::trace!("Creating new application instance");
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .configure(configure)
    });

    let bind_addr = format!("{}:{}", config.host, config.port);
    let server = server.bind((config.host.as_str(), config.port))?;
    info!(
        address = %bind_addr,
        routes = %"GET /health, POST /accounts/{signup,login,deactivate,update-password}, POST /verify/{send-otp,check-otp}",
        "Starting HTTP server"
    );
    server.run().await
}
