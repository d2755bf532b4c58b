pub mod application {
    pub mod account_service;
    pub mod verification_service;
}

pub mod data {
    pub mod memory;
    pub mod sql_executor;
    pub mod twilio;
}

pub mod domain {
    pub mod error;
    pub mod models;
    pub mod repository;
    pub mod user;
    pub mod verification;
}

pub mod infrastructure {
    pub mod config;
    pub mod logging;
    pub mod security;
}

pub mod presentation {
    pub mod accounts;
    pub mod handlers;
    pub mod middleware;
    pub mod verification;
}
