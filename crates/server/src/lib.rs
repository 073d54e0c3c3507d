pub mod config;
pub mod error;
pub mod refresh;
pub mod routes;
pub mod runner;
pub mod telemetry;
