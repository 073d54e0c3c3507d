pub mod traits;

// Market data
pub mod coingecko;

// Alerts service clients
pub mod alerts_http;
pub mod alerts_memory;

// User notifications
pub mod notifier;
