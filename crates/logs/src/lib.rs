// Log retrieval for a PaaS controller: live WebSocket streaming and HTTP tailing.

// Core infrastructure
pub mod error;
pub mod model;
pub mod frame;
pub mod auth;
pub mod conf;
pub mod metrics;

// Domain modules
pub mod stream;
pub mod tail;
pub mod runtime;
