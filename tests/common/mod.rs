pub mod client;
pub mod environment;
pub mod jwks_server;
pub mod logging;
