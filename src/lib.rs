pub mod config;
pub mod errors;
pub mod functions;
pub mod schema;
pub mod services;
