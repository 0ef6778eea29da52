/// Database connection and table creation
pub mod database;

/// Catalog seed loading from a TOML file
pub mod seed;

/// Server settings from environment variables
pub mod server;
