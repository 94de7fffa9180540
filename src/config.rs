//! Server configuration from command-line flags and environment variables.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "movie-catalog")]
#[command(about = "REST backend for a CSV-backed movie catalog")]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// CSV file the catalog is loaded from and flushed to
    #[arg(long = "data", env = "MOVIES_CSV", default_value = "data/movies_db.csv")]
    pub data_file: PathBuf,
}

impl ServerConfig {
    /// `host:port` for binding the listener.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
