use clap::Parser;

use crate::config::Overrides;

/// Accepts emoncms-style sensor readings over HTTP and stores them in InfluxDB.
#[derive(Parser, Debug)]
#[command(name = "emon-gateway", version)]
pub struct Cli {
    /// Extra config file, layered over ./gateway.toml
    #[arg(long)]
    pub config: Option<String>,

    /// Address for the HTTP server to listen on
    #[arg(long, alias = "listen")]
    pub http_bind: Option<String>,

    /// API key clients must send (authentication disabled if empty)
    #[arg(long)]
    pub apikey: Option<String>,

    /// InfluxDB server address
    #[arg(long)]
    pub db: Option<String>,

    /// Database name
    #[arg(long)]
    pub db_name: Option<String>,

    /// Measurement name
    #[arg(long)]
    pub measurement: Option<String>,

    /// Print the resolved bind address and exit
    #[arg(long)]
    pub print_bind: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            http_bind: self.http_bind.clone(),
            apikey: self.apikey.clone(),
            store_url: self.db.clone(),
            database: self.db_name.clone(),
            measurement: self.measurement.clone(),
        }
    }
}
