use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "inline-firewall",
    version,
    about = "Reverse proxy enforcing request and response rules in front of one service"
)]
pub struct Cli {
    /// Base URL of the protected service, e.g. http://127.0.0.1:8081
    #[arg(long)]
    pub service_addr: Option<String>,

    /// Path to the YAML rule file
    #[arg(long)]
    pub conf: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8080
    #[arg(long)]
    pub addr: Option<String>,

    /// Optional settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
