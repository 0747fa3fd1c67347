use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use superapp_bridge::{run, HostConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Superapp micro-app host bridge", long_about = None)]
struct Cli {
    #[arg(long, value_name = "PATH", help = "TOML file with host settings")]
    config: Option<PathBuf>,

    #[arg(long, help = "Listen address for the bridge endpoints [default: 127.0.0.1:17817]")]
    listen: Option<SocketAddr>,

    #[arg(long, help = "Directory for credentials and micro-app local data")]
    state_dir: Option<PathBuf>,

    #[arg(long, value_name = "URL", help = "OAuth token endpoint used for refresh and exchange")]
    token_endpoint: Option<String>,

    #[arg(long, value_name = "URL", help = "Backend base URL for authorized native calls")]
    api_base: Option<String>,

    #[arg(long, help = "OAuth client id of the shell")]
    client_id: Option<String>,

    #[arg(long, value_name = "PATH", help = "Directory holding bundled micro-apps")]
    micro_app_root: Option<PathBuf>,

    #[arg(long, help = "Load micro-apps from development servers")]
    developer: bool,

    #[arg(long, help = "Timeout in milliseconds for replies from micro-apps")]
    reply_timeout_ms: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> HostConfig {
        HostConfig {
            listen: self.listen,
            state_dir: self.state_dir.clone(),
            token_endpoint: self.token_endpoint.clone(),
            api_base: self.api_base.clone(),
            client_id: self.client_id.clone(),
            micro_app_root: self.micro_app_root.clone(),
            developer: self.developer.then_some(true),
            reply_timeout_ms: self.reply_timeout_ms,
            ..HostConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let file = match &cli.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    let settings = cli.overrides().or(file).into_settings()?;

    run(settings).await
}
