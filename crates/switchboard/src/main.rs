use clap::Parser;
use switchboard::{LobbyConfig, Server, ServerConfig, SwitchboardError};
use tracing_subscriber::EnvFilter;

/// Multiplayer session server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 1337)]
    port: u16,

    /// Number of players the game needs
    #[arg(short = 'n', long, default_value_t = 4, value_parser = parse_players)]
    players: usize,

    /// Password clients must send with JOIN
    #[arg(short = 'P', long)]
    password: Option<String>,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            lobby: LobbyConfig::new(self.players, self.password),
        }
    }
}

fn parse_players(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), SwitchboardError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    let result = match Server::bind(config).await {
        Ok(server) => server.run().await,
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        tracing::error!(error = %e, "server stopped");
    }
    result
}
