//! CLI entry point for medium-rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medium_rs::config::SiteConfig;
use medium_rs::Blog;

#[derive(Parser)]
#[command(name = "medium-rs")]
#[command(version)]
#[command(about = "A server-rendered blog front-end backed by a headless content lake", long_about = None)]
struct Cli {
    /// Path to the site configuration
    #[arg(short, long, global = true, default_value = "_config.yml")]
    config: PathBuf,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the blog server
    #[command(alias = "s")]
    Server {
        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to server.ip)
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// List backend content
    List {
        /// Type of content to list (post, path)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "medium_rs=debug,tower_http=debug,info"
    } else {
        "medium_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Server { port, ip } => {
            let mut config = SiteConfig::resolve(&cli.config)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(ip) = ip {
                config.server.ip = ip;
            }
            let ip = config.server.ip.clone();
            let port = config.server.port;

            let blog = Blog::new(config)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            medium_rs::server::start(blog, &ip, port).await?;
        }

        Commands::List { r#type } => {
            let blog = Blog::new(SiteConfig::resolve(&cli.config)?)?;
            medium_rs::commands::list::run(&blog, &r#type).await?;
        }

        Commands::Version => {
            println!("medium-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
