use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use std::time::Duration;

/// Main-method of the application.
/// Parses command-line arguments, starts the relay server and stops it on Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value_t = shared::DEFAULT_PORT)]
        port: u16,
        /// Pause between the color, turn and clock messages of a new pairing
        #[clap(long, default_value = "100")]
        pairing_delay_ms: u64,
    }

    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    let config = ServerConfig::new(&args.host, args.port)
        .with_pairing_delay(Duration::from_millis(args.pairing_delay_ms));

    let server = Server::bind(config).await?;
    let shutdown = server.shutdown_handle();
    let mut server_handle = tokio::spawn(server.run());

    // Handle shutdown gracefully
    tokio::select! {
        result = &mut server_handle => {
            if let Err(e) = result {
                error!("Server task panicked: {}", e);
            }
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            shutdown.shutdown();
        }
    }

    if let Err(e) = server_handle.await {
        error!("Server task panicked: {}", e);
    }

    Ok(())
}
