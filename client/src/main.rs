use clap::Parser;
use client::command::HELP;
use client::network::Client;
use log::info;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:33000")]
    server: String,

    /// Display name sent to the server
    #[arg(short = 'n', long, default_value = "Player")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    println!("{}", HELP);

    let client = Client::new(&args.server, &args.name);
    let view = client.run(BufReader::new(tokio::io::stdin())).await?;

    info!("Session ended after {} moves", view.moves.len());

    Ok(())
}
