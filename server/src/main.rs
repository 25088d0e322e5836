use clap::Parser;
use log::info;
use server::config::GameConfig;
use server::ledger::{LedgerHandle, NoopLedger};
use server::network::Server;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Tick rate (simulation updates per second)
    #[clap(short, long, default_value = "60")]
    tick_rate: u32,
    /// Maximum concurrent client connections
    #[clap(long, default_value = "256")]
    max_clients: usize,
    /// Players per room
    #[clap(long, default_value = "30")]
    room_capacity: usize,
    /// Match length in seconds
    #[clap(long, default_value = "300")]
    match_duration_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_millis(1000 / args.tick_rate.max(1) as u64);

    let config = GameConfig {
        room_capacity: args.room_capacity,
        match_duration: Duration::from_secs(args.match_duration_secs),
        ..GameConfig::default()
    };

    info!(
        "Starting arena server on {} ({} Hz, rooms of {})",
        addr, args.tick_rate, args.room_capacity
    );

    let ledger = LedgerHandle::spawn(NoopLedger::new());
    let mut server = Server::new(&addr, tick_duration, args.max_clients, config, ledger).await?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            Ok(())
        }
    }
}
