use clap::Parser;
use log::error;
use server::network::Server;

/// Command line arguments. The defaults reproduce the stock setup: one
/// fixed port bound on every interface.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    // A taken port is fatal: log it and bail rather than limping on.
    let mut server = match Server::new(&address).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind {}: {}", address, e);
            std::process::exit(1);
        }
    };

    server.run().await
}
