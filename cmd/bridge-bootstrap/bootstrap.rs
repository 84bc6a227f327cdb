use bridge_bootstrap::cli::CLI;
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
    let CLI { opts, command } = CLI::parse();

    if let Err(err) = command.run(&opts).await {
        if tracing::dispatcher::has_been_set() {
            error!("{err:#}");
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(1);
    }
}
