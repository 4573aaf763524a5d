use anyhow::Result;
use dotenvy::dotenv;
use thermoclock::station::Station;
use tokio::signal;
use tracing::{info, Level};
// Include these modules as part of the binary crate, not the library crate
// as this contains the actual implementation of the logging facility
mod argparse;
mod logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = argparse::parse();

    let level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _guards = logging::init(level, cli.console, Some(&cli.log_file));

    let settings = cli.settings();
    info!("Starting with {settings:?}");
    let mut station = Station::new(settings).await?;
    station.run(signal::ctrl_c()).await?;
    Ok(())
}
