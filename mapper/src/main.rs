use clap::Parser;
use log::error;
use mapper::MapperArgs;

#[tokio::main]
async fn main() {
    shared::init_logging();

    let args = MapperArgs::parse();

    let result = match args.into_config() {
        Ok(cfg) => mapper::run(&cfg).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("FATAL ERROR: {}", e);
        std::process::exit(1);
    }
}
