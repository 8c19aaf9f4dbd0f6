use clap::error::ErrorKind;
use clap::Parser;
use control::commands::{Command, Controller};
use control::config::ControlConfig;
use log::debug;

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage the Bedrock server containers", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    shared::init_logging();

    // Usage errors exit with 1, help and version keep clap's behaviour
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let config = ControlConfig::from_env();
    debug!("Using {:?}", config);

    let controller = Controller::new(config);
    controller.run(args.command).await?;

    Ok(())
}
