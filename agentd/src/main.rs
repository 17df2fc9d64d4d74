use clap::{Parser, Subcommand};
use rst_common::with_tokio::tokio;

use prople_agentd::errors::AgentdError;
use prople_agentd::svc::demo::Demo;

#[derive(Parser)]
#[command(name = "agentd")]
#[command(version = "1.0")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "demo")]
    #[command(about = "Running the issuer and holder demo flow")]
    Demo {
        #[arg(short, long, value_name = "FILE")]
        #[arg(required = true)]
        config: Option<String>,

        #[arg(short, long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), AgentdError> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Demo { config, timeout_ms } => {
            let conf_file = config
                .to_owned()
                .ok_or_else(|| AgentdError::ConfigError("missing config file".to_string()))?;

            let demo = Demo::new(conf_file, timeout_ms.to_owned());
            demo.setup_logging();

            let _ = demo.run().await?;
        }
    }

    Ok(())
}
