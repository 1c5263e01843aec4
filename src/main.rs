use std::env;
use std::io;
use std::process::ExitCode;

use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use vendcore::csv::{read_commands, write_ledger};
use vendcore::{MachineConfig, VendingMachine};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: vendcore <events.csv> [config.yaml]");
        return ExitCode::FAILURE;
    };

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let config = match args.next() {
        Some(config_path) => match MachineConfig::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %config_path, "{e}");
                return ExitCode::FAILURE;
            }
        },
        None => MachineConfig::default(),
    };

    let mut machine = match VendingMachine::new(&config) {
        Ok(machine) => machine,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // owned path so the command iterator can move into the reader task
    let commands = match read_commands(path.clone()) {
        Ok(commands) => commands,
        Err(e) => {
            error!(path, "{e}");
            return ExitCode::FAILURE;
        }
    };

    let (command_sender, command_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in commands {
            match result {
                Ok(command) => {
                    if command_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    machine.run(ReceiverStream::new(command_receiver)).await;

    if let Err(e) = write_ledger(io::stdout().lock(), machine.ledger().stock()) {
        error!("failed to write ledger: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
