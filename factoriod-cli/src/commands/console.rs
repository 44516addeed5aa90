//! Remote-console queries against the running server.

use std::process::ExitCode;

use clap::Subcommand;

use factoriod::config::FactorioConfig;
use factoriod::rcon::{RconClient, RconError};

#[derive(Subcommand)]
pub enum ConsoleCommand {
    /// List players currently online.
    Players,
    /// Show items launched in rockets, per item.
    ItemsLaunched,
    /// Send a raw console command and print the reply.
    Send { command: String },
}

pub async fn execute(config: &FactorioConfig, command: ConsoleCommand) -> ExitCode {
    let client = RconClient::new(config.rcon.address.clone());
    match &config.rcon.password {
        Some(password) => client.configure(password.clone()).await,
        None => {
            eprintln!("no rcon password configured; set rcon.password in the config file");
            return ExitCode::from(2);
        }
    }

    let result = match command {
        ConsoleCommand::Players => client.list_online_players().await.map(|players| {
            if players.is_empty() {
                println!("no players online");
            } else {
                for player in players {
                    println!("{}", player);
                }
            }
        }),
        ConsoleCommand::ItemsLaunched => client.get_items_launched().await.map(|items| {
            if items.is_empty() {
                println!("nothing launched yet");
            } else {
                for (item, count) in items {
                    println!("{:>8}  {}", count, item);
                }
            }
        }),
        ConsoleCommand::Send { command } => client
            .send_custom_command(&command)
            .await
            .map(|reply| println!("{}", reply)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ RconError::ConfigurationRequired) => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("console command failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
