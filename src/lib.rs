use clap::{Parser, Subcommand};
use futures::{Stream, StreamExt, TryStreamExt};
use pluralkit::model::MemberId;
use pluralkit::{ApiVersion, AsyncClient, BlockingClient, ClientConfig, Error, SystemRef};
use url::Url;

use config::{Config, ConfigError};

pub mod config;
pub mod output;
pub mod utils;

pub const USER_AGENT: &str = concat!("pkctl/v", env!("CARGO_PKG_VERSION"));

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Parser, Debug)]
#[command(name = "pkctl")]
#[command(about = "Query and edit a PluralKit system from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// System token; stored with `login` otherwise
    #[arg(long, env = "PLURALKIT_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// API version to talk to (v1 or v2)
    #[arg(long, global = true)]
    pub api_version: Option<ApiVersion>,

    /// API base URL, for self-hosted instances
    #[arg(long, global = true)]
    pub base_url: Option<Url>,

    /// Use the blocking client instead of the async one
    #[arg(long, global = true)]
    pub blocking: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a system (default: your own)
    System { system: Option<SystemRef> },
    /// List a system's members
    Members {
        system: Option<SystemRef>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show a member
    Member { id: MemberId },
    /// List a system's groups
    Groups {
        system: Option<SystemRef>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show who is fronting
    Fronters { system: Option<SystemRef> },
    /// List switches, newest first
    Switches {
        system: Option<SystemRef>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Log a switch; no members means switching out
    Switch { members: Vec<MemberId> },
    /// Look up a proxied message
    Message { id: u64 },
    /// Change a member's name
    Rename { id: MemberId, name: String },
    /// Store a token in the config file
    Login { token: String },
    /// Remove the stored token
    Logout,
}

/// Handles the commands that only touch the config file. Returns the client
/// settings and the command if it needs the API.
fn prepare(cli: Cli) -> Result<Option<(ClientConfig, Command)>, ConfigError> {
    let mut config = Config::load();

    match cli.command {
        Command::Login { token } => {
            config.token = Some(token);
            config.save()?;
            println!("token saved");
            Ok(None)
        }
        Command::Logout => {
            config.token = None;
            config.save()?;
            println!("token removed");
            Ok(None)
        }
        command => Ok(Some((
            config.client_config(cli.token, cli.api_version, cli.base_url),
            command,
        ))),
    }
}

fn system_or_me(system: Option<SystemRef>) -> SystemRef {
    system.unwrap_or(SystemRef::Me)
}

async fn print_stream<T, S>(items: S, limit: Option<usize>, render: fn(&T) -> String) -> Result<(), Error>
where
    S: Stream<Item = Result<T, Error>> + Unpin,
{
    let mut items = items.take(limit.unwrap_or(usize::MAX));
    while let Some(item) = items.try_next().await? {
        println!("{}", render(&item));
    }
    Ok(())
}

fn print_iter<T, I>(items: I, limit: Option<usize>, render: fn(&T) -> String) -> Result<(), Error>
where
    I: Iterator<Item = Result<T, Error>>,
{
    for item in items.take(limit.unwrap_or(usize::MAX)) {
        println!("{}", render(&item?));
    }
    Ok(())
}

/// Runs a command with the async client.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let Some((config, command)) = prepare(cli)? else {
        return Ok(());
    };
    let client = AsyncClient::new(config)?;

    match command {
        Command::System { system } => {
            println!("{}", output::system(&client.get_system(system_or_me(system)).await?));
        }
        Command::Members { system, limit } => {
            print_stream(client.get_members(system_or_me(system)), limit, output::member).await?;
        }
        Command::Member { id } => println!("{}", output::member(&client.get_member(id).await?)),
        Command::Groups { system, limit } => {
            print_stream(client.get_groups(system_or_me(system), false), limit, output::group).await?;
        }
        Command::Fronters { system } => match client.get_fronters(system_or_me(system)).await? {
            Some(switch) => println!("{}", output::switch(&switch)),
            None => println!("no switches logged"),
        },
        Command::Switches { system, limit } => {
            print_stream(client.get_switches(system_or_me(system), None), limit, output::switch).await?;
        }
        Command::Switch { members } => match client.create_switch(members, None).await? {
            Some(switch) => println!("{}", output::switch(&switch)),
            None => println!("switch logged"),
        },
        Command::Message { id } => println!("{}", output::message(&client.get_message(id).await?)),
        Command::Rename { id, name } => {
            let mut member = client.get_member(id).await?;
            member.name = name;
            client.update_member(&mut member).await?;
            println!("{}", output::member(&member));
        }
        Command::Login { .. } | Command::Logout => {}
    }

    Ok(())
}

/// Runs a command with the blocking client. Must not be called on an async runtime.
pub fn run_blocking(cli: Cli) -> Result<(), CliError> {
    let Some((config, command)) = prepare(cli)? else {
        return Ok(());
    };
    let client = BlockingClient::new(config)?;

    match command {
        Command::System { system } => {
            println!("{}", output::system(&client.get_system(system_or_me(system))?));
        }
        Command::Members { system, limit } => {
            print_iter(client.get_members(system_or_me(system)), limit, output::member)?;
        }
        Command::Member { id } => println!("{}", output::member(&client.get_member(id)?)),
        Command::Groups { system, limit } => {
            print_iter(client.get_groups(system_or_me(system), false), limit, output::group)?;
        }
        Command::Fronters { system } => match client.get_fronters(system_or_me(system))? {
            Some(switch) => println!("{}", output::switch(&switch)),
            None => println!("no switches logged"),
        },
        Command::Switches { system, limit } => {
            print_iter(client.get_switches(system_or_me(system), None), limit, output::switch)?;
        }
        Command::Switch { members } => match client.create_switch(members, None)? {
            Some(switch) => println!("{}", output::switch(&switch)),
            None => println!("switch logged"),
        },
        Command::Message { id } => println!("{}", output::message(&client.get_message(id)?)),
        Command::Rename { id, name } => {
            let mut member = client.get_member(id)?;
            member.name = name;
            client.update_member(&mut member)?;
            println!("{}", output::member(&member));
        }
        Command::Login { .. } | Command::Logout => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::parse_from(["pkctl", "--api-version", "v1", "members", "abcde", "--limit", "5"]);
        assert_eq!(cli.api_version, Some(ApiVersion::V1));
        match cli.command {
            Command::Members { system, limit } => {
                assert_eq!(system.unwrap().to_string(), "abcde");
                assert_eq!(limit, Some(5));
            }
            other => panic!("parsed as {other:?}"),
        }

        assert!(Cli::try_parse_from(["pkctl", "member", "not an id"]).is_err());
        let cli = Cli::parse_from(["pkctl", "switch"]);
        assert!(matches!(cli.command, Command::Switch { members } if members.is_empty()));
    }

    #[test]
    fn test_error_chain() {
        use std::path::PathBuf;

        use crate::utils::ErrorWithCauses;

        let error = CliError::from(ConfigError::Write {
            path: PathBuf::from("/nowhere/config.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
        });
        assert_eq!(
            ErrorWithCauses(error).to_string(),
            "could not write /nowhere/config.json: permission denied"
        );
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
