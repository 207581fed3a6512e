#![forbid(unsafe_code)]

mod commands;

use clap::{Parser, Subcommand};
use onvif_bin_utils::completions_command::CompletionsCommand;

use crate::commands::{
    capabilities::CapabilitiesCommand, check::CheckCommand, profiles::ProfilesCommand,
    store::StoreCommand, time::TimeCommand, Target,
};

/// Talk to ONVIF devices.
#[derive(Parser)]
#[command(name = "onvif")]
struct Cli {
    #[command(flatten)]
    target: Target,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn exec(self) -> anyhow::Result<()> {
        let Self { target, command } = self;
        match command {
            Commands::Capabilities(cmd) => cmd.exec(target.resolve()?).await?,
            Commands::Time(cmd) => cmd.exec(target.resolve()?).await?,
            Commands::Profiles(cmd) => cmd.exec(target.resolve()?).await?,
            Commands::Check(cmd) => cmd.exec(target.resolve()?).await?,
            Commands::Store(cmd) => cmd.exec(target.device()?)?,
            Commands::Completions(cmd) => cmd.exec::<Self>()?,
        }
        Ok(())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the service addresses advertised by the device
    Capabilities(CapabilitiesCommand),
    /// Print the device clock and how far it is from the local one
    Time(TimeCommand),
    /// List the media profiles of the device
    Profiles(ProfilesCommand),
    /// Create a client for every service and report which ones work
    Check(CheckCommand),
    /// Remember the device so that later commands need no flags
    Store(StoreCommand),
    /// Print a completion file for the given shell.
    ///
    /// Example: `onvif completions zsh | source /dev/stdin`.
    Completions(CompletionsCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut guard = onvif_bin_utils::logger::init();
    Cli::parse().exec().await?;
    guard.disarm();
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn stored_device_comes_from_the_flags() {
        let cli = Cli::try_parse_from([
            "onvif",
            "store",
            "--destination",
            "environment",
            "--host",
            "cam:8080",
            "--url",
            "http://cam:8080/onvif/device",
            "--user",
            "admin",
            "--pass",
            "secret",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Store(_)));
        let device = cli.target.device().unwrap();
        assert_eq!(device.host, "cam:8080");
        assert_eq!(
            device.url.map(String::from).as_deref(),
            Some("http://cam:8080/onvif/device")
        );
        assert_eq!(device.username, "admin");
        assert_eq!(device.password, "secret");
    }
}
