//! fleetlockctl - FleetLock client CLI
//!
//! Runs one protocol operation against a FleetLock server and exits non-zero
//! if it fails. Intended to be called by reboot managers before rebooting and
//! once the node is healthy again.

mod logging;
mod machine_id;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fleetlock_core::{
    BasicAuthTransport, CancellationToken, Config, FleetLockClient, ReqwestTransport,
    DEFAULT_GROUP,
};

/// FleetLock reboot-coordination client
#[derive(Parser, Debug)]
#[command(name = "fleetlockctl")]
#[command(version, about = "FleetLock reboot-coordination client")]
struct Cli {
    /// FleetLock group
    #[arg(short, long, global = true, env = "FLEETLOCK_GROUP", default_value = DEFAULT_GROUP)]
    group: String,

    /// FleetLock instance ID (defaults to the content of /etc/machine-id)
    #[arg(short, long, global = true, env = "FLEETLOCK_ID")]
    id: Option<String>,

    /// FleetLock endpoint URL
    #[arg(short, long, global = true, env = "FLEETLOCK_URL")]
    url: Option<String>,

    /// Username for HTTP Basic authentication
    #[arg(long, global = true, env = "FLEETLOCK_USERNAME")]
    username: Option<String>,

    /// Password for HTTP Basic authentication
    #[arg(long, global = true, env = "FLEETLOCK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Try to reserve (lock) a slot for rebooting
    RecursiveLock,
    /// Try to release (unlock) a slot that it was previously holding
    UnlockIfHeld,
}

impl Cli {
    fn config(&self, machine_id_path: &Path) -> anyhow::Result<Config> {
        let id = match &self.id {
            Some(id) => id.clone(),
            None => machine_id::read(machine_id_path)?,
        };

        let mut config = Config::new(self.url.clone().unwrap_or_default(), id)
            .with_group(self.group.clone());
        if let Some(username) = &self.username {
            let password = self.password.clone().unwrap_or_default();
            config = config.with_transport(BasicAuthTransport::new(
                username.clone(),
                password,
                ReqwestTransport::new(),
            ));
        }
        Ok(config)
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config(Path::new(machine_id::MACHINE_ID_PATH))?;
    let client = FleetLockClient::new(config).context("building the client")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling request");
            on_signal.cancel();
        }
    });

    tracing::debug!(?client, command = ?cli.command, "running");
    match cli.command {
        Command::RecursiveLock => client.recursive_lock(&cancel).await.context("locking"),
        Command::UnlockIfHeld => client.unlock_if_held(&cancel).await.context("unlocking"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse before logging so usage errors go straight to the terminal.
    let cli = Cli::parse();
    logging::init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("unable to execute command: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn subcommands_use_protocol_names() {
        let cli = Cli::try_parse_from(["fleetlockctl", "recursive-lock"]).unwrap();
        assert_eq!(cli.command, Command::RecursiveLock);

        let cli = Cli::try_parse_from(["fleetlockctl", "unlock-if-held"]).unwrap();
        assert_eq!(cli.command, Command::UnlockIfHeld);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["fleetlockctl"]).is_err());
    }

    #[test]
    fn short_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fleetlockctl",
            "recursive-lock",
            "-u",
            "http://1.2.3.4",
            "-g",
            "workers",
            "-i",
            "1234",
        ])
        .unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://1.2.3.4"));
        assert_eq!(cli.group, "workers");
        assert_eq!(cli.id.as_deref(), Some("1234"));
    }

    #[test]
    fn explicit_id_skips_machine_id_file() {
        let cli = Cli::try_parse_from([
            "fleetlockctl",
            "--url",
            "http://1.2.3.4",
            "--id",
            "1234",
            "unlock-if-held",
        ])
        .unwrap();

        let config = cli.config(Path::new("/nonexistent/machine-id")).unwrap();

        assert_eq!(config.url, "http://1.2.3.4");
        assert_eq!(config.id, "1234");
        assert_eq!(config.group, "default");
        assert!(config.transport.is_none());
    }

    #[test]
    fn missing_id_falls_back_to_machine_id() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "abcdef").unwrap();
        let cli =
            Cli::try_parse_from(["fleetlockctl", "--url", "http://1.2.3.4", "recursive-lock"])
                .unwrap();

        let config = cli.config(file.path()).unwrap();

        assert_eq!(config.id, "abcdef");
    }

    #[test]
    fn username_installs_basic_auth_transport() {
        let cli = Cli::try_parse_from([
            "fleetlockctl",
            "--id",
            "1234",
            "--username",
            "flatcar",
            "recursive-lock",
        ])
        .unwrap();

        let config = cli.config(Path::new("/nonexistent/machine-id")).unwrap();

        assert!(config.transport.is_some());
    }

    #[test]
    fn missing_url_is_reported_by_client() {
        let cli = Cli::try_parse_from(["fleetlockctl", "--id", "1234", "recursive-lock"]).unwrap();

        let config = cli.config(Path::new("/nonexistent/machine-id")).unwrap();
        let err = FleetLockClient::new(config).unwrap_err();

        assert_eq!(err.to_string(), "URL is required");
    }
}
