//! Command-line interface for partybook.
//!
//! This module provides the CLI structure and command handlers for the
//! `partybook` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddArgs, CartCommand, CheckoutArgs, ConfigCommand, PackagesCommand, ServeCommand, SizeArg,
    UpdateArgs,
};

/// partybook - Party package catalog, cart and booking service
///
/// Browse party packages, build a cart of customized packages, and send
/// booking requests to the business inbox, from the command line or over HTTP.
#[derive(Debug, Parser)]
#[command(name = "partybook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP booking server
    Serve(ServeCommand),

    /// List the party packages
    Packages(PackagesCommand),

    /// Manage the local cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Packages(PackagesCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "partybook");
    }

    #[test]
    fn test_verbosity_quiet() {
        assert_eq!(cli(0, true).verbosity(), crate::logging::Verbosity::Quiet);
        // Quiet wins over -v.
        assert_eq!(cli(2, true).verbosity(), crate::logging::Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(cli(0, false).verbosity(), crate::logging::Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), crate::logging::Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["partybook", "serve", "--bind", "127.0.0.1:8080"]).unwrap();
        match cli.command {
            Command::Serve(cmd) => assert_eq!(cmd.bind.as_deref(), Some("127.0.0.1:8080")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_packages_json() {
        let cli = Cli::try_parse_from(["partybook", "packages", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Packages(PackagesCommand { json: true })
        ));
    }

    #[test]
    fn test_parse_cart_add_defaults() {
        let cli = Cli::try_parse_from(["partybook", "cart", "add", "package-a"]).unwrap();
        match cli.command {
            Command::Cart(CartCommand::Add(args)) => {
                assert_eq!(args.package, "package-a");
                assert_eq!(args.size, SizeArg::Medium);
                assert_eq!(args.hours, 2);
                assert!(!args.entertainment);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_cart_add_options() {
        let cli = Cli::try_parse_from([
            "partybook",
            "cart",
            "add",
            "package-d",
            "--size",
            "large",
            "--hours",
            "4",
            "--entertainment",
        ])
        .unwrap();
        match cli.command {
            Command::Cart(CartCommand::Add(args)) => {
                assert_eq!(args.size, SizeArg::Large);
                assert_eq!(args.hours, 4);
                assert!(args.entertainment);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_cart_add_rejects_hours_out_of_range() {
        assert!(Cli::try_parse_from(["partybook", "cart", "add", "package-a", "--hours", "5"]).is_err());
        assert!(Cli::try_parse_from(["partybook", "cart", "add", "package-a", "--hours", "0"]).is_err());
    }

    #[test]
    fn test_parse_cart_update() {
        let cli = Cli::try_parse_from([
            "partybook",
            "cart",
            "update",
            "abc",
            "--entertainment",
            "false",
        ])
        .unwrap();
        match cli.command {
            Command::Cart(CartCommand::Update(args)) => {
                assert_eq!(args.id, "abc");
                assert_eq!(args.entertainment, Some(false));
                assert!(args.size.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_checkout_requires_contact_fields() {
        assert!(Cli::try_parse_from(["partybook", "cart", "checkout", "--name", "Jane"]).is_err());

        let cli = Cli::try_parse_from([
            "partybook",
            "cart",
            "checkout",
            "--name",
            "Jane Doe",
            "--email",
            "jane@example.com",
            "--phone",
            "5551234567",
            "--date",
            "2025-06-01",
            "--address",
            "123 Main St",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Command::Cart(CartCommand::Checkout(args)) => {
                assert!(args.dry_run);
                assert_eq!(args.email, "jane@example.com");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_validate_with_file() {
        let cli = Cli::try_parse_from(["partybook", "config", "validate", "/tmp/x.toml"]).unwrap();
        match cli.command {
            Command::Config(ConfigCommand::Validate { file }) => {
                assert_eq!(file, Some(PathBuf::from("/tmp/x.toml")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["partybook", "packages", "-vv", "-c", "custom.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }
}
