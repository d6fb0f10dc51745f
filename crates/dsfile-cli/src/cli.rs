use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dsfile_codec::CodecKind;
use dsfile_lock::LockIdentity;

#[derive(Parser)]
#[command(
    name = "dsfile",
    about = "Inspect, convert and lock-probe dsfile durable files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with store, codec and lock defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode a self-describing file and print it as JSON
    Inspect(InspectArgs),
    /// Re-encode a file with another codec
    Convert(ConvertArgs),
    /// Check whether a lock identity is free
    ProbeLock(ProbeLockArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct InspectArgs {
    pub path: PathBuf,

    /// Codec of the file (default: from extension, then config)
    #[arg(long)]
    pub codec: Option<CodecKind>,

    /// Lock to hold while reading (port:N or file:PATH)
    #[arg(long)]
    pub lock: Option<LockIdentity>,
}

#[derive(Args)]
pub struct ConvertArgs {
    pub src: PathBuf,
    pub dst: PathBuf,

    #[arg(long)]
    pub from: Option<CodecKind>,

    #[arg(long)]
    pub to: Option<CodecKind>,

    /// Lock guarding the destination (port:N or file:PATH)
    #[arg(long)]
    pub lock: Option<LockIdentity>,

    /// Replace a destination that cannot be decoded with the target codec
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ProbeLockArgs {
    /// port:N or file:PATH
    pub identity: LockIdentity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_convert() {
        let cli = Cli::try_parse_from([
            "dsfile", "convert", "a.json", "b.cbor", "--to", "cbor", "--lock", "port:31000",
        ])
        .unwrap();
        match cli.command {
            Command::Convert(args) => {
                assert_eq!(args.to, Some(CodecKind::Cbor));
                assert_eq!(args.from, None);
                assert_eq!(args.lock, Some(LockIdentity::Port(31000)));
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn rejects_bad_codec() {
        assert!(Cli::try_parse_from(["dsfile", "inspect", "x", "--codec", "yaml"]).is_err());
    }

    #[test]
    fn parses_probe_lock() {
        let cli = Cli::try_parse_from(["dsfile", "-v", "probe-lock", "file:/tmp/a.lock"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::ProbeLock(ProbeLockArgs { identity: LockIdentity::File(_) })
        ));
    }
}
