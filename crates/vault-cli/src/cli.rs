use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vault_ledger::Checkpoint;
use vault_types::ChainHash;

#[derive(Parser)]
#[command(
    name = "vault",
    about = "Asset vault: verifiable identifiers on a hash-chained ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Ledger file; overrides `ledger_path` from the config file
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Issue a new identifier and record it on the ledger
    Issue(IssueArgs),
    /// Verify hash chain integrity
    Verify(VerifyArgs),
    /// Find a record by asset id or audit hash
    Lookup(LookupArgs),
    /// Show a record and its chain of parents
    Lineage(LineageArgs),
    /// Show the current chain tail
    Tail,
}

#[derive(Args)]
pub struct IssueArgs {
    /// FEATURE, EPIC, BUILD, SERVICE or ARTIFACT
    pub asset_type: String,
    pub project_id: String,
    pub source_reference: String,
    /// Asset id this issuance supersedes or derives from
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Start at this record, seeded from its predecessor's stored hash
    #[arg(long, conflicts_with = "checkpoint")]
    pub from: Option<usize>,
    /// Resume from INDEX:HASH as printed by an earlier run
    #[arg(long, value_parser = parse_checkpoint)]
    pub checkpoint: Option<Checkpoint>,
}

#[derive(Args)]
pub struct LookupArgs {
    pub key: String,
}

#[derive(Args)]
pub struct LineageArgs {
    pub asset_id: String,
}

fn parse_checkpoint(s: &str) -> Result<Checkpoint, String> {
    let (index, hash) = s
        .split_once(':')
        .ok_or_else(|| format!("expected INDEX:HASH, got {s:?}"))?;
    let index = index
        .parse()
        .map_err(|e| format!("invalid checkpoint index {index:?}: {e}"))?;
    let prev_hash = ChainHash::from_hex(hash).map_err(|e| e.to_string())?;
    Ok(Checkpoint { index, prev_hash })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_issue() {
        let cli = Cli::try_parse_from(["vault", "issue", "FEATURE", "CORE-API", "v1.2.0"]).unwrap();
        if let Command::Issue(args) = cli.command {
            assert_eq!(args.asset_type, "FEATURE");
            assert_eq!(args.project_id, "CORE-API");
            assert_eq!(args.source_reference, "v1.2.0");
            assert!(args.parent.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_issue_with_parent() {
        let cli =
            Cli::try_parse_from(["vault", "issue", "BUILD", "WEB", "a4b2", "--parent", "X-1"])
                .unwrap();
        if let Command::Issue(args) = cli.command {
            assert_eq!(args.parent, Some("X-1".into()));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verify_from() {
        let cli = Cli::try_parse_from(["vault", "verify", "--from", "7"]).unwrap();
        if let Command::Verify(args) = cli.command {
            assert_eq!(args.from, Some(7));
            assert!(args.checkpoint.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verify_checkpoint() {
        let arg = format!("3:{}", "ab".repeat(32));
        let cli = Cli::try_parse_from(["vault", "verify", "--checkpoint", arg.as_str()]).unwrap();
        if let Command::Verify(args) = cli.command {
            let cp = args.checkpoint.unwrap();
            assert_eq!(cp.index, 3);
            assert_eq!(cp.prev_hash, ChainHash::from_hash([0xab; 32]));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn verify_rejects_both_start_points() {
        let arg = format!("3:{}", "ab".repeat(32));
        let args = ["vault", "verify", "--from", "1", "--checkpoint", arg.as_str()];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn bad_checkpoint_is_rejected() {
        assert!(Cli::try_parse_from(["vault", "verify", "--checkpoint", "3"]).is_err());
        assert!(Cli::try_parse_from(["vault", "verify", "--checkpoint", "x:00"]).is_err());
        assert!(Cli::try_parse_from(["vault", "verify", "--checkpoint", "1:abc"]).is_err());
    }

    #[test]
    fn parse_tail_with_globals() {
        let cli = Cli::try_parse_from([
            "vault",
            "tail",
            "--ledger",
            "/tmp/l.jsonl",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Tail));
        assert_eq!(cli.ledger, Some(PathBuf::from("/tmp/l.jsonl")));
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(cli.verbose);
    }

    #[test]
    fn parse_lookup_and_lineage() {
        let cli = Cli::try_parse_from(["vault", "lookup", "abc"]).unwrap();
        assert!(matches!(cli.command, Command::Lookup(ref a) if a.key == "abc"));
        let cli = Cli::try_parse_from(["vault", "--config", "v.toml", "lineage", "ID"]).unwrap();
        assert!(matches!(cli.command, Command::Lineage(ref a) if a.asset_id == "ID"));
        assert_eq!(cli.config, Some(PathBuf::from("v.toml")));
    }
}
