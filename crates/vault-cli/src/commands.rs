use anyhow::{bail, Context};
use colored::Colorize;
use vault_ledger::{Checkpoint, FileLedger, LedgerRecord, VerificationResult};
use vault_sdk::{IssuanceService, Receipt, VaultConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let service = IssuanceService::open(&config)
        .with_context(|| format!("cannot open ledger {}", config.ledger_path.display()))?;
    let json = matches!(cli.format, OutputFormat::Json);

    match cli.command {
        Command::Issue(args) => cmd_issue(&service, args, json),
        Command::Verify(args) => cmd_verify(&service, args, json),
        Command::Lookup(args) => cmd_lookup(&service, args, json),
        Command::Lineage(args) => cmd_lineage(&service, args, json),
        Command::Tail => cmd_tail(&service, json),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<VaultConfig> {
    let mut config = match &cli.config {
        Some(path) => VaultConfig::from_toml_file(path)?,
        None => VaultConfig::default(),
    };
    if let Some(ledger) = &cli.ledger {
        config.ledger_path = ledger.clone();
    }
    Ok(config)
}

fn cmd_issue(
    service: &IssuanceService<FileLedger>,
    args: IssueArgs,
    json: bool,
) -> anyhow::Result<()> {
    let receipt = service.issue(
        &args.asset_type,
        &args.project_id,
        &args.source_reference,
        args.parent.as_deref(),
    )?;
    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        print_receipt(&receipt);
    }
    Ok(())
}

fn print_receipt(receipt: &Receipt) {
    println!("{} Issued {}", "✓".green().bold(), receipt.asset_id.yellow().bold());
    println!("  Audit hash: {}", receipt.audit_hash.to_string().cyan());
    println!("  Timestamp:  {}", receipt.timestamp);
    println!("  Glyph:      {}", receipt.glyph.bold());
    if let Some(parent) = &receipt.parent_asset_id {
        println!("  Parent:     {}", parent.yellow());
    }
}

fn cmd_verify(
    service: &IssuanceService<FileLedger>,
    args: VerifyArgs,
    json: bool,
) -> anyhow::Result<()> {
    let result = match args.checkpoint {
        Some(checkpoint) => service.verify_from_checkpoint(checkpoint)?,
        None => service.verify(args.from.unwrap_or(0))?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    match &result {
        VerificationResult::Verified {
            from_index,
            checked,
            tail_hash,
        } => {
            if !json {
                println!("{} Ledger chain verified", "✓".green().bold());
                println!(
                    "  Records checked: {} (from index {})",
                    checked.to_string().bold(),
                    from_index
                );
                println!("  Tail: {}", tail_hash.to_string().cyan());
                if let Some(checkpoint) = result.checkpoint() {
                    println!("  Resume with: --checkpoint {}", checkpoint.to_string().dimmed());
                }
            }
            Ok(())
        }
        VerificationResult::Violated(violation) => {
            if !json {
                println!(
                    "{} Integrity violation at record {}",
                    "✗".red().bold(),
                    violation.index.to_string().bold()
                );
                println!("  Kind:     {:?}", violation.kind);
                if let Some(expected) = violation.expected {
                    println!("  Expected: {}", expected.to_string().green());
                }
                if let Some(found) = violation.found {
                    println!("  Found:    {}", found.to_string().red());
                }
                println!("  Detail:   {}", violation.detail);
            }
            bail!("ledger integrity violation at record {}", violation.index)
        }
    }
}

fn cmd_lookup(
    service: &IssuanceService<FileLedger>,
    args: LookupArgs,
    json: bool,
) -> anyhow::Result<()> {
    let Some(record) = service.lookup(&args.key)? else {
        bail!("no record matches {}", args.key);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}

fn print_record(record: &LedgerRecord) {
    println!("{}", record.asset_id.yellow().bold());
    println!("  Type:       {}", record.asset_type);
    println!("  Project:    {}", record.project_id);
    println!("  Source:     {}", record.source_reference);
    if let Some(parent) = &record.parent_asset_id {
        println!("  Parent:     {}", parent.yellow());
    }
    println!("  Timestamp:  {}", record.timestamp);
    println!("  Audit hash: {}", record.audit_hash.to_string().cyan());
    println!("  Prev hash:  {}", record.vault_prev_hash.to_string().dimmed());
    println!("  Self hash:  {}", record.vault_self_hash.to_string().dimmed());
}

fn cmd_lineage(
    service: &IssuanceService<FileLedger>,
    args: LineageArgs,
    json: bool,
) -> anyhow::Result<()> {
    let lineage = service.lineage(&args.asset_id)?;
    if lineage.is_empty() {
        bail!("no record with asset id {}", args.asset_id);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&lineage)?);
        return Ok(());
    }
    for (depth, record) in lineage.iter().enumerate() {
        let marker = if depth == 0 { "*".green().bold() } else { "^".dimmed() };
        println!(
            "{} {} {}",
            marker,
            record.asset_id.yellow(),
            record.timestamp.to_string().dimmed()
        );
    }
    Ok(())
}

fn cmd_tail(service: &IssuanceService<FileLedger>, json: bool) -> anyhow::Result<()> {
    let records = service.len()?;
    let tail = service.tail_hash()?;
    let next = Checkpoint {
        index: records,
        prev_hash: tail,
    };
    if json {
        let out = serde_json::json!({
            "records": records,
            "tail_hash": tail,
            "checkpoint": next.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Records: {}", records.to_string().bold());
        println!("Tail:    {}", tail.to_string().cyan());
        if tail.is_genesis() {
            println!("         {}", "(genesis, ledger is empty)".dimmed());
        }
    }
    Ok(())
}
