use anyhow::Context;
use chrono::DateTime;
use colored::Colorize;

use anyshare_registry::{sweep, Snapshot};
use anyshare_server::{AnyshareServer, ServerConfig};
use anyshare_store::FsObjectStore;
use anyshare_types::{Clock, ObjectRecord, ShareId, SystemClock};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::List(args) => cmd_list(args),
        Command::Show(args) => cmd_show(args),
        Command::Sweep(args) => cmd_sweep(args),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(root) = args.storage_root {
        config.storage_root = root;
    }
    if let Some(snapshot) = args.snapshot {
        config.snapshot_path = snapshot;
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(async move {
        let server = tokio::task::spawn_blocking(move || AnyshareServer::open(config))
            .await
            .context("server startup panicked")??;
        println!(
            "{} anyShare on {}{}",
            "✓".green().bold(),
            server.config().bind_addr.to_string().bold(),
            server.config().base_path
        );
        server.serve().await?;
        Ok(())
    })
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let index = Snapshot::new(&args.snapshot).load()?;
    if index.is_empty() {
        println!("No records in {}.", args.snapshot.display());
        return Ok(());
    }

    let now = SystemClock.now_epoch_secs();
    for record in index.iter() {
        println!(
            "{}  {:<24}  {:>10}  {}  {}",
            record.id.as_str().yellow().bold(),
            label(record),
            format!("{} B", record.size_bytes),
            format_timestamp(record.created_at).dimmed(),
            colored_remaining(record, now),
        );
    }
    println!("\n{} record(s)", index.len().to_string().bold());
    Ok(())
}

fn cmd_show(args: ShowArgs) -> anyhow::Result<()> {
    let id: ShareId = args.id.parse()?;
    let index = Snapshot::new(&args.snapshot).load()?;
    let record = index
        .get(&id)
        .with_context(|| format!("no record {id} in {}", args.snapshot.display()))?;

    let now = SystemClock.now_epoch_secs();
    println!("Record {}", record.id.as_str().yellow().bold());
    match &record.inline_text {
        Some(text) => println!("  Kind:    {}\n  Text:    {}", "text".cyan(), text),
        None => println!("  Kind:    {}\n  Name:    {}", "file".cyan(), record.display_name),
    }
    println!("  Size:    {} B", record.size_bytes);
    println!("  Created: {}", format_timestamp(record.created_at));
    println!("  TTL:     {}s", record.ttl_seconds);
    println!("  Expires: {}", colored_remaining(record, now));
    Ok(())
}

fn cmd_sweep(args: SweepArgs) -> anyhow::Result<()> {
    let snapshot = Snapshot::new(&args.snapshot);
    let mut index = snapshot.load()?;
    let store = FsObjectStore::open(&args.storage_root)?;

    let report = sweep(&mut index, &store, SystemClock.now_epoch_secs());
    snapshot.save(&index)?;

    println!(
        "{} Sweep: {} evicted, {} retained, {} remaining.",
        "✓".green(),
        report.evicted.len().to_string().bold(),
        report.retained.len(),
        index.len()
    );
    for id in &report.retained {
        println!("  {} payload of {} could not be deleted", "!".red(), id.as_str().yellow());
    }
    Ok(())
}

fn label(record: &ObjectRecord) -> String {
    match &record.inline_text {
        Some(_) => "[text]".to_string(),
        None => record.display_name.clone(),
    }
}

fn format_timestamp(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("@{secs}"),
    }
}

/// Time left before `record` expires, as seen at `now`.
fn remaining(record: &ObjectRecord, now: i64) -> String {
    if record.is_expired_at(now) {
        return "expired".into();
    }
    match record.expires_at() {
        None => "never".into(),
        Some(at) => format_duration(at - now),
    }
}

fn colored_remaining(record: &ObjectRecord, now: i64) -> colored::ColoredString {
    let text = remaining(record, now);
    match text.as_str() {
        "expired" => text.red(),
        "never" => text.cyan(),
        _ => text.green(),
    }
}

fn format_duration(secs: i64) -> String {
    let (h, m, s) = (secs / 3600, secs % 3600 / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m:02}m")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}
