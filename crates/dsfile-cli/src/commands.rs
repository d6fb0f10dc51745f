use std::path::Path;
use std::sync::PoisonError;

use anyhow::{bail, Context};
use colored::Colorize;
use dsfile_codec::CodecKind;
use dsfile_lock::{FileLocker, LockIdentity, Locker, PortLocker};
use dsfile_store::{shared, ErrorKind, PersistedFile};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Inspect(args) => cmd_inspect(&config, args),
        Command::Convert(args) => cmd_convert(&config, args),
        Command::ProbeLock(args) => cmd_probe_lock(args),
        Command::Config => cmd_config(&config),
    }
}

fn cmd_inspect(config: &CliConfig, args: InspectArgs) -> anyhow::Result<()> {
    let codec = config.codec_for(&args.path, args.codec);
    let doc = read_document(config, &args.path, codec, config.lock_for(args.lock))?;
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn cmd_convert(config: &CliConfig, args: ConvertArgs) -> anyhow::Result<()> {
    let from = config.codec_for(&args.src, args.from);
    let to = config.codec_for(&args.dst, args.to);
    require_self_describing(to, &args.dst)?;

    let doc = read_document(config, &args.src, from, LockIdentity::Port(0))?;
    write_document(
        config,
        &args.dst,
        to,
        config.lock_for(args.lock),
        doc,
        args.force,
    )?;

    println!(
        "{} Converted {} ({}) → {} ({})",
        "✓".green().bold(),
        args.src.display(),
        from.to_string().cyan(),
        args.dst.display(),
        to.to_string().cyan()
    );
    Ok(())
}

fn cmd_probe_lock(args: ProbeLockArgs) -> anyhow::Result<()> {
    let identity = args.identity;
    let mut locker = checked_locker(identity.clone())?;
    match locker.acquire() {
        Ok(()) => {
            locker.release();
            println!("{} {} is free", "✓".green().bold(), identity.to_string().bold());
        }
        Err(e) => {
            println!("{} {} is held: {}", "✗".red().bold(), identity.to_string().bold(), e);
        }
    }
    Ok(())
}

fn cmd_config(config: &CliConfig) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Build a locker that reports a bad lock-file path as an error rather
/// than aborting the process.
fn checked_locker(identity: LockIdentity) -> anyhow::Result<Box<dyn Locker>> {
    Ok(match identity {
        LockIdentity::Port(port) => Box::new(PortLocker::new(port)),
        LockIdentity::File(path) => Box::new(FileLocker::new_checked(path)?),
    })
}

fn require_self_describing(codec: CodecKind, path: &Path) -> anyhow::Result<()> {
    if !codec.is_self_describing() {
        bail!(
            "{} uses the {} codec, which cannot be read or written without its Rust type",
            path.display(),
            codec
        );
    }
    Ok(())
}

/// Load `path` as a schemaless document while holding `identity`.
fn read_document(
    config: &CliConfig,
    path: &Path,
    codec: CodecKind,
    identity: LockIdentity,
) -> anyhow::Result<Value> {
    require_self_describing(codec, path)?;
    if !path.is_file() {
        bail!("{} does not exist", path.display());
    }

    let doc = shared(Value::Null);
    let file = PersistedFile::open_with_config(
        doc.clone(),
        path,
        codec,
        checked_locker(identity)?,
        config.store.clone(),
    )
    .with_context(|| format!("failed to read {}", path.display()))?;
    file.close();

    debug!(path = %path.display(), %codec, "document read");
    let value = doc.read().unwrap_or_else(PoisonError::into_inner).clone();
    Ok(value)
}

/// Replace `path` with `doc` encoded by `codec`, holding `identity`.
///
/// Opening the destination loads whatever is already there. An existing file
/// that does not decode with `codec` is refused unless `force` is set, in
/// which case it is removed while the lock is held and the open retried.
fn write_document(
    config: &CliConfig,
    path: &Path,
    codec: CodecKind,
    identity: LockIdentity,
    doc: Value,
    force: bool,
) -> anyhow::Result<()> {
    let target = shared(Value::Null);
    let open = |locker: Box<dyn Locker>| {
        PersistedFile::open_with_config(target.clone(), path, codec, locker, config.store.clone())
    };

    let file = match open(checked_locker(identity.clone())?) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::DecodeFailed && force => {
            warn!(path = %path.display(), %codec, error = %e, "replacing undecodable destination");
            let mut locker = checked_locker(identity.clone())?;
            locker
                .acquire()
                .with_context(|| format!("lock fail on {identity}"))?;
            let removed = std::fs::remove_file(path);
            locker.release();
            removed.with_context(|| format!("failed to remove {}", path.display()))?;
            open(checked_locker(identity)?)
                .with_context(|| format!("failed to open destination {}", path.display()))?
        }
        Err(e) if e.kind() == ErrorKind::DecodeFailed => {
            return Err(e).with_context(|| {
                format!(
                    "destination {} is not a {codec} document; pass --force to replace it",
                    path.display()
                )
            });
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to open destination {}", path.display()));
        }
    };

    *target.write().unwrap_or_else(PoisonError::into_inner) = doc;
    file.save()
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.close();
    Ok(())
}
