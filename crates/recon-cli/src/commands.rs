use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use tracing::info;

use recon_merge::{ConflictResolver, MergeClass, MergeConfig, MergeEngine, MergeError, OutcomeEntry};
use recon_record::{write_record, JsonCodec, RecordCodec, RecordDigest};

use crate::cli::*;
use crate::prompt::PromptResolver;

/// Per-directory merge configuration, read when `--config` is absent.
pub const CONFIG_FILE: &str = ".recon-merge.toml";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Merge(args) => cmd_merge(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    let result = if args.interactive {
        let stdin = io::stdin();
        let mut prompt = PromptResolver::new(stdin.lock(), io::stdout());
        merge_files(&args, Some(&mut prompt))
    } else {
        merge_files(&args, None)
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(MergeError::UnresolvedConflicts(conflicts)) = e.downcast_ref::<MergeError>() {
                for c in conflicts {
                    println!("{} {}", "conflict:".red().bold(), c);
                    for (side, s) in [("A", &c.a), ("B", &c.b)] {
                        match s {
                            Some(s) => println!("  {}: {s}", side.yellow()),
                            None => println!("  {}: {}", side.yellow(), "deleted".dimmed()),
                        }
                    }
                }
                println!("Nothing was written; rerun with {} or {}.", "--strategy".bold(), "--interactive".bold());
            }
            return Err(e);
        }
    };

    for entry in &report.entries {
        if entry.class != MergeClass::Identical {
            let action = match entry.resolution {
                Some(r) => format!(" -> {r}"),
                None => String::new(),
            };
            println!("  {:<16} {}{}", entry.class.to_string().cyan(), entry.name, action);
        }
    }
    println!(
        "{} Merged into {} ({})",
        "✓".green().bold(),
        report.output.display().to_string().bold(),
        report.digest.short_hex().dimmed()
    );
    if let Some(removed) = &report.removed {
        println!("  Removed {}", removed.display());
    }
    Ok(())
}

/// What a successful merge did on disk.
#[derive(Debug)]
pub struct MergeReport {
    pub output: PathBuf,
    pub digest: RecordDigest,
    pub entries: Vec<OutcomeEntry>,
    /// The superseded other-branch file, if it was deleted.
    pub removed: Option<PathBuf>,
}

/// Decode, merge, persist, and only then delete the superseded file.
///
/// `resolver` answers conflicts; `None` uses the configured policy.
pub fn merge_files(args: &MergeArgs, resolver: Option<&mut dyn ConflictResolver>) -> anyhow::Result<MergeReport> {
    let codec = JsonCodec::pretty();
    let name = record_name(&args.current)?;
    let config = load_config(args)?;

    let a = codec
        .decode_path(&args.current)
        .with_context(|| format!("reading {}", args.current.display()))?;
    let b = codec
        .decode_path(&args.other)
        .with_context(|| format!("reading {}", args.other.display()))?;
    let base = match &args.base {
        Some(p) => Some(codec.decode_path(p).with_context(|| format!("reading {}", p.display()))?),
        None => None,
    };

    let mut policy = config.policy;
    let engine = MergeEngine::new(config);
    let plan = engine.plan(base.as_ref(), &a, &b)?;
    let outcome = match resolver {
        Some(r) => plan.resolve(r)?,
        None => plan.resolve(&mut policy)?,
    };

    let mut record = outcome.record;
    record.set_name(name.as_str());
    let output = args.output.clone().unwrap_or_else(|| args.current.clone());
    let digest = write_record(&output, &record, &codec)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(record = %record.file_name(), output = %output.display(), digest = %digest.short_hex(), "merged record written");

    let removed = if outcome.sources_superseded && !args.keep_sources && !same_file(&args.other, &output) {
        fs::remove_file(&args.other).with_context(|| format!("removing {}", args.other.display()))?;
        info!(path = %args.other.display(), "removed superseded file");
        Some(args.other.clone())
    } else {
        None
    };

    Ok(MergeReport {
        output,
        digest,
        entries: outcome.entries,
        removed,
    })
}

/// Records live in a directory named after the series.
fn record_dir(path: &Path) -> anyhow::Result<PathBuf> {
    let abs = path
        .canonicalize()
        .with_context(|| format!("resolving {}", path.display()))?;
    match abs.parent() {
        Some(dir) => Ok(dir.to_path_buf()),
        None => bail!("{} has no parent directory", abs.display()),
    }
}

fn record_name(path: &Path) -> anyhow::Result<String> {
    let dir = record_dir(path)?;
    match dir.file_name().and_then(|n| n.to_str()) {
        Some(name) => Ok(name.to_string()),
        None => bail!("cannot derive a record name from {}", dir.display()),
    }
}

fn load_config(args: &MergeArgs) -> anyhow::Result<MergeConfig> {
    let path = match &args.config {
        Some(p) => Some(p.clone()),
        None => Some(record_dir(&args.current)?.join(CONFIG_FILE)).filter(|p| p.exists()),
    };
    let mut config = match path {
        Some(p) => {
            let text = fs::read_to_string(&p).with_context(|| format!("reading {}", p.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing {}", p.display()))?
        }
        None => MergeConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config.policy = strategy.into();
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    Ok(config)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let record = JsonCodec::default()
        .decode_path(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    println!("{} {}", record.kind().to_string().cyan(), record.file_name().bold());
    println!("  {} contour(s)", record.len());
    for c in record.contours() {
        let reverse = match c.is_reverse() {
            Ok(true) => " reverse".yellow().to_string(),
            _ => String::new(),
        };
        println!("  {}{}", c.summary(), reverse);
    }
    Ok(())
}
