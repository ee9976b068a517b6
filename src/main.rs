//! hashstats - Print statistics about a deduplication hash database.
//!
//! Usage:
//!   hashstats HASHFILE             Header info and the top 10 hash buckets
//!   hashstats -n 50 HASHFILE       Top 50 buckets
//!   hashstats -a -b HASHFILE       Every bucket, with each member block
//!   hashstats -l HASHFILE          Also list every file record
//!   hashstats --format json FILE   Machine-readable report

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use hashstats_analyze::{BlockRow, LoadSummary, RankedReporter, RankedRow, RankingIndex, Report};
use hashstats_core::{DbHeader, FileRegistry, Limit, ReportConfig};
use hashstats_db::HashDb;

#[derive(Parser)]
#[command(
    name = "hashstats",
    version,
    about = "Print information about deduplication hashes",
    long_about = "hashstats reads a hash database written by a block deduplication \
                  tool and reports which hashes are shared by the most blocks.\n\n\
                  By default the 10 largest hash buckets are printed."
)]
struct Cli {
    /// Hash database to read
    hashfile: PathBuf,

    /// Print top N hashes, sorted by bucket size
    #[arg(short = 'n', long = "num", default_value = "10", allow_negative_numbers = true)]
    num: i64,

    /// Print all hashes (overrides -n)
    #[arg(short, long)]
    all: bool,

    /// Print info on each block within the hash buckets
    #[arg(short, long)]
    blocks: bool,

    /// Print a list of all files
    #[arg(short = 'l', long)]
    list_files: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Log debug detail to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    run(&cli)
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let limit = Limit::from_request(cli.num, cli.all)?;

    let db = HashDb::open(&cli.hashfile)
        .with_context(|| format!("Failed to open {}", cli.hashfile.display()))?;
    let header = db.header().context("Failed to read database header")?;

    let config = ReportConfig::builder()
        .block_size(header.block_size)
        .limit(limit)
        .print_blocks(cli.blocks)
        .print_file_list(cli.list_files)
        .build()?;
    tracing::debug!(?limit, block_size = header.block_size, "report configured");

    let loaded = db.load().context("Failed to load hashes")?;
    loaded.check_against(&header);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.format {
        OutputFormat::Text => {
            // Rank before writing anything so a corrupt index leaves no partial report
            let ranking = if config.ranks_buckets() {
                Some(RankingIndex::build(loaded.index.buckets())?)
            } else {
                None
            };
            let summary = LoadSummary::of(&loaded.index, &loaded.registry);

            write_header(&mut out, &cli.hashfile, &header, &summary)?;
            if let Some(ranking) = &ranking {
                let reporter = RankedReporter::new(&config, &loaded.registry);
                write_ranked(&mut out, config.limit, reporter.rows(ranking))?;
            }
            if config.print_file_list {
                write_file_list(&mut out, &loaded.registry)?;
            }
        }
        OutputFormat::Json => {
            let report = Report::build(
                cli.hashfile.clone(),
                header,
                &loaded.index,
                &loaded.registry,
                &config,
            )?;
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Print the stored header and what was actually loaded.
fn write_header(
    out: &mut impl Write,
    path: &Path,
    header: &DbHeader,
    loaded: &LoadSummary,
) -> io::Result<()> {
    writeln!(out, "Raw header info for \"{}\":", path.display())?;
    writeln!(
        out,
        "  version: {}\tblock_size: {} ({})",
        header.version(),
        header.block_size,
        format_size(u64::from(header.block_size))
    )?;
    writeln!(
        out,
        "  num_files: {}\tnum_hashes: {}",
        header.num_files, header.num_hashes
    )?;
    if let Some(hash_type) = &header.hash_type {
        writeln!(out, "  hash_type: {hash_type}")?;
    }
    writeln!(
        out,
        "Loaded hashes from {} blocks into {} nodes",
        loaded.blocks, loaded.hashes
    )?;
    writeln!(out, "Loaded {} file records", loaded.files)
}

/// Print ranked buckets, each followed by its blocks when present.
fn write_ranked(
    out: &mut impl Write,
    limit: Limit,
    rows: impl Iterator<Item = RankedRow>,
) -> io::Result<()> {
    match limit {
        Limit::All => writeln!(out, "Print all hashes")?,
        Limit::Top(n) => writeln!(out, "Print top {n} hashes")?,
    }
    writeln!(out, "Hash, # Blocks, # Files")?;

    for row in rows {
        writeln!(
            out,
            "{}, {}, {}",
            row.bucket.hash, row.bucket.blocks, row.bucket.files
        )?;
        for block in &row.members {
            write_block(out, block)?;
        }
    }
    Ok(())
}

fn write_block(out: &mut impl Write, block: &BlockRow) -> io::Result<()> {
    write!(
        out,
        "  {}\tloff: {} lblock: {} flags: 0x{:x}",
        block.file_name.as_deref().unwrap_or("<unknown>"),
        block.loff,
        block.lblock,
        block.flags_raw
    )?;
    if !block.flags.is_empty() {
        let names: Vec<String> = block.flags.iter().map(|f| f.to_string()).collect();
        write!(out, " ( {} )", names.join(" "))?;
    }
    writeln!(out)
}

/// Print every file record in load order.
fn write_file_list(out: &mut impl Write, registry: &FileRegistry) -> io::Result<()> {
    writeln!(out, "Showing {} files.", registry.len())?;
    writeln!(out, "Inode\tBlocks Stored\tSubvol ID\tFilename")?;
    for file in registry.iter() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            file.ino, file.num_blocks, file.subvol, file.name
        )?;
    }
    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
