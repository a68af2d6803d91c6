use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use tracing::info;

use decay_finder::{Filter, FilterSet, Index, MatchOptions, ParticleName, parse};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log parsing and matching decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the records that every filter keeps
    Search {
        /// Index JSON file, or `-` for stdin
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        /// Decay pattern, or a particle name if it has no `->`
        #[arg(short, long = "pattern", value_name = "PATTERN")]
        patterns: Vec<String>,

        /// Particle the record must mention
        #[arg(long = "particle", value_name = "NAME")]
        particles: Vec<String>,

        /// Ignore a trailing `sig` on names when matching
        #[arg(long)]
        strip_sig: bool,
    },
    /// Print the canonical form of a descriptor
    Parse {
        #[arg(value_name = "DESCRIPTOR")]
        descriptor: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(args.verbose);

    match args.command {
        Command::Search {
            index,
            patterns,
            particles,
            strip_sig,
        } => search(&index, &patterns, &particles, strip_sig),
        Command::Parse { descriptor } => describe(&descriptor),
    }
}

/// Filter directives used when `RUST_LOG` is unset.
fn default_directives(verbose: bool) -> &'static str {
    if verbose { "decay_finder=trace,info" } else { "warn" }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_index(path: &Path) -> Result<Index> {
    if path == Path::new("-") {
        Index::read(io::stdin().lock()).context("Failed to load index from stdin")
    } else {
        Index::load(path)
    }
}

fn search(path: &Path, patterns: &[String], particles: &[String], strip_sig: bool) -> Result<()> {
    let index = load_index(path)?;
    let mut filters = FilterSet::new(MatchOptions {
        strip_sig_suffix: strip_sig,
    });

    let queries = patterns
        .iter()
        .map(|p| Filter::from_query(p).with_context(|| format!("Empty pattern {p:?}")));
    let names = particles.iter().map(|p| {
        let name = ParticleName::new(p);
        if name.is_empty() {
            bail!("Empty particle name {p:?}");
        }
        Ok(Filter::Particle(name))
    });
    for filter in queries.chain(names) {
        let filter = filter?;
        if !filters.add(filter.clone()) {
            info!(%filter, "filter already active");
        }
    }

    let kept = filters.apply(&index.files);
    for record in &kept {
        println!(
            "{}\t{}\t{}",
            record.event_type, record.filename, record.descriptor
        );
    }
    info!(
        kept = kept.len(),
        total = index.files.len(),
        filters = filters.len(),
        "search finished"
    );
    Ok(())
}

fn describe(descriptor: &str) -> Result<()> {
    let tree = match parse(descriptor) {
        Ok(tree) => tree,
        Err(err) => bail!("Not a decay descriptor: {err}"),
    };
    println!("{}", tree.canonical());
    println!("weight: {}", tree.weight());
    println!("final state: {}", tree.final_state().iter().join(" "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_verbose_traces_the_engine() {
        assert_eq!(default_directives(true), "decay_finder=trace,info");
        assert_eq!(default_directives(false), "warn");
        for verbose in [true, false] {
            assert!(EnvFilter::try_new(default_directives(verbose)).is_ok());
        }
    }

    #[test]
    fn test_args_parse_search() {
        let args = Args::try_parse_from([
            "decay-finder",
            "-v",
            "search",
            "-",
            "-p",
            "D0 -> K- pi+",
            "--particle",
            "K+",
            "--strip-sig",
        ])
        .expect("arguments should parse");
        assert!(args.verbose);
        match args.command {
            Command::Search {
                index,
                patterns,
                particles,
                strip_sig,
            } => {
                assert_eq!(index, PathBuf::from("-"));
                assert_eq!(patterns, vec!["D0 -> K- pi+"]);
                assert_eq!(particles, vec!["K+"]);
                assert!(strip_sig);
            }
            other => panic!("expected Search, got {other:?}"),
        }
    }
}
