//! Indexed records and the filters applied to them.
//!
//! An index is the JSON document produced by the offline generation step:
//!
//! ```json
//! {
//!   "files": [
//!     {
//!       "eventType": "11102013",
//!       "descriptor": "[B0 -> K+ pi-]cc",
//!       "filename": "Bd_Kpi=DecProdCut.dec",
//!       "particles": ["b0", "k+", "pi-"],
//!       "modes": [["B0sig -> K+ pi-"], [["B0sig", "K+", "pi-"]]]
//!     }
//!   ],
//!   "uniqueParticles": ["b0", "k+", "pi-"]
//! }
//! ```
//!
//! Mode trees may be descriptor strings or the nested-array tree form.

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decay::{DecayNode, MatchOptions, contains_with, parse, trees_equal};
use crate::particle::{ParticleName, extract_particles};

/// Independently reconstructed trees describing the same process.
pub type Mode = Vec<DecayNode>;

/// One indexed decay file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub event_type: String,
    #[serde(default)]
    pub descriptor: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub particles: Vec<String>,
    #[serde(default)]
    pub modes: Vec<Mode>,
}

impl Record {
    /// Fill in modes and particles that the index left out.
    ///
    /// A record with no modes gets one built from its descriptor, if the
    /// descriptor parses. A record with no particle list gets one extracted
    /// from the descriptor text.
    pub fn resolve(&mut self) {
        if self.modes.is_empty() {
            match parse(&self.descriptor) {
                Ok(tree) => self.modes.push(vec![tree]),
                Err(err) => debug!(
                    event_type = %self.event_type,
                    %err,
                    "descriptor gives no decay tree"
                ),
            }
        }
        if self.particles.is_empty() {
            self.particles = extract_particles(&self.descriptor);
        }
    }

    pub fn trees(&self) -> impl Iterator<Item = &DecayNode> {
        self.modes.iter().flatten()
    }
}

/// The full record collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub files: Vec<Record>,
    #[serde(default)]
    pub unique_particles: Vec<String>,
}

impl Index {
    /// Parse and resolve an index document.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut index: Index = serde_json::from_str(text).context("Malformed index JSON")?;
        index.resolve();
        Ok(index)
    }

    /// Read an index document from any reader, such as standard input.
    pub fn read(mut reader: impl Read) -> Result<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .context("Failed to read index")?;
        Self::from_json(&text)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Failed to load index {}", path.display()))
    }

    /// Resolve every record and recompute the particle union.
    pub fn resolve(&mut self) {
        for record in &mut self.files {
            record.resolve();
        }
        self.unique_particles = self
            .files
            .iter()
            .flat_map(|r| r.particles.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        debug!(
            records = self.files.len(),
            particles = self.unique_particles.len(),
            "index resolved"
        );
    }
}

// ─── Filters ────────────────────────────────────────────────────────────────

/// One active search condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// The record mentions this particle.
    Particle(ParticleName),
    /// Some mode of the record contains this decay pattern.
    Decay(DecayNode),
}

impl Filter {
    /// Read user input as a decay pattern, or as a particle name if it does
    /// not parse. Blank input gives `None`.
    pub fn from_query(text: &str) -> Option<Self> {
        match parse(text) {
            Ok(tree) => Some(Self::Decay(tree)),
            Err(_) => {
                let name = ParticleName::new(text);
                (!name.is_empty()).then_some(Self::Particle(name))
            }
        }
    }

    pub fn retains(&self, record: &Record, options: MatchOptions) -> bool {
        match self {
            Self::Particle(name) => {
                record
                    .particles
                    .iter()
                    .any(|p| p.eq_ignore_ascii_case(name.as_str()))
                    || record.trees().any(|tree| tree.mentions(name))
            }
            Self::Decay(pattern) => record
                .modes
                .iter()
                .any(|mode| mode.iter().any(|tree| contains_with(tree, pattern, options))),
        }
    }

    fn duplicates(&self, other: &Filter) -> bool {
        match (self, other) {
            (Self::Particle(a), Self::Particle(b)) => a == b,
            (Self::Decay(a), Self::Decay(b)) => trees_equal(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Particle(name) => write!(f, "{name}"),
            Self::Decay(tree) => write!(f, "{}", tree.canonical()),
        }
    }
}

/// The active filters; a record is kept only if every filter keeps it.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<Filter>,
    options: MatchOptions,
}

impl FilterSet {
    pub fn new(options: MatchOptions) -> Self {
        Self {
            filters: Vec::new(),
            options,
        }
    }

    /// Add a filter unless an equivalent one is already active.
    ///
    /// Returns `false` for a duplicate.
    pub fn add(&mut self, filter: Filter) -> bool {
        if self.filters.iter().any(|f| f.duplicates(&filter)) {
            debug!(%filter, "duplicate filter ignored");
            return false;
        }
        self.filters.push(filter);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<Filter> {
        (index < self.filters.len()).then(|| self.filters.remove(index))
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn retains(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.retains(record, self.options))
    }

    /// Records kept by every filter, in index order.
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        let kept: Vec<&Record> = records.par_iter().filter(|r| self.retains(r)).collect();
        debug!(
            filters = %self.filters.iter().join(" & "),
            kept = kept.len(),
            total = records.len(),
            "filters applied"
        );
        kept
    }
}
