//! Particle identifiers.
//!
//! Names are compared byte-for-byte after normalization: every `[...]cc`
//! charge-conjugation marker is removed and surrounding whitespace trimmed.
//! No case folding happens here.

use std::fmt;
use std::sync::LazyLock;

use itertools::Itertools;
use phf::{Set, phf_set};
use regex::Regex;

static CC_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]cc").expect("charge-conjugation pattern is valid"));

/// Suffix some generators append to the signal particle (`B0sig`).
const SIG_SUFFIX: &str = "sig";

/// Strip every `[...]cc` marker (shortest match, all occurrences) and trim.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(raw: &str) -> String {
    // Text left before any removed marker holds no `[`, so one pass reaches
    // the fixed point.
    CC_MARKER.replace_all(raw, "").trim().to_string()
}

/// Remove a trailing `sig` from a name, unless that would leave nothing.
pub fn strip_sig_suffix(name: &str) -> &str {
    match name.strip_suffix(SIG_SUFFIX) {
        Some(rest) if !rest.is_empty() => rest,
        _ => name,
    }
}

/// A normalized particle identifier.
///
/// Construction always normalizes, so two `ParticleName`s are equal iff their
/// normalized texts are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleName(String);

impl ParticleName {
    pub fn new(raw: &str) -> Self {
        Self(normalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The name as the matcher sees it when `sig` stripping is enabled.
    pub fn without_sig_suffix(&self) -> &str {
        strip_sig_suffix(&self.0)
    }
}

impl fmt::Display for ParticleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ParticleName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ParticleName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ─── Descriptor particle extraction ─────────────────────────────────────────

/// Tokens that appear in decay descriptors but never name a particle.
static KEYWORDS: Set<&'static str> = phf_set! {
    "cc", "evtgen", "jetset", "os", "photos", "pp", "pythia", "ss",
};

/// Punctuation that separates tokens in a raw descriptor.
const SEPARATORS: [char; 8] = ['[', ']', '(', ')', '{', '}', ',', ';'];

/// Syntax tokens dropped outright after splitting.
const SYNTAX_TOKENS: [&str; 3] = ["=>", "->", "..."];

/// Characters that end a particle name when followed by a fresh name.
const NAME_SUFFIXES: [char; 5] = ['+', '-', '0', '*', '\''];

/// Loosely list the particle names mentioned in a raw descriptor.
///
/// This is a tokenizer, not a parser: it separates on arrows and brackets,
/// drops keywords, splits run-together names such as `K+pi-`, and lowercases.
/// The result is sorted and free of duplicates.
pub fn extract_particles(descriptor: &str) -> Vec<String> {
    let mut spaced = descriptor.replace("=>", " => ").replace("->", " -> ");
    for sep in SEPARATORS {
        spaced = spaced.replace(sep, &format!(" {sep} "));
    }

    spaced
        .split_whitespace()
        .filter(|token| !SYNTAX_TOKENS.contains(token))
        .filter(|token| !KEYWORDS.contains(token.to_ascii_lowercase().as_str()))
        .filter(|token| starts_like_name(token))
        .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
        .flat_map(split_joined)
        .filter(|name| starts_like_name(name))
        .map(|name| name.to_lowercase())
        .sorted()
        .dedup()
        .collect()
}

/// A particle name starts with an alphanumeric character, `~` or `^`.
fn starts_like_name(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '~' || c == '^')
}

/// Split `K+pi-` into `K+` and `pi-`: a run of suffix characters followed by
/// the start of another name ends the current name.
fn split_joined(token: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for ((i, c), (_, next)) in token.char_indices().tuple_windows() {
        let starts_name = next.is_alphanumeric() || next == '~' || next == '^';
        if NAME_SUFFIXES.contains(&c) && !NAME_SUFFIXES.contains(&next) && starts_name {
            let end = i + c.len_utf8();
            parts.push(&token[start..end]);
            start = end;
        }
    }
    if start < token.len() {
        parts.push(&token[start..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_cc_marker() {
        assert_eq!(normalize("[B0]cc"), "");
        assert_eq!(normalize("  K+ "), "K+");
        assert_eq!(normalize("B0 [K*0]cc"), "B0");
    }

    #[test]
    fn test_normalize_is_non_greedy() {
        assert_eq!(normalize("[a]cc b [c]cc"), "b");
        assert_eq!(normalize("[a] b [c]cc"), "");
        assert_eq!(normalize("x [a]c"), "x [a]c");
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in ["  B0sig ", "[K+]cc pi-", "Lambda(1520)0", "[[a]cc]cc", ""] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_normalize_is_case_sensitive() {
        assert_ne!(ParticleName::new("K+"), ParticleName::new("k+"));
    }

    #[test]
    fn test_particle_name_normalizes() {
        let name = ParticleName::new(" D0 ");
        assert_eq!(name, "D0");
        assert_eq!(name.to_string(), "D0");
        assert!(ParticleName::new("  ").is_empty());
    }

    #[test]
    fn test_strip_sig_suffix() {
        assert_eq!(strip_sig_suffix("B0sig"), "B0");
        assert_eq!(strip_sig_suffix("B0"), "B0");
        assert_eq!(strip_sig_suffix("sig"), "sig");
        assert_eq!(ParticleName::new("Lambda_bsig").without_sig_suffix(), "Lambda_b");
    }

    #[test]
    fn test_extract_particles_basic() {
        let got = extract_particles("[B0 -> K+ pi-]cc");
        assert_eq!(got, vec!["b0", "k+", "pi-"]);
    }

    #[test]
    fn test_extract_particles_drops_keywords_and_digits() {
        let got = extract_particles("{B_s0 => (J/psi -> mu+ mu-) phi} PHOTOS 3 ...");
        assert_eq!(got, vec!["b_s0", "j/psi", "mu+", "mu-", "phi"]);
    }

    #[test]
    fn test_extract_particles_splits_joined_names() {
        let got = extract_particles("D0 -> K+pi- ^mu+mu-");
        assert_eq!(got, vec!["^mu+", "d0", "k+", "mu-", "pi-"]);
    }

    #[test]
    fn test_extract_particles_keeps_suffix_runs() {
        assert_eq!(split_joined("K*+pi0"), vec!["K*+", "pi0"]);
        assert_eq!(split_joined("D*'"), vec!["D*'"]);
        assert_eq!(split_joined("K*0"), vec!["K*0"]);
        assert_eq!(split_joined("D*0pi+"), vec!["D*0", "pi+"]);
    }

    #[test]
    fn test_extract_particles_keeps_starred_neutrals() {
        assert_eq!(extract_particles("[B0 -> K*0 gamma]cc"), vec!["b0", "gamma", "k*0"]);
        assert_eq!(extract_particles("B- -> D*0 pi-"), vec!["b-", "d*0", "pi-"]);
    }

    #[test]
    fn test_extract_particles_empty() {
        assert!(extract_particles("").is_empty());
        assert!(extract_particles("-> , ;").is_empty());
    }
}
