//! Search particle-decay descriptions by decay structure.
//!
//! A record's decay chain and a user's query are both [`DecayNode`] trees.
//! The query may name intermediate resonances, final-state particles, or a
//! mix; [`contains`] decides whether the record's chain holds it.
//!
//! # Example
//!
//! ```rust
//! use decay_finder::{contains, parse};
//!
//! let record = parse("B0sig -> (Lambda(1520)0 -> K- p+) (anti-Lambda(1520)0 -> K+ anti-p-)").unwrap();
//!
//! // By intermediate resonances
//! let by_name = parse("B0sig -> Lambda(1520)0 anti-Lambda(1520)0").unwrap();
//! assert!(contains(&record, &by_name));
//!
//! // By final state, in any order
//! let by_final_state = parse("B0sig -> K+ K- p+ anti-p-").unwrap();
//! assert!(contains(&record, &by_final_state));
//!
//! // A missing particle leaves part of the chain unaccounted for
//! let partial = parse("B0sig -> K- p+ K+").unwrap();
//! assert!(!contains(&record, &partial));
//! ```

pub mod decay;
pub mod particle;
pub mod record;

pub use decay::{
    Decay, DecayNode, InvalidTree, MatchOptions, ParseFailure, canonical, contains, contains_with,
    parse, parse_or_leaf, sort_decay, trees_equal,
};
pub use particle::{ParticleName, extract_particles, normalize};
pub use record::{Filter, FilterSet, Index, Mode, Record};
