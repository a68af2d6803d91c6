//! Decay-structure matching engine.
//!
//! Descriptor text is parsed into a [`DecayNode`] tree; a search pattern is
//! itself a tree, and [`contains`] decides whether a record's tree holds it.
//!
//! # Descriptor notation
//!
//! | Form                     | Meaning                                          |
//! |--------------------------|--------------------------------------------------|
//! | `A -> B C`               | `A` decays to `B` and `C`                        |
//! | `A -> (B -> C D) E`      | `B` decays further to `C` and `D`                |
//! | `[A -> B C]cc`           | Enclosing brackets (and `cc`) are dropped         |
//! | `[X]cc`                  | Charge-conjugation markers inside names vanish   |
//! | `Lambda(1520)0`          | Parentheses inside a name are part of the name   |
//!
//! # Pattern granularity
//!
//! Against `B0 -> (D0 -> K- pi+) pi0`, each of these patterns matches:
//!
//! | Pattern                  | Matched by                                       |
//! |--------------------------|--------------------------------------------------|
//! | `B0 -> D0 pi0`           | intermediate name                                |
//! | `B0 -> K- pi+ pi0`       | final-state names                                |
//! | `B0 -> (D0 -> K- pi+) pi0` | exact chain                                    |
//! | `D0 -> K- pi+`           | a sub-decay anywhere in the chain                |

pub mod matcher;
pub mod parser;
pub mod tree;

pub use matcher::{MatchOptions, contains, contains_with};
pub use parser::{ParseFailure, parse, parse_or_leaf};
pub use tree::{Decay, DecayNode, InvalidTree, canonical, sort_decay, trees_equal};
