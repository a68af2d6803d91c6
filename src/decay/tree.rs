//! Decay tree types, weight, canonical ordering and exact equality.

use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::particle::ParticleName;

use super::parser::parse_or_leaf;

/// One node of a decay chain.
///
/// A `Decay` always has at least one daughter; the only way to build one is
/// through [`DecayNode::decay`] or [`DecayNode::from_parts`], which reject an
/// empty daughter list. Trees are never mutated: every transformation returns
/// a new tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "RawNode")]
pub enum DecayNode {
    /// A final-state particle.
    Leaf(ParticleName),
    /// A particle decaying into one or more daughters.
    Decay(Decay),
}

/// The body of a [`DecayNode::Decay`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decay {
    mother: ParticleName,
    daughters: Vec<DecayNode>,
}

impl Decay {
    pub fn mother(&self) -> &ParticleName {
        &self.mother
    }

    pub fn daughters(&self) -> &[DecayNode] {
        &self.daughters
    }
}

/// A decay was assembled without any daughters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTree {
    pub mother: String,
}

impl fmt::Display for InvalidTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decay of {:?} has no daughters", self.mother)
    }
}

impl std::error::Error for InvalidTree {}

impl DecayNode {
    pub fn leaf(name: &str) -> Self {
        Self::Leaf(ParticleName::new(name))
    }

    /// Build a decay node, normalizing the mother name.
    pub fn decay(mother: &str, daughters: Vec<DecayNode>) -> Result<Self, InvalidTree> {
        Self::from_parts(ParticleName::new(mother), daughters)
    }

    pub fn from_parts(
        mother: ParticleName,
        daughters: Vec<DecayNode>,
    ) -> Result<Self, InvalidTree> {
        if daughters.is_empty() {
            return Err(InvalidTree {
                mother: mother.as_str().to_string(),
            });
        }
        Ok(Self::Decay(Decay { mother, daughters }))
    }

    /// The leaf's own name, or the mother of a decay.
    pub fn name(&self) -> &ParticleName {
        match self {
            Self::Leaf(name) => name,
            Self::Decay(decay) => &decay.mother,
        }
    }

    /// Immediate daughters; empty for a leaf.
    pub fn daughters(&self) -> &[DecayNode] {
        match self {
            Self::Leaf(_) => &[],
            Self::Decay(decay) => &decay.daughters,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub fn is_decay(&self) -> bool {
        matches!(self, Self::Decay(_))
    }

    /// Number of final-state particles beneath this node (a leaf counts 1).
    pub fn weight(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Decay(decay) => decay.daughters.iter().map(DecayNode::weight).sum(),
        }
    }

    /// Leaf names reachable through every sub-decay, in tree order.
    pub fn final_state(&self) -> Vec<&ParticleName> {
        match self {
            Self::Leaf(name) => vec![name],
            Self::Decay(decay) => decay
                .daughters
                .iter()
                .flat_map(DecayNode::final_state)
                .collect(),
        }
    }

    /// True if `name` appears anywhere in the tree, as a mother or a leaf.
    pub fn mentions(&self, name: &ParticleName) -> bool {
        self.name() == name || self.daughters().iter().any(|d| d.mentions(name))
    }

    /// Reorder daughters at every level by key (leaf name or sub-decay
    /// mother).
    ///
    /// Equal keys fall back to the order of the already-sorted subtrees: a
    /// leaf before a decay, then daughters compared in sequence. Identical
    /// subtrees keep their input order.
    pub fn sort_decay(&self) -> DecayNode {
        match self {
            Self::Leaf(_) => self.clone(),
            Self::Decay(decay) => Self::Decay(Decay {
                mother: decay.mother.clone(),
                daughters: decay
                    .daughters
                    .iter()
                    .map(DecayNode::sort_decay)
                    .sorted_by(canonical_order)
                    .collect(),
            }),
        }
    }

    /// The order-independent form used for equality.
    ///
    /// Names are normalized when a [`ParticleName`] is built, so this only
    /// has to sort.
    pub fn canonical(&self) -> DecayNode {
        self.sort_decay()
    }
}

fn canonical_order(a: &DecayNode, b: &DecayNode) -> Ordering {
    a.name().cmp(b.name()).then_with(|| a.cmp(b))
}

/// See [`DecayNode::sort_decay`].
pub fn sort_decay(node: &DecayNode) -> DecayNode {
    node.sort_decay()
}

/// See [`DecayNode::canonical`].
pub fn canonical(node: &DecayNode) -> DecayNode {
    node.canonical()
}

/// Exact equality of two chains, ignoring daughter order.
///
/// Every sub-decay grouping must coincide; use
/// [`contains`](super::matcher::contains) for partial matches.
pub fn trees_equal(a: &DecayNode, b: &DecayNode) -> bool {
    a.canonical() == b.canonical()
}

/// Descriptor notation: `A -> B (C -> D E)`.
impl fmt::Display for DecayNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(name) => write!(f, "{name}"),
            Self::Decay(decay) => {
                let daughters = decay.daughters.iter().format_with(" ", |d, g| match d {
                    Self::Leaf(name) => g(name),
                    Self::Decay(_) => g(&format_args!("({d})")),
                });
                write!(f, "{} -> {}", decay.mother, daughters)
            }
        }
    }
}

// ─── Serialized tree form ───────────────────────────────────────────────────
//
// A leaf is a string and a decay is `[mother, daughter, ...]`. A string
// holding a top-level arrow is read as a descriptor.

impl Serialize for DecayNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(name) => serializer.serialize_str(name.as_str()),
            Self::Decay(decay) => {
                let mut seq = serializer.serialize_seq(Some(decay.daughters.len() + 1))?;
                seq.serialize_element(decay.mother.as_str())?;
                for daughter in &decay.daughters {
                    seq.serialize_element(daughter)?;
                }
                seq.end()
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNode {
    Text(String),
    List(Vec<RawNode>),
}

impl TryFrom<RawNode> for DecayNode {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        match raw {
            RawNode::Text(text) => Ok(parse_or_leaf(&text)),
            RawNode::List(items) => {
                let mut items = items.into_iter();
                let Some(RawNode::Text(mother)) = items.next() else {
                    return Err("decay list must start with a mother name".to_string());
                };
                let daughters = items
                    .map(DecayNode::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                DecayNode::decay(&mother, daughters).map_err(|err| err.to_string())
            }
        }
    }
}
