//! Parser for decay descriptor notation.
//!
//! `text := mother "->" daughters`, where each daughter is a bare particle
//! name or a parenthesized nested decay. Arrows inside parentheses belong to
//! sub-decays and are skipped at the outer level.

use tracing::trace;

use crate::particle::{ParticleName, normalize};

use super::tree::DecayNode;

/// Nested groups deeper than this are rejected instead of recursed into.
const MAX_DEPTH: usize = 64;

const ARROW: &str = "->";

/// Reasons a descriptor is not a decay.
///
/// Callers normally fall back to reading the text as a bare particle name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    MissingArrow,
    EmptyMother,
    NoDaughters,
    EmptyGroup,
    UnbalancedParens,
    StrayArrow,
    TooDeep,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArrow => write!(f, "No top-level '->' in descriptor"),
            Self::EmptyMother => write!(f, "Missing mother particle before '->'"),
            Self::NoDaughters => write!(f, "Decay has no daughters"),
            Self::EmptyGroup => write!(f, "Empty '()' in descriptor"),
            Self::UnbalancedParens => write!(f, "Unbalanced parentheses in descriptor"),
            Self::StrayArrow => write!(f, "Unexpected '->' among daughters"),
            Self::TooDeep => write!(f, "Descriptor nested more than {MAX_DEPTH} levels"),
        }
    }
}

impl std::error::Error for ParseFailure {}

/// Parse a descriptor into a tree with daughters in canonical order.
pub fn parse(text: &str) -> Result<DecayNode, ParseFailure> {
    let cleaned = normalize(unwrap_brackets(text));
    let result = parse_nested(&cleaned, 0);
    if let Err(err) = &result {
        trace!(text, %err, "not a decay descriptor");
    }
    result
}

/// Parse a descriptor, or read it as a single particle name if it is not one.
pub fn parse_or_leaf(text: &str) -> DecayNode {
    parse(text).unwrap_or_else(|_| DecayNode::leaf(text))
}

/// Drop one pair of brackets enclosing the whole text, with or without a
/// trailing `cc`.
fn unwrap_brackets(text: &str) -> &str {
    let text = text.trim();
    if !text.starts_with('[') {
        return text;
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let rest = text[i + 1..].trim();
                    return if rest.is_empty() || rest == "cc" {
                        &text[1..i]
                    } else {
                        text
                    };
                }
            }
            _ => {}
        }
    }
    text
}

fn parse_nested(text: &str, depth: usize) -> Result<DecayNode, ParseFailure> {
    if depth > MAX_DEPTH {
        return Err(ParseFailure::TooDeep);
    }
    let arrow = find_top_level_arrow(text)?.ok_or(ParseFailure::MissingArrow)?;

    let mother = ParticleName::new(&text[..arrow]);
    if mother.is_empty() {
        return Err(ParseFailure::EmptyMother);
    }

    let daughters = split_daughters(&text[arrow + ARROW.len()..], depth)?;
    DecayNode::from_parts(mother, daughters)
        .map(|node| node.sort_decay())
        .map_err(|_| ParseFailure::NoDaughters)
}

/// Byte offset of the first `->` outside parentheses.
///
/// Scans the whole text so that unbalanced parentheses are reported even
/// after the arrow has been found.
fn find_top_level_arrow(text: &str) -> Result<Option<usize>, ParseFailure> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut arrow = None;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.checked_sub(1).ok_or(ParseFailure::UnbalancedParens)?,
            b'-' if depth == 0 && arrow.is_none() && bytes.get(i + 1) == Some(&b'>') => {
                arrow = Some(i);
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseFailure::UnbalancedParens);
    }
    Ok(arrow)
}

/// Split the text after an arrow into daughter nodes.
///
/// A `(` at the start of a token opens a nested decay; anywhere else it is
/// part of a name such as `Lambda(1520)0`.
fn split_daughters(text: &str, depth: usize) -> Result<Vec<DecayNode>, ParseFailure> {
    let mut daughters = Vec::new();
    let mut token = String::new();
    let mut name_depth = 0usize;
    let mut chars = text.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '(' if token.is_empty() => {
                let mut level = 1usize;
                let mut close = None;
                for (j, c) in chars.by_ref() {
                    match c {
                        '(' => level += 1,
                        ')' => {
                            level -= 1;
                            if level == 0 {
                                close = Some(j);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let close = close.ok_or(ParseFailure::UnbalancedParens)?;
                daughters.push(parse_group(&text[i + 1..close], depth)?);
            }
            '(' => {
                name_depth += 1;
                token.push(c);
            }
            ')' => {
                name_depth = name_depth
                    .checked_sub(1)
                    .ok_or(ParseFailure::UnbalancedParens)?;
                token.push(c);
            }
            c if c.is_whitespace() && name_depth == 0 => flush_token(&mut token, &mut daughters)?,
            c => token.push(c),
        }
    }
    if name_depth != 0 {
        return Err(ParseFailure::UnbalancedParens);
    }
    flush_token(&mut token, &mut daughters)?;
    Ok(daughters)
}

fn flush_token(token: &mut String, daughters: &mut Vec<DecayNode>) -> Result<(), ParseFailure> {
    if token.is_empty() {
        return Ok(());
    }
    if token.contains(ARROW) || token.contains("=>") {
        return Err(ParseFailure::StrayArrow);
    }
    daughters.push(DecayNode::leaf(token));
    token.clear();
    Ok(())
}

/// The interior of a `( ... )` daughter: a nested decay, or failing that a
/// single particle name.
fn parse_group(interior: &str, depth: usize) -> Result<DecayNode, ParseFailure> {
    let interior = interior.trim();
    if interior.is_empty() {
        return Err(ParseFailure::EmptyGroup);
    }
    match parse_nested(interior, depth + 1) {
        Ok(node) => Ok(node),
        Err(err @ (ParseFailure::TooDeep | ParseFailure::UnbalancedParens)) => Err(err),
        Err(err) => {
            trace!(interior, %err, "group read as a particle name");
            Ok(DecayNode::leaf(interior))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(name: &str) -> DecayNode {
        DecayNode::leaf(name)
    }

    fn decay(mother: &str, daughters: Vec<DecayNode>) -> DecayNode {
        DecayNode::decay(mother, daughters).expect("non-empty daughters")
    }

    fn parse_ok(s: &str) -> DecayNode {
        parse(s).expect("parse should succeed")
    }

    fn parse_err(s: &str) -> ParseFailure {
        parse(s).expect_err("parse should fail")
    }

    #[test]
    fn test_simple_decay() {
        assert_eq!(parse_ok("D0 -> pi+ K-"), decay("D0", vec![leaf("K-"), leaf("pi+")]));
    }

    #[test]
    fn test_nested_lambda_pair() {
        let tree = parse_ok("B0sig -> (Lambda(1520)0 -> K- p+) (anti-Lambda(1520)0 -> K+ anti-p-)");
        assert_eq!(tree.name().as_str(), "B0sig");
        assert_eq!(tree.daughters().len(), 2);
        assert_eq!(
            tree.daughters()[0],
            decay("Lambda(1520)0", vec![leaf("K-"), leaf("p+")])
        );
        assert_eq!(
            tree.daughters()[1],
            decay("anti-Lambda(1520)0", vec![leaf("K+"), leaf("anti-p-")])
        );
    }

    #[test]
    fn test_parens_inside_names() {
        let tree = parse_ok("B0sig -> Lambda(1520)0 anti-Lambda(1520)0");
        assert_eq!(
            tree,
            decay("B0sig", vec![leaf("Lambda(1520)0"), leaf("anti-Lambda(1520)0")])
        );
    }

    #[test]
    fn test_inner_arrow_ignored_at_top_level() {
        let tree = parse_ok("B+ -> (J/psi(1S) -> mu+ mu-) K+");
        assert_eq!(tree.name().as_str(), "B+");
        assert_eq!(
            tree,
            decay("B+", vec![decay("J/psi(1S)", vec![leaf("mu+"), leaf("mu-")]), leaf("K+")])
        );
    }

    #[test]
    fn test_deep_nesting() {
        let tree = parse_ok("B_s0 -> (D_s- -> (phi -> K+ K-) pi-) pi+");
        assert_eq!(tree.weight(), 4);
        assert_eq!(tree.to_string(), "B_s0 -> (D_s- -> (phi -> K+ K-) pi-) pi+");
    }

    #[test]
    fn test_extra_whitespace() {
        assert_eq!(parse_ok("  D0   ->  K-\tpi+  "), parse_ok("D0 -> K- pi+"));
        assert_eq!(parse_ok("B0->( D0 -> K- pi+ ) pi0").daughters().len(), 2);
    }

    #[test]
    fn test_outer_brackets_unwrapped() {
        assert_eq!(parse_ok("[B0 -> K+ pi-]cc"), decay("B0", vec![leaf("K+"), leaf("pi-")]));
        assert_eq!(parse_ok("[B0 -> K+ pi-]"), decay("B0", vec![leaf("K+"), leaf("pi-")]));
    }

    #[test]
    fn test_inner_cc_markers_stripped() {
        assert_eq!(parse_ok("B0 -> [K*0]cc K+ pi-"), decay("B0", vec![leaf("K+"), leaf("pi-")]));
    }

    #[test]
    fn test_unwrap_brackets_only_when_enclosing() {
        assert_eq!(unwrap_brackets("[a]cc -> [b]cc"), "[a]cc -> [b]cc");
        assert_eq!(unwrap_brackets(" [x -> y]cc "), "x -> y");
        assert_eq!(unwrap_brackets("x -> y"), "x -> y");
    }

    #[test]
    fn test_group_without_arrow_is_a_name() {
        let tree = parse_ok("X -> (K+) pi-");
        assert_eq!(tree, decay("X", vec![leaf("K+"), leaf("pi-")]));
    }

    #[test]
    fn test_missing_arrow() {
        assert_eq!(parse_err("K+"), ParseFailure::MissingArrow);
        assert_eq!(parse_err(""), ParseFailure::MissingArrow);
        assert_eq!(parse_err("(A -> B C)"), ParseFailure::MissingArrow);
    }

    #[test]
    fn test_empty_mother() {
        assert_eq!(parse_err(" -> K+ K-"), ParseFailure::EmptyMother);
    }

    #[test]
    fn test_no_daughters() {
        assert_eq!(parse_err("B0 ->"), ParseFailure::NoDaughters);
        assert_eq!(parse_err("B0 ->   "), ParseFailure::NoDaughters);
    }

    #[test]
    fn test_empty_group() {
        assert_eq!(parse_err("B0 -> () K+"), ParseFailure::EmptyGroup);
    }

    #[test]
    fn test_unbalanced_parens() {
        assert_eq!(parse_err("B0 -> (D0 -> K- pi+"), ParseFailure::UnbalancedParens);
        assert_eq!(parse_err("B0 -> D0 -> K- pi+)"), ParseFailure::UnbalancedParens);
        assert_eq!(parse_err("B0 -> K+ pi-)"), ParseFailure::UnbalancedParens);
    }

    #[test]
    fn test_stray_arrow() {
        assert_eq!(parse_err("B0 -> D0 -> K- pi+"), ParseFailure::StrayArrow);
        assert_eq!(parse_err("B0 -> D0->K- pi+"), ParseFailure::StrayArrow);
        assert_eq!(parse_err("B0 -> K+ pi-=>pi0"), ParseFailure::StrayArrow);
    }

    #[test]
    fn test_too_deep() {
        let depth = MAX_DEPTH + 5;
        let text = format!("A -> {}C{}", "(B -> ".repeat(depth), ")".repeat(depth));
        assert_eq!(parse_err(&text), ParseFailure::TooDeep);
    }

    #[test]
    fn test_nesting_within_limit() {
        let depth = 10;
        let text = format!("A -> {}C{}", "(B -> ".repeat(depth), ")".repeat(depth));
        assert_eq!(parse_ok(&text).weight(), 1);
    }

    #[test]
    fn test_parse_or_leaf() {
        assert_eq!(parse_or_leaf("  K+ "), leaf("K+"));
        assert_eq!(parse_or_leaf("[pi0]cc gamma"), leaf("gamma"));
        assert!(parse_or_leaf("D0 -> K- pi+").is_decay());
    }

    #[test]
    fn test_display_reparses() {
        let text = "B0sig -> (Lambda(1520)0 -> K- p+) (anti-Lambda(1520)0 -> K+ anti-p-)";
        let tree = parse_ok(text);
        assert_eq!(parse_ok(&tree.to_string()), tree);
    }
}
