// newick.rs - Newick tree grammar: parser (nom) and writer

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::char,
    combinator::{map, opt},
    multi::separated_list1,
    number::complete::double,
    sequence::{pair, preceded, terminated},
    IResult,
};

use crate::core::tree::{Tree, TraversalOrder};

#[derive(Debug, Clone, PartialEq)]
pub enum NewickNode {
    Leaf {
        name: String,
        branch_length: Option<f64>,
    },
    Internal {
        children: Vec<NewickNode>,
        branch_length: Option<f64>,
    },
}

/// Parse a single Newick tree description, tolerating a trailing `;` and
/// surrounding whitespace.
pub fn parse_newick(input: &str) -> Result<NewickNode, String> {
    let trimmed = input.trim();
    let (rest, node) =
        node_p(trimmed).map_err(|e| format!("newick: parse error: {e}"))?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(';').unwrap_or(rest).trim();
    if !rest.is_empty() {
        return Err(format!("newick: trailing input after tree: {rest:?}"));
    }
    Ok(node)
}

fn node_p(input: &str) -> IResult<&str, NewickNode> {
    alt((internal_p, leaf_p))(input)
}

fn leaf_p(input: &str) -> IResult<&str, NewickNode> {
    map(
        pair(label_p, opt(branch_length_p)),
        |(name, branch_length)| NewickNode::Leaf { name, branch_length },
    )(input)
}

fn internal_p(input: &str) -> IResult<&str, NewickNode> {
    map(
        pair(
            preceded(
                char('('),
                terminated(separated_list1(char(','), node_p), char(')')),
            ),
            opt(branch_length_p),
        ),
        |(children, branch_length)| NewickNode::Internal {
            children,
            branch_length,
        },
    )(input)
}

fn label_p(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| !matches!(c, '(' | ')' | ',' | ':' | ';')),
        |s: &str| s.trim().to_string(),
    )(input)
}

fn branch_length_p(input: &str) -> IResult<&str, f64> {
    preceded(char(':'), double)(input)
}

/// Render `tree` as Newick text, terminated with `;`. Internal node labels
/// are omitted (support values are out of scope); branch lengths are
/// written with full `f64` precision via `{}` formatting.
pub fn write_newick(tree: &Tree) -> String {
    let mut out = String::new();
    write_subtree(tree, tree.root(), &mut out);
    out.push(';');
    out
}

fn write_subtree(tree: &Tree, id: crate::core::tree::NodeId, out: &mut String) {
    let node = tree.node(id);
    match node.children {
        None => {
            out.push_str(&node.label);
        }
        Some(children) => {
            out.push('(');
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_subtree(tree, *child, out);
            }
            out.push(')');
        }
    }
    if node.parent.is_some() {
        out.push(':');
        out.push_str(&format_branch_length(node.branch_length));
    }
    // Root: no trailing colon/length; callers `;`-terminate in write_newick.
    let _ = TraversalOrder::PreOrder; // traversal order unused here, kept for symmetry with reader
}

fn format_branch_length(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_bifurcating_tree() {
        let tree = parse_newick("(A:0.1,B:0.2):0.3;").unwrap();
        match tree {
            NewickNode::Internal {
                children,
                branch_length,
            } => {
                assert_eq!(children.len(), 2);
                assert_eq!(branch_length, Some(0.3));
            }
            _ => panic!("expected internal node"),
        }
    }

    #[test]
    fn parses_nested_tree_with_named_leaves() {
        let tree = parse_newick("((A:1,B:2):3,C:4);").unwrap();
        match tree {
            NewickNode::Internal { children, .. } => {
                assert_eq!(children.len(), 2);
                match &children[1] {
                    NewickNode::Leaf { name, branch_length } => {
                        assert_eq!(name, "C");
                        assert_eq!(*branch_length, Some(4.0));
                    }
                    _ => panic!("expected leaf C"),
                }
            }
            _ => panic!("expected internal node"),
        }
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_newick("(A:1,B:1);garbage").is_err());
    }

    #[test]
    fn roundtrip_through_tree_load_and_emit() {
        let parsed = parse_newick("((A:1,B:1):1,C:1);").unwrap();
        let tree = Tree::load(&parsed, &["A".to_string(), "B".to_string(), "C".to_string()]).unwrap();
        let text = write_newick(&tree);
        assert!(text.ends_with(';'));
        assert!(text.contains('A'));
        assert!(text.contains('C'));
    }
}
