// tree.rs - the Tree Model: an arena-indexed rooted bifurcating tree

use crate::io::newick::NewickNode;

/// A recombination block accepted on the branch leading to a node:
/// (genome-coordinate start, genome-coordinate end, branch-SNP count within).
///
/// Merging two blocks (§4.4 Step D) leaves the subsumed block's coordinates
/// zeroed at `(0, 0)` in place, rather than removing it from the vector --
/// this is an explicit, observable part of the contract (spec.md §9, §8
/// property 2), not an implementation accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecombinationBlock {
    pub start: u64,
    pub end: u64,
    pub snp_count_within: usize,
}

impl RecombinationBlock {
    pub fn new(start: u64, end: u64, snp_count_within: usize) -> Self {
        RecombinationBlock {
            start,
            end,
            snp_count_within,
        }
    }

    /// The zeroed-out sentinel marking a block merged away into another.
    pub fn subsumed() -> Self {
        RecombinationBlock {
            start: 0,
            end: 0,
            snp_count_within: 0,
        }
    }

    pub fn is_subsumed(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Row index into the AlignmentStore for this node's sequence.
    pub seq_slot: usize,
    pub parent: Option<NodeId>,
    pub children: Option<[NodeId; 2]>,
    pub branch_length: f64,
    pub blocks: Vec<RecombinationBlock>,
    /// Sample name for leaves; synthesised identifier for internal nodes.
    pub label: String,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    PreOrder,
    PostOrder,
}

/// The rooted bifurcating tree. Node 0 is always the root.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    sample_count: usize,
}

impl Tree {
    /// Build the tree from a parsed Newick AST. Leaf sequence slots are
    /// assigned 0..S-1 in `sample_order`; internal slots S..S+I-1 are
    /// assigned in the order internal nodes are discovered by a post-order
    /// traversal, matching the Alignment Store's row layout (spec.md §3).
    pub fn load(newick: &NewickNode, sample_order: &[String]) -> Result<Self, String> {
        let sample_index: std::collections::HashMap<&str, usize> = sample_order
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        let mut nodes = Vec::new();
        let mut next_internal_slot = sample_order.len();
        let root = build_node(newick, None, &sample_index, &mut nodes, &mut next_internal_slot)?;

        let sample_count = sample_order.len();
        let seen_leaves: std::collections::HashSet<usize> = nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.seq_slot)
            .collect();
        if seen_leaves.len() != sample_count {
            return Err(format!(
                "tree: expected {} distinct leaf samples, tree defines {}",
                sample_count,
                seen_leaves.len()
            ));
        }

        Ok(Tree {
            nodes,
            root,
            sample_count,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn internal_count(&self) -> usize {
        self.nodes.len() - self.sample_count
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All nodes in the traversal order requested, visiting this node's
    /// `NodeId`.
    pub fn traverse(&self, order: TraversalOrder, mut visitor: impl FnMut(NodeId)) {
        match order {
            TraversalOrder::PreOrder => self.pre_order_from(self.root, &mut visitor),
            TraversalOrder::PostOrder => self.post_order_from(self.root, &mut visitor),
        }
    }

    fn pre_order_from(&self, id: NodeId, visitor: &mut impl FnMut(NodeId)) {
        visitor(id);
        if let Some(children) = self.nodes[id.0].children {
            for child in children {
                self.pre_order_from(child, visitor);
            }
        }
    }

    fn post_order_from(&self, id: NodeId, visitor: &mut impl FnMut(NodeId)) {
        if let Some(children) = self.nodes[id.0].children {
            for child in children {
                self.post_order_from(child, visitor);
            }
        }
        visitor(id);
    }

    /// The ordered list of (parent, child) branches in post-order of the
    /// child -- the fixed iteration order the parallel scan (§5) folds back
    /// into the Alignment Store in.
    pub fn post_order_branches(&self) -> Vec<(NodeId, NodeId)> {
        let mut branches = Vec::new();
        self.traverse(TraversalOrder::PostOrder, |id| {
            if let Some(parent) = self.nodes[id.0].parent {
                branches.push((parent, id));
            }
        });
        branches
    }

    /// Multiply every non-root branch length by `factor_fn(child)`.
    pub fn rescale_branches(&mut self, factor_fn: impl Fn(NodeId) -> f64) {
        for node in &mut self.nodes {
            if node.parent.is_some() {
                node.branch_length *= factor_fn(node.id);
            }
        }
    }

    /// Newick text, terminated with `;`.
    pub fn emit(&self) -> String {
        crate::io::newick::write_newick(self)
    }
}

fn build_node(
    newick: &NewickNode,
    parent: Option<NodeId>,
    sample_index: &std::collections::HashMap<&str, usize>,
    nodes: &mut Vec<Node>,
    next_internal_slot: &mut usize,
) -> Result<NodeId, String> {
    match newick {
        NewickNode::Leaf { name, branch_length } => {
            let seq_slot = *sample_index
                .get(name.as_str())
                .ok_or_else(|| format!("tree: leaf '{name}' not present in alignment"))?;
            let id = NodeId(nodes.len());
            nodes.push(Node {
                id,
                seq_slot,
                parent,
                children: None,
                branch_length: branch_length.unwrap_or(0.0),
                blocks: Vec::new(),
                label: name.clone(),
            });
            Ok(id)
        }
        NewickNode::Internal {
            children,
            branch_length,
        } => {
            if children.len() != 2 {
                return Err(format!(
                    "tree: internal node has {} children, expected exactly 2 (strictly bifurcating)",
                    children.len()
                ));
            }
            // Reserve this node's id before descending so that its slot
            // number reflects its own discovery order relative to its
            // children, but don't know its seq_slot (post-order) until both
            // children are built.
            let id = NodeId(nodes.len());
            nodes.push(Node {
                id,
                seq_slot: 0, // patched below
                parent,
                children: None,
                branch_length: branch_length.unwrap_or(0.0),
                blocks: Vec::new(),
                label: String::new(),
            });

            let left = build_node(&children[0], Some(id), sample_index, nodes, next_internal_slot)?;
            let right = build_node(&children[1], Some(id), sample_index, nodes, next_internal_slot)?;

            let seq_slot = *next_internal_slot;
            *next_internal_slot += 1;
            let label = format!("NODE_{seq_slot}");
            let node = &mut nodes[id.0];
            node.children = Some([left, right]);
            node.seq_slot = seq_slot;
            node.label = label;

            Ok(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::newick::parse_newick;

    #[test]
    fn internal_slots_assigned_in_post_order() {
        let newick = parse_newick("((A:1,B:1):1,C:1);").unwrap();
        let tree = Tree::load(&newick, &["A".to_string(), "B".to_string(), "C".to_string()]).unwrap();
        // leaves A,B,C -> slots 0,1,2 ; first internal (parent of A,B) discovered
        // before root in post-order -> slot 3 ; root -> slot 4.
        let root = tree.node(tree.root());
        assert_eq!(root.seq_slot, 4);
        let ab_parent = tree.node(root.children.unwrap()[0]);
        assert_eq!(ab_parent.seq_slot, 3);
    }

    #[test]
    fn post_order_branches_child_before_parent_branch_listed_after_its_own_subtree() {
        let newick = parse_newick("((A:1,B:1):1,C:1);").unwrap();
        let tree = Tree::load(&newick, &["A".to_string(), "B".to_string(), "C".to_string()]).unwrap();
        let branches = tree.post_order_branches();
        // Every branch's child must appear in the list before any branch
        // whose parent equals that child's parent's parent, etc. Simplest
        // check here: the root has no outgoing entry (it has no parent), and
        // there are exactly (nodes - 1) branches.
        assert_eq!(branches.len(), tree.len() - 1);
        assert!(branches.iter().all(|&(_, c)| tree.node(c).parent.is_some()));
    }

    #[test]
    fn rejects_non_bifurcating_nodes() {
        let newick = parse_newick("(A:1,B:1,C:1);").unwrap();
        let err = Tree::load(&newick, &["A".to_string(), "B".to_string(), "C".to_string()]).unwrap_err();
        assert!(err.contains("2 children"));
    }
}
