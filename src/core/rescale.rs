// rescale.rs - Tree Rescaler (§4.5): branch-length rescaling after convergence

use std::collections::HashMap;

use crate::core::tree::{NodeId, Tree};

/// Multiplies each branch length by `remaining / original` branch-unique SNP
/// counts, or sets it to zero when the branch started with no SNPs at all
/// (spec.md §4.5, testable property 14).
pub fn rescale_tree(
    tree: &mut Tree,
    original_branch_snps: &HashMap<NodeId, usize>,
    remaining_branch_snps: &HashMap<NodeId, usize>,
) {
    tree.rescale_branches(|child| {
        let original = original_branch_snps.get(&child).copied().unwrap_or(0);
        if original == 0 {
            return 0.0;
        }
        let remaining = remaining_branch_snps.get(&child).copied().unwrap_or(0);
        remaining as f64 / original as f64
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::newick::parse_newick;

    #[test]
    fn branch_length_scales_by_remaining_over_original() {
        let parsed = parse_newick("(A:10,B:10);").unwrap();
        let mut tree =
            Tree::load(&parsed, &["A".to_string(), "B".to_string()]).unwrap();

        let a = tree.node(tree.root()).children.unwrap()[0];
        let b = tree.node(tree.root()).children.unwrap()[1];

        let mut original = HashMap::new();
        original.insert(a, 8);
        original.insert(b, 0);
        let mut remaining = HashMap::new();
        remaining.insert(a, 4);
        remaining.insert(b, 0);

        rescale_tree(&mut tree, &original, &remaining);

        assert_eq!(tree.node(a).branch_length, 5.0);
        assert_eq!(tree.node(b).branch_length, 0.0);
    }
}
