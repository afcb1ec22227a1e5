// reconstruct.rs - Ancestor Reconstructor: fills internal-node sequence rows

use std::collections::HashMap;

use crate::core::tree::{NodeId, Tree, TraversalOrder};
use crate::data::{AlignmentStore, Base};

/// Fills every internal node's row in `store` from its children, then
/// propagates unambiguous bases and gaps across any remaining ambiguity.
/// Mutates `store` in place; the only component allowed to write internal
/// rows.
pub fn reconstruct(store: &mut AlignmentStore, tree: &Tree) {
    let leaf_descendants = cache_leaf_descendants(tree);

    post_order_assign(store, tree, &leaf_descendants);
    fill_unambiguous_bases_across_gaps(store, tree, &leaf_descendants);
    fill_unambiguous_gaps_from_children(store, tree);
}

fn cache_leaf_descendants(tree: &Tree) -> HashMap<NodeId, Vec<usize>> {
    let mut cache = HashMap::new();
    tree.traverse(TraversalOrder::PostOrder, |id| {
        let node = tree.node(id);
        let leaves = match node.children {
            None => vec![node.seq_slot],
            Some([l, r]) => {
                let mut v = cache.get(&l).cloned().unwrap_or_default();
                v.extend(cache.get(&r).cloned().unwrap_or_default());
                v
            }
        };
        cache.insert(id, leaves);
    });
    cache
}

fn post_order_assign(
    store: &mut AlignmentStore,
    tree: &Tree,
    leaf_descendants: &HashMap<NodeId, Vec<usize>>,
) {
    let col_count = store.col_count();
    let mut order = Vec::new();
    tree.traverse(TraversalOrder::PostOrder, |id| {
        if tree.node(id).children.is_some() {
            order.push(id);
        }
    });

    for id in order {
        let node = tree.node(id);
        let [left, right] = node.children.expect("internal node has two children");
        let parent_slot = node.seq_slot;
        let left_slot = tree.node(left).seq_slot;
        let right_slot = tree.node(right).seq_slot;
        let left_leaves = &leaf_descendants[&left];
        let right_leaves = &leaf_descendants[&right];

        for col in 0..col_count {
            let b1 = store.read(left_slot, col);
            let b2 = store.read(right_slot, col);
            let assigned = match (b1.is_real(), b2.is_real()) {
                (true, true) if b1 == b2 => b1,
                (true, true) => {
                    let left_real_count = left_leaves
                        .iter()
                        .filter(|&&slot| store.read(slot, col).is_real())
                        .count();
                    let right_real_count = right_leaves
                        .iter()
                        .filter(|&&slot| store.read(slot, col).is_real())
                        .count();
                    if right_real_count > left_real_count {
                        b2
                    } else {
                        b1
                    }
                }
                (true, false) => b1,
                (false, true) => b2,
                (false, false) => Base::N,
            };
            store.write(parent_slot, col, assigned);
        }
    }
}

fn fill_unambiguous_bases_across_gaps(
    store: &mut AlignmentStore,
    tree: &Tree,
    leaf_descendants: &HashMap<NodeId, Vec<usize>>,
) {
    let col_count = store.col_count();
    let mut order = Vec::new();
    tree.traverse(TraversalOrder::PreOrder, |id| {
        if tree.node(id).children.is_some() {
            order.push(id);
        }
    });

    for id in order {
        let slot = tree.node(id).seq_slot;
        let leaves = &leaf_descendants[&id];
        for col in 0..col_count {
            if !store.read(slot, col).is_gap() {
                continue;
            }
            let mut agreed: Option<Base> = None;
            let mut unanimous = true;
            for &leaf_slot in leaves {
                let b = store.read(leaf_slot, col);
                if !b.is_real() {
                    continue;
                }
                match agreed {
                    None => agreed = Some(b),
                    Some(seen) if seen != b => {
                        unanimous = false;
                        break;
                    }
                    _ => {}
                }
            }
            if unanimous {
                if let Some(base) = agreed {
                    store.write(slot, col, base);
                }
            }
        }
    }
}

fn fill_unambiguous_gaps_from_children(store: &mut AlignmentStore, tree: &Tree) {
    let col_count = store.col_count();
    let mut order = Vec::new();
    tree.traverse(TraversalOrder::PreOrder, |id| {
        if tree.node(id).children.is_some() {
            order.push(id);
        }
    });

    for id in order {
        let node = tree.node(id);
        let [left, right] = node.children.expect("internal node has two children");
        let slot = node.seq_slot;
        let left_slot = tree.node(left).seq_slot;
        let right_slot = tree.node(right).seq_slot;
        for col in 0..col_count {
            if store.read(left_slot, col).is_gap() && store.read(right_slot, col).is_gap() {
                store.write(slot, col, Base::Gap);
            }
        }
    }
}
