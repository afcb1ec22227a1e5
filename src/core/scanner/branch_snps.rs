// branch_snps.rs - Step A (branch-unique SNP set) and Step B (effective branch sequence)

use crate::data::AlignmentStore;

/// The branch-unique SNP set and informative-column mask for one branch
/// (parent row `p` -> child row `c`), plus the coordinate system (§4.4
/// Steps A-B) that Steps C-E operate over.
#[derive(Debug, Clone)]
pub struct BranchContext {
    pub parent_slot: usize,
    pub child_slot: usize,
    /// Column indices (ascending) where parent and child both hold a real
    /// base and disagree.
    pub brsnp_cols: Vec<usize>,
    /// Per column: true iff neither parent nor child is a gap at that
    /// position (spec.md's "informative position").
    informative: Vec<bool>,
}

impl BranchContext {
    pub fn build(store: &AlignmentStore, parent_slot: usize, child_slot: usize) -> Self {
        let col_count = store.col_count();
        let mut brsnp_cols = Vec::new();
        let mut informative = Vec::with_capacity(col_count);

        for col in 0..col_count {
            let p = store.read(parent_slot, col);
            let c = store.read(child_slot, col);
            informative.push(!p.is_gap() && !c.is_gap());
            if p.is_real() && c.is_real() && p != c {
                brsnp_cols.push(col);
            }
        }

        BranchContext {
            parent_slot,
            child_slot,
            brsnp_cols,
            informative,
        }
    }

    pub fn branch_snp_count(&self) -> usize {
        self.brsnp_cols.len()
    }

    pub fn is_informative(&self, col: usize) -> bool {
        self.informative[col]
    }

    /// The effective informative length `L_eff` used as the branch's overall
    /// substitution-rate denominator in Step C.
    pub fn informative_length(&self) -> usize {
        self.informative.iter().filter(|&&b| b).count()
    }

    pub fn col_count(&self) -> usize {
        self.informative.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Base;

    fn store(parent: Vec<Base>, child: Vec<Base>) -> (AlignmentStore, usize, usize) {
        let snp_location: Vec<u64> = (0..parent.len() as u64).map(|i| i + 1).collect();
        let store = AlignmentStore::load(vec![parent, child], snp_location).unwrap();
        (store, 0, 1)
    }

    #[test]
    fn gap_or_n_endpoints_do_not_count_as_branch_snps() {
        let (store, p, c) = store(
            vec![Base::A, Base::N, Base::Gap, Base::A],
            vec![Base::T, Base::T, Base::T, Base::A],
        );
        let ctx = BranchContext::build(&store, p, c);
        assert_eq!(ctx.brsnp_cols, vec![0]);
        assert_eq!(ctx.branch_snp_count(), 1);
    }

    #[test]
    fn informative_requires_neither_endpoint_gap() {
        let (store, p, c) = store(
            vec![Base::A, Base::Gap, Base::N],
            vec![Base::A, Base::T, Base::T],
        );
        let ctx = BranchContext::build(&store, p, c);
        assert!(ctx.is_informative(0));
        assert!(!ctx.is_informative(1));
        assert!(ctx.is_informative(2));
        assert_eq!(ctx.informative_length(), 2);
    }
}
