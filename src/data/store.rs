// store.rs - the Alignment Store: owns the base matrix and snp_location

use super::base::Base;

/// Owns the rectangular matrix of bases for all samples plus all internal-node
/// reconstructions, the list of variable-site genome coordinates, and nothing
/// else. Every other component reads/mutates bases exclusively through this
/// type.
#[derive(Debug, Clone)]
pub struct AlignmentStore {
    rows: Vec<Vec<Base>>,
    snp_location: Vec<u64>,
    sample_count: usize,
}

impl AlignmentStore {
    /// Build the store from `S` input samples, each a row of bases of equal
    /// length, and the genome coordinate for each column. `snp_location` must
    /// already be strictly increasing and match the row width.
    pub fn load(rows: Vec<Vec<Base>>, snp_location: Vec<u64>) -> Result<Self, String> {
        if rows.is_empty() {
            return Err("alignment store: no sample rows supplied".to_string());
        }
        let width = rows[0].len();
        if width != snp_location.len() {
            return Err(format!(
                "alignment store: {} snp_location entries but rows are {} columns wide",
                snp_location.len(),
                width
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(format!(
                    "alignment store: row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    width
                ));
            }
        }
        if !snp_location.windows(2).all(|w| w[0] < w[1]) {
            return Err("alignment store: snp_location is not strictly increasing".to_string());
        }
        let sample_count = rows.len();
        Ok(AlignmentStore {
            rows,
            snp_location,
            sample_count,
        })
    }

    /// Allocate `internal_count` further rows, initialised to all-`N`.
    pub fn ensure_internal_rows(&mut self, internal_count: usize) {
        let width = self.col_count();
        for _ in 0..internal_count {
            self.rows.push(vec![Base::N; width]);
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn internal_count(&self) -> usize {
        self.rows.len() - self.sample_count
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.snp_location.first().map(|_| self.rows[0].len()).unwrap_or(0)
    }

    pub fn snp_location(&self) -> &[u64] {
        &self.snp_location
    }

    pub fn read(&self, row: usize, col: usize) -> Base {
        self.rows[row][col]
    }

    pub fn row(&self, row: usize) -> &[Base] {
        &self.rows[row]
    }

    /// Writes `base` at `(row, col)`. Returns `false` (a no-op) if this would
    /// replace a concrete base with the identical concrete base; all other
    /// transitions (including N/gap <-> concrete, or concrete -> different
    /// concrete) are applied and return `true`.
    pub fn write(&mut self, row: usize, col: usize, base: Base) -> bool {
        let current = self.rows[row][col];
        if current.is_real() && current == base {
            return false;
        }
        self.rows[row][col] = base;
        true
    }

    /// True iff at least one of `active_rows` holds a concrete base at `col`
    /// distinct from `reference`.
    pub fn column_is_snp(&self, col: usize, reference: Base, active_rows: &[usize]) -> bool {
        active_rows.iter().any(|&r| {
            let b = self.rows[r][col];
            b.is_real() && b != reference
        })
    }

    /// Recomputes which columns still contain at least two distinct concrete
    /// bases among `active_rows`, after recombinant bases have been masked
    /// out. Returns the retained column indices and their genome coordinates.
    pub fn refilter(&self, active_rows: &[usize]) -> (Vec<usize>, Vec<u64>) {
        let mut cols = Vec::new();
        let mut locs = Vec::new();
        for col in 0..self.col_count() {
            let mut distinct_real: Option<Base> = None;
            let mut is_variable = false;
            for &r in active_rows {
                let b = self.rows[r][col];
                if !b.is_real() {
                    continue;
                }
                match distinct_real {
                    None => distinct_real = Some(b),
                    Some(seen) if seen != b => {
                        is_variable = true;
                        break;
                    }
                    _ => {}
                }
            }
            if is_variable {
                cols.push(col);
                locs.push(self.snp_location[col]);
            }
        }
        (cols, locs)
    }

    /// Column-major view over `filtered_cols`, one column per row in
    /// `active_rows`, substituting `N` for any position equal to gap.
    pub fn rotate(&self, active_rows: &[usize], filtered_cols: &[usize]) -> Vec<Vec<Base>> {
        filtered_cols
            .iter()
            .map(|&col| {
                active_rows
                    .iter()
                    .map(|&r| {
                        let b = self.rows[r][col];
                        if b.is_gap() {
                            Base::N
                        } else {
                            b
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_store() -> AlignmentStore {
        // 3 samples, 4 columns. Column 2 is monomorphic (all A).
        let rows = vec![
            vec![Base::A, Base::C, Base::A, Base::Gap],
            vec![Base::A, Base::G, Base::A, Base::T],
            vec![Base::T, Base::C, Base::A, Base::T],
        ];
        AlignmentStore::load(rows, vec![10, 20, 30, 40]).unwrap()
    }

    #[test]
    fn write_rejects_identical_concrete_overwrite() {
        let mut store = toy_store();
        assert!(!store.write(0, 0, Base::A));
        assert!(store.write(0, 0, Base::T));
        assert!(store.write(0, 0, Base::N));
    }

    #[test]
    fn column_is_snp_requires_two_distinct_concrete_bases() {
        let store = toy_store();
        assert!(store.column_is_snp(0, Base::A, &[0, 1, 2]));
        assert!(!store.column_is_snp(2, Base::A, &[0, 1, 2]));
    }

    #[test]
    fn refilter_drops_monomorphic_columns() {
        let store = toy_store();
        let (cols, locs) = store.refilter(&[0, 1, 2]);
        assert_eq!(cols, vec![0, 1]);
        assert_eq!(locs, vec![10, 20]);
    }

    #[test]
    fn rotate_substitutes_n_for_gap() {
        let store = toy_store();
        let rotated = store.rotate(&[0, 1, 2], &[3]);
        assert_eq!(rotated, vec![vec![Base::N, Base::T, Base::T]]);
    }

    #[test]
    fn load_rejects_non_monotonic_snp_location() {
        let rows = vec![vec![Base::A, Base::C]];
        assert!(AlignmentStore::load(rows, vec![5, 3]).is_err());
    }
}
