//! Cell adjacency used by region labeling and crossing detection

/// Which neighbors of a cell count as adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge-sharing neighbors only (N, E, S, W)
    Four,
    /// Edge- and corner-sharing neighbors. Diagonal terrain features stay
    /// connected, so this is what the contour pipeline uses.
    #[default]
    Eight,
}

const FOUR: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

const EIGHT: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

impl Connectivity {
    /// (row, col) offsets of the neighbors, center excluded
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &FOUR,
            Connectivity::Eight => &EIGHT,
        }
    }

    /// In-bounds neighbors of (row, col) in a grid of the given shape
    pub fn neighbors(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.offsets().iter().filter_map(move |&(dr, dc)| {
            let nr = row.checked_add_signed(dr)?;
            let nc = col.checked_add_signed(dc)?;
            (nr < rows && nc < cols).then_some((nr, nc))
        })
    }
}
