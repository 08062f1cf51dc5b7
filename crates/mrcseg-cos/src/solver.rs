//! Row-wise dynamic programming over block labels
//!
//! The grid cost is
//!
//! ```text
//! sum over blocks  data(s) + l3 * fg_fraction(s) + l4 * coarse_mismatch(s)
//! sum over h-pairs l1 * overlap_mismatch(s_left, s_right)
//! sum over v-pairs l2 * overlap_mismatch(s_above, s_below)
//! ```
//!
//! with every pixel count normalized by the block area. Fixing all rows
//! but one turns the grid cost into a 4-state chain along that row, which
//! a Viterbi pass minimizes exactly. Sweeping rows repeatedly is then a
//! block coordinate descent: the grid cost never increases.
//!
//! Scheduling:
//!
//! - without an initial labeling the first sweep runs top-down and sees
//!   only the row above, since rows below are not yet labeled
//! - every other sweep solves all even rows in parallel against the
//!   current odd rows, then all odd rows against the new even rows
//! - a row keeps its labels unless the new labeling is strictly cheaper,
//!   so sweeps stop changing once no row can improve

use crate::block::BlockGrid;
use crate::overlap::{CoarseTable, OverlapTables};
use crate::params::{BlockLabel, CosWeights};
use log::trace;
use mrcseg_core::Grid;
use rayon::prelude::*;

type Costs = [f64; 4];

/// Cost evaluation for one block grid
#[derive(Debug, Clone, Copy)]
pub struct CostModel<'a> {
    grid: &'a BlockGrid,
    tables: &'a OverlapTables,
    coarse: Option<&'a CoarseTable>,
    weights: CosWeights,
    norm: f64,
}

impl<'a> CostModel<'a> {
    /// Bind a grid, its overlap tables and optionally a coarser layer.
    pub fn new(
        grid: &'a BlockGrid,
        tables: &'a OverlapTables,
        coarse: Option<&'a CoarseTable>,
        weights: CosWeights,
    ) -> Self {
        Self {
            grid,
            tables,
            coarse,
            weights,
            norm: 1.0 / grid.geometry.block_area() as f64,
        }
    }

    #[inline]
    fn rows(&self) -> usize {
        self.grid.geometry.rows
    }

    #[inline]
    fn cols(&self) -> usize {
        self.grid.geometry.cols
    }

    /// Terms that depend on one block's label only.
    pub fn local_cost(&self, r: usize, c: usize, s: BlockLabel) -> f64 {
        let b = self.grid.block(r, c);
        let area = self.grid.geometry.block_area();
        let fg = s.foreground_in(b.fg_count, area) as f64 * self.norm;
        let mut cost = b.data_cost(s.uses_threshold()) + self.weights.lambda3 * fg;
        if let Some(ct) = self.coarse {
            cost += self.weights.lambda4 * ct.mismatch[(r, c)][s.index()] as f64 * self.norm;
        }
        cost
    }

    /// Weighted mismatch between `(r, c)` and `(r, c + 1)`.
    #[inline]
    pub fn horizontal_cost(&self, r: usize, c: usize, a: BlockLabel, b: BlockLabel) -> f64 {
        self.weights.lambda1 * self.tables.horizontal_mismatch(r, c, a, b) as f64 * self.norm
    }

    /// Weighted mismatch between `(r, c)` and `(r + 1, c)`.
    #[inline]
    pub fn vertical_cost(&self, r: usize, c: usize, a: BlockLabel, b: BlockLabel) -> f64 {
        self.weights.lambda2 * self.tables.vertical_mismatch(r, c, a, b) as f64 * self.norm
    }

    /// Total cost of a full labeling.
    pub fn total_cost(&self, labels: &Grid<BlockLabel>) -> f64 {
        let mut total = 0.0;
        for ((r, c), &s) in labels.indexed_iter() {
            total += self.local_cost(r, c, s);
            if c + 1 < self.cols() {
                total += self.horizontal_cost(r, c, s, labels[(r, c + 1)]);
            }
            if r + 1 < self.rows() {
                total += self.vertical_cost(r, c, s, labels[(r + 1, c)]);
            }
        }
        total
    }

    /// Per-block label costs of row `r` with the neighboring rows fixed.
    fn row_unary(&self, r: usize, labels: &Grid<BlockLabel>, use_below: bool) -> Vec<Costs> {
        (0..self.cols())
            .map(|c| {
                let mut costs = [0.0; 4];
                for s in BlockLabel::ALL {
                    let mut v = self.local_cost(r, c, s);
                    if r > 0 {
                        v += self.vertical_cost(r - 1, c, labels[(r - 1, c)], s);
                    }
                    if use_below && r + 1 < self.rows() {
                        v += self.vertical_cost(r, c, s, labels[(r + 1, c)]);
                    }
                    costs[s.index()] = v;
                }
                costs
            })
            .collect()
    }

    /// Cost of one labeling of row `r` given its unary table.
    fn row_cost(&self, r: usize, row: &[BlockLabel], unary: &[Costs]) -> f64 {
        let mut cost: f64 = row
            .iter()
            .zip(unary)
            .map(|(s, u)| u[s.index()])
            .sum();
        for c in 0..row.len().saturating_sub(1) {
            cost += self.horizontal_cost(r, c, row[c], row[c + 1]);
        }
        cost
    }

    /// Exact minimization of row `r` by a 4-state Viterbi pass.
    ///
    /// Returns the optimal labels and their conditional cost. Ties go to
    /// the lowest label index.
    fn viterbi(&self, r: usize, unary: &[Costs]) -> (Vec<BlockLabel>, f64) {
        let n = unary.len();
        let mut acc = vec![[0.0; 4]; n];
        let mut back = vec![[0u8; 4]; n];
        acc[0] = unary[0];
        for c in 1..n {
            for s in BlockLabel::ALL {
                let mut best = f64::INFINITY;
                let mut arg = 0u8;
                for p in BlockLabel::ALL {
                    let v = acc[c - 1][p.index()] + self.horizontal_cost(r, c - 1, p, s);
                    if v < best {
                        best = v;
                        arg = p as u8;
                    }
                }
                acc[c][s.index()] = best + unary[c][s.index()];
                back[c][s.index()] = arg;
            }
        }

        let mut last = 0;
        for k in 1..4 {
            if acc[n - 1][k] < acc[n - 1][last] {
                last = k;
            }
        }
        let best_cost = acc[n - 1][last];
        let mut out = vec![BlockLabel::Original; n];
        let mut k = last;
        for c in (0..n).rev() {
            out[c] = BlockLabel::ALL[k];
            if c > 0 {
                k = back[c][k] as usize;
            }
        }
        (out, best_cost)
    }

    /// Re-solve row `r`; returns the new row only if it is strictly cheaper
    /// than the current one.
    fn improve_row(&self, r: usize, labels: &Grid<BlockLabel>) -> Option<Vec<BlockLabel>> {
        let unary = self.row_unary(r, labels, true);
        let (best, best_cost) = self.viterbi(r, &unary);
        let current = self.row_cost(r, labels.row(r), &unary);
        let eps = 1e-9 * (1.0 + current.abs());
        (best_cost < current - eps && best.as_slice() != labels.row(r)).then_some(best)
    }

    /// First sweep without an initial labeling: top-down, row above only.
    fn initial_sweep(&self) -> Grid<BlockLabel> {
        let mut labels = Grid::new(self.rows(), self.cols(), BlockLabel::Original);
        for r in 0..self.rows() {
            let unary = self.row_unary(r, &labels, false);
            let (row, _) = self.viterbi(r, &unary);
            labels.row_mut(r).copy_from_slice(&row);
        }
        labels
    }

    /// One red/black sweep; returns the number of changed blocks.
    fn sweep(&self, labels: &mut Grid<BlockLabel>) -> usize {
        let mut changed = 0;
        for parity in 0..2 {
            let rows: Vec<usize> = (parity..self.rows()).step_by(2).collect();
            let snapshot: &Grid<BlockLabel> = labels;
            let updates: Vec<(usize, Vec<BlockLabel>)> = rows
                .par_iter()
                .filter_map(|&r| self.improve_row(r, snapshot).map(|row| (r, row)))
                .collect();
            for (r, row) in updates {
                changed += row
                    .iter()
                    .zip(labels.row(r))
                    .filter(|(a, b)| a != b)
                    .count();
                labels.row_mut(r).copy_from_slice(&row);
            }
        }
        changed
    }

    /// Iterate sweeps to a fixed point or until `max_sweeps` sweeps ran.
    pub fn solve(&self, init: Option<Grid<BlockLabel>>, max_sweeps: usize) -> SolveOutcome {
        let mut cost_history = Vec::new();
        let mut sweeps = 0;
        let mut converged = false;

        let mut labels = match init {
            Some(labels) => labels,
            None => {
                let labels = self.initial_sweep();
                sweeps = 1;
                let cost = self.total_cost(&labels);
                trace!("cos sweep 1 (initial): cost {:.4}", cost);
                cost_history.push(cost);
                labels
            }
        };

        while sweeps < max_sweeps {
            let changed = self.sweep(&mut labels);
            sweeps += 1;
            let cost = self.total_cost(&labels);
            trace!("cos sweep {}: cost {:.4}, {} changed", sweeps, cost, changed);
            cost_history.push(cost);
            if changed == 0 {
                converged = true;
                break;
            }
        }

        SolveOutcome {
            labels,
            sweeps,
            cost_history,
            converged,
        }
    }
}

/// Result of iterating the row solver
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Final block labels
    pub labels: Grid<BlockLabel>,
    /// Sweeps performed, including the initial top-down sweep
    pub sweeps: usize,
    /// Grid cost after each sweep
    pub cost_history: Vec<f64>,
    /// Whether the last sweep changed nothing
    pub converged: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrcseg_core::{Pix, PixelDepth};

    fn striped(w: u32, h: u32) -> Pix {
        let mut pm = Pix::new(w, h, 3, PixelDepth::Bit8).unwrap().to_mut();
        pm.fill_rect_rgb(0, 0, w, h, (235, 235, 235)).unwrap();
        let mut x = 5;
        while x < w {
            pm.fill_rect_rgb(x, h / 4, 3, h / 2, (20, 20, 20)).unwrap();
            x += 13;
        }
        pm.into()
    }

    #[test]
    fn test_viterbi_matches_brute_force() {
        let pix = striped(48, 16);
        let grid = BlockGrid::build(&pix, 16).unwrap();
        // a single row of blocks, every one crossing a stripe
        assert!((0..5).all(|c| grid.block(0, c).split));
        let tables = OverlapTables::build(&grid);
        let model = CostModel::new(&grid, &tables, None, CosWeights::default());
        let labels = Grid::new(1, 5, BlockLabel::Original);
        let unary = model.row_unary(0, &labels, true);
        let (best, best_cost) = model.viterbi(0, &unary);

        let mut brute = f64::INFINITY;
        for code in 0..4usize.pow(5) {
            let row: Vec<BlockLabel> = (0..5)
                .map(|k| BlockLabel::ALL[(code >> (2 * k)) & 3])
                .collect();
            brute = brute.min(model.row_cost(0, &row, &unary));
        }
        assert!((best_cost - brute).abs() < 1e-9);
        assert!((model.row_cost(0, &best, &unary) - best_cost).abs() < 1e-9);
    }

    #[test]
    fn test_total_cost_matches_row_cost_for_single_row() {
        let pix = striped(48, 16);
        let grid = BlockGrid::build(&pix, 16).unwrap();
        let tables = OverlapTables::build(&grid);
        let model = CostModel::new(&grid, &tables, None, CosWeights::default());
        let labels = Grid::from_fn(1, 5, |_, c| BlockLabel::ALL[c % 4]);
        let unary = model.row_unary(0, &labels, true);
        let row_cost = model.row_cost(0, labels.row(0), &unary);
        assert!((model.total_cost(&labels) - row_cost).abs() < 1e-9);
    }

    #[test]
    fn test_solve_is_monotone() {
        let pix = striped(96, 80);
        let grid = BlockGrid::build(&pix, 16).unwrap();
        let tables = OverlapTables::build(&grid);
        let model = CostModel::new(&grid, &tables, None, CosWeights::default());
        let out = model.solve(None, 20);
        assert!(out.sweeps >= 2);
        for w in out.cost_history.windows(2) {
            assert!(w[1] <= w[0] + 1e-9, "cost rose: {:?}", out.cost_history);
        }
        let last = *out.cost_history.last().unwrap();
        assert!((model.total_cost(&out.labels) - last).abs() < 1e-9);
    }

    #[test]
    fn test_solve_from_initial_labels() {
        let pix = striped(96, 80);
        let grid = BlockGrid::build(&pix, 16).unwrap();
        let tables = OverlapTables::build(&grid);
        let model = CostModel::new(&grid, &tables, None, CosWeights::default());
        let (rows, cols) = (grid.geometry.rows, grid.geometry.cols);
        let init = Grid::new(rows, cols, BlockLabel::AllForeground);
        let start = model.total_cost(&init);
        let out = model.solve(Some(init), 20);
        assert!(out.cost_history[0] <= start);
        assert!(out.converged);
    }
}
