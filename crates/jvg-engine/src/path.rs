//! Path tracing through the progress cells of one rank node.
//!
//! A path starts at a tagged cell and repeatedly moves to the next progress
//! column: a lower column of the same row, or any column of the following
//! row once column 0 is reached. Because the cell matrix is finite and each
//! extension narrows the previous point, every well-formed path eventually
//! repeats a point and closes a cycle.
//!
//! States dropped by narrowing, and responses that land in a different cell
//! than the one the path follows, are queued as new seeds so that every
//! state a committed choice can reach is covered by some path.

use std::collections::{BTreeSet, VecDeque};

use jvg_symbolic::SymbolicAlgebra;
use tracing::trace;

use crate::context::GameContext;
use crate::error::InvariantViolation;

#[derive(Debug)]
pub struct PathPoint<S> {
    pub row: usize,
    pub col: usize,
    /// Tagged with `row`.
    pub states: S,
}

#[derive(Debug)]
pub struct TracedPath<S> {
    pub points: Vec<PathPoint<S>>,
    /// Index of the first point of the cycle; earlier points form the prefix.
    pub cycle_start: usize,
}

impl<S> TracedPath<S> {
    pub fn prefix(&self) -> &[PathPoint<S>] {
        &self.points[..self.cycle_start]
    }

    pub fn cycle(&self) -> &[PathPoint<S>] {
        &self.points[self.cycle_start..]
    }

    pub fn cycle_rows(&self) -> BTreeSet<usize> {
        self.cycle().iter().map(|p| p.row).collect()
    }
}

/// Verify that a cycle visits every row when there is more than one.
pub(crate) fn check_cycle_rows(
    rank: usize,
    start: (usize, usize),
    visited: &BTreeSet<usize>,
    rows: usize,
) -> Result<(), InvariantViolation> {
    if rows > 1 && visited.len() != rows {
        return Err(InvariantViolation::CycleSkipsRows {
            rank,
            row: start.0,
            col: start.1,
            visited: visited.iter().copied().collect(),
            rows,
        });
    }
    Ok(())
}

pub(crate) struct PathTracer<'t, 'a, A: SymbolicAlgebra> {
    ctx: &'t GameContext<'a, A>,
    rank: usize,
    /// Filtered, tagged cells.
    cells: &'t [Vec<A::Set>],
    /// `reach[row][col]`: union of `cells[row][0..=col]`.
    reach: Vec<Vec<A::Set>>,
    /// Untagged states every response may also fall into.
    escape: &'t A::Set,
    inner: &'t mut A::Set,
    spill: Vec<PathPoint<A::Set>>,
}

impl<'t, 'a, A: SymbolicAlgebra> PathTracer<'t, 'a, A> {
    pub fn new(
        ctx: &'t GameContext<'a, A>,
        rank: usize,
        cells: &'t [Vec<A::Set>],
        escape: &'t A::Set,
        inner: &'t mut A::Set,
    ) -> Self {
        let alg = ctx.alg;
        let reach: Vec<Vec<A::Set>> = cells
            .iter()
            .map(|row| {
                let mut acc = alg.empty();
                row.iter()
                    .map(|cell| {
                        acc = alg.or(&acc, cell);
                        alg.share(&acc)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        Self {
            ctx,
            rank,
            cells,
            reach,
            escape,
            inner,
            spill: Vec::new(),
        }
    }

    /// Trace a path from every seed, and from every state the traced paths
    /// reach without following, until all of them are covered.
    pub fn trace_all<I>(&mut self, seeds: I) -> Result<Vec<TracedPath<A::Set>>, InvariantViolation>
    where
        I: IntoIterator<Item = PathPoint<A::Set>>,
    {
        let alg = self.ctx.alg;
        let mut pending: VecDeque<PathPoint<A::Set>> = seeds.into_iter().collect();
        let mut covered = alg.empty();
        let mut paths = Vec::new();
        while let Some(mut seed) = pending.pop_front() {
            seed.states = alg.and_not(&seed.states, &covered);
            if alg.is_empty(&seed.states) {
                continue;
            }
            let path = self.trace(seed)?;
            for point in &path.points {
                covered = alg.or(&covered, &point.states);
            }
            pending.extend(self.spill.drain(..));
            paths.push(path);
        }
        Ok(paths)
    }

    pub fn trace(&mut self, start: PathPoint<A::Set>) -> Result<TracedPath<A::Set>, InvariantViolation> {
        let alg = self.ctx.alg;
        let mut points = vec![start];
        let cycle_start = loop {
            let tail = points.len() - 1;
            let last = &mut points[tail];
            let (row, col) = (last.row, last.col);
            let Some(next) = self.extend(last) else {
                return Err(InvariantViolation::PathStuck {
                    rank: self.rank,
                    row,
                    col,
                });
            };
            trace!(rank = self.rank, row = next.row, col = next.col, "Extended path");
            let repeat = points.iter().position(|p| {
                p.row == next.row && p.col == next.col && alg.equals(&p.states, &next.states)
            });
            match repeat {
                Some(index) => break index,
                None => points.push(next),
            }
        };
        let path = TracedPath {
            points,
            cycle_start,
        };
        let first = &path.points[cycle_start];
        check_cycle_rows(
            self.rank,
            (first.row, first.col),
            &path.cycle_rows(),
            self.cells.len(),
        )?;
        Ok(path)
    }

    /// Move one progress step from `last`, narrowing `last` to the states
    /// that took the step.
    fn extend(&mut self, last: &mut PathPoint<A::Set>) -> Option<PathPoint<A::Set>> {
        let ctx = self.ctx;
        let alg = ctx.alg;
        let cells = self.cells;
        let rows = cells.len();
        let (target_row, top) = if last.col > 0 {
            (last.row, last.col - 1)
        } else {
            let row = (last.row + 1) % rows;
            (row, cells[row].len().checked_sub(1)?)
        };

        let stay = alg.or(&self.reach[target_row][top], self.escape);
        let forcing = alg.and(
            &alg.and(&ctx.forcing_choices(&stay), &ctx.entering_row(target_row)),
            &last.states,
        );
        let committed = alg.and(self.inner, &last.states);
        let fresh = alg.and_not(&forcing, &ctx.domain(&committed));
        let allowed = alg.or(&fresh, &alg.and(&forcing, &committed));

        for col in (0..=top).rev() {
            let cell = &cells[target_row][col];
            if alg.is_empty(cell) {
                continue;
            }
            let landing = alg.and(&allowed, &ctx.landing_choices(cell));
            if alg.is_empty(&landing) {
                continue;
            }
            let chosen = ctx.determinize(&landing);
            let movers = ctx.domain(&chosen);
            let full = ctx.image(&movers, &chosen);
            for other in (0..=top).filter(|c| *c != col) {
                self.spill_into(target_row, other, alg.and(&full, &cells[target_row][other]));
            }
            let dropped = alg.and_not(&last.states, &movers);
            self.spill_into(last.row, last.col, dropped);
            *self.inner = alg.or(self.inner, &chosen);
            last.states = movers;
            return Some(PathPoint {
                row: target_row,
                col,
                states: alg.and(&full, cell),
            });
        }
        None
    }

    fn spill_into(&mut self, row: usize, col: usize, states: A::Set) {
        if !self.ctx.alg.is_empty(&states) {
            self.spill.push(PathPoint { row, col, states });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_row_check_ignores_single_row() {
        let visited: BTreeSet<usize> = [0].into_iter().collect();
        assert!(check_cycle_rows(0, (0, 0), &visited, 1).is_ok());
    }

    #[test]
    fn cycle_row_check_reports_missing_rows() {
        let visited: BTreeSet<usize> = [0, 2].into_iter().collect();
        let err = check_cycle_rows(3, (2, 1), &visited, 3).unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::CycleSkipsRows {
                rank: 3,
                row: 2,
                col: 1,
                visited: vec![0, 2],
                rows: 3,
            }
        );
    }

    #[test]
    fn prefix_and_cycle_split_at_cycle_start() {
        let path = TracedPath {
            points: vec![
                PathPoint { row: 1, col: 1, states: () },
                PathPoint { row: 1, col: 0, states: () },
                PathPoint { row: 0, col: 0, states: () },
            ],
            cycle_start: 1,
        };
        assert_eq!(path.prefix().len(), 1);
        assert_eq!(path.cycle_rows(), [0, 1].into_iter().collect());
    }
}
