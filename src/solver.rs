use crate::heuristic::Heuristic;
use crate::puzzle::{Move, Puzzle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

// Bound returned when no child exceeded the threshold.
const NOT_FOUND: u32 = u32::MAX;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SolveError {
    #[error("cancelled by user")]
    Cancelled,
    #[error("unsolvable puzzle")]
    Unsolvable,
    #[error("max threshold reached")]
    ThresholdExhausted,
}

/// Shared flag used to stop a running `solve`.
///
/// Meant for exactly one writer (whoever requested the solve) and one reader
/// (the search). The search only looks at it before each threshold iteration
/// and on entry to each recursive step, never while the path is being
/// modified, so a single atomic flag is all the synchronisation needed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    states: Vec<Puzzle>,
    iterations: u32,
    steps: u64,
}

impl Solution {
    pub fn states(&self) -> &[Puzzle] {
        &self.states
    }

    pub fn into_states(self) -> Vec<Puzzle> {
        self.states
    }

    pub fn initial(&self) -> &Puzzle {
        &self.states[0]
    }

    pub fn last(&self) -> &Puzzle {
        &self.states[self.states.len() - 1]
    }

    pub fn move_count(&self) -> usize {
        self.states.len() - 1
    }

    pub fn moves(&self) -> Vec<Move> {
        self.states
            .windows(2)
            .filter_map(|pair| Move::between(&pair[0], &pair[1]))
            .collect()
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

struct Search<'a, H: ?Sized> {
    path: Vec<Puzzle>,
    heuristic: &'a H,
    cancel: &'a CancelToken,
    steps: u64,
}

impl<H: Heuristic + ?Sized> Search<'_, H> {
    // Returns 0 with the path ending in the goal, otherwise the smallest
    // cost + heuristic that exceeded `threshold`.
    fn bounded(&mut self, cost: u32, threshold: u32) -> Result<u32, SolveError> {
        self.steps += 1;

        let Some(state) = self.path.last() else {
            return Ok(NOT_FOUND);
        };

        let h = self.heuristic.evaluate(state);
        if h == 0 {
            return Ok(0);
        }

        if self.cancel.is_cancelled() {
            return Err(SolveError::Cancelled);
        }

        let f = cost + h;
        if f > threshold {
            return Ok(f);
        }

        let children: Vec<Puzzle> = state
            .valid_moves()
            .into_iter()
            .map(|movement| {
                let mut child = state.clone();
                child.apply_move(movement);
                child
            })
            .collect();

        let mut min = NOT_FOUND;
        for child in children {
            // Only the current path is checked for cycles
            if self.path.contains(&child) {
                continue;
            }

            self.path.push(child);
            let bound = self.bounded(cost + 1, threshold)?;
            if bound == 0 {
                return Ok(0);
            }
            min = min.min(bound);
            self.path.pop();
        }

        Ok(min)
    }
}

/// Finds an optimal path from `initial` to the solved board with IDA*.
///
/// The path is optimal as long as `heuristic` is admissible. Fails with
/// `Unsolvable` before doing any search when the board's parity rules out a
/// solution, and with `Cancelled` once `cancel` is observed.
pub fn solve<H: Heuristic + ?Sized>(
    initial: &Puzzle,
    heuristic: &H,
    cancel: &CancelToken,
) -> Result<Solution, SolveError> {
    if !initial.is_solvable() {
        info!("puzzle is unsolvable, inversions: {}", initial.inversion_count());
        return Err(SolveError::Unsolvable);
    }

    let mut threshold = heuristic.evaluate(initial);
    let mut search = Search {
        path: vec![initial.clone()],
        heuristic,
        cancel,
        steps: 0,
    };
    let mut iterations = 0;

    loop {
        if cancel.is_cancelled() {
            debug!("search cancelled before iteration {}", iterations + 1);
            return Err(SolveError::Cancelled);
        }

        iterations += 1;
        debug!(iterations, threshold, steps = search.steps, "starting iteration");

        match search.bounded(0, threshold) {
            Ok(0) => break,
            Ok(NOT_FOUND) => {
                warn!(threshold, steps = search.steps, "no bound left to raise threshold to");
                return Err(SolveError::ThresholdExhausted);
            }
            Ok(bound) => threshold = bound,
            Err(err) => {
                debug!(steps = search.steps, "search cancelled");
                return Err(err);
            }
        }
    }

    let solution = Solution {
        states: search.path,
        iterations,
        steps: search.steps,
    };
    info!(
        moves = solution.move_count(),
        iterations,
        steps = solution.steps,
        "found optimal solution"
    );
    Ok(solution)
}
