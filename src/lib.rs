//! Optimal solver for the square sliding-tile puzzle (8-puzzle, 15-puzzle, ...)
//! using iterative-deepening A* with a choice of admissible heuristics.
pub mod heuristic;
pub mod puzzle;
pub mod solver;

pub use crate::heuristic::{Heuristic, HeuristicKind, LinearConflict, Manhattan, MisplacedTiles};
pub use crate::puzzle::{Move, Puzzle, PuzzleError};
pub use crate::solver::{solve, CancelToken, Solution, SolveError};
