use crate::puzzle::Puzzle;
use std::fmt;

/// Lower bound on the number of moves left to reach the solved board.
///
/// Implementations must be admissible (never overestimate) for `solve` to
/// return an optimal path.
pub trait Heuristic {
    fn evaluate(&self, puzzle: &Puzzle) -> u32;
}

// Goal row and column of a numbered tile.
fn goal(label: u32, dimension: usize) -> (usize, usize) {
    let slot = label as usize - 1;
    (slot / dimension, slot % dimension)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl Heuristic for Manhattan {
    fn evaluate(&self, puzzle: &Puzzle) -> u32 {
        let dimension = puzzle.dimension();
        let mut distance = 0;

        for (index, &value) in puzzle.tiles().iter().enumerate() {
            // Skip blank and tiles already home
            if value == 0 || value as usize == index + 1 {
                continue;
            }

            let (target_row, target_col) = goal(value, dimension);
            distance += (index / dimension).abs_diff(target_row);
            distance += (index % dimension).abs_diff(target_col);
        }

        distance as u32
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MisplacedTiles;

impl Heuristic for MisplacedTiles {
    fn evaluate(&self, puzzle: &Puzzle) -> u32 {
        puzzle
            .tiles()
            .iter()
            .enumerate()
            .filter(|&(index, &value)| value != 0 && value as usize != index + 1)
            .count() as u32
    }
}

/// Manhattan distance plus two moves for every tile that has to step out of
/// its goal row or column to let a conflicting tile past.
///
/// Rows and columns are scanned separately. A line is charged the fewest
/// tiles whose removal leaves its remaining goal positions in order, so a
/// line like `3 2 1` costs two tiles rather than three pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearConflict;

impl LinearConflict {
    fn row_penalty(puzzle: &Puzzle, row: usize) -> u32 {
        let dimension = puzzle.dimension();
        let goals: Vec<usize> = (0..dimension)
            .map(|col| puzzle.get_at(row, col))
            .filter(|&value| value != 0)
            .map(|value| goal(value, dimension))
            .filter(|&(goal_row, _)| goal_row == row)
            .map(|(_, goal_col)| goal_col)
            .collect();

        line_penalty(&goals)
    }

    fn col_penalty(puzzle: &Puzzle, col: usize) -> u32 {
        let dimension = puzzle.dimension();
        let goals: Vec<usize> = (0..dimension)
            .map(|row| puzzle.get_at(row, col))
            .filter(|&value| value != 0)
            .map(|value| goal(value, dimension))
            .filter(|&(_, goal_col)| goal_col == col)
            .map(|(goal_row, _)| goal_row)
            .collect();

        line_penalty(&goals)
    }

    /// Conflict penalty summed over all rows and columns, without the
    /// Manhattan part.
    pub fn conflicts(puzzle: &Puzzle) -> u32 {
        (0..puzzle.dimension())
            .map(|i| Self::row_penalty(puzzle, i) + Self::col_penalty(puzzle, i))
            .sum()
    }
}

impl Heuristic for LinearConflict {
    fn evaluate(&self, puzzle: &Puzzle) -> u32 {
        Manhattan.evaluate(puzzle) + 2 * Self::conflicts(puzzle)
    }
}

// Tiles that must leave the line: length minus the longest increasing subsequence.
fn line_penalty(goals: &[usize]) -> u32 {
    if goals.len() < 2 {
        return 0;
    }

    let mut longest = vec![1usize; goals.len()];
    for j in 1..goals.len() {
        for k in 0..j {
            if goals[k] < goals[j] && longest[k] + 1 > longest[j] {
                longest[j] = longest[k] + 1;
            }
        }
    }

    let keep = longest.iter().copied().max().unwrap_or(0);
    (goals.len() - keep) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeuristicKind {
    Manhattan,
    MisplacedTiles,
    #[default]
    LinearConflict,
}

impl HeuristicKind {
    pub const ALL: [HeuristicKind; 3] = [
        HeuristicKind::Manhattan,
        HeuristicKind::MisplacedTiles,
        HeuristicKind::LinearConflict,
    ];

    // Wraps around to the first
    pub fn next(self) -> Self {
        match self {
            HeuristicKind::Manhattan => HeuristicKind::MisplacedTiles,
            HeuristicKind::MisplacedTiles => HeuristicKind::LinearConflict,
            HeuristicKind::LinearConflict => HeuristicKind::Manhattan,
        }
    }
}

impl Heuristic for HeuristicKind {
    fn evaluate(&self, puzzle: &Puzzle) -> u32 {
        match self {
            HeuristicKind::Manhattan => Manhattan.evaluate(puzzle),
            HeuristicKind::MisplacedTiles => MisplacedTiles.evaluate(puzzle),
            HeuristicKind::LinearConflict => LinearConflict.evaluate(puzzle),
        }
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            HeuristicKind::Manhattan => "Manhattan distance",
            HeuristicKind::MisplacedTiles => "Misplaced tiles",
            HeuristicKind::LinearConflict => "Linear conflict",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(tiles: &[u32]) -> Puzzle {
        let dimension = (tiles.len() as f64).sqrt() as usize;
        Puzzle::from_tiles(dimension, tiles.to_vec()).unwrap()
    }

    #[test]
    fn solved_board_scores_zero() {
        let solved = Puzzle::solved(4).unwrap();
        for kind in HeuristicKind::ALL {
            assert_eq!(kind.evaluate(&solved), 0, "{}", kind);
        }
    }

    #[test]
    fn manhattan_sums_tile_distances() {
        // 7 and 8 each one column right of home
        let puzzle = board(&[1, 2, 3, 4, 5, 6, 0, 7, 8]);
        assert_eq!(Manhattan.evaluate(&puzzle), 2);

        // 8 and 1 swapped across the board, three cells each
        let puzzle = board(&[8, 2, 3, 4, 5, 6, 7, 1, 0]);
        assert_eq!(Manhattan.evaluate(&puzzle), 6);
    }

    #[test]
    fn misplaced_ignores_the_blank() {
        let puzzle = board(&[1, 2, 3, 4, 5, 6, 0, 7, 8]);
        assert_eq!(MisplacedTiles.evaluate(&puzzle), 2);

        let puzzle = board(&[0, 1, 2, 3]);
        assert_eq!(MisplacedTiles.evaluate(&puzzle), 3);
    }

    #[test]
    fn reversed_pair_in_row_adds_two_moves() {
        let puzzle = board(&[2, 1, 3, 4, 5, 6, 7, 8, 0]);
        assert_eq!(Manhattan.evaluate(&puzzle), 2);
        assert_eq!(LinearConflict::conflicts(&puzzle), 1);
        assert_eq!(LinearConflict.evaluate(&puzzle), 4);
    }

    #[test]
    fn reversed_pair_in_column_adds_two_moves() {
        let puzzle = board(&[4, 2, 3, 1, 5, 6, 7, 8, 0]);
        assert_eq!(LinearConflict::conflicts(&puzzle), 1);
        assert_eq!(LinearConflict.evaluate(&puzzle), 4);
    }

    #[test]
    fn tiles_from_other_lines_do_not_conflict() {
        // 4 belongs to row 1, so it never conflicts with 1 in row 0
        let puzzle = board(&[4, 1, 3, 2, 5, 6, 7, 8, 0]);
        assert_eq!(LinearConflict::conflicts(&puzzle), 0);
        assert_eq!(LinearConflict.evaluate(&puzzle), Manhattan.evaluate(&puzzle));
    }

    #[test]
    fn fully_reversed_line_needs_two_tiles_moved() {
        let puzzle = board(&[3, 2, 1, 4, 5, 6, 7, 8, 0]);
        assert_eq!(LinearConflict::conflicts(&puzzle), 2);
    }

    #[test]
    fn line_penalty_counts_tiles_to_remove() {
        assert_eq!(line_penalty(&[]), 0);
        assert_eq!(line_penalty(&[0, 1, 2, 3]), 0);
        assert_eq!(line_penalty(&[1, 0, 3, 2]), 2);
        assert_eq!(line_penalty(&[3, 0, 1, 2]), 1);
        assert_eq!(line_penalty(&[3, 2, 1, 0]), 3);
    }

    #[test]
    fn kind_cycles_through_all() {
        let mut kind = HeuristicKind::default();
        for _ in 0..HeuristicKind::ALL.len() {
            kind = kind.next();
        }
        assert_eq!(kind, HeuristicKind::default());
    }
}
