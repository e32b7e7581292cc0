use rand::{seq::SliceRandom, Rng};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    // Search expands children in this order
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    pub fn as_offset(&self) -> (isize, isize) {
        match self {
            Move::Up => (-1, 0),
            Move::Down => (1, 0),
            Move::Left => (0, -1),
            Move::Right => (0, 1),
        }
    }

    pub fn between(from: &Puzzle, to: &Puzzle) -> Option<Move> {
        Move::ALL.into_iter().find(|&movement| {
            let mut next = from.clone();
            next.apply_move(movement) && next == *to
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Move::Up => "Up",
            Move::Down => "Down",
            Move::Left => "Left",
            Move::Right => "Right",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("puzzle size {0} is not one less than a square with side of at least 2")]
    InvalidSize(usize),
    #[error("puzzle dimension must be at least 2, got {0}")]
    InvalidDimension(usize),
    #[error("invalid tiles: {0}")]
    InvalidTiles(String),
}

/// A d×d sliding-tile board. Label 0 is the blank.
///
/// Tiles are stored row-major and always form a permutation of `0..d²`;
/// the cached blank coordinates always point at the cell holding 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Puzzle {
    dimension: usize,
    tiles: Vec<u32>,
    blank_row: usize,
    blank_col: usize,
}

impl Puzzle {
    /// Creates a shuffled `size`-puzzle, e.g. `size = 15` gives a 4×4 board.
    pub fn new<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<Self, PuzzleError> {
        let Some(len) = size.checked_add(1) else {
            return Err(PuzzleError::InvalidSize(size));
        };
        let dimension = (len as f64).sqrt().round() as usize;
        if dimension < 2 || dimension.checked_mul(dimension) != Some(len) {
            return Err(PuzzleError::InvalidSize(size));
        }

        let mut puzzle = Self::solved(dimension).map_err(|_| PuzzleError::InvalidSize(size))?;
        puzzle.shuffle(rng);
        Ok(puzzle)
    }

    // Cell count of a d×d board; every label must fit in a u32.
    fn cell_count(dimension: usize) -> Result<usize, PuzzleError> {
        if dimension < 2 {
            return Err(PuzzleError::InvalidDimension(dimension));
        }

        dimension
            .checked_mul(dimension)
            .filter(|&len| u32::try_from(len).is_ok())
            .ok_or(PuzzleError::InvalidDimension(dimension))
    }

    /// The goal configuration: 1..d²−1 in row-major order, blank last.
    pub fn solved(dimension: usize) -> Result<Self, PuzzleError> {
        let len = Self::cell_count(dimension)?;
        let tiles = (1..len as u32).chain(std::iter::once(0)).collect();

        Ok(Self {
            dimension,
            tiles,
            blank_row: dimension - 1,
            blank_col: dimension - 1,
        })
    }

    pub fn from_tiles(dimension: usize, tiles: Vec<u32>) -> Result<Self, PuzzleError> {
        let len = Self::cell_count(dimension)?;
        if tiles.len() != len {
            return Err(PuzzleError::InvalidTiles(format!(
                "expected {} tiles for a {}x{} board, got {}",
                len,
                dimension,
                dimension,
                tiles.len()
            )));
        }

        let mut seen = vec![false; len];
        for &tile in &tiles {
            let slot = seen.get_mut(tile as usize).ok_or_else(|| {
                PuzzleError::InvalidTiles(format!("label {} is out of range 0..{}", tile, len))
            })?;
            if *slot {
                return Err(PuzzleError::InvalidTiles(format!("label {} appears twice", tile)));
            }
            *slot = true;
        }

        // Every label is in range and unique, so the blank is present.
        let blank = tiles.iter().position(|&t| t == 0).unwrap_or_default();

        Ok(Self {
            dimension,
            tiles,
            blank_row: blank / dimension,
            blank_col: blank % dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn size(&self) -> usize {
        self.dimension * self.dimension - 1
    }

    pub fn blank(&self) -> (usize, usize) {
        (self.blank_row, self.blank_col)
    }

    pub fn tiles(&self) -> &[u32] {
        &self.tiles
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.dimension + col
    }

    fn blank_index(&self) -> usize {
        self.index(self.blank_row, self.blank_col)
    }

    fn place_blank(&mut self, index: usize) {
        self.blank_row = index / self.dimension;
        self.blank_col = index % self.dimension;
    }

    // Cell the blank would land on, or None at the boundary.
    fn target(&self, movement: Move) -> Option<(usize, usize)> {
        let (dr, dc) = movement.as_offset();

        let new_row = self.blank_row as isize + dr;
        let new_col = self.blank_col as isize + dc;
        let bound = self.dimension as isize;

        if new_row >= 0 && new_row < bound && new_col >= 0 && new_col < bound {
            Some((new_row as usize, new_col as usize))
        } else {
            None
        }
    }

    pub fn apply_move(&mut self, movement: Move) -> bool {
        match self.target(movement) {
            Some((row, col)) => {
                let from = self.blank_index();
                let to = self.index(row, col);
                self.tiles.swap(from, to);

                self.blank_row = row;
                self.blank_col = col;
                true
            }
            None => false,
        }
    }

    pub fn valid_moves(&self) -> Vec<Move> {
        Move::ALL
            .into_iter()
            .filter(|&movement| self.target(movement).is_some())
            .collect()
    }

    /// Makes `(size + 1) * 4` random legal moves. Only legal moves are
    /// applied, so the solvability class never changes.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let times = (self.size() + 1) * 4;
        for _ in 0..times {
            if let Some(&movement) = self.valid_moves().choose(rng) {
                self.apply_move(movement);
            }
        }
    }

    pub fn get(&self, index: usize) -> u32 {
        self.tiles[index]
    }

    pub fn get_at(&self, row: usize, col: usize) -> u32 {
        self.get(self.index(row, col))
    }

    /// Puts `value` at `index` by swapping it with the cell that currently
    /// holds it; `0` moves the blank there. Returns false without touching the
    /// board if no cell holds `value`. Callers validate the range.
    pub fn set(&mut self, index: usize, value: u32) -> bool {
        if value == 0 {
            let blank = self.blank_index();
            self.tiles.swap(index, blank);
            self.place_blank(index);
            return true;
        }

        let Some(source) = self.tiles.iter().position(|&t| t == value) else {
            return false;
        };

        self.tiles.swap(index, source);
        if self.tiles[source] == 0 {
            self.place_blank(source);
        }
        true
    }

    pub fn set_at(&mut self, row: usize, col: usize, value: u32) -> bool {
        self.set(self.index(row, col), value)
    }

    pub fn inversion_count(&self) -> u32 {
        self.tiles
            .iter()
            .enumerate()
            .filter(|&(_, &val)| val != 0)
            .map(|(i, &val)| {
                self.tiles[i + 1..]
                    .iter()
                    .filter(|&&next| next != 0 && next < val)
                    .count() as u32
            })
            .sum()
    }

    pub fn is_solvable(&self) -> bool {
        let inversions = self.inversion_count() as usize;

        if self.dimension % 2 == 1 {
            // Odd width: every slide preserves inversion parity
            inversions % 2 == 0
        } else {
            // Even width: blank on an even row needs odd inversions, on an odd row even ones
            (inversions + self.blank_row) % 2 == 1
        }
    }

    pub fn is_solved(&self) -> bool {
        let last = self.tiles.len() - 1;
        self.blank_index() == last
            && self.tiles[..last]
                .iter()
                .enumerate()
                .all(|(i, &val)| val == i as u32 + 1)
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.size().to_string().len();
        for row in self.tiles.chunks(self.dimension) {
            for &val in row {
                if val == 0 {
                    write!(f, "{:>width$} ", "", width = width)?;
                } else {
                    write!(f, "{:>width$} ", val, width = width)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn board(tiles: &[u32]) -> Puzzle {
        let dimension = (tiles.len() as f64).sqrt() as usize;
        Puzzle::from_tiles(dimension, tiles.to_vec()).unwrap()
    }

    #[test]
    fn new_rejects_sizes_that_are_not_square_minus_one() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Puzzle::new(10, &mut rng), Err(PuzzleError::InvalidSize(10)));
        assert_eq!(Puzzle::new(0, &mut rng), Err(PuzzleError::InvalidSize(0)));
    }

    #[test]
    fn new_rejects_sizes_too_large_to_represent() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            Puzzle::new(usize::MAX, &mut rng),
            Err(PuzzleError::InvalidSize(usize::MAX))
        );
        assert_eq!(Puzzle::solved(65536), Err(PuzzleError::InvalidDimension(65536)));
        assert_eq!(
            Puzzle::from_tiles(usize::MAX, Vec::new()),
            Err(PuzzleError::InvalidDimension(usize::MAX))
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn new_rejects_boards_with_labels_past_u32() {
        // 65536² cells would need a label of 2³²
        let size = 65536usize * 65536 - 1;
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Puzzle::new(size, &mut rng), Err(PuzzleError::InvalidSize(size)));
    }

    #[test]
    fn new_builds_the_fifteen_puzzle() {
        let mut rng = StdRng::seed_from_u64(1);

        let puzzle = Puzzle::new(15, &mut rng).unwrap();
        assert_eq!(puzzle.dimension(), 4);
        assert_eq!(puzzle.size(), 15);
    }

    #[test]
    fn same_seed_gives_same_shuffle() {
        let a = Puzzle::new(15, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = Puzzle::new(15, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
        assert!(a.is_solvable());
    }

    #[test]
    fn solved_board_layout() {
        let puzzle = Puzzle::solved(3).unwrap();
        assert_eq!(puzzle.tiles(), &[1, 2, 3, 4, 5, 6, 7, 8, 0]);
        assert_eq!(puzzle.blank(), (2, 2));
        assert!(puzzle.is_solved());
        assert!(Puzzle::solved(1).is_err());
    }

    #[test]
    fn from_tiles_rejects_bad_labellings() {
        assert!(Puzzle::from_tiles(2, vec![1, 2, 3]).is_err());
        assert!(Puzzle::from_tiles(2, vec![1, 1, 3, 0]).is_err());
        assert!(Puzzle::from_tiles(2, vec![1, 2, 4, 0]).is_err());
    }

    #[test]
    fn moves_stop_at_the_boundary() {
        let mut puzzle = Puzzle::solved(3).unwrap();
        assert!(!puzzle.apply_move(Move::Down));
        assert!(!puzzle.apply_move(Move::Right));
        assert_eq!(puzzle, Puzzle::solved(3).unwrap());

        assert!(puzzle.apply_move(Move::Up));
        assert_eq!(puzzle.blank(), (1, 2));
        assert_eq!(puzzle.get_at(2, 2), 6);
        assert_eq!(puzzle.get_at(1, 2), 0);
    }

    #[test]
    fn valid_moves_by_position() {
        let corner = Puzzle::solved(3).unwrap();
        assert_eq!(corner.valid_moves(), vec![Move::Up, Move::Left]);

        let edge = board(&[1, 0, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(edge.valid_moves(), vec![Move::Down, Move::Left, Move::Right]);

        let centre = board(&[1, 2, 3, 4, 0, 5, 6, 7, 8]);
        assert_eq!(centre.valid_moves(), Move::ALL.to_vec());
    }

    #[test]
    fn blank_in_bottom_left_fixture() {
        let puzzle = board(&[1, 2, 3, 4, 5, 6, 0, 7, 8]);
        assert_eq!(puzzle.blank(), (2, 0));
        assert_eq!(puzzle.inversion_count(), 0);
        assert!(puzzle.is_solvable());
        assert!(!puzzle.is_solved());
    }

    #[test]
    fn swapped_last_pair_is_unsolvable() {
        let mut puzzle = Puzzle::solved(3).unwrap();
        assert!(puzzle.set(6, 8));
        assert_eq!(puzzle.tiles(), &[1, 2, 3, 4, 5, 6, 8, 7, 0]);
        assert_eq!(puzzle.inversion_count(), 1);
        assert!(!puzzle.is_solvable());
    }

    #[test]
    fn even_width_parity_depends_on_blank_row() {
        // Blank on row 3 (odd) with zero inversions
        assert!(Puzzle::solved(4).unwrap().is_solvable());

        // One legal slide puts the blank on row 2 (even) and creates three inversions
        let mut puzzle = Puzzle::solved(4).unwrap();
        puzzle.apply_move(Move::Up);
        assert_eq!(puzzle.blank(), (2, 3));
        assert_eq!(puzzle.inversion_count(), 3);
        assert!(puzzle.is_solvable());

        // Same blank row, one tile swap away
        let mut swapped = Puzzle::solved(4).unwrap();
        swapped.set(0, 2);
        assert!(!swapped.is_solvable());
    }

    #[test]
    fn set_blank_swaps_with_current_blank() {
        let mut puzzle = Puzzle::solved(3).unwrap();
        assert!(puzzle.set(0, 0));
        assert_eq!(puzzle.get(0), 0);
        assert_eq!(puzzle.get(8), 1);
        assert_eq!(puzzle.blank(), (0, 0));
    }

    #[test]
    fn set_onto_blank_cell_moves_blank() {
        let mut puzzle = Puzzle::solved(3).unwrap();
        assert!(puzzle.set_at(2, 2, 4));
        assert_eq!(puzzle.get(8), 4);
        assert_eq!(puzzle.get(3), 0);
        assert_eq!(puzzle.blank(), (1, 0));
    }

    #[test]
    fn set_missing_value_leaves_board_alone() {
        let mut puzzle = Puzzle::solved(3).unwrap();
        assert!(!puzzle.set(4, 9));
        assert_eq!(puzzle, Puzzle::solved(3).unwrap());
    }

    #[test]
    fn move_between_neighbours() {
        let start = Puzzle::solved(3).unwrap();
        let mut next = start.clone();
        next.apply_move(Move::Left);
        assert_eq!(Move::between(&start, &next), Some(Move::Left));
        assert_eq!(Move::between(&next, &start), Some(Move::Right));
        assert_eq!(Move::between(&start, &start), None);
    }

    #[test]
    fn display_leaves_blank_empty() {
        let puzzle = Puzzle::solved(2).unwrap();
        assert_eq!(puzzle.to_string(), "1 2 \n3   \n");
    }
}
