//! Board geometry: square arithmetic, the eight ray directions, and lazy ray walks.
//!
//! Nothing in here knows about move legality. A ray walk only stops at the edge
//! of the board; callers decide what an occupied square means for them.

use std::iter::FusedIterator;

use cozy_chess::{File, Rank, Square};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("square out of range: file {file}, rank {rank}")]
    OutOfRange { file: u8, rank: u8 },
    #[error("invalid square name: {0}")]
    InvalidSquare(String),
}

/// One of the eight unit steps a sliding piece can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// `(file, rank)` step.
    pub const fn delta(self) -> (i8, i8) {
        match self {
            Direction::North => (0, 1),
            Direction::NorthEast => (1, 1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, -1),
            Direction::South => (0, -1),
            Direction::SouthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, 1),
        }
    }

    pub const fn is_diagonal(self) -> bool {
        let (df, dr) = self.delta();
        df != 0 && dr != 0
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }

    fn from_delta(df: i8, dr: i8) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|dir| dir.delta() == (df.signum(), dr.signum()))
    }
}

/// Build a square from zero-based file and rank indices.
pub fn square_of(file: u8, rank: u8) -> Result<Square, GeometryError> {
    let out_of_range = || GeometryError::OutOfRange { file, rank };
    let f = File::try_index(file as usize).ok_or_else(out_of_range)?;
    let r = Rank::try_index(rank as usize).ok_or_else(out_of_range)?;
    Ok(Square::new(f, r))
}

pub fn file_of(sq: Square) -> u8 {
    sq.file() as u8
}

pub fn rank_of(sq: Square) -> u8 {
    sq.rank() as u8
}

/// Canonical lowercase name, e.g. `"e4"`.
pub fn square_name(sq: Square) -> String {
    let mut name = String::with_capacity(2);
    name.push((b'a' + file_of(sq)) as char);
    name.push((b'1' + rank_of(sq)) as char);
    name
}

/// Parse a square name such as `"g8"`.
pub fn parse_square(s: &str) -> Result<Square, GeometryError> {
    let invalid = || GeometryError::InvalidSquare(s.to_string());
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return Err(invalid());
    }
    let file = bytes[0].checked_sub(b'a').ok_or_else(invalid)?;
    let rank = bytes[1].checked_sub(b'1').ok_or_else(invalid)?;
    square_of(file, rank).map_err(|_| invalid())
}

/// The unit direction leading from `from` to `to`, if both share a rook or bishop line.
pub fn direction(from: Square, to: Square) -> Option<Direction> {
    let df = file_of(to) as i8 - file_of(from) as i8;
    let dr = rank_of(to) as i8 - rank_of(from) as i8;

    if df == 0 && dr == 0 {
        return None;
    }
    if df == 0 || dr == 0 || df.abs() == dr.abs() {
        return Direction::from_delta(df, dr);
    }
    None
}

/// One step from `sq`, or `None` when that would leave the board.
pub fn step(sq: Square, dir: Direction) -> Option<Square> {
    let (df, dr) = dir.delta();
    let file = file_of(sq) as i8 + df;
    let rank = rank_of(sq) as i8 + dr;
    if !(0..8).contains(&file) || !(0..8).contains(&rank) {
        return None;
    }
    square_of(file as u8, rank as u8).ok()
}

/// Squares visited when stepping from `start` (exclusive) toward the board edge.
#[derive(Debug, Clone)]
pub struct Ray {
    next: Option<Square>,
    dir: Direction,
}

impl Ray {
    pub fn direction(&self) -> Direction {
        self.dir
    }
}

impl Iterator for Ray {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        let current = self.next?;
        self.next = step(current, self.dir);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Never more than seven squares on an 8x8 board.
        (0, Some(7))
    }
}

impl FusedIterator for Ray {}

pub fn walk(start: Square, dir: Direction) -> Ray {
    Ray {
        next: step(start, dir),
        dir,
    }
}

/// Squares strictly between two aligned squares, in order from `from`.
/// Empty when the squares are adjacent or not aligned.
pub fn between(from: Square, to: Square) -> impl Iterator<Item = Square> {
    let ray = direction(from, to).map(|dir| walk(from, dir));
    ray.into_iter().flatten().take_while(move |&sq| sq != to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        parse_square(name).unwrap()
    }

    #[test]
    fn test_square_of_and_back() {
        let e4 = square_of(4, 3).unwrap();
        assert_eq!(e4, Square::E4);
        assert_eq!(file_of(e4), 4);
        assert_eq!(rank_of(e4), 3);
        assert_eq!(square_name(e4), "e4");
    }

    #[test]
    fn test_square_of_out_of_range() {
        assert_eq!(
            square_of(8, 0),
            Err(GeometryError::OutOfRange { file: 8, rank: 0 })
        );
        assert!(square_of(0, 9).is_err());
    }

    #[test]
    fn test_parse_square_rejects_garbage() {
        assert!(parse_square("i1").is_err());
        assert!(parse_square("a9").is_err());
        assert!(parse_square("a").is_err());
        assert!(parse_square("A1").is_err());
    }

    #[test]
    fn test_direction_orthogonal_and_diagonal() {
        assert_eq!(direction(sq("e1"), sq("e8")), Some(Direction::North));
        assert_eq!(direction(sq("h1"), sq("a1")), Some(Direction::West));
        assert_eq!(direction(sq("a1"), sq("h8")), Some(Direction::NorthEast));
        assert_eq!(direction(sq("e3"), sq("g1")), Some(Direction::SouthEast));
    }

    #[test]
    fn test_direction_not_aligned() {
        assert_eq!(direction(sq("a1"), sq("b3")), None);
        assert_eq!(direction(sq("d4"), sq("d4")), None);
    }

    #[test]
    fn test_walk_stops_at_edge_and_excludes_start() {
        let squares: Vec<_> = walk(sq("a1"), Direction::NorthEast).collect();
        assert_eq!(squares.len(), 7);
        assert_eq!(squares.first(), Some(&sq("b2")));
        assert_eq!(squares.last(), Some(&sq("h8")));

        assert_eq!(walk(sq("h1"), Direction::East).count(), 0);
    }

    #[test]
    fn test_walk_is_restartable() {
        let ray = walk(sq("d4"), Direction::South);
        let first: Vec<_> = ray.clone().collect();
        let second: Vec<_> = ray.collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![sq("d3"), sq("d2"), sq("d1")]);
    }

    #[test]
    fn test_between() {
        let squares: Vec<_> = between(sq("g1"), sq("g8")).collect();
        assert_eq!(squares.len(), 6);
        assert_eq!(squares[0], sq("g2"));
        assert_eq!(between(sq("a1"), sq("b3")).count(), 0);
        assert_eq!(between(sq("a1"), sq("b2")).count(), 0);
    }

    #[test]
    fn test_opposite_is_involution() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
    }
}
