/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};

use crate::Bitboard;

/// One of the eight compass directions a ray can travel across the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
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
    /// Directions a bishop slides in.
    pub const DIAGONAL: [Self; 4] = [
        Self::NorthEast,
        Self::SouthEast,
        Self::SouthWest,
        Self::NorthWest,
    ];

    /// Directions a rook slides in.
    pub const ORTHOGONAL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// The direction pointing the other way.
    #[inline(always)]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
        }
    }
}

/// A column of the board, `a` through `h`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct File(pub(crate) u8);

impl File {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);
    pub const C: Self = Self(2);
    pub const D: Self = Self(3);
    pub const E: Self = Self(4);
    pub const F: Self = Self(5);
    pub const G: Self = Self(6);
    pub const H: Self = Self(7);

    pub const COUNT: usize = 8;

    /// Iterates from file `a` to file `h`.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Parses a lowercase file character.
    pub fn from_char(file: char) -> Result<Self> {
        match file {
            'a'..='h' => Ok(Self(file as u8 - b'a')),
            _ => bail!("Invalid File char: Must be between [a,h]. Got {file:?}"),
        }
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        (b'a' + self.0) as char
    }

    /// Offsets this file by `delta`, returning `None` if the result leaves the board.
    #[inline(always)]
    pub const fn offset(self, delta: i8) -> Option<Self> {
        let file = self.0 as i8 + delta;
        if file < 0 || file >= Self::COUNT as i8 {
            None
        } else {
            Some(Self(file as u8))
        }
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A row of the board, `1` through `8`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Rank(pub(crate) u8);

impl Rank {
    pub const ONE: Self = Self(0);
    pub const TWO: Self = Self(1);
    pub const THREE: Self = Self(2);
    pub const FOUR: Self = Self(3);
    pub const FIVE: Self = Self(4);
    pub const SIX: Self = Self(5);
    pub const SEVEN: Self = Self(6);
    pub const EIGHT: Self = Self(7);

    pub const COUNT: usize = 8;

    /// Iterates from rank `1` to rank `8`.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Parses a rank digit.
    pub fn from_char(rank: char) -> Result<Self> {
        match rank {
            '1'..='8' => Ok(Self(rank as u8 - b'1')),
            _ => bail!("Invalid Rank char: Must be between [1,8]. Got {rank:?}"),
        }
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        (b'1' + self.0) as char
    }

    /// Offsets this rank by `delta`, returning `None` if the result leaves the board.
    #[inline(always)]
    pub const fn offset(self, delta: i8) -> Option<Self> {
        let rank = self.0 as i8 + delta;
        if rank < 0 || rank >= Self::COUNT as i8 {
            None
        } else {
            Some(Self(rank as u8))
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Represents a single square on an `8x8` chess board.
///
/// Squares are indexed as `file + rank * 8`:
/// ```text
/// 8| 56 57 58 59 60 61 62 63
/// 7| 48 49 50 51 52 53 54 55
/// 6| 40 41 42 43 44 45 46 47
/// 5| 32 33 34 35 36 37 38 39
/// 4| 24 25 26 27 28 29 30 31
/// 3| 16 17 18 19 20 21 22 23
/// 2|  8  9 10 11 12 13 14 15
/// 1|  0  1  2  3  4  5  6  7
///  +------------------------
///    a  b  c  d  e  f  g  h
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Square(pub(crate) u8);

macro_rules! square_constants {
    ($file:ident: $($name:ident = $rank:ident),* $(,)?) => {
        $(pub const $name: Self = Self::new(File::$file, Rank::$rank);)*
    };
}

impl Square {
    square_constants!(A: A1 = ONE, A2 = TWO, A3 = THREE, A4 = FOUR, A5 = FIVE, A6 = SIX, A7 = SEVEN, A8 = EIGHT);
    square_constants!(B: B1 = ONE, B2 = TWO, B3 = THREE, B4 = FOUR, B5 = FIVE, B6 = SIX, B7 = SEVEN, B8 = EIGHT);
    square_constants!(C: C1 = ONE, C2 = TWO, C3 = THREE, C4 = FOUR, C5 = FIVE, C6 = SIX, C7 = SEVEN, C8 = EIGHT);
    square_constants!(D: D1 = ONE, D2 = TWO, D3 = THREE, D4 = FOUR, D5 = FIVE, D6 = SIX, D7 = SEVEN, D8 = EIGHT);
    square_constants!(E: E1 = ONE, E2 = TWO, E3 = THREE, E4 = FOUR, E5 = FIVE, E6 = SIX, E7 = SEVEN, E8 = EIGHT);
    square_constants!(F: F1 = ONE, F2 = TWO, F3 = THREE, F4 = FOUR, F5 = FIVE, F6 = SIX, F7 = SEVEN, F8 = EIGHT);
    square_constants!(G: G1 = ONE, G2 = TWO, G3 = THREE, G4 = FOUR, G5 = FIVE, G6 = SIX, G7 = SEVEN, G8 = EIGHT);
    square_constants!(H: H1 = ONE, H2 = TWO, H3 = THREE, H4 = FOUR, H5 = FIVE, H6 = SIX, H7 = SEVEN, H8 = EIGHT);

    pub const COUNT: usize = 64;

    /// Returns an iterator over all squares, `a1` first.
    ///
    /// # Example
    /// ```
    /// # use prodigy::Square;
    /// let mut iter = Square::iter();
    /// assert_eq!(iter.next(), Some(Square::A1));
    /// assert_eq!(iter.last(), Some(Square::H8));
    /// ```
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Creates a new [`Square`] from the provided [`File`] and [`Rank`].
    #[inline(always)]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self(rank.0 << 3 | file.0)
    }

    /// Creates a [`Square`] from an index in `0..64`.
    ///
    /// Indices out of range are masked into range.
    #[inline(always)]
    pub const fn from_index_unchecked(index: usize) -> Self {
        Self((index & 63) as u8)
    }

    #[inline(always)]
    pub const fn file(&self) -> File {
        File(self.0 & 0b111)
    }

    #[inline(always)]
    pub const fn rank(&self) -> Rank {
        Rank(self.0 >> 3)
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Alias for [`Bitboard::from_square`].
    #[inline(always)]
    pub const fn bitboard(&self) -> Bitboard {
        Bitboard::from_square(*self)
    }

    /// Attempts to offset this [`Square`] by the file and rank deltas.
    ///
    /// # Example
    /// ```
    /// # use prodigy::Square;
    /// assert_eq!(Square::C4.offset(1, 1), Some(Square::D5));
    /// assert_eq!(Square::A1.offset(-1, 0), None);
    /// ```
    #[inline(always)]
    pub const fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        let Some(file) = self.file().offset(file_delta) else {
            return None;
        };
        let Some(rank) = self.rank().offset(rank_delta) else {
            return None;
        };
        Some(Self::new(file, rank))
    }

    /// Parses a square in coordinate notation, such as `e4`.
    ///
    /// # Example
    /// ```
    /// # use prodigy::Square;
    /// assert_eq!(Square::from_uci("c4").unwrap(), Square::C4);
    /// assert!(Square::from_uci("z0").is_err());
    /// ```
    pub fn from_uci(square: &str) -> Result<Self> {
        let mut chars = square.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            bail!("Invalid Square string: String must contain exactly 2 characters. Got {square:?}")
        };
        Ok(Self::new(File::from_char(file)?, Rank::from_char(rank)?))
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squares() {
        assert_eq!(Square::new(File(0), Rank(0)).to_string(), "a1");
        assert_eq!(Square::new(File(7), Rank(0)).to_string(), "h1");
        assert_eq!(Square::new(File(0), Rank(7)).to_string(), "a8");
        assert_eq!(Square::new(File(7), Rank(7)).to_string(), "h8");
        assert_eq!(Square::new(File(3), Rank(3)).to_string(), "d4");
        assert_eq!(Square::H8.index(), 63);
        assert_eq!(Square::E4.file(), File::E);
        assert_eq!(Square::E4.rank(), Rank::FOUR);
    }

    #[test]
    fn test_parsing() {
        assert_eq!(Square::from_uci("a1").unwrap(), Square::A1);
        assert_eq!(Square::from_uci("h8").unwrap(), Square::H8);
        assert_eq!("d4".parse::<Square>().unwrap(), Square::D4);

        assert!(Square::from_uci("a").is_err());
        assert!(Square::from_uci("1").is_err());
        assert!(Square::from_uci("").is_err());
        assert!(Square::from_uci("a9").is_err());
        assert!(Square::from_uci("i1").is_err());
        assert!(Square::from_uci("a1a").is_err());
    }

    #[test]
    fn test_offsets() {
        assert_eq!(Square::H8.offset(-7, -7), Some(Square::A1));
        assert_eq!(Square::H4.offset(1, 0), None);
        assert_eq!(Square::D1.offset(0, -1), None);
        assert_eq!(Square::B1.offset(1, 2), Some(Square::C3));
    }
}
