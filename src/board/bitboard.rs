/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Not};

use super::{Color, Direction, File, Rank, Square};

/// A [`Bitboard`] is a set of squares, stored as the bits of a `u64`.
///
/// Bit `i` is set if and only if [`Square`] `i` is a member of the set. The encoding is
/// [Little-Endian Rank-File Mapping](https://www.chessprogramming.org/Square_Mapping_Considerations#Little-Endian_Rank-File_Mapping),
/// so `a1` is bit 0, `h1` is bit 7 and `h8` is bit 63.
///
/// All board geometry in this crate is expressed as bitboard arithmetic. Directional shifts never
/// wrap around the board: bits shifted past an edge are cleared.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Bitboard(pub(crate) u64);

impl Bitboard {
    pub const FILE_A: Self = Self(0x0101010101010101);
    pub const FILE_H: Self = Self(0x8080808080808080);
    pub const NOT_FILE_A: Self = Self(0xfefefefefefefefe);
    pub const NOT_FILE_H: Self = Self(0x7f7f7f7f7f7f7f7f);
    pub const RANK_1: Self = Self(0x00000000000000FF);
    pub const RANK_2: Self = Self(0x000000000000FF00);
    pub const RANK_4: Self = Self(0x00000000FF000000);
    pub const RANK_5: Self = Self(0x000000FF00000000);
    pub const RANK_7: Self = Self(0x00FF000000000000);
    pub const RANK_8: Self = Self(0xFF00000000000000);
    pub const EMPTY_BOARD: Self = Self(0);
    pub const FULL_BOARD: Self = Self(u64::MAX);
    pub const EDGES: Self = Self(0xFF818181818181FF);

    /// Constructs a new [`Bitboard`] from the provided bit pattern.
    ///
    /// # Example
    /// ```
    /// # use prodigy::Bitboard;
    /// let board = Bitboard::new(255);
    /// assert_eq!(board, Bitboard::RANK_1);
    /// ```
    #[inline(always)]
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Constructs a [`Bitboard`] containing only `square`.
    #[inline(always)]
    pub const fn from_square(square: Square) -> Self {
        Self(1 << square.index())
    }

    /// Constructs a [`Bitboard`] of every square on `file`.
    #[inline(always)]
    pub const fn from_file(file: File) -> Self {
        Self(Self::FILE_A.0 << file.0)
    }

    /// Constructs a [`Bitboard`] of every square on `rank`.
    #[inline(always)]
    pub const fn from_rank(rank: Rank) -> Self {
        Self(Self::RANK_1.0 << (rank.0 * 8))
    }

    /// The rank a pawn of `color` promotes on.
    #[inline(always)]
    pub const fn promotion_rank(color: Color) -> Self {
        [Self::RANK_8, Self::RANK_1][color.index()]
    }

    /// The rank a pawn of `color` lands on after a double push.
    #[inline(always)]
    pub const fn double_push_rank(color: Color) -> Self {
        [Self::RANK_4, Self::RANK_5][color.index()]
    }

    /// Returns the inner `u64` of this [`Bitboard`].
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Checks if no bits are set.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Checks if at least one bit is set.
    #[inline(always)]
    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Returns `true` if `self` and `other` share at least one square.
    ///
    /// # Example
    /// ```
    /// # use prodigy::{Bitboard, Square};
    /// assert!(Bitboard::FILE_A.intersects(Square::A3));
    /// assert!(!Bitboard::RANK_1.intersects(Bitboard::RANK_8));
    /// ```
    #[inline(always)]
    pub fn intersects(&self, other: impl Into<Self>) -> bool {
        (*self & other.into()).is_nonempty()
    }

    /// Returns `true` if `self` contains every square of `other`.
    #[inline(always)]
    pub fn contains(&self, other: impl Into<Self>) -> bool {
        let other = other.into();
        (*self & other) == other
    }

    /// Toggles the bit(s) specified by `other`.
    ///
    /// Toggling is self-inverse: toggling the same squares twice leaves `self` unchanged.
    #[inline(always)]
    pub fn toggle(&mut self, other: impl Into<Self>) {
        *self ^= other.into()
    }

    /// Number of set bits.
    #[inline(always)]
    pub const fn population(&self) -> u8 {
        self.0.count_ones() as u8
    }

    /// Returns `true` if more than one bit is set.
    #[inline(always)]
    pub const fn has_many(&self) -> bool {
        self.0 & self.0.wrapping_sub(1) != 0
    }

    /// Returns the lowest set bit as a [`Square`], if any.
    #[inline(always)]
    pub fn lsb(&self) -> Option<Square> {
        self.is_nonempty()
            .then(|| Square(self.0.trailing_zeros() as u8))
    }

    /// Returns the lowest set bit as a [`Square`].
    ///
    /// The result is meaningless if `self` is empty.
    #[inline(always)]
    pub const fn lsb_unchecked(&self) -> Square {
        Square(self.0.trailing_zeros() as u8)
    }

    /// Removes and returns the lowest set bit.
    #[inline(always)]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        let lsb = self.lsb();
        self.0 &= self.0.wrapping_sub(1);
        lsb
    }

    /// Iterates over the set bits as [`Square`]s, lowest first.
    #[inline(always)]
    pub const fn iter(&self) -> BitboardIter {
        BitboardIter { bitboard: *self }
    }

    /// Iterates over every subset of this [`Bitboard`], starting with the empty set and ending with
    /// `self`.
    ///
    /// # Example
    /// ```
    /// # use prodigy::{Bitboard, Square};
    /// let set = Bitboard::from_square(Square::B2) | Square::G7;
    /// assert_eq!(set.subsets().count(), 4);
    /// assert_eq!(set.subsets().last(), Some(set));
    /// ```
    #[inline(always)]
    pub const fn subsets(&self) -> BitboardSubsetIter {
        BitboardSubsetIter {
            bitboard: *self,
            subset: Self::EMPTY_BOARD,
            remaining: 1usize << self.population(),
        }
    }

    #[inline(always)]
    pub const fn north(self) -> Self {
        Self(self.0 << 8)
    }

    #[inline(always)]
    pub const fn south(self) -> Self {
        Self(self.0 >> 8)
    }

    #[inline(always)]
    pub const fn east(self) -> Self {
        Self((self.0 << 1) & Self::NOT_FILE_A.0)
    }

    #[inline(always)]
    pub const fn west(self) -> Self {
        Self((self.0 >> 1) & Self::NOT_FILE_H.0)
    }

    #[inline(always)]
    pub const fn northeast(self) -> Self {
        Self((self.0 << 9) & Self::NOT_FILE_A.0)
    }

    #[inline(always)]
    pub const fn southeast(self) -> Self {
        Self((self.0 >> 7) & Self::NOT_FILE_A.0)
    }

    #[inline(always)]
    pub const fn northwest(self) -> Self {
        Self((self.0 << 7) & Self::NOT_FILE_H.0)
    }

    #[inline(always)]
    pub const fn southwest(self) -> Self {
        Self((self.0 >> 9) & Self::NOT_FILE_H.0)
    }

    /// Shifts every square one step in `direction`, dropping squares that leave the board.
    ///
    /// # Example
    /// ```
    /// # use prodigy::{Bitboard, Direction};
    /// assert_eq!(Bitboard::RANK_1.shift(Direction::North), Bitboard::RANK_2);
    /// assert_eq!(Bitboard::FILE_H.shift(Direction::East), Bitboard::EMPTY_BOARD);
    /// ```
    #[inline(always)]
    pub const fn shift(self, direction: Direction) -> Self {
        match direction {
            Direction::North => self.north(),
            Direction::NorthEast => self.northeast(),
            Direction::East => self.east(),
            Direction::SouthEast => self.southeast(),
            Direction::South => self.south(),
            Direction::SouthWest => self.southwest(),
            Direction::West => self.west(),
            Direction::NorthWest => self.northwest(),
        }
    }

    /// Shifts one rank towards the opponent of `color`.
    #[inline(always)]
    pub const fn forward(self, color: Color) -> Self {
        match color {
            Color::White => self.north(),
            Color::Black => self.south(),
        }
    }

    /// Shifts one rank back towards `color`'s own side.
    #[inline(always)]
    pub const fn backward(self, color: Color) -> Self {
        match color {
            Color::White => self.south(),
            Color::Black => self.north(),
        }
    }

    /// Casts a ray from every square of `self` in `direction`, stopping at (and including) the
    /// first square in `blockers` or at the edge of the board.
    ///
    /// # Example
    /// ```
    /// # use prodigy::{Bitboard, Direction, Square};
    /// let ray = Bitboard::from_square(Square::A1).ray(Direction::North, Square::A4.into());
    /// assert_eq!(ray, Bitboard::from_square(Square::A2) | Square::A3 | Square::A4);
    /// ```
    pub const fn ray(self, direction: Direction, blockers: Self) -> Self {
        let mut ray = Self::EMPTY_BOARD;
        let mut current = self.shift(direction);
        while current.is_nonempty() {
            ray.0 |= current.0;
            current = Self(current.0 & !blockers.0).shift(direction);
        }
        ray
    }

    /// `const` analog of [`std::ops::BitAnd::bitand`].
    #[inline(always)]
    pub const fn and(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// `const` analog of [`std::ops::BitOr::bitor`].
    #[inline(always)]
    pub const fn or(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// `const` analog of [`Not::not`].
    #[inline(always)]
    pub const fn not(self) -> Self {
        Self(!self.0)
    }
}

macro_rules! impl_bitwise_op {
    ($op:tt, $op_assign:tt, $func:ident, $func_assign:ident) => {
        impl<T> std::ops::$op<T> for Bitboard
        where
            Self: From<T>,
        {
            type Output = Self;
            #[inline(always)]
            fn $func(self, rhs: T) -> Self::Output {
                Self(self.0.$func(Self::from(rhs).0))
            }
        }

        impl<T> std::ops::$op_assign<T> for Bitboard
        where
            Self: From<T>,
        {
            #[inline(always)]
            fn $func_assign(&mut self, rhs: T) {
                self.0.$func_assign(Self::from(rhs).0);
            }
        }
    };
}

impl_bitwise_op!(BitAnd, BitAndAssign, bitand, bitand_assign);
impl_bitwise_op!(BitOr, BitOrAssign, bitor, bitor_assign);
impl_bitwise_op!(BitXor, BitXorAssign, bitxor, bitxor_assign);

impl Not for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl From<Square> for Bitboard {
    #[inline(always)]
    fn from(value: Square) -> Self {
        Self::from_square(value)
    }
}

impl From<u64> for Bitboard {
    #[inline(always)]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), |bb, sq| bb | sq)
    }
}

impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            for file in File::iter() {
                let occupant = if self.intersects(Square::new(file, rank)) {
                    'X'
                } else {
                    '.'
                };
                write!(f, "{occupant} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitboard(0x{:0>16X})", self.0)
    }
}

/// An iterator over all set bits in a [`Bitboard`].
///
/// See [`Bitboard::iter`].
pub struct BitboardIter {
    bitboard: Bitboard,
}

impl Iterator for BitboardIter {
    type Item = Square;
    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.bitboard.pop_lsb()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.bitboard.population() as usize;
        (size, Some(size))
    }
}

impl ExactSizeIterator for BitboardIter {}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over all subsets of a [`Bitboard`], used to enumerate slider occupancies.
///
/// See [`Bitboard::subsets`].
pub struct BitboardSubsetIter {
    bitboard: Bitboard,
    subset: Bitboard,
    remaining: usize,
}

impl Iterator for BitboardSubsetIter {
    type Item = Bitboard;
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let subset = self.subset;
        // Carry-Rippler: https://www.chessprogramming.org/Traversing_Subsets_of_a_Set
        self.subset.0 = self.subset.0.wrapping_sub(self.bitboard.0) & self.bitboard.0;
        self.remaining -= 1;
        Some(subset)
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for BitboardSubsetIter {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bitboard_to_string() {
        let board = Bitboard::RANK_2 | Bitboard::from_file(File::C);
        let expected = ". . X . . . . . \n\
                        . . X . . . . . \n\
                        . . X . . . . . \n\
                        . . X . . . . . \n\
                        . . X . . . . . \n\
                        . . X . . . . . \n\
                        X X X X X X X X \n\
                        . . X . . . . . \n";
        assert_eq!(board.to_string(), expected);
    }

    #[test]
    fn test_shifts_do_not_wrap() {
        assert_eq!(Bitboard::FILE_A.west(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::FILE_H.east(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::RANK_8.north(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::RANK_1.south(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::FILE_H.northeast(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::FILE_A.southwest(), Bitboard::EMPTY_BOARD);
        assert_eq!(
            Bitboard::from_square(Square::D4).shift(Direction::SouthEast),
            Bitboard::from_square(Square::E3)
        );
    }

    #[test]
    fn test_ray_stops_at_blocker() {
        let blockers = Bitboard::from_square(Square::D6) | Square::F4;
        let origin = Bitboard::from_square(Square::D4);
        let north = origin.ray(Direction::North, blockers);
        assert_eq!(north, Bitboard::from_square(Square::D5) | Square::D6);
        let east = origin.ray(Direction::East, blockers);
        assert_eq!(east, Bitboard::from_square(Square::E4) | Square::F4);
        let west = origin.ray(Direction::West, blockers);
        assert_eq!(west.population(), 3);
    }

    #[test]
    fn test_subsets_enumerates_everything_once() {
        let set = Bitboard::from_square(Square::A1) | Square::C3 | Square::H8;
        let subsets: Vec<_> = set.subsets().collect();
        assert_eq!(subsets.len(), 8);
        assert_eq!(subsets[0], Bitboard::EMPTY_BOARD);
        for (i, a) in subsets.iter().enumerate() {
            assert!(set.contains(*a));
            for b in &subsets[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_pop_lsb() {
        let mut board = Bitboard::from_square(Square::B1) | Square::H8;
        assert!(board.has_many());
        assert_eq!(board.pop_lsb(), Some(Square::B1));
        assert!(!board.has_many());
        assert_eq!(board.pop_lsb(), Some(Square::H8));
        assert_eq!(board.pop_lsb(), None);
    }
}
