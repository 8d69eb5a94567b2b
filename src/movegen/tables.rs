/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Bitboard, Color, Square};

/// Deltas for the movement of the Queen (and King). Opposite directions are adjacent.
const QUEEN_DELTAS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
];

/// Deltas for the movement of the Knight.
const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (1, -2),
    (2, 1),
    (2, -1),
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
];

/// Squares strictly between two squares on a shared line, indexed `[from][to]`.
///
/// Empty if the squares don't share a rank, file or diagonal.
const RAY_BETWEEN: [[Bitboard; Square::COUNT]; Square::COUNT] = {
    let mut rays = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let from = Square::from_index_unchecked(i);
        let mut j = 0;
        while j < QUEEN_DELTAS.len() {
            let (df, dr) = QUEEN_DELTAS[j];
            let mut between = Bitboard::EMPTY_BOARD;
            let mut to = from;

            while let Some(shifted) = to.offset(df, dr) {
                rays[from.index()][shifted.index()] = between;
                between = between.or(shifted.bitboard());
                to = shifted;
            }

            j += 1;
        }
        i += 1;
    }

    rays
};

/// The entire line (edge to edge) through two squares, indexed `[from][to]`.
///
/// Empty if the squares don't share a rank, file or diagonal.
const RAY_CONTAINING: [[Bitboard; Square::COUNT]; Square::COUNT] = {
    let mut rays = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let from = Square::from_index_unchecked(i);
        let mut j = 0;
        // Deltas come in opposite pairs, so each pair describes one line through `from`
        while j < QUEEN_DELTAS.len() {
            let forward = ray_of(from, QUEEN_DELTAS[j]);
            let backward = ray_of(from, QUEEN_DELTAS[j + 1]);
            let line = forward.or(backward).or(from.bitboard());

            let mut squares = line.and(from.bitboard().not()).inner();
            while squares != 0 {
                let to = squares.trailing_zeros() as usize;
                rays[from.index()][to] = line;
                squares &= squares - 1;
            }

            j += 2;
        }
        i += 1;
    }

    rays
};

const KNIGHT_ATTACKS: [Bitboard; Square::COUNT] = generate_leaper_mobility(&KNIGHT_DELTAS);
const KING_ATTACKS: [Bitboard; Square::COUNT] = generate_leaper_mobility(&QUEEN_DELTAS);
const PAWN_ATTACKS: [[Bitboard; Square::COUNT]; Color::COUNT] = [
    generate_pawn_attacks(Color::White),
    generate_pawn_attacks(Color::Black),
];

/// Squares between `from` and `to`, exclusive of both.
///
/// # Example
/// ```
/// # use prodigy::*;
/// assert_eq!(ray_between(Square::A1, Square::A4), Bitboard::from_square(Square::A2) | Square::A3);
/// assert_eq!(ray_between(Square::A1, Square::B3), Bitboard::EMPTY_BOARD);
/// ```
#[inline(always)]
pub const fn ray_between(from: Square, to: Square) -> Bitboard {
    RAY_BETWEEN[from.index()][to.index()]
}

/// The full line through `from` and `to`.
///
/// # Example
/// ```
/// # use prodigy::*;
/// assert_eq!(ray_containing(Square::A3, Square::A5), Bitboard::FILE_A);
/// ```
#[inline(always)]
pub const fn ray_containing(from: Square, to: Square) -> Bitboard {
    RAY_CONTAINING[from.index()][to.index()]
}

#[inline(always)]
pub const fn knight_attacks(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square.index()]
}

#[inline(always)]
pub const fn king_attacks(square: Square) -> Bitboard {
    KING_ATTACKS[square.index()]
}

/// Squares a pawn of `color` on `square` attacks.
#[inline(always)]
pub const fn pawn_attacks(square: Square, color: Color) -> Bitboard {
    PAWN_ATTACKS[color.index()][square.index()]
}

/// Every square reachable from `square` by repeatedly stepping `delta`, on an empty board.
const fn ray_of(square: Square, (df, dr): (i8, i8)) -> Bitboard {
    let mut ray = Bitboard::EMPTY_BOARD;
    let mut current = square;
    while let Some(shifted) = current.offset(df, dr) {
        ray = ray.or(shifted.bitboard());
        current = shifted;
    }
    ray
}

const fn generate_pawn_attacks(color: Color) -> [Bitboard; Square::COUNT] {
    let mut boards = [Bitboard::EMPTY_BOARD; Square::COUNT];
    let mut i = 0;
    while i < Square::COUNT {
        let forward = Bitboard::from_square(Square::from_index_unchecked(i)).forward(color);
        boards[i] = forward.east().or(forward.west());
        i += 1;
    }
    boards
}

/// Generates the moves from every square for a piece that jumps by any of `deltas`.
const fn generate_leaper_mobility(deltas: &[(i8, i8)]) -> [Bitboard; Square::COUNT] {
    let mut mobility = [Bitboard::EMPTY_BOARD; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let square = Square::from_index_unchecked(i);
        let mut j = 0;
        while j < deltas.len() {
            let (df, dr) = deltas[j];
            if let Some(shifted) = square.offset(df, dr) {
                mobility[i] = mobility[i].or(shifted.bitboard());
            }
            j += 1;
        }
        i += 1;
    }

    mobility
}
