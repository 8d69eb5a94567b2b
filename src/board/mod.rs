/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Bitboards and operations on them.
mod bitboard;

/// Moves and their coordinate notation.
mod moves;

/// Colors, piece types and castling rights.
mod piece;

/// The board and the full game state built on top of it.
mod position;

/// Squares, files, ranks and compass directions.
mod square;

/// Common FEN strings and board-related constants.
mod utils;

pub use bitboard::*;
pub use moves::*;
pub use piece::*;
pub use position::*;
pub use square::*;
pub use utils::*;
