/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Castling and en passant bookkeeping carried alongside each generated move.
mod context;

/// Legal move generation.
mod generator;

/// Magic bitboard lookups for sliding pieces.
mod magic;

/// Move generation correctness testing.
mod perft;

/// Precomputed attack and ray tables.
mod tables;

pub use context::*;
pub use generator::*;
pub use magic::*;
pub use perft::*;
pub use tables::*;
