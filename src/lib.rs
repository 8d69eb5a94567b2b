/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Squares, bitboards, pieces, moves and positions.
mod board;

/// Command-line interface.
mod cli;

/// Drives timed searches and reports their results.
mod engine;

/// Parallel Monte Carlo Tree Search.
mod mcts;

/// Legal move generation and perft.
mod movegen;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use mcts::*;
pub use movegen::*;
