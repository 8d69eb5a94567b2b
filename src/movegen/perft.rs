/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::BTreeMap;

use anyhow::{bail, Result};

use super::{MoveCounter, MoveGenerator, NodeContext};
use crate::{Move, Position, UciMove, MAX_NUM_MOVES};

/// Perform a perft at the specified depth, collecting only data about the number of possible positions (nodes).
///
/// This performs bulk counting, meaning that, at depth 1, it returns the number of available moves,
/// rather than making them, recursing again, and returning 1 for each terminal case.
///
/// # Example
/// ```
/// # use prodigy::*;
/// assert_eq!(perft(&Position::default(), 3).unwrap(), 8_902);
/// assert!(perft(&Position::default(), 0).is_err());
/// ```
pub fn perft(position: &Position, depth: usize) -> Result<u64> {
    if depth == 0 {
        bail!("Invalid depth.");
    }

    Ok(perft_bulk(position, depth))
}

/// Perform a splitperft, returning the number of nodes reachable after each move available at the root.
pub fn divide(position: &Position, depth: usize) -> Result<BTreeMap<UciMove, u64>> {
    if depth == 0 {
        bail!("Invalid depth.");
    }

    let color = position.side_to_move();
    let split = children(position)
        .into_iter()
        .map(|(mv, child)| {
            let nodes = if depth == 1 {
                1
            } else {
                perft_bulk(&advanced(position, &mv, child), depth - 1)
            };
            (mv.to_uci(color), nodes)
        })
        .collect();

    Ok(split)
}

fn perft_bulk(position: &Position, depth: usize) -> u64 {
    // Bulk counting; no need to recurse again just to apply a singular move and return 1.
    if depth == 1 {
        let mut counter = MoveCounter::default();
        MoveGenerator::new(position).walk(&mut counter);
        return counter.0;
    }

    // Recursively accumulate the nodes from the remaining depths
    children(position).into_iter().fold(0, |nodes, (mv, child)| {
        nodes + perft_bulk(&advanced(position, &mv, child), depth - 1)
    })
}

#[inline(always)]
fn children(position: &Position) -> Vec<(Move, NodeContext)> {
    let mut moves = Vec::with_capacity(MAX_NUM_MOVES);
    MoveGenerator::new(position).walk(&mut moves);
    moves
}

#[inline(always)]
fn advanced(position: &Position, mv: &Move, child: NodeContext) -> Position {
    let mut next = *position;
    next.advance(mv, child);
    next
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::FEN_KIWIPETE;

    #[test]
    fn test_zero_depth_is_rejected() {
        let position = Position::default();
        assert_eq!(perft(&position, 0).unwrap_err().to_string(), "Invalid depth.");
        assert_eq!(divide(&position, 0).unwrap_err().to_string(), "Invalid depth.");
    }

    #[test]
    fn test_startpos_shallow() {
        let position = Position::default();
        assert_eq!(perft(&position, 1).unwrap(), 20);
        assert_eq!(perft(&position, 2).unwrap(), 400);
    }

    #[test]
    fn test_divide_sums_to_perft() {
        let position = Position::from_fen(FEN_KIWIPETE).unwrap();
        let split = divide(&position, 2).unwrap();
        assert_eq!(split.len(), 48);
        assert_eq!(split.values().sum::<u64>(), perft(&position, 2).unwrap());

        let split = divide(&position, 1).unwrap();
        assert!(split.values().all(|&nodes| nodes == 1));
    }
}
