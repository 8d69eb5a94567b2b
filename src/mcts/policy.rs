/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::Edge;
use crate::{Board, Color, Move, PieceType};

/// Chooses which edge a simulation descends through.
pub trait TreePolicy {
    /// Returns the index of the chosen edge in `edges`, which must not be empty.
    ///
    /// `parent_visits` is the number of simulations through the node owning `edges`, and is at
    /// least 1.
    fn select(&self, parent_visits: u32, edges: &[Edge]) -> usize;
}

/// Upper Confidence bounds applied to Trees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UctPolicy {
    exploration: f32,
}

impl UctPolicy {
    pub const fn new(exploration: f32) -> Self {
        Self { exploration }
    }

    #[inline(always)]
    pub const fn exploration(&self) -> f32 {
        self.exploration
    }

    /// Mean reward plus an exploration bonus that shrinks as the edge is visited more often.
    ///
    /// `ln_parent_visits` must not be negative. With zero visits the result is NaN.
    #[inline(always)]
    pub fn upper_confidence_bound(&self, ln_parent_visits: f32, visits: u32, reward: f32) -> f32 {
        let visits = visits as f32;
        reward / visits + self.exploration * (ln_parent_visits / visits).sqrt()
    }
}

impl Default for UctPolicy {
    fn default() -> Self {
        Self::new(std::f32::consts::SQRT_2)
    }
}

impl TreePolicy for UctPolicy {
    fn select(&self, parent_visits: u32, edges: &[Edge]) -> usize {
        debug_assert!(parent_visits != 0);
        let ln_parent_visits = (parent_visits as f32).ln();

        let mut choice = 0;
        let mut best = f32::NEG_INFINITY;
        for (i, edge) in edges.iter().enumerate() {
            let visits = edge.simulation_count();
            // Every edge gets one visit before any is revisited
            if visits == 0 {
                return i;
            }

            let ucb = self.upper_confidence_bound(ln_parent_visits, visits, edge.cumulative_reward());
            if best < ucb {
                best = ucb;
                choice = i;
            }
        }

        choice
    }
}

/// Produces the reward of a simulation once it leaves the explored tree.
///
/// Rewards are zero-sum: evaluating the same state for the opposite color yields the negation.
pub trait RolloutPolicy {
    /// Seeds the policy with the root of a new search.
    fn on_search_start(&mut self, board: &Board);

    /// Resets any incremental state back to the root.
    fn on_simulation_start(&mut self);

    /// Follows `mv`, played by `color`, as a simulation descends.
    fn on_move(&mut self, color: Color, mv: &Move);

    /// Reward of the current state, from the perspective of `color`.
    fn evaluate(&self, color: Color) -> f32;

    /// Reward of playing out the current state, from the perspective of `color`.
    fn simulate(&mut self, color: Color) -> f32 {
        self.evaluate(color)
    }
}

/// Scores a state by the material balance, squashed into `(-1, 1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvaluationPolicy {
    /// White's material minus Black's, at the root.
    root_balance: i32,

    /// White's material minus Black's, in the current simulation.
    balance: i32,
}

impl EvaluationPolicy {
    /// Material difference at which the reward reaches `tanh(1)`.
    const SCALE: f32 = 400.0;

    /// Value of a piece, in centipawns.
    pub const fn value(piece_type: PieceType) -> i32 {
        match piece_type {
            PieceType::Pawn => 100,
            PieceType::Knight => 320,
            PieceType::Bishop => 330,
            PieceType::Rook => 500,
            PieceType::Queen => 900,
            PieceType::King => 0,
        }
    }

    /// Total material of every piece on `board`, White's minus Black's.
    pub fn balance_of(board: &Board) -> i32 {
        PieceType::ALL.into_iter().fold(0, |balance, piece_type| {
            let white = board.piece_parts(Color::White, piece_type).population() as i32;
            let black = board.piece_parts(Color::Black, piece_type).population() as i32;
            balance + (white - black) * Self::value(piece_type)
        })
    }

    /// Material `mv` gains for whoever plays it.
    const fn gain(mv: &Move) -> i32 {
        let pawn = Self::value(PieceType::Pawn);
        match mv {
            Move::Capture(mv) => Self::value(mv.victim),
            Move::QuietPromotion(mv) => Self::value(mv.promotion) - pawn,
            Move::CapturePromotion(mv) => Self::value(mv.promotion) - pawn + Self::value(mv.victim),
            Move::EnPassant(_) => pawn,
            Move::Quiet(_) | Move::KingsideCastle(_) | Move::QueensideCastle(_) => 0,
        }
    }
}

impl RolloutPolicy for EvaluationPolicy {
    fn on_search_start(&mut self, board: &Board) {
        self.root_balance = Self::balance_of(board);
        self.balance = self.root_balance;
    }

    fn on_simulation_start(&mut self) {
        self.balance = self.root_balance;
    }

    fn on_move(&mut self, color: Color, mv: &Move) {
        match color {
            Color::White => self.balance += Self::gain(mv),
            Color::Black => self.balance -= Self::gain(mv),
        }
    }

    fn evaluate(&self, color: Color) -> f32 {
        let reward = (self.balance as f32 / Self::SCALE).tanh();
        match color {
            Color::White => reward,
            Color::Black => -reward,
        }
    }
}
