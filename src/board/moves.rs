/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{Color, PieceType, Square};

/// A piece moves to an empty square without capturing or promoting.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct QuietMove {
    pub origin: Square,
    pub target: Square,
    pub piece_type: PieceType,
}

/// A piece moves onto a square occupied by an enemy piece, removing it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Capture {
    pub origin: Square,
    pub target: Square,
    pub aggressor: PieceType,
    pub victim: PieceType,
}

/// The king and the kingside rook slide past each other.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct KingsideCastle;

/// The king and the queenside rook slide past each other.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct QueensideCastle;

/// A pawn advances onto the last rank and becomes `promotion`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct QuietPromotion {
    pub origin: Square,
    pub target: Square,
    pub promotion: PieceType,
}

/// A pawn captures onto the last rank and becomes `promotion`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CapturePromotion {
    pub origin: Square,
    pub target: Square,
    pub promotion: PieceType,
    pub victim: PieceType,
}

/// A pawn captures a pawn that just double-pushed past it.
///
/// `victim_origin` is the square the captured pawn stands on, which differs from `target`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EnPassant {
    pub origin: Square,
    pub target: Square,
    pub victim_origin: Square,
}

/// Any legal chess move, as one of exactly seven shapes.
///
/// A [`Move`] carries everything needed to toggle it onto a [`super::Board`] and nothing about the
/// state it was played from, so applying the same [`Move`] twice restores the board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Move {
    Quiet(QuietMove),
    Capture(Capture),
    KingsideCastle(KingsideCastle),
    QueensideCastle(QueensideCastle),
    QuietPromotion(QuietPromotion),
    CapturePromotion(CapturePromotion),
    EnPassant(EnPassant),
}

impl Move {
    /// King squares `(origin, target)` and rook squares `(origin, target)` of a kingside castle.
    pub const fn kingside_castle_squares(color: Color) -> [(Square, Square); 2] {
        match color {
            Color::White => [(Square::E1, Square::G1), (Square::H1, Square::F1)],
            Color::Black => [(Square::E8, Square::G8), (Square::H8, Square::F8)],
        }
    }

    /// King squares `(origin, target)` and rook squares `(origin, target)` of a queenside castle.
    pub const fn queenside_castle_squares(color: Color) -> [(Square, Square); 2] {
        match color {
            Color::White => [(Square::E1, Square::C1), (Square::A1, Square::D1)],
            Color::Black => [(Square::E8, Square::C8), (Square::A8, Square::D8)],
        }
    }

    /// Returns `true` if this move removes an enemy piece from the board.
    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        matches!(
            self,
            Self::Capture(_) | Self::CapturePromotion(_) | Self::EnPassant(_)
        )
    }

    /// Returns `true` if a pawn moves.
    #[inline(always)]
    pub const fn is_pawn_move(&self) -> bool {
        match self {
            Self::Quiet(mv) => matches!(mv.piece_type, PieceType::Pawn),
            Self::Capture(mv) => matches!(mv.aggressor, PieceType::Pawn),
            Self::QuietPromotion(_) | Self::CapturePromotion(_) | Self::EnPassant(_) => true,
            Self::KingsideCastle(_) | Self::QueensideCastle(_) => false,
        }
    }

    /// Renders this move in coordinate notation, given that `color` is making it.
    pub const fn to_uci(&self, color: Color) -> UciMove {
        let (origin, target, promotion) = match self {
            Self::Quiet(mv) => (mv.origin, mv.target, None),
            Self::Capture(mv) => (mv.origin, mv.target, None),
            Self::KingsideCastle(_) => {
                let [(origin, target), _] = Self::kingside_castle_squares(color);
                (origin, target, None)
            }
            Self::QueensideCastle(_) => {
                let [(origin, target), _] = Self::queenside_castle_squares(color);
                (origin, target, None)
            }
            Self::QuietPromotion(mv) => (mv.origin, mv.target, Some(mv.promotion)),
            Self::CapturePromotion(mv) => (mv.origin, mv.target, Some(mv.promotion)),
            Self::EnPassant(mv) => (mv.origin, mv.target, None),
        };
        UciMove {
            origin,
            target,
            promotion,
        }
    }
}

/// A move in coordinate notation, such as `e2e4` or `e7e8q`.
///
/// Castling is written as the king's two-square move.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct UciMove {
    pub origin: Square,
    pub target: Square,
    pub promotion: Option<PieceType>,
}

impl fmt::Display for UciMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin, self.target)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{promotion}")?;
        }
        Ok(())
    }
}
