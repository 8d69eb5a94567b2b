/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Capture, CapturePromotion, CastlingRights, Color, Move, PieceType, QuietMove, Square};

/// The slowly-changing part of a position that move generation branches on.
///
/// A [`NodeContext`] is derived once from a [`crate::Position`] and every generated move is
/// reported together with the context of the position it leads to, so a search can descend
/// without re-deriving castling rights or en passant availability from the board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct NodeContext {
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub can_en_passant: bool,
}

impl NodeContext {
    pub const fn new(side_to_move: Color, castling_rights: CastlingRights, can_en_passant: bool) -> Self {
        Self {
            side_to_move,
            castling_rights,
            can_en_passant,
        }
    }

    /// The context of the position reached after the side to move plays `mv`.
    ///
    /// The side to move flips. A pawn double push enables en passant; anything else disables it.
    /// A king move or castle loses both of the mover's rights, a rook leaving its corner loses that
    /// corner's right, and capturing a rook on its corner removes the opponent's right there.
    pub fn child(self, mv: &Move) -> Self {
        let mover = self.side_to_move;
        let mut rights = self.castling_rights;
        let mut can_en_passant = false;

        match *mv {
            Move::Quiet(QuietMove {
                origin,
                target,
                piece_type,
            }) => match piece_type {
                PieceType::Pawn => can_en_passant = origin.rank().0.abs_diff(target.rank().0) == 2,
                PieceType::Rook => rights = rights.without(corner_right(mover, origin)),
                PieceType::King => rights = rights.without(CastlingRights::both(mover)),
                _ => {}
            },
            Move::Capture(Capture {
                origin,
                target,
                aggressor,
                victim,
            }) => {
                match aggressor {
                    PieceType::Rook => rights = rights.without(corner_right(mover, origin)),
                    PieceType::King => rights = rights.without(CastlingRights::both(mover)),
                    _ => {}
                }
                if victim == PieceType::Rook {
                    rights = rights.without(corner_right(!mover, target));
                }
            }
            Move::CapturePromotion(CapturePromotion { target, victim, .. }) => {
                if victim == PieceType::Rook {
                    rights = rights.without(corner_right(!mover, target));
                }
            }
            Move::KingsideCastle(_) | Move::QueensideCastle(_) => {
                rights = rights.without(CastlingRights::both(mover))
            }
            Move::QuietPromotion(_) | Move::EnPassant(_) => {}
        }

        Self::new(!mover, rights, can_en_passant)
    }
}

/// The castling right tied to a rook standing on `square`, if `square` is one of `color`'s
/// starting rook corners.
#[inline(always)]
fn corner_right(color: Color, square: Square) -> CastlingRights {
    let [_, (kingside, _)] = Move::kingside_castle_squares(color);
    let [_, (queenside, _)] = Move::queenside_castle_squares(color);
    if square == kingside {
        CastlingRights::kingside(color)
    } else if square == queenside {
        CastlingRights::queenside(color)
    } else {
        CastlingRights::NONE
    }
}
