/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};

use super::{Bitboard, CastlingRights, Color, File, Move, PieceType, Rank, Square};
use crate::{NodeContext, FEN_STARTPOS};

/// Represents all pieces and their locations on a chess board.
///
/// Has no knowledge of castling rights, en passant, or move counters. If you need those, see
/// [`Position`].
///
/// Every occupied square is owned by exactly one color bitboard and exactly one piece-type
/// bitboard.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    /// All squares occupied by a specific color.
    colors: [Bitboard; Color::COUNT],

    /// All squares occupied by a specific piece type, regardless of color.
    pieces: [Bitboard; PieceType::COUNT],
}

impl Board {
    /// Creates a new, empty [`Board`] containing no pieces.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            colors: [Bitboard::EMPTY_BOARD; Color::COUNT],
            pieces: [Bitboard::EMPTY_BOARD; PieceType::COUNT],
        }
    }

    /// Constructs a [`Board`] from the placement field of a FEN string.
    pub fn from_fen(placements: &str) -> Result<Self> {
        let mut board = Self::new();

        if placements.matches('/').count() != 7 {
            bail!("FEN must have piece placements for all 8 ranks");
        }

        // Reversed so that White's pieces land at the bottom of the board
        for (rank, row) in placements.split('/').rev().enumerate() {
            let rank = Rank(rank as u8);
            let mut file = 0u8;

            for c in row.chars() {
                if let Some(empty) = c.to_digit(10) {
                    file += empty as u8;
                    continue;
                }
                if file >= File::COUNT as u8 {
                    bail!("FEN rank {rank} has more than 8 files: {row:?}");
                }
                let (color, piece_type) = PieceType::from_fen_char(c)?;
                board.place(color, piece_type, Square::new(File(file), rank));
                file += 1;
            }

            if file != File::COUNT as u8 {
                bail!("FEN rank {rank} must describe exactly 8 files: {row:?}");
            }
        }

        Ok(board)
    }

    /// Places a piece on an empty `square`.
    #[inline(always)]
    pub fn place(&mut self, color: Color, piece_type: PieceType, square: Square) {
        self.colors[color.index()].toggle(square);
        self.pieces[piece_type.index()].toggle(square);
    }

    /// All squares occupied by `color`.
    #[inline(always)]
    pub const fn color(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// All squares occupied by `piece_type`, of either color.
    #[inline(always)]
    pub const fn pieces(&self, piece_type: PieceType) -> Bitboard {
        self.pieces[piece_type.index()]
    }

    /// All squares occupied by a `piece_type` of `color`.
    #[inline(always)]
    pub const fn piece_parts(&self, color: Color, piece_type: PieceType) -> Bitboard {
        self.color(color).and(self.pieces(piece_type))
    }

    #[inline(always)]
    pub const fn king(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceType::King)
    }

    /// Bishops and queens of `color`.
    #[inline(always)]
    pub const fn diagonal_sliders(&self, color: Color) -> Bitboard {
        self.color(color)
            .and(self.pieces(PieceType::Bishop).or(self.pieces(PieceType::Queen)))
    }

    /// Rooks and queens of `color`.
    #[inline(always)]
    pub const fn orthogonal_sliders(&self, color: Color) -> Bitboard {
        self.color(color)
            .and(self.pieces(PieceType::Rook).or(self.pieces(PieceType::Queen)))
    }

    #[inline(always)]
    pub const fn occupied(&self) -> Bitboard {
        self.colors[0].or(self.colors[1])
    }

    /// The piece type on `square`, if any.
    pub fn piece_type_at(&self, square: Square) -> Option<PieceType> {
        PieceType::ALL
            .into_iter()
            .find(|piece_type| self.pieces(*piece_type).intersects(square))
    }

    /// The color of the piece on `square`, if any.
    pub fn color_at(&self, square: Square) -> Option<Color> {
        if self.color(Color::White).intersects(square) {
            Some(Color::White)
        } else if self.color(Color::Black).intersects(square) {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Toggles the bits of `mv`, played by `color`, onto this board.
    ///
    /// Applying the same move a second time undoes it.
    pub fn apply(&mut self, color: Color, mv: &Move) {
        let us = color.index();
        let them = (!color).index();

        match *mv {
            Move::Quiet(mv) => {
                let squares = mv.origin.bitboard() | mv.target;
                self.colors[us] ^= squares;
                self.pieces[mv.piece_type.index()] ^= squares;
            }
            Move::Capture(mv) => {
                let squares = mv.origin.bitboard() | mv.target;
                self.colors[us] ^= squares;
                self.pieces[mv.aggressor.index()] ^= squares;
                self.colors[them] ^= mv.target;
                self.pieces[mv.victim.index()] ^= mv.target;
            }
            Move::KingsideCastle(_) => {
                self.toggle_castle(color, Move::kingside_castle_squares(color))
            }
            Move::QueensideCastle(_) => {
                self.toggle_castle(color, Move::queenside_castle_squares(color))
            }
            Move::QuietPromotion(mv) => {
                self.colors[us] ^= mv.origin.bitboard() | mv.target;
                self.pieces[PieceType::Pawn.index()] ^= mv.origin;
                self.pieces[mv.promotion.index()] ^= mv.target;
            }
            Move::CapturePromotion(mv) => {
                self.colors[us] ^= mv.origin.bitboard() | mv.target;
                self.pieces[PieceType::Pawn.index()] ^= mv.origin;
                self.pieces[mv.promotion.index()] ^= mv.target;
                self.colors[them] ^= mv.target;
                self.pieces[mv.victim.index()] ^= mv.target;
            }
            Move::EnPassant(mv) => {
                let squares = mv.origin.bitboard() | mv.target;
                self.colors[us] ^= squares;
                self.colors[them] ^= mv.victim_origin;
                self.pieces[PieceType::Pawn.index()] ^= squares | mv.victim_origin;
            }
        }
    }

    fn toggle_castle(&mut self, color: Color, [king, rook]: [(Square, Square); 2]) {
        let king = king.0.bitboard() | king.1;
        let rook = rook.0.bitboard() | rook.1;
        self.colors[color.index()] ^= king | rook;
        self.pieces[PieceType::King.index()] ^= king;
        self.pieces[PieceType::Rook.index()] ^= rook;
    }

    /// The placement field of this board's FEN string.
    pub fn to_fen(&self) -> String {
        let mut rows = Vec::with_capacity(Rank::COUNT);

        for rank in Rank::iter().rev() {
            let mut row = String::new();
            let mut empty_spaces = 0;
            for file in File::iter() {
                let square = Square::new(file, rank);
                match (self.color_at(square), self.piece_type_at(square)) {
                    (Some(color), Some(piece_type)) => {
                        if empty_spaces != 0 {
                            row += &empty_spaces.to_string();
                            empty_spaces = 0;
                        }
                        row.push(piece_type.fen_char(color));
                    }
                    _ => empty_spaces += 1,
                }
            }
            if empty_spaces != 0 {
                row += &empty_spaces.to_string();
            }
            rows.push(row);
        }

        rows.join("/")
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({})", self.to_fen())
    }
}

/// A [`Board`] together with the state that decides which moves are legal on it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    board: Board,
    side_to_move: Color,
    castling_rights: CastlingRights,
    /// Square a pawn may capture onto en passant, directly behind a pawn that just double-pushed.
    en_passant: Option<Square>,
    halfmove: u16,
    fullmove: u16,
}

impl Position {
    /// Creates a new [`Position`] from the provided FEN string.
    ///
    /// Missing trailing fields default to `w - - 0 1`.
    ///
    /// # Example
    /// ```
    /// # use prodigy::*;
    /// let position = Position::from_fen(FEN_KIWIPETE).unwrap();
    /// assert_eq!(position.to_string(), FEN_KIWIPETE);
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut split = fen.split_whitespace();
        let placements = split
            .next()
            .ok_or(anyhow!("FEN string must have piece placements."))?;
        let board = Board::from_fen(placements)?;

        let side_to_move = Color::from_uci(split.next().unwrap_or("w"))?;
        let castling_rights = CastlingRights::from_uci(split.next().unwrap_or("-"))?;

        let en_passant = match split.next().unwrap_or("-") {
            "-" => None,
            square => Some(Square::from_uci(square)?),
        };

        let halfmove = split.next().unwrap_or("0");
        let halfmove = halfmove
            .parse()
            .with_context(|| format!("FEN string must have valid halfmove counter. Got {halfmove:?}"))?;

        let fullmove = split.next().unwrap_or("1");
        let fullmove = fullmove
            .parse()
            .with_context(|| format!("FEN string must have valid fullmove counter. Got {fullmove:?}"))?;

        for color in [Color::White, Color::Black] {
            if board.king(color).population() != 1 {
                bail!("FEN string must have exactly one {color:?} king: {fen:?}");
            }
        }

        Ok(Self {
            board,
            side_to_move,
            castling_rights,
            en_passant,
            halfmove,
            fullmove,
        })
    }

    #[inline(always)]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline(always)]
    pub const fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Plies since the last capture or pawn move.
    #[inline(always)]
    pub const fn halfmove(&self) -> u16 {
        self.halfmove
    }

    #[inline(always)]
    pub const fn fullmove(&self) -> u16 {
        self.fullmove
    }

    /// The [`NodeContext`] move generation runs under for this position.
    #[inline(always)]
    pub const fn context(&self) -> NodeContext {
        NodeContext::new(
            self.side_to_move,
            self.castling_rights,
            self.en_passant.is_some(),
        )
    }

    /// Plays `mv`, moving into the already-known `child` context.
    ///
    /// This updates the board, side to move, castling rights and en passant square, but leaves
    /// the move counters alone. It is the cheap step used while descending a search tree.
    pub fn advance(&mut self, mv: &Move, child: NodeContext) {
        self.board.apply(self.side_to_move, mv);
        self.en_passant = match mv {
            Move::Quiet(mv) if child.can_en_passant => {
                Some(Square((mv.origin.0 + mv.target.0) / 2))
            }
            _ => None,
        };
        self.side_to_move = child.side_to_move;
        self.castling_rights = child.castling_rights;
    }

    /// Plays `mv`, updating every field including the halfmove clock and fullmove number.
    ///
    /// No legality checks are made.
    pub fn apply(&mut self, mv: &Move) {
        let child = self.context().child(mv);

        if mv.is_capture() || mv.is_pawn_move() {
            self.halfmove = 0;
        } else {
            self.halfmove = self.halfmove.saturating_add(1);
        }
        if self.side_to_move == Color::Black {
            self.fullmove = self.fullmove.saturating_add(1);
        }

        self.advance(mv, child);
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl Default for Position {
    fn default() -> Self {
        let board = Board::from_fen(FEN_STARTPOS.split(' ').next().unwrap_or_default())
            .unwrap_or_default();
        Self {
            board,
            side_to_move: Color::White,
            castling_rights: CastlingRights::ALL,
            en_passant: None,
            halfmove: 0,
            fullmove: 1,
        }
    }
}

impl fmt::Display for Position {
    /// Displays this position's FEN string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let en_passant = self
            .en_passant
            .map(|square| square.to_string())
            .unwrap_or_else(|| String::from("-"));

        write!(
            f,
            "{} {} {} {en_passant} {} {}",
            self.board.to_fen(),
            self.side_to_move,
            self.castling_rights,
            self.halfmove,
            self.fullmove
        )
    }
}
