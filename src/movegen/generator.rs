/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{anyhow, Result};

use super::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, ray_between,
    ray_containing, rook_attacks, NodeContext,
};
use crate::{
    Bitboard, Board, Capture, CapturePromotion, CastlingRights, Color, EnPassant, KingsideCastle,
    Move, PieceType, Position, QueensideCastle, QuietMove, QuietPromotion, Square,
};

/// Receives every legal move of a position, one call per move.
///
/// Each call carries the [`NodeContext`] of the position the move leads to. Every method
/// forwards to [`Visitor::visit`] unless overridden, so a consumer that doesn't care which piece
/// moved only implements that one.
pub trait Visitor {
    fn visit(&mut self, mv: Move, child: NodeContext);

    #[inline(always)]
    fn visit_pawn_move(&mut self, mv: Move, child: NodeContext) {
        self.visit(mv, child)
    }

    #[inline(always)]
    fn visit_knight_move(&mut self, mv: Move, child: NodeContext) {
        self.visit(mv, child)
    }

    #[inline(always)]
    fn visit_bishop_move(&mut self, mv: Move, child: NodeContext) {
        self.visit(mv, child)
    }

    #[inline(always)]
    fn visit_rook_move(&mut self, mv: Move, child: NodeContext) {
        self.visit(mv, child)
    }

    #[inline(always)]
    fn visit_queen_move(&mut self, mv: Move, child: NodeContext) {
        self.visit(mv, child)
    }

    #[inline(always)]
    fn visit_king_move(&mut self, mv: Move, child: NodeContext) {
        self.visit(mv, child)
    }
}

impl Visitor for Vec<Move> {
    #[inline(always)]
    fn visit(&mut self, mv: Move, _child: NodeContext) {
        self.push(mv);
    }
}

impl Visitor for Vec<(Move, NodeContext)> {
    #[inline(always)]
    fn visit(&mut self, mv: Move, child: NodeContext) {
        self.push((mv, child));
    }
}

/// Counts moves without storing them.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveCounter(pub u64);

impl Visitor for MoveCounter {
    #[inline(always)]
    fn visit(&mut self, _mv: Move, _child: NodeContext) {
        self.0 += 1;
    }
}

/// Legal move generation for a single [`Position`].
///
/// Construction computes the check and pin metadata of the position once; [`MoveGenerator::walk`]
/// then reports every legal move to a [`Visitor`].
#[derive(Clone, Copy, Debug)]
pub struct MoveGenerator<'a> {
    position: &'a Position,
    context: NodeContext,
    king_square: Square,

    /// Enemy pieces attacking our King.
    checkers: Bitboard,

    /// Squares a non-King move must land on: the checker and the ray between it and our King
    /// when in single check, otherwise every square not occupied by us or the enemy King.
    checkmask: Bitboard,

    /// Our pieces that stand alone between our King and an enemy slider.
    pinned: Bitboard,

    /// Every square the enemy attacks.
    enemy_attacks: Bitboard,
}

impl<'a> MoveGenerator<'a> {
    /// Computes the legality masks for `position`.
    pub fn new(position: &'a Position) -> Self {
        let board = position.board();
        let color = position.side_to_move();
        let opponent = !color;
        let occupied = board.occupied();
        let king_square = board.king(color).lsb_unchecked();

        let mut pinned = Bitboard::EMPTY_BOARD;
        let mut checkmask = !(board.color(color) | board.king(opponent));

        // Knights and Pawns check exactly where their attacks overlap our King
        let mut checkers = board.piece_parts(opponent, PieceType::Knight) & knight_attacks(king_square)
            | board.piece_parts(opponent, PieceType::Pawn) & pawn_attacks(king_square, color);

        // Pretend our King is a slider with no blockers to find every enemy slider lined up on it
        let enemy_sliders = rook_attacks(king_square, Bitboard::EMPTY_BOARD)
            & board.orthogonal_sliders(opponent)
            | bishop_attacks(king_square, Bitboard::EMPTY_BOARD) & board.diagonal_sliders(opponent);

        for attacker in enemy_sliders {
            let ray = ray_between(king_square, attacker);
            match (ray & occupied).population() {
                0 => checkers |= attacker,
                1 => pinned |= ray & board.color(color),
                _ => {}
            }
        }

        if checkers.is_nonempty() {
            checkmask = checkers;
            for checker in checkers {
                checkmask |= ray_between(king_square, checker);
            }
        }

        Self {
            position,
            context: position.context(),
            king_square,
            checkers,
            checkmask,
            pinned,
            enemy_attacks: attacks_by(board, opponent, occupied),
        }
    }

    /// Returns `true` if the side to move is in check.
    #[inline(always)]
    pub const fn is_check(&self) -> bool {
        self.checkers.is_nonempty()
    }

    #[inline(always)]
    pub const fn checkers(&self) -> Bitboard {
        self.checkers
    }

    /// Reports every legal move to `visitor`.
    ///
    /// When in double check only King moves are generated.
    pub fn walk<V: Visitor>(&self, visitor: &mut V) {
        match self.checkers.population() {
            0 => self.generate_all_moves::<false, V>(visitor),
            1 => self.generate_all_moves::<true, V>(visitor),
            _ => self.generate_king_moves::<true, V>(visitor),
        }
    }

    #[inline(always)]
    fn board(&self) -> &Board {
        self.position.board()
    }

    #[inline(always)]
    fn child(&self, mv: &Move) -> NodeContext {
        self.context.child(mv)
    }

    fn generate_all_moves<const IN_CHECK: bool, V: Visitor>(&self, visitor: &mut V) {
        self.generate_pawn_moves::<IN_CHECK, V>(visitor);
        self.generate_piece_moves(PieceType::Knight, visitor, V::visit_knight_move);
        self.generate_piece_moves(PieceType::Bishop, visitor, V::visit_bishop_move);
        self.generate_piece_moves(PieceType::Rook, visitor, V::visit_rook_move);
        self.generate_piece_moves(PieceType::Queen, visitor, V::visit_queen_move);
        self.generate_king_moves::<IN_CHECK, V>(visitor);
    }

    /// Builds the capture or quiet move of a non-Pawn piece onto `target`.
    #[inline(always)]
    fn normal_move(&self, piece_type: PieceType, origin: Square, target: Square) -> Move {
        match self.board().piece_type_at(target) {
            Some(victim) => Move::Capture(Capture {
                origin,
                target,
                aggressor: piece_type,
                victim,
            }),
            None => Move::Quiet(QuietMove {
                origin,
                target,
                piece_type,
            }),
        }
    }

    fn generate_pawn_moves<const IN_CHECK: bool, V: Visitor>(&self, visitor: &mut V) {
        let color = self.context.side_to_move;
        let promotion_rank = Bitboard::promotion_rank(color);

        for origin in self.board().piece_parts(color, PieceType::Pawn) {
            let (mobility, ep_bb) = self.generate_legal_pawn_mobility::<IN_CHECK>(color, origin);

            for target in mobility {
                if ep_bb.intersects(target) {
                    let mv = Move::EnPassant(EnPassant {
                        origin,
                        target,
                        victim_origin: target.bitboard().backward(color).lsb_unchecked(),
                    });
                    visitor.visit_pawn_move(mv, self.child(&mv));
                    continue;
                }

                let victim = self.board().piece_type_at(target);
                if promotion_rank.intersects(target) {
                    for promotion in PieceType::PROMOTIONS {
                        let mv = match victim {
                            Some(victim) => Move::CapturePromotion(CapturePromotion {
                                origin,
                                target,
                                promotion,
                                victim,
                            }),
                            None => Move::QuietPromotion(QuietPromotion {
                                origin,
                                target,
                                promotion,
                            }),
                        };
                        visitor.visit_pawn_move(mv, self.child(&mv));
                    }
                } else {
                    let mv = self.normal_move(PieceType::Pawn, origin, target);
                    visitor.visit_pawn_move(mv, self.child(&mv));
                }
            }
        }
    }

    /// Knights, Bishops, Rooks and Queens, each reported through `visit`.
    #[inline(always)]
    fn generate_piece_moves<V: Visitor>(
        &self,
        piece_type: PieceType,
        visitor: &mut V,
        visit: fn(&mut V, Move, NodeContext),
    ) {
        let color = self.context.side_to_move;
        let blockers = self.board().occupied();

        for origin in self.board().piece_parts(color, piece_type) {
            let attacks = match piece_type {
                PieceType::Knight => knight_attacks(origin),
                PieceType::Bishop => bishop_attacks(origin, blockers),
                PieceType::Rook => rook_attacks(origin, blockers),
                _ => queen_attacks(origin, blockers),
            };

            for target in self.generate_legal_normal_piece_mobility(origin, attacks) {
                let mv = self.normal_move(piece_type, origin, target);
                visit(visitor, mv, self.child(&mv));
            }
        }
    }

    fn generate_king_moves<const IN_CHECK: bool, V: Visitor>(&self, visitor: &mut V) {
        let color = self.context.side_to_move;
        let origin = self.king_square;

        // Retreating along the line of a sliding checker is still check
        let safe_squares = !(self.enemy_attacks | self.generate_discoverable_checks_bitboard());
        let mobility = king_attacks(origin) & !self.board().color(color) & safe_squares;

        for target in mobility {
            let mv = self.normal_move(PieceType::King, origin, target);
            visitor.visit_king_move(mv, self.child(&mv));
        }

        if IN_CHECK {
            return;
        }

        let rights = self.context.castling_rights;
        if rights.contains(CastlingRights::kingside(color))
            && self.can_castle(Move::kingside_castle_squares(color))
        {
            let mv = Move::KingsideCastle(KingsideCastle);
            visitor.visit_king_move(mv, self.child(&mv));
        }
        if rights.contains(CastlingRights::queenside(color))
            && self.can_castle(Move::queenside_castle_squares(color))
        {
            let mv = Move::QueensideCastle(QueensideCastle);
            visitor.visit_king_move(mv, self.child(&mv));
        }
    }

    /// Returns the legal targets of the Pawn on `square`, along with the en passant target
    /// if that capture is among them.
    fn generate_legal_pawn_mobility<const IN_CHECK: bool>(
        &self,
        color: Color,
        square: Square,
    ) -> (Bitboard, Bitboard) {
        let blockers = self.board().occupied();
        let empty = !blockers;

        // A pinned pawn may only move along the line through it and our King
        let pinmask = if self.pinned.intersects(square) {
            ray_containing(square, self.king_square)
        } else {
            Bitboard::FULL_BOARD
        };

        let ep_bb = self
            .position
            .en_passant()
            .map(|ep_square| self.generate_ep_bitboard::<IN_CHECK>(color, square, ep_square))
            .unwrap_or_default();

        let single = square.bitboard().forward(color) & empty;
        let double = single.forward(color) & empty & Bitboard::double_push_rank(color);
        let enemies = self.board().color(!color);
        let attacks = pawn_attacks(square, color) & (enemies | ep_bb);

        let mobility = (single | double | attacks) & (self.checkmask | ep_bb) & pinmask;
        (mobility, ep_bb & mobility)
    }

    /// The en passant target square as a bitboard if the Pawn on `square` may legally capture
    /// onto `ep_square`, otherwise empty.
    ///
    /// Both Pawns leave their squares at once, which can expose our King along a rank; that is
    /// checked by recomputing slider attacks on the board after the capture.
    fn generate_ep_bitboard<const IN_CHECK: bool>(
        &self,
        color: Color,
        square: Square,
        ep_square: Square,
    ) -> Bitboard {
        let ep_bb = ep_square.bitboard();
        if !pawn_attacks(square, color).intersects(ep_bb) {
            return Bitboard::EMPTY_BOARD;
        }

        let victim_bb = ep_bb.backward(color);
        let opponent = !color;
        if !self
            .board()
            .piece_parts(opponent, PieceType::Pawn)
            .intersects(victim_bb)
        {
            return Bitboard::EMPTY_BOARD;
        }

        // In check, the capture must remove the checker or block its line
        if IN_CHECK && !self.checkmask.intersects(victim_bb | ep_bb) {
            return Bitboard::EMPTY_BOARD;
        }

        let blockers_after_ep = (self.board().occupied() ^ victim_bb ^ square) | ep_bb;

        if rook_attacks(self.king_square, blockers_after_ep)
            .intersects(self.board().orthogonal_sliders(opponent))
        {
            return Bitboard::EMPTY_BOARD;
        }

        if bishop_attacks(self.king_square, blockers_after_ep)
            .intersects(self.board().diagonal_sliders(opponent))
        {
            return Bitboard::EMPTY_BOARD;
        }

        ep_bb
    }

    /// Whether the castle described by `[king, rook]` (origin and target squares of each) is legal,
    /// given that the right is held and the King is not in check.
    fn can_castle(&self, [(king_src, king_dst), (rook_src, rook_dst)]: [(Square, Square); 2]) -> bool {
        let color = self.context.side_to_move;

        if self.king_square != king_src
            || !self
                .board()
                .piece_parts(color, PieceType::Rook)
                .intersects(rook_src)
        {
            return false;
        }

        // The King and Rook don't count as blockers, since they're moving through each other
        let blockers = self.board().occupied() ^ king_src ^ rook_src;
        let king_path = ray_between(king_src, king_dst) | king_dst;
        let rook_path = ray_between(rook_src, rook_dst) | rook_dst;

        !(king_path | rook_path).intersects(blockers) && !king_path.intersects(self.enemy_attacks)
    }

    /// The lines through our King and each sliding checker, minus the checkers themselves.
    ///
    /// The King's own square blocks these rays in the attack map, so stepping backwards along one
    /// looks safe unless it is removed explicitly.
    fn generate_discoverable_checks_bitboard(&self) -> Bitboard {
        let opponent = !self.context.side_to_move;
        let sliders = self.board().diagonal_sliders(opponent) | self.board().orthogonal_sliders(opponent);

        let mut discoverable = Bitboard::EMPTY_BOARD;
        for checker in self.checkers & sliders {
            discoverable |= ray_containing(self.king_square, checker) ^ checker;
        }
        discoverable
    }

    /// Legal targets for a Knight, Bishop, Rook or Queen on `square` with pseudo-legal `attacks`.
    #[inline(always)]
    fn generate_legal_normal_piece_mobility(&self, square: Square, attacks: Bitboard) -> Bitboard {
        let legal_squares = if self.pinned.intersects(square) {
            self.checkmask & ray_containing(square, self.king_square)
        } else {
            self.checkmask
        };

        attacks & legal_squares
    }
}

/// Every square attacked by `color`, with sliders blocked by `occupied`.
pub fn attacks_by(board: &Board, color: Color, occupied: Bitboard) -> Bitboard {
    let pawns = board.piece_parts(color, PieceType::Pawn).forward(color);
    let mut attacks = pawns.east() | pawns.west();

    for square in board.piece_parts(color, PieceType::Knight) {
        attacks |= knight_attacks(square);
    }
    for square in board.diagonal_sliders(color) {
        attacks |= bishop_attacks(square, occupied);
    }
    for square in board.orthogonal_sliders(color) {
        attacks |= rook_attacks(square, occupied);
    }
    for square in board.king(color) {
        attacks |= king_attacks(square);
    }

    attacks
}

/// Collects every legal move of `position`.
///
/// # Example
/// ```
/// # use prodigy::*;
/// assert_eq!(legal_moves(&Position::default()).len(), 20);
/// ```
pub fn legal_moves(position: &Position) -> Vec<Move> {
    let mut moves = Vec::with_capacity(crate::MAX_NUM_MOVES);
    MoveGenerator::new(position).walk(&mut moves);
    moves
}

impl Position {
    /// Finds the legal move written as `uci` in coordinate notation, such as `e1g1` or `a7a8q`.
    pub fn find_move(&self, uci: &str) -> Result<Move> {
        let color = self.side_to_move();
        legal_moves(self)
            .into_iter()
            .find(|mv| mv.to_uci(color).to_string() == uci)
            .ok_or_else(|| anyhow!("{uci:?} is not a legal move in {self}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::FEN_KIWIPETE;

    fn uci_moves(fen: &str) -> Vec<String> {
        let position = Position::from_fen(fen).unwrap();
        let mut moves: Vec<_> = legal_moves(&position)
            .into_iter()
            .map(|mv| mv.to_uci(position.side_to_move()).to_string())
            .collect();
        moves.sort();
        moves
    }

    #[derive(Default)]
    struct PieceTally {
        pawns: usize,
        knights: usize,
        bishops: usize,
        rooks: usize,
        queens: usize,
        kings: usize,
    }

    impl Visitor for PieceTally {
        fn visit(&mut self, _mv: Move, _child: NodeContext) {
            unreachable!("every piece method is overridden")
        }
        fn visit_pawn_move(&mut self, _mv: Move, _child: NodeContext) {
            self.pawns += 1;
        }
        fn visit_knight_move(&mut self, _mv: Move, _child: NodeContext) {
            self.knights += 1;
        }
        fn visit_bishop_move(&mut self, _mv: Move, _child: NodeContext) {
            self.bishops += 1;
        }
        fn visit_rook_move(&mut self, _mv: Move, _child: NodeContext) {
            self.rooks += 1;
        }
        fn visit_queen_move(&mut self, _mv: Move, _child: NodeContext) {
            self.queens += 1;
        }
        fn visit_king_move(&mut self, _mv: Move, _child: NodeContext) {
            self.kings += 1;
        }
    }

    #[test]
    fn test_visits_are_typed_by_piece() {
        let position = Position::from_fen(FEN_KIWIPETE).unwrap();
        let mut tally = PieceTally::default();
        MoveGenerator::new(&position).walk(&mut tally);

        // 48 moves: 8 pawn, 11 knight, 11 bishop, 5 rook, 9 queen and 4 king (2 of them castles)
        assert_eq!(tally.pawns, 8);
        assert_eq!(tally.knights, 11);
        assert_eq!(tally.bishops, 11);
        assert_eq!(tally.rooks, 5);
        assert_eq!(tally.queens, 9);
        assert_eq!(tally.kings, 4);
    }

    #[test]
    fn test_children_carry_context() {
        let position = Position::default();
        let mut moves = Vec::<(Move, NodeContext)>::new();
        MoveGenerator::new(&position).walk(&mut moves);
        for (mv, child) in moves {
            assert_eq!(child.side_to_move, Color::Black);
            assert_eq!(child.castling_rights, CastlingRights::ALL);
            let double_push = matches!(
                mv,
                Move::Quiet(QuietMove { origin, target, piece_type: PieceType::Pawn })
                    if origin.rank().0.abs_diff(target.rank().0) == 2
            );
            assert_eq!(child.can_en_passant, double_push, "{mv:?}");
        }
    }

    #[test]
    fn test_checkmate_and_stalemate() {
        // Fool's mate
        let mate = Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .unwrap();
        let generator = MoveGenerator::new(&mate);
        assert!(generator.is_check());
        let mut counter = MoveCounter::default();
        generator.walk(&mut counter);
        assert_eq!(counter.0, 0);

        let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let generator = MoveGenerator::new(&stalemate);
        assert!(!generator.is_check());
        assert!(legal_moves(&stalemate).is_empty());
    }

    #[test]
    fn test_double_check_allows_only_king_moves() {
        // Rook on e8 and Knight on f3 both check the King on e1
        let moves = uci_moves("4r2k/8/8/8/8/5n2/3P1P2/3QK3 w - - 0 1");
        // e2 is still on the Rook's file, so f1 is the only escape
        assert_eq!(moves, vec!["e1f1"]);
    }

    #[test]
    fn test_single_check_must_be_resolved() {
        // Block on c3 or d2 with the Knight or Bishop, or move the King
        let moves = uci_moves("4k3/8/8/b7/8/8/8/1NB1K3 w - - 0 1");
        assert_eq!(
            moves,
            vec!["b1c3", "b1d2", "c1d2", "e1d1", "e1e2", "e1f1", "e1f2"]
        );
    }

    #[test]
    fn test_pinned_pieces_move_along_the_pin() {
        // The Rook on e4 is pinned by the Rook on e8 and can only slide along the e-file
        let moves = uci_moves("4r2k/8/8/8/4R3/8/8/4K3 w - - 0 1");
        let rook_moves: Vec<_> = moves.iter().filter(|mv| mv.starts_with("e4")).collect();
        assert_eq!(
            rook_moves,
            vec!["e4e2", "e4e3", "e4e5", "e4e6", "e4e7", "e4e8"]
        );

        // A pinned Knight can't move at all
        let moves = uci_moves("4r2k/8/8/8/4N3/8/8/4K3 w - - 0 1");
        assert!(moves.iter().all(|mv| !mv.starts_with("e4")));
    }

    #[test]
    fn test_en_passant_horizontal_discovered_check() {
        // Capturing en passant would remove both pawns from the 5th rank, exposing the King
        let moves = uci_moves("8/8/8/K2pP2r/8/8/8/7k w - d6 0 1");
        assert!(!moves.contains(&String::from("e5d6")), "{moves:?}");

        // Without the Rook, the capture is fine
        let moves = uci_moves("8/8/8/K2pP3/8/8/8/7k w - d6 0 1");
        assert!(moves.contains(&String::from("e5d6")), "{moves:?}");
    }

    #[test]
    fn test_en_passant_captures_checker() {
        // The pawn on d5 just double-pushed to give check; taking it en passant is legal
        let moves = uci_moves("8/8/8/3pP3/4K3/8/8/7k w - d6 0 1");
        assert!(moves.contains(&String::from("e5d6")), "{moves:?}");
    }

    #[test]
    fn test_castling_legality() {
        // Everything clear
        let moves = uci_moves("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert!(moves.contains(&String::from("e1g1")));
        assert!(moves.contains(&String::from("e1c1")));

        // Rook on f8 attacks f1, so no kingside castle; b1 attacked doesn't stop queenside
        let moves = uci_moves("1r3r1k/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!moves.contains(&String::from("e1g1")));
        assert!(moves.contains(&String::from("e1c1")));

        // A piece on b1 blocks the Rook's path
        let moves = uci_moves("7k/8/8/8/8/8/8/RN2K2R w KQ - 0 1");
        assert!(!moves.contains(&String::from("e1c1")));
        assert!(moves.contains(&String::from("e1g1")));

        // No castling out of check
        let moves = uci_moves("4r2k/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!moves.contains(&String::from("e1g1")));
        assert!(!moves.contains(&String::from("e1c1")));
    }

    #[test]
    fn test_king_cannot_retreat_along_check_ray() {
        let moves = uci_moves("7k/8/8/8/r3K3/8/8/8 w - - 0 1");
        assert!(!moves.contains(&String::from("e4f4")), "{moves:?}");
        assert!(moves.contains(&String::from("e4e5")));
    }

    #[test]
    fn test_promotions() {
        let moves = uci_moves("1n5k/P7/8/8/8/8/8/K7 w - - 0 1");
        for mv in ["a7a8q", "a7a8r", "a7a8b", "a7a8n", "a7b8q", "a7b8r", "a7b8b", "a7b8n"] {
            assert!(moves.contains(&String::from(mv)), "{mv} missing from {moves:?}");
        }
    }

    #[test]
    fn test_find_move() {
        let position = Position::default();
        assert!(position.find_move("e2e4").is_ok());
        assert!(position.find_move("e2e5").is_err());
    }
}
