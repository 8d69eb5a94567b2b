/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::OnceLock;

use anyhow::{bail, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::{Bitboard, Direction, Square};

/// Process-wide slider attack tables, built on first use.
static MAGIC_TABLES: OnceLock<MagicTables> = OnceLock::new();

/// Hashing parameters that map a masked occupancy to a slot in an attack table.
#[derive(Clone, Copy, Debug, Default)]
struct MagicEntry {
    /// Squares whose occupancy can block the slider, excluding board edges.
    mask: Bitboard,
    magic: u64,
    shift: u8,
    /// Start of this square's segment in the shared attack table.
    offset: usize,
}

impl MagicEntry {
    #[inline(always)]
    const fn index(&self, blockers: Bitboard) -> usize {
        let blockers = blockers.inner() & self.mask.inner();
        let hash = blockers.wrapping_mul(self.magic);
        self.offset + (hash >> self.shift) as usize
    }
}

/// Attack lookups for one kind of slider.
struct SliderTable {
    entries: [MagicEntry; Square::COUNT],
    attacks: Vec<Bitboard>,
}

impl SliderTable {
    /// Finds a magic for every square and fills the shared attack table.
    fn generate(directions: [Direction; 4], rng: &mut impl Rng) -> Self {
        let mut entries = [MagicEntry::default(); Square::COUNT];
        let mut attacks = Vec::new();

        for square in Square::iter() {
            let mask = occupancy_mask(square, directions);
            let occupancies: Vec<Bitboard> = mask.subsets().collect();
            let reference: Vec<Bitboard> = occupancies
                .iter()
                .map(|&blockers| slider_attacks(square, directions, blockers))
                .collect();

            let mut entry = MagicEntry {
                mask,
                magic: 0,
                shift: 64 - mask.population(),
                offset: attacks.len(),
            };
            attacks.resize(entry.offset + occupancies.len(), Bitboard::EMPTY_BOARD);

            // Tracks which attempt last wrote each slot, so slots don't need clearing between tries
            let mut written = vec![0u32; occupancies.len()];
            let mut attempt = 0u32;

            'search: loop {
                attempt += 1;
                entry.magic = sparse_random(rng);

                // Reject candidates that spread the mask over too few index bits
                let spread = (mask.inner().wrapping_mul(entry.magic) >> entry.shift).count_ones();
                if spread < mask.population() as u32 * 2 / 3 {
                    continue;
                }

                for (&blockers, &attack) in occupancies.iter().zip(&reference) {
                    let index = entry.index(blockers);
                    let local = index - entry.offset;
                    if written[local] != attempt {
                        written[local] = attempt;
                        attacks[index] = attack;
                    } else if attacks[index] != attack {
                        continue 'search;
                    }
                }

                break;
            }

            entries[square.index()] = entry;
        }

        Self { entries, attacks }
    }

    #[inline(always)]
    fn attacks(&self, square: Square, blockers: Bitboard) -> Bitboard {
        self.attacks[self.entries[square.index()].index(blockers)]
    }
}

/// Bishop and rook attack tables.
pub struct MagicTables {
    bishop: SliderTable,
    rook: SliderTable,
}

impl MagicTables {
    fn generate() -> Self {
        let mut rng = StdRng::from_entropy();
        let bishop = SliderTable::generate(Direction::DIAGONAL, &mut rng);
        let rook = SliderTable::generate(Direction::ORTHOGONAL, &mut rng);
        debug!(
            bishop_entries = bishop.attacks.len(),
            rook_entries = rook.attacks.len(),
            "magic tables initialized"
        );
        Self { bishop, rook }
    }
}

/// Builds the slider attack tables.
///
/// Lookups initialize the tables on demand, so calling this is only needed to pay the cost up
/// front. Fails if the tables already exist.
pub fn init() -> Result<()> {
    let mut initialized = false;
    MAGIC_TABLES.get_or_init(|| {
        initialized = true;
        MagicTables::generate()
    });

    if !initialized {
        bail!("Already initialized.");
    }
    Ok(())
}

#[inline(always)]
fn tables() -> &'static MagicTables {
    MAGIC_TABLES.get_or_init(MagicTables::generate)
}

/// Squares a bishop on `square` attacks, given `blockers`.
///
/// The first blocker in each direction is included, so captures can be masked from the result.
#[inline(always)]
pub fn bishop_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    tables().bishop.attacks(square, blockers)
}

/// Squares a rook on `square` attacks, given `blockers`.
///
/// The first blocker in each direction is included, so captures can be masked from the result.
#[inline(always)]
pub fn rook_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    tables().rook.attacks(square, blockers)
}

#[inline(always)]
pub fn queen_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    rook_attacks(square, blockers) | bishop_attacks(square, blockers)
}

/// The squares along `directions` from `square` whose occupancy matters, i.e. every ray square
/// except the last one before the edge.
fn occupancy_mask(square: Square, directions: [Direction; 4]) -> Bitboard {
    directions.into_iter().fold(Bitboard::EMPTY_BOARD, |mask, direction| {
        let ray = square.bitboard().ray(direction, Bitboard::EMPTY_BOARD);
        let inner = Bitboard::FULL_BOARD.shift(direction.opposite());
        mask | (ray & inner)
    })
}

/// Attacks computed by walking each ray until the first blocker.
fn slider_attacks(square: Square, directions: [Direction; 4], blockers: Bitboard) -> Bitboard {
    directions
        .into_iter()
        .fold(Bitboard::EMPTY_BOARD, |attacks, direction| {
            attacks | square.bitboard().ray(direction, blockers)
        })
}

/// A random `u64` with roughly an eighth of its bits set.
#[inline(always)]
fn sparse_random(rng: &mut impl Rng) -> u64 {
    rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_init_twice_fails() {
        // Another test may have already built the tables lazily
        let _ = init();
        let err = init().unwrap_err();
        assert_eq!(err.to_string(), "Already initialized.");
    }

    #[test]
    fn test_occupancy_masks() {
        let rook = occupancy_mask(Square::A1, Direction::ORTHOGONAL);
        assert_eq!(rook.population(), 12);
        assert!(!rook.intersects(Square::A8));
        assert!(!rook.intersects(Square::H1));

        let rook = occupancy_mask(Square::D4, Direction::ORTHOGONAL);
        assert_eq!(rook.population(), 10);

        let bishop = occupancy_mask(Square::D4, Direction::DIAGONAL);
        assert_eq!(bishop.population(), 9);
        assert!(!bishop.intersects(Bitboard::EDGES));
    }

    #[test]
    fn test_lookups_match_ray_casting() {
        for square in Square::iter() {
            for (directions, lookup) in [
                (Direction::DIAGONAL, bishop_attacks as fn(Square, Bitboard) -> Bitboard),
                (Direction::ORTHOGONAL, rook_attacks),
            ] {
                for blockers in occupancy_mask(square, directions).subsets() {
                    assert_eq!(
                        lookup(square, blockers),
                        slider_attacks(square, directions, blockers),
                        "{square} with blockers {blockers:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_blockers_outside_mask_are_ignored() {
        let blockers = Bitboard::from_square(Square::D6) | Square::H4 | Square::A1;
        assert_eq!(
            rook_attacks(Square::D4, blockers),
            Bitboard::from_square(Square::D5)
                | Square::D6
                | Square::D3
                | Square::D2
                | Square::D1
                | Square::E4
                | Square::F4
                | Square::G4
                | Square::H4
                | Square::C4
                | Square::B4
                | Square::A4
        );
        assert_eq!(queen_attacks(Square::A1, Bitboard::FULL_BOARD).population(), 3);
    }
}
