//! Procedural construction of trial positions.
//!
//! Generation is rejection sampling: pieces are placed at random and any
//! placement that breaks an invariant is thrown away and retried. Guarantees
//! are enforced post-hoc rather than constructively, which keeps the sampler
//! simple and the accepted-position distribution uniform over valid layouts;
//! the board is 64 squares with at most 12 pieces, so retries are cheap.
//! Every loop is bounded — a sampler that cannot produce a valid position
//! within [`MAX_POSITION_ATTEMPTS`] restarts reports
//! [`EngineError::GenerationExhausted`] instead of recursing forever.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::attacks;
use crate::engine::board::Board;
use crate::engine::types::{Color, Difficulty, EngineError, Piece, PieceType, Square};

/// Whole-position restarts before generation gives up. Unreachable in
/// practice for the shipped difficulty ranges.
pub const MAX_POSITION_ATTEMPTS: usize = 256;

/// Attacker placements tried within one position attempt.
const ATTACKER_PLACEMENT_BUDGET: usize = 64;

/// Consecutive failed filler placements tolerated before the position
/// attempt is discarded.
const FILL_ATTEMPT_BUDGET: usize = 100;

// =========================================================================
// Position
// =========================================================================

/// A generated trial position: a board, the single designated attacker, and
/// the squares it threatens.
///
/// Invariants (upheld by [`generate`], checked by the test suite):
/// - the attacker occupies `attacker_square` on `board`;
/// - `attacked_squares` is exactly the set of enemy-occupied squares the
///   attacker threatens on the final board, and is non-empty;
/// - no (color, piece type) pair occurs twice;
/// - no pawn stands on rank 1 or 8;
/// - the two kings, when both present, are never adjacent;
/// - total piece count lies in the difficulty's range.
#[derive(Clone, Debug)]
pub struct Position {
    pub board: Board,
    pub attacker: Piece,
    pub attacker_square: Square,
    pub attacked_squares: Vec<Square>,
}

impl Position {
    /// Whether a response square is a correct answer for this position.
    #[inline]
    pub fn is_attacked(&self, sq: Square) -> bool {
        self.attacked_squares.contains(&sq)
    }

    /// The attacked squares in algebraic notation, semicolon-joined, in
    /// threat-walk order — the form trial records carry.
    pub fn attacked_algebraic(&self) -> String {
        self.attacked_squares
            .iter()
            .map(|sq| sq.to_algebraic())
            .collect::<Vec<_>>()
            .join(";")
    }
}

// =========================================================================
// Generation
// =========================================================================

/// Generate a position for the given difficulty.
///
/// Convenience wrapper over [`generate_with`] using the thread RNG.
pub fn generate(difficulty: Difficulty) -> Result<Position, EngineError> {
    generate_with(difficulty, &mut rand::thread_rng())
}

/// Generate a position using the supplied RNG (seedable for tests).
pub fn generate_with<R: Rng>(difficulty: Difficulty, rng: &mut R) -> Result<Position, EngineError> {
    for attempt in 0..MAX_POSITION_ATTEMPTS {
        if let Some(position) = try_generate(difficulty, rng) {
            if attempt > 0 {
                tracing::debug!(attempt, %difficulty, "position accepted after restarts");
            }
            return Ok(position);
        }
    }
    Err(EngineError::GenerationExhausted {
        difficulty,
        attempts: MAX_POSITION_ATTEMPTS,
    })
}

/// One full position attempt; `None` means discard and restart.
fn try_generate<R: Rng>(difficulty: Difficulty, rng: &mut R) -> Option<Position> {
    let (min_pieces, max_pieces) = difficulty.piece_range();
    let target = rng.gen_range(min_pieces..=max_pieces);

    let mut board = Board::new();
    // Which piece types each color has already used; each side fields each
    // type at most once per position.
    let mut used = [[false; PieceType::COUNT]; 2];

    let attacker_color = if rng.gen_bool(0.5) {
        Color::White
    } else {
        Color::Black
    };
    let attacker_type = *PieceType::ALL.choose(rng).expect("non-empty");
    let attacker = Piece::new(attacker_color, attacker_type);
    used[attacker_color.index()][attacker_type.index()] = true;

    let attacker_square = place_attacker_and_seed(&mut board, attacker, &mut used, rng)?;

    if !fill_board(&mut board, &mut used, target, rng) {
        return None;
    }

    // Recompute the threat set over the finished board: filler pieces may
    // have both created new threats on the attacker's lines and blocked the
    // ray to the seeded defender.
    let attacked_squares =
        attacks::attacked_squares(&board, attacker_color, attacker_type, attacker_square);
    if attacked_squares.is_empty() {
        return None;
    }

    Some(Position {
        board,
        attacker,
        attacker_square,
        attacked_squares,
    })
}

/// Place the attacker and one guaranteed defender on its reach.
///
/// Returns the attacker's square, or `None` when the placement budget runs
/// out (caller restarts the whole position).
fn place_attacker_and_seed<R: Rng>(
    board: &mut Board,
    attacker: Piece,
    used: &mut [[bool; PieceType::COUNT]; 2],
    rng: &mut R,
) -> Option<Square> {
    let defender_color = !attacker.color;

    for _ in 0..ATTACKER_PLACEMENT_BUDGET {
        let attacker_square = random_square(attacker.piece_type, rng);
        let targets = attacks::reach(attacker.color, attacker.piece_type, attacker_square);
        if targets.is_empty() {
            continue;
        }

        let seed_square = *targets.choose(rng).expect("non-empty");
        let Some(defender_type) = random_unused_type(used, defender_color, rng) else {
            continue;
        };
        // Pawns never stand on a back rank.
        if defender_type == PieceType::Pawn && seed_square.is_back_rank() {
            continue;
        }

        board.place(attacker_square, attacker);
        board.place(seed_square, Piece::new(defender_color, defender_type));

        // A king seeded next to a king attacker would violate the adjacency
        // invariant before filling even starts.
        if board.kings_adjacent() {
            board.remove(attacker_square);
            board.remove(seed_square);
            continue;
        }

        used[defender_color.index()][defender_type.index()] = true;
        return Some(attacker_square);
    }
    None
}

/// Fill the board up to `target` pieces. Returns false when the budget of
/// consecutive failed placements is exhausted first.
fn fill_board<R: Rng>(
    board: &mut Board,
    used: &mut [[bool; PieceType::COUNT]; 2],
    target: usize,
    rng: &mut R,
) -> bool {
    let mut placed = board.piece_count();
    let mut failures = 0;

    while placed < target {
        if failures >= FILL_ATTEMPT_BUDGET {
            return false;
        }

        let color = if rng.gen_bool(0.5) {
            Color::White
        } else {
            Color::Black
        };
        let Some(piece_type) = random_unused_type(used, color, rng) else {
            failures += 1;
            continue;
        };

        let square = random_square(piece_type, rng);
        if !board.is_empty_at(square) {
            failures += 1;
            continue;
        }

        let piece = Piece::new(color, piece_type);
        board.place(square, piece);
        if board.kings_adjacent() {
            board.remove(square);
            failures += 1;
            continue;
        }

        used[color.index()][piece_type.index()] = true;
        placed += 1;
        failures = 0;
    }
    true
}

/// A uniform square, restricted to rows 1–6 for pawns (ranks 2–7).
fn random_square<R: Rng>(piece_type: PieceType, rng: &mut R) -> Square {
    let row = if piece_type == PieceType::Pawn {
        rng.gen_range(1..7)
    } else {
        rng.gen_range(0..8)
    };
    Square::new(row, rng.gen_range(0..8))
}

/// A uniform piece type the color has not used yet, if any remain.
fn random_unused_type<R: Rng>(
    used: &[[bool; PieceType::COUNT]; 2],
    color: Color,
    rng: &mut R,
) -> Option<PieceType> {
    let available: Vec<PieceType> = PieceType::ALL
        .into_iter()
        .filter(|pt| !used[color.index()][pt.index()])
        .collect();
    available.choose(rng).copied()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ALL_DIFFICULTIES: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::VeryHard,
    ];

    #[test]
    fn generates_for_every_difficulty() {
        let mut rng = StdRng::seed_from_u64(7);
        for difficulty in ALL_DIFFICULTIES {
            let position = generate_with(difficulty, &mut rng).unwrap();
            let (min, max) = difficulty.piece_range();
            let count = position.board.piece_count();
            assert!(
                (min..=max).contains(&count),
                "{difficulty}: {count} pieces outside [{min},{max}]"
            );
        }
    }

    #[test]
    fn attacker_occupies_its_square() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let position = generate_with(Difficulty::Medium, &mut rng).unwrap();
            assert_eq!(
                position.board.piece_at(position.attacker_square),
                Some(position.attacker)
            );
        }
    }

    #[test]
    fn attacked_squares_are_enemy_occupied_and_nonempty() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..50 {
            let position = generate_with(Difficulty::Hard, &mut rng).unwrap();
            assert!(!position.attacked_squares.is_empty());
            for &sq in &position.attacked_squares {
                let occupant = position.board.piece_at(sq).expect("attacked square occupied");
                assert_ne!(occupant.color, position.attacker.color);
            }
        }
    }

    #[test]
    fn attacked_set_matches_recomputation() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..50 {
            let position = generate_with(Difficulty::Medium, &mut rng).unwrap();
            let recomputed = attacks::attacked_squares(
                &position.board,
                position.attacker.color,
                position.attacker.piece_type,
                position.attacker_square,
            );
            assert_eq!(position.attacked_squares, recomputed);
        }
    }

    #[test]
    fn no_duplicate_color_type_pairs() {
        let mut rng = StdRng::seed_from_u64(19);
        for _ in 0..50 {
            let position = generate_with(Difficulty::VeryHard, &mut rng).unwrap();
            let mut seen = [[false; PieceType::COUNT]; 2];
            for (_, piece) in position.board.pieces() {
                let slot = &mut seen[piece.color.index()][piece.piece_type.index()];
                assert!(!*slot, "duplicate {piece}");
                *slot = true;
            }
        }
    }

    #[test]
    fn no_pawn_on_back_ranks() {
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..100 {
            let position = generate_with(Difficulty::VeryHard, &mut rng).unwrap();
            for (sq, piece) in position.board.pieces() {
                if piece.piece_type == PieceType::Pawn {
                    assert!(!sq.is_back_rank(), "pawn on {sq}");
                }
            }
        }
    }

    #[test]
    fn kings_never_adjacent() {
        let mut rng = StdRng::seed_from_u64(29);
        for _ in 0..100 {
            let position = generate_with(Difficulty::VeryHard, &mut rng).unwrap();
            assert!(!position.board.kings_adjacent());
        }
    }

    #[test]
    fn is_attacked_reflects_set_membership() {
        let mut rng = StdRng::seed_from_u64(31);
        let position = generate_with(Difficulty::Easy, &mut rng).unwrap();
        let hit = position.attacked_squares[0];
        assert!(position.is_attacked(hit));

        // Some square outside the set must exist (the attacker's own square
        // can never be in it).
        assert!(!position.is_attacked(position.attacker_square));
    }

    #[test]
    fn attacked_algebraic_joins_with_semicolons() {
        let mut rng = StdRng::seed_from_u64(37);
        let position = generate_with(Difficulty::Medium, &mut rng).unwrap();
        let joined = position.attacked_algebraic();
        assert_eq!(
            joined.split(';').count(),
            position.attacked_squares.len()
        );
        for part in joined.split(';') {
            assert!(Square::from_algebraic(part).is_some(), "bad token {part}");
        }
    }
}
