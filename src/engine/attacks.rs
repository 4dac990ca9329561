//! Attack model: which squares a piece threatens on a given board.
//!
//! The task only ever asks about *capture* threats, so the model reports a
//! square for king and knight (and pawn) only when an enemy piece actually
//! stands there; sliders additionally report the first occupant on each ray
//! when it is an enemy. [`reach`] is the board-independent companion used
//! while seeding a position: the candidate capture targets of a lone piece.
//!
//! Both functions are pure and deterministic — identical inputs always yield
//! identical output, in a fixed walk order (direction table order, then ray
//! distance).

use crate::engine::board::Board;
use crate::engine::types::{Color, PieceType, Square};

// =========================================================================
// Direction tables
// =========================================================================

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const ROOK_DELTAS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DELTAS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const QUEEN_DELTAS: [(i8, i8); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Pawn capture deltas: white pawns threaten one rank up (row − 1),
/// black pawns one rank down (row + 1).
fn pawn_deltas(color: Color) -> [(i8, i8); 2] {
    match color {
        Color::White => [(-1, -1), (-1, 1)],
        Color::Black => [(1, -1), (1, 1)],
    }
}

// =========================================================================
// Public API
// =========================================================================

/// Squares the given piece threatens for capture from `origin` on `board`.
///
/// King/knight/pawn: a candidate square counts only if occupied by an enemy
/// piece. Sliders: each ray stops at the first occupant regardless of color;
/// that occupant's square is included when it is an enemy.
pub fn attacked_squares(
    board: &Board,
    color: Color,
    piece_type: PieceType,
    origin: Square,
) -> Vec<Square> {
    let mut attacked = Vec::new();
    match piece_type {
        PieceType::King => leaper_captures(board, color, origin, &KING_OFFSETS, &mut attacked),
        PieceType::Knight => leaper_captures(board, color, origin, &KNIGHT_OFFSETS, &mut attacked),
        PieceType::Pawn => leaper_captures(board, color, origin, &pawn_deltas(color), &mut attacked),
        PieceType::Rook => slider_captures(board, color, origin, &ROOK_DELTAS, &mut attacked),
        PieceType::Bishop => slider_captures(board, color, origin, &BISHOP_DELTAS, &mut attacked),
        PieceType::Queen => slider_captures(board, color, origin, &QUEEN_DELTAS, &mut attacked),
    }
    attacked
}

/// Candidate capture targets of a lone piece on an otherwise empty board.
///
/// Sliders yield every square along each ray to the board edge; king/knight
/// their in-bounds offsets; pawns their two forward diagonals. Used when
/// seeding a generated position, before any defender exists.
pub fn reach(color: Color, piece_type: PieceType, origin: Square) -> Vec<Square> {
    let mut squares = Vec::new();
    match piece_type {
        PieceType::King => leaper_targets(origin, &KING_OFFSETS, &mut squares),
        PieceType::Knight => leaper_targets(origin, &KNIGHT_OFFSETS, &mut squares),
        PieceType::Pawn => leaper_targets(origin, &pawn_deltas(color), &mut squares),
        PieceType::Rook => ray_targets(origin, &ROOK_DELTAS, &mut squares),
        PieceType::Bishop => ray_targets(origin, &BISHOP_DELTAS, &mut squares),
        PieceType::Queen => ray_targets(origin, &QUEEN_DELTAS, &mut squares),
    }
    squares
}

// =========================================================================
// Walkers
// =========================================================================

fn leaper_captures(
    board: &Board,
    color: Color,
    origin: Square,
    offsets: &[(i8, i8)],
    out: &mut Vec<Square>,
) {
    for &(dr, dc) in offsets {
        if let Some(target) = origin.offset(dr, dc) {
            if let Some(occupant) = board.piece_at(target) {
                if occupant.color != color {
                    out.push(target);
                }
            }
        }
    }
}

fn slider_captures(
    board: &Board,
    color: Color,
    origin: Square,
    deltas: &[(i8, i8)],
    out: &mut Vec<Square>,
) {
    for &(dr, dc) in deltas {
        let mut current = origin;
        while let Some(next) = current.offset(dr, dc) {
            if let Some(occupant) = board.piece_at(next) {
                if occupant.color != color {
                    out.push(next);
                }
                break; // any occupant terminates the ray
            }
            current = next;
        }
    }
}

fn leaper_targets(origin: Square, offsets: &[(i8, i8)], out: &mut Vec<Square>) {
    for &(dr, dc) in offsets {
        if let Some(target) = origin.offset(dr, dc) {
            out.push(target);
        }
    }
}

fn ray_targets(origin: Square, deltas: &[(i8, i8)], out: &mut Vec<Square>) {
    for &(dr, dc) in deltas {
        let mut current = origin;
        while let Some(next) = current.offset(dr, dc) {
            out.push(next);
            current = next;
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
