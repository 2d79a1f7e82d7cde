//! 8x8 mailbox of optional pieces, indexed `[rank][file]`.

use crate::game_state::chess_types::{Color, Piece, PieceKind, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    #[inline]
    pub const fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
        }
    }

    pub fn starting_position() -> Self {
        let mut board = Self::empty();
        for color in [Color::White, Color::Black] {
            for (file, kind) in BACK_RANK.iter().enumerate() {
                board.squares[color.back_rank() as usize][file] = Some(Piece::new(*kind, color));
                board.squares[color.pawn_home_rank() as usize][file] =
                    Some(Piece::new(PieceKind::Pawn, color));
            }
        }
        board
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.rank() as usize][square.file() as usize]
    }

    #[inline]
    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.rank() as usize][square.file() as usize] = piece;
    }

    /// Remove and return whatever stands on `square`.
    #[inline]
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        self.squares[square.rank() as usize][square.file() as usize].take()
    }

    #[inline]
    pub fn is_empty(&self, square: Square) -> bool {
        self.piece_at(square).is_none()
    }

    #[inline]
    pub fn is_color(&self, square: Square, color: Color) -> bool {
        matches!(self.piece_at(square), Some(p) if p.color == color)
    }

    /// Occupied squares with their pieces, in scan order.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.occupied().filter(move |(_, p)| p.color == color)
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of(color)
            .find(|(_, p)| p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    pub fn occupancy(&self) -> u64 {
        self.occupied().fold(0u64, |acc, (sq, _)| acc | sq.mask())
    }

    pub fn occupancy_of(&self, color: Color) -> u64 {
        self.pieces_of(color).fold(0u64, |acc, (sq, _)| acc | sq.mask())
    }

    /// Presence grid as a sensor array would report it for this board.
    pub fn presence(&self) -> [[bool; 8]; 8] {
        let mut grid = [[false; 8]; 8];
        for (rank, row) in self.squares.iter().enumerate() {
            for (file, cell) in row.iter().enumerate() {
                grid[rank][file] = cell.is_some();
            }
        }
        grid
    }
}
