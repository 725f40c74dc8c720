//! Pair sessions: partner links, color assignment and turn ownership
//!
//! Each paired connection owns a [`Seat`]. Both seats of a pair are created
//! and destroyed together, so partner links stay symmetric, colors stay
//! opposite and exactly one seat holds the move.

use crate::error::ProtocolError;
use crate::matchmaking::Pairing;
use crate::registry::ConnId;
use shared::Color;
use std::collections::HashMap;

/// One side of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seat {
    pub partner: ConnId,
    pub color: Color,
    /// Whether this side owns the next move
    pub my_turn: bool,
}

#[derive(Debug, Default)]
pub struct Sessions {
    seats: HashMap<ConnId, Seat>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats both sides of a pairing. White moves first.
    ///
    /// Returns false and changes nothing if either side is already seated.
    pub fn pair(&mut self, pairing: Pairing) -> bool {
        let Pairing { white, black } = pairing;
        if white == black || self.is_paired(white) || self.is_paired(black) {
            return false;
        }

        self.seats.insert(
            white,
            Seat {
                partner: black,
                color: Color::White,
                my_turn: true,
            },
        );
        self.seats.insert(
            black,
            Seat {
                partner: white,
                color: Color::Black,
                my_turn: false,
            },
        );
        true
    }

    pub fn seat(&self, id: ConnId) -> Option<&Seat> {
        self.seats.get(&id)
    }

    pub fn partner(&self, id: ConnId) -> Option<ConnId> {
        self.seats.get(&id).map(|seat| seat.partner)
    }

    pub fn is_paired(&self, id: ConnId) -> bool {
        self.seats.contains_key(&id)
    }

    /// True if `a` and `b` are currently seated against each other
    pub fn are_partners(&self, a: ConnId, b: ConnId) -> bool {
        self.partner(a) == Some(b) && self.partner(b) == Some(a)
    }

    /// Accepts a move from `id` if it owns the turn, handing the turn over.
    ///
    /// Returns the partner the move should be forwarded to.
    pub fn take_turn(&mut self, id: ConnId) -> Result<ConnId, ProtocolError> {
        let seat = self.seats.get(&id).ok_or(ProtocolError::NoPartner)?;
        if !seat.my_turn {
            return Err(ProtocolError::NotYourTurn);
        }
        let partner = seat.partner;

        if let Some(seat) = self.seats.get_mut(&id) {
            seat.my_turn = false;
        }
        if let Some(seat) = self.seats.get_mut(&partner) {
            seat.my_turn = true;
        }
        Ok(partner)
    }

    /// Dissolves the pair `id` belongs to, returning the former partner
    pub fn unpair(&mut self, id: ConnId) -> Option<ConnId> {
        let seat = self.seats.remove(&id)?;
        self.seats.remove(&seat.partner);
        Some(seat.partner)
    }

    /// Number of seated connections (twice the number of pairs)
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn clear(&mut self) {
        self.seats.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ConnId = ConnId(1);
    const B: ConnId = ConnId(2);
    const C: ConnId = ConnId(3);

    fn paired() -> Sessions {
        let mut sessions = Sessions::new();
        assert!(sessions.pair(Pairing { white: A, black: B }));
        sessions
    }

    fn turn_owners(sessions: &Sessions) -> usize {
        [A, B]
            .iter()
            .filter(|id| sessions.seat(**id).map_or(false, |s| s.my_turn))
            .count()
    }

    #[test]
    fn test_pair_is_symmetric_with_opposite_colors() {
        let sessions = paired();
        let white = sessions.seat(A).unwrap();
        let black = sessions.seat(B).unwrap();

        assert_eq!(white.partner, B);
        assert_eq!(black.partner, A);
        assert_eq!(white.color, black.color.opposite());
        assert!(white.my_turn);
        assert!(!black.my_turn);
        assert!(sessions.are_partners(A, B));
    }

    #[test]
    fn test_pair_refuses_seated_connections() {
        let mut sessions = paired();
        assert!(!sessions.pair(Pairing { white: C, black: A }));
        assert!(!sessions.pair(Pairing { white: C, black: C }));
        assert_eq!(sessions.len(), 2);
        assert!(!sessions.is_paired(C));
    }

    #[test]
    fn test_turn_alternates() {
        let mut sessions = paired();

        assert_eq!(sessions.take_turn(A), Ok(B));
        assert_eq!(turn_owners(&sessions), 1);
        assert!(sessions.seat(B).unwrap().my_turn);

        assert_eq!(sessions.take_turn(B), Ok(A));
        assert_eq!(turn_owners(&sessions), 1);
        assert!(sessions.seat(A).unwrap().my_turn);
    }

    #[test]
    fn test_out_of_turn_move_changes_nothing() {
        let mut sessions = paired();

        assert_eq!(sessions.take_turn(B), Err(ProtocolError::NotYourTurn));
        assert!(sessions.seat(A).unwrap().my_turn);
        assert!(!sessions.seat(B).unwrap().my_turn);
    }

    #[test]
    fn test_move_without_partner() {
        let mut sessions = Sessions::new();
        assert_eq!(sessions.take_turn(A), Err(ProtocolError::NoPartner));
    }

    #[test]
    fn test_unpair_clears_both_sides() {
        let mut sessions = paired();

        assert_eq!(sessions.unpair(B), Some(A));
        assert!(sessions.seat(A).is_none());
        assert!(sessions.seat(B).is_none());
        assert!(sessions.is_empty());
        assert_eq!(sessions.unpair(A), None);
    }
}
