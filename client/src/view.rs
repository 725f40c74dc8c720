//! The client's local picture of its game, built from server frames

use shared::{
    Color, ServerFrame, LEFT_GAME, PARTNER_LEFT, TAG_DRAW_ACCEPT, TAG_DRAW_DECLINE, TAG_DRAW_OFFER,
    YOUR_TURN,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchView {
    /// Assigned color while in a game
    pub color: Option<Color>,
    pub my_turn: bool,
    pub clock_running: bool,
    /// Moves played so far, both sides, in order
    pub moves: Vec<String>,
    /// Own move sent but not yet accepted by the server
    pending_move: Option<String>,
}

impl MatchView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_game(&self) -> bool {
        self.color.is_some()
    }

    /// Updates the view from one frame and returns the line to show the user.
    ///
    /// The server relays chat verbatim, so an opponent can type text that
    /// decodes as an `{info}` or `{turn}` frame. The view trusts what it is
    /// given; it only ever affects this client's display.
    pub fn apply(&mut self, frame: &ServerFrame) -> String {
        match frame {
            ServerFrame::Info(text) => {
                if let Some(color) = Color::from_assignment_text(text) {
                    self.reset();
                    self.color = Some(color);
                } else if text == PARTNER_LEFT || text == LEFT_GAME {
                    self.reset();
                }
                format!("System: {}", text)
            }
            ServerFrame::Turn(text) => {
                self.my_turn = text.starts_with(YOUR_TURN);
                // The turn passing to the opponent confirms our move
                if !self.my_turn {
                    if let Some(payload) = self.pending_move.take() {
                        self.moves.push(payload);
                    }
                }
                format!("System: {}", text)
            }
            ServerFrame::Error(text) => {
                self.pending_move = None;
                format!("Error: {}", text)
            }
            ServerFrame::StartClock => {
                self.clock_running = true;
                "System: Clocks started.".to_string()
            }
            ServerFrame::QuitAck => "Disconnected.".to_string(),
            ServerFrame::Move(payload) => {
                self.moves.push(payload.clone());
                format!("Opponent played {}", payload)
            }
            ServerFrame::Relay(text) => match text.as_str() {
                TAG_DRAW_OFFER => "Opponent offers a draw (/accept or /decline).".to_string(),
                TAG_DRAW_ACCEPT => "Opponent accepted the draw.".to_string(),
                TAG_DRAW_DECLINE => "Opponent declined the draw.".to_string(),
                _ => format!("Opponent: {}", text),
            },
        }
    }

    /// Remembers a move this client sent until the server rules on it
    pub fn propose_move(&mut self, payload: &str) {
        self.pending_move = Some(payload.to_string());
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_assignment() {
        let mut view = MatchView::new();
        let line = view.apply(&ServerFrame::info(Color::Black.assignment_text()));

        assert_eq!(view.color, Some(Color::Black));
        assert!(view.in_game());
        assert_eq!(line, "System: You are playing as black.");
    }

    #[test]
    fn test_turn_tracking() {
        let mut view = MatchView::new();
        view.apply(&ServerFrame::turn(true));
        assert!(view.my_turn);
        view.apply(&ServerFrame::turn(false));
        assert!(!view.my_turn);
    }

    #[test]
    fn test_moves_are_recorded_once_accepted() {
        let mut view = MatchView::new();
        view.propose_move("e2e4");
        assert!(view.moves.is_empty());

        view.apply(&ServerFrame::turn(false));
        let line = view.apply(&ServerFrame::Move("e7e5".to_string()));

        assert_eq!(view.moves, vec!["e2e4", "e7e5"]);
        assert_eq!(line, "Opponent played e7e5");
    }

    #[test]
    fn test_rejected_move_is_not_recorded() {
        let mut view = MatchView::new();
        view.apply(&ServerFrame::info(Color::Black.assignment_text()));
        view.apply(&ServerFrame::turn(false));

        view.propose_move("e7e5");
        view.apply(&ServerFrame::Error("Not your turn to move.".to_string()));
        assert!(view.moves.is_empty());

        // A later turn notice does not resurrect it
        view.apply(&ServerFrame::turn(false));
        assert!(view.moves.is_empty());
    }

    #[test]
    fn test_partner_left_resets_view() {
        let mut view = MatchView::new();
        view.apply(&ServerFrame::info(Color::White.assignment_text()));
        view.apply(&ServerFrame::turn(true));
        view.apply(&ServerFrame::StartClock);

        view.apply(&ServerFrame::info(PARTNER_LEFT));
        assert_eq!(view, MatchView::new());
    }

    #[test]
    fn test_relay_lines() {
        let mut view = MatchView::new();
        assert_eq!(
            view.apply(&ServerFrame::Relay("hello".to_string())),
            "Opponent: hello"
        );
        assert!(view
            .apply(&ServerFrame::Relay(TAG_DRAW_OFFER.to_string()))
            .contains("offers a draw"));
        assert_eq!(
            view.apply(&ServerFrame::Error("Not your turn to move.".to_string())),
            "Error: Not your turn to move."
        );
    }
}
