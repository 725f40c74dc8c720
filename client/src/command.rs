//! Translation of typed lines into protocol frames

use shared::{ClientFrame, TAG_DRAW_ACCEPT, TAG_DRAW_DECLINE, TAG_DRAW_OFFER};

pub const HELP: &str = "\
Commands:
  /play          join the queue for a game
  /leave         leave the current game or queue
  /move <uci>    play a move, e.g. /move e2e4
  /draw          offer a draw
  /accept        accept a draw offer
  /decline       decline a draw offer
  /quit          disconnect
Anything else is sent to your opponent as chat.";

/// What a typed line asks the client to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(ClientFrame),
    Help,
    /// Recognized command with bad arguments; carries a usage hint
    Invalid(&'static str),
}

/// Parses one line of user input. Blank lines yield `None`.
pub fn parse_input(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.starts_with('{') {
        // The opponent's client would read it as a tagged frame
        return Some(Command::Invalid("chat cannot start with '{'"));
    }
    if !line.starts_with('/') {
        return Some(Command::Send(ClientFrame::Chat(line.to_string())));
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name {
        "/play" => Command::Send(ClientFrame::EnterGame),
        "/leave" => Command::Send(ClientFrame::QuitGame),
        "/quit" => Command::Send(ClientFrame::Quit),
        "/move" if rest.is_empty() => Command::Invalid("usage: /move <uci>"),
        "/move" => Command::Send(ClientFrame::Move(rest.to_string())),
        "/draw" => Command::Send(ClientFrame::Chat(TAG_DRAW_OFFER.to_string())),
        "/accept" => Command::Send(ClientFrame::Chat(TAG_DRAW_ACCEPT.to_string())),
        "/decline" => Command::Send(ClientFrame::Chat(TAG_DRAW_DECLINE.to_string())),
        "/help" => Command::Help,
        _ => Command::Invalid("unknown command, try /help"),
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input() {
        assert_eq!(parse_input(""), None);
        assert_eq!(parse_input("   "), None);
    }

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(
            parse_input("good game"),
            Some(Command::Send(ClientFrame::Chat("good game".to_string())))
        );
    }

    #[test]
    fn test_game_commands() {
        assert_eq!(
            parse_input("/play"),
            Some(Command::Send(ClientFrame::EnterGame))
        );
        assert_eq!(
            parse_input("/leave"),
            Some(Command::Send(ClientFrame::QuitGame))
        );
        assert_eq!(parse_input("/quit"), Some(Command::Send(ClientFrame::Quit)));
        assert_eq!(parse_input("/help"), Some(Command::Help));
    }

    #[test]
    fn test_move_command() {
        assert_eq!(
            parse_input("/move  e2e4 "),
            Some(Command::Send(ClientFrame::Move("e2e4".to_string())))
        );
        assert!(matches!(parse_input("/move"), Some(Command::Invalid(_))));
    }

    #[test]
    fn test_draw_commands_encode_control_tags() {
        let frame = match parse_input("/draw") {
            Some(Command::Send(frame)) => frame,
            other => panic!("Unexpected command {:?}", other),
        };
        assert_eq!(frame.encode(), "{draw_offer}");
    }

    #[test]
    fn test_tag_like_chat_is_refused() {
        assert!(matches!(
            parse_input("{turn}Your turn to move."),
            Some(Command::Invalid(_))
        ));
        assert!(matches!(parse_input("{move}e2e4"), Some(Command::Invalid(_))));
        assert_eq!(
            parse_input("gg {wp}"),
            Some(Command::Send(ClientFrame::Chat("gg {wp}".to_string())))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(parse_input("/castle"), Some(Command::Invalid(_))));
    }
}
