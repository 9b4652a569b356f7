//! Text sent to clients

use crate::game::{render_with_names, Board};
use crate::types::{GameOutcome, RoomPrivacy, Seat};

pub const INVALID_OPTION: &str = "Invalid option. Choose again.";
pub const CANCELLED: &str = "Cancelled.";
pub const DISCONNECTING: &str = "Disconnecting...";
pub const SHUTTING_DOWN: &str = "Server is shutting down. Goodbye!";
pub const SERVER_FULL: &str = "Server is full, try again later.";
pub const YOUR_TURN: &str = "Your turn! Use /1 to /6 to move or /-1 to leave.";
pub const NAME_RULES: &str =
    "Names are 1 to 31 printable characters without spaces, '|', ',' or '/', \
     and cannot be exit, accept, next, prev or join.";

/// Main menu, showing the current privacy preference
pub fn menu(privacy: RoomPrivacy) -> String {
    format!(
        "Options:\n\
         1. Show list of connected clients\n\
         2. Disconnect\n\
         3. Join Game\n\
         4. Set/Update Bio\n\
         5. View Player Bio\n\
         6. List ongoing games\n\
         7. Send a friend request\n\
         8. Friends and friend requests\n\
         9. Toggle game privacy (now {privacy})\n\
         10. List recorded games\n\
         To observe a game, type 'observe <room_id>'\n\
         To replay a recorded game, type 'replay <file>'"
    )
}

pub fn welcome(name: &str, elo: i32) -> String {
    format!("Welcome, {name}! Your rating is {elo}.")
}

/// Bulleted list under a title, or the fallback line when empty
pub fn listing(title: &str, entries: &[String], empty: &str) -> String {
    if entries.is_empty() {
        return format!("{title}\n{empty}");
    }
    let mut out = String::from(title);
    for entry in entries {
        out.push_str("\n  ");
        out.push_str(entry);
    }
    out
}

pub fn duel_challenge(challenger: &str, room_id: usize) -> String {
    format!(
        "{challenger} has challenged you to a duel in room {room_id}! \
         Type 'accept' to play or 'exit' to decline."
    )
}

pub fn duel_sent(target: &str) -> String {
    format!("Duel request sent to {target}. Waiting for acceptance... (type 'exit' to cancel)")
}

pub fn game_started(room_id: usize, names: [&str; 2]) -> String {
    format!(
        "Awalé game started in room {room_id} between {} and {}. {} goes first.\n\
         Use /1 to /6 to move or /-1 to leave. Anything else is sent as chat.",
        names[0], names[1], names[0]
    )
}

pub fn board_view(board: &Board, names: [&str; 2]) -> String {
    render_with_names(board, names)
}

pub fn move_played(name: &str, pit: i64, captured: u32) -> String {
    if captured > 0 {
        format!("{name} played /{pit} and captured {captured} seeds.")
    } else {
        format!("{name} played /{pit}.")
    }
}

pub fn turn_of(name: &str) -> String {
    format!("It's now {name}'s turn.")
}

pub fn chat(name: &str, text: &str) -> String {
    format!("{name}: {text}")
}

/// Announcement of a finished game
pub fn game_result(outcome: &GameOutcome, names: [&str; 2], scores: [u32; 2]) -> String {
    let name = |seat: Seat| names[seat.index()];
    match outcome {
        GameOutcome::Victory { winner } => format!(
            "Player {} wins! Final score: {} {} - {} {}",
            name(*winner),
            names[0],
            scores[0],
            scores[1],
            names[1]
        ),
        GameOutcome::Forfeit { loser } => format!(
            "Player {} left the game. {} wins!",
            name(*loser),
            name(loser.opponent())
        ),
        GameOutcome::Draw => format!(
            "The game ends in a draw: {} {} - {} {}",
            names[0], scores[0], scores[1], names[1]
        ),
    }
}

pub fn rating_update(elo: i32, delta: i32) -> String {
    format!("Your rating is now {elo} ({delta:+}).")
}

pub fn observing(room_id: usize, names: [&str; 2]) -> String {
    format!(
        "You are now observing room {room_id}: {} vs {}. Type 'exit' to leave.",
        names[0], names[1]
    )
}

pub fn room_entry(
    room_id: usize,
    names: [&str; 2],
    observers: usize,
    moves: u32,
    privacy: RoomPrivacy,
) -> String {
    format!(
        "Room {room_id} | {} vs {} | observers: {observers} | moves: {moves} | {privacy}",
        names[0], names[1]
    )
}

pub fn replay_block(file: &str, position: usize, block: &str) -> String {
    format!("[{file} #{}]\n{block}", position + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing() {
        assert_eq!(listing("Players:", &[], "Nobody."), "Players:\nNobody.");
        assert_eq!(
            listing("Players:", &["alice".to_string(), "bob".to_string()], "Nobody."),
            "Players:\n  alice\n  bob"
        );
    }

    #[test]
    fn test_game_result_texts() {
        let names = ["alice", "bob"];
        assert_eq!(
            game_result(&GameOutcome::Forfeit { loser: Seat::Second }, names, [0, 0]),
            "Player bob left the game. alice wins!"
        );
        assert!(game_result(
            &GameOutcome::Victory {
                winner: Seat::Second
            },
            names,
            [10, 25]
        )
        .starts_with("Player bob wins!"));
        assert_eq!(rating_update(970, -30), "Your rating is now 970 (-30).");
        assert_eq!(rating_update(1030, 30), "Your rating is now 1030 (+30).");
    }

    #[test]
    fn test_menu_shows_privacy() {
        assert!(menu(RoomPrivacy::FriendsOnly).contains("(now friends-only)"));
    }
}
