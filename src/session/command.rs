//! Typed decoding of inbound lines
//!
//! Parsing is context free. Whether a command means anything is decided by
//! the dispatcher from the session's state; a line the current state does
//! not accept is answered with "invalid option".

use crate::types::RoomId;

/// One decoded client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `1`
    ListClients,
    /// `2`
    Disconnect,
    /// `3` or `join`
    Join,
    /// `4`
    SetBio,
    /// `5`
    ViewBio,
    /// `6`
    ListRooms,
    /// `7`
    SendFriendRequest,
    /// `8`
    PendingFriendRequests,
    /// `9`
    TogglePrivacy,
    /// `10` or `list games`
    ListGames,
    /// `observe <room_id>`
    Observe(RoomId),
    /// `replay <filename>`
    Replay(String),
    /// `next`
    Next,
    /// `prev`
    Prev,
    /// `accept`
    Accept,
    /// `exit`
    Exit,
    /// `/<n>` with n other than -1
    Move(i64),
    /// `/-1`
    Forfeit,
    /// Anything else: a name, a bio, a chat line
    Text(String),
}

impl Command {
    /// Decode a trimmed line
    pub fn parse(line: &str) -> Command {
        match line {
            "1" => return Command::ListClients,
            "2" => return Command::Disconnect,
            "3" | "join" => return Command::Join,
            "4" => return Command::SetBio,
            "5" => return Command::ViewBio,
            "6" => return Command::ListRooms,
            "7" => return Command::SendFriendRequest,
            "8" => return Command::PendingFriendRequests,
            "9" => return Command::TogglePrivacy,
            "10" | "list games" => return Command::ListGames,
            "next" => return Command::Next,
            "prev" => return Command::Prev,
            "accept" => return Command::Accept,
            "exit" => return Command::Exit,
            _ => {}
        }

        if let Some(rest) = line.strip_prefix('/') {
            return match rest.trim().parse::<i64>() {
                Ok(-1) => Command::Forfeit,
                Ok(n) => Command::Move(n),
                Err(_) => Command::Text(line.to_string()),
            };
        }

        if let Some(arg) = line.strip_prefix("observe ") {
            if let Ok(room_id) = arg.trim().parse::<RoomId>() {
                return Command::Observe(room_id);
            }
        }

        if let Some(arg) = line.strip_prefix("replay ") {
            let file = arg.trim();
            if !file.is_empty() {
                return Command::Replay(file.to_string());
            }
        }

        Command::Text(line.to_string())
    }

    /// Commands that only make sense from the main menu
    pub fn is_lobby_command(&self) -> bool {
        matches!(
            self,
            Command::ListClients
                | Command::Disconnect
                | Command::Join
                | Command::SetBio
                | Command::ViewBio
                | Command::ListRooms
                | Command::SendFriendRequest
                | Command::PendingFriendRequests
                | Command::TogglePrivacy
                | Command::ListGames
                | Command::Observe(_)
                | Command::Replay(_)
        )
    }

    /// Original text of a free-text line, if this is one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Command::Text(text) => Some(text),
            _ => None,
        }
    }
}
