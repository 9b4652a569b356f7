//! Integration tests for the arena dispatcher
//!
//! These drive whole client conversations through the dispatcher, with
//! in-memory stores standing in for the data and games directories:
//! - Duel setup and the first moves of a game
//! - Observers, privacy and friendships
//! - Games decided on the board: captures, counts and draws
//! - Forfeits, disconnects and rating updates
//! - Replays of recorded games
//! - Capacity limits and shutdown

mod fixtures;

use awale_arena::config::ArenaSettings;
use awale_arena::game::Board;
use awale_arena::profile::ProfileStore;
use awale_arena::replay::GameArchive;
use awale_arena::session::{DuelRole, PromptKind, SessionState};
use awale_arena::types::{RoomId, RoomPrivacy, Seat};

use fixtures::{TestArena, TestClient};

const INVALID_OPTION: &str = "Invalid option. Choose again.";

#[test]
fn test_first_move_sows_and_passes_the_turn() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    assert!(alice.transcript().contains("Welcome, alice! Your rating is 1000."));
    bob.drain();

    let room_id = arena.start_duel(&mut alice, &mut bob);
    assert_eq!(
        arena.state(&alice),
        Some(SessionState::InRoom {
            room_id,
            seat: Seat::First
        })
    );
    assert_eq!(
        arena.state(&bob),
        Some(SessionState::InRoom {
            room_id,
            seat: Seat::Second
        })
    );

    arena.send(&alice, "/3");

    let room = arena.dispatcher.rooms().get(room_id).unwrap();
    let board = room.board();
    assert_eq!(board.seeds(2), 0);
    for pit in 3..=6 {
        assert_eq!(board.seeds(pit), 5, "pit {pit} should have gained a seed");
    }
    assert_eq!(board.seeds_accounted(), 48);
    assert_eq!(room.turn(), Seat::Second);
    assert_eq!(room.moves_played(), 1);

    let bob_view = bob.transcript();
    assert!(bob_view.contains("alice played /3."));
    assert!(bob_view.contains("Your turn!"));
    let alice_view = alice.transcript();
    assert!(alice_view.contains("It's now bob's turn."));
    assert!(!alice_view.contains("Your turn!"));
}

#[test]
fn test_duel_announcements() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    alice.drain();
    bob.drain();

    arena.send(&alice, "3");
    assert!(alice.transcript().contains("Available clients for a duel:\n  bob"));
    assert_eq!(arena.state(&alice), Some(SessionState::AwaitingOpponentName));

    arena.send(&alice, "bob");
    assert!(alice.transcript().contains("Duel request sent to bob."));
    assert!(bob.transcript().contains("alice has challenged you to a duel"));
    assert!(matches!(
        arena.state(&bob),
        Some(SessionState::PendingDuel {
            role: DuelRole::Challenged,
            ..
        })
    ));

    arena.send(&bob, "accept");
    let started = bob.transcript();
    assert!(started.contains("Awalé game started"));
    assert!(started.contains("alice goes first."));
    assert!(!started.contains("Your turn!"));
    assert!(alice.transcript().contains("Your turn!"));
    assert_eq!(arena.dispatcher.rooms().active_count(), 1);
    assert_eq!(arena.dispatcher.matchmaker().pending_count(), 0);
}

#[test]
fn test_moves_out_of_turn_are_rejected() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    let room_id = arena.start_duel(&mut alice, &mut bob);

    arena.send(&bob, "/1");
    assert!(bob.transcript().contains("not your turn"));

    arena.send(&alice, "/9");
    assert!(alice.transcript().contains("use /1 to /6"));

    arena.send(&alice, "/1");
    arena.send(&bob, "/1");
    let before = arena.dispatcher.rooms().get(room_id).unwrap().board().clone();
    alice.drain();

    // pit 1 was emptied by the first move
    arena.send(&alice, "/1");
    assert!(alice.transcript().contains("is empty"));

    let room = arena.dispatcher.rooms().get(room_id).unwrap();
    assert_eq!(room.moves_played(), 2);
    assert_eq!(room.turn(), Seat::First);
    assert_eq!(room.board(), &before);
}

#[test]
fn test_chat_reaches_the_whole_room() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    let mut carol = arena.connect("carol");
    let room_id = arena.start_duel(&mut alice, &mut bob);

    arena.send(&carol, &format!("observe {room_id}"));
    carol.drain();

    arena.send(&bob, "good luck");
    assert!(alice.transcript().contains("bob: good luck"));
    assert!(bob.transcript().contains("bob: good luck"));
    assert!(carol.transcript().contains("bob: good luck"));
}

#[test]
fn test_forfeit_updates_ratings_once() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    let room_id = arena.start_duel(&mut alice, &mut bob);

    arena.send(&alice, "/-1");

    let alice_view = alice.transcript();
    assert!(alice_view.contains("Player alice left the game. bob wins!"));
    assert!(alice_view.contains("Your rating is now 970 (-30)."));
    assert!(bob.transcript().contains("Your rating is now 1030 (+30)."));

    assert_eq!(arena.profiles.get_elo("alice").unwrap(), 970);
    assert_eq!(arena.profiles.get_elo("bob").unwrap(), 1030);
    assert_eq!(arena.state(&alice), Some(SessionState::Lobby));
    assert_eq!(arena.state(&bob), Some(SessionState::Lobby));
    assert!(arena.dispatcher.rooms().get(room_id).is_none());

    // Leaving after the game is not a second forfeit
    arena.disconnect(&bob);
    arena.disconnect(&alice);
    assert_eq!(arena.profiles.get_elo("alice").unwrap(), 970);
    assert_eq!(arena.profiles.get_elo("bob").unwrap(), 1030);
    assert_eq!(arena.dispatcher.stats().games_finished, 1);
}

/// Two players in a room with one observer, the room jumped to `board`
fn endgame(board: Board) -> (TestArena, [TestClient; 3], RoomId) {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    let mut carol = arena.connect("carol");
    let room_id = arena.start_duel(&mut alice, &mut bob);
    arena.send(&carol, &format!("observe {room_id}"));
    carol.drain();
    arena.set_position(room_id, board, Seat::First);
    (arena, [alice, bob, carol], room_id)
}

/// Everyone is back on the menu and the slot is free
fn assert_room_closed(arena: &TestArena, clients: &[&TestClient], room_id: RoomId) {
    for client in clients {
        assert_eq!(arena.state(client), Some(SessionState::Lobby), "{}", client.name);
    }
    assert!(arena.dispatcher.rooms().get(room_id).is_none());
    assert_eq!(arena.dispatcher.rooms().free_slots(), arena.dispatcher.rooms().capacity());
    assert_eq!(arena.dispatcher.stats().games_finished, 1);
}

/// Last block of the only recorded game
fn final_log_block(arena: &TestArena) -> String {
    let games = arena.archive.list_completed_games().unwrap();
    assert_eq!(games.len(), 1);
    arena
        .archive
        .blocks(&games[0])
        .and_then(|blocks| blocks.last().cloned())
        .unwrap()
}

#[test]
fn test_capture_past_half_the_pool_wins() {
    let board = Board::from_position([0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0], [24, 22]);
    let (mut arena, [mut alice, mut bob, mut carol], room_id) = endgame(board);

    arena.send(&alice, "/6");

    let result = "Player alice wins! Final score: alice 26 - 22 bob";
    let alice_view = alice.transcript();
    assert!(alice_view.contains("alice played /6 and captured 2 seeds."));
    assert!(alice_view.contains(result));
    assert!(alice_view.contains("Your rating is now 1030 (+30)."));
    assert!(!alice_view.contains("It's now bob's turn."));
    assert!(bob.transcript().contains("Your rating is now 970 (-30)."));
    assert!(carol.transcript().contains(result));

    assert_eq!(arena.profiles.get_elo("alice").unwrap(), 1030);
    assert_eq!(arena.profiles.get_elo("bob").unwrap(), 970);
    assert_room_closed(&arena, &[&alice, &bob, &carol], room_id);
    assert_eq!(final_log_block(&arena), result);

    // moves after the game are plain menu input
    arena.send(&alice, "/1");
    assert!(alice.transcript().contains(INVALID_OPTION));
    assert_eq!(arena.profiles.get_elo("alice").unwrap(), 1030);
}

#[test]
fn test_stalemate_is_settled_by_count() {
    // alice's capture empties bob's row; her two remaining seeds are hers
    let board = Board::from_position([0, 0, 0, 2, 0, 1, 1, 0, 0, 0, 0, 0], [21, 23]);
    let (mut arena, [mut alice, mut bob, mut carol], room_id) = endgame(board);

    arena.send(&alice, "/6");

    let result = "Player alice wins! Final score: alice 25 - 23 bob";
    assert!(alice.transcript().contains(result));
    assert!(bob.transcript().contains("Your rating is now 970 (-30)."));
    assert!(carol.transcript().contains(result));
    assert_eq!(arena.profiles.get_elo("alice").unwrap(), 1030);
    assert_eq!(arena.profiles.get_elo("bob").unwrap(), 970);
    assert_room_closed(&arena, &[&alice, &bob, &carol], room_id);
    assert_eq!(final_log_block(&arena), result);
}

#[test]
fn test_level_count_is_a_draw() {
    let board = Board::from_position([0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0], [22, 24]);
    let (mut arena, [mut alice, mut bob, mut carol], room_id) = endgame(board);

    arena.send(&alice, "/6");

    let result = "The game ends in a draw: alice 24 - 24 bob";
    let alice_view = alice.transcript();
    assert!(alice_view.contains(result));
    assert!(!alice_view.contains("Your rating is now"));
    assert!(!bob.transcript().contains("Your rating is now"));
    assert!(carol.transcript().contains(result));

    assert_eq!(arena.profiles.get_elo("alice").unwrap(), 1000);
    assert_eq!(arena.profiles.get_elo("bob").unwrap(), 1000);
    assert_room_closed(&arena, &[&alice, &bob, &carol], room_id);
    assert_eq!(final_log_block(&arena), result);
}

#[test]
fn test_disconnect_mid_game_is_a_forfeit() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    let mut carol = arena.connect("carol");
    let room_id = arena.start_duel(&mut alice, &mut bob);
    arena.send(&carol, &format!("observe {room_id}"));
    carol.drain();

    arena.disconnect(&bob);

    assert!(alice
        .transcript()
        .contains("Player bob left the game. alice wins!"));
    assert!(carol.transcript().contains("alice wins!"));
    assert_eq!(arena.profiles.get_elo("alice").unwrap(), 1030);
    assert_eq!(arena.profiles.get_elo("bob").unwrap(), 970);
    assert_eq!(arena.state(&alice), Some(SessionState::Lobby));
    assert_eq!(arena.state(&carol), Some(SessionState::Lobby));
    assert_eq!(arena.state(&bob), None);
    assert_eq!(arena.dispatcher.rooms().active_count(), 0);
}

#[test]
fn test_dead_observer_does_not_block_the_room() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    let mut carol = arena.connect("carol");
    let mut dave = arena.connect("dave");
    let room_id = arena.start_duel(&mut alice, &mut bob);

    arena.send(&carol, &format!("observe {room_id}"));
    arena.send(&dave, &format!("observe {room_id}"));
    assert!(carol
        .transcript()
        .contains(&format!("You are now observing room {room_id}: alice vs bob.")));
    dave.drain();
    assert_eq!(
        arena.dispatcher.rooms().get(room_id).unwrap().observers().len(),
        2
    );

    dave.hang_up();
    arena.send(&alice, "/3");

    assert!(carol.transcript().contains("alice played /3."));
    assert!(bob.transcript().contains("Your turn!"));
    assert_eq!(arena.state(&dave), Some(SessionState::Observing { room_id }));

    arena.send(&carol, "exit");
    assert!(carol
        .transcript()
        .contains(&format!("You stopped observing room {room_id}.")));
    assert_eq!(arena.state(&carol), Some(SessionState::Lobby));
    assert_eq!(
        arena.dispatcher.rooms().get(room_id).unwrap().observers().len(),
        1
    );
}

#[test]
fn test_friends_only_rooms() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    let mut carol = arena.connect("carol");
    let mut dave = arena.connect("dave");
    arena.befriend(&mut dave, &mut alice);
    assert!(arena.profiles.are_friends("alice", "dave").unwrap());

    arena.send(&bob, "9");
    assert!(bob.transcript().contains("Your games are now friends-only."));
    let room_id = arena.start_duel(&mut alice, &mut bob);
    assert_eq!(
        arena.dispatcher.rooms().get(room_id).unwrap().privacy(),
        RoomPrivacy::FriendsOnly
    );

    carol.drain();
    arena.send(&carol, &format!("observe {room_id}"));
    assert!(carol.transcript().contains("reserved for friends"));
    assert_eq!(arena.state(&carol), Some(SessionState::Lobby));

    dave.drain();
    arena.send(&dave, &format!("observe {room_id}"));
    assert!(dave.transcript().contains("You are now observing"));
    assert_eq!(arena.state(&dave), Some(SessionState::Observing { room_id }));
}

#[test]
fn test_observing_unknown_room() {
    let mut arena = TestArena::new();
    let mut carol = arena.connect("carol");
    carol.drain();

    arena.send(&carol, "observe 42");
    assert!(carol.transcript().contains("No active game in room 42"));
    assert_eq!(arena.state(&carol), Some(SessionState::Lobby));
}

#[test]
fn test_unlisted_input_leaves_state_unchanged() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    let mut carol = arena.connect("carol");
    alice.drain();

    arena.send(&alice, "dance");
    assert!(alice.transcript().contains(INVALID_OPTION));
    assert_eq!(arena.state(&alice), Some(SessionState::Lobby));

    arena.send(&alice, "next");
    assert!(alice.transcript().contains(INVALID_OPTION));
    assert_eq!(arena.state(&alice), Some(SessionState::Lobby));

    arena.send(&alice, "3");
    arena.send(&alice, "bob");
    let pending = arena.state(&alice);
    alice.drain();
    arena.send(&alice, "/2");
    assert!(alice.transcript().contains(INVALID_OPTION));
    assert_eq!(arena.state(&alice), pending);

    arena.send(&bob, "accept");
    let room_id = match arena.state(&alice) {
        Some(SessionState::InRoom { room_id, .. }) => room_id,
        other => panic!("expected a game, got {other:?}"),
    };
    arena.send(&carol, &format!("observe {room_id}"));
    carol.drain();
    arena.send(&carol, "/1");
    assert!(carol.transcript().contains(INVALID_OPTION));
    assert_eq!(arena.state(&carol), Some(SessionState::Observing { room_id }));
}

#[test]
fn test_only_the_challenged_player_accepts() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    let mut carol = arena.connect("carol");
    arena.send(&alice, "3");
    arena.send(&alice, "bob");
    alice.drain();

    arena.send(&alice, "accept");
    assert!(alice
        .transcript()
        .contains("only the challenged player can accept"));
    assert_eq!(arena.dispatcher.rooms().active_count(), 0);

    // bob is no longer available to anyone else
    carol.drain();
    arena.send(&carol, "3");
    arena.send(&carol, "bob");
    assert!(carol
        .transcript()
        .contains("Player bob is not available for a duel"));
    assert_eq!(arena.state(&carol), Some(SessionState::Lobby));

    arena.send(&bob, "accept");
    arena.send(&bob, "accept");
    assert_eq!(arena.dispatcher.rooms().active_count(), 1);
    assert!(bob.transcript().contains("bob: accept"));
}

#[test]
fn test_declined_duel_frees_both_players() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    arena.send(&alice, "3");
    arena.send(&alice, "bob");
    alice.drain();

    arena.send(&bob, "exit");
    assert!(alice.transcript().contains("bob cancelled the duel."));
    assert_eq!(arena.state(&alice), Some(SessionState::Lobby));
    assert_eq!(arena.state(&bob), Some(SessionState::Lobby));
    assert_eq!(arena.dispatcher.matchmaker().pending_count(), 0);

    // a challenged player choosing a menu option declines implicitly
    arena.send(&alice, "3");
    arena.send(&alice, "bob");
    alice.drain();
    bob.drain();
    arena.send(&bob, "1");
    assert!(alice.transcript().contains("bob declined the duel."));
    assert!(bob.transcript().contains("Connected clients:"));
    assert_eq!(arena.state(&bob), Some(SessionState::Lobby));
}

#[test]
fn test_challenging_yourself_or_a_stranger() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    alice.drain();

    arena.send(&alice, "3");
    assert!(alice.transcript().contains("Nobody is available right now."));
    arena.send(&alice, "alice");
    assert!(alice.transcript().contains("not available"));
    assert_eq!(arena.state(&alice), Some(SessionState::Lobby));

    arena.send(&alice, "3");
    arena.send(&alice, "exit");
    assert!(alice.transcript().contains("Cancelled."));
    assert_eq!(arena.state(&alice), Some(SessionState::Lobby));
}

#[test]
fn test_room_slots_are_bounded() {
    let mut arena = TestArena::with_settings(ArenaSettings {
        max_rooms: 1,
        ..ArenaSettings::default()
    });
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    let mut carol = arena.connect("carol");
    let _dave = arena.connect("dave");
    arena.start_duel(&mut alice, &mut bob);

    carol.drain();
    arena.send(&carol, "3");
    arena.send(&carol, "dave");
    assert!(carol.transcript().contains("Capacity exceeded"));
    assert_eq!(arena.state(&carol), Some(SessionState::Lobby));

    arena.send(&alice, "/-1");
    arena.send(&carol, "3");
    arena.send(&carol, "dave");
    assert!(carol.transcript().contains("Duel request sent to dave."));
}

#[test]
fn test_client_table_is_bounded() {
    let mut arena = TestArena::with_settings(ArenaSettings {
        max_clients: 2,
        ..ArenaSettings::default()
    });
    let _alice = arena.connect("alice");
    let _bob = arena.connect("bob");
    let mut carol = arena.connect("carol");

    assert!(carol.transcript().contains("Server is full"));
    assert!(carol.was_closed());
    assert_eq!(arena.state(&carol), None);
    assert_eq!(arena.dispatcher.sessions().len(), 2);
}

#[test]
fn test_invalid_and_duplicate_names_are_refused() {
    let mut arena = TestArena::new();
    let _alice = arena.connect("alice");

    let mut twin = arena.connect("alice");
    assert!(twin.transcript().contains("already taken"));
    assert!(twin.was_closed());

    let mut spaced = arena.connect("not a name");
    assert!(spaced.transcript().starts_with("Invalid name."));
    assert!(spaced.was_closed());

    let mut keyword = arena.connect("exit");
    let refusal = keyword.transcript();
    assert!(refusal.starts_with("Invalid name."));
    assert!(refusal.contains("cannot be exit, accept"));
    assert!(keyword.was_closed());
    assert_eq!(arena.dispatcher.sessions().len(), 1);
}

#[test]
fn test_bio_prompts() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");

    arena.send(&alice, "4");
    assert_eq!(
        arena.state(&alice),
        Some(SessionState::Prompt(PromptKind::Bio))
    );
    arena.send(&alice, "Sowing since 1998");
    assert!(alice.transcript().contains("Bio updated successfully."));
    assert_eq!(arena.state(&alice), Some(SessionState::Lobby));

    bob.drain();
    arena.send(&bob, "5");
    arena.send(&bob, "alice");
    assert!(bob.transcript().contains("Bio of alice:\nSowing since 1998"));

    arena.send(&bob, "5");
    arena.send(&bob, "carol");
    assert!(bob.transcript().contains("Player not found or bio not set."));

    arena.send(&alice, "4");
    arena.send(&alice, "pipes | are not allowed");
    assert!(alice.transcript().contains("Invalid command"));
    assert_eq!(
        arena.profiles.get_bio("alice").unwrap().as_deref(),
        Some("Sowing since 1998")
    );
}

#[test]
fn test_friend_requests() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    alice.drain();
    bob.drain();

    arena.send(&alice, "7");
    arena.send(&alice, "bob");
    assert!(alice.transcript().contains("Friend request sent to bob."));
    assert!(bob.transcript().contains("alice sent you a friend request."));

    arena.send(&alice, "7");
    arena.send(&alice, "bob");
    assert!(alice.transcript().contains("a request is pending"));

    arena.send(&bob, "8");
    let requests = bob.transcript();
    assert!(requests.contains("Your friends:\nYou have no friends yet."));
    assert!(requests.contains("Pending friend requests from:\n  alice"));
    arena.send(&bob, "alice");
    assert!(bob.transcript().contains("You are now friends with alice."));
    assert!(alice.transcript().contains("bob accepted your friend request."));
    assert!(arena.profiles.are_friends("bob", "alice").unwrap());

    arena.send(&bob, "8");
    let requests = bob.transcript();
    assert!(requests.contains("Your friends:\n  alice"));
    assert!(requests.contains("No pending friend requests."));
    assert_eq!(arena.state(&bob), Some(SessionState::Lobby));
}

#[test]
fn test_finished_games_can_be_replayed() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    arena.start_duel(&mut alice, &mut bob);
    arena.send(&alice, "/3");
    arena.send(&bob, "/-1");

    let games = arena.archive.list_completed_games().unwrap();
    assert_eq!(games.len(), 1);
    let file = games[0].clone();
    assert!(file.ends_with("_alice_vs_bob.log"));

    alice.drain();
    arena.send(&alice, "10");
    assert!(alice.transcript().contains(&file));

    arena.send(&alice, &format!("replay {file}"));
    assert_eq!(arena.state(&alice), Some(SessionState::Replaying));
    let first = alice.transcript();
    assert!(first.contains(&format!("[{file} #1]")));
    assert!(first.contains("alice vs bob"));

    arena.send(&alice, "next");
    assert!(alice.transcript().contains(&format!("[{file} #2]")));
    arena.send(&alice, "next");
    assert!(alice.transcript().contains("alice played /3."));
    arena.send(&alice, "next");
    assert!(alice
        .transcript()
        .contains("Player bob left the game. alice wins!"));
    arena.send(&alice, "next");
    assert!(alice.transcript().contains("No more blocks"));

    arena.send(&alice, "prev");
    assert!(alice.transcript().contains(&format!("[{file} #3]")));

    arena.send(&alice, "exit");
    assert_eq!(arena.state(&alice), Some(SessionState::Lobby));
}

#[test]
fn test_replay_of_unknown_or_unsafe_files() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    alice.drain();

    arena.send(&alice, "replay missing.log");
    assert!(alice.transcript().contains("no game log named missing.log"));
    assert_eq!(arena.state(&alice), Some(SessionState::Lobby));

    arena.send(&alice, "replay ../secrets.log");
    assert!(alice.transcript().contains("is not a game log name"));
    assert_eq!(arena.state(&alice), Some(SessionState::Lobby));
}

#[test]
fn test_replay_navigation_bounds() {
    let mut arena = TestArena::new();
    arena
        .archive
        .insert_game(
            "saved.log",
            vec!["one".to_string(), "two".to_string(), "three".to_string()],
        )
        .unwrap();
    let mut alice = arena.connect("alice");
    alice.drain();

    arena.send(&alice, "replay saved.log");
    assert!(alice.transcript().contains("[saved.log #1]\none"));

    arena.send(&alice, "prev");
    assert!(alice.transcript().contains("No more blocks"));

    arena.send(&alice, "next");
    arena.send(&alice, "next");
    assert!(alice.transcript().contains("[saved.log #3]\nthree"));

    arena.send(&alice, "prev");
    assert!(alice.transcript().contains("[saved.log #2]\ntwo"));

    arena.send(&alice, "/1");
    assert!(alice.transcript().contains(INVALID_OPTION));
    assert_eq!(arena.state(&alice), Some(SessionState::Replaying));
}

#[test]
fn test_listing_commands() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");
    let mut carol = arena.connect("carol");
    carol.drain();

    arena.send(&carol, "6");
    assert!(carol.transcript().contains("No ongoing games."));

    let room_id = arena.start_duel(&mut alice, &mut bob);
    arena.send(&carol, "6");
    assert!(carol
        .transcript()
        .contains(&format!("Room {room_id} | alice vs bob | observers: 0 | moves: 0")));

    arena.send(&carol, "1");
    let clients = carol.transcript();
    assert!(clients.contains("alice (1000"));
    assert!(clients.contains("carol (1000"));
}

#[test]
fn test_menu_disconnect_and_shutdown() {
    let mut arena = TestArena::new();
    let mut alice = arena.connect("alice");
    let mut bob = arena.connect("bob");

    arena.send(&alice, "2");
    assert!(alice.transcript().contains("Disconnecting..."));
    assert!(alice.was_closed());
    assert_eq!(arena.state(&alice), None);

    arena.dispatcher.handle_event(awale_arena::ArenaEvent::Shutdown);
    assert!(bob.transcript().contains("Server is shutting down."));
    assert!(bob.was_closed());
    assert!(!arena.dispatcher.is_running());

    // events after shutdown are ignored
    let late = arena.connect("carol");
    assert_eq!(arena.state(&late), None);
}
