//! Two players and a spectator share one in-process room.
//!
//! Black follows a fixed script across row 7 while white answers with a
//! [`MoveSuggester`] that crowds whatever black just played. A third
//! participant joins mid-game, catches up from the players' replicas,
//! and outlives the rematch negotiation at the end.
//!
//! Run with `RUST_LOG=moku=debug` to watch the replicas talk.

use std::time::Duration;

use moku::prelude::*;
use moku::{Board, Cell, MatchError, MoveSuggester};
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

/// How long to wait for any single event before declaring the demo stuck.
const EVENT_DEADLINE: Duration = Duration::from_secs(10);

/// Answers by playing the first empty cell, in scan order, that touches an
/// opposing stone. Opens on the center point when the opponent has yet to
/// appear anywhere on the board.
struct Crowder;

const NEIGHBORS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl MoveSuggester for Crowder {
    async fn suggest(
        &self,
        board: &Board,
        _rules: GameRules,
        player: Player,
    ) -> Result<Position, MatchError> {
        let them = player.other().cell();
        for (row, cells) in board.cells().iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if *cell != Cell::Empty {
                    continue;
                }
                let crowded = NEIGHBORS.iter().any(|&(dr, dc)| {
                    board.probe(row as i64 + dr, col as i64 + dc) == Some(them)
                });
                if crowded {
                    return Ok(Position::new(row, col));
                }
            }
        }
        let center = Position::new(board.size() / 2, board.size() / 2);
        if board.get(center) == Cell::Empty {
            return Ok(center);
        }
        Err(MatchError::SuggestionFailed("no open cell left".into()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    run().await
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let hub = MemoryHub::new();
    let directory = MemoryDirectory::default();
    // The in-process hub delivers presence instantly, so the occupancy
    // re-check can settle much faster than it would against a real broker.
    let policy = ConfirmPolicy::with_settle(Duration::from_millis(50));

    // Black opens a room.
    let transport = hub.connect(generate_client_id());
    let (black, mut black_events) = create_match(
        &transport,
        directory.clone(),
        MemoryRoleStore::new(),
        JsonCodec,
        policy,
        MatchConfig::default(),
    )
    .await?;
    let code = black.room_code().clone();
    println!("room {code} is open");
    wait_for(&mut black_events, |event| {
        matches!(event, MatchEvent::WaitingForOpponent)
    })
    .await?;
    println!("black is waiting for an opponent");

    // White sits down across the board.
    let transport = hub.connect(generate_client_id());
    let (white, mut white_events) = join_match(
        &transport,
        directory.clone(),
        MemoryRoleStore::new(),
        JsonCodec,
        policy,
        MatchConfig::default(),
        code.clone(),
        Role::PlayerWhite,
    )
    .await?;
    wait_for(&mut white_events, |event| {
        matches!(event, MatchEvent::RoomActive)
    })
    .await?;
    wait_for(&mut black_events, |event| {
        matches!(event, MatchEvent::RoomActive)
    })
    .await?;
    println!("white joined, black to move");

    // Four exchanges: black builds a row, white crowds it from above.
    for i in 0..4 {
        let pos = Position::new(7, 3 + i);
        black.place_stone(pos).await?;
        println!("black plays {pos}");
        wait_for_move(&mut white_events, pos).await?;

        let state = white.game_state().await?;
        let reply = Crowder
            .suggest(&state.board, GameRules::default(), Player::White)
            .await?;
        white.place_stone(reply).await?;
        println!("white answers {reply}");
        wait_for_move(&mut black_events, reply).await?;
    }

    // A spectator tunes in mid-game and catches up from the players.
    let transport = hub.connect(generate_client_id());
    let (watcher, mut watcher_events) = join_match(
        &transport,
        directory.clone(),
        MemoryRoleStore::new(),
        JsonCodec,
        policy,
        MatchConfig::default(),
        code.clone(),
        Role::Spectator,
    )
    .await?;
    wait_for_move(&mut watcher_events, Position::new(6, 5)).await?;
    println!("a spectator joined and caught up");

    // The fifth stone completes the row.
    let winning = Position::new(7, 7);
    black.place_stone(winning).await?;
    println!("black plays {winning}");
    for events in [&mut black_events, &mut white_events, &mut watcher_events] {
        wait_for(events, |event| {
            matches!(event, MatchEvent::GameEnded { .. })
        })
        .await?;
    }

    let state = watcher.game_state().await?;
    let winner = state.winner.map(|w| w.to_string()).unwrap_or_default();
    println!("game over, {winner} wins:");
    print!("{}", render(&state.board));

    // White wants another round. Black declines and heads home, which
    // resets the room; once white gives up too, the room winds down.
    white.request_rematch().await?;
    wait_for(&mut black_events, |event| {
        matches!(event, MatchEvent::RematchRequested { .. })
    })
    .await?;
    println!("white asks for a rematch, black declines");
    black.respond_rematch(false).await?;
    wait_for(&mut black_events, |event| {
        matches!(event, MatchEvent::RoomClosed { .. })
    })
    .await?;
    wait_for(&mut white_events, |event| {
        matches!(event, MatchEvent::RematchDeclined)
    })
    .await?;
    white.leave().await?;

    let closed = wait_for(&mut watcher_events, |event| {
        matches!(event, MatchEvent::RoomClosed { .. })
    })
    .await?;
    if let MatchEvent::RoomClosed { reason } = closed {
        println!("room {code} wound down: {reason}");
    }
    Ok(())
}

/// Pulls events until one matches, failing if the stream stalls or ends.
async fn wait_for<F>(
    events: &mut EventStream,
    matches: F,
) -> Result<MatchEvent, Box<dyn std::error::Error>>
where
    F: Fn(&MatchEvent) -> bool,
{
    loop {
        let event = timeout(EVENT_DEADLINE, events.recv())
            .await?
            .ok_or("event stream ended early")?;
        if matches(&event) {
            return Ok(event);
        }
    }
}

/// Waits until this participant's replica has applied the move at `pos`.
async fn wait_for_move(
    events: &mut EventStream,
    pos: Position,
) -> Result<(), Box<dyn std::error::Error>> {
    wait_for(events, |event| {
        matches!(event, MatchEvent::BoardUpdated(state) if state.last_move == Some(pos))
    })
    .await?;
    Ok(())
}

/// One character per point: filled for stones, a dot for open cells.
fn render(board: &Board) -> String {
    let mut out = String::new();
    for row in board.cells() {
        for cell in row {
            out.push(match cell {
                Cell::Empty => '·',
                Cell::Black => '●',
                Cell::White => '○',
            });
            out.push(' ');
        }
        out.pop();
        out.push('\n');
    }
    out
}
