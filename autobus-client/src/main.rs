use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use autobus_client::{ClientConfig, GameSession, HttpStore, SessionSnapshot};
use autobus_core::{GameEvent, GameEventHandler, RoundEndReason};
use autobus_types::{Category, CorrectionMark};

const HELP: &str = "\
commands:
  create <name>            create a room and host it
  join <code> <name>       join a room
  solo                     play a solo round
  start | new              start the first / next round (host)
  answer <category> <text> fill in a category
  finish                   stop answering
  mark <category>          cycle a correction mark (unset -> correct -> wrong)
  score                    calculate and record this round's score
  show                     print the current state
  leave                    leave the room
  quit";

/// Prints game events as they happen, including those seen by polling.
struct ConsoleEvents;

impl GameEventHandler for ConsoleEvents {
    fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::RoomCreated { room_code, host } => {
                println!("Room {room_code} created. Share the code; {} is host.", host.name)
            }
            GameEvent::PlayerJoined { room_code, player } => {
                println!("Joined room {room_code} as {}", player.name)
            }
            GameEvent::RosterChanged { players, .. } => {
                let names: Vec<String> = players
                    .iter()
                    .map(|p| format!("{} ({})", p.name, p.score))
                    .collect();
                println!("Players: {}", names.join(", "))
            }
            GameEvent::RoundStarted { letter, .. } => {
                println!("Round started! Letter: {letter}. You have 60 seconds.")
            }
            GameEvent::RoundEnded { reason, .. } => match reason {
                RoundEndReason::TimeUp => println!("Time's up! Mark your answers."),
                RoundEndReason::Finished => println!("Finished. Mark your answers."),
                RoundEndReason::ClosedByHost => println!("The host ended the round."),
            },
            GameEvent::ScoreRecorded {
                round_score, total, ..
            } => println!("Round score: {round_score} (total {total})"),
            GameEvent::RoomLeft { room_code } => println!("Left room {room_code}"),
        }
    }
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    match snapshot.room_code() {
        Some(code) => println!("Room {code}{}", if snapshot.is_host { " (host)" } else { "" }),
        None if snapshot.mode.is_some() => println!("Solo game"),
        None => {
            println!("Not in a game");
            return;
        }
    }

    let letter = snapshot
        .current_letter
        .map(String::from)
        .unwrap_or_else(|| "-".to_string());
    println!(
        "Letter {letter}, {}, {}s left, {}% filled",
        snapshot.phase,
        snapshot.time_left,
        snapshot.completion_percentage()
    );

    for (category, answer) in snapshot.answers.iter() {
        let mark = match snapshot.corrections[category] {
            CorrectionMark::Unset => " ",
            CorrectionMark::Correct => "+",
            CorrectionMark::Wrong => "x",
        };
        println!("  [{mark}] {:<12} {answer}", category.label());
    }

    for entry in snapshot.leaderboard() {
        println!(
            "  #{} {}{} {}",
            entry.rank,
            entry.player.name,
            if entry.player.is_host { " *" } else { "" },
            entry.player.score
        );
    }
    println!("Your total: {}", snapshot.total_score);
}

/// Returns `false` once the user asks to quit.
async fn run_command(session: &mut GameSession, line: &str) -> bool {
    let mut parts = line.trim().splitn(3, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let first = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default();

    let result = match command {
        "" => Ok(()),
        "help" => {
            println!("{HELP}");
            Ok(())
        }
        "quit" | "exit" => return false,
        "create" => session.create_room(&format!("{first} {rest}")).await.map(drop),
        "join" => session.join_room(first, rest).await.map(drop),
        "solo" => session.start_solo().await.map(drop),
        "start" => session.start_round().await.map(drop),
        "new" => session.new_round().await.map(drop),
        "finish" => session.finish_round().await,
        "answer" => match first.parse::<Category>() {
            Ok(category) => session.set_answer(category, rest.trim()).await,
            Err(e) => {
                println!("{e}");
                Ok(())
            }
        },
        "mark" => match first.parse::<Category>() {
            Ok(category) => session.toggle_correction(category).await.map(drop),
            Err(e) => {
                println!("{e}");
                Ok(())
            }
        },
        "score" => session.calculate_score().await.map(drop),
        "show" => {
            print_snapshot(&session.snapshot().await);
            Ok(())
        }
        "leave" => {
            session.leave().await;
            Ok(())
        }
        other => {
            println!("Unknown command {other:?}; try `help`");
            Ok(())
        }
    };

    if let Err(e) = result {
        println!("{e}");
    }
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env()?;
    let store = HttpStore::new(&config.store_url)?;
    info!("Using store at {}", config.store_url);

    let mut session = GameSession::from_config(Arc::new(store), &config);
    session.add_event_handler(Box::new(ConsoleEvents)).await;

    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.key()).collect();
    println!("Categories: {}", categories.join(", "));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !run_command(&mut session, &line).await {
            break;
        }
    }

    session.leave().await;
    Ok(())
}
