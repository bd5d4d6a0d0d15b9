//! # Loopback Session
//!
//! Runs a full client session against a scripted in-process server over a
//! channel transport: identify, world init, a burst of snapshots, one
//! placement from the client, then a server close.
//!
//! ## Usage
//!
//! ```bash
//! loopback_session [--scenario scenario.toml] [--manifest]
//! ```
//!
//! A scenario file may override any of:
//!
//! ```toml
//! ticks = 30
//! close_code = 3003
//!
//! [[players]]
//! id = "p1"
//! username = "alice"
//! joinedAt = 0.0
//! color = ["#ff8800"]
//!
//! [session]
//! max_chat_history = 50
//! ```

use std::time::Duration;

use sandlink_networking::protocol::{CursorPosition, ProtocolManifest};
use sandlink_networking::{
    Cell, ChannelTransport, Coord, GameInit, GameState, Packet, PlaceCommand, SessionCommand,
    SessionConfig, SessionDriver, SessionEvent, StaticAuth, Transport, Value,
};
use sandlink_shared::{ChatMessage, ChatMessageType, Client, ElementInfo};
use serde::Deserialize;

/// What the scripted server plays back.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct Scenario {
    width: f64,
    height: f64,
    ticks: u32,
    tick_interval_ms: u64,
    close_code: u32,
    close_message: String,
    elements: Vec<ElementInfo>,
    players: Vec<Client>,
    chat: Vec<ChatMessage>,
    session: SessionConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        let element = |name: &str, category: &str, color: &str| ElementInfo {
            name: name.into(),
            category: category.into(),
            color: vec![color.into()],
            ..ElementInfo::default()
        };
        Self {
            width: 100.0,
            height: 100.0,
            ticks: 12,
            tick_interval_ms: 25,
            close_code: 3004,
            close_message: String::new(),
            elements: vec![
                element("sand", "land", "#e6d577"),
                element("water", "liquids", "#2167ff"),
                ElementInfo {
                    is_tool: true,
                    ..element("heat", "tools", "#ff6b21")
                },
            ],
            players: vec![Client {
                id: "host".into(),
                username: "host".into(),
                joined_at: 0.0,
                color: vec!["#ffffff".into()],
            }],
            chat: vec![ChatMessage {
                id: "welcome".into(),
                author: "host".into(),
                author_username: "host".into(),
                content: "Welcome to the loopback world".into(),
                message_type: ChatMessageType::System,
                ..ChatMessage::default()
            }],
            session: SessionConfig {
                credential: "loopback-cookie".into(),
                ..SessionConfig::default()
            },
        }
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn send(end: &mut ChannelTransport, packet: &Packet) -> Result<(), BoxError> {
    end.send(packet.encode()?).await?;
    Ok(())
}

async fn recv(end: &mut ChannelTransport) -> Result<Packet, BoxError> {
    loop {
        let frame = end.recv().await.ok_or("client hung up")?;
        if let Some(packet) = Packet::decode(&frame)? {
            return Ok(packet);
        }
    }
}

async fn scripted_server(mut end: ChannelTransport, scenario: &Scenario) -> Result<(), BoxError> {
    send(&mut end, &Packet::Identify { connection_id: "loopback-1".into() }).await?;
    match recv(&mut end).await? {
        Packet::IdentifyResponse { access_token } => {
            println!("│ server: client identified with token {access_token:?}");
        }
        other => return Err(format!("expected identify answer, got {:?}", other.kind()).into()),
    }

    send(
        &mut end,
        &Packet::GameInit(GameInit {
            width: scenario.width,
            height: scenario.height,
            elements: scenario.elements.clone(),
            settings: vec![("paused".into(), Value::Bool(false))],
        }),
    )
    .await?;
    send(&mut end, &Packet::GamePlayers(scenario.players.clone())).await?;
    send(&mut end, &Packet::ChatInit(scenario.chat.clone())).await?;

    for tick in 0..scenario.ticks {
        let cells = (0..=tick)
            .map(|y| Cell::at(50.0, f64::from(y), "sand"))
            .collect();
        let snapshot = GameState {
            tick: f64::from(tick),
            cells,
            cursors: vec![CursorPosition {
                x: 50.0,
                y: 0.0,
                size: 2.0,
                player: "host".into(),
            }],
        };
        send(&mut end, &Packet::GameState(snapshot)).await?;
        tokio::time::sleep(Duration::from_millis(scenario.tick_interval_ms)).await;
    }

    loop {
        if let Packet::Place(place) = recv(&mut end).await? {
            println!(
                "│ server: place {:?} at {} cell(s), replace={}",
                place.element,
                place.coords.len(),
                place.replace
            );
            break;
        }
    }

    let message = (!scenario.close_message.is_empty()).then(|| scenario.close_message.clone());
    send(&mut end, &Packet::Closed { code: scenario.close_code, message }).await?;
    end.close().await;
    Ok(())
}

fn load_scenario(args: &[String]) -> Result<Scenario, BoxError> {
    let Some(index) = args.iter().position(|a| a == "--scenario") else {
        return Ok(Scenario::default());
    };
    let path = args.get(index + 1).ok_or("--scenario needs a path")?;
    let source = std::fs::read_to_string(path)?;
    let scenario: Scenario = toml::from_str(&source)?;
    scenario.session.validate()?;
    Ok(scenario)
}

fn print_manifest() -> Result<(), BoxError> {
    let manifest = ProtocolManifest::current();
    let bytes = manifest.encode()?;
    println!("┌─ PROTOCOL MANIFEST ({} bytes) ───────────────────────────────────┐", bytes.len());
    for (id, name) in &manifest.kinds {
        println!("│ kind {id:>2}  {name}");
    }
    for (code, name) in &manifest.close_reasons {
        println!("│ close {code}  {name}");
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         SANDLINK LOOPBACK SESSION                                ║");
    println!("║         Client session against a scripted server                 ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--manifest") {
        return print_manifest();
    }
    let scenario = load_scenario(&args)?;

    println!("┌─ SESSION ───────────────────────────────────────────────────────┐");
    let (client_end, server_end) = ChannelTransport::pair(64);
    let auth = StaticAuth::new(scenario.session.credential.clone(), "loopback-token");
    let (driver, handle) = SessionDriver::new(scenario.session.clone(), client_end, auth);

    let events = handle.events().clone();
    let commands = handle.commands();
    let ui = std::thread::spawn(move || {
        let mut snapshots = 0u32;
        for event in events {
            match event {
                SessionEvent::StateChanged { from, to } => println!("│ state: {from:?} → {to:?}"),
                SessionEvent::InitReceived(init) => {
                    println!(
                        "│ world {}x{} with {} elements",
                        init.width,
                        init.height,
                        init.elements.len()
                    );
                    let place = PlaceCommand::new("sand", vec![Coord::new(5.0, 5.0)]);
                    if commands.blocking_send(SessionCommand::Place(place)).is_err() {
                        println!("│ driver gone before placement");
                    }
                }
                SessionEvent::RosterReset(clients) => println!("│ roster: {} player(s)", clients.len()),
                SessionEvent::ChatHistoryReset(messages) => {
                    for message in messages {
                        println!("│ chat <{}> {}", message.author_username, message.content);
                    }
                }
                SessionEvent::SnapshotUpdated { .. } => snapshots += 1,
                SessionEvent::TpsUpdated(tps) => println!("│ tps: {tps}"),
                SessionEvent::Closed { template, substitution, .. } => {
                    let text = sandlink_shared::ReasonText::new(template, substitution);
                    println!("│ closed: {text}");
                }
                _ => {}
            }
        }
        snapshots
    });

    let (cause, served) = tokio::join!(driver.run(), scripted_server(server_end, &scenario));
    served?;
    let cause = cause?;
    drop(handle);
    let snapshots = ui.join().map_err(|_| "ui thread panicked")?;

    println!("└─────────────────────────────────────────────────────────────────┘");
    println!();
    println!("  Snapshots received: {snapshots}");
    println!("  Close cause:        {cause:?}");
    Ok(())
}
