//! # Codec Properties
//!
//! Seeded randomized checks over the message and cell codecs, plus the
//! pre-identify acceptance rule.
//!
//! Run with: cargo test --package sandlink_networking --test codec_properties

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sandlink_networking::protocol::pixel::{pack_string, unpack_string};
use sandlink_networking::protocol::{
    decode_cells, encode_cells, CursorPosition, DebugInfo, InteractiveOutput, Rgba,
};
use sandlink_networking::session::EventChannel;
use sandlink_networking::{
    ByteReader, ByteWriter, Cell, CloseCause, Coord, CursorState, EncodeError, GameInit,
    GameState, Packet, PlaceCommand, Session, SessionConfig, SessionState, ToolCommand, Value,
};
use sandlink_shared::{
    ChatMessage, ChatMessageType, Client, DisconnectReason, ElementInfo, PlayerLeaveReason,
    MAX_ARRAY_LEN,
};

const SEED: u64 = 0x5A4D_11CC;
const ROUNDS: usize = 200;

const WIDE: &[char] = &['a', 'Z', '0', ' ', 'é', 'ß', '日', '本', '🦀', '\u{7F}', '#'];

fn any_string(rng: &mut StdRng) -> String {
    let len = rng.gen_range(0..24);
    (0..len).map(|_| WIDE[rng.gen_range(0..WIDE.len())]).collect()
}

/// Characters in `0x01..=0x7F`.
fn ascii_string(rng: &mut StdRng, min: usize) -> String {
    let len = rng.gen_range(min..20);
    (0..len).map(|_| char::from(rng.gen_range(1u8..=0x7F))).collect()
}

fn number(rng: &mut StdRng) -> f64 {
    rng.gen_range(-1.0e9..1.0e9)
}

fn colors(rng: &mut StdRng) -> Vec<String> {
    (0..rng.gen_range(0..4)).map(|_| any_string(rng)).collect()
}

fn client(rng: &mut StdRng) -> Client {
    Client {
        id: any_string(rng),
        username: any_string(rng),
        joined_at: number(rng),
        color: colors(rng),
    }
}

fn chat_message(rng: &mut StdRng) -> ChatMessage {
    ChatMessage {
        id: any_string(rng),
        created_at: number(rng),
        author: any_string(rng),
        author_username: any_string(rng),
        author_color: colors(rng),
        content: any_string(rng),
        message_type: ChatMessageType::from_u8(rng.gen_range(0..5)),
        permission_level: f64::from(rng.gen_range(0u8..4)),
        reason: f64::from(rng.gen_range(0u8..5)),
    }
}

fn game_init(rng: &mut StdRng) -> GameInit {
    let elements = (0..rng.gen_range(0..12))
        .map(|_| ElementInfo {
            name: any_string(rng),
            category: any_string(rng),
            is_tool: rng.gen_bool(0.2),
            dark_text: rng.gen_bool(0.5),
            color: colors(rng),
        })
        .collect();
    let settings = (0..rng.gen_range(0..5))
        .map(|_| {
            let value = match rng.gen_range(0..3) {
                0 => Value::Bool(rng.gen_bool(0.5)),
                1 => Value::Number(number(rng)),
                _ => Value::String(any_string(rng)),
            };
            (any_string(rng), value)
        })
        .collect();
    GameInit {
        width: f64::from(rng.gen_range(1u16..2048)),
        height: f64::from(rng.gen_range(1u16..2048)),
        elements,
        settings,
    }
}

fn cell(rng: &mut StdRng) -> Cell {
    let mut cell = Cell {
        x: Some(f64::from(rng.gen_range(0u16..1024))),
        y: Some(f64::from(rng.gen_range(0u16..1024))),
        ..Cell::default()
    };
    if rng.gen_bool(0.7) {
        cell.element = Some(ascii_string(rng, 0));
    }
    if rng.gen_bool(0.5) {
        cell.color = Some(Rgba::new(rng.gen(), rng.gen(), rng.gen(), rng.gen()));
    }
    if rng.gen_bool(0.3) {
        cell.temp = Some(number(rng));
    }
    if rng.gen_bool(0.2) {
        cell.charge = Some(number(rng));
    }
    if rng.gen_bool(0.2) {
        cell.burning = Some(rng.gen_bool(0.5));
    }
    if rng.gen_bool(0.1) {
        cell.clone = Some(ascii_string(rng, 1));
    }
    if rng.gen_bool(0.3) {
        cell.alpha = Some(rng.gen_range(0.0..1.0));
    }
    cell
}

fn assert_round_trip(packet: &Packet) {
    let bytes = packet.encode().unwrap();
    assert_eq!(bytes[0], packet.kind().as_u8());
    let decoded = Packet::decode(&bytes).unwrap().expect("known kind");
    assert_eq!(&decoded, packet);
}

// ============================================================================
// MESSAGE CODEC
// ============================================================================

#[test]
fn test_random_roster_and_chat_messages_round_trip() {
    let mut rng = StdRng::seed_from_u64(SEED);
    for _ in 0..ROUNDS {
        assert_round_trip(&Packet::ClientJoin(client(&mut rng)));
        assert_round_trip(&Packet::ClientLeave {
            client: client(&mut rng),
            reason: PlayerLeaveReason::from_code(rng.gen_range(0..5)),
        });
        assert_round_trip(&Packet::ChatMessage(chat_message(&mut rng)));
    }
}

#[test]
fn test_random_lists_round_trip() {
    let mut rng = StdRng::seed_from_u64(SEED ^ 1);
    for _ in 0..ROUNDS / 4 {
        let players = (0..rng.gen_range(0..16)).map(|_| client(&mut rng)).collect();
        assert_round_trip(&Packet::GamePlayers(players));
        let history = (0..rng.gen_range(0..16)).map(|_| chat_message(&mut rng)).collect();
        assert_round_trip(&Packet::ChatInit(history));
    }
}

#[test]
fn test_random_world_init_round_trips() {
    let mut rng = StdRng::seed_from_u64(SEED ^ 2);
    for _ in 0..ROUNDS / 2 {
        assert_round_trip(&Packet::GameInit(game_init(&mut rng)));
    }
}

#[test]
fn test_random_snapshots_round_trip() {
    let mut rng = StdRng::seed_from_u64(SEED ^ 3);
    for _ in 0..ROUNDS / 4 {
        let cells = (0..rng.gen_range(0..64)).map(|_| cell(&mut rng)).collect();
        let cursors = (0..rng.gen_range(0..4))
            .map(|_| CursorPosition {
                x: number(&mut rng),
                y: number(&mut rng),
                size: f64::from(rng.gen_range(1u8..16)),
                player: any_string(&mut rng),
            })
            .collect();
        assert_round_trip(&Packet::GameState(GameState {
            tick: f64::from(rng.gen::<u32>()),
            cells,
            cursors,
        }));
    }
}

#[test]
fn test_random_commands_round_trip() {
    let mut rng = StdRng::seed_from_u64(SEED ^ 4);
    for _ in 0..ROUNDS {
        let coords: Vec<Coord> = (0..rng.gen_range(0..32))
            .map(|_| Coord::new(number(&mut rng), number(&mut rng)))
            .collect();
        let mut place = PlaceCommand::new(any_string(&mut rng), coords.clone());
        place.replace = rng.gen_bool(0.5);
        assert_round_trip(&Packet::Place(place));
        assert_round_trip(&Packet::Tool(ToolCommand::new(any_string(&mut rng), coords.clone())));
        assert_round_trip(&Packet::Delete { coords });
    }
}

#[test]
fn test_array_over_limit_writes_nothing() {
    let mut writer = ByteWriter::new();
    writer.write_u8(7);

    let values = vec![Value::Bool(true); MAX_ARRAY_LEN + 1];
    let err = writer.write_array(&values).unwrap_err();
    assert_eq!(err, EncodeError::ArrayTooLong { len: MAX_ARRAY_LEN + 1, max: MAX_ARRAY_LEN });
    assert_eq!(writer.as_slice(), &[7]);

    let coords = vec![Coord::default(); MAX_ARRAY_LEN + 1];
    let err = Packet::Delete { coords }.encode().unwrap_err();
    assert!(matches!(err, EncodeError::ArrayTooLong { .. }));
}

#[test]
fn test_array_at_limit_is_accepted() {
    let mut writer = ByteWriter::new();
    let values = vec![Value::Bool(false); MAX_ARRAY_LEN];
    writer.write_array(&values).unwrap();
    assert_eq!(&writer.as_slice()[..2], &[0xFF, 0xFF]);
}

// ============================================================================
// CELL CODEC
// ============================================================================

#[test]
fn test_random_cell_streams_preserve_order() {
    let mut rng = StdRng::seed_from_u64(SEED ^ 5);
    for _ in 0..ROUNDS {
        let cells: Vec<Cell> = (0..rng.gen_range(1..48)).map(|_| cell(&mut rng)).collect();
        let bytes = encode_cells(&cells).unwrap();
        assert_eq!(decode_cells(&bytes).unwrap(), cells);
    }
}

#[test]
fn test_repeated_property_starts_next_record() {
    let mut stream = Vec::new();
    for (x, y) in [(1.0f64, 2.0f64), (3.0, 4.0)] {
        stream.push(0);
        stream.extend_from_slice(&x.to_be_bytes());
        stream.push(1);
        stream.extend_from_slice(&y.to_be_bytes());
    }

    let cells = decode_cells(&stream).unwrap();
    assert_eq!(cells.len(), 2);
    assert_eq!(cells[0].position(), Some((1.0, 2.0)));
    assert_eq!(cells[1].position(), Some((3.0, 4.0)));
}

#[test]
fn test_random_packed_strings_round_trip() {
    let mut rng = StdRng::seed_from_u64(SEED ^ 6);
    for _ in 0..ROUNDS {
        let text = ascii_string(&mut rng, 0);
        let packed = pack_string(&text).unwrap();
        assert_eq!(packed.len(), text.len().max(1));
        assert!(packed[..packed.len() - 1].iter().all(|b| b & 1 == 1));
        assert_eq!(packed[packed.len() - 1] & 1, 0);

        let mut reader = ByteReader::new(&packed);
        assert_eq!(unpack_string(&mut reader).unwrap(), text);
        assert!(reader.is_empty());
    }
}

#[test]
fn test_wide_characters_cannot_be_packed() {
    for text in ["café", "日本", "sand🦀", "nul\0"] {
        let err = pack_string(text).unwrap_err();
        assert!(matches!(err, EncodeError::UnpackableChar(_)), "{text:?}");
    }
}

// ============================================================================
// PRE-IDENTIFY ACCEPTANCE
// ============================================================================

fn everything_but_identify() -> Vec<Packet> {
    vec![
        Packet::IdentifyResponse { access_token: "t".into() },
        Packet::ClientJoin(Client::default()),
        Packet::ClientLeave { client: Client::default(), reason: PlayerLeaveReason::Kicked },
        Packet::ServerHeartbeat,
        Packet::ClientHeartbeat,
        Packet::ClientUpdate(Client::default()),
        Packet::ProfileUpdate { username: "u".into(), color: Vec::new() },
        Packet::GameState(GameState::default()),
        Packet::GamePlayers(vec![Client::default()]),
        Packet::ClientState(CursorState::default()),
        Packet::GameInit(GameInit::default()),
        Packet::ChatMessage(ChatMessage::default()),
        Packet::ChatSend { content: "hi".into() },
        Packet::Place(PlaceCommand::default()),
        Packet::Delete { coords: Vec::new() },
        Packet::ChatInit(vec![ChatMessage::default()]),
        Packet::Disconnect,
        Packet::Closed { code: 3004, message: None },
        Packet::Tool(ToolCommand::default()),
        Packet::ChatDelete { id: "m".into() },
        Packet::DebugInspect(DebugInfo::default()),
        Packet::DebugRequest(Coord::default()),
        Packet::InteractiveOutput(InteractiveOutput::default()),
        Packet::InteractiveInput { from: "f".into(), result: "r".into() },
    ]
}

#[test]
fn test_nothing_but_identify_is_processed_before_identify() {
    let packets = everything_but_identify();
    assert_eq!(packets.len(), 24);

    for opened in [false, true] {
        let (tx, rx) = EventChannel::unbounded().split();
        let mut session = Session::new(SessionConfig::default(), tx);
        if opened {
            session.transport_opened();
        }
        let expected = session.state();
        while rx.try_recv().is_ok() {}

        for packet in packets.clone() {
            let frame = packet.encode().unwrap();
            assert!(session.handle_frame(&frame, std::time::Instant::now()).is_none());
            assert_eq!(session.state(), expected, "{:?}", packet.kind());
        }
        assert!(!session.has_outbound());
        assert!(rx.try_recv().is_err());
        assert!(session.roster().is_empty());
        assert!(session.world().is_none());

        // the refusal among them is what the teardown reports
        session.transport_closed();
        assert_eq!(
            session.close_cause(),
            Some(&CloseCause::Server { reason: DisconnectReason::ServerFull, message: None })
        );
    }

    let (tx, _rx) = EventChannel::unbounded().split();
    let mut session = Session::new(SessionConfig::default(), tx);
    assert_eq!(session.state(), SessionState::Connecting);
    session.transport_opened();
    assert_eq!(session.state(), SessionState::AwaitingIdentify);
}
