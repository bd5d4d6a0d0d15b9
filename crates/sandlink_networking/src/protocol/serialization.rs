//! # Packet Serialization
//!
//! `[kind u8][fields]` framing for every [`Packet`].
//!
//! ## Design
//!
//! - The serializer owns one growable buffer and reuses it across packets
//! - A failed encode leaves the buffer empty, never half-written
//! - Nested records (clients, chat lines, elements, cursors) travel as
//!   sub-buffers inside buffer arrays
//! - An unknown kind byte decodes to `Ok(None)`; trailing bytes are ignored

use sandlink_shared::{
    ChatMessage, ChatMessageType, Client, DisconnectReason, ElementInfo, PacketKind,
    PlayerLeaveReason,
};

use super::buffer::{ByteReader, ByteWriter};
use super::commands::{read_coords, write_coords, Coord, PlaceCommand, ToolCommand};
use super::packets::{
    CursorPosition, CursorState, DebugInfo, GameInit, GameState, InteractiveOutput, Packet,
};
use super::pixel::{decode_cells, encode_cells};
use crate::error::{DecodeResult, EncodeError, EncodeResult};

/// Initial capacity of a serializer buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Packet serializer - writes packets into a reusable buffer.
///
/// This struct is designed to be reused across multiple serializations
/// to avoid allocations.
#[derive(Debug)]
pub struct PacketSerializer {
    writer: ByteWriter,
}

impl Default for PacketSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketSerializer {
    /// Creates a new serializer with a fresh buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: ByteWriter::with_capacity(DEFAULT_BUFFER_CAPACITY),
        }
    }

    /// Resets the serializer for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.writer.reset();
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.writer.len()
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    /// Returns a slice of the written data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.writer.as_slice()
    }

    /// Serializes one packet, replacing the previous contents.
    ///
    /// # Errors
    ///
    /// Returns the construction error; the buffer is left empty.
    pub fn serialize(&mut self, packet: &Packet) -> EncodeResult<&[u8]> {
        self.writer.reset();
        if let Err(err) = write_packet(&mut self.writer, packet) {
            self.writer.reset();
            return Err(err);
        }
        Ok(self.writer.as_slice())
    }
}

/// Packet deserializer - reads one packet from a frame.
#[derive(Debug)]
pub struct PacketDeserializer<'a> {
    reader: ByteReader<'a>,
}

impl<'a> PacketDeserializer<'a> {
    /// Creates a deserializer over one frame.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            reader: ByteReader::new(data),
        }
    }

    /// Returns the current read position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.reader.position()
    }

    /// Returns remaining bytes.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.reader.remaining()
    }

    /// Decodes the frame. `Ok(None)` means the kind byte is not recognized.
    ///
    /// # Errors
    ///
    /// Returns the first field that could not be read.
    pub fn deserialize(&mut self) -> DecodeResult<Option<Packet>> {
        let kind = self.reader.read_u8()?;
        match PacketKind::from_u8(kind) {
            Some(kind) => read_body(&mut self.reader, kind).map(Some),
            None => Ok(None),
        }
    }
}

impl Packet {
    /// Encodes into a fresh buffer.
    ///
    /// # Errors
    ///
    /// Returns the construction error.
    pub fn encode(&self) -> EncodeResult<Vec<u8>> {
        let mut writer = ByteWriter::new();
        write_packet(&mut writer, self)?;
        Ok(writer.into_inner())
    }

    /// Decodes one frame.
    ///
    /// # Errors
    ///
    /// Returns the first field that could not be read.
    pub fn decode(frame: &[u8]) -> DecodeResult<Option<Self>> {
        PacketDeserializer::new(frame).deserialize()
    }
}

fn write_packet(w: &mut ByteWriter, packet: &Packet) -> EncodeResult<()> {
    w.write_u8(packet.kind().as_u8());
    match packet {
        Packet::Identify { connection_id } => w.write_string(connection_id),
        Packet::IdentifyResponse { access_token } => w.write_string(access_token),
        Packet::ClientJoin(client) | Packet::ClientUpdate(client) => write_client(w, client),
        Packet::ClientLeave { client, reason } => {
            write_client(w, client)?;
            w.write_number(f64::from(reason.code()));
            Ok(())
        }
        Packet::ServerHeartbeat | Packet::ClientHeartbeat | Packet::Disconnect => Ok(()),
        Packet::ProfileUpdate { username, color } => {
            w.write_string(username)?;
            w.write_string_array(color)
        }
        Packet::GameState(state) => write_game_state(w, state),
        Packet::GamePlayers(clients) => {
            let records = clients.iter().map(client_record).collect::<EncodeResult<Vec<_>>>()?;
            w.write_buffer_array(&records)
        }
        Packet::ClientState(cursor) => {
            let position = cursor.position.unwrap_or_default();
            w.write_bool(cursor.position.is_some());
            w.write_number(position.x);
            w.write_number(position.y);
            w.write_number(cursor.size);
            Ok(())
        }
        Packet::GameInit(init) => write_game_init(w, init),
        Packet::ChatMessage(message) => write_chat(w, message),
        Packet::ChatSend { content } => w.write_string(content),
        Packet::Place(command) => command.write_to(w),
        Packet::Delete { coords } => write_coords(w, coords),
        Packet::ChatInit(messages) => {
            let records = messages.iter().map(chat_record).collect::<EncodeResult<Vec<_>>>()?;
            w.write_buffer_array(&records)
        }
        Packet::Closed { code, message } => {
            w.write_number(f64::from(*code));
            w.write_string(message.as_deref().unwrap_or_default())
        }
        Packet::Tool(command) => command.write_to(w),
        Packet::ChatDelete { id } => w.write_string(id),
        Packet::DebugInspect(info) => {
            w.write_number(info.x);
            w.write_number(info.y);
            w.write_string(&info.element)?;
            w.write_string(&info.color)?;
            w.write_number(info.start);
            w.write_object(&info.properties)
        }
        Packet::DebugRequest(coord) => {
            w.write_number(coord.x);
            w.write_number(coord.y);
            Ok(())
        }
        Packet::InteractiveOutput(output) => {
            w.write_string(&output.target)?;
            w.write_string(&output.text)?;
            w.write_bool(output.log);
            Ok(())
        }
        Packet::InteractiveInput { from, result } => {
            w.write_string(from)?;
            w.write_string(result)
        }
    }
}

fn read_body(r: &mut ByteReader<'_>, kind: PacketKind) -> DecodeResult<Packet> {
    Ok(match kind {
        PacketKind::SCIdentify => Packet::Identify {
            connection_id: r.read_string()?,
        },
        PacketKind::SSIdentify => Packet::IdentifyResponse {
            access_token: r.read_string()?,
        },
        PacketKind::SCClientJoin => Packet::ClientJoin(read_client(r)?),
        PacketKind::SCClientLeave => {
            let client = read_client(r)?;
            let reason = PlayerLeaveReason::from_code(r.read_number()? as u32);
            Packet::ClientLeave { client, reason }
        }
        PacketKind::SCHeartbeat => Packet::ServerHeartbeat,
        PacketKind::SSHeartbeat => Packet::ClientHeartbeat,
        PacketKind::SCClientUpdate => Packet::ClientUpdate(read_client(r)?),
        PacketKind::SSClientUpdate => Packet::ProfileUpdate {
            username: r.read_string()?,
            color: r.read_string_array()?,
        },
        PacketKind::GCGameState => Packet::GameState(read_game_state(r)?),
        PacketKind::GCGamePlayers => Packet::GamePlayers(
            r.read_buffer_array()?
                .into_iter()
                .map(|record| read_client(&mut ByteReader::new(record)))
                .collect::<DecodeResult<_>>()?,
        ),
        PacketKind::GSClientState => {
            let has_position = r.read_bool()?;
            let position = Coord::new(r.read_number()?, r.read_number()?);
            Packet::ClientState(CursorState {
                position: has_position.then_some(position),
                size: r.read_number()?,
            })
        }
        PacketKind::GCGameInit => Packet::GameInit(read_game_init(r)?),
        PacketKind::CCChatMessage => Packet::ChatMessage(read_chat(r)?),
        PacketKind::CSChatMessage => Packet::ChatSend {
            content: r.read_string()?,
        },
        PacketKind::GSPlace => Packet::Place(PlaceCommand::read_from(r)?),
        PacketKind::GSDelete => Packet::Delete {
            coords: read_coords(r)?,
        },
        PacketKind::CCChatInit => Packet::ChatInit(
            r.read_buffer_array()?
                .into_iter()
                .map(|record| read_chat(&mut ByteReader::new(record)))
                .collect::<DecodeResult<_>>()?,
        ),
        PacketKind::SSDisconnect => Packet::Disconnect,
        PacketKind::SCClosed => {
            let code = r.read_number()? as u32;
            let message = r.read_string()?;
            Packet::Closed {
                code,
                message: (!message.is_empty()).then_some(message),
            }
        }
        PacketKind::GSTool => Packet::Tool(ToolCommand::read_from(r)?),
        PacketKind::CCChatDelete => Packet::ChatDelete { id: r.read_string()? },
        PacketKind::GCDebugInspect => Packet::DebugInspect(DebugInfo {
            x: r.read_number()?,
            y: r.read_number()?,
            element: r.read_string()?,
            color: r.read_string()?,
            start: r.read_number()?,
            properties: r.read_object()?,
        }),
        PacketKind::GSDebugRequest => {
            Packet::DebugRequest(Coord::new(r.read_number()?, r.read_number()?))
        }
        PacketKind::GCInteractiveOutput => Packet::InteractiveOutput(InteractiveOutput {
            target: r.read_string()?,
            text: r.read_string()?,
            log: r.read_bool()?,
        }),
        PacketKind::GSInteractiveInput => Packet::InteractiveInput {
            from: r.read_string()?,
            result: r.read_string()?,
        },
    })
}

// ============================================================================
// NESTED RECORDS
// ============================================================================

fn write_client(w: &mut ByteWriter, client: &Client) -> EncodeResult<()> {
    w.write_string(&client.id)?;
    w.write_string(&client.username)?;
    w.write_number(client.joined_at);
    w.write_string_array(&client.color)
}

fn read_client(r: &mut ByteReader<'_>) -> DecodeResult<Client> {
    Ok(Client {
        id: r.read_string()?,
        username: r.read_string()?,
        joined_at: r.read_number()?,
        color: r.read_string_array()?,
    })
}

fn client_record(client: &Client) -> EncodeResult<Vec<u8>> {
    let mut w = ByteWriter::new();
    write_client(&mut w, client)?;
    Ok(w.into_inner())
}

fn write_chat(w: &mut ByteWriter, message: &ChatMessage) -> EncodeResult<()> {
    w.write_string(&message.id)?;
    w.write_number(message.created_at);
    w.write_string(&message.author)?;
    w.write_string(&message.author_username)?;
    w.write_string_array(&message.author_color)?;
    w.write_string(&message.content)?;
    w.write_number(f64::from(message.message_type as u8));
    w.write_number(message.permission_level);
    w.write_number(message.reason);
    Ok(())
}

fn read_chat(r: &mut ByteReader<'_>) -> DecodeResult<ChatMessage> {
    Ok(ChatMessage {
        id: r.read_string()?,
        created_at: r.read_number()?,
        author: r.read_string()?,
        author_username: r.read_string()?,
        author_color: r.read_string_array()?,
        content: r.read_string()?,
        message_type: ChatMessageType::from_u8(r.read_number()? as u8),
        permission_level: r.read_number()?,
        reason: r.read_number()?,
    })
}

fn chat_record(message: &ChatMessage) -> EncodeResult<Vec<u8>> {
    let mut w = ByteWriter::new();
    write_chat(&mut w, message)?;
    Ok(w.into_inner())
}

fn element_record(element: &ElementInfo) -> EncodeResult<Vec<u8>> {
    let mut w = ByteWriter::new();
    w.write_string(&element.name)?;
    w.write_string(&element.category)?;
    w.write_bool(element.is_tool);
    w.write_bool(element.dark_text);
    w.write_string_array(&element.color)?;
    Ok(w.into_inner())
}

fn read_element(r: &mut ByteReader<'_>) -> DecodeResult<ElementInfo> {
    Ok(ElementInfo {
        name: r.read_string()?,
        category: r.read_string()?,
        is_tool: r.read_bool()?,
        dark_text: r.read_bool()?,
        color: r.read_string_array()?,
    })
}

fn cursor_record(cursor: &CursorPosition) -> EncodeResult<Vec<u8>> {
    let mut w = ByteWriter::new();
    w.write_number(cursor.x);
    w.write_number(cursor.y);
    w.write_number(cursor.size);
    w.write_string(&cursor.player)?;
    Ok(w.into_inner())
}

fn read_cursor(r: &mut ByteReader<'_>) -> DecodeResult<CursorPosition> {
    Ok(CursorPosition {
        x: r.read_number()?,
        y: r.read_number()?,
        size: r.read_number()?,
        player: r.read_string()?,
    })
}

fn write_game_state(w: &mut ByteWriter, state: &GameState) -> EncodeResult<()> {
    let pixels = encode_cells(&state.cells)?;
    let cursors = state.cursors.iter().map(cursor_record).collect::<EncodeResult<Vec<_>>>()?;
    if cursors.len() > sandlink_shared::MAX_ARRAY_LEN {
        return Err(EncodeError::ArrayTooLong {
            len: cursors.len(),
            max: sandlink_shared::MAX_ARRAY_LEN,
        });
    }
    w.write_number(state.tick);
    w.write_number(pixels.len() as f64);
    w.write_raw(&pixels);
    w.write_buffer_array(&cursors)
}

fn read_game_state(r: &mut ByteReader<'_>) -> DecodeResult<GameState> {
    let tick = r.read_number()?;
    // Negative and NaN lengths saturate to zero.
    let stream_len = r.read_number()? as usize;
    let cells = decode_cells(r.read_raw(stream_len)?)?;
    let cursors = r
        .read_buffer_array()?
        .into_iter()
        .map(|record| read_cursor(&mut ByteReader::new(record)))
        .collect::<DecodeResult<_>>()?;
    Ok(GameState { tick, cells, cursors })
}

fn write_game_init(w: &mut ByteWriter, init: &GameInit) -> EncodeResult<()> {
    let elements = init.elements.iter().map(element_record).collect::<EncodeResult<Vec<_>>>()?;
    if elements.len() > sandlink_shared::MAX_ARRAY_LEN {
        return Err(EncodeError::ArrayTooLong {
            len: elements.len(),
            max: sandlink_shared::MAX_ARRAY_LEN,
        });
    }
    w.write_number(init.width);
    w.write_number(init.height);
    w.write_buffer_array(&elements)?;
    w.write_object(&init.settings)
}

fn read_game_init(r: &mut ByteReader<'_>) -> DecodeResult<GameInit> {
    Ok(GameInit {
        width: r.read_number()?,
        height: r.read_number()?,
        elements: r
            .read_buffer_array()?
            .into_iter()
            .map(|record| read_element(&mut ByteReader::new(record)))
            .collect::<DecodeResult<_>>()?,
        settings: r.read_object()?,
    })
}

// ============================================================================
// PROTOCOL MANIFEST
// ============================================================================

/// Static lookup tables describing the protocol.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProtocolManifest {
    /// `(kind byte, name)` for every packet kind.
    pub kinds: Vec<(u32, String)>,
    /// `(code, name)` for every known close reason.
    pub close_reasons: Vec<(u32, String)>,
}

impl ProtocolManifest {
    /// Builds the manifest of this build.
    #[must_use]
    pub fn current() -> Self {
        Self {
            kinds: PacketKind::ALL
                .iter()
                .map(|kind| (u32::from(kind.as_u8()), kind.name().to_owned()))
                .collect(),
            close_reasons: DisconnectReason::KNOWN
                .iter()
                .map(|reason| (reason.code(), format!("{reason:?}")))
                .collect(),
        }
    }

    /// Encodes as two enum tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a name exceeds the string limit.
    pub fn encode(&self) -> EncodeResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        for table in [&self.kinds, &self.close_reasons] {
            let entries: Vec<(u32, &str)> =
                table.iter().map(|(id, key)| (*id, key.as_str())).collect();
            w.write_enum_table(&entries)?;
        }
        Ok(w.into_inner())
    }

    /// Decodes two enum tables.
    ///
    /// # Errors
    ///
    /// Returns the first field that could not be read.
    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let mut r = ByteReader::new(bytes);
        Ok(Self {
            kinds: r.read_enum_table()?,
            close_reasons: r.read_enum_table()?,
        })
    }
}
