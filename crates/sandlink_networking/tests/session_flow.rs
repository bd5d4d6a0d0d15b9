//! # Session Flow Tests
//!
//! End-to-end runs of the session driver against a scripted server over an
//! in-memory transport.
//!
//! Run with: cargo test --package sandlink_networking --test session_flow

use crossbeam_channel::Receiver;
use sandlink_networking::{
    AuthError, ChannelTransport, CloseCause, Coord, DecodeError, GameInit, Packet, PlaceCommand,
    SessionCommand, SessionConfig, SessionDriver, SessionEvent, SessionState, StaticAuth,
    Transport, UnknownKindPolicy,
};
use sandlink_shared::{Client, DisconnectReason, ElementInfo};

fn config() -> SessionConfig {
    SessionConfig {
        credential: "cookie".into(),
        ..SessionConfig::default()
    }
}

async fn send(end: &mut ChannelTransport, packet: Packet) {
    end.send(packet.encode().unwrap()).await.unwrap();
}

async fn next(end: &mut ChannelTransport) -> Packet {
    let frame = end.recv().await.expect("client hung up");
    Packet::decode(&frame).unwrap().expect("known kind")
}

fn element(name: &str) -> ElementInfo {
    ElementInfo {
        name: name.into(),
        ..ElementInfo::default()
    }
}

fn world() -> GameInit {
    GameInit {
        width: 100.0,
        height: 100.0,
        elements: vec![element("sand"), element("water")],
        settings: Vec::new(),
    }
}

/// Drives the handshake up to `Identified` and proves it with a heartbeat.
async fn handshake(server: &mut ChannelTransport) {
    send(server, Packet::Identify { connection_id: "conn-1".into() }).await;
    assert_eq!(
        next(server).await,
        Packet::IdentifyResponse { access_token: "tok".into() }
    );
    send(server, Packet::GameInit(world())).await;
    send(server, Packet::ServerHeartbeat).await;
    assert_eq!(next(server).await, Packet::ClientHeartbeat);
}

fn closed_events(events: &Receiver<SessionEvent>) -> Vec<SessionEvent> {
    events
        .try_iter()
        .filter(|e| matches!(e, SessionEvent::Closed { .. }))
        .collect()
}

#[tokio::test]
async fn test_handshake_place_then_server_full() {
    let (client_end, mut server) = ChannelTransport::pair(32);
    let (driver, handle) = SessionDriver::new(config(), client_end, StaticAuth::new("cookie", "tok"));
    let events = handle.events().clone();
    let commands = handle.commands();

    let script = async move {
        handshake(&mut server).await;

        let place = PlaceCommand::new("sand", vec![Coord::new(5.0, 5.0)]);
        assert!(commands.send(SessionCommand::Place(place)).await.is_ok());
        let Packet::Place(placed) = next(&mut server).await else {
            panic!("expected a place message");
        };
        assert_eq!(placed.element, "sand");
        assert!(!placed.replace);
        assert_eq!(placed.coords, vec![Coord::new(5.0, 5.0)]);

        send(&mut server, Packet::Closed { code: 3004, message: None }).await;
        server
    };

    let (cause, mut server) = tokio::join!(driver.run(), script);
    assert_eq!(
        cause.unwrap(),
        CloseCause::Server { reason: DisconnectReason::ServerFull, message: None }
    );
    // nothing after the single placement
    assert!(server.recv().await.is_none());

    let all: Vec<_> = events.try_iter().collect();
    assert!(all.contains(&SessionEvent::StateChanged {
        from: SessionState::Identifying,
        to: SessionState::Identified,
    }));
    let closed: Vec<_> = all
        .iter()
        .filter(|e| matches!(e, SessionEvent::Closed { .. }))
        .collect();
    assert_eq!(closed.len(), 1);
    assert!(matches!(
        closed[0],
        SessionEvent::Closed { template: "Server is full, please try again later.", substitution: None, .. }
    ));
    assert!(matches!(all.last(), Some(SessionEvent::Closed { .. })));
}

#[tokio::test]
async fn test_kick_carries_message() {
    let (client_end, mut server) = ChannelTransport::pair(32);
    let (driver, handle) = SessionDriver::new(config(), client_end, StaticAuth::new("cookie", "tok"));
    let events = handle.events().clone();

    let script = async move {
        handshake(&mut server).await;
        send(&mut server, Packet::Closed { code: 3001, message: Some("griefing".into()) }).await;
    };
    let (cause, ()) = tokio::join!(driver.run(), script);
    assert!(matches!(cause.unwrap(), CloseCause::Server { reason: DisconnectReason::Kicked, .. }));

    let closed = closed_events(&events);
    let SessionEvent::Closed { template, substitution, .. } = &closed[0] else {
        unreachable!();
    };
    let text = sandlink_shared::ReasonText::new(*template, substitution.clone());
    assert_eq!(text.render(), "You have been kicked from the server. griefing");
}

#[tokio::test]
async fn test_transport_loss_is_lost_connection() {
    let (client_end, mut server) = ChannelTransport::pair(32);
    let (driver, handle) = SessionDriver::new(config(), client_end, StaticAuth::new("cookie", "tok"));
    let events = handle.events().clone();

    let script = async move {
        handshake(&mut server).await;
        send(&mut server, Packet::ClientJoin(Client { id: "p2".into(), ..Client::default() })).await;
        server.close().await;
    };
    let (cause, ()) = tokio::join!(driver.run(), script);
    assert_eq!(cause.unwrap(), CloseCause::TransportLost);

    let all: Vec<_> = events.try_iter().collect();
    assert!(all.iter().any(|e| matches!(e, SessionEvent::ClientJoined(c) if c.id == "p2")));
    let closed: Vec<_> = all
        .iter()
        .filter(|e| matches!(e, SessionEvent::Closed { .. }))
        .collect();
    assert_eq!(closed.len(), 1);
    assert!(matches!(
        closed[0],
        SessionEvent::Closed { template: "Lost connection to the server.", .. }
    ));
}

#[tokio::test]
async fn test_auth_unavailable_closes_without_answer() {
    let (client_end, mut server) = ChannelTransport::pair(32);
    let (driver, _handle) = SessionDriver::new(config(), client_end, StaticAuth::unavailable());

    let script = async move {
        send(&mut server, Packet::Identify { connection_id: "conn-1".into() }).await;
        // the client closes without sending a token
        assert!(server.recv().await.is_none());
    };
    let (cause, ()) = tokio::join!(driver.run(), script);
    assert!(matches!(cause.unwrap(), CloseCause::AuthFailed(AuthError::Unavailable(_))));
}

#[tokio::test]
async fn test_local_disconnect_sends_leave() {
    let (client_end, mut server) = ChannelTransport::pair(32);
    let (driver, handle) = SessionDriver::new(config(), client_end, StaticAuth::new("cookie", "tok"));
    let commands = handle.commands();

    let script = async move {
        handshake(&mut server).await;
        assert!(commands.send(SessionCommand::Disconnect).await.is_ok());
        assert_eq!(next(&mut server).await, Packet::Disconnect);
        assert!(server.recv().await.is_none());
    };
    let (cause, ()) = tokio::join!(driver.run(), script);
    assert_eq!(cause.unwrap(), CloseCause::LocalDisconnect);
}

#[tokio::test]
async fn test_strict_policy_closes_on_unknown_kind() {
    let (client_end, mut server) = ChannelTransport::pair(32);
    let strict = SessionConfig {
        unknown_kind_policy: UnknownKindPolicy::Disconnect,
        ..config()
    };
    let (driver, _handle) = SessionDriver::new(strict, client_end, StaticAuth::new("cookie", "tok"));

    let script = async move {
        handshake(&mut server).await;
        server.send(vec![250, 0, 0]).await.unwrap();
        assert!(server.recv().await.is_none());
    };
    let (cause, ()) = tokio::join!(driver.run(), script);
    assert_eq!(
        cause.unwrap(),
        CloseCause::ProtocolViolation(DecodeError::UnknownPacketKind(250))
    );
}

#[tokio::test]
async fn test_lenient_policy_survives_garbage() {
    let (client_end, mut server) = ChannelTransport::pair(32);
    let (driver, _handle) = SessionDriver::new(config(), client_end, StaticAuth::new("cookie", "tok"));

    let script = async move {
        handshake(&mut server).await;
        server.send(vec![250, 0, 0]).await.unwrap();
        server.send(vec![12, 0]).await.unwrap();
        send(&mut server, Packet::ServerHeartbeat).await;
        assert_eq!(next(&mut server).await, Packet::ClientHeartbeat);
        send(&mut server, Packet::Closed { code: 3003, message: None }).await;
    };
    let (cause, ()) = tokio::join!(driver.run(), script);
    assert!(matches!(
        cause.unwrap(),
        CloseCause::Server { reason: DisconnectReason::Restarting, .. }
    ));
}

#[tokio::test]
async fn test_heartbeat_answered_while_identifying() {
    let (client_end, mut server) = ChannelTransport::pair(32);
    let (driver, _handle) = SessionDriver::new(config(), client_end, StaticAuth::new("cookie", "tok"));

    let script = async move {
        send(&mut server, Packet::Identify { connection_id: "c".into() }).await;
        assert!(matches!(next(&mut server).await, Packet::IdentifyResponse { .. }));
        send(&mut server, Packet::ServerHeartbeat).await;
        assert_eq!(next(&mut server).await, Packet::ClientHeartbeat);
        send(&mut server, Packet::Closed { code: 3007, message: None }).await;
    };
    let (cause, ()) = tokio::join!(driver.run(), script);
    assert!(matches!(
        cause.unwrap(),
        CloseCause::Server { reason: DisconnectReason::InactivityTimeout, .. }
    ));
}

#[tokio::test]
async fn test_refusal_before_identify_reaches_ui() {
    let (client_end, mut server) = ChannelTransport::pair(32);
    let (driver, handle) = SessionDriver::new(config(), client_end, StaticAuth::new("cookie", "tok"));
    let events = handle.events().clone();

    let script = async move {
        send(&mut server, Packet::Closed { code: 3005, message: None }).await;
        server.close().await;
    };
    let (cause, ()) = tokio::join!(driver.run(), script);
    assert_eq!(
        cause.unwrap(),
        CloseCause::Server { reason: DisconnectReason::AlreadyConnected, message: None }
    );

    let closed = closed_events(&events);
    assert_eq!(closed.len(), 1);
    assert!(matches!(
        &closed[0],
        SessionEvent::Closed { template: "You are already connected from another location.", .. }
    ));
}
