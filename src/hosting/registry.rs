use crate::ConnId;
use crate::protocol::Direction;
use crate::protocol::Enter;
use crate::protocol::Frame;
use crate::protocol::Message;
use crate::session::Event;
use crate::session::Injection;
use crate::session::Settings;
use crate::session::TableSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::task::JoinHandle;

/// Handle to a running session task.
pub struct SessionHandle {
    pub conn: ConnId,
    pub table: u64,
    events: UnboundedSender<Event>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn send(&self, event: Event) -> bool {
        self.events.send(event).is_ok()
    }
}

/// Owns every live table session on one relay link, keyed by connection.
/// Sessions share nothing; each runs as its own task fed by an ordered queue.
pub struct Registry {
    sessions: RwLock<HashMap<ConnId, SessionHandle>>,
    settings: Arc<Settings>,
    outlet: UnboundedSender<Injection>,
}

impl Registry {
    pub fn new(settings: Arc<Settings>, outlet: UnboundedSender<Injection>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            settings,
            outlet,
        }
    }

    /// Spawns a session for a freshly entered connection.
    /// Fails if the connection already has one.
    pub async fn open(&self, conn: ConnId, enter: Enter) -> anyhow::Result<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&conn) {
            anyhow::bail!("connection {} already has a session", conn);
        }
        let table = enter.table_id;
        let (events, rx) = unbounded_channel();
        let session = TableSession::new(conn, enter, self.settings.clone(), self.outlet.clone());
        let task = tokio::spawn(session.run(rx));
        sessions.insert(
            conn,
            SessionHandle {
                conn,
                table,
                events,
                task,
            },
        );
        log::info!("[registry] opened session {} on table {}", conn, table);
        Ok(())
    }

    /// Table the connection is seated at, if it has a session.
    pub async fn lookup(&self, conn: ConnId) -> Option<u64> {
        self.sessions.read().await.get(&conn).map(|handle| handle.table)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Removes the session and tells it to shut down. Closing an unknown
    /// or already closed connection does nothing.
    pub async fn close(&self, conn: ConnId) -> bool {
        match self.sessions.write().await.remove(&conn) {
            Some(handle) => {
                handle.send(Event::Close);
                log::info!("[registry] closed session {}", conn);
                true
            }
            None => false,
        }
    }

    /// Closes every session and waits for their tasks to finish.
    pub async fn shutdown(&self) {
        let handles = self
            .sessions
            .write()
            .await
            .drain()
            .map(|(_, handle)| handle)
            .collect::<Vec<_>>();
        for handle in handles {
            handle.send(Event::Close);
            if let Err(e) = handle.task.await {
                log::error!("[registry] session {} task failed: {}", handle.conn, e);
            }
        }
    }

    /// Hands a decoded frame to its connection's session. Frames outside
    /// the routed set never reach a session; `Enter` opens one.
    pub async fn route(&self, conn: ConnId, direction: Direction, frame: Frame) {
        if !frame.is_routed() {
            return;
        }
        if frame.kind() == "Enter" && self.lookup(conn).await.is_none() {
            match Message::decode(frame.kind(), &frame.payload) {
                Ok(Message::Enter(enter)) => {
                    if let Err(e) = self.open(conn, enter).await {
                        log::warn!("[registry] {}", e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("[registry] connection {}: {}", conn, e);
                    return;
                }
            }
        }
        match self.sessions.read().await.get(&conn) {
            Some(handle) => {
                if !handle.send(Event::Frame(direction, frame)) {
                    log::warn!("[registry] session {} is gone", conn);
                }
            }
            None => log::debug!("[registry] {} for connection {} without a session", frame.kind(), conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Delay;
    use crate::decision::Conduit;
    use crate::decision::Dialer;
    use crate::decision::Tcp;
    use crate::protocol::Header;
    use bytes::Buf;
    use bytes::BytesMut;
    use serde_json::Value;
    use serde_json::json;
    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;
    use tokio::io::DuplexStream;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Loopback(UnboundedSender<DuplexStream>);

    #[async_trait::async_trait]
    impl Dialer for Loopback {
        async fn dial(&self) -> std::io::Result<Box<dyn Conduit>> {
            let (ours, theirs) = tokio::io::duplex(1 << 16);
            self.0
                .send(theirs)
                .map_err(|_| std::io::Error::other("test hung up"))?;
            Ok(Box::new(ours))
        }
    }

    fn registry() -> (Registry, UnboundedReceiver<Injection>) {
        let (outlet, injections) = unbounded_channel();
        let settings = Arc::new(Settings {
            enabled: false,
            delay: Delay::default(),
            dialer: Arc::new(Tcp::new("127.0.0.1", 9)),
            timeout: None,
        });
        (Registry::new(settings, outlet), injections)
    }

    fn frame(kind: &str, payload: Value) -> Frame {
        Frame {
            header: Header {
                kind: kind.to_string(),
                channel: 0,
            },
            payload,
        }
    }

    fn enter() -> Enter {
        Enter {
            table_id: 5,
            pid: String::from("hero"),
        }
    }

    #[tokio::test]
    async fn open_lookup_close() {
        let (registry, _) = registry();
        registry.open(1, enter()).await.unwrap();
        assert!(registry.open(1, enter()).await.is_err());
        assert_eq!(registry.lookup(1).await, Some(5));
        assert_eq!(registry.lookup(2).await, None);
        assert!(registry.close(1).await);
        assert!(!registry.close(1).await);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn enter_opens_session() {
        let (registry, _) = registry();
        registry
            .route(3, Direction::Outbound, frame("Chat", json!({})))
            .await;
        registry
            .route(3, Direction::Outbound, frame("TableState", json!({})))
            .await;
        assert_eq!(registry.len().await, 0);
        registry
            .route(
                3,
                Direction::Outbound,
                frame("Enter", json!({ "table_id": 8, "pid": "hero" })),
            )
            .await;
        assert_eq!(registry.lookup(3).await, Some(8));
        registry
            .route(
                3,
                Direction::Outbound,
                frame("Enter", json!({ "table_id": 8, "pid": "hero" })),
            )
            .await;
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn malformed_enter_opens_nothing() {
        let (registry, _) = registry();
        registry
            .route(4, Direction::Outbound, frame("Enter", json!({ "pid": 1 })))
            .await;
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn shutdown_waits_for_sessions() {
        let (registry, _) = registry();
        registry.open(1, enter()).await.unwrap();
        registry.open(2, enter()).await.unwrap();
        registry.shutdown().await;
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn close_releases_decision_client_once() {
        let (outlet, _injections) = unbounded_channel();
        let (dials, mut service) = unbounded_channel();
        let settings = Arc::new(Settings {
            enabled: true,
            delay: Delay::default(),
            dialer: Arc::new(Loopback(dials)),
            timeout: None,
        });
        let registry = Registry::new(settings, outlet);
        let frames = [
            ("Enter", json!({ "table_id": 5, "pid": "hero" })),
            (
                "TableState",
                json!({
                    "small_blind": 5,
                    "big_blind": 10,
                    "seat_count": 6,
                    "seats": [
                        { "seat": 0, "pid": "a", "name": "alice", "stack": 1000 },
                        { "seat": 2, "pid": "hero", "name": "me", "stack": 1000 },
                        { "seat": 4, "pid": "b", "name": "bob", "stack": 1000 },
                    ]
                }),
            ),
            ("Selection", json!({ "seat": 0, "flag": "SB", "stack": 1000 })),
            ("Selection", json!({ "seat": 0, "flag": "BLIND", "chip": 5, "stack": 995 })),
            ("Selection", json!({ "seat": 2, "flag": "BLIND", "chip": 10, "stack": 990 })),
            ("HandStart", json!({ "hand_id": 1, "dealer": 4, "seats": [0, 2, 4] })),
            (
                "HoleCards",
                json!({
                    "dealer": 4,
                    "hands": [
                        { "seat": 0, "cards": [255, 255] },
                        { "seat": 2, "cards": [48, 49] },
                        { "seat": 4, "cards": [255, 255] },
                    ]
                }),
            ),
        ];
        for (kind, payload) in frames {
            registry.route(1, Direction::Inbound, frame(kind, payload)).await;
        }
        let mut far = service.recv().await.unwrap();
        assert!(registry.close(1).await);
        let mut buffer = BytesMut::new();
        let mut seen = 0;
        while far.read_buf(&mut buffer).await.unwrap() > 0 {
            let mut stream = serde_json::Deserializer::from_slice(&buffer[..]).into_iter::<Value>();
            let mut complete = 0;
            while let Some(Ok(_)) = stream.next() {
                complete += 1;
            }
            let consumed = stream.byte_offset();
            buffer.advance(consumed);
            for _ in 0..complete {
                let _ = far.write_all(br#"{"success":true}"#).await;
            }
            seen += complete;
        }
        assert_eq!(seen, 2);
        assert!(!registry.close(1).await);
        assert_eq!(far.read_buf(&mut buffer).await.unwrap(), 0);
        assert!(service.try_recv().is_err());
        assert_eq!(registry.len().await, 0);
    }
}
