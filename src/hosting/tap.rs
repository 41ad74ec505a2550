use super::Registry;
use crate::ConnId;
use crate::protocol::Direction;
use crate::protocol::Frame;
use crate::protocol::Header;
use crate::session::Injection;
use crate::session::Settings;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc::unbounded_channel;

/// One line from the relay: a decoded frame it saw, or a connection that
/// went away.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Tapped {
    Frame {
        conn: ConnId,
        direction: Direction,
        header: Header,
        payload: Value,
    },
    Closed {
        conn: ConnId,
        closed: bool,
    },
}

/// One line to the relay: a frame to write into a client connection.
#[derive(Debug, Clone, Serialize)]
pub struct Injected<'a> {
    pub conn: ConnId,
    pub header: &'a Header,
    pub payload: &'a Value,
}

impl<'a> From<&'a Injection> for Injected<'a> {
    fn from(injection: &'a Injection) -> Self {
        Self {
            conn: injection.conn,
            header: &injection.frame.header,
            payload: &injection.frame.payload,
        }
    }
}

/// Newline-delimited JSON endpoint the relay streams through.
/// Each relay link gets its own [`Registry`].
pub struct Tap;

impl Tap {
    pub async fn run(bind: &str, settings: Settings) -> anyhow::Result<()> {
        let listener = TcpListener::bind(bind).await?;
        log::info!("[tap] listening on {}", listener.local_addr()?);
        Self::serve(listener, Arc::new(settings)).await
    }

    pub async fn serve(listener: TcpListener, settings: Arc<Settings>) -> anyhow::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            log::info!("[tap] relay connected from {}", peer);
            let settings = settings.clone();
            tokio::spawn(async move {
                match Self::link(stream, settings).await {
                    Ok(()) => log::info!("[tap] relay {} disconnected", peer),
                    Err(e) => log::error!("[tap] relay {} failed: {:#}", peer, e),
                }
            });
        }
    }

    /// Pumps one relay link until it hangs up, then closes its sessions.
    async fn link(stream: TcpStream, settings: Arc<Settings>) -> anyhow::Result<()> {
        stream.set_nodelay(true)?;
        let (source, mut sink) = stream.into_split();
        let (outlet, mut injections) = unbounded_channel::<Injection>();
        let registry = Registry::new(settings, outlet);
        let mut lines = BufReader::new(source).lines();
        let result = loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => Self::accept(&registry, &line).await,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e.into()),
                },
                Some(injection) = injections.recv() => {
                    if let Err(e) = Self::inject(&mut sink, &injection).await {
                        break Err(e);
                    }
                },
            }
        };
        registry.shutdown().await;
        result
    }

    async fn inject(sink: &mut OwnedWriteHalf, injection: &Injection) -> anyhow::Result<()> {
        let mut bytes = serde_json::to_vec(&Injected::from(injection))?;
        bytes.push(b'\n');
        sink.write_all(&bytes).await?;
        log::debug!("[tap] injected {} into {}", injection.frame.kind(), injection.conn);
        Ok(())
    }

    async fn accept(registry: &Registry, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match serde_json::from_str::<Tapped>(line) {
            Ok(Tapped::Frame {
                conn,
                direction,
                header,
                payload,
            }) => registry.route(conn, direction, Frame { header, payload }).await,
            Ok(Tapped::Closed { conn, closed: true }) => {
                registry.close(conn).await;
            }
            Ok(Tapped::Closed { .. }) => {}
            Err(e) => log::warn!("[tap] unreadable line: {}", e),
        }
    }
}
