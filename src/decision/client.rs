use super::*;
use crate::Chips;
use crate::ConnId;
use crate::Position;
use crate::action::Suggestion;
use crate::cards::Card;
use bytes::Buf;
use bytes::BytesMut;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

/// What a decision client reports back to its session.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// The service proposes an action for the hero.
    Suggestion(Suggestion),
    /// The connection failed, closed, stalled, or spoke gibberish.
    Lost(String),
}

/// Signals are tagged with the generation of the client that produced them,
/// so a session can discard anything from a client it already tore down.
pub type Tagged = (u64, Signal);

/// Identifies one client instance in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub conn: ConnId,
    pub generation: u64,
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}#{}", self.conn, self.generation)
    }
}

/// One connection to the decision service, alive for one hand.
///
/// Messages are queued without blocking the caller and written by a
/// dedicated task that holds the [`Gate`] across each round trip, so the
/// service sees strictly one outstanding request at a time. Replies are
/// parsed by a reader task; suggestions and failures flow back to the
/// session as [`Tagged`] signals.
///
/// After [`close`](Self::close) every operation is a silent no-op.
pub struct DecisionClient {
    tag: Tag,
    gate: Arc<Gate>,
    outbox: Option<UnboundedSender<Outbound>>,
    closing: Option<oneshot::Sender<()>>,
}

impl DecisionClient {
    /// Dials the service and starts the reader and writer tasks.
    pub async fn connect(
        dialer: &dyn Dialer,
        tag: Tag,
        signals: UnboundedSender<Tagged>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let conduit = dialer
            .dial()
            .await
            .map_err(|e| anyhow::anyhow!("decision service unreachable: {}", e))?;
        log::debug!("[decision {}] connected", tag);
        Ok(Self::spawn(conduit, tag, signals, timeout))
    }

    /// Starts the client over an established stream.
    pub fn spawn<S>(
        stream: S,
        tag: Tag,
        signals: UnboundedSender<Tagged>,
        timeout: Option<Duration>,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (source, sink) = tokio::io::split(stream);
        let (tx, rx) = unbounded_channel();
        let (closing, closed) = oneshot::channel();
        let gate = Arc::new(Gate::default());
        let reader = tokio::spawn(read(source, gate.clone(), tag, signals.clone())).abort_handle();
        let relay = Relay {
            gate: gate.clone(),
            tag,
            signals,
            timeout,
        };
        tokio::spawn(write(sink, rx, closed, relay, reader));
        Self {
            tag,
            gate,
            outbox: Some(tx),
            closing: Some(closing),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }
    pub fn is_open(&self) -> bool {
        self.outbox.is_some() && !self.gate.is_closed()
    }

    pub fn start_game(
        &self,
        small_blind: Chips,
        big_blind: Chips,
        hero: Position,
        players: Vec<Entrant>,
        posted: Vec<Position>,
    ) {
        self.send(Outbound::StartGame {
            small_blind,
            big_blind,
            hero,
            players,
            posted,
        });
    }
    pub fn private_hand(&self, pid: Position, cards: Vec<Card>) {
        self.send(Outbound::PrivateHand { pid, cards });
    }
    pub fn community_cards(&self, cards: Vec<Card>) {
        self.send(Outbound::DealCommunityCards { cards });
    }
    pub fn player_move(&self, pid: Position, bet_type: BetType, amount: Chips) {
        self.send(Outbound::PlayerMove {
            pid,
            bet_type,
            amount,
        });
    }
    pub fn showdown(&self, results: Vec<Outcome>) {
        self.send(Outbound::Showdown { results });
    }

    /// Stops accepting messages. Anything already queued is still written,
    /// but the connection is shut down within [`crate::DECISION_LINGER`]
    /// of this call whether or not the service keeps answering.
    pub fn close(&mut self) {
        if self.outbox.take().is_some() {
            self.closing.take();
            log::debug!("[decision {}] closing", self.tag);
        }
    }

    fn send(&self, message: Outbound) {
        match &self.outbox {
            None => log::debug!("[decision {}] dropped {} after close", self.tag, message.name()),
            Some(outbox) => {
                log::debug!("[decision {}] queue {}", self.tag, message.name());
                if outbox.send(message).is_err() {
                    log::debug!("[decision {}] writer already gone", self.tag);
                }
            }
        }
    }
}

impl Drop for DecisionClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Writer-side state shared by every round trip.
struct Relay {
    gate: Arc<Gate>,
    tag: Tag,
    signals: UnboundedSender<Tagged>,
    timeout: Option<Duration>,
}

async fn write<W>(
    mut sink: W,
    mut outbox: UnboundedReceiver<Outbound>,
    closed: oneshot::Receiver<()>,
    relay: Relay,
    reader: AbortHandle,
) where
    W: AsyncWrite + Unpin,
{
    let linger = async {
        let _ = closed.await;
        tokio::time::sleep(crate::DECISION_LINGER).await;
    };
    tokio::select! {
        _ = relay.run(&mut sink, &mut outbox) => {}
        _ = linger => log::debug!("[decision {}] linger expired, dropping queue", relay.tag),
    }
    relay.gate.close();
    let _ = sink.shutdown().await;
    reader.abort();
    log::debug!("[decision {}] writer finished", relay.tag);
}

impl Relay {
    /// Writes queued messages one round trip at a time until the outbox
    /// closes or the connection fails, then waits for the last reply.
    async fn run<W>(&self, sink: &mut W, outbox: &mut UnboundedReceiver<Outbound>)
    where
        W: AsyncWrite + Unpin,
    {
        let Self {
            gate,
            tag,
            signals,
            timeout,
        } = self;
        while let Some(message) = outbox.recv().await {
            if gate.enter().await.is_err() {
                break;
            }
            let bytes = match serde_json::to_vec(&message) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::error!("[decision {}] cannot encode {}: {}", tag, message.name(), e);
                    gate.leave();
                    continue;
                }
            };
            log::debug!("[decision {}] send {}", tag, message.name());
            let written = match sink.write_all(&bytes).await {
                Ok(()) => sink.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                lose(gate, *tag, signals, format!("write failed: {}", e));
                break;
            }
            if let Some(limit) = *timeout {
                match tokio::time::timeout(limit, gate.idle()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => break,
                    Err(_) => {
                        lose(gate, *tag, signals, format!("no reply within {:?}", limit));
                        break;
                    }
                }
            }
        }
        let _ = gate.idle().await;
    }
}

async fn read<R>(mut source: R, gate: Arc<Gate>, tag: Tag, signals: UnboundedSender<Tagged>)
where
    R: AsyncRead + Unpin,
{
    let mut buffer = BytesMut::with_capacity(4096);
    loop {
        match source.read_buf(&mut buffer).await {
            Ok(0) => {
                lose(&gate, tag, &signals, String::from("closed by service"));
                break;
            }
            Err(e) => {
                lose(&gate, tag, &signals, format!("read failed: {}", e));
                break;
            }
            Ok(_) => match drain(&mut buffer) {
                Err(e) => {
                    lose(&gate, tag, &signals, format!("malformed reply: {}", e));
                    break;
                }
                // Replies carry no request id: every object is taken as the
                // one answer to the outstanding request.
                Ok(replies) => replies.into_iter().for_each(|reply| {
                    gate.leave();
                    receive(reply, tag, &signals);
                }),
            },
        }
    }
}

/// Splits complete JSON objects off the front of the buffer,
/// leaving any partial trailing object in place.
pub(crate) fn drain(buffer: &mut BytesMut) -> Result<Vec<Inbound>, serde_json::Error> {
    let mut stream = serde_json::Deserializer::from_slice(&buffer[..]).into_iter::<Inbound>();
    let mut replies = Vec::new();
    let failure = loop {
        match stream.next() {
            Some(Ok(reply)) => replies.push(reply),
            Some(Err(e)) if e.is_eof() => break None,
            Some(Err(e)) => break Some(e),
            None => break None,
        }
    };
    let consumed = stream.byte_offset();
    buffer.advance(consumed);
    match failure {
        Some(e) => Err(e),
        None => Ok(replies),
    }
}

fn receive(reply: Inbound, tag: Tag, signals: &UnboundedSender<Tagged>) {
    match reply {
        Inbound::Suggestion { ai_action } => {
            let suggestion = Suggestion::from(ai_action);
            log::info!("[decision {}] suggests {}", tag, suggestion);
            let _ = signals.send((tag.generation, Signal::Suggestion(suggestion)));
        }
        Inbound::Failure { error_msg, .. } => {
            log::warn!("[decision {}] service error: {}", tag, error_msg)
        }
        Inbound::Ack { success: false } => log::warn!("[decision {}] request rejected", tag),
        Inbound::Ack { success: true } => log::debug!("[decision {}] ack", tag),
    }
}

/// Reports a broken connection unless we closed it ourselves.
fn lose(gate: &Gate, tag: Tag, signals: &UnboundedSender<Tagged>, reason: String) {
    if !gate.is_closed() {
        log::warn!("[decision {}] lost: {}", tag, reason);
        let _ = signals.send((tag.generation, Signal::Lost(reason)));
    }
    gate.close();
}
