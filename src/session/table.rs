use super::*;
use crate::Chips;
use crate::ConnId;
use crate::Position;
use crate::action::Legal;
use crate::action::Play;
use crate::cards::Card;
use crate::cards::Street;
use crate::decision::BetType;
use crate::decision::DecisionClient;
use crate::decision::Entrant;
use crate::decision::Outcome;
use crate::decision::Signal;
use crate::decision::Tag;
use crate::decision::Tagged;
use crate::protocol::ActionRequest;
use crate::protocol::BoardCards;
use crate::protocol::Direction;
use crate::protocol::Enter;
use crate::protocol::Flag;
use crate::protocol::Frame;
use crate::protocol::HandResult;
use crate::protocol::HandStart;
use crate::protocol::HoleCards;
use crate::protocol::Join;
use crate::protocol::Message;
use crate::protocol::RoundChange;
use crate::protocol::SeatInfo;
use crate::protocol::Selection;
use crate::protocol::ShowHand;
use crate::protocol::TableState;
use futures::FutureExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;

/// Protocol interpreter for one client connection.
///
/// Owns the table picture, at most one [`Hand`], and at most one
/// [`DecisionClient`]. Frames are handled strictly in arrival order by
/// [`run`](Self::run); suggestions from the decision service are held as
/// [`Pending`] until the hero is on the clock and the response delay has
/// passed.
pub struct TableSession {
    conn: ConnId,
    table: u64,
    pid: String,
    small_blind: Chips,
    big_blind: Chips,
    hero: Option<Position>,
    players: BTreeMap<Position, Player>,
    forced: Forced,
    hand: Option<Hand>,
    client: Option<DecisionClient>,
    generation: u64,
    pending: Option<Pending>,
    settings: Arc<Settings>,
    outlet: UnboundedSender<Injection>,
    tx: UnboundedSender<Tagged>,
    signals: UnboundedReceiver<Tagged>,
}

impl TableSession {
    pub fn new(
        conn: ConnId,
        enter: Enter,
        settings: Arc<Settings>,
        outlet: UnboundedSender<Injection>,
    ) -> Self {
        let (tx, signals) = unbounded_channel();
        Self {
            conn,
            table: enter.table_id,
            pid: enter.pid,
            small_blind: 0,
            big_blind: 0,
            hero: None,
            players: BTreeMap::new(),
            forced: Forced::default(),
            hand: None,
            client: None,
            generation: 0,
            pending: None,
            settings,
            outlet,
            tx,
            signals,
        }
    }

    pub fn conn(&self) -> ConnId {
        self.conn
    }
    pub fn table(&self) -> u64 {
        self.table
    }
    pub fn blinds(&self) -> (Chips, Chips) {
        (self.small_blind, self.big_blind)
    }
    pub fn hero(&self) -> Option<Position> {
        self.hero
    }
    pub fn players(&self) -> &BTreeMap<Position, Player> {
        &self.players
    }
    pub fn hand(&self) -> Option<&Hand> {
        self.hand.as_ref()
    }
    pub fn pending(&self) -> Option<&Pending> {
        self.pending.as_ref()
    }
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Consumes events until the connection closes, interleaving decision
    /// signals and scheduled plays between them.
    pub async fn run(mut self, mut events: UnboundedReceiver<Event>) {
        log::info!(
            "[session {}] open table {} as {}",
            self.conn,
            self.table,
            self.pid
        );
        let mut poll = tokio::time::interval(crate::AWAIT_POLL);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let waiting = self.pending.as_ref().is_some_and(Pending::is_waiting);
            let due = self.pending.as_ref().and_then(Pending::at);
            let alarm = tokio::time::sleep_until(due.unwrap_or_else(Instant::now));
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(Event::Frame(direction, frame)) => self.dispatch(direction, frame.kind(), &frame.payload).await,
                    Some(Event::Close) | None => break,
                },
                Some((generation, signal)) = self.signals.recv() => self.signal(generation, signal),
                _ = alarm, if due.is_some() => self.fire(),
                _ = poll.tick(), if waiting => self.promote(),
            }
        }
        self.shutdown();
    }

    /// Applies one routed frame. Never fails: decoding errors, faults,
    /// and panics inside handlers are logged with the offending payload.
    pub async fn dispatch(&mut self, direction: Direction, kind: &str, payload: &Value) {
        let conn = self.conn;
        match AssertUnwindSafe(self.handle(direction, kind, payload))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::error!(
                "[session {}] {} {} failed: {:#} payload {}",
                conn,
                direction,
                kind,
                e,
                payload
            ),
            Err(_) => log::error!(
                "[session {}] {} {} panicked, payload {}",
                conn,
                direction,
                kind,
                payload
            ),
        }
    }

    async fn handle(&mut self, direction: Direction, kind: &str, payload: &Value) -> anyhow::Result<()> {
        // the hero's own choices are relayed as-is
        if direction == Direction::Outbound && kind == "Selection" {
            log::debug!("[session {}] {} Selection passes through", self.conn, direction);
            return Ok(());
        }
        match Message::decode(kind, payload)? {
            Message::Enter(enter) => self.on_enter(enter),
            Message::TableState(state) => self.on_table_state(state),
            Message::Join(join) => self.on_join(join),
            Message::HandStart(start) => self.on_hand_start(start),
            Message::HandResult(result) => self.on_hand_result(result),
            Message::RoundChange(round) => self.on_round_change(round),
            Message::Selection(selection) => self.on_selection(selection),
            Message::HoleCards(dealt) => self.on_hole_cards(dealt).await,
            Message::SeatInfo(info) => self.on_seat_info(info),
            Message::BoardCards(board) => self.on_board_cards(board),
            Message::ActionRequest(request) => self.on_action_request(request),
            Message::ShowHand(show) => self.on_show_hand(show),
            Message::Unrecognized(kind) => {
                log::debug!("[session {}] ignoring {}", self.conn, kind);
                Ok(())
            }
        }
    }

    fn on_enter(&mut self, enter: Enter) -> anyhow::Result<()> {
        if enter.table_id != self.table || enter.pid != self.pid {
            log::info!(
                "[session {}] re-entered table {} as {}",
                self.conn,
                enter.table_id,
                enter.pid
            );
            self.table = enter.table_id;
            self.pid = enter.pid;
        }
        Ok(())
    }

    fn on_table_state(&mut self, state: TableState) -> anyhow::Result<()> {
        self.small_blind = state.small_blind;
        self.big_blind = state.big_blind;
        self.players = (0..state.seat_count)
            .map(|seat| (seat, Player::default()))
            .collect();
        for seat in state.seats {
            let player = self.players.entry(seat.seat).or_default();
            player.pid = seat.pid;
            player.name = seat.name.unwrap_or_default();
            player.country = seat.country.unwrap_or_default();
            player.stack = seat.stack;
        }
        if let Some(hero) = state.hero_seat.or_else(|| self.find_hero()) {
            self.hero = Some(hero);
        }
        log::info!(
            "[session {}] table {} blinds {}/{} seats {} hero {:?}",
            self.conn,
            self.table,
            self.small_blind,
            self.big_blind,
            self.players.len(),
            self.hero
        );
        if state.hero_in_hand {
            log::warn!("[session {}] attached mid-hand, folding out", self.conn);
            self.retire();
            self.hand = Some(Hand::attached(state.hand_id.unwrap_or_default()));
        }
        Ok(())
    }

    fn on_join(&mut self, join: Join) -> anyhow::Result<()> {
        if let Some(seat) = join.seat {
            log::info!("[session {}] hero sits at {}", self.conn, seat);
            self.hero = Some(seat);
        }
        Ok(())
    }

    fn on_hand_start(&mut self, start: HandStart) -> anyhow::Result<()> {
        let forced = std::mem::take(&mut self.forced);
        let Some(hero) = self.hero.filter(|hero| start.seats.contains(hero)) else {
            if let Some(stale) = self.hand.take() {
                log::warn!("[session {}] dropping unfinished {}", self.conn, stale);
                self.retire();
            }
            log::debug!("[session {}] sitting out hand {}", self.conn, start.hand_id);
            return Ok(());
        };
        self.retire();
        let mut hand = Hand::new(start.hand_id, start.dealer, &start.seats, &self.players);
        hand.absorb(forced);
        log::info!("[session {}] {} hero {}", self.conn, hand, hero);
        self.hand = Some(hand);
        Ok(())
    }

    fn on_hand_result(&mut self, result: HandResult) -> anyhow::Result<()> {
        for update in result.stacks.iter() {
            self.players.entry(update.seat).or_default().stack = update.stack;
        }
        if let Some(hand) = self.hand.take() {
            if hand.is_armed() {
                log::info!("[session {}] folded out of hand {}", self.conn, hand.id());
            } else {
                let outcomes = Outcome::settle(&hand.contributions(), &result.pots, hand.shown());
                log::debug!("[session {}] hand {} settled {:?}", self.conn, hand.id(), outcomes);
                match self.client.as_ref() {
                    Some(client) => client.showdown(outcomes),
                    None => log::debug!("[session {}] no decision client for showdown", self.conn),
                }
            }
        }
        self.retire();
        self.forced = Forced::default();
        Ok(())
    }

    fn on_round_change(&mut self, round: RoundChange) -> anyhow::Result<()> {
        let Some(hand) = self.hand.as_mut() else {
            return Ok(());
        };
        let street = Street::from(round.round);
        if street == Street::Unknown {
            log::warn!("[session {}] unrecognized round {}", self.conn, round.round);
        }
        hand.advance(street);
        log::debug!("[session {}] {}", self.conn, street);
        Ok(())
    }

    fn on_selection(&mut self, selection: Selection) -> anyhow::Result<()> {
        let Selection {
            seat,
            flag,
            chip,
            stack,
        } = selection;
        let hero = self.hero == Some(seat);
        self.players.entry(seat).or_default().stack = stack;
        if let Some(hand) = self.hand.as_mut() {
            hand.restack(seat, stack);
            if hero {
                hand.acted();
            }
        }
        if hero {
            self.pending = None;
        }
        let amount = chip.unwrap_or_default();
        let shove = |literal| if stack == 0 { BetType::AllIn } else { literal };
        match flag {
            flag if flag.is_forced() => self.post(seat, amount),
            flag if flag.is_opt_out() => self.opt_out(seat, flag),
            Flag::SmallBlind => self.mark_small_blind(seat),
            Flag::Fold => self.announce(seat, BetType::Fold, 0),
            Flag::Call => self.announce(seat, BetType::Call, amount),
            Flag::Check => self.announce(seat, shove(BetType::Check), amount),
            Flag::Bet => self.announce(seat, shove(BetType::Bet), amount),
            Flag::Raise => self.announce(seat, shove(BetType::Raise), amount),
            Flag::AllIn => self.announce(seat, BetType::AllIn, amount),
            _ => log::warn!("[session {}] seat {} unrecognized action", self.conn, seat),
        }
        Ok(())
    }

    async fn on_hole_cards(&mut self, dealt: HoleCards) -> anyhow::Result<()> {
        let Some(hand) = self.hand.as_mut() else {
            return Ok(());
        };
        hand.set_dealer(dealt.dealer);
        if let Err(fault) = hand.check_heads_up(dealt.hands.len()) {
            log::warn!("[session {}] {}, folding out", self.conn, fault);
            hand.arm();
            return Ok(());
        }
        let cards = self
            .hero
            .and_then(|hero| dealt.hands.iter().find(|d| d.seat == hero))
            .and_then(|d| Card::known(&d.cards));
        let (Some(hero), Some(cards)) = (self.hero, cards) else {
            hand.arm();
            return Err(Fault::NoHeroCards.into());
        };
        if !hand.deal(hero, cards) {
            log::debug!("[session {}] hole cards repeated", self.conn);
            return Ok(());
        }
        self.engage().await
    }

    fn on_seat_info(&mut self, info: SeatInfo) -> anyhow::Result<()> {
        let mine = info.pid.as_deref() == Some(self.pid.as_str());
        let player = self.players.entry(info.seat).or_default();
        player.pid = info.pid;
        player.name = info.name;
        player.country = info.country;
        player.stack = info.stack;
        if mine && self.hero != Some(info.seat) {
            log::info!("[session {}] hero is seat {}", self.conn, info.seat);
            self.hero = Some(info.seat);
        }
        Ok(())
    }

    fn on_board_cards(&mut self, board: BoardCards) -> anyhow::Result<()> {
        let Some(hand) = self.hand.as_mut() else {
            return Ok(());
        };
        let cards = board
            .cards
            .iter()
            .filter_map(|code| Card::try_from(*code).ok())
            .collect::<Vec<_>>();
        hand.lay(&cards);
        if hand
            .street()
            .n_observed()
            .is_some_and(|n| hand.board().len() > n)
        {
            log::warn!(
                "[session {}] {} board cards on the {}",
                self.conn,
                hand.board().len(),
                hand.street()
            );
        }
        if let Some(client) = self.client.as_ref() {
            client.community_cards(cards);
        }
        Ok(())
    }

    fn on_action_request(&mut self, request: ActionRequest) -> anyhow::Result<()> {
        let Some(hand) = self.hand.as_mut() else {
            log::debug!("[session {}] action request outside a hand", self.conn);
            return Ok(());
        };
        let legal = Legal::from(request.actions.as_slice());
        log::info!("[session {}] hero to act {}", self.conn, legal);
        hand.ask(legal, request.timestamp);
        if self.settings.enabled && self.client.is_none() && !hand.is_armed() {
            log::warn!("[session {}] no decision client, folding out", self.conn);
            hand.arm();
        }
        self.override_fold();
        if self
            .hand
            .as_ref()
            .is_some_and(|hand| hand.legal().contains(Flag::WaitBigBlind))
        {
            self.emit(Play::new(Flag::WaitBigBlind, None), request.timestamp);
        }
        Ok(())
    }

    fn on_show_hand(&mut self, show: ShowHand) -> anyhow::Result<()> {
        let Some(hand) = self.hand.as_mut() else {
            return Ok(());
        };
        match Card::known(&show.cards) {
            Some(cards) => hand.show(show.seat, cards),
            None => log::debug!("[session {}] seat {} showed nothing", self.conn, show.seat),
        }
        Ok(())
    }

    /// Opens a decision client for the current hand and tells it
    /// everything known so far.
    async fn engage(&mut self) -> anyhow::Result<()> {
        if !self.settings.enabled {
            return Ok(());
        }
        let Some(hand) = self.hand.as_mut() else {
            return Ok(());
        };
        let (Some(hero), Some(cards)) = (self.hero, hand.hole().map(<[Card]>::to_vec)) else {
            return Ok(());
        };
        let order = match hand.rotation() {
            Ok(order) => order,
            Err(fault) => {
                hand.arm();
                return Err(fault.into());
            }
        };
        let players = order
            .iter()
            .map(|seat| {
                let (name, stack) = hand
                    .participant(*seat)
                    .map(|p| (p.name.clone(), p.stack))
                    .or_else(|| self.players.get(seat).map(|p| (p.name.clone(), p.stack)))
                    .unwrap_or_default();
                Entrant {
                    pid: *seat,
                    name,
                    stack,
                }
            })
            .collect::<Vec<_>>();
        let posted = hand.posted().to_vec();
        let board = hand.board().to_vec();
        self.retire_client();
        self.generation += 1;
        let tag = Tag {
            conn: self.conn,
            generation: self.generation,
        };
        match DecisionClient::connect(
            self.settings.dialer.as_ref(),
            tag,
            self.tx.clone(),
            self.settings.timeout,
        )
        .await
        {
            Ok(client) => {
                client.start_game(self.small_blind, self.big_blind, hero, players, posted);
                client.private_hand(hero, cards);
                if !board.is_empty() {
                    client.community_cards(board);
                }
                self.client = Some(client);
            }
            Err(e) => log::warn!(
                "[session {}] {:#}, continuing without decision client",
                self.conn,
                e
            ),
        }
        Ok(())
    }

    fn signal(&mut self, generation: u64, signal: Signal) {
        let live = self
            .client
            .as_ref()
            .is_some_and(|client| client.tag().generation == generation);
        if !live {
            log::debug!("[session {}] stale signal from #{}", self.conn, generation);
            return;
        }
        match signal {
            Signal::Suggestion(suggestion) => match self.hand.as_ref() {
                Some(hand) => {
                    log::info!("[session {}] suggested {}", self.conn, suggestion);
                    self.pending = Some(Pending::Waiting {
                        hand: hand.id(),
                        suggestion,
                    });
                }
                None => log::debug!("[session {}] suggestion outside a hand", self.conn),
            },
            Signal::Lost(reason) => {
                log::warn!("[session {}] decision service lost: {}", self.conn, reason);
                self.retire();
                if let Some(hand) = self.hand.as_mut() {
                    hand.arm();
                }
                self.override_fold();
            }
        }
    }

    /// Schedules a waiting suggestion once the hero is on the clock.
    fn promote(&mut self) {
        let Some(Pending::Waiting { hand: id, suggestion }) = self.pending else {
            return;
        };
        match self.hand.as_ref().filter(|hand| hand.id() == id) {
            None => {
                log::debug!("[session {}] dropping suggestion for hand {}", self.conn, id);
                self.pending = None;
            }
            Some(hand) if hand.is_awaiting() => {
                let requested = hand
                    .request()
                    .map(|request| request.received)
                    .unwrap_or_else(Instant::now);
                let at = self.settings.delay.deadline(requested);
                log::debug!(
                    "[session {}] playing {} in {:?}",
                    self.conn,
                    suggestion,
                    at.saturating_duration_since(Instant::now())
                );
                self.pending = Some(Pending::Scheduled {
                    hand: id,
                    suggestion,
                    at,
                });
            }
            Some(_) => {}
        }
    }

    /// Plays a scheduled suggestion against whatever is legal right now.
    fn fire(&mut self) {
        let Some(Pending::Scheduled {
            hand: id,
            suggestion,
            ..
        }) = self.pending.take()
        else {
            return;
        };
        let conn = self.conn;
        let Some(hand) = self.hand.as_mut().filter(|hand| hand.id() == id) else {
            log::debug!("[session {}] hand {} over before playing {}", conn, id, suggestion);
            return;
        };
        if !hand.is_awaiting() {
            log::debug!("[session {}] hero already acted, dropping {}", conn, suggestion);
            return;
        }
        if hand.is_armed() {
            log::debug!("[session {}] folding out, ignoring {}", conn, suggestion);
            return;
        }
        let timestamp = hand
            .request()
            .map(|request| request.timestamp)
            .unwrap_or_default();
        match suggestion.translate(hand.legal()) {
            Some(play) => {
                hand.acted();
                self.emit(play, timestamp);
            }
            None => log::warn!(
                "[session {}] nothing legal for {} in {}",
                conn,
                suggestion,
                hand.legal()
            ),
        }
    }

    /// Folds if the override is armed and the hero may fold or call.
    fn override_fold(&mut self) {
        let Some(hand) = self.hand.as_mut() else {
            return;
        };
        if !hand.disarm() {
            return;
        }
        let timestamp = hand
            .request()
            .map(|request| request.timestamp)
            .unwrap_or_default();
        hand.acted();
        log::warn!("[session {}] folding out of hand {}", self.conn, hand.id());
        self.pending = None;
        self.emit(Play::fold(), timestamp);
    }

    fn emit(&self, play: Play, timestamp: i64) {
        if !self.settings.enabled {
            log::info!("[session {}] automation off, withholding {}", self.conn, play);
            return;
        }
        log::info!("[session {}] play {}", self.conn, play);
        let injection = Injection {
            conn: self.conn,
            frame: Frame::selection(play.flag, play.chip, timestamp),
        };
        if self.outlet.send(injection).is_err() {
            log::warn!("[session {}] relay gone, dropped {}", self.conn, play);
        }
    }

    fn post(&mut self, seat: Position, chips: Chips) {
        match self.hand.as_mut() {
            Some(hand) => hand.post(seat, chips),
            None => self.forced.post(seat, chips),
        }
    }

    fn mark_small_blind(&mut self, seat: Position) {
        match self.hand.as_mut() {
            Some(hand) => hand.mark_small_blind(seat),
            None => self.forced.small_blind = Some(seat),
        }
    }

    fn announce(&self, seat: Position, bet_type: BetType, amount: Chips) {
        let Some(hand) = self.hand.as_ref() else {
            return;
        };
        if !hand.is_participant(seat) {
            log::debug!("[session {}] seat {} not in hand {}", self.conn, seat, hand.id());
            return;
        }
        if let Some(client) = self.client.as_ref() {
            client.player_move(seat, bet_type, amount);
        }
    }

    fn opt_out(&mut self, seat: Position, flag: Flag) {
        if self.hero == Some(seat) {
            if let Some(hand) = self.hand.take() {
                log::info!("[session {}] hero {}, leaving hand {}", self.conn, flag, hand.id());
            }
            self.retire();
        } else if let Some(hand) = self.hand.as_mut() {
            hand.remove(seat);
        }
    }

    fn find_hero(&self) -> Option<Position> {
        self.players
            .iter()
            .find(|(_, player)| player.pid.as_deref() == Some(self.pid.as_str()))
            .map(|(seat, _)| *seat)
    }

    /// Drops the decision client and anything it suggested.
    fn retire(&mut self) {
        self.retire_client();
        self.pending = None;
    }

    fn retire_client(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.close();
        }
    }

    fn shutdown(&mut self) {
        log::info!("[session {}] closed", self.conn);
        self.retire();
        self.hand = None;
    }
}
