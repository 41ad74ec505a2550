use crate::ConnId;
use crate::protocol::Direction;
use crate::protocol::Frame;

/// Items on a session's ordered queue.
#[derive(Debug, Clone)]
pub enum Event {
    Frame(Direction, Frame),
    Close,
}

/// A synthesized frame to be written into a connection by the relay.
#[derive(Debug, Clone, PartialEq)]
pub struct Injection {
    pub conn: ConnId,
    pub frame: Frame,
}
