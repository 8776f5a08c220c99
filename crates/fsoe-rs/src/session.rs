// crates/fsoe-rs/src/session.rs
use crate::FsoeError;
use crate::frame::PdoMap;
use crate::hal::{SafetyMasterSession, SessionStateListener};
use alloc::boxed::Box;
use core::fmt;
use log::{debug, info, trace};

/// States of the FSoE connection, as reported by the master session.
/// (ETG.5100, section 8.4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Initial state after start and after any connection error.
    #[default]
    Reset,
    /// Session ids are exchanged.
    Session,
    /// The connection id and the slave address are checked.
    Connection,
    /// Watchdog time and application parameters are transferred.
    Parameter,
    /// Safe process data is exchanged.
    Data,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Reset => "Reset",
            SessionState::Session => "Session",
            SessionState::Connection => "Connection",
            SessionState::Parameter => "Parameter",
            SessionState::Data => "Data",
        };
        f.write_str(name)
    }
}

impl<F> SessionStateListener for F
where
    F: FnMut(SessionState, SessionState),
{
    fn on_state_change(&mut self, previous: SessionState, current: SessionState) {
        self(previous, current)
    }
}

/// Moves the frames of a master session in and out of the safety PDUs.
///
/// The request goes into the RxPDO buffer, the reply is read from the
/// TxPDO buffer. While the slave has not answered after a start, its frame
/// is all zeros and is not forwarded to the session.
pub struct SafetyPduLink<S: SafetyMasterSession> {
    session: S,
    running: bool,
    in_initial_reset: bool,
    last_state: SessionState,
    listener: Option<Box<dyn SessionStateListener>>,
}

impl<S: SafetyMasterSession> SafetyPduLink<S> {
    pub fn new(session: S) -> Self {
        let last_state = session.state();
        Self {
            session,
            running: false,
            in_initial_reset: false,
            last_state,
            listener: None,
        }
    }

    /// Registers the callback invoked on every session state change.
    pub fn with_listener(mut self, listener: impl SessionStateListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn start(&mut self) {
        info!("Starting FSoE master session");
        self.in_initial_reset = true;
        self.running = true;
    }

    pub fn stop(&mut self) {
        info!("Stopping FSoE master session");
        self.in_initial_reset = false;
        self.running = false;
    }

    /// Writes the next master frame into the RxPDO buffer. Starts the link
    /// on the first call.
    pub fn transmit(&mut self, rpdo: &mut PdoMap) -> Result<(), FsoeError> {
        if !self.running {
            self.start();
        }
        let request = self.session.get_request();
        rpdo.set_item_bytes(&request)?;
        trace!("FSoE request of {} bytes written", request.len());
        self.notify_state();
        Ok(())
    }

    /// Hands the slave frame in the TxPDO buffer to the session.
    /// Returns false if the frame was discarded.
    pub fn receive(&mut self, tpdo: &PdoMap) -> bool {
        let reply = tpdo.get_item_bytes();
        if self.in_initial_reset {
            // Byte 0 is the command and 0 is not a valid one.
            if reply.first().is_none_or(|command| *command == 0) {
                trace!("Slave has not answered yet, reply discarded");
                return false;
            }
            self.in_initial_reset = false;
        }
        self.session.set_reply(reply);
        self.notify_state();
        true
    }

    fn notify_state(&mut self) {
        let current = self.session.state();
        if current == self.last_state {
            return;
        }
        let previous = core::mem::replace(&mut self.last_state, current);
        debug!("FSoE session state changed: {} -> {}", previous, current);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_state_change(previous, current);
        }
    }
}

impl<S: SafetyMasterSession + fmt::Debug> fmt::Debug for SafetyPduLink<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafetyPduLink")
            .field("session", &self.session)
            .field("running", &self.running)
            .field("in_initial_reset", &self.in_initial_reset)
            .field("last_state", &self.last_state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{PdoWireItem, Register};
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    /// Goes one state further on every accepted reply.
    #[derive(Debug, Default)]
    struct MockSession {
        replies: Vec<Vec<u8>>,
        state: SessionState,
    }

    impl SafetyMasterSession for MockSession {
        fn get_request(&mut self) -> Vec<u8> {
            vec![0x36, 0xAA, 0x00, 0x12, 0x34, 0x01]
        }

        fn set_reply(&mut self, reply: &[u8]) {
            self.replies.push(reply.to_vec());
            self.state = match self.state {
                SessionState::Reset => SessionState::Session,
                SessionState::Session => SessionState::Connection,
                SessionState::Connection => SessionState::Parameter,
                SessionState::Parameter | SessionState::Data => SessionState::Data,
            };
        }

        fn state(&self) -> SessionState {
            self.state
        }
    }

    fn pdo_map() -> PdoMap {
        let mut map = PdoMap::rpdo();
        map.add_item(PdoWireItem::mapped(Register::new("CMD", 0x6000, 1), 8));
        map.add_item(PdoWireItem::padding(8));
        map.add_item(PdoWireItem::mapped(Register::new("CRC0", 0x6000, 2), 16));
        map.add_item(PdoWireItem::mapped(Register::new("CONNID", 0x6000, 3), 16));
        map
    }

    #[test]
    fn test_transmit_writes_request() {
        let mut link = SafetyPduLink::new(MockSession::default());
        let mut rpdo = pdo_map();
        assert!(!link.is_running());
        link.transmit(&mut rpdo).unwrap();
        assert!(link.is_running());
        assert_eq!(rpdo.get_item_bytes(), [0x36, 0xAA, 0x00, 0x12, 0x34, 0x01]);

        let mut short = PdoMap::rpdo();
        short.add_item(PdoWireItem::padding(8));
        assert_eq!(link.transmit(&mut short), Err(FsoeError::InvalidFrameLength(6)));
    }

    #[test]
    fn test_zero_replies_ignored_after_start() {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        let mut link = SafetyPduLink::new(MockSession::default())
            .with_listener(move |previous, current| sink.borrow_mut().push((previous, current)));
        let mut rpdo = pdo_map();
        let mut tpdo = pdo_map();
        link.transmit(&mut rpdo).unwrap();

        assert!(!link.receive(&tpdo));
        assert!(link.session().replies.is_empty());

        tpdo.set_item_bytes(&[0x2A, 0, 0, 0, 0, 0]).unwrap();
        assert!(link.receive(&tpdo));
        assert_eq!(link.state(), SessionState::Session);

        // Out of the initial reset, zero frames go to the session.
        tpdo.set_item_bytes(&[0; 6]).unwrap();
        assert!(link.receive(&tpdo));
        assert_eq!(link.session().replies.len(), 2);
        assert_eq!(
            *changes.borrow(),
            [
                (SessionState::Reset, SessionState::Session),
                (SessionState::Session, SessionState::Connection)
            ]
        );

        link.stop();
        assert!(!link.is_running());
        assert_eq!(link.into_session().replies.len(), 2);
    }
}
