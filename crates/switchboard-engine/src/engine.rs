//! The dispatch engine: deferred, ordered execution of inbound messages.
//!
//! Messages decoded during one loop iteration are queued, then drained
//! strictly first-in first-out by [`Engine::process`]. After the drain,
//! [`Engine::state_check`] gives the active phase one chance to move the
//! session forward.
//!
//! # Failure policy
//!
//! ```text
//! handler Err ──→ phase has catch? ──no──→ fatal (Unrecovered)
//!                        │yes
//!                        ▼
//!                  on_error(..) ──Recovered──→ continue with next message
//!                        │ Unrecovered ──→ fatal (Unrecovered)
//!                        │ Err ──────────→ fatal (CatchFailed)
//! ```

use switchboard_protocol::{MessengerError, Opcode, ProtocolError, Value};
use switchboard_transport::ConnectionId;
use tracing::{debug, error, info, warn};

use crate::{Connection, EngineError, HandlerError, Phase, Recovery};

/// What the event loop pulled off a connection.
#[derive(Debug)]
enum Inbound {
    Message { opcode: Opcode, args: Vec<Value> },
    Malformed(ProtocolError),
}

#[derive(Debug)]
struct Queued {
    origin: ConnectionId,
    inbound: Inbound,
}

/// Process-wide dispatch state: the active phase plus the pending queue.
pub struct Engine {
    phase: Box<dyn Phase>,
    queued: Vec<Queued>,
}

impl Engine {
    /// Creates an engine running `phase`.
    pub fn new(phase: Box<dyn Phase>) -> Self {
        info!(phase = phase.name(), "engine started");
        Self {
            phase,
            queued: Vec::new(),
        }
    }

    /// The active phase.
    pub fn phase(&self) -> &dyn Phase {
        self.phase.as_ref()
    }

    /// The active phase, mutably.
    pub fn phase_mut(&mut self) -> &mut dyn Phase {
        self.phase.as_mut()
    }

    /// Number of messages waiting for [`process`](Self::process).
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Hands a newly accepted connection to the active phase.
    pub fn accept(&mut self, conn: Connection) {
        debug!(conn = %conn.id(), peer = %conn.peer(), phase = self.phase.name(), "inbound connection");
        self.phase.accept(conn);
    }

    /// Appends a decoded message to the queue.
    ///
    /// Opcodes that the active table does not know are queued all the
    /// same; they fail at lookup time and go through the catch hook.
    pub fn queue(&mut self, opcode: Opcode, args: Vec<Value>, origin: ConnectionId) {
        debug!(
            conn = %origin,
            %opcode,
            op = self.phase.op_name(opcode).unwrap_or("INVALID"),
            ?args,
            "queued"
        );
        self.queued.push(Queued {
            origin,
            inbound: Inbound::Message { opcode, args },
        });
    }

    /// Queues an undecodable frame so the catch hook sees it in order.
    pub fn queue_malformed(&mut self, error: ProtocolError, origin: ConnectionId) {
        debug!(conn = %origin, %error, "queued malformed message");
        self.queued.push(Queued {
            origin,
            inbound: Inbound::Malformed(error),
        });
    }

    /// Drives every open connection's messenger until it has nothing more,
    /// queuing what it yields.
    ///
    /// Connections are visited in roster order, and each one's messages in
    /// the order they were decoded. A connection whose stream fails is
    /// parked: it stays with its phase but is no longer read, written, or
    /// polled. One that reaches end-of-file is only no longer read; what
    /// the phase sends it still goes out.
    pub fn pump(&mut self) {
        let mut pulled = Vec::new();

        for conn in self.phase.connections_mut() {
            if !conn.is_open() {
                continue;
            }
            if let Err(e) = conn.flush() {
                warn!(conn = %conn.id(), peer = %conn.peer(), error = %e, "write failed; parking connection");
                conn.park();
                continue;
            }
            while conn.is_readable() {
                match conn.receive() {
                    Ok(Some(msg)) => pulled.push((
                        conn.id(),
                        Inbound::Message {
                            opcode: msg.opcode,
                            args: msg.args,
                        },
                    )),
                    Ok(None) => break,
                    Err(MessengerError::Malformed(e)) => {
                        pulled.push((conn.id(), Inbound::Malformed(e)));
                    }
                    Err(e) if e.is_eof() => {
                        debug!(conn = %conn.id(), peer = %conn.peer(), "peer finished sending");
                        conn.shut_read();
                    }
                    Err(MessengerError::Transport(e)) => {
                        warn!(conn = %conn.id(), peer = %conn.peer(), error = %e, "read failed; parking connection");
                        conn.park();
                    }
                }
            }
        }

        for (origin, inbound) in pulled {
            match inbound {
                Inbound::Message { opcode, args } => self.queue(opcode, args, origin),
                Inbound::Malformed(e) => self.queue_malformed(e, origin),
            }
        }
    }

    /// Drains the queue in arrival order, invoking each handler.
    ///
    /// The queue is empty afterwards, even on error.
    ///
    /// # Errors
    /// Any handler failure the active phase does not recover from.
    pub fn process(&mut self) -> Result<(), EngineError> {
        for Queued { origin, inbound } in std::mem::take(&mut self.queued) {
            let (op, args, result) = match inbound {
                Inbound::Message { opcode, args } => {
                    let op = self.op_label(opcode);
                    let result = self.phase.handle(opcode, origin, &args);
                    (op, args, result)
                }
                Inbound::Malformed(e) => ("MALFORMED".to_string(), Vec::new(), Err(e.into())),
            };

            if let Err(error) = result {
                self.recover(error, origin, op, &args)?;
            }
        }
        Ok(())
    }

    /// Runs the active phase's state check and installs its successor, if
    /// it returned one.
    pub fn state_check(&mut self) {
        if let Some(next) = self.phase.on_tick() {
            info!(from = self.phase.name(), to = next.name(), "phase transition");
            self.phase = next;
        }
    }

    fn recover(
        &mut self,
        error: HandlerError,
        origin: ConnectionId,
        op: String,
        args: &[Value],
    ) -> Result<(), EngineError> {
        let phase = self.phase.name();

        if !self.phase.has_catch() {
            error!(phase, %origin, %op, %error, "handler failed and no catch is configured");
            return Err(EngineError::Unrecovered {
                phase,
                op,
                origin,
                source: error,
            });
        }

        warn!(phase, %origin, %op, %error, "handler failed; passing to catch");
        match self.phase.on_error(&error, origin, args) {
            Ok(Recovery::Recovered) => {
                debug!(phase, %origin, %op, "recovered");
                Ok(())
            }
            Ok(Recovery::Unrecovered) => {
                error!(phase, %origin, %op, "catch declined to recover");
                Err(EngineError::Unrecovered {
                    phase,
                    op,
                    origin,
                    source: error,
                })
            }
            Err(secondary) => {
                error!(phase, %origin, %op, error = %secondary, "catch failed");
                Err(EngineError::CatchFailed {
                    phase,
                    op,
                    origin,
                    original: error,
                    source: secondary,
                })
            }
        }
    }

    fn op_label(&self, opcode: Opcode) -> String {
        match self.phase.op_name(opcode) {
            Some(name) => name.to_string(),
            None => format!("INVALID({opcode})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records every call; fails opcode 1, recovers per `catch`.
    struct Recorder {
        log: Log,
        catch: Option<Result<Recovery, ()>>,
        next: Option<&'static str>,
    }

    impl Recorder {
        fn boxed(log: &Log, catch: Option<Result<Recovery, ()>>) -> Box<dyn Phase> {
            Box::new(Self {
                log: Arc::clone(log),
                catch,
                next: None,
            })
        }
    }

    struct Named(&'static str);

    impl Phase for Named {
        fn name(&self) -> &'static str {
            self.0
        }
        fn op_name(&self, _: Opcode) -> Option<&'static str> {
            None
        }
        fn handle(&mut self, opcode: Opcode, _: ConnectionId, _: &[Value]) -> Result<(), HandlerError> {
            Err(HandlerError::UnknownOpcode(opcode))
        }
        fn on_tick(&mut self) -> Option<Box<dyn Phase>> {
            None
        }
        fn accept(&mut self, _: Connection) {}
        fn connections(&self) -> Vec<&Connection> {
            Vec::new()
        }
        fn connections_mut(&mut self) -> Vec<&mut Connection> {
            Vec::new()
        }
    }

    impl Phase for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn op_name(&self, opcode: Opcode) -> Option<&'static str> {
            match opcode.0 {
                0 => Some("OK"),
                1 => Some("FAIL"),
                _ => None,
            }
        }

        fn handle(&mut self, opcode: Opcode, origin: ConnectionId, args: &[Value]) -> Result<(), HandlerError> {
            let tag = args.first().and_then(Value::as_str).unwrap_or("-");
            self.log.lock().unwrap().push(format!("{origin}:{opcode}:{tag}"));
            match opcode.0 {
                0 => Ok(()),
                1 => Err(HandlerError::arguments("FAIL", "always")),
                _ => Err(HandlerError::UnknownOpcode(opcode)),
            }
        }

        fn has_catch(&self) -> bool {
            self.catch.is_some()
        }

        fn on_error(&mut self, error: &HandlerError, origin: ConnectionId, _: &[Value]) -> Result<Recovery, HandlerError> {
            self.log.lock().unwrap().push(format!("catch {origin}: {error}"));
            match self.catch {
                Some(Ok(recovery)) => Ok(recovery),
                _ => Err(HandlerError::UnknownConnection(origin)),
            }
        }

        fn on_tick(&mut self) -> Option<Box<dyn Phase>> {
            self.log.lock().unwrap().push("tick".into());
            self.next.take().map(|name| Box::new(Named(name)) as Box<dyn Phase>)
        }

        fn accept(&mut self, _: Connection) {}

        fn connections(&self) -> Vec<&Connection> {
            Vec::new()
        }

        fn connections_mut(&mut self) -> Vec<&mut Connection> {
            Vec::new()
        }
    }

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_process_runs_in_queue_order_and_empties_queue() {
        let log = Log::default();
        let mut engine = Engine::new(Recorder::boxed(&log, None));

        engine.queue(Opcode(0), vec!["a".into()], conn(1));
        engine.queue(Opcode(0), vec!["b".into()], conn(2));
        engine.queue(Opcode(0), vec!["c".into()], conn(1));
        assert_eq!(engine.queued_len(), 3);

        engine.process().unwrap();
        assert_eq!(engine.queued_len(), 0);
        assert_eq!(entries(&log), vec!["conn-1:#0:a", "conn-2:#0:b", "conn-1:#0:c"]);
    }

    #[test]
    fn test_process_on_empty_queue_is_a_no_op() {
        let log = Log::default();
        let mut engine = Engine::new(Recorder::boxed(&log, None));
        engine.process().unwrap();
        assert!(entries(&log).is_empty());
    }

    #[test]
    fn test_recovered_failure_continues_with_next_message() {
        let log = Log::default();
        let mut engine = Engine::new(Recorder::boxed(&log, Some(Ok(Recovery::Recovered))));

        engine.queue(Opcode(1), vec!["bad".into()], conn(1));
        engine.queue(Opcode(0), vec!["good".into()], conn(2));
        engine.process().unwrap();

        let log = entries(&log);
        assert_eq!(log.len(), 3);
        assert_eq!(log[0], "conn-1:#1:bad");
        assert!(log[1].starts_with("catch conn-1"));
        assert_eq!(log[2], "conn-2:#0:good");
    }

    #[test]
    fn test_unknown_opcode_goes_through_catch() {
        let log = Log::default();
        let mut engine = Engine::new(Recorder::boxed(&log, Some(Ok(Recovery::Recovered))));

        engine.queue(Opcode(99), Vec::new(), conn(4));
        engine.process().unwrap();
        assert!(entries(&log).iter().any(|l| l.starts_with("catch conn-4")));
    }

    #[test]
    fn test_malformed_message_goes_through_catch() {
        let log = Log::default();
        let mut engine = Engine::new(Recorder::boxed(&log, Some(Ok(Recovery::Recovered))));

        engine.queue_malformed(ProtocolError::Decode("not a list".into()), conn(5));
        engine.process().unwrap();
        assert_eq!(entries(&log), vec!["catch conn-5: malformed message: not a list"]);
    }

    #[test]
    fn test_declined_recovery_is_fatal() {
        let log = Log::default();
        let mut engine = Engine::new(Recorder::boxed(&log, Some(Ok(Recovery::Unrecovered))));

        engine.queue(Opcode(1), Vec::new(), conn(1));
        engine.queue(Opcode(0), vec!["never".into()], conn(1));
        let err = engine.process().unwrap_err();

        assert!(matches!(err, EngineError::Unrecovered { ref op, .. } if op == "FAIL"));
        assert!(!entries(&log).iter().any(|l| l.ends_with("never")));
        assert_eq!(engine.queued_len(), 0);
    }

    #[test]
    fn test_failure_without_catch_is_fatal() {
        let log = Log::default();
        let mut engine = Engine::new(Recorder::boxed(&log, None));

        engine.queue(Opcode(1), Vec::new(), conn(2));
        let err = engine.process().unwrap_err();
        assert!(matches!(err, EngineError::Unrecovered { phase: "recorder", .. }));
        assert!(!entries(&log).iter().any(|l| l.starts_with("catch")));
    }

    #[test]
    fn test_failing_catch_is_fatal_and_keeps_both_errors() {
        let log = Log::default();
        let mut engine = Engine::new(Recorder::boxed(&log, Some(Err(()))));

        engine.queue(Opcode(1), Vec::new(), conn(3));
        match engine.process().unwrap_err() {
            EngineError::CatchFailed { original, source, origin, .. } => {
                assert_eq!(origin, conn(3));
                assert!(matches!(original, HandlerError::Arguments { op: "FAIL", .. }));
                assert!(matches!(source, HandlerError::UnknownConnection(_)));
            }
            other => panic!("expected CatchFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_state_check_swaps_phase() {
        let log = Log::default();
        let mut engine = Engine::new(Box::new(Recorder {
            log: Arc::clone(&log),
            catch: None,
            next: Some("next"),
        }));

        assert_eq!(engine.phase().name(), "recorder");
        engine.state_check();
        assert_eq!(engine.phase().name(), "next");
        assert_eq!(entries(&log), vec!["tick"]);

        // The new phase's table is the one consulted now.
        engine.queue(Opcode(0), Vec::new(), conn(1));
        assert!(engine.process().is_err());
    }

    #[test]
    fn test_state_check_without_transition_keeps_phase() {
        let log = Log::default();
        let mut engine = Engine::new(Recorder::boxed(&log, None));
        engine.state_check();
        engine.state_check();
        assert_eq!(engine.phase().name(), "recorder");
        assert_eq!(entries(&log), vec!["tick", "tick"]);
    }
}
