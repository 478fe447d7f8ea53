//! Length-prefixed message framing over a non-blocking byte stream.
//!
//! Every frame is a 4-byte big-endian payload length followed by that many
//! payload bytes:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┐
//! │ len: u32 BE  │ payload: codec([op, args..]) │
//! └──────────────┴──────────────────────────────┘
//! ```
//!
//! Reads are driven by a two-state machine so that a frame may arrive over
//! any number of reads:
//!
//! ```text
//!   Header { filled < 4 } ──(4 bytes)──→ Payload { remaining }
//!      ↑  ↑                                    │
//!      │  └─────────(remaining == 0, decode)───┘
//!      │
//!      │            (len > max_frame)
//!      └──(skipped)── Discard { remaining }
//! ```
//!
//! Nothing is peeked; header bytes are accumulated like payload bytes. An
//! oversized frame is reported as soon as its header arrives and its
//! payload is then read and thrown away, so memory stays bounded and the
//! next frame is found where the peer put it.

use std::io::{self, ErrorKind};

use switchboard_transport::{Socket, TransportError};
use tokio::net::TcpStream;

use crate::{Codec, Message, MessengerError, MsgpackCodec, ProtocolError};

/// Size of the length prefix.
pub const HEADER_LEN: usize = 4;

/// Largest payload a [`Messenger`] buffers unless told otherwise (1 MiB).
pub const DEFAULT_MAX_FRAME: usize = 1024 * 1024;

/// Largest slice requested from the socket in one payload read.
const READ_CHUNK: usize = 4096;

/// Encodes `message` with `codec` and prepends the length header.
pub fn encode_frame<C: Codec>(codec: &C, message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let payload = codec.encode(message)?;
    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::FrameTooLarge(payload.len()))?;

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

#[derive(Debug)]
enum ReadState {
    Header { buf: [u8; HEADER_LEN], filled: usize },
    Payload { remaining: usize },
    Discard { remaining: usize },
}

impl ReadState {
    fn header() -> Self {
        Self::Header {
            buf: [0; HEADER_LEN],
            filled: 0,
        }
    }
}

/// Reads and writes framed [`Message`]s on one socket.
///
/// `receive` never blocks: it returns `Ok(None)` as soon as the socket has
/// nothing more to give, keeping any partial header or payload for the
/// next call. `send` never blocks either: bytes the socket will not take
/// yet stay queued in order until [`flush`](Self::flush) succeeds.
pub struct Messenger<S = TcpStream, C = MsgpackCodec> {
    socket: S,
    codec: C,
    max_frame: usize,
    state: ReadState,
    buffered: Vec<u8>,
    outbound: Vec<u8>,
}

impl<S: Socket, C: Codec + Default> Messenger<S, C> {
    /// Wraps `socket` with the default codec.
    pub fn new(socket: S) -> Self {
        Self::with_codec(socket, C::default())
    }
}

impl<S: Socket, C: Codec> Messenger<S, C> {
    /// Wraps `socket` with an explicit codec.
    pub fn with_codec(socket: S, codec: C) -> Self {
        Self {
            socket,
            codec,
            max_frame: DEFAULT_MAX_FRAME,
            state: ReadState::header(),
            buffered: Vec::new(),
            outbound: Vec::new(),
        }
    }

    /// Sets the largest payload `receive` accepts.
    #[must_use]
    pub fn with_max_frame(mut self, max_frame: usize) -> Self {
        self.max_frame = max_frame;
        self
    }

    /// Returns the wrapped socket.
    pub fn socket(&self) -> &S {
        &self.socket
    }

    /// Frames and sends a message.
    ///
    /// Whatever the socket does not accept immediately is kept and written
    /// by later [`flush`](Self::flush) calls, ahead of any newer frames.
    pub fn send(&mut self, message: &Message) -> Result<(), MessengerError> {
        let frame = encode_frame(&self.codec, message)?;
        self.outbound.extend_from_slice(&frame);
        self.flush()?;
        Ok(())
    }

    /// Writes as much queued output as the socket accepts right now.
    pub fn flush(&mut self) -> Result<(), TransportError> {
        while !self.outbound.is_empty() {
            match self.socket.try_write(&self.outbound) {
                Ok(0) => {
                    return Err(TransportError::SendFailed(io::Error::from(
                        ErrorKind::WriteZero,
                    )));
                }
                Ok(n) => {
                    self.outbound.drain(..n);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::SendFailed(e)),
            }
        }
        Ok(())
    }

    /// Returns `true` while sent bytes are still waiting for the socket.
    pub fn has_pending_output(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Returns the next complete message, or `Ok(None)` if the socket has
    /// no more bytes right now.
    ///
    /// # Errors
    /// - [`MessengerError::Malformed`] when a complete payload fails to
    ///   decode, or a header declares more than the frame limit. Either
    ///   way the frame is consumed and the caller may keep reading.
    /// - [`MessengerError::Transport`] when the peer closed the stream or
    ///   the read failed.
    pub fn receive(&mut self) -> Result<Option<Message>, MessengerError> {
        loop {
            match &mut self.state {
                ReadState::Header { buf, filled } => {
                    let Some(n) = read_some(&self.socket, &mut buf[*filled..])? else {
                        return Ok(None);
                    };
                    *filled += n;
                    if *filled < HEADER_LEN {
                        continue;
                    }

                    let expected = u32::from_be_bytes(*buf) as usize;
                    if expected == 0 {
                        self.state = ReadState::header();
                        return Ok(Some(Message::empty()));
                    }
                    if expected > self.max_frame {
                        self.state = ReadState::Discard {
                            remaining: expected,
                        };
                        return Err(ProtocolError::FrameTooLarge(expected).into());
                    }
                    self.buffered.reserve(expected.min(READ_CHUNK));
                    self.state = ReadState::Payload {
                        remaining: expected,
                    };
                }
                ReadState::Payload { remaining } => {
                    let mut chunk = [0u8; READ_CHUNK];
                    let want = (*remaining).min(READ_CHUNK);
                    let Some(n) = read_some(&self.socket, &mut chunk[..want])? else {
                        return Ok(None);
                    };
                    self.buffered.extend_from_slice(&chunk[..n]);
                    *remaining -= n;
                    if *remaining > 0 {
                        continue;
                    }

                    self.state = ReadState::header();
                    let payload = std::mem::take(&mut self.buffered);
                    let message = self.codec.decode::<Message>(&payload)?;
                    return Ok(Some(message));
                }
                ReadState::Discard { remaining } => {
                    let mut chunk = [0u8; READ_CHUNK];
                    let want = (*remaining).min(READ_CHUNK);
                    let Some(n) = read_some(&self.socket, &mut chunk[..want])? else {
                        return Ok(None);
                    };
                    *remaining -= n;
                    if *remaining == 0 {
                        self.state = ReadState::header();
                    }
                }
            }
        }
    }
}

/// One non-blocking read. `Ok(None)` means "would block".
fn read_some<S: Socket>(socket: &S, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
    match socket.try_read(buf) {
        Ok(0) => Err(TransportError::ConnectionClosed("peer closed the stream".into())),
        Ok(n) => Ok(Some(n)),
        Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
        Err(e) if e.kind() == ErrorKind::Interrupted => Ok(Some(0)),
        Err(e) => Err(TransportError::ReceiveFailed(e)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::{JsonCodec, Opcode, Value};

    /// In-memory socket fed by explicit chunks; each `try_read` returns at
    /// most one chunk so tests control exactly how frames are split.
    #[derive(Default)]
    struct ScriptedSocket {
        incoming: Mutex<VecDeque<Vec<u8>>>,
        closed: Mutex<bool>,
        written: Mutex<Vec<u8>>,
        write_budget: Mutex<Option<usize>>,
    }

    impl ScriptedSocket {
        fn feed(&self, bytes: &[u8]) {
            self.incoming.lock().unwrap().push_back(bytes.to_vec());
        }

        fn close(&self) {
            *self.closed.lock().unwrap() = true;
        }

        fn written(&self) -> Vec<u8> {
            self.written.lock().unwrap().clone()
        }

        fn set_write_budget(&self, budget: Option<usize>) {
            *self.write_budget.lock().unwrap() = budget;
        }
    }

    impl Socket for ScriptedSocket {
        fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
            let mut incoming = self.incoming.lock().unwrap();
            let Some(mut chunk) = incoming.pop_front() else {
                if *self.closed.lock().unwrap() {
                    return Ok(0);
                }
                return Err(ErrorKind::WouldBlock.into());
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                incoming.push_front(chunk.split_off(n));
            }
            Ok(n)
        }

        fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
            let mut budget = self.write_budget.lock().unwrap();
            let n = match *budget {
                Some(0) => return Err(ErrorKind::WouldBlock.into()),
                Some(b) => b.min(buf.len()),
                None => buf.len(),
            };
            if let Some(b) = budget.as_mut() {
                *b -= n;
            }
            self.written.lock().unwrap().extend_from_slice(&buf[..n]);
            Ok(n)
        }
    }

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut out = (payload.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(payload);
        out
    }

    /// JSON keeps the payloads in these tests readable.
    fn messenger() -> Messenger<ScriptedSocket, JsonCodec> {
        Messenger::with_codec(ScriptedSocket::default(), JsonCodec)
    }

    #[test]
    fn test_nothing_available_is_none() {
        let mut m = messenger();
        assert!(m.receive().unwrap().is_none());
    }

    #[test]
    fn test_payload_split_three_three_four_yields_once() {
        let payload = br#"[1,"abcd"]"#.to_vec();
        assert_eq!(payload.len(), 10);

        let mut m = messenger();
        m.socket().feed(&(payload.len() as u32).to_be_bytes());
        m.socket().feed(&payload[..3]);
        assert!(m.receive().unwrap().is_none());

        m.socket().feed(&payload[3..6]);
        assert!(m.receive().unwrap().is_none());

        m.socket().feed(&payload[6..]);
        let msg = m.receive().unwrap().expect("third read completes the frame");
        assert_eq!(msg, Message::new(Opcode(1), vec![Value::from("abcd")]));

        assert!(m.receive().unwrap().is_none());
    }

    #[test]
    fn test_header_split_across_reads() {
        let bytes = frame(b"[3]");
        let mut m = messenger();

        m.socket().feed(&bytes[..1]);
        assert!(m.receive().unwrap().is_none());
        m.socket().feed(&bytes[1..3]);
        assert!(m.receive().unwrap().is_none());
        m.socket().feed(&bytes[3..]);

        let msg = m.receive().unwrap().unwrap();
        assert_eq!(msg.opcode, Opcode(3));
    }

    #[test]
    fn test_back_to_back_frames_come_out_one_per_call() {
        let mut bytes = frame(br#"[0,"a",""]"#);
        bytes.extend(frame(b"[1]"));
        let mut m = messenger();
        m.socket().feed(&bytes);

        assert_eq!(m.receive().unwrap().unwrap().opcode, Opcode(0));
        assert_eq!(m.receive().unwrap().unwrap().opcode, Opcode(1));
        assert!(m.receive().unwrap().is_none());
    }

    #[test]
    fn test_zero_length_payload_decodes_immediately() {
        let mut m = messenger();
        m.socket().feed(&0u32.to_be_bytes());

        let msg = m.receive().unwrap().expect("empty frame is a message");
        assert_eq!(msg, Message::empty());
    }

    #[test]
    fn test_malformed_payload_does_not_poison_next_frame() {
        let mut bytes = frame(b"not json");
        bytes.extend(frame(b"[1]"));
        let mut m = messenger();
        m.socket().feed(&bytes);

        let err = m.receive().unwrap_err();
        assert!(err.is_malformed());

        let next = m.receive().unwrap().expect("next frame still decodes");
        assert_eq!(next.opcode, Opcode(1));
    }

    #[test]
    fn test_default_codec_reads_msgpack() {
        let mut m: Messenger<ScriptedSocket> = Messenger::new(ScriptedSocket::default());
        m.socket().feed(&frame(b"\x93\x00\xa4solo\xa0"));

        let msg = m.receive().unwrap().unwrap();
        assert_eq!(msg, Message::new(Opcode(0), vec!["solo".into(), "".into()]));
    }

    #[test]
    fn test_oversized_header_is_rejected_without_buffering() {
        let mut m = messenger();
        m.socket().feed(&u32::MAX.to_be_bytes());
        for _ in 0..8 {
            m.socket().feed(&vec![0u8; 64 * 1024]);
        }

        let err = m.receive().unwrap_err();
        assert!(matches!(
            err,
            MessengerError::Malformed(ProtocolError::FrameTooLarge(n)) if n == u32::MAX as usize
        ));

        // The declared payload is skipped, never kept.
        assert!(m.receive().unwrap().is_none());
        assert!(m.buffered.is_empty());
        assert!(matches!(m.state, ReadState::Discard { .. }));
    }

    #[test]
    fn test_frame_after_oversized_one_still_decodes() {
        let mut m = messenger().with_max_frame(8);
        let mut bytes = frame(br#"[0,"far too long"]"#);
        bytes.extend(frame(b"[1]"));
        m.socket().feed(&bytes);

        let err = m.receive().unwrap_err();
        assert!(matches!(err, MessengerError::Malformed(ProtocolError::FrameTooLarge(18))));

        let next = m.receive().unwrap().expect("stream stays aligned");
        assert_eq!(next.opcode, Opcode(1));
    }

    #[test]
    fn test_frame_at_the_limit_is_accepted() {
        let mut m = messenger().with_max_frame(3);
        m.socket().feed(&frame(b"[1]"));
        assert_eq!(m.receive().unwrap().unwrap().opcode, Opcode(1));
    }

    #[test]
    fn test_eof_is_connection_closed() {
        let mut m = messenger();
        m.socket().feed(&[0, 0]);
        m.socket().close();

        let err = m.receive().unwrap_err();
        assert!(matches!(
            err,
            MessengerError::Transport(TransportError::ConnectionClosed(_))
        ));
    }

    #[test]
    fn test_send_writes_length_prefixed_frame() {
        let mut m = messenger();
        m.send(&Message::new(Opcode(3), vec![])).unwrap();
        assert_eq!(m.socket().written(), frame(b"[3]"));
        assert!(!m.has_pending_output());
    }

    #[test]
    fn test_partial_write_is_flushed_later_in_order() {
        let mut m = messenger();
        m.socket().set_write_budget(Some(2));

        m.send(&Message::new(Opcode(0), vec![Value::Int(1)])).unwrap();
        m.send(&Message::new(Opcode(3), vec![])).unwrap();
        assert!(m.has_pending_output());
        assert_eq!(m.socket().written().len(), 2);

        m.socket().set_write_budget(None);
        m.flush().unwrap();
        assert!(!m.has_pending_output());

        let mut expected = frame(b"[0,1]");
        expected.extend(frame(b"[3]"));
        assert_eq!(m.socket().written(), expected);
    }

    #[test]
    fn test_encode_frame_prefix_matches_payload() {
        let bytes = encode_frame(&JsonCodec, &Message::new(Opcode(2), vec!["x".into()])).unwrap();
        let len = u32::from_be_bytes(bytes[..4].try_into().unwrap()) as usize;
        assert_eq!(len, bytes.len() - HEADER_LEN);
        assert_eq!(&bytes[4..], br#"[2,"x"]"#);
    }
}
