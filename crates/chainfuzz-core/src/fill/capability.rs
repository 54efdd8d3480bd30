//! Behavioural capability catalog.
//!
//! Steps often take "something you can read from" or "something you can
//! write to" rather than plain data. Each catalog entry maps such a
//! capability to a concrete carrier built over freshly filled bytes:
//!
//! | Carrier | Capabilities |
//! |---------|--------------|
//! | [`FuzzReader`] | reader, reader-at, writer-to, seeker, byte/rune scanner and reader, read-seeker |
//! | [`FuzzBuffer`] | writer, byte-writer, read-writer, reader-from, string-writer |
//! | [`FuzzReadCloser`] | closer, read-closer |
//! | [`CancelContext`] | cancellable-context (consumes no bytes) |
//!
//! Carriers are cheap handles: clones share the same underlying state, so a
//! reused reader keeps its position across calls.
//!
//! Steps declare the carrier they need (`|r: FuzzReader| ..`). Filling by
//! name through [`CapabilityValue`] is for harnesses that pick a capability
//! at run time, via [`Fuzzer::fill_capability`](crate::Fuzzer::fill_capability)
//! before chaining; it is not a step parameter type.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Fill, Filler};
use crate::errors::FillError;
use crate::literal::Literal;

/// Every capability the filler can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Reader,
    Writer,
    ReaderAt,
    WriterTo,
    Seeker,
    ByteScanner,
    RuneScanner,
    ReadSeeker,
    ByteReader,
    RuneReader,
    ByteWriter,
    ReadWriter,
    ReaderFrom,
    StringWriter,
    Closer,
    ReadCloser,
    CancellableContext,
}

impl Capability {
    pub const SUPPORTED: [Capability; 17] = [
        Capability::Reader,
        Capability::Writer,
        Capability::ReaderAt,
        Capability::WriterTo,
        Capability::Seeker,
        Capability::ByteScanner,
        Capability::RuneScanner,
        Capability::ReadSeeker,
        Capability::ByteReader,
        Capability::RuneReader,
        Capability::ByteWriter,
        Capability::ReadWriter,
        Capability::ReaderFrom,
        Capability::StringWriter,
        Capability::Closer,
        Capability::ReadCloser,
        Capability::CancellableContext,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::Reader => "reader",
            Capability::Writer => "writer",
            Capability::ReaderAt => "reader-at",
            Capability::WriterTo => "writer-to",
            Capability::Seeker => "seeker",
            Capability::ByteScanner => "byte-scanner",
            Capability::RuneScanner => "rune-scanner",
            Capability::ReadSeeker => "read-seeker",
            Capability::ByteReader => "byte-reader",
            Capability::RuneReader => "rune-reader",
            Capability::ByteWriter => "byte-writer",
            Capability::ReadWriter => "read-writer",
            Capability::ReaderFrom => "reader-from",
            Capability::StringWriter => "string-writer",
            Capability::Closer => "closer",
            Capability::ReadCloser => "read-closer",
            Capability::CancellableContext => "cancellable-context",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::SUPPORTED.into_iter().find(|c| c.name() == name)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A filled capability carrier.
#[derive(Debug, Clone)]
pub enum CapabilityValue {
    Reader(FuzzReader),
    Buffer(FuzzBuffer),
    ReadCloser(FuzzReadCloser),
    Context(CancelContext),
}

impl CapabilityValue {
    /// Build the carrier for `cap`, drawing its content from `filler`.
    pub fn fill(cap: Capability, filler: &mut Filler<'_>) -> Self {
        match cap {
            Capability::Reader
            | Capability::ReaderAt
            | Capability::WriterTo
            | Capability::Seeker
            | Capability::ByteScanner
            | Capability::RuneScanner
            | Capability::ReadSeeker
            | Capability::ByteReader
            | Capability::RuneReader => CapabilityValue::Reader(FuzzReader::new(filler.fill_bytes())),
            Capability::Writer
            | Capability::ByteWriter
            | Capability::ReadWriter
            | Capability::ReaderFrom
            | Capability::StringWriter => CapabilityValue::Buffer(FuzzBuffer::new(filler.fill_bytes())),
            Capability::Closer | Capability::ReadCloser => {
                CapabilityValue::ReadCloser(FuzzReadCloser::new(filler.fill_bytes()))
            }
            Capability::CancellableContext => CapabilityValue::Context(CancelContext::new()),
        }
    }
}

#[derive(Debug, Default)]
struct ReaderState {
    data: Vec<u8>,
    pos: usize,
    /// Width of the last `read_char`, cleared by any other operation.
    last_char: Option<usize>,
}

/// Seekable reader over a fixed byte string.
#[derive(Debug, Clone, Default)]
pub struct FuzzReader {
    state: Arc<Mutex<ReaderState>>,
}

impl FuzzReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ReaderState {
                data,
                pos: 0,
                last_char: None,
            })),
        }
    }

    /// Unread byte count.
    pub fn len(&self) -> usize {
        let state = self.state.lock();
        state.data.len().saturating_sub(state.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total size of the underlying byte string.
    pub fn size(&self) -> usize {
        self.state.lock().data.len()
    }

    /// Read at an absolute offset without moving the cursor.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let state = self.state.lock();
        let offset = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
        if offset >= state.data.len() {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let n = buf.len().min(state.data.len() - offset);
        buf[..n].copy_from_slice(&state.data[offset..offset + n]);
        if n < buf.len() {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(n)
    }

    /// Write the unread remainder to `w`, leaving the reader exhausted.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<u64> {
        let mut state = self.state.lock();
        state.last_char = None;
        let start = state.pos.min(state.data.len());
        w.write_all(&state.data[start..])?;
        let written = state.data.len() - start;
        state.pos = state.data.len();
        Ok(written as u64)
    }

    pub fn read_byte(&self) -> io::Result<u8> {
        let mut state = self.state.lock();
        state.last_char = None;
        let b = *state
            .data
            .get(state.pos)
            .ok_or(io::Error::from(io::ErrorKind::UnexpectedEof))?;
        state.pos += 1;
        Ok(b)
    }

    pub fn unread_byte(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        state.last_char = None;
        if state.pos == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unread_byte at beginning of input",
            ));
        }
        state.pos -= 1;
        Ok(())
    }

    /// Decode one UTF-8 scalar. Invalid sequences yield `U+FFFD` and
    /// advance one byte. Returns the char and the bytes consumed.
    pub fn read_char(&self) -> io::Result<(char, usize)> {
        let mut state = self.state.lock();
        state.last_char = None;
        let rest = state.data.get(state.pos..).unwrap_or_default();
        if rest.is_empty() {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let width = utf8_width(rest[0]).min(rest.len());
        let (ch, width) = match std::str::from_utf8(&rest[..width]) {
            Ok(s) => match s.chars().next() {
                Some(c) => (c, width),
                None => (char::REPLACEMENT_CHARACTER, 1),
            },
            Err(_) => (char::REPLACEMENT_CHARACTER, 1),
        };
        state.pos += width;
        state.last_char = Some(width);
        Ok((ch, width))
    }

    pub fn unread_char(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        match state.last_char.take() {
            Some(width) => {
                state.pos -= width;
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unread_char must follow read_char",
            )),
        }
    }
}

fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

impl Read for FuzzReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        state.last_char = None;
        let start = state.pos.min(state.data.len());
        let n = buf.len().min(state.data.len() - start);
        buf[..n].copy_from_slice(&state.data[start..start + n]);
        state.pos = start + n;
        Ok(n)
    }
}

impl Seek for FuzzReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut state = self.state.lock();
        state.last_char = None;
        let target = match pos {
            SeekFrom::Start(n) => Some(n as i128),
            SeekFrom::End(n) => Some(state.data.len() as i128 + n as i128),
            SeekFrom::Current(n) => Some(state.pos as i128 + n as i128),
        }
        .filter(|t| *t >= 0)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "negative seek position"))?;
        state.pos = usize::try_from(target)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "seek position overflow"))?;
        Ok(state.pos as u64)
    }
}

/// Rebuilds the carrier over its full content; read positions are not kept.
impl Literal for FuzzReader {
    fn write_literal(&self, out: &mut String) {
        out.push_str("FuzzReader::new(");
        self.state.lock().data.write_literal(out);
        out.push(')');
    }
}

impl Fill for FuzzReader {
    fn zero() -> Self {
        FuzzReader::default()
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        Ok(FuzzReader::new(filler.fill_bytes()))
    }
}

#[derive(Debug, Default)]
struct BufferState {
    data: Vec<u8>,
    read_pos: usize,
}

/// Growable read/write buffer seeded with filled bytes.
#[derive(Debug, Clone, Default)]
pub struct FuzzBuffer {
    state: Arc<Mutex<BufferState>>,
}

impl FuzzBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BufferState { data, read_pos: 0 })),
        }
    }

    /// Unread byte count.
    pub fn len(&self) -> usize {
        let state = self.state.lock();
        state.data.len() - state.read_pos
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the unread contents.
    pub fn contents(&self) -> Vec<u8> {
        let state = self.state.lock();
        state.data[state.read_pos..].to_vec()
    }

    pub fn write_byte(&self, b: u8) -> io::Result<()> {
        self.state.lock().data.push(b);
        Ok(())
    }

    pub fn write_str(&self, s: &str) -> io::Result<usize> {
        self.state.lock().data.extend_from_slice(s.as_bytes());
        Ok(s.len())
    }

    /// Append everything `r` yields until end of input.
    pub fn read_from<R: Read>(&self, r: &mut R) -> io::Result<u64> {
        let mut incoming = Vec::new();
        let n = r.read_to_end(&mut incoming)?;
        self.state.lock().data.extend_from_slice(&incoming);
        Ok(n as u64)
    }
}

impl Read for FuzzBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        let start = state.read_pos;
        let n = buf.len().min(state.data.len() - start);
        buf[..n].copy_from_slice(&state.data[start..start + n]);
        state.read_pos += n;
        Ok(n)
    }
}

impl Write for FuzzBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.lock().data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Literal for FuzzBuffer {
    fn write_literal(&self, out: &mut String) {
        out.push_str("FuzzBuffer::new(");
        self.state.lock().data.write_literal(out);
        out.push(')');
    }
}

impl Fill for FuzzBuffer {
    fn zero() -> Self {
        FuzzBuffer::default()
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        Ok(FuzzBuffer::new(filler.fill_bytes()))
    }
}

/// Reader with a close operation that does nothing but record the call.
#[derive(Debug, Clone, Default)]
pub struct FuzzReadCloser {
    reader: FuzzReader,
    closed: Arc<AtomicBool>,
}

impl FuzzReadCloser {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            reader: FuzzReader::new(data),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn close(&self) -> io::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Read for FuzzReadCloser {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Literal for FuzzReadCloser {
    fn write_literal(&self, out: &mut String) {
        out.push_str("FuzzReadCloser::new(");
        self.reader.state.lock().data.write_literal(out);
        out.push(')');
    }
}

impl Fill for FuzzReadCloser {
    fn zero() -> Self {
        FuzzReadCloser::default()
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        Ok(FuzzReadCloser::new(filler.fill_bytes()))
    }
}

/// Cancellation signal shared by all clones.
#[derive(Debug, Clone, Default)]
pub struct CancelContext {
    cancelled: Arc<AtomicBool>,
}

impl CancelContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Literal for CancelContext {
    fn write_literal(&self, out: &mut String) {
        out.push_str("CancelContext::new()");
    }
}

impl Fill for CancelContext {
    fn zero() -> Self {
        CancelContext::new()
    }

    fn fill(_filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        Ok(CancelContext::new())
    }
}
