use crate::util::Position;

/// A 16-bit code unit read from a [`CharSource`], or the end of the stream.
pub type CodeUnit = u16;

/// A restartable or one-shot source of UTF-16-ish code units. Implementations
/// may be backed by an in-memory string (the common case, see
/// [`StrSource`](crate::buffer::StrSource)) or by any other incremental reader;
/// a real I/O-backed source should map its failures to
/// [`BufferError::ReadFailure`].
pub trait CharSource {
    /// Fill `out` with up to `out.len()` further code units, returning how many
    /// were produced. Returning fewer than requested (including zero) signals
    /// end of stream; `read_failure` lets an implementation report an I/O error
    /// instead of silently ending the stream.
    fn fill(&mut self, out: &mut [CodeUnit]) -> Result<usize, BufferError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferError {
    pub message: String,
}

impl BufferError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "read-failure: {}", self.message)
    }
}
impl std::error::Error for BufferError {}

/// A [`CharSource`] over an owned `String`, the common case for parsing a
/// program already fully materialized in memory.
pub struct StrSource {
    units: Vec<CodeUnit>,
    served: usize,
}

impl StrSource {
    pub fn new(input: impl AsRef<str>) -> Self {
        Self {
            units: input.as_ref().encode_utf16().collect(),
            served: 0,
        }
    }
}

impl CharSource for StrSource {
    fn fill(&mut self, out: &mut [CodeUnit]) -> Result<usize, BufferError> {
        let remaining = &self.units[self.served..];
        let n = remaining.len().min(out.len());
        out[..n].copy_from_slice(&remaining[..n]);
        self.served += n;
        Ok(n)
    }
}

const FILL_CHUNK: usize = 256;

/// Read-ahead buffer over a [`CharSource`] (spec §4.1 / C1). Everything read
/// since the logical `position` stays addressable via [`substring`](Self::substring);
/// `peek` pulls more from the source on demand and never discards what it has
/// already buffered.
pub struct LookAheadBuffer<S: CharSource> {
    source: S,
    units: Vec<CodeUnit>,
    exhausted: bool,
    position: usize,
}

impl<S: CharSource> LookAheadBuffer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            units: Vec::new(),
            exhausted: false,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Ensure at least `self.position + offset + 1` units are buffered, pulling
    /// from the source in chunks as needed.
    fn ensure(&mut self, absolute_index: usize) -> Result<(), BufferError> {
        while !self.exhausted && self.units.len() <= absolute_index {
            let mut chunk = [0 as CodeUnit; FILL_CHUNK];
            let n = self.source.fill(&mut chunk)?;
            if n == 0 {
                self.exhausted = true;
            } else {
                self.units.extend_from_slice(&chunk[..n]);
            }
        }
        Ok(())
    }

    /// Code unit at `position + offset`, or `None` at end of stream.
    pub fn peek(&mut self, offset: usize) -> Result<Option<CodeUnit>, BufferError> {
        let idx = self.position + offset;
        self.ensure(idx)?;
        Ok(self.units.get(idx).copied())
    }

    /// Peek the code unit at `position + offset` decoded as a `char`. Lone
    /// surrogates (non-BMP halves, per spec §6) decode as `None` from `char`'s
    /// perspective but are still addressable via [`peek`](Self::peek).
    pub fn peek_char(&mut self, offset: usize) -> Result<Option<char>, BufferError> {
        Ok(self
            .peek(offset)?
            .and_then(|u| char::decode_utf16([u]).next().and_then(Result::ok)))
    }

    /// Advance `position` by `n` code units. Already-buffered units remain
    /// addressable via `substring`.
    pub fn read(&mut self, n: usize) {
        self.position += n;
    }

    /// Materialize `[start, start+len)`; `start` must already have been read or
    /// peeked.
    pub fn substring(&self, start: usize, len: usize) -> String {
        let units = &self.units[start..start + len];
        String::from_utf16_lossy(units)
    }

    /// Whether the buffer has observed end-of-stream past everything buffered.
    pub fn at_end(&mut self, offset: usize) -> Result<bool, BufferError> {
        Ok(self.peek(offset)?.is_none())
    }

    /// Resolve an absolute index already read/peeked into a one-based
    /// `Position`, scanning the buffered prefix for line breaks.
    pub fn position_of(&self, index: usize) -> Position {
        let mut pos = Position::START;
        for &unit in &self.units[..index.min(self.units.len())] {
            if let Some(c) = char::from_u32(unit as u32) {
                pos.advance(c);
            }
        }
        pos
    }
}
