//! Multiplexed attach/logs streams.
//!
//! Each frame is an 8-byte header `[kind, 0, 0, 0, len(u32 big endian)]`
//! followed by `len` payload bytes.

use std::io::{ErrorKind, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{PayloadError, Result};

const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
}

impl TryFrom<u8> for StreamKind {
    type Error = PayloadError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(StreamKind::Stdin),
            1 => Ok(StreamKind::Stdout),
            2 => Ok(StreamKind::Stderr),
            other => Err(PayloadError::MalformedFrame(format!("unknown stream kind {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub stream: StreamKind,
    pub payload: Bytes,
}

/// Iterator over the frames of a multiplexed stream.
pub struct FrameReader<R: Read> {
    reader: R,
    done: bool,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> FrameReader<R> {
        FrameReader { reader, done: false }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut header = [0u8; HEADER_LEN];
        let read = read_full(&mut self.reader, &mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_LEN {
            return Err(PayloadError::MalformedFrame(format!("truncated header of {} bytes", read)));
        }
        let stream = StreamKind::try_from(header[0])?;
        let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
        // grows with the bytes actually received, not with the header's claim
        let mut payload = Vec::new();
        let read = (&mut self.reader).take(len as u64).read_to_end(&mut payload)?;
        if read < len {
            return Err(PayloadError::MalformedFrame(format!("expected {} payload bytes, got {}", len, read)));
        }
        Ok(Some(Frame {
            stream,
            payload: Bytes::from(payload),
        }))
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.next_frame();
        if !matches!(next, Ok(Some(_))) {
            self.done = true;
        }
        next.transpose()
    }
}

/// Reads until `buf` is full or EOF, returning the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Collects a whole stream into separate stdout and stderr buffers. Stdin
/// frames are dropped.
pub fn demux_all<R: Read>(reader: R) -> Result<(Bytes, Bytes)> {
    let mut stdout = BytesMut::new();
    let mut stderr = BytesMut::new();
    for frame in FrameReader::new(reader) {
        let frame = frame?;
        match frame.stream {
            StreamKind::Stdout => stdout.put(frame.payload),
            StreamKind::Stderr => stderr.put(frame.payload),
            StreamKind::Stdin => {}
        }
    }
    Ok((stdout.freeze(), stderr.freeze()))
}
