use std::io::{Result, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

/// Archive sink that is either plain or gzip compressed.
pub enum MaybeGz<W: Write> {
    Plain(W),
    Gz(GzEncoder<W>),
}

impl<W: Write> MaybeGz<W> {
    pub fn new(writer: W, gzip: bool) -> MaybeGz<W> {
        if gzip {
            MaybeGz::Gz(GzEncoder::new(writer, Compression::fast()))
        } else {
            MaybeGz::Plain(writer)
        }
    }

    /// Writes the gzip trailer, if any, and hands the writer back.
    pub fn finish(self) -> Result<W> {
        match self {
            MaybeGz::Plain(mut writer) => {
                writer.flush()?;
                Ok(writer)
            }
            MaybeGz::Gz(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for MaybeGz<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self {
            MaybeGz::Plain(writer) => writer.write(buf),
            MaybeGz::Gz(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self {
            MaybeGz::Plain(writer) => writer.flush(),
            MaybeGz::Gz(encoder) => encoder.flush(),
        }
    }
}
