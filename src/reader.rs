use crate::error::{Error, Result};
use std::io::{BufRead, Seek, SeekFrom};
use tracing::debug;

/// Endless line stream over a seekable source.
///
/// A blank line, or the end of the source, sends the cursor back to the
/// start. Callers never see the end of the data; they can observe how often
/// the source was cycled through [`CyclicReader::wraps`].
///
/// The reader owns its cursor, so sharing it between producers needs an
/// outer lock.
pub struct CyclicReader<R> {
    reader: R,
    line: String,
    wraps: usize,
}

impl<R: BufRead + Seek> CyclicReader<R> {

    /// Fails with [`Error::DegenerateSource`] when the first line is blank,
    /// since such a source can never produce a line.
    pub fn new(mut reader: R) -> Result<CyclicReader<R>> {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        if line.trim().is_empty() {
            return Err(Error::DegenerateSource);
        }
        reader.seek(SeekFrom::Start(0))?;

        Ok(CyclicReader {
            reader,
            line,
            wraps: 0,
        })
    }

    /// Read exactly `n` trimmed lines, wrapping around as needed.
    pub fn next_lines(&mut self, n: usize) -> Result<Vec<String>> {
        (0..n).map(|_| self.next_line()).collect()
    }

    pub fn next_line(&mut self) -> Result<String> {
        self.line.clear();
        self.reader.read_line(&mut self.line)?;

        if self.line.trim().is_empty() {
            self.reader.seek(SeekFrom::Start(0))?;
            self.wraps += 1;
            debug!(wraps = self.wraps, "pair source wrapped to the start");

            self.line.clear();
            self.reader.read_line(&mut self.line)?;
            if self.line.trim().is_empty() {
                return Err(Error::DegenerateSource);
            }
        }

        Ok(self.line.trim().to_owned())
    }

    /// Number of times the cursor went back to the start.
    pub fn wraps(&self) -> usize {
        self.wraps
    }
}
