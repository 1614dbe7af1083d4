use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use crate::core::error::Result;

/// One textual record plus the byte offset of its first byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub text: String,
    pub offset: u64,
}

/// Streaming line reader over a single file handle.
///
/// Reads fixed-size chunks and accumulates them until a newline shows up,
/// so records of unbounded length are supported. If the file ends without a
/// trailing newline the leftover bytes come back as a final partial record.
///
/// The reader owns the file cursor. Sequential reads and random-access
/// re-reads share it, so `read_record_at` seeks explicitly and discards any
/// buffered lookahead before reading.
pub struct ChunkedLineReader {
    file: File,
    chunk_size: usize,
    pending: Vec<u8>,
    offset: u64,
}

impl ChunkedLineReader {
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let file = File::open(path).await?;
        Ok(ChunkedLineReader {
            file,
            chunk_size,
            pending: Vec::new(),
            offset: 0,
        })
    }

    /// Byte offset the next sequential record will start at.
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Yield the next newline-terminated record, or `None` at end of input.
    pub async fn next_record(&mut self) -> Result<Option<RawRecord>> {
        let mut searched = 0;
        loop {
            if let Some(pos) = self.pending[searched..].iter().position(|&b| b == b'\n') {
                let end = searched + pos;
                let record_offset = self.offset;
                let line: Vec<u8> = self.pending.drain(..=end).collect();
                self.offset += line.len() as u64;
                let text = decode_text(&line[..line.len() - 1]);
                return Ok(Some(RawRecord {
                    text,
                    offset: record_offset,
                }));
            }

            // No newline buffered yet; pull in another chunk
            searched = self.pending.len();
            let mut chunk = vec![0u8; self.chunk_size];
            let read = self.file.read(&mut chunk).await?;
            if read == 0 {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let record_offset = self.offset;
                let bytes = std::mem::take(&mut self.pending);
                self.offset += bytes.len() as u64;
                return Ok(Some(RawRecord {
                    text: decode_text(&bytes),
                    offset: record_offset,
                }));
            }
            self.pending.extend_from_slice(&chunk[..read]);
        }
    }

    /// Reposition the cursor, dropping buffered lookahead.
    pub async fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset)).await?;
        self.pending.clear();
        self.offset = offset;
        Ok(())
    }

    /// Random-access re-read of the record starting at `offset`.
    pub async fn read_record_at(&mut self, offset: u64) -> Result<Option<RawRecord>> {
        self.seek_to(offset).await?;
        self.next_record().await
    }
}

fn decode_text(bytes: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if text.ends_with('\r') {
        text.pop();
    }
    text
}
