//! # Journal - Local Store Mutation Log
//!
//! Durable, append-only record of every mutation applied to one table of the
//! local store backend. On open the journal is replayed in order to rebuild
//! the table's regions; major compaction rewrites it with only the surviving
//! cell versions.
//!
//! ## Binary Record Format
//!
//! ```text
//! [record_len: u32 LE][crc32: u32 LE][body ...]
//! ```
//!
//! Body (Put):          `[op=0: u8][row][family][qualifier][timestamp: u64][value]`
//! Body (DeleteRow):    `[op=1: u8][row]`
//! Body (DeleteFamily): `[op=2: u8][row][family]`
//!
//! Every variable-length field is `[len: u32 LE][bytes]`. `record_len`
//! includes the 4-byte CRC but **not** itself.
//!
//! ## Example
//!
//! ```rust,no_run
//! use journal::{JournalReader, JournalRecord, JournalWriter};
//!
//! let mut w = JournalWriter::create("student.journal", true).unwrap();
//! w.append(&JournalRecord::Put {
//!     row: b"10001".to_vec(),
//!     family: b"base_info".to_vec(),
//!     qualifier: b"name".to_vec(),
//!     timestamp: 1587026137538,
//!     value: b"ssss".to_vec(),
//! }).unwrap();
//! drop(w);
//!
//! let mut r = JournalReader::open("student.journal").unwrap();
//! r.replay(|rec| println!("{:?}", rec)).unwrap();
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

/// Upper bound on a single record; anything larger is treated as corruption.
const MAX_RECORD_SIZE: u32 = 64 * 1024 * 1024;

const OP_PUT: u8 = 0;
const OP_DELETE_ROW: u8 = 1;
const OP_DELETE_FAMILY: u8 = 2;

/// A single journaled mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalRecord {
    /// One cell version written to a row.
    Put {
        row: Vec<u8>,
        family: Vec<u8>,
        qualifier: Vec<u8>,
        timestamp: u64,
        value: Vec<u8>,
    },
    /// Every cell of a row removed.
    DeleteRow { row: Vec<u8> },
    /// Every cell of one family of a row removed.
    DeleteFamily { row: Vec<u8>, family: Vec<u8> },
}

/// Errors that can occur during journal operations.
#[derive(Debug, Error)]
pub enum JournalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record failed CRC validation, had an absurd length, or contained an
    /// unknown op code.
    #[error("corrupt journal record")]
    Corrupt,
}

/// Append-only journal writer.
///
/// Each record is encoded into a reusable buffer, checksummed, and written
/// with a single `write_all`. When `sync` is `true` every append is followed
/// by `sync_all()`.
pub struct JournalWriter {
    file: File,
    sync: bool,
    buf: Vec<u8>,
}

impl JournalWriter {
    /// Opens (or creates) a journal file in append mode.
    pub fn create<P: AsRef<Path>>(path: P, sync: bool) -> Result<Self, JournalError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            sync,
            buf: Vec::with_capacity(256),
        })
    }

    /// Serializes `record` and appends it to the journal.
    pub fn append(&mut self, record: &JournalRecord) -> Result<(), JournalError> {
        encode_frame(&mut self.buf, record)?;
        self.file.write_all(&self.buf)?;
        self.file.flush()?;

        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Forces everything written so far onto disk.
    pub fn sync_to_disk(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Atomically replaces the journal at `path` with `records`.
    ///
    /// Writes `<path>.tmp`, fsyncs it, then renames it over `path`. A crash
    /// before the rename leaves the old journal intact.
    pub fn rewrite<P, I>(path: P, records: I) -> Result<(), JournalError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = JournalRecord>,
    {
        let path = path.as_ref();
        let tmp_path = path.with_extension("journal.tmp");

        {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            let mut out = BufWriter::new(file);
            let mut buf = Vec::with_capacity(256);
            for record in records {
                encode_frame(&mut buf, &record)?;
                out.write_all(&buf)?;
            }
            out.flush()?;
            out.get_ref().sync_all()?;
        }

        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

fn put_field(buf: &mut Vec<u8>, bytes: &[u8]) -> io::Result<()> {
    buf.write_u32::<LittleEndian>(bytes.len() as u32)?;
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Encodes one complete frame (header + body) into `buf`, replacing its
/// previous contents.
fn encode_frame(buf: &mut Vec<u8>, record: &JournalRecord) -> Result<(), JournalError> {
    buf.clear();
    // frame header placeholder: record_len + crc
    buf.extend_from_slice(&[0u8; 8]);

    match record {
        JournalRecord::Put {
            row,
            family,
            qualifier,
            timestamp,
            value,
        } => {
            buf.write_u8(OP_PUT)?;
            put_field(buf, row)?;
            put_field(buf, family)?;
            put_field(buf, qualifier)?;
            buf.write_u64::<LittleEndian>(*timestamp)?;
            put_field(buf, value)?;
        }
        JournalRecord::DeleteRow { row } => {
            buf.write_u8(OP_DELETE_ROW)?;
            put_field(buf, row)?;
        }
        JournalRecord::DeleteFamily { row, family } => {
            buf.write_u8(OP_DELETE_FAMILY)?;
            put_field(buf, row)?;
            put_field(buf, family)?;
        }
    }

    let mut hasher = Crc32::new();
    hasher.update(&buf[8..]);
    let crc = hasher.finalize();

    let record_len = (buf.len() - 8) as u64 + 4;
    if record_len > MAX_RECORD_SIZE as u64 {
        return Err(JournalError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "journal record too large",
        )));
    }

    buf[0..4].copy_from_slice(&(record_len as u32).to_le_bytes());
    buf[4..8].copy_from_slice(&crc.to_le_bytes());
    Ok(())
}

/// Sequential journal reader.
///
/// Generic over any `Read` so tests can replay in-memory buffers. A truncated
/// tail record (crash mid-append) is treated as a clean end of journal.
pub struct JournalReader<R: Read> {
    rdr: BufReader<R>,
}

impl JournalReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<JournalReader<File>, JournalError> {
        let f = File::open(path)?;
        Ok(JournalReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> JournalReader<R> {
    pub fn from_reader(reader: R) -> Self {
        JournalReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Replays every valid record, calling `apply` for each one in order.
    ///
    /// - clean EOF or truncated tail -> `Ok(())`
    /// - CRC mismatch, absurd length, unknown op -> `Err(JournalError::Corrupt)`
    pub fn replay<F>(&mut self, mut apply: F) -> Result<(), JournalError>
    where
        F: FnMut(JournalRecord),
    {
        let mut body = Vec::with_capacity(256);

        loop {
            let record_len = match self.rdr.read_u32::<LittleEndian>() {
                Ok(v) => v,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(JournalError::Io(e)),
            };
            if record_len <= 4 || record_len > MAX_RECORD_SIZE {
                return Err(JournalError::Corrupt);
            }

            let crc = match self.rdr.read_u32::<LittleEndian>() {
                Ok(v) => v,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(JournalError::Io(e)),
            };

            body.clear();
            body.resize((record_len - 4) as usize, 0);
            match self.rdr.read_exact(&mut body) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(JournalError::Io(e)),
            }

            let mut hasher = Crc32::new();
            hasher.update(&body);
            if hasher.finalize() != crc {
                return Err(JournalError::Corrupt);
            }

            apply(decode_body(&body)?);
        }
    }
}

fn read_field(br: &mut &[u8]) -> Result<Vec<u8>, JournalError> {
    let len = br.read_u32::<LittleEndian>().map_err(|_| JournalError::Corrupt)? as usize;
    if len > br.len() {
        return Err(JournalError::Corrupt);
    }
    let (field, rest) = br.split_at(len);
    let field = field.to_vec();
    *br = rest;
    Ok(field)
}

fn decode_body(body: &[u8]) -> Result<JournalRecord, JournalError> {
    let mut br = body;
    let op = br.read_u8().map_err(|_| JournalError::Corrupt)?;
    let row = read_field(&mut br)?;

    let record = match op {
        OP_PUT => {
            let family = read_field(&mut br)?;
            let qualifier = read_field(&mut br)?;
            let timestamp = br
                .read_u64::<LittleEndian>()
                .map_err(|_| JournalError::Corrupt)?;
            let value = read_field(&mut br)?;
            JournalRecord::Put {
                row,
                family,
                qualifier,
                timestamp,
                value,
            }
        }
        OP_DELETE_ROW => JournalRecord::DeleteRow { row },
        OP_DELETE_FAMILY => {
            let family = read_field(&mut br)?;
            JournalRecord::DeleteFamily { row, family }
        }
        _ => return Err(JournalError::Corrupt),
    };

    if !br.is_empty() {
        return Err(JournalError::Corrupt);
    }
    Ok(record)
}

#[cfg(test)]
mod tests;
