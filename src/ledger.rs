//! # Checkout Ledger
//!
//! Persisted mapping from repository URI to last-known synchronization
//! metadata. The ledger is what lets repeated synchronization runs skip
//! network operations entirely: a repository whose desired ref has not
//! changed and whose last update is within the refresh interval is treated
//! as up to date.
//!
//! ## File format
//!
//! `checkouts.bin` is a flat big-endian binary sequence: an `i32` record
//! count followed by that many `{ uri, ref, branch, i64 millis }` records,
//! strings encoded as a `u16` byte length plus UTF-8 bytes. Records are
//! written sorted by URI so that repeated runs with unchanged state produce
//! byte-identical files.
//!
//! ## Lifecycle
//!
//! The ledger is an explicit object owned by the engine's caller: loaded
//! once at process start, mutated in memory, and flushed once at process
//! end. A crash before the flush loses that run's updates while leaving the
//! on-disk state from prior successful runs intact. It is not safe for
//! concurrent access from multiple processes.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// File name of the persisted ledger inside the checkouts root directory.
pub const LEDGER_FILE_NAME: &str = "checkouts.bin";

/// Last-known synchronization metadata for one repository URI.
///
/// `ref_name` is the textual desired ref at the time of the last
/// synchronization: the commit when one is pinned, otherwise the branch or
/// tag name, otherwise empty (default branch). `branch` is always the
/// branch-or-tag name, so the two fields differ exactly when a commit pin is
/// present. Staleness comparison is on these textual values, never on
/// resolved commit hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRecord {
    pub uri: String,
    pub ref_name: String,
    pub branch: String,
    pub last_update_millis: i64,
}

impl CheckoutRecord {
    pub fn new(
        uri: impl Into<String>,
        ref_name: impl Into<String>,
        branch: impl Into<String>,
        last_update_millis: i64,
    ) -> Self {
        Self {
            uri: uri.into(),
            ref_name: ref_name.into(),
            branch: branch.into(),
            last_update_millis,
        }
    }

    /// The staleness check: whether this (current) record is close enough to
    /// the prior record to skip a network refresh.
    ///
    /// Fresh iff a prior record exists, its `ref_name` and `branch` match
    /// exactly, and less than `refresh_interval` elapsed between the two
    /// timestamps.
    pub fn is_fresh(&self, prior: Option<&CheckoutRecord>, refresh_interval: Duration) -> bool {
        let Some(old) = prior else {
            return false;
        };
        let same_ref = self.ref_name == old.ref_name;
        let same_branch = self.branch == old.branch;
        let up_to_date =
            self.last_update_millis - old.last_update_millis < refresh_interval.as_millis() as i64;
        same_ref && same_branch && up_to_date
    }
}

/// Ordered-by-URI map of checkout records with explicit load/save lifecycle.
///
/// Entries are only ever inserted or replaced, never deleted: repositories
/// removed from configuration leave stale, harmless entries behind.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: BTreeMap<String, CheckoutRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the ledger from `path`. An absent file is an empty ledger, not
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let bytes = fs::read(path).map_err(|source| Error::LedgerIo {
            operation: "read",
            path: path.to_path_buf(),
            source,
        })?;
        let mut cursor = bytes.as_slice();
        Self::decode(&mut cursor).map_err(|source| Error::LedgerIo {
            operation: "read",
            path: path.to_path_buf(),
            source,
        })
    }

    /// Saves the ledger to `path`, creating parent directories as needed.
    /// Records are written sorted by URI for deterministic output.
    pub fn save(&self, path: &Path) -> Result<()> {
        let write = || -> io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut buffer = Vec::new();
            self.encode(&mut buffer)?;
            fs::write(path, buffer)
        };
        write().map_err(|source| Error::LedgerIo {
            operation: "write",
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, uri: &str) -> Option<&CheckoutRecord> {
        self.entries.get(uri)
    }

    /// Inserts or replaces the record for its URI.
    pub fn record(&mut self, record: CheckoutRecord) {
        self.entries.insert(record.uri.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates records in URI order.
    pub fn iter(&self) -> impl Iterator<Item = &CheckoutRecord> {
        self.entries.values()
    }

    fn decode(reader: &mut impl Read) -> io::Result<Self> {
        let count = read_i32(reader)?;
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let uri = read_string(reader)?;
            let ref_name = read_string(reader)?;
            let branch = read_string(reader)?;
            let last_update_millis = read_i64(reader)?;
            entries.insert(
                uri.clone(),
                CheckoutRecord {
                    uri,
                    ref_name,
                    branch,
                    last_update_millis,
                },
            );
        }
        Ok(Self { entries })
    }

    fn encode(&self, writer: &mut impl Write) -> io::Result<()> {
        let count = i32::try_from(self.entries.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "too many ledger records"))?;
        writer.write_all(&count.to_be_bytes())?;
        // BTreeMap iteration is already sorted by URI.
        for record in self.entries.values() {
            write_string(writer, &record.uri)?;
            write_string(writer, &record.ref_name)?;
            write_string(writer, &record.branch)?;
            writer.write_all(&record.last_update_millis.to_be_bytes())?;
        }
        Ok(())
    }
}

fn read_i32(reader: &mut impl Read) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_i64(reader: &mut impl Read) -> io::Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_be_bytes(buf))
}

fn read_string(reader: &mut impl Read) -> io::Result<String> {
    let mut len_buf = [0u8; 2];
    reader.read_exact(&mut len_buf)?;
    let len = u16::from_be_bytes(len_buf) as usize;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "ledger string is not UTF-8"))
}

fn write_string(writer: &mut impl Write, value: &str) -> io::Result<()> {
    let len = u16::try_from(value.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "ledger string too long"))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(value.as_bytes())
}
