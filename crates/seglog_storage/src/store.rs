//! Append-only record store.

use crate::encoding::{decode_len, encode_len, LEN_WIDTH};
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A record read back by [`Store::scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Byte position of the record's length prefix.
    pub position: u64,
    /// The record payload.
    pub payload: Vec<u8>,
}

/// An append-only file of length-prefixed records.
///
/// Each record is stored as `[u64 BE length][payload]`. Appends go through a
/// buffered writer; reads flush that buffer first so they always observe
/// every prior append made through this store.
///
/// # Durability
///
/// The store never calls `fsync`. Buffered data reaches the OS on every
/// read and on [`Store::close`]; syncing to stable storage is left to the
/// caller.
///
/// # Thread Safety
///
/// One lock covers the buffered file and the size counter. Every method
/// holds it for its full duration, so at most one operation is in flight.
///
/// # Example
///
/// ```no_run
/// use seglog_storage::Store;
/// use std::path::Path;
///
/// let store = Store::open(Path::new("00000000000000000000.store")).unwrap();
/// let (_, pos) = store.append(b"hello").unwrap();
/// assert_eq!(store.read(pos).unwrap(), b"hello");
/// store.close().unwrap();
/// ```
#[derive(Debug)]
pub struct Store {
    path: Option<PathBuf>,
    inner: Mutex<Option<StoreInner>>,
}

#[derive(Debug)]
struct StoreInner {
    buf: BufWriter<File>,
    /// Logical end of the store, buffered bytes included.
    size: u64,
}

impl Store {
    /// Opens or creates a store file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let mut store = Self::new(file)?;
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Creates a store over an already open file.
    ///
    /// The file must be readable and writable. Its current length becomes
    /// the initial size and new records are appended after it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be stat'd or positioned.
    pub fn new(mut file: File) -> StorageResult<Self> {
        let size = file.metadata()?.len();
        file.seek(SeekFrom::Start(size))?;
        debug!(size, "store opened");

        Ok(Self {
            path: None,
            inner: Mutex::new(Some(StoreInner {
                buf: BufWriter::new(file),
                size,
            })),
        })
    }

    /// Returns the path of the backing file, if the store was opened by path.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Appends a record.
    ///
    /// Returns `(bytes_written, position)`: the number of bytes the record
    /// occupies including its length prefix, and the position it starts at.
    /// The bytes may still be buffered when this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or the write fails.
    pub fn append(&self, payload: &[u8]) -> StorageResult<(u64, u64)> {
        let mut guard = self.inner.lock();
        let inner = guard.as_mut().ok_or(StorageError::Closed)?;

        let position = inner.size;
        inner.buf.write_all(&encode_len(payload.len() as u64))?;
        inner.buf.write_all(payload)?;

        let written = LEN_WIDTH + payload.len() as u64;
        inner.size += written;

        Ok((written, position))
    }

    /// Reads the record starting at `position`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `position` does not point at a complete
    /// record, or [`StorageError::Closed`] after close.
    pub fn read(&self, position: u64) -> StorageResult<Vec<u8>> {
        let mut guard = self.inner.lock();
        let inner = guard.as_mut().ok_or(StorageError::Closed)?;
        inner.buf.flush()?;

        let mut len_buf = [0u8; LEN_WIDTH as usize];
        inner.read_exact_at(&mut len_buf, position)?;
        let len = decode_len(len_buf);

        let start = position + LEN_WIDTH;
        if start.checked_add(len).is_none_or(|end| end > inner.size) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("record at {position} with length {len} extends past end of store"),
            )
            .into());
        }

        let mut payload = vec![0u8; len as usize];
        inner.read_exact_at(&mut payload, start)?;
        Ok(payload)
    }

    /// Reads raw bytes at an absolute file offset, ignoring record framing.
    ///
    /// Returns the number of bytes read, which is less than `buf.len()` only
    /// when the end of the store is reached.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or the read fails.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> StorageResult<usize> {
        let mut guard = self.inner.lock();
        let inner = guard.as_mut().ok_or(StorageError::Closed)?;
        inner.buf.flush()?;
        Ok(inner.read_at(buf, offset)?)
    }

    /// Returns the logical size of the store in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close.
    pub fn size(&self) -> StorageResult<u64> {
        self.inner
            .lock()
            .as_ref()
            .map(|inner| inner.size)
            .ok_or(StorageError::Closed)
    }

    /// Walks every complete record from position 0.
    ///
    /// A trailing partial record ends the scan without an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or a read fails.
    pub fn scan(&self) -> StorageResult<Vec<Frame>> {
        let mut guard = self.inner.lock();
        let inner = guard.as_mut().ok_or(StorageError::Closed)?;
        inner.buf.flush()?;

        let size = inner.size;
        let mut frames = Vec::new();
        let mut position = 0u64;

        while position + LEN_WIDTH <= size {
            let mut len_buf = [0u8; LEN_WIDTH as usize];
            inner.read_exact_at(&mut len_buf, position)?;
            let len = decode_len(len_buf);

            let start = position + LEN_WIDTH;
            let Some(end) = start.checked_add(len).filter(|&end| end <= size) else {
                break;
            };

            let mut payload = vec![0u8; len as usize];
            inner.read_exact_at(&mut payload, start)?;
            frames.push(Frame { position, payload });

            position = end;
        }

        Ok(frames)
    }

    /// Returns a reader over the raw store bytes starting at position 0.
    #[must_use]
    pub fn reader(&self) -> StoreReader<'_> {
        StoreReader {
            store: self,
            offset: 0,
        }
    }

    /// Flushes buffered records and closes the file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] if already closed, or an I/O error if
    /// the flush fails.
    pub fn close(&self) -> StorageResult<()> {
        let mut guard = self.inner.lock();
        let inner = guard.take().ok_or(StorageError::Closed)?;
        let size = inner.size;

        let file = inner.buf.into_inner().map_err(|e| e.into_error())?;
        drop(file);

        debug!(size, path = ?self.path, "store closed");
        Ok(())
    }
}

impl StoreInner {
    /// Reads from `offset` until `buf` is full or the file ends, then puts
    /// the cursor back at the logical end for the next buffered write.
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let size = self.size;
        let file = self.buf.get_mut();
        file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        let result = loop {
            if filled == buf.len() {
                break Ok(filled);
            }
            match file.read(&mut buf[filled..]) {
                Ok(0) => break Ok(filled),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => break Err(e),
            }
        };

        file.seek(SeekFrom::Start(size))?;
        result
    }

    fn read_exact_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        let n = self.read_at(buf, offset)?;
        if n < buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("read of {} bytes at {offset} hit end of store", buf.len()),
            ));
        }
        Ok(())
    }
}

/// A [`Read`] adapter over a [`Store`]'s raw bytes.
///
/// Created by [`Store::reader`]. Used to copy a whole store, framing
/// included, to another destination.
#[derive(Debug)]
pub struct StoreReader<'a> {
    store: &'a Store,
    offset: u64,
}

impl Read for StoreReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.store.read_at(buf, self.offset).map_err(|e| match e {
            StorageError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other),
        })?;
        self.offset += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const RECORD: &[u8] = b"hello world";
    const WIDTH: u64 = RECORD.len() as u64 + LEN_WIDTH;

    #[test]
    fn store_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.store");

        let store = Store::open(&path).unwrap();
        assert_eq!(store.size().unwrap(), 0);
        assert_eq!(store.path(), Some(path.as_path()));
        assert!(path.exists());
    }

    #[test]
    fn store_append_read() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.store")).unwrap();

        for i in 1..4u64 {
            let (n, pos) = store.append(RECORD).unwrap();
            assert_eq!(n, WIDTH);
            assert_eq!(pos + n, WIDTH * i);
        }

        let mut pos = 0;
        for _ in 1..4 {
            let record = store.read(pos).unwrap();
            assert_eq!(record, RECORD);
            pos += WIDTH;
        }
    }

    #[test]
    fn store_positions_follow_prefix() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.store")).unwrap();

        let (n1, p1) = store.append(b"hello").unwrap();
        let (n2, p2) = store.append(b"world!!").unwrap();
        assert_eq!((n1, p1), (13, 0));
        assert_eq!((n2, p2), (15, 13));

        assert_eq!(store.read(0).unwrap(), b"hello");
        assert_eq!(store.read(13).unwrap(), b"world!!");
        assert_eq!(store.size().unwrap(), 28);
    }

    #[test]
    fn store_empty_payload() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.store")).unwrap();

        let (n, pos) = store.append(b"").unwrap();
        assert_eq!((n, pos), (LEN_WIDTH, 0));
        store.append(b"x").unwrap();

        assert!(store.read(0).unwrap().is_empty());
        assert_eq!(store.read(LEN_WIDTH).unwrap(), b"x");
    }

    #[test]
    fn store_read_at_raw_bytes() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.store")).unwrap();

        store.append(RECORD).unwrap();

        let mut len = [0u8; LEN_WIDTH as usize];
        let n = store.read_at(&mut len, 0).unwrap();
        assert_eq!(n, LEN_WIDTH as usize);
        assert_eq!(decode_len(len), RECORD.len() as u64);

        let mut payload = vec![0u8; RECORD.len()];
        let n = store.read_at(&mut payload, LEN_WIDTH).unwrap();
        assert_eq!(n, RECORD.len());
        assert_eq!(payload, RECORD);

        let mut tail = [0u8; 32];
        assert_eq!(store.read_at(&mut tail, WIDTH - 2).unwrap(), 2);
        assert_eq!(store.read_at(&mut tail, WIDTH + 10).unwrap(), 0);
    }

    #[test]
    fn store_read_past_end_fails() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.store")).unwrap();
        store.append(RECORD).unwrap();

        let result = store.read(WIDTH);
        assert!(matches!(result, Err(StorageError::Io(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn store_read_mid_record_fails() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.store")).unwrap();
        store.append(&[0xff; 16]).unwrap();

        // The payload bytes decode as an enormous length.
        assert!(matches!(store.read(LEN_WIDTH), Err(StorageError::Io(_))));
    }

    #[test]
    fn store_append_after_read() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.store")).unwrap();

        store.append(b"first").unwrap();
        assert_eq!(store.read(0).unwrap(), b"first");

        let (_, pos) = store.append(b"second").unwrap();
        assert_eq!(store.read(pos).unwrap(), b"second");
        assert_eq!(store.read(0).unwrap(), b"first");
    }

    #[test]
    fn store_close_flushes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.store");

        let store = Store::open(&path).unwrap();
        store.append(RECORD).unwrap();
        let before = std::fs::metadata(&path).unwrap().len();
        store.close().unwrap();
        let after = std::fs::metadata(&path).unwrap().len();

        assert!(after > before);
        assert_eq!(after, WIDTH);
    }

    #[test]
    fn store_reopen_continues() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.store");

        {
            let store = Store::open(&path).unwrap();
            store.append(b"one").unwrap();
            store.close().unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(store.size().unwrap(), LEN_WIDTH + 3);

        let (_, pos) = store.append(b"two").unwrap();
        assert_eq!(pos, LEN_WIDTH + 3);
        assert_eq!(store.read(0).unwrap(), b"one");
        assert_eq!(store.read(pos).unwrap(), b"two");
    }

    #[test]
    fn store_from_open_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.store");
        std::fs::write(&path, [0, 0, 0, 0, 0, 0, 0, 2, b'h', b'i']).unwrap();

        let file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let store = Store::new(file).unwrap();
        assert_eq!(store.path(), None);
        assert_eq!(store.size().unwrap(), 10);

        let (_, pos) = store.append(b"there").unwrap();
        assert_eq!(pos, 10);
        assert_eq!(store.read(0).unwrap(), b"hi");
        assert_eq!(store.read(10).unwrap(), b"there");
    }

    #[test]
    fn store_closed_rejects_operations() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.store")).unwrap();
        store.close().unwrap();

        assert!(matches!(store.append(RECORD), Err(StorageError::Closed)));
        assert!(matches!(store.read(0), Err(StorageError::Closed)));
        assert!(matches!(store.size(), Err(StorageError::Closed)));
        assert!(matches!(store.close(), Err(StorageError::Closed)));
    }

    #[test]
    fn store_scan_frames() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.store")).unwrap();

        store.append(b"a").unwrap();
        store.append(b"").unwrap();
        store.append(b"ccc").unwrap();

        let frames = store.scan().unwrap();
        let positions: Vec<u64> = frames.iter().map(|f| f.position).collect();
        assert_eq!(positions, vec![0, 9, 17]);
        assert_eq!(frames[2].payload, b"ccc");
    }

    #[test]
    fn store_scan_stops_at_partial_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.store");

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&encode_len(2));
        bytes.extend_from_slice(b"ok");
        bytes.extend_from_slice(&encode_len(100));
        bytes.extend_from_slice(b"trunc");
        std::fs::write(&path, &bytes).unwrap();

        let store = Store::open(&path).unwrap();
        let frames = store.scan().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload, b"ok");
    }

    #[test]
    fn store_reader_copies_everything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.store");
        let store = Store::open(&path).unwrap();

        store.append(b"alpha").unwrap();
        store.append(b"beta").unwrap();

        let mut copied = Vec::new();
        store.reader().read_to_end(&mut copied).unwrap();
        assert_eq!(copied.len() as u64, store.size().unwrap());

        store.close().unwrap();
        assert_eq!(copied, std::fs::read(&path).unwrap());
    }

    #[test]
    fn store_concurrent_appends() {
        use std::sync::Arc;

        let dir = tempdir().unwrap();
        let store = Arc::new(Store::open(&dir.path().join("test.store")).unwrap());

        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| store.append(&[t; 7]).unwrap().1)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for (t, handle) in handles.into_iter().enumerate() {
            for pos in handle.join().unwrap() {
                assert_eq!(store.read(pos).unwrap(), vec![t as u8; 7]);
            }
        }
        assert_eq!(store.size().unwrap(), 100 * (LEN_WIDTH + 7));
    }
}
