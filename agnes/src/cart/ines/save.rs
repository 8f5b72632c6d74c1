use std::fs::OpenOptions;
use std::io::{self, prelude::*, ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use log::info;

/// Backing storage for battery RAM. Blanket-implemented for files and cursors.
pub trait SaveStore: Read + Write + Seek {}

impl<T: Read + Write + Seek> SaveStore for T {}

/// Where the battery file for `rom_path` lives: same directory, `.sav` extension.
pub fn save_path(rom_path: &Path) -> PathBuf {
    rom_path.with_extension("sav")
}

/// Battery-backed PRG RAM, cached in memory and written through to its store.
pub struct SaveRam {
    store: Box<dyn SaveStore>,
    data: Vec<u8>,
}

impl SaveRam {
    /// Opens an existing battery file for update.
    ///
    /// A missing file is not an error: the cartridge simply runs without save RAM.
    pub fn open(path: &Path, len: usize) -> io::Result<Option<Self>> {
        match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => {
                info!("using battery file {}", path.display());
                Self::from_store(file, len).map(Some)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("no battery file at {}, running without save RAM", path.display());
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Loads up to `len` bytes from `store`. Bytes the store does not have yet read as zero.
    pub fn from_store(mut store: impl SaveStore + 'static, len: usize) -> io::Result<Self> {
        let mut data = Vec::with_capacity(len);
        store.seek(SeekFrom::Start(0))?;
        Read::take(&mut store, len as u64).read_to_end(&mut data)?;
        data.resize(len, 0);
        Ok(Self {
            store: Box::new(store),
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    /// Returns `Ok(false)` if `offset` is out of range.
    pub fn write(&mut self, offset: usize, value: u8) -> io::Result<bool> {
        if offset >= self.data.len() {
            return Ok(false);
        }
        self.store.seek(SeekFrom::Start(offset as u64))?;
        self.store.write_all(&[value])?;
        self.data[offset] = value;
        Ok(true)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.store.flush()
    }
}

impl std::fmt::Debug for SaveRam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveRam").field("len", &self.data.len()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    use super::*;

    /// A cursor the test can still inspect after handing it to `SaveRam`.
    #[derive(Clone, Default)]
    struct SharedCursor(Rc<RefCell<Cursor<Vec<u8>>>>);

    impl Read for SharedCursor {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.borrow_mut().read(buf)
        }
    }

    impl Write for SharedCursor {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for SharedCursor {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.0.borrow_mut().seek(pos)
        }
    }

    #[test]
    fn save_path_replaces_extension() {
        assert_eq!(save_path(Path::new("roms/zelda.nes")), PathBuf::from("roms/zelda.sav"));
        assert_eq!(save_path(Path::new("/a/b/game")), PathBuf::from("/a/b/game.sav"));
        assert_eq!(save_path(Path::new("game.v1.nes")), PathBuf::from("game.v1.sav"));
    }

    #[test]
    fn missing_file_means_no_save_ram() {
        let path = std::env::temp_dir().join("agnes-save-test-does-not-exist.sav");
        assert!(SaveRam::open(&path, 0x2000).unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn loads_existing_contents_and_pads() {
        let store = SharedCursor::default();
        store.0.borrow_mut().get_mut().extend_from_slice(&[1, 2, 3]);
        let ram = SaveRam::from_store(store, 8).unwrap();
        assert_eq!(ram.len(), 8);
        assert_eq!(ram.read(0), Some(1));
        assert_eq!(ram.read(2), Some(3));
        assert_eq!(ram.read(7), Some(0));
        assert_eq!(ram.read(8), None);
    }

    #[test]
    fn writes_go_through_to_store() {
        let store = SharedCursor::default();
        let mut ram = SaveRam::from_store(store.clone(), 16).unwrap();
        assert!(ram.write(5, 0xAB).unwrap());
        assert!(!ram.write(16, 0xCD).unwrap());
        assert_eq!(ram.read(5), Some(0xAB));

        let written = store.0.borrow().get_ref().clone();
        assert_eq!(written.len(), 6);
        assert_eq!(written[5], 0xAB);
    }

    /// Accepts reads and seeks, refuses every write.
    struct ReadOnlyStore(Cursor<Vec<u8>>);

    impl Read for ReadOnlyStore {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Write for ReadOnlyStore {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::PermissionDenied, "read-only save store"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for ReadOnlyStore {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.0.seek(pos)
        }
    }

    #[test]
    fn failed_write_leaves_cache_untouched() {
        let mut ram = SaveRam::from_store(ReadOnlyStore(Cursor::new(vec![0x11; 4])), 4).unwrap();
        let err = ram.write(2, 0x99).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(ram.read(2), Some(0x11));
    }
}
