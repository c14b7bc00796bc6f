use super::{Address, Cell, Machine, FALSE, TRUE};
use crate::lang::Error;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};

type Result<T> = std::result::Result<T, Error>;

/// General file access, separate from `include-file`'s source loading.
///
/// Forth needs a plain cell as a file reference, so open files live in a
/// slot table on the machine and words pass the slot index around. A
/// closed slot is reused by the next open, and ids stay stable while a
/// file is open. Access modes are numeric: 0 read-only, 1 write-only,
/// -1 read-write.
pub(crate) struct FileHandle {
    source: FileStore,
    position: u64,
    size: u64,
}

enum FileStore {
    Reader(BufReader<File>),
    Writer(File),
}

impl FileHandle {
    fn open(path: &str, mode: Cell) -> std::io::Result<FileHandle> {
        let (file, buffered) = match mode {
            -1 => (
                OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .open(path)?,
                false,
            ),
            1 => (
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)?,
                false,
            ),
            _ => (File::open(path)?, true),
        };
        let size = file.metadata()?.len();
        let source = if buffered {
            FileStore::Reader(BufReader::new(file))
        } else {
            FileStore::Writer(file)
        };
        Ok(FileHandle {
            source,
            position: 0,
            size,
        })
    }

    /// One line, terminator stripped. `None` at end of file.
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let count = match &mut self.source {
            FileStore::Reader(reader) => reader.read_line(&mut line)?,
            FileStore::Writer(file) => {
                // byte-at-a-time keeps the position honest on rw files
                let mut buf = [0u8; 1];
                loop {
                    match file.read(&mut buf)? {
                        0 => break,
                        _ => {
                            line.push(buf[0] as char);
                            if buf[0] == b'\n' {
                                break;
                            }
                        }
                    }
                }
                line.len()
            }
        };
        if count == 0 {
            return Ok(None);
        }
        self.position += count as u64;
        Ok(Some(line.trim_end_matches(&['\n', '\r'][..]).to_string()))
    }

    /// Write the text and a line terminator.
    fn write_line(&mut self, text: &str) -> std::io::Result<()> {
        match &mut self.source {
            FileStore::Writer(file) => {
                file.write_all(text.as_bytes())?;
                file.write_all(b"\n")?;
                self.position += text.len() as u64 + 1;
                self.size = self.size.max(self.position);
                Ok(())
            }
            FileStore::Reader(_) => Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "file is read-only",
            )),
        }
    }
}

impl Machine {
    fn file_slot(&mut self, id: Cell) -> Option<&mut FileHandle> {
        if id < 0 {
            return None;
        }
        self.files.get_mut(id as usize).and_then(|slot| slot.as_mut())
    }

    /// open-file ( s fam -- file-id ior ) 0 r/o, 1 w/o, -1 r/w; a failed
    /// open reports through ior rather than aborting.
    pub(crate) fn f_open_file(&mut self) -> Result<()> {
        let mode = self.store.pop()?;
        let addr = self.store.pop()? as Address;
        let path = self.store.string_get(addr)?;
        match FileHandle::open(&path, mode) {
            Ok(handle) => {
                let id = match self.files.iter().position(|slot| slot.is_none()) {
                    Some(id) => {
                        self.files[id] = Some(handle);
                        id
                    }
                    None => {
                        self.files.push(Some(handle));
                        self.files.len() - 1
                    }
                };
                self.store.push(id as Cell)?;
                self.store.push(0)
            }
            Err(_) => {
                self.store.push(0)?;
                self.store.push(-1)
            }
        }
    }

    /// close-file ( file-id -- ior ) dropping the handle closes the file.
    pub(crate) fn f_close_file(&mut self) -> Result<()> {
        let id = self.store.pop()?;
        let open = id >= 0
            && (id as usize) < self.files.len()
            && self.files[id as usize].is_some();
        if open {
            self.files[id as usize] = None;
        }
        self.store.push(if open { 0 } else { -1 })
    }

    /// read-line ( u file-id -- u2 flag ior ) the line arrives in TMP as
    /// a counted string, clipped to u characters. End of file reads as
    /// ( 0 F -1 ).
    pub(crate) fn f_read_line(&mut self) -> Result<()> {
        let id = self.store.pop()?;
        let max = self.store.pop()?.max(0) as usize;
        let line = match self.file_slot(id) {
            Some(handle) => handle.read_line(),
            None => return Err(error!(IoError; "read-line: no file {}", id)),
        };
        match line {
            Ok(Some(line)) => {
                let text: String = line.chars().take(max).collect();
                let tmp = self.store.fetch(self.tmp_ptr)? as Address;
                self.store.string_set(tmp, &text)?;
                self.store.push(text.len().min(255) as Cell)?;
                self.store.push(TRUE)?;
                self.store.push(0)
            }
            Ok(None) => {
                self.store.push(0)?;
                self.store.push(FALSE)?;
                self.store.push(-1)
            }
            Err(e) => Err(error!(IoError; "read-line: {}", e)),
        }
    }

    /// write-line ( s u file-id -- ior ) write u characters of the
    /// counted string at s, then a line terminator.
    pub(crate) fn f_write_line(&mut self) -> Result<()> {
        let id = self.store.pop()?;
        let count = self.store.pop()?.max(0) as usize;
        let addr = self.store.pop()? as Address;
        let text = self.store.string_get(addr)?;
        let text: String = text.chars().take(count).collect();
        let result = match self.file_slot(id) {
            Some(handle) => handle.write_line(&text),
            None => return Err(error!(IoError; "write-line: no file {}", id)),
        };
        self.store.push(if result.is_ok() { 0 } else { -1 })
    }

    /// file-position ( file-id -- u ior )
    pub(crate) fn f_file_position(&mut self) -> Result<()> {
        let id = self.store.pop()?;
        let position = self.file_slot(id).map(|handle| handle.position);
        match position {
            Some(position) => {
                self.store.push(position as Cell)?;
                self.store.push(0)
            }
            None => {
                self.store.push(0)?;
                self.store.push(-1)
            }
        }
    }

    /// file-size ( file-id -- u ior )
    pub(crate) fn f_file_size(&mut self) -> Result<()> {
        let id = self.store.pop()?;
        let size = self.file_slot(id).map(|handle| handle.size);
        match size {
            Some(size) => {
                self.store.push(size as Cell)?;
                self.store.push(0)
            }
            None => {
                self.store.push(0)?;
                self.store.push(-1)
            }
        }
    }
}
