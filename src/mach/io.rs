use super::{Address, Cell, Machine, BUF_SIZE, FALSE, TIB_START, TRUE};
use crate::lang::Error;
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, is_raw_mode_enabled};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::process::Command;
use std::time::{Duration, Instant};

type Result<T> = std::result::Result<T, Error>;

/// One level of the input-source stack. The TIB cursor state of the
/// enclosing source is parked here and restored when this one is spent.
pub struct Source {
    pub(crate) input: SourceInput,
    saved_tib: String,
    saved_in: Cell,
    saved_ntib: Cell,
}

pub(crate) enum SourceInput {
    Interactive,
    Stream(Box<dyn BufRead>),
}

impl Source {
    /// The bottom of the source stack: the terminal itself.
    pub(crate) fn interactive() -> Source {
        Source {
            input: SourceInput::Interactive,
            saved_tib: String::new(),
            saved_in: 1,
            saved_ntib: 0,
        }
    }
}

/// A pending request for a line of input, recorded by `query`/`accept`
/// and fulfilled either from the current file source or by the next
/// interactive `enter`.
#[derive(Clone, Copy)]
pub(crate) enum IoReq {
    Query,
    Accept { dest: Address, max: usize },
}

impl Machine {
    // Output. Nothing in `mach` writes to stdout; text accumulates here
    // and is drained by the driver as Print events.

    pub(crate) fn print(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub(crate) fn warning(&mut self, text: &str) {
        if self.debug_level() >= 1 {
            self.out.push_str(&format!("? {}\n", text));
        }
    }

    pub(crate) fn debug_level(&self) -> Cell {
        self.store.fetch(self.debug_ptr).unwrap_or(0)
    }

    /// (emit) ( c -- ) one unfiltered byte.
    pub(crate) fn f_emit_p(&mut self) -> Result<()> {
        let c = self.store.pop()? as u8;
        self.out.push(c as char);
        Ok(())
    }

    /// emit ( c -- ) 7-bit sibling of (emit).
    pub(crate) fn f_emit(&mut self) -> Result<()> {
        let c = self.store.pop()? % 128;
        self.out.push(c as u8 as char);
        Ok(())
    }

    /// type ( s -- ) print a counted string.
    pub(crate) fn f_type(&mut self) -> Result<()> {
        let addr = self.store.pop()? as Address;
        let text = self.store.string_get(addr)?;
        self.print(&text);
        Ok(())
    }

    /// . ( n -- ) print in the current base, followed by a space.
    pub(crate) fn f_dot(&mut self) -> Result<()> {
        let value = self.store.pop()?;
        let base = self.store.fetch(self.base_ptr)?.clamp(2, 36) as u32;
        let text = crate::lang::radix::print(value, base);
        self.print(&text);
        self.print(" ");
        Ok(())
    }

    /// u. ( u -- ) print reinterpreted as unsigned.
    pub(crate) fn f_u_dot(&mut self) -> Result<()> {
        let value = self.store.pop()?;
        let base = self.store.fetch(self.base_ptr)?.clamp(2, 36) as u32;
        let text = crate::lang::radix::print_unsigned(value as u64, base);
        self.print(&text);
        self.print(" ");
        Ok(())
    }

    pub(crate) fn f_cr(&mut self) -> Result<()> {
        self.print("\n");
        Ok(())
    }

    pub(crate) fn f_space(&mut self) -> Result<()> {
        self.print(" ");
        Ok(())
    }

    /// flush ( -- ) pending output leaves at the next event boundary, so
    /// there is nothing to force; the word stays for source compatibility.
    pub(crate) fn f_flush(&mut self) -> Result<()> {
        Ok(())
    }

    // Timers.

    pub(crate) fn f_now(&mut self) -> Result<()> {
        self.timer = Instant::now();
        Ok(())
    }

    pub(crate) fn f_millis(&mut self) -> Result<()> {
        let elapsed = self.timer.elapsed().as_millis() as Cell;
        self.store.push(elapsed)
    }

    pub(crate) fn f_micros(&mut self) -> Result<()> {
        let elapsed = self.timer.elapsed().as_micros() as Cell;
        self.store.push(elapsed)
    }

    /// ms ( n -- ) sleep.
    pub(crate) fn f_ms(&mut self) -> Result<()> {
        let delay = self.store.pop()?;
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay as u64));
        }
        Ok(())
    }

    /// (system) ( s -- ) run a shell command, blocking; output is
    /// captured and relayed.
    pub(crate) fn f_system_p(&mut self) -> Result<()> {
        let addr = self.store.pop()? as Address;
        let line = self.store.string_get(addr)?;
        let mut parts = line.split_ascii_whitespace();
        let program = match parts.next() {
            Some(p) => p,
            None => return Ok(()),
        };
        let mut command = Command::new(program);
        for arg in parts {
            command.arg(arg);
        }
        match command.output() {
            Ok(output) => {
                self.print(&String::from_utf8_lossy(&output.stdout));
                self.print(&String::from_utf8_lossy(&output.stderr));
                Ok(())
            }
            Err(e) => Err(error!(IoError; "(system): {}", e)),
        }
    }

    // Raw terminal mode and keys.

    pub(crate) fn f_raw_mode_on(&mut self) -> Result<()> {
        enable_raw_mode().map_err(|e| error!(IoError; "raw-mode-on: {}", e))
    }

    pub(crate) fn f_raw_mode_off(&mut self) -> Result<()> {
        disable_raw_mode().map_err(|e| error!(IoError; "raw-mode-off: {}", e))
    }

    pub(crate) fn f_raw_mode_q(&mut self) -> Result<()> {
        let enabled = is_raw_mode_enabled().map_err(|e| error!(IoError; "raw-mode?: {}", e))?;
        self.store.push(if enabled { TRUE } else { FALSE })
    }

    /// Decode one terminal key event into the byte sequence a raw tty
    /// would deliver; extra bytes queue up for later `key` calls.
    fn queue_key_event(&mut self) -> Result<()> {
        loop {
            let ev = event::read().map_err(|e| error!(IoError; "key: {}", e))?;
            if let TermEvent::Key(key) = ev {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                match key.code {
                    KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.keys.push_back(c as u8 & 0x1f);
                    }
                    KeyCode::Char(c) => {
                        if c.is_ascii() {
                            self.keys.push_back(c as u8);
                        } else {
                            self.keys.push_back(b'?');
                        }
                    }
                    KeyCode::Enter => self.keys.push_back(b'\r'),
                    KeyCode::Backspace => self.keys.push_back(0x7f),
                    KeyCode::Tab => self.keys.push_back(b'\t'),
                    KeyCode::Esc => self.keys.push_back(0x1b),
                    KeyCode::Up => self.keys.extend([0x1b, b'[', b'A']),
                    KeyCode::Down => self.keys.extend([0x1b, b'[', b'B']),
                    KeyCode::Right => self.keys.extend([0x1b, b'[', b'C']),
                    KeyCode::Left => self.keys.extend([0x1b, b'[', b'D']),
                    KeyCode::Home => self.keys.extend([0x1b, b'[', b'H']),
                    KeyCode::End => self.keys.extend([0x1b, b'[', b'F']),
                    KeyCode::Delete => self.keys.extend([0x1b, b'[', b'3', b'~']),
                    _ => continue,
                }
                return Ok(());
            }
        }
    }

    pub(crate) fn read_key_byte(&mut self) -> Result<u8> {
        if self.keys.is_empty() {
            self.queue_key_event()?;
        }
        self.keys
            .pop_front()
            .ok_or_else(|| error!(IoError; "key: no input"))
    }

    /// key ( -- c ) block for one byte of terminal input.
    pub(crate) fn f_key(&mut self) -> Result<()> {
        let byte = self.read_key_byte()?;
        self.store.push(byte as Cell)
    }

    /// key? ( -- f ) poll; raw mode is required for byte-level timing.
    pub(crate) fn f_key_q(&mut self) -> Result<()> {
        if !self.keys.is_empty() {
            return self.store.push(TRUE);
        }
        let ready = event::poll(Duration::from_millis(0))
            .map_err(|e| error!(IoError; "key?: {}", e))?;
        self.store.push(if ready { TRUE } else { FALSE })
    }

    // The input-source stack.

    /// Load a line of text into the TIB and reset the cursor.
    pub(crate) fn load_tib(&mut self, line: &str) -> Result<()> {
        let mut end = line.len().min(BUF_SIZE - 2);
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        let line = &line[..end];
        self.store.string_set(TIB_START, line)?;
        self.store.store(self.tib_size_ptr, line.len() as Cell)?;
        self.store.store(self.tib_in_ptr, 1)
    }

    pub(crate) fn push_source(&mut self, input: SourceInput) -> Result<()> {
        let saved_tib = self.store.string_get(TIB_START)?;
        let saved_in = self.store.fetch(self.tib_in_ptr)?;
        let saved_ntib = self.store.fetch(self.tib_size_ptr)?;
        self.reader.push(Source {
            input,
            saved_tib,
            saved_in,
            saved_ntib,
        });
        // force the next line to come from the new source
        self.store.store(self.tib_size_ptr, 0)?;
        self.store.store(self.tib_in_ptr, 1)
    }

    pub(crate) fn pop_source(&mut self) -> Result<()> {
        match self.reader.pop() {
            Some(source) => {
                self.store.string_set(TIB_START, &source.saved_tib)?;
                self.store.store(self.tib_size_ptr, source.saved_ntib)?;
                self.store.store(self.tib_in_ptr, source.saved_in)
            }
            None => Err(error!(StateError; "no input source")),
        }
    }

    /// One line from the file source on top of the stack; `None` at EOF.
    pub(crate) fn read_top_stream_line(&mut self) -> Result<Option<String>> {
        match self.reader.last_mut() {
            Some(Source {
                input: SourceInput::Stream(reader),
                ..
            }) => {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => Ok(None),
                    Ok(_) => Ok(Some(line.trim_end_matches(&['\n', '\r'][..]).to_string())),
                    Err(e) => Err(error!(IoError; "read: {}", e)),
                }
            }
            _ => Err(error!(StateError; "no file source")),
        }
    }

    /// Pull the next line from the file source on top of the stack;
    /// at end of file the source is popped and the outer one resumes.
    pub(crate) fn next_source_line(&mut self) -> Result<()> {
        match self.read_top_stream_line()? {
            Some(line) => self.load_tib(&line),
            None => self.pop_source(),
        }
    }

    /// Open a path or http(s) URL as a buffered line source.
    fn open_stream(path: &str) -> Result<Box<dyn BufRead>> {
        if path.starts_with("http://") || path.starts_with("https://") {
            let response =
                reqwest::blocking::get(path).map_err(|e| error!(IoError; "{}: {}", path, e))?;
            if !response.status().is_success() {
                return Err(error!(IoError; "{}: {}", path, response.status()));
            }
            Ok(Box::new(BufReader::new(response)))
        } else {
            let file = File::open(path).map_err(|e| error!(IoError; "{}: {}", path, e))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }

    /// Queue a source file; lines are consumed before any pending
    /// interactive input.
    pub fn include_source(&mut self, path: &str) -> Result<()> {
        let stream = Self::open_stream(path)?;
        self.push_source(SourceInput::Stream(stream))?;
        self.awaiting_line = false;
        Ok(())
    }

    /// include-file ( s -- f ) true when the named file was opened.
    pub(crate) fn f_include_file(&mut self) -> Result<()> {
        let addr = self.store.pop()? as Address;
        let path = self.store.string_get(addr)?;
        match Self::open_stream(&path) {
            Ok(stream) => {
                self.push_source(SourceInput::Stream(stream))?;
                self.store.push(TRUE)
            }
            Err(_) => self.store.push(FALSE),
        }
    }

    /// include <name> ( -- ) load a source file by postfix name.
    pub(crate) fn f_include(&mut self) -> Result<()> {
        let path = self.parse_name()?;
        self.include_source(&path)
    }

    // Line input requests.

    /// query ( -- ) ask for a line into the TIB.
    pub(crate) fn f_query(&mut self) -> Result<()> {
        self.io_request = Some(IoReq::Query);
        Ok(())
    }

    /// accept ( b u -- b u2 ) ask for up to u bytes at address b.
    pub(crate) fn f_accept(&mut self) -> Result<()> {
        let max = self.store.pop()?;
        let dest = self.store.pop()? as Address;
        if max < 0 {
            return Err(error!(RangeError; "accept {}", max));
        }
        self.io_request = Some(IoReq::Accept {
            dest,
            max: max as usize,
        });
        Ok(())
    }

    /// Complete a pending query/accept with a line of text.
    pub(crate) fn fulfill_input(&mut self, line: &str) -> Result<()> {
        match self.io_request.take() {
            Some(IoReq::Query) => self.load_tib(line),
            Some(IoReq::Accept { dest, max }) => {
                let text: String = line.chars().take(max).collect();
                self.store.string_set(dest, &text)?;
                self.store.push(dest as Cell)?;
                self.store.push(text.len() as Cell)
            }
            None => self.load_tib(line),
        }
    }
}
