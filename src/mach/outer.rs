use super::{
    Address, Cell, Machine, ABORT, ARRAY, BREAK, CONSTANT, DATA_SIZE, DEFINITION, FALSE, LITERAL,
    STRLIT, TRUE, VARIABLE,
};
use crate::lang::{radix, Error};

type Result<T> = std::result::Result<T, Error>;

/// The outer interpreter and compiler: tokenize, search, number-convert,
/// execute or compile.
///
/// All text flows through the string store: the current line sits in the
/// TIB as a counted string, `>in` is the read cursor, and each token is
/// staged as a counted string in PAD.
impl Machine {
    pub(crate) fn compile_mode(&self) -> Result<bool> {
        Ok(self.store.fetch(self.state_ptr)? != FALSE)
    }

    pub(crate) fn set_compile_mode(&mut self, on: bool) -> Result<()> {
        self.store
            .store(self.state_ptr, if on { TRUE } else { FALSE })
    }

    fn tib(&self) -> Result<Address> {
        Ok(self.store.fetch(self.tib_ptr)? as Address)
    }

    fn n_tib(&self) -> Result<Cell> {
        self.store.fetch(self.tib_size_ptr)
    }

    fn to_in(&self) -> Result<Cell> {
        self.store.fetch(self.tib_in_ptr)
    }

    fn set_to_in(&mut self, value: Cell) -> Result<()> {
        self.store.store(self.tib_in_ptr, value)
    }

    /// Scan for a `delim`-delimited token in `avail` bytes starting at
    /// `addr`. Leading delimiters are skipped. Returns the token length
    /// and the offset from `addr` to the token start.
    fn parse_scan(&self, addr: Address, avail: usize, delim: u8) -> Result<(usize, usize)> {
        let mut i = addr;
        let end = addr + avail;
        while i < end && self.store.byte_fetch(i)? == delim {
            i += 1;
        }
        let mut j = i;
        while j < end && self.store.byte_fetch(j)? != delim {
            j += 1;
        }
        Ok((j - i, i - addr))
    }

    /// Extract the next `delim`-delimited token from the TIB into the
    /// counted string buffer at `dest`, advancing `>in`. Returns the token
    /// length; zero means the line is exhausted.
    pub(crate) fn parse_to(&mut self, dest: Address, delim: u8) -> Result<usize> {
        let tib = self.tib()?;
        let to_in = self.to_in()?;
        let avail = self.n_tib()? - to_in + 1;
        if avail <= 0 {
            self.set_to_in(to_in + 1)?;
            return Ok(0);
        }
        let (length, delta) = self.parse_scan(tib + to_in as Address, avail as usize, delim)?;
        if length > 0 {
            let start = tib + to_in as Address + delta;
            let text: String = (start..start + length)
                .map(|a| self.store.byte_fetch(a).unwrap_or(b' ') as char)
                .collect();
            self.store.string_set(dest, &text)?;
        }
        self.set_to_in(to_in + (delta + length) as Cell + 1)?;
        Ok(length)
    }

    /// (parse) ( b u c -- b u delta )
    pub(crate) fn f_parse_p(&mut self) -> Result<()> {
        let delim = self.store.pop()? as u8;
        let avail = self.store.pop()?;
        let addr = self.store.pop()? as Address;
        if avail <= 0 {
            self.store.push(addr as Cell)?;
            self.store.push(0)?;
            return self.store.push(0);
        }
        let (length, delta) = self.parse_scan(addr, avail as usize, delim)?;
        self.store.push(addr as Cell)?;
        self.store.push(length as Cell)?;
        self.store.push(delta as Cell)
    }

    /// parse-to ( b c -- b u )
    pub(crate) fn f_parse_to(&mut self) -> Result<()> {
        let delim = self.store.pop()? as u8;
        let dest = self.store.pop()? as Address;
        let length = self.parse_to(dest, delim)?;
        self.store.push(dest as Cell)?;
        self.store.push(length as Cell)
    }

    /// The next blank-delimited token, staged in PAD. `None` when the
    /// current line has been consumed.
    pub(crate) fn next_token(&mut self) -> Result<Option<Address>> {
        let pad = self.store.fetch(self.pad_ptr)? as Address;
        let length = self.parse_to(pad, b' ')?;
        if length == 0 {
            Ok(None)
        } else {
            Ok(Some(pad))
        }
    }

    /// A postfix name for a defining word, as a host string.
    pub(crate) fn parse_name(&mut self) -> Result<String> {
        match self.next_token()? {
            Some(pad) => self.store.string_get(pad),
            None => Err(error!(ParseError; "name expected")),
        }
    }

    /// True once `>in` has moved past the end of the TIB.
    pub(crate) fn line_consumed(&self) -> Result<bool> {
        Ok(self.to_in()? > self.n_tib()?)
    }

    /// eval ( -- ) interpret the rest of the TIB, synchronously.
    pub(crate) fn f_eval(&mut self) -> Result<()> {
        self.eval_now()
    }

    /// Dispatch one token: look it up and execute or compile it, or fall
    /// back to number conversion in the current base.
    pub(crate) fn dispatch_token(&mut self, pad: Address) -> Result<()> {
        let compiling = self.compile_mode()?;
        match self.find_name(pad)? {
            Some(cfa) => {
                if compiling && !self.is_immediate(cfa)? {
                    let code = self.store.fetch(cfa)?;
                    if self.is_builtin_cell(code) {
                        self.comma(code)
                    } else {
                        self.comma(cfa as Cell)
                    }
                } else {
                    self.enter_word(cfa)
                }
            }
            None => {
                let token = self.store.string_get(pad)?;
                match self.number_scan(&token)? {
                    Some(value) => {
                        if compiling {
                            self.compile_literal(value)
                        } else {
                            self.store.push(value)
                        }
                    }
                    None => Err(error!(LookupError; "{}", token)),
                }
            }
        }
    }

    pub(crate) fn number_scan(&self, token: &str) -> Result<Option<Cell>> {
        let base = self.store.fetch(self.base_ptr)?;
        if !(2..=36).contains(&base) {
            return Err(error!(ParseError; "base {}", base));
        }
        Ok(radix::scan(token, base as u32))
    }

    pub(crate) fn compile_literal(&mut self, value: Cell) -> Result<()> {
        self.comma(LITERAL)?;
        self.comma(value)
    }

    /// Compile a call to a named builtin, for words like `."` that splice
    /// primitives into the current definition.
    pub(crate) fn compile_builtin_call(&mut self, name: &str) -> Result<()> {
        let cfa = self
            .lookup(name)
            .ok_or_else(|| error!(LookupError; "{}", name))?;
        let code = self.store.fetch(cfa)?;
        self.comma(code)
    }

    /// Interpret the rest of the current TIB synchronously. Used by the
    /// `eval` word; nested threaded execution shares the return stack.
    pub(crate) fn eval_now(&mut self) -> Result<()> {
        let saved_pc = self.pc.take();
        let saved_depth = self.call_depth;
        self.call_depth = 0;
        let mut budget = 10_000_000usize;
        let result = loop {
            if self.pc.is_some() {
                if budget == 0 {
                    break Err(error!(StateError; "eval ran too long"));
                }
                budget -= 1;
                if let Err(e) = self.step() {
                    break Err(e);
                }
            } else if self.io_request.is_some() {
                break Err(error!(StateError; "input request inside eval"));
            } else {
                match self.next_token() {
                    Ok(Some(pad)) => {
                        if let Err(e) = self.dispatch_token(pad) {
                            break Err(e);
                        }
                    }
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                }
            }
        };
        self.pc = saved_pc;
        self.call_depth = saved_depth;
        result
    }

    // Defining words.

    /// : <name> ( -- ) open a definition and enter compile mode.
    pub(crate) fn f_colon(&mut self) -> Result<()> {
        if self.compile_mode()? {
            return Err(error!(StateError; ": inside a definition"));
        }
        self.f_create()?;
        self.comma(DEFINITION)?;
        self.set_compile_mode(true)
    }

    /// ; ( -- ) write BREAK, close the entry, leave compile mode.
    pub(crate) fn f_semicolon(&mut self) -> Result<()> {
        if !self.compile_mode()? {
            return Err(error!(StateError; "; outside a definition"));
        }
        if !self.control.is_empty() {
            self.control.clear();
            return Err(error!(StateError; "open control structure at ;"));
        }
        self.comma(BREAK)?;
        self.close_word()?;
        self.set_compile_mode(false)
    }

    /// create <name> ( -- ) allocate the name field; no code field.
    pub(crate) fn f_create(&mut self) -> Result<()> {
        let name = self.parse_name()?;
        let pad = self.store.fetch(self.pad_ptr)? as Address;
        if self.find_name(pad)?.is_some() {
            self.warning(&format!("redefining {}", name));
        }
        self.open_word(&name)
    }

    /// variable <name> ( -- )
    pub(crate) fn f_variable(&mut self) -> Result<()> {
        self.f_create()?;
        self.comma(VARIABLE)?;
        self.comma(0)?;
        self.close_word()
    }

    /// constant <name> ( n -- )
    pub(crate) fn f_constant(&mut self) -> Result<()> {
        let value = self.store.pop()?;
        self.f_create()?;
        self.comma(CONSTANT)?;
        self.comma(value)?;
        self.close_word()
    }

    /// array <name> ( n -- ) a VARIABLE with a length header and n cells.
    pub(crate) fn f_array(&mut self) -> Result<()> {
        let length = self.store.pop()?;
        if length < 0 || length as usize >= DATA_SIZE {
            return Err(error!(RangeError; "array length {}", length));
        }
        self.f_create()?;
        self.comma(ARRAY)?;
        self.comma(length)?;
        for _ in 0..length {
            self.comma(0)?;
        }
        self.close_word()
    }

    /// allot ( n -- ) reserve (or release) n cells of dictionary space.
    pub(crate) fn f_allot(&mut self) -> Result<()> {
        let n = self.store.pop()?;
        let here = self.here()? as Cell + n;
        if here < 0 || here as usize >= DATA_SIZE {
            return Err(error!(RangeError; "allot {}", n));
        }
        self.store.store(self.here_ptr, here)
    }

    /// ' <name> ( -- cfa ) abort when the word is unknown.
    pub(crate) fn f_tick(&mut self) -> Result<()> {
        let name = self.parse_name()?;
        let pad = self.store.fetch(self.pad_ptr)? as Address;
        match self.find_name(pad)? {
            Some(cfa) => self.store.push(cfa as Cell),
            None => Err(error!(LookupError; "{}", name)),
        }
    }

    /// (') <name> ( -- cfa | 0 )
    pub(crate) fn f_tick_p(&mut self) -> Result<()> {
        self.parse_name()?;
        let pad = self.store.fetch(self.pad_ptr)? as Address;
        match self.find_name(pad)? {
            Some(cfa) => self.store.push(cfa as Cell),
            None => self.store.push(FALSE),
        }
    }

    /// find ( s -- cfa T | s F )
    pub(crate) fn f_find(&mut self) -> Result<()> {
        let addr = self.store.pop()? as Address;
        match self.find_name(addr)? {
            Some(cfa) => {
                self.store.push(cfa as Cell)?;
                self.store.push(TRUE)
            }
            None => {
                self.store.push(addr as Cell)?;
                self.store.push(FALSE)
            }
        }
    }

    /// number? ( s -- n T | s F )
    pub(crate) fn f_number_q(&mut self) -> Result<()> {
        let addr = self.store.pop()? as Address;
        let token = self.store.string_get(addr)?;
        match self.number_scan(&token)? {
            Some(value) => {
                self.store.push(value)?;
                self.store.push(TRUE)
            }
            None => {
                self.store.push(addr as Cell)?;
                self.store.push(FALSE)
            }
        }
    }

    // String literals and comments.

    /// Collect TIB text up to a closing quote. The blank separating the
    /// opening word from the text was already consumed by parse-to.
    fn scan_quote(&mut self) -> Result<String> {
        let tib = self.tib()?;
        let n_tib = self.n_tib()?;
        let mut offset = self.to_in()?;
        let mut text = String::new();
        while offset <= n_tib {
            let byte = self.store.byte_fetch(tib + offset as Address)?;
            offset += 1;
            if byte == b'"' {
                self.set_to_in(offset)?;
                return Ok(text);
            }
            text.push(byte as char);
        }
        Err(error!(ParseError; "unterminated string"))
    }

    /// s" ...." ( -- s ) string literal; TMP-staged while interpreting.
    pub(crate) fn f_s_quote(&mut self) -> Result<()> {
        let text = self.scan_quote()?;
        if self.compile_mode()? {
            let addr = self.string_create(&text)?;
            self.comma(STRLIT)?;
            self.comma(addr as Cell)
        } else {
            let tmp = self.store.fetch(self.tmp_ptr)? as Address;
            self.store.string_set(tmp, &text)?;
            self.store.push(tmp as Cell)
        }
    }

    /// ." ...." print a string at run time.
    pub(crate) fn f_dot_quote(&mut self) -> Result<()> {
        let text = self.scan_quote()?;
        if self.compile_mode()? {
            let addr = self.string_create(&text)?;
            self.comma(STRLIT)?;
            self.comma(addr as Cell)?;
            self.compile_builtin_call("type")
        } else {
            self.print(&text);
            Ok(())
        }
    }

    /// abort" ...." print a message and abort at run time.
    pub(crate) fn f_abort_quote(&mut self) -> Result<()> {
        let text = self.scan_quote()?;
        if self.compile_mode()? {
            let addr = self.string_create(&text)?;
            self.comma(STRLIT)?;
            self.comma(addr as Cell)?;
            self.compile_builtin_call("type")?;
            self.comma(ABORT)
        } else {
            self.print(&text);
            Err(error!(UserAbort))
        }
    }

    /// \ ( -- ) discard the rest of the line.
    pub(crate) fn f_backslash(&mut self) -> Result<()> {
        let n_tib = self.n_tib()?;
        self.set_to_in(n_tib + 1)
    }

    /// ( ...) ( -- ) skip to the closing paren.
    pub(crate) fn f_paren(&mut self) -> Result<()> {
        let tib = self.tib()?;
        let n_tib = self.n_tib()?;
        let mut offset = self.to_in()?;
        while offset <= n_tib {
            let byte = self.store.byte_fetch(tib + offset as Address)?;
            offset += 1;
            if byte == b')' {
                break;
            }
        }
        self.set_to_in(offset)
    }
}
