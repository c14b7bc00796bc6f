use super::{Address, Cell, Machine, ADDRESS_MASK, BUILTIN_FLAG, IMMEDIATE_FLAG};
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// Dictionary layout and lifecycle.
///
/// Every word is a run of adjacent cells: [BP][NFA][CFA][params..][next BP].
/// The back pointer holds the previous word's name field address minus one,
/// so `find` can walk the chain from `context` back to zero. `here` always
/// points at the next free cell, and the cell just below `here` is always a
/// back-pointer slot waiting for the next definition.
impl Machine {
    pub(crate) fn here(&self) -> Result<Address> {
        Ok(self.store.fetch(self.here_ptr)? as Address)
    }

    /// Append a cell at `here` and advance it. The sole allocation
    /// discipline for code.
    pub(crate) fn comma(&mut self, value: Cell) -> Result<()> {
        let here = self.here()?;
        self.store.store(here, value)?;
        self.store.store(self.here_ptr, here as Cell + 1)?;
        Ok(())
    }

    /// Append a counted string to the string store, returning the address
    /// of its length byte.
    pub(crate) fn string_create(&mut self, string: &str) -> Result<Address> {
        let addr = self.store.fetch(self.s_here_ptr)? as Address;
        self.store.string_set(addr, string)?;
        let len = string.len().min(255);
        self.store.store(self.s_here_ptr, (addr + len + 1) as Cell)?;
        Ok(addr)
    }

    /// Install a complete word: name field, the given parameter cells, and
    /// the trailing back pointer. Returns the code field address.
    pub(crate) fn make_word(&mut self, name: &str, args: &[Cell]) -> Result<Address> {
        let back = self.here()? - 1; // back-pointer slot is already in place
        let nfa = back + 1;
        let str_addr = self.string_create(name)?;
        self.store.store(nfa, str_addr as Cell)?;
        let mut ptr = nfa;
        for arg in args {
            ptr += 1;
            self.store.store(ptr, *arg)?;
        }
        ptr += 1;
        self.store.store(ptr, back as Cell)?; // the next word's back pointer
        self.store.store(self.here_ptr, ptr as Cell + 1)?;
        self.store.store(self.context_ptr, nfa as Cell)?;
        if self.last_ptr != 0 {
            self.store.store(self.last_ptr, nfa as Cell)?;
        }
        Ok(nfa + 1)
    }

    pub(crate) fn make_variable(&mut self, name: &str) -> Result<Address> {
        let cfa = self.make_word(name, &[super::VARIABLE, 0])?;
        Ok(cfa + 1) // the value cell
    }

    /// Open a new dictionary entry: name field only, no code field yet.
    /// `last` points at the open entry until `close_word` finishes it.
    pub(crate) fn open_word(&mut self, name: &str) -> Result<()> {
        let str_addr = self.string_create(name)?;
        let nfa = self.here()?;
        self.store.store(nfa, str_addr as Cell)?;
        self.store.store(self.last_ptr, nfa as Cell)?;
        self.store.store(self.here_ptr, nfa as Cell + 1)?;
        Ok(())
    }

    /// The `(close)` step: write the trailing back pointer and add the open
    /// entry to the search order. After this, `last == context`.
    pub(crate) fn close_word(&mut self) -> Result<()> {
        let last = self.store.fetch(self.last_ptr)?;
        let here = self.here()?;
        self.store.store(here, last - 1)?;
        self.store.store(self.here_ptr, here as Cell + 1)?;
        self.store.store(self.context_ptr, last)?;
        Ok(())
    }

    /// Search the dictionary for the counted string at `source_addr`.
    /// Walks back pointers from `context`; the most recent definition wins.
    /// Returns the code field address on a hit.
    pub(crate) fn find_name(&self, source_addr: Address) -> Result<Option<Address>> {
        let context = self.store.fetch(self.context_ptr)? as Address;
        if context == 0 {
            return Ok(None);
        }
        let mut link = context - 1;
        while link > 0 {
            let nfa_val = self.store.fetch(link + 1)?;
            let str_addr = (nfa_val as u64 & ADDRESS_MASK) as Address;
            if self.store.string_equal(source_addr, str_addr) {
                return Ok(Some(link + 2));
            }
            link = self.store.fetch(link)? as Address;
        }
        Ok(None)
    }

    /// Host-side lookup by name, staged through TMP.
    pub fn lookup(&mut self, name: &str) -> Option<Address> {
        let tmp = self.store.fetch(self.tmp_ptr).ok()? as Address;
        self.store.string_set(tmp, name).ok()?;
        self.find_name(tmp).ok()?
    }

    pub(crate) fn is_immediate(&self, cfa: Address) -> Result<bool> {
        let nfa_val = self.store.fetch(cfa - 1)?;
        Ok(nfa_val as u64 & IMMEDIATE_FLAG != 0)
    }

    pub(crate) fn is_builtin_cell(&self, value: Cell) -> bool {
        value as u64 & BUILTIN_FLAG != 0
    }

    /// immediate ( -- ) marks the most recently completed word.
    pub(crate) fn f_immediate(&mut self) -> Result<()> {
        let nfa = self.store.fetch(self.context_ptr)? as Address;
        let flagged = self.store.fetch(nfa)? as u64 | IMMEDIATE_FLAG;
        self.store.store(nfa, flagged as Cell)
    }

    /// immed? ( cfa -- f )
    pub(crate) fn f_immediate_q(&mut self) -> Result<()> {
        let cfa = self.store.pop()? as Address;
        let result = self.is_immediate(cfa)?;
        self.store.push(if result { super::TRUE } else { super::FALSE })
    }

    /// ?unique ( s -- s ) warn when the name is already defined.
    pub(crate) fn f_q_unique(&mut self) -> Result<()> {
        let addr = self.store.top()? as Address;
        if self.find_name(addr)?.is_some() {
            let name = self.store.string_get(addr)?;
            self.warning(&format!("redefining {}", name));
        }
        Ok(())
    }

    /// Rewind `here`, `s-here`, `context` and `last` to the state before
    /// the word at `cfa` was defined. Everything above it dies with it.
    pub(crate) fn forget(&mut self, cfa: Address) -> Result<()> {
        let nfa = cfa - 1;
        if nfa < 2 {
            return Err(error!(RangeError; "forget"));
        }
        let back = self.store.fetch(nfa - 1)?;
        let name_addr = self.store.fetch(nfa)? as u64 & ADDRESS_MASK;
        self.store.store(self.here_ptr, nfa as Cell)?;
        self.store.store(self.s_here_ptr, name_addr as Cell)?;
        self.store.store(self.context_ptr, back + 1)?;
        self.store.store(self.last_ptr, back + 1)?;
        Ok(())
    }

    /// forget <name> ( -- )
    pub(crate) fn f_forget(&mut self) -> Result<()> {
        let name = self.parse_name()?;
        let pad = self.store.fetch(self.pad_ptr)? as Address;
        self.store.string_set(pad, &name)?;
        match self.find_name(pad)? {
            Some(cfa) => self.forget(cfa),
            None => Err(error!(LookupError; "{}", name)),
        }
    }

    /// forget-last ( -- ) drop the most recent definition.
    pub(crate) fn f_forget_last(&mut self) -> Result<()> {
        let context = self.store.fetch(self.context_ptr)? as Address;
        self.forget(context + 1)
    }
}
