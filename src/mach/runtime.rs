use super::builtins::Builtin;
use super::files::FileHandle;
use super::io::{IoReq, Source};
use super::store::Store;
use super::{
    Address, Cell, ADDRESS_MASK, FALSE, PAD_START, STR_START, TIB_START, TMP_START, VARIABLE,
};
use crate::lang::Error;
use std::collections::VecDeque;
use std::time::Instant;

type Result<T> = std::result::Result<T, Error>;

/// What the driver loop should do next.
///
/// The machine never touches stdout or stdin for line input; it yields
/// output and asks for lines through these events, so a test harness can
/// drive it exactly like the terminal does.
pub enum Event {
    /// A new interactive line is wanted.
    Stopped,
    /// The cycle budget ran out; call `execute` again.
    Running,
    /// Pending output to display.
    Print(String),
    /// Diagnostics from an aborted line.
    Errors(Vec<Error>),
    /// The `bye` word ran.
    Bye,
}

/// The whole Forth system: the two stores, the builtin table, and the
/// resumable state of the inner and outer interpreters.
pub struct Machine {
    pub(crate) store: Store,
    pub(crate) builtins: Vec<Builtin>,
    pub(crate) control: Vec<(Cell, Address)>,
    pub(crate) reader: Vec<Source>,
    pub(crate) files: Vec<Option<FileHandle>>,
    pub(crate) pc: Option<Address>,
    pub(crate) call_depth: usize,
    pub(crate) out: String,
    pub(crate) errors: Vec<Error>,
    pub(crate) io_request: Option<IoReq>,
    pub(crate) keys: VecDeque<u8>,
    pub(crate) show_stack: bool,
    pub(crate) exit: bool,
    pub(crate) timer: Instant,
    interrupted: bool,
    pub(crate) awaiting_line: bool,
    // cell addresses of the system variables, shared with running code
    pub(crate) here_ptr: Address,
    pub(crate) s_here_ptr: Address,
    pub(crate) context_ptr: Address,
    pub(crate) pad_ptr: Address,
    pub(crate) tmp_ptr: Address,
    pub(crate) base_ptr: Address,
    pub(crate) tib_ptr: Address,
    pub(crate) tib_size_ptr: Address,
    pub(crate) tib_in_ptr: Address,
    pub(crate) last_ptr: Address,
    pub(crate) state_ptr: Address,
    pub(crate) stepper_ptr: Address,
    pub(crate) step_depth_ptr: Address,
    pub(crate) debug_ptr: Address,
}

impl Default for Machine {
    fn default() -> Machine {
        let mut machine = Machine::bare();
        machine.cold_start().expect("cold start failed");
        machine
    }
}

impl Machine {
    pub fn new() -> Machine {
        Machine::default()
    }

    fn bare() -> Machine {
        Machine {
            store: Store::new(),
            builtins: Vec::new(),
            control: Vec::new(),
            reader: Vec::new(),
            files: Vec::new(),
            pc: None,
            call_depth: 0,
            out: String::new(),
            errors: Vec::new(),
            io_request: None,
            keys: VecDeque::new(),
            show_stack: true,
            exit: false,
            timer: Instant::now(),
            interrupted: false,
            awaiting_line: true,
            here_ptr: 0,
            s_here_ptr: 0,
            context_ptr: 0,
            pad_ptr: 0,
            tmp_ptr: 0,
            base_ptr: 0,
            tib_ptr: 0,
            tib_size_ptr: 0,
            tib_in_ptr: 0,
            last_ptr: 0,
            state_ptr: 0,
            stepper_ptr: 0,
            step_depth_ptr: 0,
            debug_ptr: 0,
        }
    }

    /// Install the system variables and the builtin table.
    fn cold_start(&mut self) -> Result<()> {
        self.reader.push(Source::interactive());
        self.insert_variables()?;
        self.register_builtins()?;
        self.store.store(self.state_ptr, FALSE)?;
        Ok(())
    }

    /// Hand-craft the first three dictionary entries. `s-here` must exist
    /// before any string can be created, `here` before any word can be
    /// laid down, and `context` before anything can be found; after those
    /// three, `make_variable` carries the rest.
    fn insert_variables(&mut self) -> Result<()> {
        // s-here: BP at 1, name at STR_START, value points past the name
        self.store.store(0, 0)?;
        self.store.store(1, 0)?;
        self.store.string_set(STR_START, "s-here")?;
        self.store.store(2, STR_START as Cell)?;
        self.store.store(3, VARIABLE)?;
        self.store.store(4, (STR_START + 7) as Cell)?;
        self.store.store(5, 1)?;
        self.s_here_ptr = 4;

        // here: needed by make_word before its own entry is complete
        self.here_ptr = 8;
        let name = self.string_create("here")?;
        self.store.store(6, name as Cell)?;
        self.store.store(7, VARIABLE)?;
        self.store.store(8, 10)?;
        self.store.store(9, 5)?;

        // context: points at its own name field until a word follows
        let name = self.string_create("context")?;
        self.store.store(10, name as Cell)?;
        self.store.store(11, VARIABLE)?;
        self.store.store(12, 10)?;
        self.store.store(13, 9)?;
        self.context_ptr = 12;
        self.store.store(self.here_ptr, 14)?;

        self.pad_ptr = self.make_variable("pad")?;
        self.store.store(self.pad_ptr, PAD_START as Cell)?;
        self.tmp_ptr = self.make_variable("tmp")?;
        self.store.store(self.tmp_ptr, TMP_START as Cell)?;
        self.base_ptr = self.make_variable("base")?;
        self.store.store(self.base_ptr, 10)?;
        self.tib_ptr = self.make_variable("'tib")?;
        self.store.store(self.tib_ptr, TIB_START as Cell)?;
        self.tib_size_ptr = self.make_variable("#tib")?;
        self.tib_in_ptr = self.make_variable(">in")?;
        self.store.store(self.tib_in_ptr, 1)?;
        self.last_ptr = self.make_variable("last")?;
        self.state_ptr = self.make_variable("state")?;
        self.stepper_ptr = self.make_variable("stepper")?;
        self.step_depth_ptr = self.make_variable("stepper-depth")?;
        self.store.store(self.step_depth_ptr, 1)?;
        self.debug_ptr = self.make_variable("debuglevel")?;
        self.store.store(self.debug_ptr, 1)?;

        // now that last exists, make it agree with context
        let context = self.store.fetch(self.context_ptr)?;
        self.store.store(self.last_ptr, context)?;
        Ok(())
    }

    /// Feed one line of input. Fulfills a pending `query`/`accept`
    /// request if there is one; otherwise the line lands in the TIB for
    /// the outer interpreter.
    pub fn enter(&mut self, line: &str) {
        self.awaiting_line = false;
        let result = if self.io_request.is_some() {
            self.fulfill_input(line)
        } else {
            self.load_tib(line)
        };
        if let Err(e) = result {
            self.do_abort(e);
        }
    }

    /// Request a clean stop at the next execute slice (Ctrl-C).
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    /// Run up to `cycles` units of work and report what happened.
    pub fn execute(&mut self, cycles: usize) -> Event {
        let mut budget = cycles;
        loop {
            if !self.out.is_empty() {
                return Event::Print(std::mem::take(&mut self.out));
            }
            if !self.errors.is_empty() {
                return Event::Errors(std::mem::take(&mut self.errors));
            }
            if self.exit {
                return Event::Bye;
            }
            if self.interrupted {
                self.interrupted = false;
                self.do_abort(error!(UserAbort; "interrupted"));
                continue;
            }
            if self.awaiting_line {
                return Event::Stopped;
            }
            if budget == 0 {
                return Event::Running;
            }
            budget -= 1;
            if let Err(e) = self.advance() {
                self.do_abort(e);
            }
        }
    }

    /// One unit of work: a threaded-code step, a token dispatch, or a
    /// source-line refill.
    fn advance(&mut self) -> Result<()> {
        if self.io_request.is_some() {
            if self.reader.len() > 1 {
                match self.read_top_stream_line()? {
                    Some(line) => return self.fulfill_input(&line),
                    None => return self.pop_source(),
                }
            }
            self.awaiting_line = true;
            return Ok(());
        }
        if self.pc.is_some() {
            return self.step();
        }
        if self.line_consumed()? {
            if self.reader.len() > 1 {
                return self.next_source_line();
            }
            self.awaiting_line = true;
            return Ok(());
        }
        match self.next_token()? {
            Some(pad) => self.dispatch_token(pad),
            None => Ok(()),
        }
    }

    /// Every error funnels here: clear both stacks, reset `state`, drop
    /// any open definition and queued sources, leave raw mode, and hand
    /// the diagnostic to the driver. The contract is "restart the line".
    pub(crate) fn do_abort(&mut self, error: Error) {
        self.errors.push(error);
        // a definition under construction dies with the line
        if let Ok(true) = self.compile_mode() {
            if let Ok(last) = self.store.fetch(self.last_ptr) {
                if last > 0 {
                    let name = self.store.fetch(last as Address).unwrap_or(0);
                    let _ = self.store.store(self.here_ptr, last);
                    let _ = self
                        .store
                        .store(self.s_here_ptr, (name as u64 & ADDRESS_MASK) as Cell);
                }
            }
        }
        self.pc = None;
        self.call_depth = 0;
        self.store.reset();
        self.control.clear();
        self.io_request = None;
        let _ = self.set_compile_mode(false);
        // discard queued sources and the rest of the line
        while self.reader.len() > 1 {
            let _ = self.pop_source();
        }
        if let Ok(n_tib) = self.store.fetch(self.tib_size_ptr) {
            let _ = self.store.store(self.tib_in_ptr, n_tib + 1);
        }
        let _ = crossterm::terminal::disable_raw_mode();
        self.awaiting_line = true;
    }

    /// The REPL prompt: the stack display while `show-stack` is on,
    /// then " ok ".
    pub fn prompt(&self) -> String {
        let mut prompt = String::new();
        if self.show_stack {
            prompt.push_str("[ ");
            for value in self.store.slice() {
                prompt.push_str(&format!("{} ", value));
            }
            prompt.push_str("] ");
        }
        prompt.push_str(" ok ");
        prompt
    }

    // Introspection, shared by the dump tooling and the tests.

    /// Read a cell without error plumbing; out-of-range reads as zero.
    pub fn cell(&self, addr: Address) -> Cell {
        self.store.fetch(addr).unwrap_or(0)
    }

    pub fn cell_here(&self) -> Address {
        self.here().unwrap_or(0)
    }

    pub fn context_addr(&self) -> Address {
        self.context_ptr
    }

    pub fn stack(&self) -> Vec<Cell> {
        self.store.slice().to_vec()
    }

    pub fn stack_depth(&self) -> usize {
        self.store.depth()
    }

    pub fn return_depth(&self) -> usize {
        self.store.rdepth()
    }

    pub fn compiling(&self) -> bool {
        self.compile_mode().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_start_layout() {
        let m = Machine::default();
        // the hand-crafted entries sit exactly where the layout says
        assert_eq!(m.cell(1), 0); // first back pointer terminates the chain
        assert_eq!(m.cell(3), VARIABLE);
        assert_eq!(m.cell(7), VARIABLE);
        assert_eq!(m.cell(9), 5);
        assert_eq!(m.cell(13), 9);
        assert!(m.cell_here() > 14);
        assert!(!m.compiling());
    }

    #[test]
    fn test_bootstrap_variables_resolve() {
        let mut m = Machine::default();
        for name in [
            "s-here", "here", "context", "pad", "tmp", "base", "'tib", "#tib", ">in", "last",
            "state", "stepper", "stepper-depth", "debuglevel",
        ] {
            assert!(m.lookup(name).is_some(), "{} missing", name);
        }
    }

    #[test]
    fn test_base_defaults_to_ten() {
        let mut m = Machine::default();
        let cfa = m.lookup("base").unwrap();
        assert_eq!(m.cell(cfa + 1), 10);
    }
}
