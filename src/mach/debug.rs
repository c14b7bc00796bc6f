use super::{
    Address, Cell, Machine, ABORT, ADDRESS_MASK, ARRAY, BRANCH, BRANCH0, BREAK, CONSTANT,
    DEFINITION, EXEC, EXIT, LITERAL, STRLIT, VARIABLE,
};
use crate::lang::Error;
use std::io::Write;

type Result<T> = std::result::Result<T, Error>;

fn opcode_name(value: Cell) -> Option<&'static str> {
    match value {
        VARIABLE => Some("VARIABLE"),
        CONSTANT => Some("CONSTANT"),
        LITERAL => Some("LITERAL"),
        STRLIT => Some("STRLIT"),
        DEFINITION => Some("DEFINITION"),
        BRANCH => Some("BRANCH"),
        BRANCH0 => Some("BRANCH0"),
        ABORT => Some("ABORT"),
        EXIT => Some("EXIT"),
        BREAK => Some("BREAK"),
        EXEC => Some("EXEC"),
        ARRAY => Some("ARRAY"),
        _ => None,
    }
}

/// Stack display, the stepper, and the dump primitives the disassembly
/// tooling builds on.
impl Machine {
    /// .s ( -- ) print the data stack, bottom first.
    pub(crate) fn f_dot_s(&mut self) -> Result<()> {
        let mut text = String::from("[ ");
        for value in self.store.slice() {
            text.push_str(&format!("{} ", value));
        }
        text.push_str("] ");
        self.print(&text);
        Ok(())
    }

    pub(crate) fn f_show_stack(&mut self) -> Result<()> {
        self.show_stack = true;
        Ok(())
    }

    pub(crate) fn f_hide_stack(&mut self) -> Result<()> {
        self.show_stack = false;
        Ok(())
    }

    /// dbg ( n -- ) set the diagnostic level: 0 errors, 1 warnings, 2 info.
    pub(crate) fn f_dbg(&mut self) -> Result<()> {
        let level = self.store.pop()?;
        self.store.store(self.debug_ptr, level)
    }

    pub(crate) fn f_debuglevel(&mut self) -> Result<()> {
        let level = self.debug_level();
        self.print(&format!("debuglevel is {}\n", level));
        Ok(())
    }

    /// A one-line description of the cell at `addr` as the inner
    /// interpreter would see it. Heuristic, like any dump of untyped cells.
    fn describe_cell(&self, addr: Address) -> String {
        let value = match self.store.fetch(addr) {
            Ok(v) => v,
            Err(_) => return "?".to_string(),
        };
        if self.is_builtin_cell(value) {
            let index = (value as u64 & ADDRESS_MASK) as usize;
            return match self.builtins.get(index) {
                Some(b) => b.name.to_string(),
                None => format!("builtin {}?", index),
            };
        }
        match value {
            LITERAL => format!("LITERAL {}", self.store.fetch(addr + 1).unwrap_or(0)),
            STRLIT => {
                let s = self
                    .store
                    .fetch(addr + 1)
                    .and_then(|a| self.store.string_get(a as Address))
                    .unwrap_or_default();
                format!("STRLIT \" {}\"", s)
            }
            BRANCH => format!("BRANCH {}", self.store.fetch(addr + 1).unwrap_or(0)),
            BRANCH0 => format!("BRANCH0 {}", self.store.fetch(addr + 1).unwrap_or(0)),
            v => {
                if let Some(name) = opcode_name(v) {
                    return name.to_string();
                }
                if v <= 0 {
                    return format!("{}", v);
                }
                // a call: the cell before the target cfa is its name field
                let nfa = self.store.fetch(v as Address - 1).unwrap_or(0);
                match self.store.string_get(nfa as Address) {
                    Ok(name) => format!("->{}", name),
                    Err(_) => format!("{}", v),
                }
            }
        }
    }

    /// The stepper, driven by the `stepper` and `stepper-depth` variables:
    /// 0 off, 1 trace, -1 single step. Runs before each threaded cell.
    /// In single-step mode the pending output is pushed straight to the
    /// terminal so the prompt is visible before blocking on a key.
    pub(crate) fn trace_step(&mut self, pc: Address) -> Result<()> {
        let mode = self.store.fetch(self.stepper_ptr)?;
        if mode == 0 {
            return Ok(());
        }
        let limit = self.store.fetch(self.step_depth_ptr)?;
        if self.call_depth as Cell > limit {
            return Ok(());
        }
        for _ in 1..self.call_depth {
            self.print(" ");
        }
        self.f_dot_s()?;
        let line = format!("{:>5}  {}\n", pc, self.describe_cell(pc));
        self.print(&line);
        if mode < 0 {
            self.print("Step> ");
            let pending = std::mem::take(&mut self.out);
            print!("{}", pending);
            std::io::stdout().flush().ok();
            let c = loop {
                let byte = self.read_key_byte()?;
                if byte != b'\n' && byte != b'\r' {
                    break byte;
                }
            };
            match c {
                b't' => self.store.store(self.stepper_ptr, 1)?,
                b'c' => self.store.store(self.stepper_ptr, 0)?,
                b'i' => {
                    let d = self.store.fetch(self.step_depth_ptr)?;
                    self.store.store(self.step_depth_ptr, d + 1)?;
                }
                b'o' => {
                    let d = self.store.fetch(self.step_depth_ptr)?;
                    self.store.store(self.step_depth_ptr, d - 1)?;
                }
                b'h' | b'?' => {
                    println!("Stepper: 's' step, 't' trace, 'c' continue, 'i'/'o' depth, 'h' help")
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// dump ( a u -- ) print u cells starting at a, with annotations.
    pub(crate) fn f_dump(&mut self) -> Result<()> {
        let count = self.store.pop()?;
        let addr = self.store.pop()?;
        if addr < 0 || count < 0 {
            return Err(error!(RangeError; "dump"));
        }
        for i in 0..count as Address {
            let a = addr as Address + i;
            let value = self.store.fetch(a)?;
            let line = format!("{:>6}  {:>20}  {}\n", a, value, self.describe_cell(a));
            self.print(&line);
        }
        Ok(())
    }

    /// words ( -- ) list the dictionary, most recent first.
    pub(crate) fn f_words(&mut self) -> Result<()> {
        let mut names = Vec::new();
        let context = self.store.fetch(self.context_ptr)? as Address;
        if context > 0 {
            let mut link = context - 1;
            while link > 0 {
                let nfa = self.store.fetch(link + 1)?;
                names.push(self.store.string_get(nfa as Address)?);
                link = self.store.fetch(link)? as Address;
            }
        }
        let mut column = 0;
        let mut text = String::new();
        for name in names {
            if column + name.len() + 1 > 72 {
                text.push('\n');
                column = 0;
            }
            column += name.len() + 1;
            text.push_str(&name);
            text.push(' ');
        }
        text.push('\n');
        self.print(&text);
        Ok(())
    }

    /// builtin-name ( n -- s ) the name of builtin n, staged in TMP.
    pub(crate) fn f_builtin_name(&mut self) -> Result<()> {
        let index = self.store.pop()?;
        let name = match self.builtins.get(index as usize) {
            Some(b) => b.name,
            None => return Err(error!(RangeError; "builtin {}", index)),
        };
        let name = name.to_string();
        let tmp = self.store.fetch(self.tmp_ptr)? as Address;
        self.store.string_set(tmp, &name)?;
        self.store.push(tmp as Cell)
    }
}
