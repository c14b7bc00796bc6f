use super::{
    Address, Cell, Machine, ABORT, ADDRESS_MASK, ARRAY, BRANCH, BRANCH0, BREAK, CONSTANT,
    DATA_SIZE, DEFINITION, EXEC, EXIT, LITERAL, STRLIT, VARIABLE,
};
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// The inner interpreter: a flat loop over a resumable program counter.
///
/// The return stack lives in the cell store, so calling is nothing more
/// than pushing the continuation and moving the program counter. A frame
/// of zero marks the outermost call; popping it ends threaded execution
/// and hands control back to the outer interpreter.
impl Machine {
    /// Begin or continue execution of the word at `cfa`.
    ///
    /// Builtins are called directly. Data words push their payload and
    /// fall through. Definitions push the continuation (or the zero
    /// sentinel when entered from the outer interpreter) and jump past
    /// the DEFINITION tag.
    pub(crate) fn enter_word(&mut self, cfa: Address) -> Result<()> {
        let code = self.store.fetch(cfa)?;
        if self.is_builtin_cell(code) {
            return self.call_builtin((code as u64 & ADDRESS_MASK) as usize);
        }
        match code {
            VARIABLE => self.store.push(cfa as Cell + 1),
            CONSTANT => {
                let value = self.store.fetch(cfa + 1)?;
                self.store.push(value)
            }
            ARRAY => self.store.push(cfa as Cell + 2),
            DEFINITION => {
                match self.pc {
                    Some(pc) => self.store.rpush(pc as Cell)?,
                    None => self.store.rpush(0)?,
                }
                self.pc = Some(cfa + 1);
                self.call_depth += 1;
                Ok(())
            }
            _ => Err(error!(TypeError; "cell {}", cfa)),
        }
    }

    pub(crate) fn call_builtin(&mut self, index: usize) -> Result<()> {
        let code = match self.builtins.get(index) {
            Some(builtin) => builtin.code,
            None => return Err(error!(TypeError; "builtin {}", index)),
        };
        code(self)
    }

    /// Execute one cell of threaded code. Only called while `pc` is live.
    pub(crate) fn step(&mut self) -> Result<()> {
        let pc = match self.pc {
            Some(pc) => pc,
            None => return Ok(()),
        };
        self.trace_step(pc)?;
        let ir = self.store.fetch(pc)?;
        self.pc = Some(pc + 1);
        if self.is_builtin_cell(ir) {
            return self.call_builtin((ir as u64 & ADDRESS_MASK) as usize);
        }
        match ir {
            LITERAL => {
                let value = self.store.fetch(pc + 1)?;
                self.store.push(value)?;
                self.pc = Some(pc + 2);
            }
            STRLIT => {
                let addr = self.store.fetch(pc + 1)?;
                self.store.push(addr)?;
                self.pc = Some(pc + 2);
            }
            BRANCH => {
                self.pc = Some(self.branch_target(pc + 1)?);
            }
            BRANCH0 => {
                if self.store.pop()? == 0 {
                    self.pc = Some(self.branch_target(pc + 1)?);
                } else {
                    self.pc = Some(pc + 2);
                }
            }
            DEFINITION => {} // tag at the head of a definition; fall through
            BREAK | EXIT => self.word_return()?,
            ABORT => return Err(error!(UserAbort)),
            EXEC => {
                let cfa = self.store.pop()?;
                if cfa < 0 || cfa as usize >= DATA_SIZE {
                    return Err(error!(TypeError; "exec {}", cfa));
                }
                self.enter_word(cfa as Address)?;
            }
            _ => {
                // any other in-range cell is a compiled call
                if ir > 0 && (ir as usize) < DATA_SIZE {
                    self.enter_word(ir as Address)?;
                } else {
                    return Err(error!(TypeError; "cell {} at {}", ir, pc));
                }
            }
        }
        Ok(())
    }

    /// Pop the return stack into the program counter. A zero frame means
    /// the outermost word finished.
    fn word_return(&mut self) -> Result<()> {
        let r = self.store.rpop()?;
        self.call_depth = self.call_depth.saturating_sub(1);
        if r == 0 {
            self.pc = None;
        } else {
            self.pc = Some(r as Address);
        }
        Ok(())
    }

    /// Resolve a signed relative offset stored at `slot`.
    fn branch_target(&self, slot: Address) -> Result<Address> {
        let offset = self.store.fetch(slot)?;
        let target = slot as i64 + offset;
        if target < 0 || target as usize >= DATA_SIZE {
            return Err(error!(RangeError; "branch to {}", target));
        }
        Ok(target as Address)
    }
}
