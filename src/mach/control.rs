use super::{
    Address, Cell, Machine, BRANCH, BRANCH0, MARK_BEGIN, MARK_CASE, MARK_FOR, MARK_OF, MARK_WHILE,
};
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// Compile-time control flow.
///
/// The immediate words below run during compilation and communicate
/// through the control-marker stack, which is distinct from both the
/// operand stack and the return stack. Each marker is an (address, tag)
/// pair; `if`/`else`/`then` are the exception and keep their placeholder
/// addresses on the operand stack.
///
/// Branch offsets are signed and relative: the patched cell holds
/// target minus placeholder.
impl Machine {
    fn compile_only(&self, word: &str) -> Result<()> {
        if self.compile_mode()? {
            Ok(())
        } else {
            Err(error!(StateError; "{} is compile-only", word))
        }
    }

    fn push_marker(&mut self, tag: Cell, addr: Address) {
        self.control.push((tag, addr));
    }

    fn pop_marker(&mut self, tag: Cell, word: &str) -> Result<Address> {
        match self.control.pop() {
            Some((t, addr)) if t == tag => Ok(addr),
            Some(other) => {
                self.control.push(other);
                Err(error!(StateError; "{} without its opener", word))
            }
            None => Err(error!(StateError; "{} without its opener", word)),
        }
    }

    /// Reserve a branch offset cell at `here`, returning its address.
    fn hole(&mut self) -> Result<Address> {
        let slot = self.here()?;
        self.comma(0)?;
        Ok(slot)
    }

    /// Resolve a forward reference: the placeholder at `slot` now points
    /// at `here`.
    fn patch(&mut self, slot: Address) -> Result<()> {
        let here = self.here()?;
        if slot >= here {
            return Err(error!(StateError; "branch patch at {}", slot));
        }
        self.store.store(slot, here as Cell - slot as Cell)
    }

    /// Compile a branch offset cell pointing back at `target`.
    fn back_branch(&mut self, opcode: Cell, target: Address) -> Result<()> {
        self.comma(opcode)?;
        let slot = self.here()?;
        self.comma(target as Cell - slot as Cell)
    }

    /// if ( -- ) compile BRANCH0 with a forward hole.
    pub(crate) fn f_if(&mut self) -> Result<()> {
        self.compile_only("if")?;
        self.comma(BRANCH0)?;
        let slot = self.hole()?;
        self.store.push(slot as Cell)
    }

    /// else ( -- ) terminate the true branch, retarget the if hole.
    pub(crate) fn f_else(&mut self) -> Result<()> {
        self.compile_only("else")?;
        let if_slot = self.store.pop()? as Address;
        self.comma(BRANCH)?;
        let else_slot = self.hole()?;
        self.patch(if_slot)?;
        self.store.push(else_slot as Cell)
    }

    /// then ( -- ) resolve the open forward branch.
    pub(crate) fn f_then(&mut self) -> Result<()> {
        self.compile_only("then")?;
        let slot = self.store.pop()? as Address;
        self.patch(slot)
    }

    /// begin ( -- ) mark the loop head.
    pub(crate) fn f_begin(&mut self) -> Result<()> {
        self.compile_only("begin")?;
        let here = self.here()?;
        self.push_marker(MARK_BEGIN, here);
        Ok(())
    }

    /// until ( -- ) loop back while the runtime flag is zero.
    pub(crate) fn f_until(&mut self) -> Result<()> {
        self.compile_only("until")?;
        let head = self.pop_marker(MARK_BEGIN, "until")?;
        self.back_branch(BRANCH0, head)
    }

    /// again ( -- ) loop back unconditionally.
    pub(crate) fn f_again(&mut self) -> Result<()> {
        self.compile_only("again")?;
        let head = self.pop_marker(MARK_BEGIN, "again")?;
        self.back_branch(BRANCH, head)
    }

    /// while ( -- ) conditional exit in the middle of a begin loop.
    pub(crate) fn f_while(&mut self) -> Result<()> {
        self.compile_only("while")?;
        self.comma(BRANCH0)?;
        let slot = self.hole()?;
        self.push_marker(MARK_WHILE, slot);
        Ok(())
    }

    /// repeat ( -- ) close the loop and patch the while exit forward.
    pub(crate) fn f_repeat(&mut self) -> Result<()> {
        self.compile_only("repeat")?;
        let while_slot = self.pop_marker(MARK_WHILE, "repeat")?;
        let head = self.pop_marker(MARK_BEGIN, "repeat")?;
        self.back_branch(BRANCH, head)?;
        self.patch(while_slot)
    }

    /// for ( n -- at run time ) count to the return stack, mark the head
    /// at the >r so next's back branch reloads the count.
    pub(crate) fn f_for(&mut self) -> Result<()> {
        self.compile_only("for")?;
        let head = self.here()?;
        self.compile_builtin_call(">r")?;
        self.push_marker(MARK_FOR, head);
        Ok(())
    }

    /// next ( -- ) decrement and loop while the count stays nonnegative.
    pub(crate) fn f_next(&mut self) -> Result<()> {
        self.compile_only("next")?;
        let head = self.pop_marker(MARK_FOR, "next")?;
        self.compile_builtin_call("r>")?;
        self.compile_literal(1)?;
        self.compile_builtin_call("-")?;
        self.compile_builtin_call("dup")?;
        self.compile_builtin_call("0<")?;
        self.back_branch(BRANCH0, head)?;
        self.compile_builtin_call("drop")
    }

    /// case ( -- ) open a case construct.
    pub(crate) fn f_case(&mut self) -> Result<()> {
        self.compile_only("case")?;
        let here = self.here()?;
        self.push_marker(MARK_CASE, here);
        Ok(())
    }

    /// of ( -- ) compare against the case value, skip on mismatch,
    /// consume the value on a match.
    pub(crate) fn f_of(&mut self) -> Result<()> {
        self.compile_only("of")?;
        self.compile_builtin_call("over")?;
        self.compile_builtin_call("=")?;
        self.comma(BRANCH0)?;
        let slot = self.hole()?;
        self.compile_builtin_call("drop")?;
        self.push_marker(MARK_OF, slot);
        Ok(())
    }

    /// endof ( -- ) jump to the end of the case construct.
    pub(crate) fn f_endof(&mut self) -> Result<()> {
        self.compile_only("endof")?;
        self.comma(BRANCH)?;
        let slot = self.hole()?;
        self.push_marker(MARK_OF, slot);
        Ok(())
    }

    /// endcase ( -- ) patch every of/endof pair, relying on the CASE
    /// sentinel to know where to stop. The fallthrough path nips the
    /// case value from under the default result; matched clauses jump
    /// past the nip.
    pub(crate) fn f_endcase(&mut self) -> Result<()> {
        self.compile_only("endcase")?;
        self.compile_builtin_call("nip")?;
        let end = self.here()?;
        loop {
            match self.control.pop() {
                Some((MARK_CASE, _)) => return Ok(()),
                Some((MARK_OF, branch_slot)) => {
                    let branch0_slot = match self.control.pop() {
                        Some((MARK_OF, slot)) => slot,
                        _ => return Err(error!(StateError; "endcase marker mismatch")),
                    };
                    // endof's exit jumps past the nip; of's miss lands on
                    // the next clause, just after the exit's offset cell.
                    self.store
                        .store(branch_slot, end as Cell - branch_slot as Cell)?;
                    self.store.store(
                        branch0_slot,
                        (branch_slot + 1) as Cell - branch0_slot as Cell,
                    )?;
                }
                _ => return Err(error!(StateError; "endcase without case")),
            }
        }
    }

    /// >c ( a tag -- ) push a marker onto the control stack.
    pub(crate) fn f_to_c(&mut self) -> Result<()> {
        let tag = self.store.pop()?;
        let addr = self.store.pop()?;
        if !(MARK_BEGIN..=MARK_OF).contains(&tag) {
            return Err(error!(StateError; "unknown control tag {}", tag));
        }
        self.push_marker(tag, addr as Address);
        Ok(())
    }

    /// c> ( -- a ) pop a marker and push its address.
    pub(crate) fn f_from_c(&mut self) -> Result<()> {
        match self.control.pop() {
            Some((_, addr)) => self.store.push(addr as Cell),
            None => Err(error!(StateError; "control stack underflow")),
        }
    }
}
