use super::{Address, Cell, Machine, DATA_SIZE, FALSE, TRUE};
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

fn flag(b: bool) -> Cell {
    if b {
        TRUE
    } else {
        FALSE
    }
}

/// The plain computational primitives: arithmetic, comparison, bitwise,
/// stack shuffling, return-stack access and raw memory.
impl Machine {
    fn binary(&mut self, f: impl Fn(Cell, Cell) -> Cell) -> Result<()> {
        let b = self.store.pop()?;
        let a = self.store.pop()?;
        self.store.push(f(a, b))
    }

    fn unary(&mut self, f: impl Fn(Cell) -> Cell) -> Result<()> {
        let a = self.store.pop()?;
        self.store.push(f(a))
    }

    pub(crate) fn f_plus(&mut self) -> Result<()> {
        self.binary(|a, b| a.wrapping_add(b))
    }

    pub(crate) fn f_minus(&mut self) -> Result<()> {
        self.binary(|a, b| a.wrapping_sub(b))
    }

    pub(crate) fn f_times(&mut self) -> Result<()> {
        self.binary(|a, b| a.wrapping_mul(b))
    }

    pub(crate) fn f_divide(&mut self) -> Result<()> {
        let b = self.store.pop()?;
        let a = self.store.pop()?;
        if b == 0 {
            return Err(error!(ArithmeticError));
        }
        self.store.push(a.wrapping_div(b))
    }

    pub(crate) fn f_mod(&mut self) -> Result<()> {
        let b = self.store.pop()?;
        let a = self.store.pop()?;
        if b == 0 {
            return Err(error!(ArithmeticError));
        }
        self.store.push(a.wrapping_rem(b))
    }

    /// /mod ( a b -- rem quot )
    pub(crate) fn f_slash_mod(&mut self) -> Result<()> {
        let b = self.store.pop()?;
        let a = self.store.pop()?;
        if b == 0 {
            return Err(error!(ArithmeticError));
        }
        self.store.push(a.wrapping_rem(b))?;
        self.store.push(a.wrapping_div(b))
    }

    pub(crate) fn f_negate(&mut self) -> Result<()> {
        self.unary(|a| a.wrapping_neg())
    }

    pub(crate) fn f_abs(&mut self) -> Result<()> {
        self.unary(|a| a.wrapping_abs())
    }

    pub(crate) fn f_min(&mut self) -> Result<()> {
        self.binary(|a, b| a.min(b))
    }

    pub(crate) fn f_max(&mut self) -> Result<()> {
        self.binary(|a, b| a.max(b))
    }

    pub(crate) fn f_one_plus(&mut self) -> Result<()> {
        self.unary(|a| a.wrapping_add(1))
    }

    pub(crate) fn f_one_minus(&mut self) -> Result<()> {
        self.unary(|a| a.wrapping_sub(1))
    }

    pub(crate) fn f_equal(&mut self) -> Result<()> {
        self.binary(|a, b| flag(a == b))
    }

    pub(crate) fn f_not_equal(&mut self) -> Result<()> {
        self.binary(|a, b| flag(a != b))
    }

    pub(crate) fn f_less(&mut self) -> Result<()> {
        self.binary(|a, b| flag(a < b))
    }

    pub(crate) fn f_greater(&mut self) -> Result<()> {
        self.binary(|a, b| flag(a > b))
    }

    pub(crate) fn f_0equal(&mut self) -> Result<()> {
        self.unary(|a| flag(a == 0))
    }

    pub(crate) fn f_0less(&mut self) -> Result<()> {
        self.unary(|a| flag(a < 0))
    }

    pub(crate) fn f_0greater(&mut self) -> Result<()> {
        self.unary(|a| flag(a > 0))
    }

    pub(crate) fn f_0not_equal(&mut self) -> Result<()> {
        self.unary(|a| flag(a != 0))
    }

    pub(crate) fn f_and(&mut self) -> Result<()> {
        self.binary(|a, b| a & b)
    }

    pub(crate) fn f_or(&mut self) -> Result<()> {
        self.binary(|a, b| a | b)
    }

    pub(crate) fn f_xor(&mut self) -> Result<()> {
        self.binary(|a, b| a ^ b)
    }

    pub(crate) fn f_invert(&mut self) -> Result<()> {
        self.unary(|a| !a)
    }

    /// lshift ( v n -- v<<n )
    pub(crate) fn f_lshift(&mut self) -> Result<()> {
        self.binary(|a, n| {
            if (0..64).contains(&n) {
                ((a as u64) << n) as Cell
            } else {
                0
            }
        })
    }

    /// rshift ( v n -- v>>n ) logical shift.
    pub(crate) fn f_rshift(&mut self) -> Result<()> {
        self.binary(|a, n| {
            if (0..64).contains(&n) {
                ((a as u64) >> n) as Cell
            } else {
                0
            }
        })
    }

    pub(crate) fn f_true(&mut self) -> Result<()> {
        self.store.push(TRUE)
    }

    pub(crate) fn f_false(&mut self) -> Result<()> {
        self.store.push(FALSE)
    }

    // Stack shuffling.

    pub(crate) fn f_dup(&mut self) -> Result<()> {
        let top = self.store.top()?;
        self.store.push(top)
    }

    pub(crate) fn f_drop(&mut self) -> Result<()> {
        self.store.pop()?;
        Ok(())
    }

    pub(crate) fn f_swap(&mut self) -> Result<()> {
        let b = self.store.pop()?;
        let a = self.store.pop()?;
        self.store.push(b)?;
        self.store.push(a)
    }

    pub(crate) fn f_over(&mut self) -> Result<()> {
        let second = self.store.peek(1)?;
        self.store.push(second)
    }

    pub(crate) fn f_rot(&mut self) -> Result<()> {
        self.store.roll(2)
    }

    /// -rot ( a b c -- c a b )
    pub(crate) fn f_minus_rot(&mut self) -> Result<()> {
        self.store.roll(2)?;
        self.store.roll(2)
    }

    /// nip ( a b -- b )
    pub(crate) fn f_nip(&mut self) -> Result<()> {
        let b = self.store.pop()?;
        self.store.pop()?;
        self.store.push(b)
    }

    /// tuck ( a b -- b a b )
    pub(crate) fn f_tuck(&mut self) -> Result<()> {
        let b = self.store.pop()?;
        let a = self.store.pop()?;
        self.store.push(b)?;
        self.store.push(a)?;
        self.store.push(b)
    }

    /// ?dup ( n -- n n | 0 )
    pub(crate) fn f_q_dup(&mut self) -> Result<()> {
        let top = self.store.top()?;
        if top != 0 {
            self.store.push(top)?;
        }
        Ok(())
    }

    /// pick ( .. n -- .. v ) 0-indexed from the top.
    pub(crate) fn f_pick(&mut self) -> Result<()> {
        let n = self.store.pop()?;
        if n < 0 {
            return Err(error!(StackError));
        }
        let value = self.store.peek(n as usize)?;
        self.store.push(value)
    }

    /// roll ( .. n -- .. v ) 0-indexed from the top.
    pub(crate) fn f_roll(&mut self) -> Result<()> {
        let n = self.store.pop()?;
        if n < 0 {
            return Err(error!(StackError));
        }
        self.store.roll(n as usize)
    }

    pub(crate) fn f_depth(&mut self) -> Result<()> {
        let depth = self.store.depth();
        self.store.push(depth as Cell)
    }

    /// clear ( ... -- ) empty the data stack.
    pub(crate) fn f_clear(&mut self) -> Result<()> {
        while self.store.depth() > 0 {
            self.store.pop()?;
        }
        Ok(())
    }

    // Return stack.

    pub(crate) fn f_to_r(&mut self) -> Result<()> {
        let value = self.store.pop()?;
        self.store.rpush(value)
    }

    pub(crate) fn f_r_from(&mut self) -> Result<()> {
        let value = self.store.rpop()?;
        self.store.push(value)
    }

    pub(crate) fn f_r_fetch(&mut self) -> Result<()> {
        let value = self.store.rpeek(0)?;
        self.store.push(value)
    }

    pub(crate) fn f_r_drop(&mut self) -> Result<()> {
        self.store.rpop()?;
        Ok(())
    }

    /// i ( -- n ) the innermost for/next count.
    pub(crate) fn f_i(&mut self) -> Result<()> {
        let value = self.store.rpeek(0)?;
        self.store.push(value)
    }

    /// j ( -- n ) the next enclosing count.
    pub(crate) fn f_j(&mut self) -> Result<()> {
        let value = self.store.rpeek(1)?;
        self.store.push(value)
    }

    // Memory.

    /// @ ( a -- v )
    pub(crate) fn f_fetch(&mut self) -> Result<()> {
        let addr = self.store.pop()?;
        if addr < 0 {
            return Err(error!(RangeError; "cell {}", addr));
        }
        let value = self.store.fetch(addr as Address)?;
        self.store.push(value)
    }

    /// ! ( v a -- )
    pub(crate) fn f_store(&mut self) -> Result<()> {
        let addr = self.store.pop()?;
        let value = self.store.pop()?;
        if addr < 0 {
            return Err(error!(RangeError; "cell {}", addr));
        }
        self.store.store(addr as Address, value)
    }

    /// +! ( n a -- )
    pub(crate) fn f_plus_store(&mut self) -> Result<()> {
        let addr = self.store.pop()?;
        let delta = self.store.pop()?;
        if addr < 0 {
            return Err(error!(RangeError; "cell {}", addr));
        }
        let value = self.store.fetch(addr as Address)?;
        self.store.store(addr as Address, value.wrapping_add(delta))
    }

    /// c@ ( s -- c )
    pub(crate) fn f_c_fetch(&mut self) -> Result<()> {
        let addr = self.store.pop()?;
        if addr < 0 {
            return Err(error!(RangeError; "byte {}", addr));
        }
        let byte = self.store.byte_fetch(addr as Address)?;
        self.store.push(byte as Cell)
    }

    /// c! ( c s -- )
    pub(crate) fn f_c_store(&mut self) -> Result<()> {
        let addr = self.store.pop()?;
        let value = self.store.pop()?;
        if addr < 0 {
            return Err(error!(RangeError; "byte {}", addr));
        }
        self.store.byte_store(addr as Address, value as u8)
    }

    /// , ( v -- ) append a cell to the dictionary.
    pub(crate) fn f_comma(&mut self) -> Result<()> {
        let value = self.store.pop()?;
        self.comma(value)
    }

    // String store helpers.

    /// s-create ( s1 -- s2 ) copy a counted string to free string space.
    pub(crate) fn f_s_create(&mut self) -> Result<()> {
        let source = self.store.pop()? as Address;
        let text = self.store.string_get(source)?;
        let addr = self.string_create(&text)?;
        self.store.push(addr as Cell)
    }

    /// s-copy ( src dest -- )
    pub(crate) fn f_s_copy(&mut self) -> Result<()> {
        let dest = self.store.pop()? as Address;
        let source = self.store.pop()? as Address;
        self.store.string_copy(source, dest)
    }

    // Meta.

    /// execute ( cfa -- )
    pub(crate) fn f_execute(&mut self) -> Result<()> {
        let cfa = self.store.pop()?;
        if cfa <= 0 || cfa as usize >= DATA_SIZE {
            return Err(error!(TypeError; "execute {}", cfa));
        }
        self.enter_word(cfa as Address)
    }

    /// abort ( -- ) unwind to the outer interpreter.
    pub(crate) fn f_abort(&mut self) -> Result<()> {
        Err(error!(UserAbort))
    }

    /// bye ( -- ) leave the system.
    pub(crate) fn f_bye(&mut self) -> Result<()> {
        self.exit = true;
        Ok(())
    }
}
