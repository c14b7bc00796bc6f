/*!
## Rust Machine Module

This Rust module is the virtual machine for an indirect-threaded Forth:
a cell-addressed linear store, an incremental compiler/dictionary, and
the inner and outer interpreters.

*/

pub type Address = usize;
pub type Cell = i64;

// Store geometry. The dictionary grows up from cell 0, the data stack
// grows up from the middle, and the return stack grows down from the top.
pub const DATA_SIZE: usize = 16384;
pub const STRING_SIZE: usize = 16384;
pub const BUF_SIZE: usize = 132;
pub const WORD_START: usize = 0;
pub const STACK_START: usize = DATA_SIZE / 2;
pub const RET_START: usize = DATA_SIZE - 1;

// String store regions: the three text buffers, then free string space.
pub const TIB_START: usize = 0;
pub const PAD_START: usize = TIB_START + BUF_SIZE;
pub const TMP_START: usize = PAD_START + BUF_SIZE;
pub const STR_START: usize = TMP_START + BUF_SIZE;

// Inner-interpreter opcodes, baked into code fields and parameter cells.
pub const VARIABLE: Cell = 100001;
pub const CONSTANT: Cell = 100002;
pub const LITERAL: Cell = 100003;
pub const STRLIT: Cell = 100004;
pub const DEFINITION: Cell = 100005;
pub const BRANCH: Cell = 100006;
pub const BRANCH0: Cell = 100007;
pub const ABORT: Cell = 100008;
pub const EXIT: Cell = 100009;
pub const BREAK: Cell = 100010;
pub const EXEC: Cell = 100011;
pub const ARRAY: Cell = 100012;

// Compile-time control markers, seen only on the control stack.
pub const MARK_BEGIN: Cell = 200000;
pub const MARK_WHILE: Cell = 200001;
pub const MARK_FOR: Cell = 200002;
pub const MARK_CASE: Cell = 200003;
pub const MARK_OF: Cell = 200004;

pub const TRUE: Cell = -1;
pub const FALSE: Cell = 0;

// Name-field flag bits and the payload mask that strips them.
pub const IMMEDIATE_FLAG: u64 = 0x4000_0000_0000_0000;
pub const BUILTIN_FLAG: u64 = 0x2000_0000_0000_0000;
pub const ADDRESS_MASK: u64 = 0x00FF_FFFF_FFFF_FFFF;

mod builtins;
mod control;
mod debug;
mod dictionary;
mod files;
mod inner;
mod io;
mod outer;
mod runtime;
mod store;
mod words;

pub use builtins::Builtin;
pub use io::Source;
pub use runtime::Event;
pub use runtime::Machine;
pub use store::Store;
