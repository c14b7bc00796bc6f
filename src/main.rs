//! # fifth
//!
//! An indirect-threaded Forth system.
//!

#[macro_use]
mod lang;
mod mach;
mod term;

fn main() {
    term::main();
}
