//! # fifth
//!
//! An indirect-threaded Forth system.
//! ```text
//! $ fifth
//! [ ]  ok
//! ```
//!
//! The whole language runtime lives in one linear cell array: dictionary,
//! stacks and compiled code alike. The [`mach`] module is the machine
//! itself (cell store, incremental compiler, and the inner and outer
//! interpreters); [`lang`] holds the error taxonomy and number conversion.
//!
//! The interactive shell drives the machine through [`mach::Event`]s, so
//! embedding it elsewhere (or in a test) is a matter of feeding lines to
//! [`mach::Machine::enter`] and draining the events from
//! [`mach::Machine::execute`].

#[macro_use]
pub mod lang;
pub mod mach;
