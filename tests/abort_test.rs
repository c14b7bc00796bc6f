mod common;
use common::*;
use fifth::mach::Machine;

#[test]
fn test_unknown_word_aborts_and_recovers() {
    let mut m = Machine::default();
    let out = exec(&mut m, "1 2 frobnicate 3 4");
    assert!(out.contains("not found: frobnicate"), "got: {}", out);
    // the rest of the line is discarded and the stack is empty
    assert_eq!(m.stack_depth(), 0);
    assert_eq!(exec(&mut m, "2 2 + ."), "4 ");
}

#[test]
fn test_abort_quote_prints_and_unwinds() {
    let mut m = Machine::default();
    exec(&mut m, ": guard abort\" out of range\" ;");
    let out = exec(&mut m, "1 2 3 guard");
    assert!(out.contains("out of range"), "got: {}", out);
    assert!(out.contains("aborted"), "got: {}", out);
    assert_eq!(m.stack_depth(), 0);
    assert_eq!(m.return_depth(), 0);
    // the REPL is usable on the next line
    assert_eq!(exec(&mut m, "7 ."), "7 ");
}

#[test]
fn test_abort_from_depth_restores_everything() {
    let mut m = Machine::default();
    exec(&mut m, ": deepest abort ;");
    exec(&mut m, ": deeper deepest ;");
    exec(&mut m, ": deep deeper ;");
    let out = exec(&mut m, "1 2 3 deep 4 5");
    assert!(out.contains("aborted"), "got: {}", out);
    assert_eq!(m.stack_depth(), 0);
    assert_eq!(m.return_depth(), 0);
    assert!(!m.compiling());
}

#[test]
fn test_abort_discards_open_definition() {
    let mut m = Machine::default();
    let out = exec(&mut m, ": broken nonsense-word ;");
    assert!(out.contains("not found"), "got: {}", out);
    assert!(!m.compiling());
    let out = exec(&mut m, "broken");
    assert!(out.contains("not found"), "got: {}", out);
}

#[test]
fn test_interrupt_aborts_cleanly() {
    let mut m = Machine::default();
    exec(&mut m, "1 2 3");
    m.interrupt();
    let out = exec(&mut m, "4 5");
    assert!(out.contains("interrupted"), "got: {}", out);
    assert_eq!(m.stack_depth(), 0);
    assert_eq!(exec(&mut m, "6 ."), "6 ");
}

#[test]
fn test_semicolon_outside_definition() {
    let mut m = Machine::default();
    let out = exec(&mut m, ";");
    assert!(out.contains("outside a definition"), "got: {}", out);
}

#[test]
fn test_range_error_aborts() {
    let mut m = Machine::default();
    let out = exec(&mut m, "999999999 @");
    assert!(out.contains("address out of range"), "got: {}", out);
    assert_eq!(exec(&mut m, "1 ."), "1 ");
}
