mod common;
use common::*;
use fifth::mach::Machine;

#[test]
fn test_if_then() {
    let mut m = Machine::default();
    exec(&mut m, ": pos? 0> if 1 else 0 then ;");
    assert_eq!(exec(&mut m, "5 pos? . -5 pos? . 0 pos? ."), "1 0 0 ");
}

#[test]
fn test_if_without_else() {
    let mut m = Machine::default();
    exec(&mut m, ": clip dup 0< if drop 0 then ;");
    assert_eq!(exec(&mut m, "7 clip . -7 clip ."), "7 0 ");
}

#[test]
fn test_nested_if() {
    let mut m = Machine::default();
    exec(
        &mut m,
        ": sign dup 0< if drop -1 else 0> if 1 else 0 then then ;",
    );
    assert_eq!(exec(&mut m, "-9 sign . 9 sign . 0 sign ."), "-1 1 0 ");
}

#[test]
fn test_begin_until() {
    let mut m = Machine::default();
    exec(&mut m, ": cnt 0 begin 1+ dup 3 = until ;");
    assert_eq!(exec(&mut m, "cnt ."), "3 ");
}

#[test]
fn test_begin_while_repeat() {
    let mut m = Machine::default();
    exec(&mut m, ": down begin dup 0> while dup . 1- repeat drop ;");
    assert_eq!(exec(&mut m, "5 down"), "5 4 3 2 1 ");
    assert_eq!(m.stack_depth(), 0);
}

#[test]
fn test_begin_again_exits_by_abort() {
    let mut m = Machine::default();
    exec(&mut m, ": spin begin 1+ dup 100 = if abort then again ;");
    let out = exec(&mut m, "0 spin");
    assert!(out.contains("aborted"), "got: {}", out);
    assert_eq!(m.stack_depth(), 0);
}

#[test]
fn test_for_next_counts_down_to_zero() {
    let mut m = Machine::default();
    exec(&mut m, ": show for i . next ;");
    assert_eq!(exec(&mut m, "4 show"), "4 3 2 1 0 ");
    assert_eq!(m.return_depth(), 0);
}

#[test]
fn test_nested_for_next() {
    let mut m = Machine::default();
    exec(&mut m, ": pairs for i . 1 for j . next next ;");
    // inner loop runs twice per outer pass, j sees the outer count
    assert_eq!(exec(&mut m, "1 pairs"), "1 1 1 0 0 0 ");
}

#[test]
fn test_case_selects_and_defaults() {
    let mut m = Machine::default();
    exec(&mut m, ": f case 1 of 10 endof 2 of 20 endof 99 endcase ;");
    assert_eq!(exec(&mut m, "1 f . 2 f . 3 f ."), "10 20 99 ");
    assert_eq!(m.stack_depth(), 0);
}

#[test]
fn test_control_words_are_compile_only() {
    let mut m = Machine::default();
    let out = exec(&mut m, "1 if 2 then");
    assert!(out.contains("compile-only"), "got: {}", out);
}

#[test]
fn test_unbalanced_control_is_an_error() {
    let mut m = Machine::default();
    let out = exec(&mut m, ": broken begin 1+ ;");
    assert!(out.contains("control"), "got: {}", out);
    assert!(!m.compiling());
    // the open definition was discarded
    let out = exec(&mut m, "broken");
    assert!(out.contains("not found"), "got: {}", out);
}

#[test]
fn test_repeat_without_begin_is_an_error() {
    let mut m = Machine::default();
    let out = exec(&mut m, ": broken repeat ;");
    assert!(out.contains("repeat"), "got: {}", out);
}
