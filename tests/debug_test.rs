mod common;
use common::*;
use fifth::mach::Machine;

#[test]
fn test_words_lists_the_dictionary() {
    let mut m = Machine::default();
    exec(&mut m, ": zephyr 1 ;");
    let out = exec(&mut m, "words");
    // most recent first, builtins afterward
    assert!(out.starts_with("zephyr "), "got: {}", out);
    assert!(out.contains("dup"));
    assert!(out.contains("include-file"));
}

#[test]
fn test_dump_annotates_cells() {
    let mut m = Machine::default();
    exec(&mut m, ": t 5 dup * ;");
    let cfa = m.lookup("t").unwrap();
    let out = exec(&mut m, &format!("{} 6 dump", cfa));
    assert!(out.contains("DEFINITION"), "got: {}", out);
    assert!(out.contains("LITERAL 5"), "got: {}", out);
    assert!(out.contains("dup"), "got: {}", out);
}

#[test]
fn test_dump_names_calls() {
    let mut m = Machine::default();
    exec(&mut m, ": inner 1 ; : outer inner ;");
    let cfa = m.lookup("outer").unwrap();
    let out = exec(&mut m, &format!("{} 3 dump", cfa));
    assert!(out.contains("->inner"), "got: {}", out);
}

#[test]
fn test_builtin_name_word() {
    let mut m = Machine::default();
    // builtin 0 is + by registration order
    assert_eq!(exec(&mut m, "0 builtin-name type"), "+");
}

#[test]
fn test_prompt_shows_the_stack() {
    let mut m = Machine::default();
    exec(&mut m, "1 2");
    assert_eq!(m.prompt(), "[ 1 2 ]  ok ");
    exec(&mut m, "hide-stack");
    assert_eq!(m.prompt(), " ok ");
    exec(&mut m, "show-stack clear");
    assert_eq!(m.prompt(), "[ ]  ok ");
}

#[test]
fn test_debuglevel_word() {
    let mut m = Machine::default();
    let out = exec(&mut m, "2 dbg debuglevel");
    assert!(out.contains("debuglevel is 2"), "got: {}", out);
}

#[test]
fn test_clean_line_invariants() {
    let mut m = Machine::default();
    exec(&mut m, ": noise 1 2 3 drop drop drop ; noise noise");
    assert!(!m.compiling());
    assert_eq!(m.stack_depth(), 0);
    assert_eq!(m.return_depth(), 0);
}

#[test]
fn test_timer_words_exist() {
    let mut m = Machine::default();
    exec(&mut m, "now millis micros");
    assert_eq!(m.stack_depth(), 2);
    let stack = m.stack();
    assert!(stack[0] >= 0 && stack[1] >= 0);
}
