mod common;
use common::*;
use fifth::mach::Machine;

#[test]
fn test_interpreted_string_literal() {
    let mut m = Machine::default();
    assert_eq!(exec(&mut m, "s\" hello\" type"), "hello");
}

#[test]
fn test_compiled_string_literal() {
    let mut m = Machine::default();
    exec(&mut m, ": greet s\" hi there\" type ;");
    assert_eq!(exec(&mut m, "greet greet"), "hi therehi there");
}

#[test]
fn test_dot_quote() {
    let mut m = Machine::default();
    exec(&mut m, ": hail .\" hail!\" ;");
    assert_eq!(exec(&mut m, "hail"), "hail!");
    // interpreted form prints immediately
    assert_eq!(exec(&mut m, ".\" now\""), "now");
}

#[test]
fn test_string_bytes() {
    let mut m = Machine::default();
    // the count byte leads, content follows
    assert_eq!(exec(&mut m, "s\" abc\" dup c@ . 1+ c@ ."), "3 97 ");
}

#[test]
fn test_c_store() {
    let mut m = Machine::default();
    exec(&mut m, "s\" abc\"");
    assert_eq!(exec(&mut m, "dup 66 swap 2 + c! type"), "aBc");
}

#[test]
fn test_s_create_survives_tmp_reuse() {
    let mut m = Machine::default();
    exec(&mut m, "s\" first\" s-create");
    exec(&mut m, "s\" second\"");
    // the s-created copy is unaffected by the new TMP staging
    assert_eq!(exec(&mut m, "swap type type"), "firstsecond");
}

#[test]
fn test_unterminated_string_is_a_parse_error() {
    let mut m = Machine::default();
    let out = exec(&mut m, "s\" runs off the end");
    assert!(out.contains("parse error"), "got: {}", out);
}

#[test]
fn test_comments() {
    let mut m = Machine::default();
    assert_eq!(exec(&mut m, "1 \\ 2 3 4"), "");
    assert_eq!(m.stack(), vec![1]);
    assert_eq!(exec(&mut m, "clear 1 ( 2 3 ) 4"), "");
    assert_eq!(m.stack(), vec![1, 4]);
    // comments work while compiling
    exec(&mut m, "clear : c ( n -- n+1 ) 1+ ; \\ trailing note");
    assert_eq!(exec(&mut m, "8 c ."), "9 ");
}

#[test]
fn test_emit_words() {
    let mut m = Machine::default();
    assert_eq!(exec(&mut m, "65 emit 66 (emit)"), "AB");
    assert_eq!(exec(&mut m, "cr space"), "\n ");
}

#[test]
fn test_type_via_tick() {
    let mut m = Machine::default();
    exec(&mut m, ": msg s\" xyz\" ;");
    assert_eq!(exec(&mut m, "msg type"), "xyz");
}
