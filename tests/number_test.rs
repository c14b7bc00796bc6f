mod common;
use common::*;
use fifth::mach::Machine;

#[test]
fn test_decimal_is_the_default() {
    let mut m = Machine::default();
    assert_eq!(exec(&mut m, "42 -17 . ."), "-17 42 ");
}

#[test]
fn test_hex_input_and_output() {
    let mut m = Machine::default();
    exec(&mut m, "16 base !");
    assert_eq!(exec(&mut m, "ff ."), "ff ");
    assert_eq!(exec(&mut m, "FF 1 + ."), "100 ");
}

#[test]
fn test_binary_base() {
    let mut m = Machine::default();
    exec(&mut m, "2 base !");
    assert_eq!(exec(&mut m, "101 11 + ."), "1000 ");
}

#[test]
fn test_printing_round_trips_in_every_base() {
    for base in 2..=36 {
        let mut m = Machine::default();
        exec(&mut m, &format!("{} base !", base));
        // print 12345, read it back, compare in the store
        let out = exec(&mut m, "12345 dup .");
        let token = out.trim();
        let out = exec(&mut m, &format!("{} = .", token));
        // true prints as -1 in every base
        assert_eq!(out.trim(), "-1", "base {}", base);
    }
}

#[test]
fn test_unsigned_print() {
    let mut m = Machine::default();
    assert_eq!(exec(&mut m, "-1 u."), "18446744073709551615 ");
    assert_eq!(exec(&mut m, "16 base ! -1 u."), "ffffffffffffffff ");
}

#[test]
fn test_number_query_word() {
    let mut m = Machine::default();
    // stage "73" in the pad and test it
    assert_eq!(exec(&mut m, "s\" 73\" number? . ."), "-1 73 ");
    let out = exec(&mut m, "s\" 7x3\" number? . drop");
    assert_eq!(out, "0 ");
}

#[test]
fn test_invalid_digits_for_base_are_unknown_words() {
    let mut m = Machine::default();
    exec(&mut m, "8 base !");
    let out = exec(&mut m, "9");
    assert!(out.contains("not found"), "got: {}", out);
}

#[test]
fn test_bad_base_is_a_parse_error() {
    let mut m = Machine::default();
    exec(&mut m, "1 base !");
    let out = exec(&mut m, "5");
    assert!(out.contains("parse error"), "got: {}", out);
    // abort does not repair base; the store is the user's
    exec(&mut m, "clear");
}
