mod common;
use common::*;
use fifth::mach::Machine;

#[test]
fn test_shuffle_words() {
    let mut m = Machine::default();
    exec(&mut m, "1 2 dup");
    assert_eq!(m.stack(), vec![1, 2, 2]);
    exec(&mut m, "clear 1 2 swap over");
    assert_eq!(m.stack(), vec![2, 1, 2]);
    exec(&mut m, "clear 1 2 3 rot");
    assert_eq!(m.stack(), vec![2, 3, 1]);
    exec(&mut m, "clear 1 2 3 -rot");
    assert_eq!(m.stack(), vec![3, 1, 2]);
    exec(&mut m, "clear 1 2 nip");
    assert_eq!(m.stack(), vec![2]);
    exec(&mut m, "clear 1 2 tuck");
    assert_eq!(m.stack(), vec![2, 1, 2]);
}

#[test]
fn test_conditional_dup() {
    let mut m = Machine::default();
    exec(&mut m, "5 ?dup");
    assert_eq!(m.stack(), vec![5, 5]);
    exec(&mut m, "clear 0 ?dup");
    assert_eq!(m.stack(), vec![0]);
}

#[test]
fn test_pick_and_roll_are_zero_indexed() {
    let mut m = Machine::default();
    exec(&mut m, "10 20 30 0 pick");
    assert_eq!(m.stack(), vec![10, 20, 30, 30]);
    exec(&mut m, "clear 10 20 30 2 pick");
    assert_eq!(m.stack(), vec![10, 20, 30, 10]);
    exec(&mut m, "clear 10 20 30 2 roll");
    assert_eq!(m.stack(), vec![20, 30, 10]);
    exec(&mut m, "clear 10 20 0 roll");
    assert_eq!(m.stack(), vec![10, 20]);
}

#[test]
fn test_depth_and_clear() {
    let mut m = Machine::default();
    assert_eq!(exec(&mut m, "depth ."), "0 ");
    exec(&mut m, "1 2 3");
    assert_eq!(exec(&mut m, "depth ."), "3 ");
    exec(&mut m, "clear");
    assert_eq!(m.stack_depth(), 0);
}

#[test]
fn test_return_stack_words() {
    let mut m = Machine::default();
    assert_eq!(exec(&mut m, "42 >r 1 r@ . r> . ."), "42 42 1 ");
    assert_eq!(m.return_depth(), 0);
    exec(&mut m, "7 >r rdrop");
    assert_eq!(m.return_depth(), 0);
}

#[test]
fn test_underflow_aborts() {
    let mut m = Machine::default();
    let out = exec(&mut m, "drop");
    assert!(out.contains("stack underflow"), "got: {}", out);
    assert_eq!(exec(&mut m, "1 1 + ."), "2 ");
}

#[test]
fn test_stack_display() {
    let mut m = Machine::default();
    exec(&mut m, "1 2 3");
    assert_eq!(exec(&mut m, ".s"), "[ 1 2 3 ] ");
    // .s does not consume
    assert_eq!(m.stack(), vec![1, 2, 3]);
}
