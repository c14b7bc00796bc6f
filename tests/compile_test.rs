mod common;
use common::*;
use fifth::mach::{Machine, BRANCH, BRANCH0, BREAK, DEFINITION, LITERAL};

/// Collect the threaded cells of a definition, from the code field up to
/// and including the closing BREAK.
fn body_cells(m: &mut Machine, name: &str) -> (usize, Vec<i64>) {
    let cfa = m.lookup(name).expect("word not defined");
    assert_eq!(m.cell(cfa), DEFINITION);
    let mut cells = Vec::new();
    let mut addr = cfa + 1;
    loop {
        let cell = m.cell(addr);
        cells.push(cell);
        if cell == BREAK {
            break;
        }
        // skip operand cells so opcodes are not miscounted
        if cell == LITERAL || cell == BRANCH || cell == BRANCH0 {
            addr += 1;
            cells.push(m.cell(addr));
        }
        addr += 1;
        assert!(cells.len() < 200, "runaway definition");
    }
    (cfa, cells)
}

#[test]
fn test_literal_cells() {
    let mut m = Machine::default();
    exec(&mut m, ": five 5 ;");
    let (_, cells) = body_cells(&mut m, "five");
    assert_eq!(cells, vec![LITERAL, 5, BREAK]);
}

#[test]
fn test_if_else_then_emits_one_branch_pair() {
    let mut m = Machine::default();
    exec(&mut m, ": t if 1 else 2 then ;");
    let (cfa, cells) = body_cells(&mut m, "t");
    let branch0s = cells.iter().filter(|c| **c == BRANCH0).count();
    let branches = cells.iter().filter(|c| **c == BRANCH).count();
    assert_eq!(branch0s, 1);
    assert_eq!(branches, 1);

    // offsets are relative to their own cell and land on the labelled
    // targets: the false branch at the else clause, the exit at BREAK
    let body = cfa + 1;
    assert_eq!(m.cell(body), BRANCH0);
    let false_target = (body + 1) as i64 + m.cell(body + 1);
    assert_eq!(m.cell(false_target as usize), LITERAL);
    assert_eq!(m.cell(false_target as usize + 1), 2);
    let exit_slot = body + 4; // BRANCH0 off LITERAL 1 BRANCH off
    assert_eq!(m.cell(exit_slot), BRANCH);
    let exit_target = (exit_slot + 1) as i64 + m.cell(exit_slot + 1);
    assert_eq!(m.cell(exit_target as usize), BREAK);
}

#[test]
fn test_begin_while_repeat_emits_one_branch_pair() {
    let mut m = Machine::default();
    exec(&mut m, ": t begin dup while 1- repeat ;");
    let (cfa, cells) = body_cells(&mut m, "t");
    let branch0s = cells.iter().filter(|c| **c == BRANCH0).count();
    let branches = cells.iter().filter(|c| **c == BRANCH).count();
    assert_eq!(branch0s, 1);
    assert_eq!(branches, 1);

    // the backward offset returns exactly to the loop head
    let head = cfa + 1;
    let mut addr = head;
    while m.cell(addr) != BRANCH {
        addr += 1;
    }
    let back_target = (addr + 1) as i64 + m.cell(addr + 1);
    assert_eq!(back_target as usize, head);
    // and the while hole lands just past the backward branch
    let mut b0 = head;
    while m.cell(b0) != BRANCH0 {
        b0 += 1;
    }
    let exit_target = (b0 + 1) as i64 + m.cell(b0 + 1);
    assert_eq!(exit_target as usize, addr + 2);
}

#[test]
fn test_until_branches_back() {
    let mut m = Machine::default();
    exec(&mut m, ": t begin 1- dup 0= until ;");
    let (cfa, _) = body_cells(&mut m, "t");
    let head = cfa + 1;
    let mut addr = head;
    while m.cell(addr) != BRANCH0 {
        addr += 1;
    }
    let target = (addr + 1) as i64 + m.cell(addr + 1);
    assert_eq!(target as usize, head);
}

#[test]
fn test_builtin_references_carry_the_flag() {
    let mut m = Machine::default();
    exec(&mut m, ": t dup ;");
    let (cfa, _) = body_cells(&mut m, "t");
    let dup_cell = m.cell(cfa + 1) as u64;
    assert!(dup_cell & fifth::mach::BUILTIN_FLAG != 0);
}

#[test]
fn test_calls_compile_as_plain_addresses() {
    let mut m = Machine::default();
    exec(&mut m, ": inner 1 ; : outer inner ;");
    let inner_cfa = m.lookup("inner").unwrap();
    let outer_cfa = m.lookup("outer").unwrap();
    assert_eq!(m.cell(outer_cfa + 1), inner_cfa as i64);
}

#[test]
fn test_state_variable_tracks_compilation() {
    let mut m = Machine::default();
    let state = m.lookup("state").unwrap() + 1;
    exec(&mut m, ": open 1");
    assert_eq!(m.cell(state), -1);
    exec(&mut m, ";");
    assert_eq!(m.cell(state), 0);
}
