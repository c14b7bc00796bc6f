mod common;
use common::*;
use fifth::mach::{Event, Machine};
use std::io::Write;

#[test]
fn test_eval_interprets_the_rest_of_the_line() {
    let mut m = Machine::default();
    exec(&mut m, "1 eval 2 +");
    assert_eq!(m.stack(), vec![3]);
}

#[test]
fn test_query_requests_a_line() {
    let mut m = Machine::default();
    m.enter("query");
    // the machine asks for input rather than finishing the line
    loop {
        match m.execute(5000) {
            Event::Stopped => break,
            Event::Bye => panic!("unexpected exit"),
            _ => {}
        }
    }
    assert_eq!(exec(&mut m, "11 22 +"), "");
    assert_eq!(m.stack(), vec![33]);
}

#[test]
fn test_accept_stores_a_counted_string() {
    let mut m = Machine::default();
    m.enter("tmp @ 20 accept");
    loop {
        match m.execute(5000) {
            Event::Stopped => break,
            Event::Bye => panic!("unexpected exit"),
            _ => {}
        }
    }
    assert_eq!(exec(&mut m, "hello forth"), "");
    // accept leaves the buffer address and the stored length
    exec(&mut m, ". drop");
    assert_eq!(exec(&mut m, "tmp @ type"), "hello forth");
}

#[test]
fn test_include_file_loads_source() {
    let dir = std::env::temp_dir().join("fifth-include-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("defs.fs");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "\\ test definitions").unwrap();
    writeln!(file, ": from-file 40 2 + ;").unwrap();
    writeln!(file, "from-file").unwrap();
    drop(file);

    let mut m = Machine::default();
    let line = format!("s\" {}\" include-file drop", path.display());
    exec(&mut m, &line);
    // the top-level code in the file ran
    assert_eq!(m.stack(), vec![42]);
    // and its definitions persist
    assert_eq!(exec(&mut m, "from-file ."), "42 ");
}

#[test]
fn test_include_file_missing_pushes_false() {
    let mut m = Machine::default();
    exec(&mut m, "s\" /no/such/file.fs\" include-file");
    assert_eq!(m.stack(), vec![0]);
}

#[test]
fn test_include_resumes_the_calling_line() {
    let dir = std::env::temp_dir().join("fifth-include-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("push9.fs");
    std::fs::write(&path, "9\n").unwrap();

    let mut m = Machine::default();
    // tokens after include run once the file is exhausted
    exec(&mut m, &format!("include {} 1 +", path.display()));
    assert_eq!(m.stack(), vec![10]);
}

#[test]
fn test_nested_includes() {
    let dir = std::env::temp_dir().join("fifth-include-test");
    std::fs::create_dir_all(&dir).unwrap();
    let inner = dir.join("inner.fs");
    std::fs::write(&inner, "2\n").unwrap();
    let outer = dir.join("outer.fs");
    std::fs::write(&outer, format!("1\ninclude {}\n3\n", inner.display())).unwrap();

    let mut m = Machine::default();
    exec(&mut m, &format!("include {}", outer.display()));
    assert_eq!(m.stack(), vec![1, 2, 3]);
}

#[test]
fn test_missing_cli_style_include_reports_io_error() {
    let mut m = Machine::default();
    let out = exec(&mut m, "include /no/such/file.fs");
    assert!(out.contains("i/o error"), "got: {}", out);
}
