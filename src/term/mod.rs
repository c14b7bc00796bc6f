extern crate ansi_term;
extern crate ctrlc;
extern crate linefeed;
use crate::mach::{Event, Machine};
use ansi_term::Style;
use linefeed::{Interface, ReadResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub fn main() {
    let mut args = std::env::args();
    let _executable = args.next();
    let files: Vec<String> = args.collect();
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");
    if let Err(error) = main_loop(interrupted, files) {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}

fn main_loop(interrupted: Arc<AtomicBool>, files: Vec<String>) -> std::io::Result<()> {
    let interface = Interface::new("fifth")?;
    let mut machine = Machine::default();

    // CLI source files load before the prompt appears; the last one
    // queued is read first, so queue them in reverse.
    for file in files.iter().rev() {
        if let Err(error) = machine.include_source(file) {
            eprintln!("{}", Style::new().bold().paint(error.to_string()));
            std::process::exit(1);
        }
    }

    loop {
        if interrupted.load(Ordering::SeqCst) {
            machine.interrupt();
            interrupted.store(false, Ordering::SeqCst);
        };
        match machine.execute(5000) {
            Event::Stopped => {
                interface.set_prompt(&machine.prompt())?;
                let line = match interface.read_line()? {
                    ReadResult::Input(line) => line,
                    ReadResult::Signal(_) | ReadResult::Eof => break,
                };
                if !line.trim().is_empty() {
                    interface.add_history_unique(line.clone());
                }
                machine.enter(&line);
            }
            Event::Running => {}
            Event::Print(text) => {
                interface.write_fmt(format_args!("{}", text))?;
            }
            Event::Errors(errors) => {
                for error in errors.iter() {
                    let error = format!("?{}", error);
                    interface.write_fmt(format_args!("{}\n", Style::new().bold().paint(error)))?;
                }
            }
            Event::Bye => break,
        }
    }
    Ok(())
}
