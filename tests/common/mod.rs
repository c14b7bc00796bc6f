use fifth::mach::{Event, Machine};

/// Feed one line to the machine and collect everything it prints.
/// Errors are rendered the way the terminal shell renders them.
pub fn exec(machine: &mut Machine, line: &str) -> String {
    machine.enter(line);
    let mut out = String::new();
    let mut prev_running = false;
    loop {
        let event = machine.execute(5000);
        match &event {
            Event::Stopped => break,
            Event::Bye => break,
            Event::Print(text) => out.push_str(text),
            Event::Errors(errors) => {
                for error in errors.iter() {
                    out.push_str(&format!("?{}\n", error));
                }
            }
            Event::Running => {
                if prev_running {
                    out.push_str("\nExecution cycles exceeded.\n");
                    break;
                }
            }
        }
        match event {
            Event::Running => prev_running = true,
            _ => prev_running = false,
        }
    }
    out
}
