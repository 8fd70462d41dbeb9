#![allow(dead_code)]

use basic::lang::split_line_number;
use basic::mach::{Halt, QueueInput, Runtime, Screen};
use std::cell::RefCell;
use std::rc::Rc;

struct Capture(Rc<RefCell<String>>);

impl Screen for Capture {
    fn put_char(&mut self, ch: u8) {
        self.0.borrow_mut().push(ch as char);
    }
}

/// A runtime wired to a capturing screen and a scripted input queue.
pub struct Bed {
    pub runtime: Runtime,
    out: Rc<RefCell<String>>,
}

impl Bed {
    pub fn new() -> Bed {
        Bed::with_input(&[])
    }

    pub fn with_input(lines: &[&str]) -> Bed {
        let out = Rc::new(RefCell::new(String::new()));
        let runtime = Runtime::new(
            Box::new(Capture(out.clone())),
            Box::new(QueueInput::new(lines.iter().copied())),
        );
        Bed { runtime, out }
    }

    /// Store one numbered program line, `"10 PRINT X"` style.
    pub fn enter(&mut self, line: &str) {
        match split_line_number(line) {
            (Some(number), rest) => self.runtime.store_line(number, rest),
            (None, _) => panic!("test line needs a line number: {}", line),
        }
    }

    pub fn run(&mut self) -> Halt {
        self.runtime.run()
    }

    pub fn output(&self) -> String {
        self.out.borrow().clone()
    }

    /// Take the captured output, leaving the buffer empty.
    pub fn drain(&mut self) -> String {
        self.out.borrow_mut().split_off(0)
    }
}

pub fn error_text(halt: Halt) -> String {
    match halt {
        Halt::Error(error) => error.to_string(),
        halt => panic!("expected an error, got {:?}", halt),
    }
}

/// Run a one-line program and return what it printed.
pub fn printed(statement: &str) -> String {
    let mut bed = Bed::new();
    bed.enter(&format!("10 {}", statement));
    match bed.run() {
        Halt::Ended => {}
        halt => panic!("program failed: {:?}", halt),
    }
    bed.output()
}
