use super::exec::{Exec, Flow};
use super::screen::{LineInput, NullScreen, QueueInput, Screen};
use super::{Program, Var};
use crate::error;
use crate::lang::{Error, LineNumber};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Result<T> = std::result::Result<T, Error>;

const PRINT_ZONE: usize = 14;

/// Which text a cursor position refers to: a stored program line, the
/// immediate-mode buffer, or past the end of the program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Loc {
    Line(LineNumber),
    Direct,
    End,
}

/// An exact resumable position: a line and a byte offset into its
/// text. FOR and GOSUB checkpoints, the interrupt return point, and
/// CONT all reposition through one of these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub line: Loc,
    pub offset: usize,
}

impl Cursor {
    pub const END: Cursor = Cursor {
        line: Loc::End,
        offset: 0,
    };
}

#[derive(Debug, Clone)]
pub(crate) struct ForFrame {
    pub var: String,
    pub end: f64,
    pub step: f64,
    pub resume: Cursor,
}

#[derive(Debug, Clone)]
pub(crate) struct GosubFrame {
    pub resume: Cursor,
    /// Pushed by the interval timer rather than a GOSUB statement.
    pub interrupt: bool,
    /// DATA cursor to put back when an interrupt frame returns.
    pub data_cursor: usize,
}

#[derive(Debug)]
pub(crate) struct Interval {
    pub armed: bool,
    pub enabled: bool,
    pub period: Duration,
    pub line: LineNumber,
    pub deadline: Instant,
    /// Re-entrancy guard: no firing while the handler is active.
    pub in_handler: bool,
}

impl Default for Interval {
    fn default() -> Interval {
        Interval {
            armed: false,
            enabled: false,
            period: Duration::from_secs(0),
            line: 0,
            deadline: Instant::now(),
            in_handler: false,
        }
    }
}

pub(crate) struct Rnd {
    rng: StdRng,
    last: Option<f64>,
}

impl Rnd {
    fn new() -> Rnd {
        Rnd {
            rng: StdRng::from_entropy(),
            last: None,
        }
    }

    pub fn generate(&mut self) -> f64 {
        let value: f64 = self.rng.gen();
        self.last = Some(value);
        value
    }

    pub fn repeat_last(&mut self) -> f64 {
        match self.last {
            Some(value) => value,
            None => self.generate(),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.last = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Running,
    /// Stopped by a break or an error; CONT picks up at the cursor.
    Stopped,
    /// Ran off the end or hit END/STOP; CONT is not available.
    Ended,
}

/// How a run (or continue) finished.
#[derive(Debug, PartialEq)]
pub enum Halt {
    Ended,
    Break(LineNumber),
    Error(Error),
}

pub(crate) fn seconds_since_midnight() -> f64 {
    use chrono::Timelike;
    f64::from(chrono::Local::now().time().num_seconds_from_midnight())
}

pub(crate) fn clock_seed() -> u64 {
    chrono::Local::now().timestamp_millis() as u64
}

/// ## The BASIC machine
///
/// Owns the program, variables, control stacks, DATA cursor, interval
/// timer, and execution cursor, and drives the statement loop. One
/// statement runs to completion before the next; the break flag and the
/// interval timer are sampled only at statement boundaries, never
/// mid-expression.
pub struct Runtime {
    pub(crate) program: Program,
    pub(crate) vars: Var,
    pub(crate) for_stack: Vec<ForFrame>,
    pub(crate) gosub_stack: Vec<GosubFrame>,
    pub(crate) interval: Interval,
    pub(crate) rnd: Rnd,
    cursor: Cursor,
    state: State,
    print_col: usize,
    screen: Box<dyn Screen>,
    input: Box<dyn LineInput>,
    breaker: Arc<AtomicBool>,
}

impl Default for Runtime {
    fn default() -> Runtime {
        Runtime::new(Box::new(NullScreen), Box::new(QueueInput::default()))
    }
}

impl Runtime {
    pub fn new(screen: Box<dyn Screen>, input: Box<dyn LineInput>) -> Runtime {
        Runtime {
            program: Program::new(),
            vars: Var::new(),
            for_stack: vec![],
            gosub_stack: vec![],
            interval: Interval::default(),
            rnd: Rnd::new(),
            cursor: Cursor::END,
            state: State::Idle,
            print_col: 0,
            screen,
            input,
            breaker: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Install the host's break flag. Setting it stops the run at the
    /// next statement boundary with CONT available.
    pub fn set_interrupt(&mut self, flag: Arc<AtomicBool>) {
        self.breaker = flag;
    }

    /// Store (or, with empty text, delete) a program line. Any edit
    /// invalidates the execution cursor and CONT and marks the DATA
    /// cache stale, error in flight or not.
    pub fn store_line(&mut self, number: LineNumber, text: &str) {
        self.program.store(number, text);
        self.invalidate();
    }

    pub fn delete_line(&mut self, number: LineNumber) {
        self.program.delete(number);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.cursor = Cursor::END;
        self.state = State::Idle;
    }

    pub fn cont_available(&self) -> bool {
        self.state == State::Stopped
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    /// Host-side inspection of the control stacks (a stopped program
    /// can be examined between calls; see the concurrency contract).
    pub fn for_depth(&self) -> usize {
        self.for_stack.len()
    }

    pub fn gosub_depth(&self) -> usize {
        self.gosub_stack.len()
    }

    pub fn lines(&self) -> impl Iterator<Item = (LineNumber, &str)> {
        self.program.lines()
    }

    /// Listing for a range written `X`, `X-`, `-Y`, or `X-Y`.
    pub fn list(&self, range: &str) -> Result<Vec<String>> {
        let (from, to) = parse_range(range)?;
        Ok(self.program.list(from, to))
    }

    /// Drop variables, arrays, control stacks, and the DATA cursor.
    /// The program and DEFINT table stay; CONT is no longer possible.
    pub fn clear_vars(&mut self) {
        self.vars.clear();
        self.for_stack.clear();
        self.gosub_stack.clear();
        self.program.restore_data(None);
        self.interval.in_handler = false;
        if self.state == State::Stopped {
            self.state = State::Idle;
        }
    }

    /// Full reset: everything goes, program text and DEFINT included.
    pub fn reset(&mut self) {
        self.program.clear();
        self.vars.reset();
        self.for_stack.clear();
        self.gosub_stack.clear();
        self.interval = Interval::default();
        self.invalidate();
    }

    /// Run from the top: variables, control stacks, DATA cursor, and
    /// interval state reset; the program text survives.
    pub fn run(&mut self) -> Halt {
        self.vars.clear();
        self.for_stack.clear();
        self.gosub_stack.clear();
        self.program.restore_data(None);
        self.interval = Interval::default();
        self.cursor = match self.program.first_line() {
            Some(number) => Cursor {
                line: Loc::Line(number),
                offset: 0,
            },
            None => Cursor::END,
        };
        self.state = State::Running;
        self.drive()
    }

    /// Resume a stopped program at its saved cursor.
    pub fn cont(&mut self) -> Halt {
        if self.state != State::Stopped {
            return Halt::Error(error!(Runtime; "Cannot CONTINUE"));
        }
        self.state = State::Running;
        self.drive()
    }

    fn drive(&mut self) -> Halt {
        loop {
            let number = match self.cursor.line {
                Loc::Line(number) => number,
                Loc::Direct | Loc::End => {
                    self.state = State::Ended;
                    return Halt::Ended;
                }
            };
            if self.breaker.swap(false, Ordering::SeqCst) {
                self.state = State::Stopped;
                return Halt::Break(number);
            }
            match self.poll_interval() {
                Ok(Some(cursor)) => {
                    self.cursor = cursor;
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    self.state = State::Stopped;
                    return Halt::Error(e.in_line_number(number));
                }
            }
            let text = match self.program.text(number) {
                Some(text) => text.to_string(),
                None => {
                    self.state = State::Ended;
                    return Halt::Ended;
                }
            };
            if self.cursor.offset >= text.len() {
                self.cursor = self.after_line(number);
                continue;
            }
            match self.step(&text, self.cursor) {
                Ok(Some(cursor)) => self.cursor = cursor,
                Ok(None) => {
                    self.state = State::Ended;
                    return Halt::Ended;
                }
                Err(e) => {
                    // The cursor still points at the failing
                    // statement; CONT retries it.
                    self.state = State::Stopped;
                    return Halt::Error(e.in_line_number(number));
                }
            }
        }
    }

    /// Execute one statement at the cursor. Ok(None) means END/STOP.
    fn step(&mut self, text: &str, cursor: Cursor) -> Result<Option<Cursor>> {
        let (flow, colon) = {
            let mut exec = Exec::new(self, text, cursor)?;
            let flow = exec.statement()?;
            (flow, exec.continuation())
        };
        match flow {
            Flow::Jump(next) => Ok(Some(next)),
            Flow::Halt => Ok(None),
            Flow::Next => {
                let next = match colon {
                    Some(offset) => Cursor {
                        line: cursor.line,
                        offset,
                    },
                    None => match cursor.line {
                        Loc::Line(number) => self.after_line(number),
                        Loc::Direct => Cursor {
                            line: Loc::Direct,
                            offset: text.len(),
                        },
                        Loc::End => Cursor::END,
                    },
                };
                Ok(Some(next))
            }
        }
    }

    fn after_line(&self, number: LineNumber) -> Cursor {
        match self.program.line_after(number) {
            Some(next) => Cursor {
                line: Loc::Line(next),
                offset: 0,
            },
            None => Cursor::END,
        }
    }

    /// Fire the interval timer if it is due. Called at statement
    /// boundaries only. Pushes an interrupt-tagged frame holding the
    /// current cursor and DATA position, sets the re-entrancy guard,
    /// and reschedules before jumping to the handler.
    fn poll_interval(&mut self) -> Result<Option<Cursor>> {
        if !self.interval.armed || !self.interval.enabled || self.interval.in_handler {
            return Ok(None);
        }
        if Instant::now() < self.interval.deadline {
            return Ok(None);
        }
        let target = self.interval.line;
        if !self.program.has_line(target) {
            return Err(error!(Runtime; "Undefined line number"));
        }
        self.gosub_stack.push(GosubFrame {
            resume: self.cursor,
            interrupt: true,
            data_cursor: self.program.data_cursor(),
        });
        self.interval.in_handler = true;
        self.interval.deadline = Instant::now() + self.interval.period;
        Ok(Some(Cursor {
            line: Loc::Line(target),
            offset: 0,
        }))
    }

    /// Execute a non-numbered line immediately. Errors are reported to
    /// the caller without touching the run/CONT state. Jumps out of the
    /// direct buffer are refused, so FOR loops work inline but GOTO and
    /// friends report `Illegal direct`.
    pub fn execute_direct(&mut self, text: &str) -> Option<Error> {
        let mut cursor = Cursor {
            line: Loc::Direct,
            offset: 0,
        };
        let outcome = loop {
            if cursor.offset >= text.len() {
                break None;
            }
            match self.step(text, cursor) {
                Ok(Some(next)) => match next.line {
                    Loc::Direct => cursor = next,
                    Loc::End => break None,
                    Loc::Line(_) => break Some(error!(Runtime; "Illegal direct")),
                },
                Ok(None) => break None,
                Err(e) => break Some(e),
            }
        };
        // Direct FOR frames die with their buffer.
        self.for_stack
            .retain(|frame| !matches!(frame.resume.line, Loc::Direct));
        outcome
    }

    // ---- Output column tracking, used by PRINT and TAB ----

    pub(crate) fn print_str(&mut self, s: &str) {
        for byte in s.bytes() {
            self.print_char(byte);
        }
    }

    pub(crate) fn print_char(&mut self, ch: u8) {
        self.screen.put_char(ch);
        if ch == b'\n' || ch == b'\r' {
            self.print_col = 0;
        } else {
            self.print_col += 1;
        }
    }

    /// `,` in a PRINT list: advance to the next 14-column zone.
    pub(crate) fn tab_to_next_stop(&mut self) {
        let next = (self.print_col / PRINT_ZONE + 1) * PRINT_ZONE;
        while self.print_col < next {
            self.print_char(b' ');
        }
    }

    /// TAB(n): pad with spaces up to the 1-based column n.
    pub(crate) fn tab_to_column(&mut self, column: i64) {
        let target = (column.max(1) as usize) - 1;
        while self.print_col < target {
            self.print_char(b' ');
        }
    }

    pub(crate) fn set_print_col(&mut self, col: usize) {
        self.print_col = col;
    }

    pub(crate) fn screen(&mut self) -> &mut dyn Screen {
        &mut *self.screen
    }

    pub(crate) fn read_input_line(&mut self) -> Result<String> {
        match self.input.read_line() {
            Ok(line) => Ok(line),
            Err(_) => Err(error!(Runtime; "Input past end")),
        }
    }
}

fn parse_range(range: &str) -> Result<(Option<LineNumber>, Option<LineNumber>)> {
    fn part(text: &str) -> Result<Option<LineNumber>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        match text.parse::<LineNumber>() {
            Ok(number) => Ok(Some(number)),
            Err(_) => Err(error!(Syntax; "Expected line range")),
        }
    }
    let range = range.trim();
    if range.is_empty() {
        return Ok((None, None));
    }
    match range.find('-') {
        None => {
            let number = part(range)?;
            Ok((number, number))
        }
        Some(index) => Ok((part(&range[..index])?, part(&range[index + 1..])?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("").unwrap(), (None, None));
        assert_eq!(parse_range("10").unwrap(), (Some(10), Some(10)));
        assert_eq!(parse_range("10-").unwrap(), (Some(10), None));
        assert_eq!(parse_range("-20").unwrap(), (None, Some(20)));
        assert_eq!(parse_range("10-20").unwrap(), (Some(10), Some(20)));
        assert!(parse_range("x").is_err());
    }
}
