//! Terminal shell: a line-oriented REPL over the runtime, an ANSI
//! screen driver, and plain-text program persistence.

use crate::lang::split_line_number;
use crate::mach::{Halt, LineInput, Runtime, Screen};
use ansi_term::{Colour, Style};
use linefeed::{Interface, ReadResult};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub fn main() {
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");
    if let Err(error) = main_loop(interrupted) {
        eprintln!("{}", error);
    }
}

fn main_loop(interrupted: Arc<AtomicBool>) -> io::Result<()> {
    let command = Interface::new("retrobasic")?;
    let input = Interface::new("input")?;
    input.set_prompt("")?;
    let mut runtime = Runtime::new(
        Box::new(AnsiScreen::new()),
        Box::new(TermInput { interface: input }),
    );
    runtime.set_interrupt(interrupted.clone());
    command.write_fmt(format_args!("retrobasic\n"))?;

    let mut print_ready = true;
    loop {
        interrupted.store(false, Ordering::SeqCst);
        if print_ready {
            command.write_fmt(format_args!("READY.\n"))?;
            print_ready = false;
        }
        let line = match command.read_line()? {
            ReadResult::Input(line) => line,
            ReadResult::Signal(_) | ReadResult::Eof => break,
        };
        let text = line.trim().to_string();
        if text.is_empty() {
            continue;
        }
        command.add_history_unique(line);

        let (number, rest) = split_line_number(&text);
        if let Some(number) = number {
            runtime.store_line(number, rest);
            continue;
        }
        if text.chars().next().map(|c| c.is_ascii_digit()) == Some(true) {
            command.write_fmt(format_args!("Bad line number\n"))?;
            print_ready = true;
            continue;
        }

        let (word, rest) = split_word(&text);
        match word.to_ascii_uppercase().as_str() {
            "RUN" if rest.is_empty() => {
                report(&command, runtime.run())?;
            }
            "CONT" if rest.is_empty() => {
                report(&command, runtime.cont())?;
            }
            "LIST" => match runtime.list(rest) {
                Ok(lines) => {
                    for line in lines {
                        command.write_fmt(format_args!("{}\n", line))?;
                    }
                }
                Err(error) => print_error(&command, &error.to_string())?,
            },
            "NEW" if rest.is_empty() => runtime.reset(),
            "CLEAR" if rest.is_empty() => runtime.clear_vars(),
            "DELETE" => match rest.trim().parse::<u16>() {
                Ok(number) if number > 0 => runtime.delete_line(number),
                _ => command.write_fmt(format_args!("DELETE requires a line number\n"))?,
            },
            "SAVE" => save(&command, &runtime, rest)?,
            "LOAD" => load(&command, &mut runtime, rest)?,
            _ => {
                if let Some(error) = runtime.execute_direct(&text) {
                    print_error(&command, &error.to_string())?;
                }
            }
        }
        print_ready = true;
    }
    Ok(())
}

fn report(command: &Interface<linefeed::DefaultTerminal>, halt: Halt) -> io::Result<()> {
    match halt {
        Halt::Ended => Ok(()),
        Halt::Break(line) => command.write_fmt(format_args!("Break in {}\n", line)),
        Halt::Error(error) => print_error(command, &error.to_string()),
    }
}

fn print_error(command: &Interface<linefeed::DefaultTerminal>, message: &str) -> io::Result<()> {
    command.write_fmt(format_args!("{}\n", Style::new().bold().paint(message)))
}

fn split_word(text: &str) -> (&str, &str) {
    match text.find(|c: char| !c.is_ascii_alphabetic()) {
        Some(index) => (&text[..index], &text[index..]),
        None => (text, ""),
    }
}

/// `"name"` with an optional `,R` after the closing quote.
fn filename(rest: &str) -> Option<(&str, bool)> {
    let rest = rest.trim();
    let rest = rest.strip_prefix('"')?;
    let close = rest.find('"')?;
    let name = &rest[..close];
    let tail = rest[close + 1..].trim();
    let run_after = tail.eq_ignore_ascii_case(",r");
    if !tail.is_empty() && !run_after {
        return None;
    }
    Some((name, run_after))
}

/// One `"<line> <text>"` record per program line, ascending.
fn save(
    command: &Interface<linefeed::DefaultTerminal>,
    runtime: &Runtime,
    rest: &str,
) -> io::Result<()> {
    let (name, _) = match filename(rest) {
        Some(parsed) => parsed,
        None => {
            return command.write_fmt(format_args!("SAVE requires a filename in quotes\n"));
        }
    };
    let mut file = match File::create(name) {
        Ok(file) => file,
        Err(error) => {
            return command.write_fmt(format_args!("Cannot open {}: {}\n", name, error));
        }
    };
    for (number, text) in runtime.lines() {
        writeln!(file, "{} {}", number, text)?;
    }
    Ok(())
}

/// Records not starting with a digit are skipped; the rest go through
/// the normal store-line path, so normalization and invalidation apply.
fn load(
    command: &Interface<linefeed::DefaultTerminal>,
    runtime: &mut Runtime,
    rest: &str,
) -> io::Result<()> {
    let (name, run_after) = match filename(rest) {
        Some(parsed) => parsed,
        None => {
            return command.write_fmt(format_args!("LOAD requires a filename in quotes\n"));
        }
    };
    let reader = match File::open(name) {
        Ok(file) => BufReader::new(file),
        Err(error) => {
            return command.write_fmt(format_args!("Cannot open {}: {}\n", name, error));
        }
    };
    runtime.reset();
    let mut count = 0;
    for line in reader.lines() {
        let line = line?;
        let (number, text) = split_line_number(line.trim());
        if let Some(number) = number {
            runtime.store_line(number, text);
            count += 1;
        }
    }
    command.write_fmt(format_args!("Loaded {} lines\n", count))?;
    if run_after {
        report(command, runtime.run())?;
    }
    Ok(())
}

/// Screen driver over a plain ANSI terminal.
struct AnsiScreen {
    out: io::Stdout,
}

impl AnsiScreen {
    fn new() -> AnsiScreen {
        AnsiScreen { out: io::stdout() }
    }

    fn emit(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

impl Screen for AnsiScreen {
    fn put_char(&mut self, ch: u8) {
        let _ = self.out.write_all(&[ch]);
        let _ = self.out.flush();
    }

    fn cls(&mut self) {
        self.emit("\x1b[2J\x1b[H");
    }

    fn locate(&mut self, row: u16, col: u16) {
        self.emit(&format!("\x1b[{};{}H", row, col));
    }

    fn show_cursor(&mut self, visible: bool) {
        self.emit(if visible { "\x1b[?25h" } else { "\x1b[?25l" });
    }

    fn color(&mut self, fg: Option<u8>, bg: Option<u8>) {
        let mut style = Style::new();
        if let Some(fg) = fg {
            style = style.fg(Colour::Fixed(fg));
        }
        if let Some(bg) = bg {
            style = style.on(Colour::Fixed(bg));
        }
        self.emit(&format!("{}", style.prefix()));
    }

    fn beep(&mut self) {
        self.emit("\x07");
    }
}

/// Blocking INPUT provider on its own line-editing interface.
struct TermInput {
    interface: Interface<linefeed::DefaultTerminal>,
}

impl LineInput for TermInput {
    fn read_line(&mut self) -> io::Result<String> {
        match self.interface.read_line()? {
            ReadResult::Input(line) => Ok(line),
            ReadResult::Signal(_) | ReadResult::Eof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            )),
        }
    }
}
