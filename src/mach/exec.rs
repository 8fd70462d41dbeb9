use super::runtime::{Cursor, ForFrame, GosubFrame, Loc, Runtime};
use super::val::number_prefix;
use super::Val;
use crate::error;
use crate::lang::tokens::{Literal, Operator, Token, Word};
use crate::lang::{Error, Lexer, LineNumber};
use std::time::{Duration, Instant};

type Result<T> = std::result::Result<T, Error>;

/// What a statement asked the run loop to do next. A jump repositions
/// the cursor directly and never auto-advances; it is a control signal,
/// not an error, and is never surfaced to the user.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Next,
    Jump(Cursor),
    Halt,
}

/// Executes one statement from a line of program text, parsing tokens
/// on demand. `base` is the byte offset of the parsed slice within the
/// full line, so checkpoints built here are absolute positions.
pub struct Exec<'a> {
    pub(crate) rt: &'a mut Runtime,
    pub(crate) lexer: Lexer<'a>,
    pub(crate) tok: Token,
    loc: Loc,
    base: usize,
}

impl<'a> Exec<'a> {
    pub fn new(rt: &'a mut Runtime, text: &'a str, cursor: Cursor) -> Result<Exec<'a>> {
        let mut lexer = Lexer::new(&text[cursor.offset..]);
        let tok = lexer.next_token()?;
        Ok(Exec {
            rt,
            lexer,
            tok,
            loc: cursor.line,
            base: cursor.offset,
        })
    }

    pub(crate) fn advance(&mut self) -> Result<()> {
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    pub(crate) fn accept(&mut self, token: &Token) -> Result<bool> {
        if self.tok == *token {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub(crate) fn expect(&mut self, token: Token, what: &str) -> Result<()> {
        if self.tok == token {
            return self.advance();
        }
        Err(error!(Syntax; "Expected {}", what))
    }

    fn accept_word(&mut self, word: Word) -> Result<bool> {
        self.accept(&Token::Word(word))
    }

    fn expect_word(&mut self, word: Word, what: &str) -> Result<()> {
        self.expect(Token::Word(word), what)
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.tok, Token::Eol | Token::Colon)
    }

    /// Absolute offset just past the current look-ahead token.
    fn mark(&self) -> usize {
        self.base + self.lexer.token_end()
    }

    fn skip_to_eol(&mut self) {
        let len = self.lexer.source().len();
        self.lexer.seek(len);
        self.tok = Token::Eol;
    }

    /// Where execution picks up after a completed statement: just past
    /// a separating `:`, or None at the end of the line.
    pub fn continuation(&self) -> Option<usize> {
        match self.tok {
            Token::Colon => Some(self.mark()),
            _ => None,
        }
    }

    pub fn statement(&mut self) -> Result<Flow> {
        match self.tok.clone() {
            Token::Eol | Token::Colon => Ok(Flow::Next),
            Token::Word(word) => self.word_statement(word),
            Token::Ident(_) => self.exec_assign(),
            // A bare expression evaluates and discards its value.
            _ => {
                self.expression()?;
                Ok(Flow::Next)
            }
        }
    }

    fn word_statement(&mut self, word: Word) -> Result<Flow> {
        use Word::*;
        match word {
            Rem => {
                self.skip_to_eol();
                Ok(Flow::Next)
            }
            Data => self.exec_data(),
            Let => {
                self.advance()?;
                self.exec_assign()
            }
            Print => {
                self.advance()?;
                self.exec_print()
            }
            Input => {
                self.advance()?;
                self.exec_input()
            }
            If => {
                self.advance()?;
                self.exec_if()
            }
            Goto => {
                self.advance()?;
                self.exec_goto(false)
            }
            Gosub => {
                self.advance()?;
                self.exec_goto(true)
            }
            Return => {
                self.advance()?;
                self.exec_return()
            }
            For => {
                self.advance()?;
                self.exec_for()
            }
            Next => {
                self.advance()?;
                self.exec_next()
            }
            Dim => {
                self.advance()?;
                self.exec_dim()
            }
            Read => {
                self.advance()?;
                self.exec_read()
            }
            Restore => {
                self.advance()?;
                self.exec_restore()
            }
            On => {
                self.advance()?;
                self.exec_on()
            }
            Interval => {
                self.advance()?;
                self.exec_interval()
            }
            Cls => {
                self.advance()?;
                self.rt.screen().cls();
                self.rt.set_print_col(0);
                Ok(Flow::Next)
            }
            Locate => {
                self.advance()?;
                self.exec_locate()
            }
            Color => {
                self.advance()?;
                self.exec_color()
            }
            Beep => {
                self.advance()?;
                self.exec_beep()
            }
            Key => {
                self.advance()?;
                self.exec_key()
            }
            Randomize => {
                self.advance()?;
                self.exec_randomize()
            }
            Defint => {
                self.advance()?;
                self.exec_defint()
            }
            Clear => {
                self.advance()?;
                self.exec_clear()
            }
            End | Stop => Ok(Flow::Halt),
            // Shell commands and structural words are not statements;
            // expression parsing reports them (TIME alone is a value).
            Run | List | New | Cont | Save | Load | Delete | Then | To | Step | Off | Time => {
                self.expression()?;
                Ok(Flow::Next)
            }
        }
    }

    /// Parse a variable reference: a scalar name or a single-subscript
    /// array element. The canonical name is returned; the subscript
    /// expression is evaluated here.
    fn variable_ref(&mut self) -> Result<(String, Option<i64>)> {
        let name = match &self.tok {
            Token::Ident(ident) => ident.canonical(),
            _ => return Err(error!(Syntax; "Expected variable name")),
        };
        self.advance()?;
        if let Token::LParen = self.tok {
            let args = self.argument_list()?;
            if args.len() != 1 {
                return Err(error!(Runtime; "Bad subscript"));
            }
            return Ok((name, Some(args[0].as_number() as i64)));
        }
        Ok((name, None))
    }

    fn assign(&mut self, name: &str, subscript: Option<i64>, value: Val) -> Result<()> {
        match subscript {
            Some(index) => self.rt.vars.store_element(name, index, value),
            None => self.rt.vars.store(name, value),
        }
    }

    fn exec_assign(&mut self) -> Result<Flow> {
        let (name, subscript) = self.variable_ref()?;
        self.expect(Token::Operator(Operator::Equal), "'='")?;
        let value = self.expression()?;
        self.assign(&name, subscript, value)?;
        Ok(Flow::Next)
    }

    fn exec_print(&mut self) -> Result<Flow> {
        let mut newline = true;
        loop {
            match self.tok {
                Token::Eol | Token::Colon => break,
                Token::Comma => {
                    self.rt.tab_to_next_stop();
                    self.advance()?;
                    newline = false;
                }
                Token::Semicolon => {
                    self.advance()?;
                    newline = false;
                }
                _ => {
                    let value = self.expression()?;
                    let text = value.to_string();
                    self.rt.print_str(&text);
                    newline = true;
                    match self.tok {
                        Token::Comma | Token::Semicolon => {}
                        // No separator after the value: pad a space,
                        // and newline if the list ends here.
                        _ => self.rt.print_char(b' '),
                    }
                }
            }
        }
        if newline {
            self.rt.print_char(b'\n');
        }
        Ok(Flow::Next)
    }

    /// One line of external input satisfies every variable in the list,
    /// split on commas and coerced to each target's type.
    fn exec_input(&mut self) -> Result<Flow> {
        let mut prompt = None;
        if let Token::Literal(Literal::String(s)) = &self.tok {
            prompt = Some(s.clone());
            self.advance()?;
            if matches!(self.tok, Token::Semicolon | Token::Comma) {
                self.advance()?;
            }
        }
        match &prompt {
            Some(text) => self.rt.print_str(text),
            None => self.rt.print_str("? "),
        }
        let line = self.rt.read_input_line()?;
        self.rt.print_char(b'\n');
        let fields: Vec<String> = line.split(',').map(|f| f.trim().to_string()).collect();
        let mut index = 0;
        loop {
            let (name, subscript) = self.variable_ref()?;
            let field = fields.get(index).map(|s| s.as_str()).unwrap_or("");
            let value = if name.ends_with('$') {
                Val::String(field.to_string())
            } else {
                Val::Double(number_prefix(field))
            };
            self.assign(&name, subscript, value)?;
            index += 1;
            if self.accept(&Token::Comma)? {
                continue;
            }
            break;
        }
        Ok(Flow::Next)
    }

    fn exec_if(&mut self) -> Result<Flow> {
        let condition = self.expression()?;
        self.expect_word(Word::Then, "THEN")?;
        if !condition.truthy() {
            // The entire remainder of the line belongs to the THEN
            // branch, ':' separators included.
            self.skip_to_eol();
            return Ok(Flow::Next);
        }
        match self.tok {
            Token::Literal(Literal::Integer(_)) | Token::Literal(Literal::Double(_)) => {
                let target = self.line_number()?;
                return self.jump_to(target);
            }
            _ => {}
        }
        loop {
            match self.statement()? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
            if let Token::Colon = self.tok {
                self.advance()?;
                continue;
            }
            break;
        }
        Ok(Flow::Next)
    }

    fn line_number(&mut self) -> Result<LineNumber> {
        let number = match self.tok {
            Token::Literal(Literal::Integer(n)) if n > 0 => n as LineNumber,
            Token::Literal(Literal::Double(n))
                if n > 0.0 && n.fract() == 0.0 && n <= f64::from(LineNumber::max_value()) =>
            {
                n as LineNumber
            }
            _ => return Err(error!(Syntax; "Expected line number")),
        };
        self.advance()?;
        Ok(number)
    }

    /// Validate a jump target. Nothing is mutated on failure, so a
    /// failed GOSUB never leaves a frame behind.
    fn jump_to(&mut self, target: LineNumber) -> Result<Flow> {
        if let Loc::Direct = self.loc {
            return Err(error!(Runtime; "Illegal direct"));
        }
        if !self.rt.program.has_line(target) {
            return Err(error!(Runtime; "Undefined line number"));
        }
        Ok(Flow::Jump(Cursor {
            line: Loc::Line(target),
            offset: 0,
        }))
    }

    fn exec_goto(&mut self, push_frame: bool) -> Result<Flow> {
        let target = self.line_number()?;
        let flow = self.jump_to(target)?;
        if push_frame {
            self.rt.gosub_stack.push(GosubFrame {
                resume: Cursor {
                    line: self.loc,
                    offset: self.mark(),
                },
                interrupt: false,
                data_cursor: 0,
            });
        }
        Ok(flow)
    }

    fn exec_return(&mut self) -> Result<Flow> {
        if self.rt.gosub_stack.is_empty() {
            return Err(error!(Runtime; "RETURN without GOSUB"));
        }
        if let Loc::Direct = self.loc {
            return Err(error!(Runtime; "Illegal direct"));
        }
        let frame = self.rt.gosub_stack.pop().unwrap();
        if frame.interrupt {
            // Handler done: put back the DATA cursor it interrupted
            // and let the timer fire again.
            self.rt.program.set_data_cursor(frame.data_cursor);
            self.rt.interval.in_handler = false;
        }
        Ok(Flow::Jump(frame.resume))
    }

    fn exec_for(&mut self) -> Result<Flow> {
        let var = match &self.tok {
            Token::Ident(ident) => ident.canonical(),
            _ => return Err(error!(Syntax; "Expected variable name")),
        };
        self.advance()?;
        self.expect(Token::Operator(Operator::Equal), "'='")?;
        let start = self.expression()?;
        self.expect_word(Word::To, "TO")?;
        let end = self.expression()?.as_number();
        let mut step = 1.0;
        if self.accept_word(Word::Step)? {
            step = self.expression()?.as_number();
            if step == 0.0 {
                return Err(error!(Runtime; "STEP cannot be 0"));
            }
        }
        self.rt.vars.store(&var, start)?;
        // Checkpoint immediately past the FOR header. A trailing ':'
        // stays put; the statement loop owns the separators.
        let resume = match self.tok {
            Token::Eol => match self.loc {
                Loc::Line(number) => match self.rt.program.line_after(number) {
                    Some(next) => Cursor {
                        line: Loc::Line(next),
                        offset: 0,
                    },
                    None => Cursor::END,
                },
                Loc::Direct | Loc::End => Cursor {
                    line: self.loc,
                    offset: self.mark(),
                },
            },
            _ => Cursor {
                line: self.loc,
                offset: self.mark(),
            },
        };
        // A new FOR on the same control variable throws away the old
        // frame and everything stacked above it.
        if let Some(index) = self.rt.for_stack.iter().position(|f| f.var == var) {
            self.rt.for_stack.truncate(index);
        }
        self.rt.for_stack.push(ForFrame {
            var,
            end,
            step,
            resume,
        });
        Ok(Flow::Next)
    }

    fn exec_next(&mut self) -> Result<Flow> {
        let mut named = None;
        if let Token::Ident(ident) = &self.tok {
            named = Some(ident.canonical());
            self.advance()?;
        }
        if self.rt.for_stack.is_empty() {
            return Err(error!(Runtime; "NEXT without FOR"));
        }
        let index = match &named {
            None => self.rt.for_stack.len() - 1,
            Some(name) => match self.rt.for_stack.iter().rposition(|f| &f.var == name) {
                Some(index) => index,
                None => return Err(error!(Runtime; "NEXT without FOR")),
            },
        };
        if self.loc == Loc::Direct && self.rt.for_stack[index].resume.line != Loc::Direct {
            return Err(error!(Runtime; "Illegal direct"));
        }
        // A GOTO out of an inner loop leaves frames above the match.
        self.rt.for_stack.truncate(index + 1);
        let frame = self.rt.for_stack.last().unwrap().clone();
        let value = self.rt.vars.fetch(&frame.var).as_number() + frame.step;
        self.rt.vars.store(&frame.var, Val::Double(value))?;
        let continues = if frame.step >= 0.0 {
            value <= frame.end
        } else {
            value >= frame.end
        };
        if continues {
            Ok(Flow::Jump(frame.resume))
        } else {
            self.rt.for_stack.pop();
            Ok(Flow::Next)
        }
    }

    fn exec_dim(&mut self) -> Result<Flow> {
        loop {
            let (name, subscript) = self.variable_ref()?;
            let bound = match subscript {
                Some(bound) => bound,
                None => return Err(error!(Syntax; "Expected '('")),
            };
            self.rt.vars.dimension(&name, bound)?;
            if self.accept(&Token::Comma)? {
                continue;
            }
            break;
        }
        Ok(Flow::Next)
    }

    /// DATA is non-executable; skip its raw text so unquoted items
    /// never reach the tokenizer.
    fn exec_data(&mut self) -> Result<Flow> {
        let rest = self.lexer.rest();
        let mut quoted = false;
        let mut stop = rest.len();
        for (index, ch) in rest.char_indices() {
            match ch {
                '"' => quoted = !quoted,
                ':' if !quoted => {
                    stop = index;
                    break;
                }
                _ => {}
            }
        }
        let pos = self.lexer.pos() + stop;
        self.lexer.seek(pos);
        self.advance()?;
        Ok(Flow::Next)
    }

    fn exec_read(&mut self) -> Result<Flow> {
        loop {
            let (name, subscript) = self.variable_ref()?;
            let item = self.rt.program.read_data()?;
            let value = if name.ends_with('$') {
                Val::String(item)
            } else {
                Val::Double(number_prefix(&item))
            };
            self.assign(&name, subscript, value)?;
            if self.accept(&Token::Comma)? {
                continue;
            }
            break;
        }
        Ok(Flow::Next)
    }

    fn exec_restore(&mut self) -> Result<Flow> {
        let line = if self.at_statement_end() {
            None
        } else {
            Some(self.line_number()?)
        };
        self.rt.program.restore_data(line);
        Ok(Flow::Next)
    }

    /// ON INTERVAL <ticks> GOSUB <line>, with ticks in 1/60 second.
    /// The `=` and parenthesized spellings are accepted too.
    fn exec_on(&mut self) -> Result<Flow> {
        match self.tok {
            Token::Word(Word::Interval) => self.advance()?,
            _ => return Err(error!(Runtime; "Unsupported ON event")),
        }
        self.accept(&Token::Operator(Operator::Equal))?;
        // Ticks are 16-bit in spirit; clamp so the deadline stays sane.
        let ticks = self.expression()?.as_number().max(0.0).min(65_535.0);
        self.expect_word(Word::Gosub, "GOSUB")?;
        let target = self.line_number()?;
        let interval = &mut self.rt.interval;
        interval.period = Duration::from_secs_f64(ticks / 60.0);
        interval.line = target;
        interval.armed = true;
        interval.deadline = Instant::now() + interval.period;
        Ok(Flow::Next)
    }

    fn exec_interval(&mut self) -> Result<Flow> {
        match self.tok {
            Token::Word(Word::On) => {
                self.advance()?;
                self.rt.interval.enabled = true;
                if self.rt.interval.armed {
                    self.rt.interval.deadline = Instant::now() + self.rt.interval.period;
                }
            }
            Token::Word(Word::Off) => {
                self.advance()?;
                self.rt.interval.enabled = false;
            }
            Token::Word(Word::Stop) => {
                self.advance()?;
                self.rt.interval.enabled = false;
                self.rt.interval.armed = false;
            }
            _ => return Err(error!(Runtime; "Expected INTERVAL ON, OFF, or STOP")),
        }
        Ok(Flow::Next)
    }

    /// LOCATE row[,col[,cursor]]; any argument may be omitted.
    fn exec_locate(&mut self) -> Result<Flow> {
        let mut row = 1.0;
        let mut col = 1.0;
        let mut cursor = None;
        if !matches!(self.tok, Token::Comma | Token::Eol | Token::Colon) {
            row = self.expression()?.as_number();
        }
        if self.accept(&Token::Comma)? {
            if !matches!(self.tok, Token::Comma | Token::Eol | Token::Colon) {
                col = self.expression()?.as_number();
            }
            if self.accept(&Token::Comma)? {
                if !self.at_statement_end() {
                    cursor = Some(self.expression()?.as_number() as i64);
                }
            }
        }
        let row = row.max(1.0).min(f64::from(u16::max_value())) as u16;
        let col = col.max(1.0).min(f64::from(u16::max_value())) as u16;
        match cursor {
            Some(0) => self.rt.screen().show_cursor(false),
            Some(1) => self.rt.screen().show_cursor(true),
            _ => {}
        }
        self.rt.screen().locate(row, col);
        self.rt.set_print_col(col as usize - 1);
        Ok(Flow::Next)
    }

    /// COLOR fg[,bg]; omitted channels stay unchanged.
    fn exec_color(&mut self) -> Result<Flow> {
        fn channel(n: f64) -> u8 {
            n.max(0.0).min(15.0) as u8
        }
        let mut fg = None;
        let mut bg = None;
        if !matches!(self.tok, Token::Comma | Token::Eol | Token::Colon) {
            fg = Some(channel(self.expression()?.as_number()));
        }
        if self.accept(&Token::Comma)? {
            if !self.at_statement_end() {
                bg = Some(channel(self.expression()?.as_number()));
            }
        }
        self.rt.screen().color(fg, bg);
        Ok(Flow::Next)
    }

    fn exec_beep(&mut self) -> Result<Flow> {
        // Optional tone parameters are accepted and ignored.
        if !self.at_statement_end() {
            self.expression()?;
            if self.accept(&Token::Comma)? {
                self.expression()?;
            }
        }
        self.rt.screen().beep();
        Ok(Flow::Next)
    }

    fn exec_key(&mut self) -> Result<Flow> {
        // Function-key macro display; accepted for compatibility.
        match self.tok {
            Token::Word(Word::On) | Token::Word(Word::Off) => {
                self.advance()?;
                Ok(Flow::Next)
            }
            _ => Err(error!(Runtime; "Expected KEY ON or KEY OFF")),
        }
    }

    fn exec_randomize(&mut self) -> Result<Flow> {
        if self.at_statement_end() {
            let seed = super::runtime::clock_seed();
            self.rt.rnd.reseed(seed);
        } else {
            let seed = self.expression()?.as_number();
            self.rt.rnd.reseed(seed.abs() as u64);
        }
        Ok(Flow::Next)
    }

    /// DEFINT A-Z style letter ranges, comma separated.
    fn exec_defint(&mut self) -> Result<Flow> {
        loop {
            let had_paren = self.accept(&Token::LParen)?;
            let from = self.defint_letter()?;
            let mut to = from;
            if self.accept(&Token::Operator(Operator::Minus))? {
                to = self.defint_letter()?;
            }
            if had_paren {
                self.expect(Token::RParen, "')'")?;
            }
            self.rt.vars.set_defint_range(from, to);
            if self.accept(&Token::Comma)? {
                continue;
            }
            break;
        }
        Ok(Flow::Next)
    }

    fn defint_letter(&mut self) -> Result<char> {
        let letter = match &self.tok {
            Token::Ident(ident) => ident
                .name()
                .chars()
                .next()
                .unwrap_or(' ')
                .to_ascii_uppercase(),
            _ => return Err(error!(Syntax; "Expected letter in DEFINT")),
        };
        if !letter.is_ascii_uppercase() {
            return Err(error!(Syntax; "Expected letter in DEFINT"));
        }
        self.advance()?;
        Ok(letter)
    }

    /// CLEAR drops variables, arrays, and the DATA cursor, but an
    /// in-flight run keeps its FOR/GOSUB stacks and interrupt guard.
    fn exec_clear(&mut self) -> Result<Flow> {
        if !self.at_statement_end() {
            // Memory-size argument, accepted and ignored.
            self.expression()?;
        }
        self.rt.vars.clear();
        self.rt.program.restore_data(None);
        Ok(Flow::Next)
    }
}
