use super::exec::Exec;
use super::function::Function;
use super::runtime::seconds_since_midnight;
use super::{Operation, Val};
use crate::error;
use crate::lang::tokens::{Literal, Operator, Token, Word};
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

// Expression evaluation: a precedence-climbing walk over the token
// stream that produces values directly. Precedence, low to high:
// OR < AND < relational < add/sub < mul/div/int-div/MOD < power,
// with power binding to the right.

fn precedence_of(op: Operator) -> usize {
    use Operator::*;
    match op {
        Or => 1,
        And => 2,
        Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => 3,
        Plus | Minus => 4,
        Multiply | Divide | DivideInt | Modulus => 5,
        Caret => 6,
        Not => 0,
    }
}

fn apply(op: Operator, lhs: Val, rhs: Val) -> Result<Val> {
    use Operator::*;
    match op {
        Plus => Operation::sum(lhs, rhs),
        Minus => Operation::subtract(lhs, rhs),
        Multiply => Operation::multiply(lhs, rhs),
        Divide => Operation::divide(lhs, rhs),
        DivideInt => Operation::divide_int(lhs, rhs),
        Modulus => Operation::modulus(lhs, rhs),
        Caret => Operation::power(lhs, rhs),
        Equal => Operation::equal(lhs, rhs),
        NotEqual => Operation::not_equal(lhs, rhs),
        Less => Operation::less(lhs, rhs),
        LessEqual => Operation::less_equal(lhs, rhs),
        Greater => Operation::greater(lhs, rhs),
        GreaterEqual => Operation::greater_equal(lhs, rhs),
        And => Operation::and(lhs, rhs),
        Or => Operation::or(lhs, rhs),
        Not => Err(error!(Syntax; "Expected expression")),
    }
}

impl<'a> Exec<'a> {
    pub(crate) fn expression(&mut self) -> Result<Val> {
        let lhs = self.primary()?;
        self.binary(1, lhs)
    }

    fn binary(&mut self, min_precedence: usize, mut lhs: Val) -> Result<Val> {
        loop {
            let op = match self.tok {
                Token::Operator(op) => op,
                _ => return Ok(lhs),
            };
            let precedence = precedence_of(op);
            if precedence == 0 || precedence < min_precedence {
                return Ok(lhs);
            }
            let right_assoc = op == Operator::Caret;
            self.advance()?;
            let mut rhs = self.primary()?;
            let next = match self.tok {
                Token::Operator(op) => precedence_of(op),
                _ => 0,
            };
            if next > precedence || (next == precedence && right_assoc) {
                let climb = precedence + if right_assoc { 0 } else { 1 };
                rhs = self.binary(climb, rhs)?;
            }
            lhs = apply(op, lhs, rhs)?;
        }
    }

    fn primary(&mut self) -> Result<Val> {
        match self.tok.clone() {
            Token::Literal(Literal::Integer(n)) => {
                self.advance()?;
                Ok(Val::Integer(n))
            }
            Token::Literal(Literal::Double(n)) => {
                self.advance()?;
                Ok(Val::Double(n))
            }
            Token::Literal(Literal::String(s)) => {
                self.advance()?;
                Ok(Val::String(s))
            }
            Token::LParen => {
                self.advance()?;
                let value = self.expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(value)
            }
            Token::Operator(Operator::Minus) => {
                self.advance()?;
                Operation::negate(self.primary()?)
            }
            Token::Operator(Operator::Not) => {
                self.advance()?;
                Operation::not(self.primary()?)
            }
            Token::Word(Word::Time) => {
                self.advance()?;
                if self.accept(&Token::LParen)? {
                    self.expect(Token::RParen, "')'")?;
                }
                Ok(Val::Double(seconds_since_midnight()))
            }
            Token::Ident(ident) => {
                let name = ident.canonical();
                self.advance()?;
                if let Token::LParen = self.tok {
                    if Function::is_builtin(&name) {
                        let args = self.argument_list()?;
                        return self.call(&name, args);
                    }
                    let args = self.argument_list()?;
                    if args.len() != 1 {
                        return Err(error!(Runtime; "Bad subscript"));
                    }
                    let index = args[0].as_number() as i64;
                    return self.rt.vars.fetch_element(&name, index);
                }
                Ok(self.rt.vars.fetch(&name))
            }
            _ => Err(error!(Syntax; "Expected expression")),
        }
    }

    pub(crate) fn argument_list(&mut self) -> Result<Vec<Val>> {
        self.expect(Token::LParen, "'('")?;
        let mut args = vec![];
        if let Token::RParen = self.tok {
            self.advance()?;
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.tok {
                Token::RParen => {
                    self.advance()?;
                    return Ok(args);
                }
                Token::Comma => self.advance()?,
                _ => return Err(error!(Syntax; "Expected ')' or ','")),
            }
        }
    }

    /// Built-in function dispatch by upper-cased name. Missing optional
    /// arguments default to zero or the empty string.
    fn call(&mut self, name: &str, args: Vec<Val>) -> Result<Val> {
        let number = |index: usize| -> f64 { args.get(index).map(Val::as_number).unwrap_or(0.0) };
        let string = |index: usize| -> String {
            match args.get(index) {
                Some(value) => value.to_string(),
                None => String::new(),
            }
        };
        let value = match name {
            "SIN" => Val::Double(number(0).sin()),
            "COS" => Val::Double(number(0).cos()),
            "TAN" => Val::Double(number(0).tan()),
            "ATN" => Val::Double(number(0).atan()),
            "LOG" => Val::Double(number(0).ln()),
            "EXP" => Val::Double(number(0).exp()),
            "SQR" => Val::Double(number(0).sqrt()),
            "ABS" => Val::Double(number(0).abs()),
            "INT" => Val::Double(number(0).floor()),
            "SGN" => Function::sgn(number(0)),
            "RND" => {
                // Negative reseeds, zero repeats the last value,
                // positive or absent draws a new one.
                let x = if args.is_empty() { 1.0 } else { number(0) };
                if x < 0.0 {
                    self.rt.rnd.reseed(x.abs() as u64);
                    Val::Double(self.rt.rnd.generate())
                } else if x == 0.0 {
                    Val::Double(self.rt.rnd.repeat_last())
                } else {
                    Val::Double(self.rt.rnd.generate())
                }
            }
            "VAL" => Function::val(&string(0)),
            "STR$" => Function::str(number(0)),
            "LEN" => Function::len(&string(0)),
            "LEFT$" => Function::left(&string(0), number(1)),
            "RIGHT$" => Function::right(&string(0), number(1)),
            "MID$" => Function::mid(&string(0), number(1), args.get(2).map(Val::as_number)),
            "CHR$" => Function::chr(number(0)),
            "ASC" => Function::asc(&string(0)),
            "TAB" => {
                // Side effect on the output column; PRINT sees only
                // the empty string.
                let column = number(0) as i64;
                self.rt.tab_to_column(column);
                Val::String(String::new())
            }
            _ => return Err(error!(Runtime; "Unknown function: {}", name)),
        };
        Ok(value)
    }
}
