use super::LineNumber;

/// Any failure the runtime can report: malformed source or a valid
/// statement that hit an invalid condition. A line number is attached
/// by the run loop; immediate-mode errors carry none.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    line_number: Option<LineNumber>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorKind {
    Syntax,
    Runtime,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($kind:ident; $($arg:tt)*) => {
        $crate::lang::Error::new($crate::lang::ErrorKind::$kind, format!($($arg)*))
    };
}

impl Error {
    pub fn new(kind: ErrorKind, message: String) -> Error {
        Error {
            kind,
            line_number: None,
            message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn line_number(&self) -> Option<LineNumber> {
        self.line_number
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_direct(&self) -> bool {
        self.line_number.is_none()
    }

    /// Attach a line number unless one is already set; errors raised
    /// inside nested statement sequences keep the outermost line.
    pub fn in_line_number(mut self, line: LineNumber) -> Error {
        if self.line_number.is_none() {
            self.line_number = Some(line);
        }
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let kind = match self.kind {
            ErrorKind::Syntax => "Syntax error",
            ErrorKind::Runtime => "Runtime error",
        };
        match self.line_number {
            Some(line) => write!(f, "{} in {}: {}", kind, line, self.message),
            None => write!(f, "{}: {}", kind, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = error!(Runtime; "Overflow").in_line_number(20);
        assert_eq!(e.to_string(), "Runtime error in 20: Overflow");
        let e = error!(Syntax; "Unexpected character: {}", '@');
        assert_eq!(e.to_string(), "Syntax error: Unexpected character: @");
    }

    #[test]
    fn test_line_number_sticks() {
        let e = error!(Runtime; "Out of data").in_line_number(30);
        assert_eq!(e.in_line_number(99).line_number(), Some(30));
    }
}
