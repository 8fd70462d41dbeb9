use super::val::number_prefix;
use super::Val;

/// The pure built-in functions. Dispatch happens in the evaluator by
/// upper-cased name; missing optional arguments default to zero or the
/// empty string there. RND, TIME, and TAB live with the runtime because
/// they touch machine state.
pub struct Function {}

impl Function {
    pub fn is_builtin(name: &str) -> bool {
        matches!(
            name,
            "SIN" | "COS" | "TAN" | "ATN" | "LOG" | "EXP" | "SQR" | "ABS" | "INT" | "SGN"
                | "RND" | "VAL" | "STR$" | "LEN" | "LEFT$" | "RIGHT$" | "MID$" | "CHR$" | "ASC"
                | "TAB"
        )
    }

    pub fn sgn(n: f64) -> Val {
        if n > 0.0 {
            Val::Double(1.0)
        } else if n < 0.0 {
            Val::Double(-1.0)
        } else {
            Val::Double(0.0)
        }
    }

    pub fn val(s: &str) -> Val {
        Val::Double(number_prefix(s))
    }

    pub fn str(n: f64) -> Val {
        Val::String(Val::Double(n).to_string())
    }

    pub fn len(s: &str) -> Val {
        Val::Double(s.chars().count() as f64)
    }

    pub fn left(s: &str, n: f64) -> Val {
        let n = n.max(0.0) as usize;
        Val::String(s.chars().take(n).collect())
    }

    pub fn right(s: &str, n: f64) -> Val {
        let n = n.max(0.0) as usize;
        let len = s.chars().count();
        Val::String(s.chars().skip(len.saturating_sub(n)).collect())
    }

    /// One-based start position; a missing length takes the rest.
    pub fn mid(s: &str, start: f64, len: Option<f64>) -> Val {
        let start = (start.max(1.0) as usize) - 1;
        let len = match len {
            Some(n) => n.max(0.0) as usize,
            None => s.chars().count(),
        };
        Val::String(s.chars().skip(start).take(len).collect())
    }

    pub fn chr(n: f64) -> Val {
        let byte = (n as i64 & 0xFF) as u8;
        Val::String((byte as char).to_string())
    }

    pub fn asc(s: &str) -> Val {
        match s.bytes().next() {
            Some(b) => Val::Double(f64::from(b)),
            None => Val::Double(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_functions() {
        assert_eq!(Function::left("HELLO", 2.0), Val::String("HE".to_string()));
        assert_eq!(Function::left("HELLO", 99.0), Val::String("HELLO".to_string()));
        assert_eq!(Function::right("HELLO", 3.0), Val::String("LLO".to_string()));
        assert_eq!(Function::right("HELLO", -1.0), Val::String("".to_string()));
        assert_eq!(
            Function::mid("HELLO", 2.0, Some(3.0)),
            Val::String("ELL".to_string())
        );
        assert_eq!(Function::mid("HELLO", 2.0, None), Val::String("ELLO".to_string()));
        assert_eq!(Function::mid("HELLO", 9.0, None), Val::String("".to_string()));
        assert_eq!(Function::len("HELLO"), Val::Double(5.0));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Function::val("12.5AB"), Val::Double(12.5));
        assert_eq!(Function::str(5.0), Val::String("5".to_string()));
        assert_eq!(Function::chr(65.0), Val::String("A".to_string()));
        assert_eq!(Function::asc("A"), Val::Double(65.0));
        assert_eq!(Function::asc(""), Val::Double(0.0));
    }

    #[test]
    fn test_sgn() {
        assert_eq!(Function::sgn(-7.0), Val::Double(-1.0));
        assert_eq!(Function::sgn(0.0), Val::Double(0.0));
        assert_eq!(Function::sgn(0.5), Val::Double(1.0));
    }
}
