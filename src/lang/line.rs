use super::tokens::{Token, Word};
use super::{Lexer, LineNumber};

/// Split `"10 PRINT X"` into its line number and statement text.
/// Returns None for the number when the line does not begin with digits
/// that parse as a usable line number. One space after the number is
/// soaked up; the rest of the text is preserved as written.
pub fn split_line_number(src: &str) -> (Option<LineNumber>, &str) {
    let trimmed = src.trim_start();
    let digits = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or_else(|| trimmed.len());
    if digits == 0 {
        return (None, src);
    }
    match trimmed[..digits].parse::<LineNumber>() {
        Ok(number) if number > 0 => {
            let mut rest = &trimmed[digits..];
            if let Some(stripped) = rest.strip_prefix(' ') {
                rest = stripped;
            }
            (Some(number), rest)
        }
        _ => (None, src),
    }
}

/// Normalize statement text for program storage: reserved words are
/// upper-cased, everything else (identifiers, literals, spacing) is kept
/// verbatim. REM upper-cases only the keyword itself and leaves the
/// commentary untouched. Text the tokenizer rejects is kept as written;
/// the error surfaces when the line runs.
pub fn normalize(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut lexer = Lexer::new(src);
    let mut last = 0;
    loop {
        let token = match lexer.next_token() {
            Ok(token) => token,
            Err(_) => {
                out.push_str(&src[last..]);
                return out;
            }
        };
        out.push_str(&src[last..lexer.token_start()]);
        if let Token::Eol = token {
            return out;
        }
        if let Token::Word(Word::Rem) = token {
            out.push_str("REM");
            out.push_str(lexer.rest());
            return out;
        }
        if token.is_reserved_word() {
            out.push_str(&lexer.token_text().to_ascii_uppercase());
        } else {
            out.push_str(lexer.token_text());
        }
        last = lexer.token_end();
    }
}
