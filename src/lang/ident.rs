// Used in both Token and the variable tables.

/// An identifier as written in the source. The suffix picks the type:
/// `$` is string, `%` is 16-bit integer, no suffix defers to DEFINT.
#[derive(Debug, PartialEq, Hash, Clone)]
pub enum Ident {
    Plain(String),
    String(String),
    Integer(String),
}

impl Ident {
    pub fn name(&self) -> &str {
        use Ident::*;
        match self {
            Plain(s) | String(s) | Integer(s) => s,
        }
    }

    /// Canonical form for table lookups; source case is display-only.
    pub fn canonical(&self) -> std::string::String {
        self.name().to_ascii_uppercase()
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
