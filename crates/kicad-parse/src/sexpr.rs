//! S-expression tokenizer and tree builder for KiCad files.
//!
//! Grammar:
//!   sexpr  = '(' atom_or_sexpr* ')'
//!   atom   = string | number | symbol
//!   string = '"' [^"]* '"'  (with escape handling)
//!   number = [+-]?[0-9]+[.[0-9]*][e[+-][0-9]+]?
//!   symbol = [^ \t\n\r()"]+
//!
//! Numbers, quoted strings, and bare symbols are kept distinct; downstream
//! binding uses the distinction to tell positional fields from keywords.
//! This layer does no semantic validation.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    List(Vec<Sexpr>),
    Number(f64),
    Str(String),
    Symbol(String),
}

impl Sexpr {
    /// Get the head symbol of a list (the "tag" or record name).
    pub fn tag(&self) -> Option<&str> {
        match self {
            Sexpr::List(items) => items.first().and_then(|item| match item {
                Sexpr::Symbol(s) => Some(s.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }

    /// List children (everything after the tag).
    pub fn children(&self) -> &[Sexpr] {
        match self {
            Sexpr::List(items) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    /// All items including the tag.
    pub fn items(&self) -> &[Sexpr] {
        match self {
            Sexpr::List(items) => items,
            _ => &[],
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Sexpr::List(_))
    }

    /// Find the first child list with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Sexpr> {
        self.children().iter().find(|c| c.tag() == Some(tag))
    }

    /// Find all child lists with the given tag.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Sexpr> {
        self.children().iter().filter(move |c| c.tag() == Some(tag))
    }

    /// String content of a quoted string or bare symbol atom.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Sexpr::Str(s) | Sexpr::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric value; numeric-looking strings are accepted since some
    /// exporters quote numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Sexpr::Number(n) => Some(*n),
            Sexpr::Str(s) | Sexpr::Symbol(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Value of a simple `(tag value)` child.
    pub fn value(&self, tag: &str) -> Option<&str> {
        self.find(tag)
            .and_then(|node| node.children().first())
            .and_then(|v| v.as_atom())
    }

    pub fn value_f64(&self, tag: &str) -> Option<f64> {
        self.find(tag)
            .and_then(|node| node.children().first())
            .and_then(|v| v.as_f64())
    }

    /// The nth child atom (0-indexed after the tag).
    pub fn atom_at(&self, index: usize) -> Option<&str> {
        self.children().get(index).and_then(|v| v.as_atom())
    }

    pub fn f64_at(&self, index: usize) -> Option<f64> {
        self.children().get(index).and_then(|v| v.as_f64())
    }
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn parse_string(&mut self) -> Result<Sexpr, ParseError> {
        let start = self.pos;
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Sexpr::Str(out)),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(ParseError::UnterminatedString(start)),
                },
                Some(c) => out.push(c),
                None => return Err(ParseError::UnterminatedString(start)),
            }
        }
    }

    fn parse_bare(&mut self) -> Sexpr {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
                break;
            }
            self.pos += c.len_utf8();
        }
        let token = &self.input[start..self.pos];
        if looks_numeric(token) {
            if let Ok(n) = token.parse::<f64>() {
                return Sexpr::Number(n);
            }
        }
        Sexpr::Symbol(token.to_string())
    }

    fn parse_list(&mut self) -> Result<Sexpr, ParseError> {
        let open = self.pos;
        self.bump(); // '('
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(')') => {
                    self.bump();
                    return Ok(Sexpr::List(items));
                }
                Some('(') => items.push(self.parse_list()?),
                Some('"') => items.push(self.parse_string()?),
                Some(_) => items.push(self.parse_bare()),
                None => return Err(ParseError::UnbalancedParens(open)),
            }
        }
    }
}

/// A token is treated as a number only when it parses as one in full and
/// starts like one; UUIDs and net names beginning with digits stay symbols.
fn looks_numeric(token: &str) -> bool {
    let rest = token.strip_prefix(['-', '+']).unwrap_or(token);
    !rest.is_empty() && rest.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

/// Parse one document: a single top-level list with nothing but whitespace
/// after it.
pub fn parse(input: &str) -> Result<Sexpr, ParseError> {
    let mut t = Tokenizer::new(input);
    t.skip_whitespace();
    let root = match t.peek() {
        None => return Err(ParseError::EmptyInput),
        Some('(') => t.parse_list()?,
        Some(')') => return Err(ParseError::UnbalancedParens(t.pos)),
        Some('"') => t.parse_string()?,
        Some(_) => t.parse_bare(),
    };
    t.skip_whitespace();
    if t.peek() == Some(')') {
        return Err(ParseError::UnbalancedParens(t.pos));
    }
    if t.peek().is_some() {
        return Err(ParseError::TrailingContent(t.pos));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_list() {
        let result = parse("(hello world)").unwrap();
        assert_eq!(result.tag(), Some("hello"));
        assert_eq!(result.atom_at(0), Some("world"));
    }

    #[test]
    fn test_nested() {
        let result = parse("(a (b 1) (c 2))").unwrap();
        assert_eq!(result.tag(), Some("a"));
        assert_eq!(result.value_f64("b"), Some(1.0));
        assert_eq!(result.value_f64("c"), Some(2.0));
    }

    #[test]
    fn test_atom_kinds() {
        let result = parse("(at 100.5 -3 \"90\" up 1e-2)").unwrap();
        assert_eq!(result.children()[0], Sexpr::Number(100.5));
        assert_eq!(result.children()[1], Sexpr::Number(-3.0));
        assert_eq!(result.children()[2], Sexpr::Str("90".to_string()));
        assert_eq!(result.children()[3], Sexpr::Symbol("up".to_string()));
        assert_eq!(result.children()[4], Sexpr::Number(0.01));
    }

    #[test]
    fn test_uuid_stays_symbol() {
        let result = parse("(uuid 00000000-dead-beef-0000-000000000000)").unwrap();
        assert_eq!(
            result.atom_at(0),
            Some("00000000-dead-beef-0000-000000000000")
        );
        assert!(matches!(result.children()[0], Sexpr::Symbol(_)));
    }

    #[test]
    fn test_string_escapes() {
        let result = parse(r#"(text "a \"b\"\nc")"#).unwrap();
        assert_eq!(result.atom_at(0), Some("a \"b\"\nc"));
    }

    #[test]
    fn test_unbalanced() {
        assert!(matches!(
            parse("(kicad_sch (wire)"),
            Err(ParseError::UnbalancedParens(_))
        ));
        assert!(matches!(
            parse("(a))"),
            Err(ParseError::UnbalancedParens(_))
        ));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            parse("(text \"oops"),
            Err(ParseError::UnterminatedString(_))
        ));
    }

    #[test]
    fn test_trailing_content() {
        assert!(matches!(
            parse("(a) (b)"),
            Err(ParseError::TrailingContent(_))
        ));
    }

    #[test]
    fn test_find_all() {
        let result = parse("(root (net 0 \"\") (net 1 \"GND\") (net 2 \"VCC\"))").unwrap();
        assert_eq!(result.find_all("net").count(), 3);
    }
}
