//! Lexical analysis for architecture sources.
//!
//! Whitespace, `//` line comments and plain `/* */` block comments are
//! skipped. A block comment introduced by the `doc` keyword is kept as a
//! single [`Token::Doc`] carrying the comment text with whitespace collapsed.

use std::fmt;
use std::ops::Range;

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    // === Keywords ===
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("private")]
    Private,
    #[token("public")]
    Public,
    #[token("def")]
    Def,
    #[token("data")]
    Data,
    #[token("attribute")]
    Attribute,
    #[token("port")]
    Port,
    #[token("part")]
    Part,
    #[token("in")]
    In,
    #[token("out")]
    Out,
    #[token("connect")]
    Connect,
    #[token("to")]
    To,
    #[token("requirement")]
    Requirement,
    #[token("metric")]
    Metric,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // === Delimiters and operators ===
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token(".")]
    Dot,
    #[token("=")]
    Eq,
    #[token("*")]
    Star,
    #[token("-")]
    Minus,

    // === Literals ===
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Real(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    /// `doc /* ... */`
    #[regex(r"doc[ \t\r\n]*/\*([^*]|\*+[^*/])*\*+/", |lex| doc_text(lex.slice()))]
    Doc(String),

    /// `comment Id /* ... */`, a requirement written as a named comment.
    #[regex(
        r"comment[ \t\r\n]+[a-zA-Z_][a-zA-Z0-9_]*[ \t\r\n]*/\*([^*]|\*+[^*/])*\*+/",
        |lex| comment_block(lex.slice())
    )]
    Comment((String, String)),
}

impl Token {
    /// Spelling of a keyword token.
    pub fn keyword(&self) -> Option<&'static str> {
        let kw = match self {
            Token::Package => "package",
            Token::Import => "import",
            Token::Private => "private",
            Token::Public => "public",
            Token::Def => "def",
            Token::Data => "data",
            Token::Attribute => "attribute",
            Token::Port => "port",
            Token::Part => "part",
            Token::In => "in",
            Token::Out => "out",
            Token::Connect => "connect",
            Token::To => "to",
            Token::Requirement => "requirement",
            Token::Metric => "metric",
            Token::True => "true",
            Token::False => "false",
            _ => return None,
        };
        Some(kw)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kw) = self.keyword() {
            return write!(f, "'{kw}'");
        }
        let text = match self {
            Token::Integer(n) => return write!(f, "{n}"),
            Token::Real(x) => return write!(f, "{x}"),
            Token::Str(s) => return write!(f, "\"{s}\""),
            Token::Ident(id) => return write!(f, "'{id}'"),
            Token::Doc(_) => "doc comment",
            Token::Comment(_) => "comment block",
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::Semi => "';'",
            Token::Comma => "','",
            Token::Colon => "':'",
            Token::ColonColon => "'::'",
            Token::Dot => "'.'",
            Token::Eq => "'='",
            Token::Star => "'*'",
            Token::Minus => "'-'",
            _ => "keyword",
        };
        f.write_str(text)
    }
}

/// Tokenize `source`, pairing each token with its byte span.
///
/// Stops at the first character sequence that is not a valid token and
/// returns its span.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Range<usize>)>, Range<usize>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => return Err(lexer.span()),
        }
    }
    Ok(tokens)
}

fn doc_text(slice: &str) -> String {
    let start = slice.find("/*").map_or(0, |i| i + 2);
    let end = slice.rfind("*/").unwrap_or(slice.len());
    if start >= end {
        return String::new();
    }
    slice[start..end]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn comment_block(slice: &str) -> (String, String) {
    let rest = slice.trim_start_matches("comment").trim_start();
    let split = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let (identifier, body) = rest.split_at(split);
    (identifier.to_string(), doc_text(body))
}

fn unescape(slice: &str) -> Option<String> {
    let inner = slice.get(1..slice.len().saturating_sub(1))?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            _ => return None,
        }
    }
    Some(out)
}
