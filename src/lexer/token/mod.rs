use compact_str::CompactString;
use std::collections::HashMap;
use std::fmt::Display;
use std::ops::Range;
use std::sync::LazyLock;

/// The hashmap for keywords. Keys are lower case because identifiers are folded before lookup.
pub static KEYWORD_HASHMAP: LazyLock<HashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("and", TokenKind::KeywordAnd);
    map.insert("as", TokenKind::KeywordAs);
    map.insert("case", TokenKind::KeywordCase);
    map.insert("do", TokenKind::KeywordDo);
    map.insert("else", TokenKind::KeywordElse);
    map.insert("endcase", TokenKind::KeywordEndCase);
    map.insert("enddo", TokenKind::KeywordEndDo);
    map.insert("endfunc", TokenKind::KeywordEndFunc);
    map.insert("endif", TokenKind::KeywordEndIf);
    map.insert("exit", TokenKind::KeywordExit);
    map.insert("false", TokenKind::False);
    map.insert("function", TokenKind::KeywordFunction);
    map.insert("if", TokenKind::KeywordIf);
    map.insert("iif", TokenKind::KeywordIif);
    map.insert("local", TokenKind::KeywordLocal);
    map.insert("loop", TokenKind::KeywordLoop);
    map.insert("null", TokenKind::KeywordNull);
    map.insert("or", TokenKind::KeywordOr);
    map.insert("otherwise", TokenKind::KeywordOtherwise);
    map.insert("private", TokenKind::KeywordPrivate);
    map.insert("public", TokenKind::KeywordPublic);
    map.insert("return", TokenKind::KeywordReturn);
    map.insert("then", TokenKind::KeywordThen);
    map.insert("true", TokenKind::True);
    map.insert("while", TokenKind::KeywordWhile);
    map
});

/// Operators made of two characters, merged from a single character of lookahead.
pub static TWO_CHARACTER_OPERATOR_HASHMAP: LazyLock<HashMap<(char, char), TokenKind>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();
        map.insert((':', '='), TokenKind::ColonEqual);
        map.insert(('+', '='), TokenKind::PlusEqual);
        map.insert(('-', '='), TokenKind::MinusEqual);
        map.insert(('*', '='), TokenKind::StarEqual);
        map.insert(('/', '='), TokenKind::SlashEqual);
        map.insert(('=', '='), TokenKind::EqualEqual);
        map.insert(('!', '='), TokenKind::BangEqual);
        map.insert(('<', '='), TokenKind::LessThanEqual);
        map.insert(('>', '='), TokenKind::GreaterThanEqual);
        map
    });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// The byte position of the start of the token.
    pub start: u32,
    /// The length of the token in bytes.
    pub length: u32,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            length: end.saturating_sub(start) as u32,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }

    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    pub fn merge(&self, other: &Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Span {
            start,
            length: end - start,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Parentheses
    LeftParenthesis,
    RightParenthesis,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    // Miscellaneous
    Comma,
    Dot,
    Colon,
    Question,
    Newline,
    // Operators
    Minus,
    Plus,
    Star,
    Slash,
    Bang,
    Equal,
    ColonEqual,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    EqualEqual,
    BangEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,

    // Literals
    NumericLiteral,
    StringLiteral,
    True,
    False,
    Ident,

    // Keywords
    KeywordAnd,
    KeywordAs,
    KeywordCase,
    KeywordDo,
    KeywordElse,
    KeywordEndCase,
    KeywordEndDo,
    KeywordEndFunc,
    KeywordEndIf,
    KeywordExit,
    KeywordFunction,
    KeywordIf,
    KeywordIif,
    KeywordLocal,
    KeywordLoop,
    KeywordNull,
    KeywordOr,
    KeywordOtherwise,
    KeywordPrivate,
    KeywordPublic,
    KeywordReturn,
    KeywordThen,
    KeywordWhile,

    // End of file.
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::LeftParenthesis => write!(f, "LEFT_PAREN"),
            TokenKind::RightParenthesis => write!(f, "RIGHT_PAREN"),
            TokenKind::LeftBracket => write!(f, "LEFT_BRACKET"),
            TokenKind::RightBracket => write!(f, "RIGHT_BRACKET"),
            TokenKind::LeftBrace => write!(f, "LEFT_BRACE"),
            TokenKind::RightBrace => write!(f, "RIGHT_BRACE"),
            TokenKind::Comma => write!(f, "COMMA"),
            TokenKind::Dot => write!(f, "DOT"),
            TokenKind::Colon => write!(f, "COLON"),
            TokenKind::Question => write!(f, "QUESTION"),
            TokenKind::Newline => write!(f, "NEWLINE"),
            TokenKind::Minus => write!(f, "MINUS"),
            TokenKind::Plus => write!(f, "PLUS"),
            TokenKind::Star => write!(f, "STAR"),
            TokenKind::Slash => write!(f, "SLASH"),
            TokenKind::Bang => write!(f, "BANG"),
            TokenKind::Equal => write!(f, "EQUAL"),
            TokenKind::ColonEqual => write!(f, "COLON_EQUAL"),
            TokenKind::PlusEqual => write!(f, "PLUS_EQUAL"),
            TokenKind::MinusEqual => write!(f, "MINUS_EQUAL"),
            TokenKind::StarEqual => write!(f, "STAR_EQUAL"),
            TokenKind::SlashEqual => write!(f, "SLASH_EQUAL"),
            TokenKind::EqualEqual => write!(f, "EQUAL_EQUAL"),
            TokenKind::BangEqual => write!(f, "BANG_EQUAL"),
            TokenKind::LessThan => write!(f, "LESS"),
            TokenKind::LessThanEqual => write!(f, "LESS_EQUAL"),
            TokenKind::GreaterThan => write!(f, "GREATER"),
            TokenKind::GreaterThanEqual => write!(f, "GREATER_EQUAL"),
            TokenKind::NumericLiteral => write!(f, "NUMBER"),
            TokenKind::StringLiteral => write!(f, "STRING"),
            TokenKind::True => write!(f, "TRUE"),
            TokenKind::False => write!(f, "FALSE"),
            TokenKind::Ident => write!(f, "IDENTIFIER"),
            TokenKind::KeywordAnd => write!(f, "AND"),
            TokenKind::KeywordAs => write!(f, "AS"),
            TokenKind::KeywordCase => write!(f, "CASE"),
            TokenKind::KeywordDo => write!(f, "DO"),
            TokenKind::KeywordElse => write!(f, "ELSE"),
            TokenKind::KeywordEndCase => write!(f, "ENDCASE"),
            TokenKind::KeywordEndDo => write!(f, "ENDDO"),
            TokenKind::KeywordEndFunc => write!(f, "ENDFUNC"),
            TokenKind::KeywordEndIf => write!(f, "ENDIF"),
            TokenKind::KeywordExit => write!(f, "EXIT"),
            TokenKind::KeywordFunction => write!(f, "FUNCTION"),
            TokenKind::KeywordIf => write!(f, "IF"),
            TokenKind::KeywordIif => write!(f, "IIF"),
            TokenKind::KeywordLocal => write!(f, "LOCAL"),
            TokenKind::KeywordLoop => write!(f, "LOOP"),
            TokenKind::KeywordNull => write!(f, "NULL"),
            TokenKind::KeywordOr => write!(f, "OR"),
            TokenKind::KeywordOtherwise => write!(f, "OTHERWISE"),
            TokenKind::KeywordPrivate => write!(f, "PRIVATE"),
            TokenKind::KeywordPublic => write!(f, "PUBLIC"),
            TokenKind::KeywordReturn => write!(f, "RETURN"),
            TokenKind::KeywordThen => write!(f, "THEN"),
            TokenKind::KeywordWhile => write!(f, "WHILE"),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token. Identifiers and keywords are folded to lower case.
    pub lexeme: CompactString,
    pub span: Span,
    pub line: u32,
    pub col: u32,
}
