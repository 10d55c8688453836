mod cursor;
mod error;
pub mod formatter;
mod token;

use compact_str::CompactString;
use cursor::SourceChar;
pub use error::{LexicalError, LexicalErrorKind};
use std::{ops::Range, rc::Rc, str::Chars};
use token::{KEYWORD_HASHMAP, TWO_CHARACTER_OPERATOR_HASHMAP};
pub use token::{Span, Token, TokenKind};

#[derive(Debug, Clone)]
pub struct LineBreaks {
    line_breaks: Rc<[Range<usize>]>,
}

impl LineBreaks {
    pub fn new(text: &str) -> Self {
        let line_breaks = if !text.is_empty() {
            let mut line_breaks = Vec::new();
            let mut cursor = 0;
            for (offset, byte) in text.bytes().enumerate() {
                let offset = offset + 1;
                if byte == b'\n' {
                    line_breaks.push(cursor..offset);
                    cursor = offset;
                }
            }
            if !text.ends_with('\n') {
                line_breaks.push(cursor..(text.len() + 1));
            }
            line_breaks
        } else {
            vec![0..1]
        };
        Self {
            line_breaks: line_breaks.into(),
        }
    }

    pub fn get_max_line(&self) -> u32 {
        (self.line_breaks.len() + 1) as u32
    }

    pub fn get_line(&self, offset: usize) -> u32 {
        self.line_breaks
            .binary_search_by(|r| {
                if offset < r.start {
                    std::cmp::Ordering::Greater
                } else if offset >= r.end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .map(|v| (v + 1) as u32)
            .unwrap_or(self.get_max_line())
    }

    pub fn get_line_from_span(&self, span: Span) -> u32 {
        self.get_line(span.start as usize)
    }
}

#[derive(Debug)]
enum LookAhead {
    None,
    Single(SourceChar),
    Double(SourceChar, SourceChar),
}

/// What the lexer emitted last, for the newline folding rule.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Separator {
    StartOfFile,
    Newline,
    Semicolon,
    Token,
}

#[derive(Debug)]
pub struct Lexer<'src> {
    source: &'src str,
    chars: Chars<'src>,
    lookahead: LookAhead,
    offset: usize,
    line: u32,
    col: u32,
    last: Separator,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars(),
            lookahead: LookAhead::None,
            offset: 0,
            line: 1,
            col: 1,
            last: Separator::StartOfFile,
        }
    }

    fn next_char(&mut self) -> Option<SourceChar> {
        match self.lookahead {
            LookAhead::None => {
                let c = self.chars.next()?;
                let current = SourceChar {
                    value: c,
                    offset: self.offset,
                    line: self.line,
                    col: self.col,
                };
                self.offset += c.len_utf8();
                if c == '\n' {
                    self.line += 1;
                    self.col = 1;
                } else {
                    self.col += 1;
                }
                Some(current)
            }
            LookAhead::Single(lookahead) => {
                self.lookahead = LookAhead::None;
                Some(lookahead)
            }
            LookAhead::Double(first, second) => {
                self.lookahead = LookAhead::Single(second);
                Some(first)
            }
        }
    }

    fn peek_char(&mut self) -> Option<SourceChar> {
        let c = self.next_char()?;
        self.put_back_char(c);
        Some(c)
    }

    fn put_back_char(&mut self, c: SourceChar) {
        self.lookahead = match self.lookahead {
            LookAhead::None => LookAhead::Single(c),
            LookAhead::Single(next) => LookAhead::Double(c, next),
            LookAhead::Double(..) => {
                unreachable!("the lexer never looks more than two characters ahead")
            }
        };
    }

    fn put_back_two_chars(&mut self, first: SourceChar, second: SourceChar) {
        self.put_back_char(second);
        self.put_back_char(first);
    }

    fn emit(&mut self, kind: TokenKind, start: SourceChar, end: usize) -> Token {
        let lexeme = CompactString::from(&self.source[start.offset..end]);
        self.emit_lexeme(kind, lexeme, start, end)
    }

    fn emit_lexeme(
        &mut self,
        kind: TokenKind,
        lexeme: CompactString,
        start: SourceChar,
        end: usize,
    ) -> Token {
        self.last = match kind {
            TokenKind::Newline => Separator::Newline,
            _ => Separator::Token,
        };
        Token {
            kind,
            lexeme,
            span: Span::new(start.offset, end),
            line: start.line,
            col: start.col,
        }
    }

    fn error(&self, kind: LexicalErrorKind, start: SourceChar, end: usize) -> LexicalError {
        LexicalError {
            kind,
            span: Span::new(start.offset, end),
            line: start.line,
            col: start.col,
        }
    }

    /// Produces the next token. Once the input is exhausted this keeps returning `EOF`.
    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        loop {
            let Some(c) = self.next_char() else {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    lexeme: CompactString::default(),
                    span: Span::new(self.source.len(), self.source.len()),
                    line: self.line,
                    col: self.col,
                });
            };

            let just = |lexer: &mut Self, kind: TokenKind| -> Result<Token, LexicalError> {
                Ok(lexer.emit(kind, c, c.next_offset()))
            };

            return match c.value {
                '\n' => match self.last {
                    Separator::StartOfFile | Separator::Newline | Separator::Semicolon => continue,
                    Separator::Token => just(self, TokenKind::Newline),
                },
                ';' => {
                    self.last = Separator::Semicolon;
                    continue;
                }
                v if v.is_whitespace() => continue,
                // Single character tokens
                '(' => just(self, TokenKind::LeftParenthesis),
                ')' => just(self, TokenKind::RightParenthesis),
                '[' => just(self, TokenKind::LeftBracket),
                ']' => just(self, TokenKind::RightBracket),
                '{' => just(self, TokenKind::LeftBrace),
                '}' => just(self, TokenKind::RightBrace),
                ',' => just(self, TokenKind::Comma),
                '?' => just(self, TokenKind::Question),
                // Comments
                '/' if self.peek_char().is_some_and(|n| n.value == '/') => {
                    self.skip_line_comment();
                    continue;
                }
                '/' if self.peek_char().is_some_and(|n| n.value == '*') => {
                    self.skip_block_comment(c)?;
                    continue;
                }
                '&' if self.peek_char().is_some_and(|n| n.value == '&') => {
                    self.skip_line_comment();
                    continue;
                }
                // One or two character operators
                ':' => Ok(self.lex_operator(c, TokenKind::Colon)),
                '+' => Ok(self.lex_operator(c, TokenKind::Plus)),
                '-' => Ok(self.lex_operator(c, TokenKind::Minus)),
                '*' => Ok(self.lex_operator(c, TokenKind::Star)),
                '/' => Ok(self.lex_operator(c, TokenKind::Slash)),
                '=' => Ok(self.lex_operator(c, TokenKind::Equal)),
                '!' => Ok(self.lex_operator(c, TokenKind::Bang)),
                '<' => Ok(self.lex_operator(c, TokenKind::LessThan)),
                '>' => Ok(self.lex_operator(c, TokenKind::GreaterThan)),
                '.' => Ok(self.lex_dot(c)),
                '\'' | '"' | '`' => self.lex_string(c),
                '0'..='9' => Ok(self.lex_number(c)),
                'a'..='z' | 'A'..='Z' | '_' => Ok(self.lex_ident_or_keyword(c)),
                v => Err(self.error(LexicalErrorKind::Unrecognized(v), c, c.next_offset())),
            };
        }
    }

    fn lex_operator(&mut self, first: SourceChar, single: TokenKind) -> Token {
        if let Some(second) = self.next_char() {
            if let Some(kind) = TWO_CHARACTER_OPERATOR_HASHMAP
                .get(&(first.value, second.value))
                .copied()
            {
                return self.emit(kind, first, second.next_offset());
            }
            self.put_back_char(second);
        }
        self.emit(single, first, first.next_offset())
    }

    /// `.T.` and `.F.` in any case are boolean literals, anything else leaves a lone `DOT`.
    fn lex_dot(&mut self, dot: SourceChar) -> Token {
        let Some(letter) = self.next_char() else {
            return self.emit(TokenKind::Dot, dot, dot.next_offset());
        };
        let kind = match letter.value {
            't' | 'T' => TokenKind::True,
            'f' | 'F' => TokenKind::False,
            _ => {
                self.put_back_char(letter);
                return self.emit(TokenKind::Dot, dot, dot.next_offset());
            }
        };
        match self.next_char() {
            Some(closing) if closing.value == '.' => self.emit(kind, dot, closing.next_offset()),
            Some(other) => {
                self.put_back_two_chars(letter, other);
                self.emit(TokenKind::Dot, dot, dot.next_offset())
            }
            None => {
                self.put_back_char(letter);
                self.emit(TokenKind::Dot, dot, dot.next_offset())
            }
        }
    }

    fn lex_number(&mut self, first: SourceChar) -> Token {
        let mut end = self.consume_digits(first.next_offset());
        if let Some(dot) = self.next_char() {
            if dot.value != '.' {
                self.put_back_char(dot);
            } else {
                match self.next_char() {
                    Some(digit) if digit.value.is_ascii_digit() => {
                        end = self.consume_digits(digit.next_offset());
                    }
                    Some(other) => self.put_back_two_chars(dot, other),
                    None => self.put_back_char(dot),
                }
            }
        }
        self.emit(TokenKind::NumericLiteral, first, end)
    }

    fn consume_digits(&mut self, mut end: usize) -> usize {
        while let Some(c) = self.next_char() {
            if !c.value.is_ascii_digit() {
                self.put_back_char(c);
                break;
            }
            end = c.next_offset();
        }
        end
    }

    fn lex_string(&mut self, quote: SourceChar) -> Result<Token, LexicalError> {
        while let Some(c) = self.next_char() {
            if c.value == quote.value {
                return Ok(self.emit(TokenKind::StringLiteral, quote, c.next_offset()));
            }
        }
        Err(self.error(LexicalErrorKind::UnclosedString, quote, self.source.len()))
    }

    fn lex_ident_or_keyword(&mut self, first: SourceChar) -> Token {
        let mut end = first.next_offset();
        while let Some(c) = self.next_char() {
            if !(c.value.is_ascii_alphanumeric() || c.value == '_') {
                self.put_back_char(c);
                break;
            }
            end = c.next_offset();
        }
        let word = CompactString::from(self.source[first.offset..end].to_lowercase());
        let kind = KEYWORD_HASHMAP
            .get(word.as_str())
            .copied()
            .unwrap_or(TokenKind::Ident);
        self.emit_lexeme(kind, word, first, end)
    }

    /// Stops before the line break so it still takes part in newline folding.
    fn skip_line_comment(&mut self) {
        while let Some(c) = self.next_char() {
            if c.value == '\n' {
                self.put_back_char(c);
                break;
            }
        }
    }

    fn skip_block_comment(&mut self, start: SourceChar) -> Result<(), LexicalError> {
        // Opening star
        let _ = self.next_char();
        let mut previous = None;
        while let Some(c) = self.next_char() {
            if previous == Some('*') && c.value == '/' {
                return Ok(());
            }
            previous = Some(c.value);
        }
        Err(self.error(LexicalErrorKind::UnclosedComment, start, self.source.len()))
    }
}
