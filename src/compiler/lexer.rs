//! Statement tokenizer.
//!
//! Splits source text into statements, block delimiters and block comments.
//! A statement ends at a newline, a `;` or a brace. Newlines inside
//! parentheses, or after a trailing `,`, continue the current statement.
//! `//` line comments are dropped here.

use super::error::SyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A statement, trimmed, with whitespace runs collapsed to one space.
    Text(String),
    /// A block comment including its `/*` `*/` delimiters.
    Comment(String),
    /// `{`, carrying the statement in front of it as the block header.
    Open(String),
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    /// Indentation of the physical line the token starts on.
    pub indent: usize,
    /// Whether this is the first token on its physical line.
    pub line_start: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Newline,
    Semicolon,
    Other,
}

/// Tokenize style-language source.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
    line: usize,
    indent: usize,
    at_line_begin: bool,
    line_has_token: bool,
    cur: String,
    cur_line: usize,
    cur_indent: usize,
    cur_line_start: bool,
    depth: usize,
    depth_line: usize,
    last_terminator: Terminator,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
            line: 1,
            indent: 0,
            at_line_begin: true,
            line_has_token: false,
            cur: String::new(),
            cur_line: 1,
            cur_indent: 0,
            cur_line_start: true,
            depth: 0,
            depth_line: 0,
            last_terminator: Terminator::Other,
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        while self.pos < self.chars.len() {
            if self.at_line_begin {
                self.measure_indent();
                continue;
            }

            let c = self.chars[self.pos];
            match c {
                '\r' => self.pos += 1,
                '\n' => {
                    self.newline();
                    self.pos += 1;
                }
                '"' | '\'' => self.string(c)?,
                '/' if self.peek(1) == Some('/') && self.line_comment_allowed() => {
                    while self.pos < self.chars.len() && self.chars[self.pos] != '\n' {
                        self.pos += 1;
                    }
                }
                '/' if self.peek(1) == Some('*') => self.block_comment()?,
                '(' | '[' => {
                    if self.depth == 0 {
                        self.depth_line = self.line;
                    }
                    self.depth += 1;
                    self.push(c);
                    self.pos += 1;
                }
                ')' | ']' => {
                    if self.depth == 0 {
                        return Err(SyntaxError::new(self.line, format!("unmatched `{c}`")));
                    }
                    self.depth -= 1;
                    self.push(c);
                    self.pos += 1;
                }
                ';' if self.depth == 0 => {
                    self.flush(Terminator::Semicolon);
                    self.pos += 1;
                }
                '{' if self.depth == 0 => {
                    self.open();
                    self.pos += 1;
                }
                '}' if self.depth == 0 => {
                    self.flush(Terminator::Other);
                    self.emit(TokenKind::Close, self.line, self.indent);
                    self.pos += 1;
                }
                _ => {
                    self.push(c);
                    self.pos += 1;
                }
            }
        }

        if self.depth > 0 {
            return Err(SyntaxError::new(self.depth_line, "unclosed `(`"));
        }
        self.flush(Terminator::Newline);
        Ok(self.tokens)
    }

    fn measure_indent(&mut self) {
        let mut width = 0;
        while matches!(self.peek(0), Some(' ' | '\t')) {
            width += 1;
            self.pos += 1;
        }
        self.indent = width;
        self.at_line_begin = false;
    }

    fn line_comment_allowed(&self) -> bool {
        self.depth == 0 && (self.cur.is_empty() || self.cur.ends_with(' '))
    }

    fn newline(&mut self) {
        let continues = self.depth > 0 || self.cur.trim_end().ends_with(',');
        if continues {
            self.push(' ');
        } else {
            self.flush(Terminator::Newline);
        }
        self.line += 1;
        self.at_line_begin = true;
        self.line_has_token = false;
    }

    /// Record where the current statement starts.
    fn begin(&mut self) {
        if self.cur.is_empty() {
            self.cur_line = self.line;
            self.cur_indent = self.indent;
            self.cur_line_start = !self.line_has_token;
        }
    }

    fn push(&mut self, c: char) {
        if c.is_whitespace() {
            if !self.cur.is_empty() && !self.cur.ends_with(' ') {
                self.cur.push(' ');
            }
            return;
        }
        self.begin();
        self.cur.push(c);
    }

    fn string(&mut self, quote: char) -> Result<(), SyntaxError> {
        let start = self.line;
        self.begin();
        self.cur.push(quote);
        self.pos += 1;
        loop {
            let Some(c) = self.peek(0) else {
                return Err(SyntaxError::new(start, "unterminated string"));
            };
            match c {
                '\n' => return Err(SyntaxError::new(start, "unterminated string")),
                '\\' => {
                    self.cur.push(c);
                    if let Some(next) = self.peek(1) {
                        if next == '\n' {
                            self.line += 1;
                        }
                        self.cur.push(next);
                        self.pos += 1;
                    }
                }
                _ => {
                    self.cur.push(c);
                    if c == quote {
                        self.pos += 1;
                        return Ok(());
                    }
                }
            }
            self.pos += 1;
        }
    }

    fn block_comment(&mut self) -> Result<(), SyntaxError> {
        let start_line = self.line;
        let start_indent = self.indent;
        let begin = self.pos;
        self.pos += 2;
        loop {
            match self.peek(0) {
                None => return Err(SyntaxError::new(start_line, "unterminated comment")),
                Some('*') if self.peek(1) == Some('/') => {
                    self.pos += 2;
                    break;
                }
                Some('\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }

        if self.cur.is_empty() {
            let text: String = self.chars[begin..self.pos].iter().collect();
            self.emit(TokenKind::Comment(text), start_line, start_indent);
        } else {
            // Inside a statement the comment only separates tokens.
            self.push(' ');
        }
        Ok(())
    }

    fn open(&mut self) {
        let header = self.cur.trim_end().to_string();
        if !header.is_empty() {
            let (line, indent, line_start) = (self.cur_line, self.cur_indent, self.cur_line_start);
            self.cur.clear();
            self.push_token(TokenKind::Open(header), line, indent, line_start);
            return;
        }

        // Brace on its own line: the previous newline-terminated statement is the header.
        if self.last_terminator == Terminator::Newline
            && matches!(
                self.tokens.last(),
                Some(Token {
                    kind: TokenKind::Text(_),
                    ..
                })
            )
            && let Some(Token {
                kind: TokenKind::Text(text),
                line,
                indent,
                line_start,
            }) = self.tokens.pop()
        {
            self.push_token(TokenKind::Open(text), line, indent, line_start);
            return;
        }

        self.emit(TokenKind::Open(String::new()), self.line, self.indent);
    }

    fn flush(&mut self, terminator: Terminator) {
        let text = self.cur.trim_end().to_string();
        self.cur.clear();
        if text.is_empty() {
            return;
        }
        let (line, indent, line_start) = (self.cur_line, self.cur_indent, self.cur_line_start);
        self.push_token(TokenKind::Text(text), line, indent, line_start);
        self.last_terminator = terminator;
    }

    fn emit(&mut self, kind: TokenKind, line: usize, indent: usize) {
        let line_start = !self.line_has_token;
        self.push_token(kind, line, indent, line_start);
    }

    fn push_token(&mut self, kind: TokenKind, line: usize, indent: usize, line_start: bool) {
        self.tokens.push(Token {
            kind,
            line,
            indent,
            line_start,
        });
        self.line_has_token = true;
        self.last_terminator = Terminator::Other;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn text(s: &str) -> TokenKind {
        TokenKind::Text(s.into())
    }

    #[test]
    fn test_brace_syntax() {
        assert_eq!(
            kinds("a{color:red}\nb { color: blue; }"),
            vec![
                TokenKind::Open("a".into()),
                text("color:red"),
                TokenKind::Close,
                TokenKind::Open("b".into()),
                text("color: blue"),
                TokenKind::Close,
            ]
        );
    }

    #[test]
    fn test_line_comment_dropped() {
        assert_eq!(
            kinds("a{color:red}\n// comment\nb{color:blue}"),
            vec![
                TokenKind::Open("a".into()),
                text("color:red"),
                TokenKind::Close,
                TokenKind::Open("b".into()),
                text("color:blue"),
                TokenKind::Close,
            ]
        );
    }

    #[test]
    fn test_url_double_slash_kept() {
        assert_eq!(
            kinds("background url(http://x.org/a.png) // trailing"),
            vec![text("background url(http://x.org/a.png)")]
        );
    }

    #[test]
    fn test_indentation_positions() {
        let tokens = tokenize("a\n  color red\n  b\n    color blue").unwrap();
        let indents: Vec<_> = tokens.iter().map(|t| (t.indent, t.line)).collect();
        assert_eq!(indents, vec![(0, 1), (2, 2), (2, 3), (4, 4)]);
        assert!(tokens.iter().all(|t| t.line_start));
    }

    #[test]
    fn test_selector_continuation() {
        assert_eq!(kinds("a,\nb\n  color red"), vec![text("a, b"), text("color red")]);
    }

    #[test]
    fn test_paren_continuation() {
        assert_eq!(
            kinds("box-shadow rgba(0,\n  0, 0, .5) 0 1px"),
            vec![text("box-shadow rgba(0, 0, 0, .5) 0 1px")]
        );
    }

    #[test]
    fn test_block_comment_token() {
        assert_eq!(
            kinds("/*! keep */\na\n  color /* gone */ red"),
            vec![
                TokenKind::Comment("/*! keep */".into()),
                text("a"),
                text("color red"),
            ]
        );
    }

    #[test]
    fn test_brace_on_own_line() {
        assert_eq!(
            kinds("a\n{\n  color red\n}"),
            vec![TokenKind::Open("a".into()), text("color red"), TokenKind::Close]
        );
    }

    #[test]
    fn test_string_keeps_special_chars() {
        assert_eq!(
            kinds("content \"a;b{c}\""),
            vec![text("content \"a;b{c}\"")]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("a\n  content \"oops\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("/* never closed").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_unmatched_paren() {
        assert!(tokenize("width foo)").is_err());
        assert!(tokenize("width foo(").is_err());
    }
}
