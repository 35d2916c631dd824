//! Block structure recovery.
//!
//! Turns the flat token stream into a tree of lines and blocks. Explicit
//! braces and indentation both open blocks: a statement that is the last on
//! its line becomes a block header when the next line is indented deeper.

use super::error::SyntaxError;
use super::lexer::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Line {
        text: String,
        line: usize,
    },
    Comment {
        text: String,
        line: usize,
    },
    Block {
        header: String,
        line: usize,
        children: Vec<Node>,
    },
}

struct Frame {
    header: String,
    line: usize,
    children: Vec<Node>,
    /// Indentation of the children for indentation-delimited blocks.
    implicit: Option<usize>,
    /// Indentation of the last child if it could still become a header.
    candidate: Option<usize>,
}

impl Frame {
    fn new(header: String, line: usize, implicit: Option<usize>) -> Self {
        Self {
            header,
            line,
            children: Vec::new(),
            implicit,
            candidate: None,
        }
    }

    fn into_node(self) -> Node {
        Node::Block {
            header: self.header,
            line: self.line,
            children: self.children,
        }
    }
}

/// Build the node tree from tokens.
pub fn build(tokens: Vec<Token>) -> Result<Vec<Node>, SyntaxError> {
    let mut builder = Builder {
        root: Frame::new(String::new(), 0, None),
        open: Vec::new(),
    };

    for token in tokens {
        if token.line_start {
            builder.close_dedented(token.indent);
        }

        match token.kind {
            TokenKind::Text(text) => {
                builder.open_implicit(token.line_start, token.indent);
                let top = builder.top();
                top.children.push(Node::Line {
                    text,
                    line: token.line,
                });
                top.candidate = token.line_start.then_some(token.indent);
            }
            TokenKind::Comment(text) => {
                builder.open_implicit(token.line_start, token.indent);
                let top = builder.top();
                top.children.push(Node::Comment {
                    text,
                    line: token.line,
                });
                top.candidate = None;
            }
            TokenKind::Open(header) => {
                if header.is_empty() {
                    return Err(SyntaxError::new(token.line, "block without a selector"));
                }
                builder.open_implicit(token.line_start, token.indent);
                builder.top().candidate = None;
                builder.open.push(Frame::new(header, token.line, None));
            }
            TokenKind::Close => {
                builder.close_implicit();
                if builder.open.is_empty() {
                    return Err(SyntaxError::new(token.line, "unexpected `}`"));
                }
                builder.pop();
            }
        }
    }

    builder.close_implicit();
    if let Some(frame) = builder.open.last() {
        return Err(SyntaxError::new(frame.line, "unclosed block, missing `}`"));
    }

    Ok(builder.root.children)
}

struct Builder {
    root: Frame,
    /// Blocks still being filled, innermost last.
    open: Vec<Frame>,
}

impl Builder {
    fn top(&mut self) -> &mut Frame {
        self.open.last_mut().unwrap_or(&mut self.root)
    }

    /// Attach the innermost open block to its parent.
    fn pop(&mut self) {
        if let Some(frame) = self.open.pop() {
            let parent = self.top();
            parent.children.push(frame.into_node());
            parent.candidate = None;
        }
    }

    fn close_implicit(&mut self) {
        while self.open.last().is_some_and(|f| f.implicit.is_some()) {
            self.pop();
        }
    }

    /// Close indentation blocks whose children are indented deeper than `indent`.
    fn close_dedented(&mut self, indent: usize) {
        while self
            .open
            .last()
            .and_then(|f| f.implicit)
            .is_some_and(|child_indent| indent < child_indent)
        {
            self.pop();
        }
    }

    /// Turn the previous line into a block header if this token is indented under it.
    fn open_implicit(&mut self, line_start: bool, indent: usize) {
        let top = self.top();
        let Some(header_indent) = top.candidate else {
            return;
        };
        if !line_start || indent <= header_indent {
            return;
        }
        if let Some(Node::Line { text, line }) = top.children.pop() {
            top.candidate = None;
            self.open.push(Frame::new(text, line, Some(indent)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::tokenize;

    fn tree(source: &str) -> Vec<Node> {
        build(tokenize(source).unwrap()).unwrap()
    }

    fn line(text: &str, line: usize) -> Node {
        Node::Line {
            text: text.into(),
            line,
        }
    }

    fn block(header: &str, line: usize, children: Vec<Node>) -> Node {
        Node::Block {
            header: header.into(),
            line,
            children,
        }
    }

    #[test]
    fn test_indented_blocks() {
        assert_eq!(
            tree("a\n  color red\n  b\n    color blue\nc\n  margin 0"),
            vec![
                block(
                    "a",
                    1,
                    vec![
                        line("color red", 2),
                        block("b", 3, vec![line("color blue", 4)]),
                    ]
                ),
                block("c", 5, vec![line("margin 0", 6)]),
            ]
        );
    }

    #[test]
    fn test_brace_blocks() {
        assert_eq!(
            tree("a{color:red}\nb{color:blue}"),
            vec![
                block("a", 1, vec![line("color:red", 1)]),
                block("b", 2, vec![line("color:blue", 2)]),
            ]
        );
    }

    #[test]
    fn test_mixed_syntax() {
        assert_eq!(
            tree("a {\n  color red\n  b\n    color blue\n}\nc\n  margin 0"),
            vec![
                block(
                    "a",
                    1,
                    vec![
                        line("color red", 2),
                        block("b", 3, vec![line("color blue", 4)]),
                    ]
                ),
                block("c", 6, vec![line("margin 0", 7)]),
            ]
        );
    }

    #[test]
    fn test_indented_brace_block() {
        assert_eq!(
            tree("a\n  b {\n    color red\n  }\n  margin 0"),
            vec![block(
                "a",
                1,
                vec![
                    block("b", 2, vec![line("color red", 3)]),
                    line("margin 0", 5)
                ]
            )]
        );
    }

    #[test]
    fn test_semicolon_line_is_not_header() {
        assert_eq!(
            tree("a{color:red}\n  b{color:blue}"),
            vec![
                block("a", 1, vec![line("color:red", 1)]),
                block("b", 2, vec![line("color:blue", 2)]),
            ]
        );
    }

    #[test]
    fn test_unexpected_close() {
        let err = build(tokenize("a{color:red}}").unwrap()).unwrap_err();
        assert!(err.message.contains("unexpected"));
    }

    #[test]
    fn test_unclosed_block() {
        let err = build(tokenize("a {\n  color red\n").unwrap()).unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("unclosed block"));
    }

    #[test]
    fn test_block_without_selector() {
        let err = build(tokenize("{color:red}").unwrap()).unwrap_err();
        assert!(err.message.contains("without a selector"));
    }
}
