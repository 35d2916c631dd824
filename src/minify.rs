//! CSS minification.
//!
//! Drops whitespace and comments that are insignificant to CSS parsing.
//! Rules, selectors and values are copied as written; nothing is merged,
//! reordered or reformatted.

use std::fmt;
use std::str::FromStr;

use cssparser::{ParseError, Parser, ParserInput, Token};
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use serde::{Deserialize, Serialize};

/// Which `/*! ... */` comments survive minification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialComments {
    /// Strip every comment.
    #[default]
    None,
    First,
    All,
}

impl FromStr for SpecialComments {
    type Err = String;

    /// Accepts the count form `0`, `1`, `2` or `*`, and the names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" | "none" => Ok(Self::None),
            "1" | "first" => Ok(Self::First),
            "2" | "*" | "all" => Ok(Self::All),
            other => Err(format!(
                "invalid special comment policy `{other}`, expected 0, 1, 2 or \"*\""
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifyError {
    /// Name of the stylesheet being minified.
    pub name: String,
    /// 1-based line, `0` when unknown.
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl fmt::Display for MinifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.name, self.line, self.column, self.message)
    }
}

impl std::error::Error for MinifyError {}

/// Minify `css`, keeping special comments per `keep`.
///
/// lightningcss parses the input first so malformed CSS is reported. The
/// output is then produced from the source tokens, with whitespace and
/// comments reduced to the spaces CSS needs. Token text is copied verbatim,
/// so values are never rewritten. Kept comments are placed at the front of
/// the output in source order.
pub fn minify(css: &str, name: &str, keep: SpecialComments) -> Result<String, MinifyError> {
    check(css, name)?;

    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut writer = Writer::default();
    walk(&mut parser, &mut writer).map_err(|err| MinifyError {
        name: name.to_string(),
        line: err.location.line + 1,
        column: err.location.column,
        message: "unexpected token".to_string(),
    })?;
    Ok(writer.finish(keep))
}

fn check(css: &str, name: &str) -> Result<(), MinifyError> {
    let options = ParserOptions {
        filename: name.to_string(),
        ..ParserOptions::default()
    };
    StyleSheet::parse(css, options).map(drop).map_err(|err| {
        let (line, column) = err.loc.as_ref().map_or((0, 0), |loc| (loc.line + 1, loc.column));
        MinifyError {
            name: name.to_string(),
            line,
            column,
            message: err.kind.to_string(),
        }
    })
}

/// No space is needed after these characters.
const DROPS_AFTER: &str = "{};,(:>[";
/// No space is needed before these characters.
const DROPS_BEFORE: &str = "{};,)!>]";

#[derive(Default)]
struct Writer<'i> {
    out: String,
    /// Bodies of `/*! ... */` comments, without the delimiters.
    specials: Vec<&'i str>,
    space: bool,
    semicolon: bool,
}

impl<'i> Writer<'i> {
    fn push(&mut self, text: &str) {
        let Some(first) = text.chars().next() else {
            return;
        };
        if std::mem::take(&mut self.semicolon) && first != '}' {
            self.out.push(';');
            self.space = false;
        }
        if std::mem::take(&mut self.space)
            && let Some(last) = self.out.chars().next_back()
            && !DROPS_AFTER.contains(last)
            && !DROPS_BEFORE.contains(first)
        {
            self.out.push(' ');
        }
        self.out.push_str(text);
    }

    fn semicolon(&mut self) {
        self.space = false;
        self.semicolon = true;
    }

    /// A removed comment still separates the tokens around it.
    fn comment(&mut self, text: &'i str) {
        if text.starts_with('!') {
            self.specials.push(text);
        }
        self.space = true;
    }

    fn finish(mut self, keep: SpecialComments) -> String {
        if self.semicolon {
            self.out.push(';');
        }
        let kept = match keep {
            SpecialComments::None => 0,
            SpecialComments::First => 1,
            SpecialComments::All => self.specials.len(),
        };
        let mut css: String = self
            .specials
            .iter()
            .take(kept)
            .map(|text| format!("/*{text}*/"))
            .collect();
        css.push_str(&std::mem::take(&mut self.out));
        css
    }
}

fn walk<'i>(input: &mut Parser<'i, '_>, out: &mut Writer<'i>) -> Result<(), ParseError<'i, ()>> {
    loop {
        let start = input.position();
        let Ok(token) = input.next_including_whitespace_and_comments().cloned() else {
            return Ok(());
        };
        let closer = match token {
            Token::WhiteSpace(_) => {
                out.space = true;
                continue;
            }
            Token::Comment(text) => {
                out.comment(text);
                continue;
            }
            Token::Semicolon => {
                out.semicolon();
                continue;
            }
            Token::Function(_) | Token::ParenthesisBlock => ")",
            Token::SquareBracketBlock => "]",
            Token::CurlyBracketBlock => "}",
            _ => {
                out.push(input.slice_from(start));
                continue;
            }
        };

        out.push(input.slice_from(start));
        input.parse_nested_block(|nested| walk(nested, out))?;
        // Blocks left open at the end of input stay open.
        if input.slice_from(start).ends_with(closer) {
            out.push(closer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "/*! first */\na {\n  color: red;\n}\n/* plain */\n/*! second */\nb {\n  color: blue;\n}\n";

    /// Expanded compiler output with nib prefixes, groups and keyframes.
    const COMPILED: &str = "\
/*! theme v1 */
.btn {
  -webkit-border-radius: 4px;
  -moz-border-radius: 4px;
  border-radius: 4px;
  color: #fff !important;
  width: calc(100% - 2 * 10px);
  background: url(\"img/a b.png\") no-repeat 0 0;
}
@media screen and (max-width: 600px) {
  .btn,
  .nav > li a:hover {
    margin: 0 auto;
  }
}
@-webkit-keyframes pulse {
  0% {
    opacity: 0;
  }
  100% {
    opacity: 1;
  }
}
";

    fn strip(css: &str) -> String {
        minify(css, "style.css", SpecialComments::None).unwrap()
    }

    #[test]
    fn test_strip_all_comments() {
        assert_eq!(strip(SOURCE), "a{color:red}b{color:blue}");
    }

    #[test]
    fn test_keep_first_special_comment() {
        assert_eq!(
            minify(SOURCE, "style.css", SpecialComments::First).unwrap(),
            "/*! first */a{color:red}b{color:blue}"
        );
    }

    #[test]
    fn test_keep_all_special_comments() {
        assert_eq!(
            minify(SOURCE, "style.css", SpecialComments::All).unwrap(),
            "/*! first *//*! second */a{color:red}b{color:blue}"
        );
    }

    #[test]
    fn test_compiled_output_survives_unchanged() {
        let out = strip(COMPILED);
        assert_eq!(
            out,
            ".btn{-webkit-border-radius:4px;-moz-border-radius:4px;border-radius:4px;\
color:#fff!important;width:calc(100% - 2 * 10px);\
background:url(\"img/a b.png\") no-repeat 0 0}\
@media screen and (max-width:600px){.btn,.nav>li a:hover{margin:0 auto}}\
@-webkit-keyframes pulse{0%{opacity:0}100%{opacity:1}}"
        );
        assert!(out.len() <= COMPILED.len());

        let kept = minify(COMPILED, "style.css", SpecialComments::All).unwrap();
        assert_eq!(kept, format!("/*! theme v1 */{out}"));
        assert!(kept.len() <= COMPILED.len());
    }

    #[test]
    fn test_significant_whitespace_kept() {
        assert_eq!(strip("a :hover , b  c{margin: 0  1px}"), "a :hover,b c{margin:0 1px}");
        assert_eq!(strip("a{margin:0/**/1px}"), "a{margin:0 1px}");
        assert_eq!(
            strip("@media print and (min-width: 1px) { a { color: red } }"),
            "@media print and (min-width:1px){a{color:red}}"
        );
    }

    #[test]
    fn test_statements_keep_semicolons() {
        assert_eq!(
            strip("@charset \"utf-8\";\n@import 'a.css' ;\na { color: red;; }"),
            "@charset \"utf-8\";@import 'a.css';a{color:red}"
        );
    }

    #[test]
    fn test_comment_markers_in_strings() {
        let css = "a{content:\"/*! not a comment */\"}";
        assert_eq!(minify(css, "style.css", SpecialComments::All).unwrap(), css);
    }

    #[test]
    fn test_keeps_rule_order() {
        assert_eq!(
            strip("b{margin:0}\na{margin:0}\nb{padding:0}"),
            "b{margin:0}a{margin:0}b{padding:0}"
        );
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("0".parse(), Ok(SpecialComments::None));
        assert_eq!("1".parse(), Ok(SpecialComments::First));
        assert_eq!("*".parse(), Ok(SpecialComments::All));
        assert_eq!("2".parse(), Ok(SpecialComments::All));
        assert!("3".parse::<SpecialComments>().is_err());
    }

    #[test]
    fn test_malformed_css() {
        let err = minify("a..b{color:red}", "broken.css", SpecialComments::None).unwrap_err();
        assert_eq!(err.name, "broken.css");
        assert_eq!(err.line, 1);
    }
}
