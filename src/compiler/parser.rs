//! Classify tree nodes into syntax items.

use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;

use super::ast::{ImportKind, Item, Mixin, Param};
use super::error::SyntaxError;
use super::lexer::tokenize;
use super::tree::{Node, build};
use super::value::{matching_paren, split_args, split_top_level};

static ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\$?[A-Za-z_][\w-]*)\s*(\?=|=)\s*(.*)$").unwrap()
});

static CALL_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\$?[A-Za-z_-][\w-]*)\(").unwrap());

static PROPERTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*?-{0,2}[A-Za-z_][\w-]*$").unwrap());

static AT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z-][\w-]*)\s*(.*)$").unwrap());

/// Parse style-language source into items.
pub fn parse(source: &str) -> Result<Vec<Item>, SyntaxError> {
    let nodes = build(tokenize(source)?)?;
    parse_nodes(nodes)
}

fn parse_nodes(nodes: Vec<Node>) -> Result<Vec<Item>, SyntaxError> {
    nodes.into_iter().map(parse_node).collect()
}

fn parse_node(node: Node) -> Result<Item, SyntaxError> {
    match node {
        Node::Line { text, line } => parse_line(&text, line),
        Node::Comment { text, line } => Ok(Item::Comment { text, line }),
        Node::Block {
            header,
            line,
            children,
        } => parse_block(&header, line, parse_nodes(children)?),
    }
}

fn parse_line(text: &str, line: usize) -> Result<Item, SyntaxError> {
    if text.starts_with('@') {
        let (name, prelude) = at_keyword(text, line)?;
        return match name.as_str() {
            "import" | "include" | "require" => {
                if prelude.is_empty() {
                    return Err(SyntaxError::new(line, format!("`@{name}` requires a path")));
                }
                let kind = if name == "require" {
                    ImportKind::Require
                } else {
                    ImportKind::Import
                };
                Ok(Item::Import {
                    kind,
                    target: prelude,
                    line,
                })
            }
            n if takes_block(n) => Err(SyntaxError::new(line, format!("`@{n}` requires a block"))),
            _ => Ok(Item::AtRule {
                name,
                prelude,
                body: None,
                line,
            }),
        };
    }

    if let Some(caps) = ASSIGN.captures(text) {
        return Ok(Item::Assign {
            name: caps[1].to_string(),
            value: caps[3].trim().to_string(),
            conditional: &caps[2] == "?=",
            line,
        });
    }

    if let Some((name, args)) = call(text) {
        return Ok(Item::Call {
            name,
            args: split_args(&args),
            line,
        });
    }

    if let Some((property, value)) = text.split_once(':')
        && PROPERTY.is_match(property.trim())
    {
        return Ok(Item::Decl {
            property: property.trim().to_string(),
            value: value.trim().to_string(),
            line,
        });
    }

    let (property, value) = text.split_once(' ').unwrap_or((text, ""));
    if PROPERTY.is_match(property) {
        return Ok(Item::Decl {
            property: property.to_string(),
            value: value.trim().to_string(),
            line,
        });
    }

    Err(SyntaxError::new(line, format!("unexpected `{text}`")))
}

fn parse_block(header: &str, line: usize, body: Vec<Item>) -> Result<Item, SyntaxError> {
    if header.starts_with('@') {
        let (name, prelude) = at_keyword(header, line)?;
        if matches!(name.as_str(), "import" | "include" | "require") {
            return Err(SyntaxError::new(line, format!("`@{name}` does not take a block")));
        }
        return Ok(Item::AtRule {
            name,
            prelude,
            body: Some(body),
            line,
        });
    }

    if let Some((name, params)) = call(header) {
        return Ok(Item::MixinDef(Rc::new(Mixin {
            name,
            params: parse_params(&params, line)?,
            body,
            line,
        })));
    }

    let selectors = split_top_level(header, ',');
    if selectors.iter().any(String::is_empty) {
        return Err(SyntaxError::new(line, format!("empty selector in `{header}`")));
    }
    Ok(Item::Rule {
        selectors,
        body,
        line,
    })
}

/// `name(args)` spanning the whole text.
fn call(text: &str) -> Option<(String, String)> {
    let caps = CALL_HEAD.captures(text)?;
    let name = caps[1].to_string();
    let open = name.len();
    if matching_paren(text, open)? != text.len() - 1 {
        return None;
    }
    Some((name, text[open + 1..text.len() - 1].to_string()))
}

fn at_keyword(text: &str, line: usize) -> Result<(String, String), SyntaxError> {
    let caps = AT_KEYWORD
        .captures(text)
        .ok_or_else(|| SyntaxError::new(line, format!("malformed at-rule `{text}`")))?;
    Ok((caps[1].to_ascii_lowercase(), caps[2].trim().to_string()))
}

fn takes_block(name: &str) -> bool {
    super::ast::is_conditional_group(name)
        || super::ast::is_keyframes(name)
        || matches!(name, "font-face" | "page")
}

fn parse_params(text: &str, line: usize) -> Result<Vec<Param>, SyntaxError> {
    let parts = split_args(text);
    let count = parts.len();
    let mut params = Vec::with_capacity(count);

    for (i, part) in parts.into_iter().enumerate() {
        let param = if let Some((name, default)) = part.split_once('=') {
            Param {
                name: name.trim().to_string(),
                default: Some(default.trim().to_string()),
                rest: false,
            }
        } else if let Some(name) = part.strip_suffix("...") {
            if i + 1 != count {
                return Err(SyntaxError::new(line, "rest parameter must come last"));
            }
            Param {
                name: name.trim().to_string(),
                default: None,
                rest: true,
            }
        } else {
            Param {
                name: part,
                default: None,
                rest: false,
            }
        };

        if !PROPERTY.is_match(&param.name) && !param.name.starts_with('$') {
            return Err(SyntaxError::new(
                line,
                format!("invalid parameter name `{}`", param.name),
            ));
        }
        params.push(param);
    }
    Ok(params)
}
