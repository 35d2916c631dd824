//! Flat CSS output tree and its serialization.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssNode {
    Rule {
        selectors: Vec<String>,
        decls: Vec<Declaration>,
    },
    /// At-rule with a block: declarations first, then nested nodes.
    Block {
        name: String,
        prelude: String,
        decls: Vec<Declaration>,
        children: Vec<CssNode>,
    },
    /// Body-less at-rule such as `@charset` or a plain CSS `@import`.
    Statement { name: String, prelude: String },
    Comment(String),
}

impl CssNode {
    /// Nodes that produce no output. Empty rules are dropped.
    fn is_empty(&self) -> bool {
        match self {
            Self::Rule { decls, .. } => decls.is_empty(),
            Self::Block {
                decls, children, ..
            } => decls.is_empty() && children.iter().all(Self::is_empty),
            Self::Statement { .. } | Self::Comment(_) => false,
        }
    }
}

/// Serialize nodes as expanded or compressed CSS.
///
/// Compressed output keeps only `/*!` comments.
pub fn emit(nodes: &[CssNode], compress: bool) -> String {
    let mut out = String::new();
    if compress {
        compressed(nodes, &mut out);
    } else {
        expanded(nodes, 0, &mut out);
    }
    out
}

fn compressed(nodes: &[CssNode], out: &mut String) {
    for node in nodes.iter().filter(|n| !n.is_empty()) {
        match node {
            CssNode::Rule { selectors, decls } => {
                out.push_str(&selectors.join(","));
                compressed_decls(decls, out);
            }
            CssNode::Block {
                name,
                prelude,
                decls,
                children,
            } => {
                at_keyword(name, prelude, out);
                out.push('{');
                for (i, decl) in decls.iter().enumerate() {
                    if i > 0 {
                        out.push(';');
                    }
                    out.push_str(&format!("{}:{}", decl.property, decl.value));
                }
                if !decls.is_empty() && children.iter().any(|c| !c.is_empty()) {
                    out.push(';');
                }
                compressed(children, out);
                out.push('}');
            }
            CssNode::Statement { name, prelude } => {
                at_keyword(name, prelude, out);
                out.push(';');
            }
            CssNode::Comment(text) => {
                if text.starts_with("/*!") {
                    out.push_str(text);
                }
            }
        }
    }
}

fn compressed_decls(decls: &[Declaration], out: &mut String) {
    out.push('{');
    let body: Vec<String> = decls
        .iter()
        .map(|d| format!("{}:{}", d.property, d.value))
        .collect();
    out.push_str(&body.join(";"));
    out.push('}');
}

fn expanded(nodes: &[CssNode], depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    for node in nodes.iter().filter(|n| !n.is_empty()) {
        match node {
            CssNode::Rule { selectors, decls } => {
                out.push_str(&pad);
                out.push_str(&selectors.join(&format!(",\n{pad}")));
                out.push_str(" {\n");
                expanded_decls(decls, depth + 1, out);
                out.push_str(&pad);
                out.push_str("}\n");
            }
            CssNode::Block {
                name,
                prelude,
                decls,
                children,
            } => {
                out.push_str(&pad);
                at_keyword(name, prelude, out);
                out.push_str(" {\n");
                expanded_decls(decls, depth + 1, out);
                expanded(children, depth + 1, out);
                out.push_str(&pad);
                out.push_str("}\n");
            }
            CssNode::Statement { name, prelude } => {
                out.push_str(&pad);
                at_keyword(name, prelude, out);
                out.push_str(";\n");
            }
            CssNode::Comment(text) => {
                out.push_str(&pad);
                out.push_str(text);
                out.push('\n');
            }
        }
    }
}

fn expanded_decls(decls: &[Declaration], depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    for decl in decls {
        out.push_str(&format!("{pad}{}: {};\n", decl.property, decl.value));
    }
}

fn at_keyword(name: &str, prelude: &str, out: &mut String) {
    out.push('@');
    out.push_str(name);
    if !prelude.is_empty() {
        out.push(' ');
        out.push_str(prelude);
    }
}
