//! Syntax tree of the style language.

use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Nested rule set.
    Rule {
        selectors: Vec<String>,
        body: Vec<Item>,
        line: usize,
    },
    /// `property value`, or a transparent mixin call when `property` names a mixin.
    Decl {
        property: String,
        value: String,
        line: usize,
    },
    /// `name = value` or `name ?= value`.
    Assign {
        name: String,
        value: String,
        conditional: bool,
        line: usize,
    },
    MixinDef(Rc<Mixin>),
    /// `name(args)` on its own line.
    Call {
        name: String,
        args: Vec<String>,
        line: usize,
    },
    Import {
        kind: ImportKind,
        target: String,
        line: usize,
    },
    /// Any other at-rule; `body` is `None` for statements such as `@charset`.
    AtRule {
        name: String,
        prelude: String,
        body: Option<Vec<Item>>,
        line: usize,
    },
    Comment {
        text: String,
        line: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `@import` / `@include`: inline every time.
    Import,
    /// `@require`: inline at most once per compilation.
    Require,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mixin {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Item>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub default: Option<String>,
    /// `name...` collects the remaining arguments.
    pub rest: bool,
}

/// At-rules whose body holds rules and bubbles out of enclosing selectors.
pub fn is_conditional_group(name: &str) -> bool {
    matches!(name, "media" | "supports" | "container" | "document" | "layer")
}

/// At-rules whose body holds keyframe selectors.
pub fn is_keyframes(name: &str) -> bool {
    name == "keyframes" || (name.starts_with('-') && name.ends_with("-keyframes"))
}
