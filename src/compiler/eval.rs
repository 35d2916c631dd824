//! Evaluation of syntax items into the flat CSS tree.
//!
//! Resolves variables, mixins and imports, joins nested selectors to their
//! parents, and bubbles conditional group rules out of the rules they are
//! nested in. A nested rule is emitted right after its parent, whose
//! declarations are collected into a placeholder pushed before the body is
//! evaluated.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::ast::{ImportKind, Item, Mixin, is_conditional_group, is_keyframes};
use super::emit::{CssNode, Declaration};
use super::error::CompileError;
use super::parser::parse;
use super::value::{evaluate, split_args, split_words, substitute, unquote};
use super::vendor;
use super::{CompileOptions, HelperSet};
use crate::utils::path::normalize_path;

/// Maximum number of nested mixin applications.
const MAX_DEPTH: usize = 64;

const NIB: &str = include_str!("helpers/nib.styl");

#[derive(Default)]
struct Scope {
    vars: FxHashMap<String, String>,
    mixins: FxHashMap<String, Defined>,
}

/// A mixin together with the file it was defined in.
#[derive(Clone)]
struct Defined {
    mixin: Rc<Mixin>,
    file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Root,
    /// Inside a rule set: declarations target `selectors`.
    Rule,
    /// Inside `@media` and friends at top level.
    Group,
    /// Inside `@keyframes`: rule selectors are keyframe selectors.
    Keyframes,
    /// Inside `@font-face`, `@page` and other declaration blocks.
    Declarations,
}

struct Frame {
    selectors: Option<Vec<String>>,
    mode: Mode,
    decls: Vec<Declaration>,
}

impl Frame {
    fn new(selectors: Option<Vec<String>>, mode: Mode) -> Self {
        Self {
            selectors,
            mode,
            decls: Vec::new(),
        }
    }

    fn accepts_decls(&self) -> bool {
        matches!(self.mode, Mode::Rule | Mode::Declarations)
    }
}

pub struct Evaluator<'a> {
    options: &'a CompileOptions,
    global: Scope,
    locals: Vec<Scope>,
    /// File whose items are being evaluated.
    file: PathBuf,
    /// Files currently being inlined, outermost first.
    imports: Vec<PathBuf>,
    /// Every file inlined so far.
    seen: FxHashSet<PathBuf>,
    /// Mixins currently being applied, innermost last.
    active: Vec<String>,
    /// `@charset`, `@namespace` and plain CSS imports, placed before any rule.
    head: Vec<CssNode>,
}

impl<'a> Evaluator<'a> {
    pub fn new(path: &Path, options: &'a CompileOptions) -> Result<Self, CompileError> {
        let root = normalize_path(path);
        let mut evaluator = Self {
            options,
            global: Scope::default(),
            locals: Vec::new(),
            file: path.to_path_buf(),
            imports: vec![root.clone()],
            seen: FxHashSet::from_iter([root]),
            active: Vec::new(),
            head: Vec::new(),
        };
        for helper in &options.helpers {
            evaluator.load_helper(*helper)?;
        }
        Ok(evaluator)
    }

    /// Evaluate the items of the entry file.
    pub fn run(mut self, items: &[Item]) -> Result<Vec<CssNode>, CompileError> {
        let mut out = Vec::new();
        self.eval_items(items, &mut Frame::new(None, Mode::Root), &mut out)?;
        let mut nodes = std::mem::take(&mut self.head);
        nodes.extend(out);
        Ok(nodes)
    }

    fn load_helper(&mut self, helper: HelperSet) -> Result<(), CompileError> {
        let (name, source) = match helper {
            HelperSet::Nib => ("nib", NIB),
        };
        let items = parse(source).map_err(|e| e.in_file(Path::new(name)))?;
        let saved = std::mem::replace(&mut self.file, PathBuf::from(name));
        let result = self.eval_items(&items, &mut Frame::new(None, Mode::Root), &mut Vec::new());
        self.file = saved;
        result
    }

    fn nib(&self) -> bool {
        self.options.helpers.contains(&HelperSet::Nib)
    }

    fn error(&self, line: usize, message: impl Into<String>) -> CompileError {
        CompileError::new(&self.file, line, message)
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    fn scope(&mut self) -> &mut Scope {
        self.locals.last_mut().unwrap_or(&mut self.global)
    }

    fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.locals.iter().rev().chain(std::iter::once(&self.global))
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.scopes().find_map(|s| s.vars.get(name)).cloned()
    }

    fn mixin(&self, name: &str) -> Option<Defined> {
        self.scopes().find_map(|s| s.mixins.get(name)).cloned()
    }

    /// Substitute variables and evaluate arithmetic.
    fn value(&self, raw: &str, line: usize) -> Result<String, CompileError> {
        evaluate(&substitute(raw, |name| self.lookup(name))).map_err(|m| self.error(line, m))
    }

    /// Evaluate `f` inside a fresh local scope.
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.locals.push(Scope::default());
        let result = f(self);
        self.locals.pop();
        result
    }

    // ========================================================================
    // Items
    // ========================================================================

    fn eval_items(
        &mut self,
        items: &[Item],
        frame: &mut Frame,
        out: &mut Vec<CssNode>,
    ) -> Result<(), CompileError> {
        for item in items {
            self.eval_item(item, frame, out)?;
        }
        Ok(())
    }

    fn eval_item(
        &mut self,
        item: &Item,
        frame: &mut Frame,
        out: &mut Vec<CssNode>,
    ) -> Result<(), CompileError> {
        match item {
            Item::Comment { text, .. } => out.push(CssNode::Comment(text.clone())),
            Item::Assign {
                name,
                value,
                conditional,
                line,
            } => {
                if *conditional && self.lookup(name).is_some() {
                    return Ok(());
                }
                let value = self.value(value, *line)?;
                self.scope().vars.insert(name.clone(), value);
            }
            Item::MixinDef(mixin) => {
                let defined = Defined {
                    mixin: Rc::clone(mixin),
                    file: self.file.clone(),
                };
                self.scope().mixins.insert(mixin.name.clone(), defined);
            }
            Item::Call { name, args, line } => {
                let mixin = self
                    .mixin(name)
                    .ok_or_else(|| self.error(*line, format!("undefined mixin `{name}`")))?;
                self.apply(&mixin, args, *line, frame, out)?;
            }
            Item::Decl {
                property,
                value,
                line,
            } => self.declaration(property, value, *line, frame, out)?,
            Item::Rule {
                selectors, body, ..
            } => {
                let selectors = if frame.mode == Mode::Keyframes {
                    selectors.clone()
                } else {
                    resolve_selectors(frame.selectors.as_deref(), selectors)
                };
                self.rule(selectors, body, out)?;
            }
            Item::AtRule {
                name,
                prelude,
                body,
                ..
            } => self.at_rule(name, prelude, body.as_deref(), frame, out)?,
            Item::Import { kind, target, line } => {
                self.import(*kind, target, *line, frame, out)?
            }
        }
        Ok(())
    }

    fn rule(
        &mut self,
        selectors: Vec<String>,
        body: &[Item],
        out: &mut Vec<CssNode>,
    ) -> Result<(), CompileError> {
        let slot = out.len();
        out.push(CssNode::Rule {
            selectors: selectors.clone(),
            decls: Vec::new(),
        });

        let mut frame = Frame::new(Some(selectors), Mode::Rule);
        self.scoped(|this| this.eval_items(body, &mut frame, out))?;

        if let Some(CssNode::Rule { decls, .. }) = out.get_mut(slot) {
            *decls = frame.decls;
        }
        Ok(())
    }

    fn declaration(
        &mut self,
        property: &str,
        value: &str,
        line: usize,
        frame: &mut Frame,
        out: &mut Vec<CssNode>,
    ) -> Result<(), CompileError> {
        // A property naming a mixin is a transparent call, except inside that mixin.
        if frame.mode != Mode::Declarations
            && !self.active.iter().any(|m| m == property)
            && let Some(defined) = self.mixin(property)
        {
            let args = transparent_args(&defined.mixin, value);
            return self.apply(&defined, &args, line, frame, out);
        }

        if self.nib() && vendor::is_position_helper(property) {
            let value = self.value(value, line)?;
            let items = vendor::position(property, &value, line).map_err(|m| self.error(line, m))?;
            return self.eval_items(&items, frame, out);
        }

        if !frame.accepts_decls() {
            return Err(self.error(line, format!("property `{property}` outside a selector")));
        }
        if value.is_empty() {
            return Err(self.error(line, format!("missing value for `{property}`")));
        }

        let value = self.value(value, line)?;
        if self.nib() {
            frame.decls.extend(
                vendor::expand(property, &value)
                    .into_iter()
                    .map(|(property, value)| Declaration { property, value }),
            );
        } else {
            frame.decls.push(Declaration {
                property: property.to_string(),
                value,
            });
        }
        Ok(())
    }

    /// Apply a mixin. Argument errors point at the call site, body errors
    /// at the file defining the mixin.
    fn apply(
        &mut self,
        defined: &Defined,
        args: &[String],
        line: usize,
        frame: &mut Frame,
        out: &mut Vec<CssNode>,
    ) -> Result<(), CompileError> {
        let mixin = &defined.mixin;
        if self.active.len() >= MAX_DEPTH {
            return Err(self.error(line, format!("mixin `{}` nested too deeply", mixin.name)));
        }

        let args = args
            .iter()
            .map(|arg| self.value(arg, line))
            .collect::<Result<Vec<_>, _>>()?;
        self.scoped(|this| {
            this.scope()
                .vars
                .insert("arguments".to_string(), args.join(", "));
            this.bind(mixin, &args, line)?;

            let caller = std::mem::replace(&mut this.file, defined.file.clone());
            this.active.push(mixin.name.clone());
            let result = this.eval_items(&mixin.body, frame, out);
            this.active.pop();
            this.file = caller;
            result
        })
    }

    /// Bind mixin parameters in the current scope.
    fn bind(&mut self, mixin: &Mixin, args: &[String], line: usize) -> Result<(), CompileError> {
        for (i, param) in mixin.params.iter().enumerate() {
            let value = if param.rest {
                args.get(i..).unwrap_or_default().join(", ")
            } else if let Some(arg) = args.get(i) {
                arg.clone()
            } else if let Some(default) = &param.default {
                self.value(default, line)?
            } else {
                return Err(self.error(
                    line,
                    format!("missing argument `{}` for mixin `{}`", param.name, mixin.name),
                ));
            };
            self.scope().vars.insert(param.name.clone(), value);
        }
        Ok(())
    }

    fn at_rule(
        &mut self,
        name: &str,
        prelude: &str,
        body: Option<&[Item]>,
        frame: &Frame,
        out: &mut Vec<CssNode>,
    ) -> Result<(), CompileError> {
        let prelude = substitute(prelude, |n| self.lookup(n));

        let Some(body) = body else {
            let node = CssNode::Statement {
                name: name.to_string(),
                prelude,
            };
            match name {
                "charset" => self.head.insert(0, node),
                "namespace" => self.head.push(node),
                _ => out.push(node),
            }
            return Ok(());
        };

        let mut children = Vec::new();
        let mut decls = Vec::new();

        if is_conditional_group(name) {
            match &frame.selectors {
                // Bare declarations inside the group apply to the enclosing selectors.
                Some(selectors) if frame.mode == Mode::Rule => {
                    self.rule(selectors.clone(), body, &mut children)?
                }
                _ => {
                    let mut inner = Frame::new(None, Mode::Group);
                    self.scoped(|this| this.eval_items(body, &mut inner, &mut children))?;
                }
            }
        } else {
            let mode = if is_keyframes(name) {
                Mode::Keyframes
            } else {
                Mode::Declarations
            };
            let mut inner = Frame::new(None, mode);
            self.scoped(|this| this.eval_items(body, &mut inner, &mut children))?;
            decls = inner.decls;
        }

        out.push(CssNode::Block {
            name: name.to_string(),
            prelude,
            decls,
            children,
        });
        Ok(())
    }

    // ========================================================================
    // Imports
    // ========================================================================

    fn import(
        &mut self,
        kind: ImportKind,
        target: &str,
        line: usize,
        frame: &mut Frame,
        out: &mut Vec<CssNode>,
    ) -> Result<(), CompileError> {
        let raw = target.trim();
        let name = unquote(raw);

        let remote = raw.starts_with("url(")
            || name.starts_with("http://")
            || name.starts_with("https://")
            || name.starts_with("//");
        if remote || (name.ends_with(".css") && !self.options.include_css) {
            let prelude = if raw.starts_with("url(") || raw != name {
                raw.to_string()
            } else {
                format!("\"{raw}\"")
            };
            self.head.push(CssNode::Statement {
                name: "import".to_string(),
                prelude,
            });
            return Ok(());
        }

        let keyword = match kind {
            ImportKind::Import => "import",
            ImportKind::Require => "require",
        };
        let path = self
            .resolve(name)
            .ok_or_else(|| self.error(line, format!("failed to locate @{keyword} file `{name}`")))?;

        let key = normalize_path(&path);
        if self.imports.contains(&key) {
            let chain: Vec<String> = self
                .imports
                .iter()
                .chain(std::iter::once(&key))
                .map(|p| display_name(p))
                .collect();
            return Err(self.error(line, format!("import cycle: {}", chain.join(" -> "))));
        }
        let first = self.seen.insert(key.clone());
        if kind == ImportKind::Require && !first {
            return Ok(());
        }

        let source = fs::read_to_string(&path)
            .map_err(|e| self.error(line, format!("failed to read `{}`: {e}", path.display())))?;
        let items = parse(&source).map_err(|e| e.in_file(&path))?;

        // Imported files share the importer's scope and frame.
        let saved = std::mem::replace(&mut self.file, path);
        self.imports.push(key);
        let result = self.eval_items(&items, frame, out);
        self.imports.pop();
        self.file = saved;
        result
    }

    /// Find an import target next to the current file, then in the include paths.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let base = self
            .file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let candidates = candidates(name);

        std::iter::once(base)
            .chain(self.options.paths.iter().cloned())
            .flat_map(|dir| candidates.iter().map(move |c| dir.join(c)))
            .find(|p| p.is_file())
    }
}

fn candidates(name: &str) -> Vec<String> {
    if name.ends_with(".styl") || name.ends_with(".css") {
        vec![name.to_string()]
    } else {
        vec![
            format!("{name}.styl"),
            name.to_string(),
            format!("{name}/index.styl"),
        ]
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Join child selectors to every parent selector, replacing `&` with the parent.
fn resolve_selectors(parents: Option<&[String]>, children: &[String]) -> Vec<String> {
    let Some(parents) = parents else {
        return children.to_vec();
    };
    parents
        .iter()
        .flat_map(|parent| {
            children.iter().map(move |child| {
                if child.contains('&') {
                    child.replace('&', parent)
                } else {
                    format!("{parent} {child}")
                }
            })
        })
        .collect()
}

/// Arguments of a mixin invoked as a property.
///
/// Without commas, the value is split on spaces when the mixin takes
/// several positional parameters.
fn transparent_args(mixin: &Mixin, value: &str) -> Vec<String> {
    let args = split_args(value);
    let positional = mixin.params.iter().filter(|p| !p.rest).count();
    if args.len() == 1 && positional > 1 {
        split_words(&args[0])
    } else {
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_selectors() {
        let parents = vec!["a".to_string(), "b".to_string()];
        let children = vec!["c".to_string(), "&:hover".to_string()];
        assert_eq!(
            resolve_selectors(Some(&parents), &children),
            vec!["a c", "a:hover", "b c", "b:hover"]
        );
        assert_eq!(resolve_selectors(None, &children), children);
    }

    #[test]
    fn test_import_candidates() {
        assert_eq!(
            candidates("reset"),
            vec!["reset.styl", "reset", "reset/index.styl"]
        );
        assert_eq!(candidates("base.css"), vec!["base.css"]);
    }

    #[test]
    fn test_transparent_args() {
        let Ok(items) = parse("size(w, h = w)\n  width w") else {
            panic!("helper parse failed");
        };
        let Item::MixinDef(mixin) = &items[0] else {
            panic!("expected mixin");
        };
        assert_eq!(transparent_args(mixin, "10px 20px"), vec!["10px", "20px"]);
        assert_eq!(transparent_args(mixin, "10px, 20px"), vec!["10px", "20px"]);
    }

    #[test]
    fn test_nib_helpers_parse() {
        let items = parse(NIB).unwrap();
        assert!(items.iter().all(|item| matches!(item, Item::MixinDef(_))));
    }
}
