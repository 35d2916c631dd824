//! Style-language compiler.
//!
//! Turns Stylus-style source into CSS in four passes:
//!
//! - [`lexer`]: statements, braces and block comments
//! - [`tree`]: block structure from braces and indentation
//! - [`parser`]: rules, declarations, variables, mixins and at-rules
//! - [`eval`] + [`emit`]: resolve everything and serialize flat CSS

pub mod ast;
mod emit;
mod error;
mod eval;
mod lexer;
mod parser;
mod tree;
mod value;
mod vendor;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use error::CompileError;

use eval::Evaluator;

/// Built-in mixin library enabled through `use`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HelperSet {
    /// Vendor prefixes, positional helpers and common block mixins.
    Nib,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub helpers: Vec<HelperSet>,
    /// Compact output instead of indented output.
    pub compress: bool,
    /// Inline imported `.css` files instead of emitting `@import`.
    pub include_css: bool,
    /// Extra directories searched for imports.
    pub paths: Vec<PathBuf>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            helpers: vec![HelperSet::Nib],
            compress: true,
            include_css: true,
            paths: Vec::new(),
        }
    }
}

/// Compile `source`, read from `path`, into CSS.
///
/// `path` names the source in errors and anchors relative imports.
pub fn compile(source: &str, path: &Path, options: &CompileOptions) -> Result<String, CompileError> {
    let items = parser::parse(source).map_err(|e| e.in_file(path))?;
    let nodes = Evaluator::new(path, options)?.run(&items)?;
    Ok(emit::emit(&nodes, options.compress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn css(source: &str) -> String {
        compile(source, Path::new("index.styl"), &CompileOptions::default()).unwrap()
    }

    fn expanded(source: &str) -> String {
        let options = CompileOptions {
            compress: false,
            ..CompileOptions::default()
        };
        compile(source, Path::new("index.styl"), &options).unwrap()
    }

    fn error(source: &str) -> CompileError {
        compile(source, Path::new("index.styl"), &CompileOptions::default()).unwrap_err()
    }

    #[test]
    fn test_line_comment_dropped() {
        assert_eq!(
            css("a{color:red}\n// comment\nb{color:blue}"),
            "a{color:red}b{color:blue}"
        );
    }

    #[test]
    fn test_indented_syntax() {
        assert_eq!(
            css("ul\n  margin 0\n  li\n    float left\n"),
            "ul{margin:0}ul li{float:left}"
        );
    }

    #[test]
    fn test_expanded_output() {
        assert_eq!(
            expanded("a, b\n  color red\n  &:hover\n    color blue"),
            "a,\nb {\n  color: red;\n}\na:hover,\nb:hover {\n  color: blue;\n}\n"
        );
    }

    #[test]
    fn test_variables_and_arithmetic() {
        let source = "gap = 10px\n$wide ?= gap * 2\n$wide ?= 1px\n.box\n  padding gap (gap / 2)\n  width $wide + 5px";
        assert_eq!(css(source), ".box{padding:10px 5px;width:25px}");
    }

    #[test]
    fn test_block_scoped_variable() {
        let source = "c = red\na\n  c = blue\n  color c\nb\n  color c";
        assert_eq!(css(source), "a{color:blue}b{color:red}");
    }

    #[test]
    fn test_mixin_forms() {
        let source = "\
border(w = 1px, style = solid)
  border w style arguments

pad(args...)
  padding args

a
  border()
  pad 1px 2px
b
  border 2px";
        assert_eq!(
            css(source),
            "a{border:1px solid;padding:1px 2px}b{border:2px solid 2px}"
        );
    }

    #[test]
    fn test_mixin_with_nested_rule() {
        let source = "hover-red()\n  &:hover\n    color red\na\n  hover-red()\n  margin 0";
        assert_eq!(css(source), "a{margin:0}a:hover{color:red}");
    }

    #[test]
    fn test_nib_vendor_prefixes() {
        assert_eq!(
            css("a\n  border-radius 4px"),
            "a{-webkit-border-radius:4px;-moz-border-radius:4px;border-radius:4px}"
        );
        assert_eq!(
            css("a\n  absolute top left 5px"),
            "a{position:absolute;top:0;left:5px}"
        );
    }

    #[test]
    fn test_nib_block_mixins() {
        assert_eq!(css("a\n  size 10px 20px"), "a{width:10px;height:20px}");
        assert_eq!(css("a\n  size(3px)"), "a{width:3px;height:3px}");
        assert_eq!(
            css(".row\n  clearfix()"),
            ".row{zoom:1}.row:before,.row:after{content:\"\";display:table}.row:after{clear:both}"
        );
    }

    #[test]
    fn test_without_helpers() {
        let options = CompileOptions {
            helpers: vec![],
            ..CompileOptions::default()
        };
        let out = compile("a\n  border-radius 4px", Path::new("a.styl"), &options).unwrap();
        assert_eq!(out, "a{border-radius:4px}");
        let err = compile("a\n  clearfix()", Path::new("a.styl"), &options).unwrap_err();
        assert!(err.message.contains("undefined mixin `clearfix`"));
    }

    #[test]
    fn test_media_bubbles_out_of_rule() {
        let source = "a\n  color red\n  @media (max-width: 600px)\n    color blue\n    b\n      margin 0";
        assert_eq!(
            css(source),
            "a{color:red}@media (max-width: 600px){a{color:blue}a b{margin:0}}"
        );
    }

    #[test]
    fn test_at_rules() {
        let source = "@charset \"utf-8\"\n@font-face\n  font-family x\n  src url(x.woff)\n@keyframes fade\n  from\n    opacity 0\n  to\n    opacity 1";
        assert_eq!(
            css(source),
            "@charset \"utf-8\";@font-face{font-family:x;src:url(x.woff)}@keyframes fade{from{opacity:0}to{opacity:1}}"
        );
    }

    #[test]
    fn test_special_comments_survive_compression() {
        assert_eq!(
            css("/*! license */\n/* note */\na{color:red}"),
            "/*! license */a{color:red}"
        );
    }

    #[test]
    fn test_imports_are_inlined() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("vars.styl"), "primary = #333\n").unwrap();
        fs::create_dir(dir.path().join("base")).unwrap();
        fs::write(dir.path().join("base/index.styl"), "body\n  margin 0\n").unwrap();
        fs::write(dir.path().join("reset.css"), "html { padding: 0 }").unwrap();

        let entry = dir.path().join("index.styl");
        let source = "@import 'vars'\n@require 'base'\n@require 'base'\n@import 'reset.css'\na\n  color primary";
        let out = compile(source, &entry, &CompileOptions::default()).unwrap();
        assert_eq!(out, "body{margin:0}html{padding:0}a{color:#333}");

        let options = CompileOptions {
            include_css: false,
            ..CompileOptions::default()
        };
        let out = compile(source, &entry, &options).unwrap();
        assert_eq!(out, "@import 'reset.css';body{margin:0}a{color:#333}");
    }

    #[test]
    fn test_import_search_paths() {
        let dir = TempDir::new().unwrap();
        let lib = dir.path().join("lib");
        fs::create_dir(&lib).unwrap();
        fs::write(lib.join("grid.styl"), ".grid\n  display flex\n").unwrap();

        let options = CompileOptions {
            paths: vec![lib],
            ..CompileOptions::default()
        };
        let out = compile("@import 'grid'", &dir.path().join("index.styl"), &options).unwrap();
        assert_eq!(out, ".grid{display:flex}");
    }

    #[test]
    fn test_missing_import() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("index.styl");
        let err = compile("@import \"missing\"", &entry, &CompileOptions::default()).unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("failed to locate @import file `missing`"));
    }

    #[test]
    fn test_import_cycle() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.styl"), "@import 'b'\n").unwrap();
        fs::write(dir.path().join("b.styl"), "@import 'a'\n").unwrap();
        let entry = dir.path().join("a.styl");
        let err = compile("@import 'b'", &entry, &CompileOptions::default()).unwrap_err();
        assert!(err.message.contains("import cycle"));
        assert!(err.path.ends_with("b.styl"));
    }

    #[test]
    fn test_error_in_imported_file_names_it() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.styl"), "a\n  content \"open\n").unwrap();
        let err = compile(
            "@import 'broken'",
            &dir.path().join("index.styl"),
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert!(err.path.ends_with("broken.styl"));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_mixin_body_error_names_defining_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("mixins.styl"),
            "// helpers\npad(n)\n  padding n\n\nbad()\n  nope()\n",
        )
        .unwrap();
        let entry = dir.path().join("index.styl");

        let err = compile("@import 'mixins'\na\n  bad()", &entry, &CompileOptions::default())
            .unwrap_err();
        assert!(err.path.ends_with("mixins.styl"));
        assert_eq!(err.line, 6);
        assert!(err.message.contains("undefined mixin `nope`"));

        // Argument errors stay at the call site.
        let err = compile("@import 'mixins'\na\n  pad()", &entry, &CompileOptions::default())
            .unwrap_err();
        assert_eq!(err.path, entry);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_helper_body_error_names_helper() {
        let err = error("a\n  color red\nclearfix()");
        assert_eq!(err.path, PathBuf::from("nib"));
        assert_eq!(err.line, 9);
        assert!(err.message.contains("outside a selector"));
    }

    #[test]
    fn test_semantic_errors() {
        assert!(error("color red").message.contains("outside a selector"));
        assert!(error("a\n  color").message.contains("missing value"));
        assert!(error("a\n  nope()").message.contains("undefined mixin"));
        assert!(
            error("m(x)\n  width x\na\n  m()")
                .message
                .contains("missing argument `x`")
        );
        assert!(error("loop()\n  loop()\na\n  loop()").message.contains("too deeply"));

        let err = error("a\n  color red\n  width (10px / 0)");
        assert_eq!(err.line, 3);
        assert!(err.message.contains("division by zero"));
    }

    #[test]
    fn test_syntax_error_location() {
        let err = error("a {\n  color: red;\n");
        assert_eq!(err.path, PathBuf::from("index.styl"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_output_is_deterministic() {
        let source = "a\n  border-radius 2px\n  @media print\n    color black";
        assert_eq!(css(source), css(source));
    }
}
