//! Vendor prefixing and positional helpers of the `nib` helper set.

use super::ast::Item;
use super::value::split_words;

/// Vendor prefixes emitted ahead of the official property.
pub fn prefixes(property: &str) -> &'static [&'static str] {
    const WEBKIT_MOZ: &[&str] = &["webkit", "moz"];
    const WEBKIT_MOZ_O: &[&str] = &["webkit", "moz", "o"];
    const WEBKIT_MOZ_MS: &[&str] = &["webkit", "moz", "ms"];
    const ALL: &[&str] = &["webkit", "moz", "ms", "o"];
    const WEBKIT_MS: &[&str] = &["webkit", "ms"];

    let family = |name: &str| property == name || property.starts_with(&format!("{name}-"));

    match property {
        "border-radius" | "box-shadow" | "box-sizing" | "appearance" => WEBKIT_MOZ,
        "user-select" | "perspective" | "perspective-origin" | "backface-visibility"
        | "hyphens" => WEBKIT_MOZ_MS,
        "background-size" | "background-clip" | "background-origin" | "columns" => WEBKIT_MOZ,
        "text-size-adjust" => WEBKIT_MS,
        _ if family("transition") => WEBKIT_MOZ_O,
        _ if family("transform") => ALL,
        _ if family("animation") => WEBKIT_MOZ,
        _ if family("column") => WEBKIT_MOZ,
        _ => &[],
    }
}

/// Expand one declaration into its prefixed variants followed by the original.
pub fn expand(property: &str, value: &str) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = prefixes(property)
        .iter()
        .map(|prefix| {
            let value = if property.starts_with("transition") {
                prefix_transform(value, prefix)
            } else {
                value.to_string()
            };
            (format!("-{prefix}-{property}"), value)
        })
        .collect();
    out.push((property.to_string(), value.to_string()));
    out
}

/// Rewrite the `transform` word in a transition value for `prefix`.
fn prefix_transform(value: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(at) = rest.find("transform") {
        let before = rest[..at].chars().next_back();
        let after = rest[at + "transform".len()..].chars().next();
        let bounded = |c: Option<char>| !c.is_some_and(|c| c.is_alphanumeric() || c == '-');
        out.push_str(&rest[..at]);
        if bounded(before) && bounded(after) {
            out.push_str(&format!("-{prefix}-transform"));
        } else {
            out.push_str("transform");
        }
        rest = &rest[at + "transform".len()..];
    }
    out.push_str(rest);
    out
}

/// `absolute|fixed|relative [side [offset]]...`.
pub fn is_position_helper(property: &str) -> bool {
    matches!(property, "absolute" | "fixed" | "relative")
}

/// Expand a positional helper into `position` plus side offsets.
pub fn position(kind: &str, value: &str, line: usize) -> Result<Vec<Item>, String> {
    let decl = |property: &str, value: &str| Item::Decl {
        property: property.to_string(),
        value: value.to_string(),
        line,
    };

    let mut items = vec![decl("position", kind)];
    let words = split_words(value);
    let mut i = 0;
    while i < words.len() {
        let side = words[i].as_str();
        if !matches!(side, "top" | "right" | "bottom" | "left") {
            return Err(format!("unexpected `{side}` in `{kind}`, expected a side"));
        }
        let offset = match words.get(i + 1) {
            Some(next) if !matches!(next.as_str(), "top" | "right" | "bottom" | "left") => {
                i += 1;
                next.as_str()
            }
            _ => "0",
        };
        items.push(decl(side, offset));
        i += 1;
    }
    Ok(items)
}
