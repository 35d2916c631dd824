//! Value text helpers: splitting, variable substitution, and arithmetic.

/// Split `text` on `sep` outside of strings, parentheses and brackets.
///
/// Parts are trimmed; empty parts are kept so callers can reject them.
pub fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut cur = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if let Some(q) = quote {
            cur.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                cur.push(c);
            }
            '(' | '[' => {
                depth += 1;
                cur.push(c);
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                cur.push(c);
            }
            _ if c == sep && depth == 0 => {
                parts.push(cur.trim().to_string());
                cur.clear();
            }
            _ => cur.push(c),
        }
    }
    parts.push(cur.trim().to_string());
    parts
}

/// Split a comma-separated argument list. An empty list yields no arguments.
pub fn split_args(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    split_top_level(text, ',')
}

/// Split on top-level whitespace.
pub fn split_words(text: &str) -> Vec<String> {
    split_top_level(text, ' ')
        .into_iter()
        .filter(|w| !w.is_empty())
        .collect()
}

/// Strip one level of matching quotes.
pub fn unquote(text: &str) -> &str {
    let text = text.trim();
    for q in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(q) && text.ends_with(q) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Index of the `)` matching the `(` at `open`, counting by chars.
pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

/// Replace identifiers naming a variable with the variable's value.
///
/// Strings, hash tokens, numbers and `url(...)` arguments are copied verbatim.
pub fn substitute(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == '"' || c == '\'' {
            let end = string_end(&chars, i);
            out.extend(&chars[i..end]);
            i = end;
        } else if c == '#' {
            let mut j = i + 1;
            while j < chars.len() && is_ident_char(chars[j]) {
                j += 1;
            }
            out.extend(&chars[i..j]);
            i = j;
        } else if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
            let mut j = i;
            while j < chars.len() && (chars[j].is_ascii_alphanumeric() || matches!(chars[j], '.' | '%')) {
                j += 1;
            }
            out.extend(&chars[i..j]);
            i = j;
        } else if is_ident_start(c) || (c == '-' && next.is_some_and(|n| n.is_ascii_alphabetic() || n == '_' || n == '-')) {
            let mut j = i + 1;
            while j < chars.len() && is_ident_char(chars[j]) {
                j += 1;
            }
            let name: String = chars[i..j].iter().collect();
            if chars.get(j) == Some(&'(') {
                if name.eq_ignore_ascii_case("url") {
                    let end = group_end(&chars, j);
                    out.extend(&chars[i..end]);
                    i = end;
                } else {
                    out.push_str(&name);
                    i = j;
                }
            } else {
                match lookup(&name) {
                    Some(v) => out.push_str(&v),
                    None => out.push_str(&name),
                }
                i = j;
            }
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

/// Position just past the string literal starting at `start`.
fn string_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut j = start + 1;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            c if c == quote => return j + 1,
            _ => j += 1,
        }
    }
    chars.len()
}

/// Position just past the parenthesized group starting at `open`.
fn group_end(chars: &[char], open: usize) -> usize {
    let mut depth = 0usize;
    let mut j = open;
    while j < chars.len() {
        match chars[j] {
            '"' | '\'' => {
                j = string_end(chars, j);
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return j + 1;
                }
            }
            _ => {}
        }
        j += 1;
    }
    chars.len()
}

// ============================================================================
// Arithmetic
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num { value: f64, unit: String, raw: String },
    Op(char),
    Space,
    Comma,
    Open(Option<String>),
    Close,
    Word(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Tok(Tok),
    Group { func: Option<String>, inner: Vec<Part> },
}

/// Evaluate arithmetic in a value.
///
/// `*` always applies between numbers, `+` and `-` need spaces around the
/// operator at top level, and `/` only applies inside bare parentheses.
/// Function arguments are never evaluated. Anything else that cannot be
/// computed is reproduced unchanged; dividing by zero is an error.
pub fn evaluate(value: &str) -> Result<String, String> {
    let tokens = lex(value);
    let (mut parts, _) = group(&tokens, 0);
    reduce_all(&mut parts, false)?;
    let mut out = String::with_capacity(value.len());
    render(&parts, &mut out);
    Ok(out.trim().to_string())
}

fn lex(value: &str) -> Vec<Tok> {
    let chars: Vec<char> = value.chars().collect();
    let mut tokens: Vec<Tok> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let starts_number = |c: char, next: Option<char>| {
            c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit()))
        };

        if c.is_whitespace() {
            if tokens.last() != Some(&Tok::Space) {
                tokens.push(Tok::Space);
            }
            i += 1;
        } else if c == '"' || c == '\'' {
            let end = string_end(&chars, i);
            tokens.push(Tok::Word(chars[i..end].iter().collect()));
            i = end;
        } else if c == ',' {
            tokens.push(Tok::Comma);
            i += 1;
        } else if c == '(' {
            tokens.push(Tok::Open(None));
            i += 1;
        } else if c == ')' {
            tokens.push(Tok::Close);
            i += 1;
        } else if starts_number(c, next)
            || (c == '-'
                && next.is_some_and(|n| starts_number(n, chars.get(i + 2).copied()))
                && matches!(
                    tokens.last(),
                    None | Some(Tok::Space | Tok::Comma | Tok::Open(_) | Tok::Op(_))
                ))
        {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let number_end = i;
            while i < chars.len() && (chars[i].is_ascii_alphabetic() || chars[i] == '%') {
                i += 1;
            }
            let raw: String = chars[start..i].iter().collect();
            let number: String = chars[start..number_end].iter().collect();
            let unit: String = chars[number_end..i].iter().collect();
            match number.parse::<f64>() {
                Ok(value) => tokens.push(Tok::Num { value, unit, raw }),
                Err(_) => tokens.push(Tok::Word(raw)),
            }
        } else if is_ident_start(c) || c == '#' || (c == '-' && next.is_some_and(is_ident_start)) {
            let start = i;
            i += 1;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            let name: String = chars[start..i].iter().collect();
            if chars.get(i) == Some(&'(') && c != '#' {
                if name.eq_ignore_ascii_case("url") {
                    let end = group_end(&chars, i);
                    tokens.push(Tok::Word(chars[start..end].iter().collect()));
                    i = end;
                } else {
                    tokens.push(Tok::Open(Some(name)));
                    i += 1;
                }
            } else {
                tokens.push(Tok::Word(name));
            }
        } else if matches!(c, '+' | '-' | '*' | '/') {
            tokens.push(Tok::Op(c));
            i += 1;
        } else {
            tokens.push(Tok::Word(c.to_string()));
            i += 1;
        }
    }
    tokens
}

/// Nest tokens into parenthesized groups. Returns the parts and the index after the group.
fn group(tokens: &[Tok], mut i: usize) -> (Vec<Part>, usize) {
    let mut parts = Vec::new();
    while i < tokens.len() {
        match &tokens[i] {
            Tok::Open(func) => {
                let (inner, next) = group(tokens, i + 1);
                parts.push(Part::Group {
                    func: func.clone(),
                    inner,
                });
                i = next;
            }
            Tok::Close => return (parts, i + 1),
            tok => {
                parts.push(Part::Tok(tok.clone()));
                i += 1;
            }
        }
    }
    (parts, i)
}

fn reduce_all(parts: &mut Vec<Part>, in_parens: bool) -> Result<(), String> {
    for part in parts.iter_mut() {
        let mut computed = None;
        if let Part::Group { func: None, inner } = part {
            reduce_all(inner, true)?;
            let significant: Vec<&Part> = inner
                .iter()
                .filter(|p| !matches!(p, Part::Tok(Tok::Space)))
                .collect();
            if let [Part::Tok(num @ Tok::Num { .. })] = significant.as_slice() {
                computed = Some((*num).clone());
            }
        }
        if let Some(num) = computed {
            *part = Part::Tok(num);
        }
    }
    reduce(parts, &['*', '/'], in_parens)?;
    reduce(parts, &['+', '-'], in_parens)
}

fn reduce(parts: &mut Vec<Part>, ops: &[char], in_parens: bool) -> Result<(), String> {
    let is_space = |p: Option<&Part>| matches!(p, Some(Part::Tok(Tok::Space)));
    let mut i = 0;
    while i < parts.len() {
        let Part::Tok(Tok::Op(op)) = parts[i] else {
            i += 1;
            continue;
        };
        if !ops.contains(&op) {
            i += 1;
            continue;
        }

        let spaced_left = i > 0 && is_space(parts.get(i - 1));
        let spaced_right = is_space(parts.get(i + 1));
        let left = if spaced_left { i.checked_sub(2) } else { i.checked_sub(1) };
        let right = if spaced_right { i + 2 } else { i + 1 };
        let allowed = match op {
            '*' => true,
            '/' => in_parens,
            _ => in_parens || (spaced_left && spaced_right),
        };

        let result = match (allowed, left) {
            (true, Some(l)) => match (&parts[l], parts.get(right)) {
                (Part::Tok(a @ Tok::Num { .. }), Some(Part::Tok(b @ Tok::Num { .. }))) => {
                    compute(op, a, b)?.map(|r| (l, r))
                }
                _ => None,
            },
            _ => None,
        };

        match result {
            Some((l, tok)) => {
                parts.splice(l..=right, [Part::Tok(tok)]);
                i = l + 1;
            }
            None => i += 1,
        }
    }
    Ok(())
}

fn compute(op: char, a: &Tok, b: &Tok) -> Result<Option<Tok>, String> {
    let (
        Tok::Num {
            value: x, unit: ua, ..
        },
        Tok::Num {
            value: y, unit: ub, ..
        },
    ) = (a, b)
    else {
        return Ok(None);
    };

    if op == '/' && *y == 0.0 {
        let raw = |t: &Tok| match t {
            Tok::Num { raw, .. } => raw.clone(),
            _ => String::new(),
        };
        return Err(format!("division by zero in `{} / {}`", raw(a), raw(b)));
    }

    let unit = match op {
        '+' | '-' if ua == ub || ub.is_empty() => ua.clone(),
        '+' | '-' if ua.is_empty() => ub.clone(),
        '*' if ua.is_empty() || ub.is_empty() => format!("{ua}{ub}"),
        '/' if ub.is_empty() => ua.clone(),
        '/' if ua == ub => String::new(),
        _ => return Ok(None),
    };
    let value = match op {
        '+' => x + y,
        '-' => x - y,
        '*' => x * y,
        '/' => x / y,
        _ => return Ok(None),
    };
    Ok(Some(Tok::Num {
        value,
        raw: format!("{}{unit}", format_number(value)),
        unit,
    }))
}

/// Format a computed number without trailing zeros.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn render(parts: &[Part], out: &mut String) {
    for part in parts {
        match part {
            Part::Tok(tok) => match tok {
                Tok::Num { raw, .. } => out.push_str(raw),
                Tok::Op(c) => out.push(*c),
                Tok::Space => out.push(' '),
                Tok::Comma => out.push(','),
                Tok::Word(w) => out.push_str(w),
                Tok::Open(Some(name)) => {
                    out.push_str(name);
                    out.push('(');
                }
                Tok::Open(None) => out.push('('),
                Tok::Close => out.push(')'),
            },
            Part::Group { func, inner } => {
                if let Some(name) = func {
                    out.push_str(name);
                }
                out.push('(');
                render(inner, out);
                out.push(')');
            }
        }
    }
}
