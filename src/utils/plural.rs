//! Pluralization for log lines.

#[inline]
fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format count with noun: `plural_count(1, "byte")` is `"1 byte"`,
/// `plural_count(0, "byte")` is `"0 bytes"`.
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "source"), "0 sources");
        assert_eq!(plural_count(1, "source"), "1 source");
        assert_eq!(plural_count(12, "byte"), "12 bytes");
    }
}
