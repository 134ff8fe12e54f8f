//! Small text helpers shared by the filter parser and the predicate compiler.

use std::collections::BTreeSet;

/// Separator for alternatives inside one filter value, e.g. `label:cat|dog`.
pub const OR: char = '|';
/// Separator for required terms besides whitespace, e.g. `subject:jane&john`.
pub const AND: char = '&';

pub const YEAR_MAX: i64 = 9999;
pub const MONTH_MAX: i64 = 12;
pub const DAY_MAX: i64 = 31;

/// Stored in year/month/day when the capture date is not known.
pub const UNKNOWN: i64 = -1;

pub fn split_or(s: &str) -> Vec<String> {
    s.split(OR).map(str::trim).filter(|v| !v.is_empty()).map(str::to_string).collect()
}

pub fn split_and(s: &str) -> Vec<String> {
    s.split(|c: char| c == AND || c.is_whitespace())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_yes(s: &str) -> bool {
    matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1" | "y" | "on" | "include")
}

pub fn is_no(s: &str) -> bool {
    matches!(s.trim().to_ascii_lowercase().as_str(), "false" | "no" | "0" | "n" | "off" | "none" | "exclude")
}

pub fn is_new(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("new")
}

/// Absent, yes or no. `Err` for anything else.
pub fn tri_state(s: &str) -> Result<Option<bool>, ()> {
    if s.trim().is_empty() {
        Ok(None)
    } else if is_yes(s) {
        Ok(Some(true))
    } else if is_no(s) {
        Ok(Some(false))
    } else {
        Err(())
    }
}

pub fn is_uint(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_pos_int(s: &str) -> bool {
    is_uint(s) && s.parse::<i64>().map(|n| n > 0).unwrap_or(false)
}

/// Entity ids are 16 lowercase alphanumerics starting with the entity prefix.
pub fn is_uid(s: &str, prefix: char) -> bool {
    s.len() == 16
        && s.starts_with(prefix)
        && s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Hex encoded SHA1 or SHA256 content hash.
pub fn is_hash(s: &str) -> bool {
    (s.len() == 40 || s.len() == 64) && hex::decode(s).is_ok()
}

/// Parses `n` or `min-max` (either bound may be negative) and clamps into `[lo, hi]`.
/// Returns `None` when the input is unusable or entirely outside the domain.
pub fn int_range(s: &str, lo: i64, hi: i64) -> Option<(i64, i64)> {
    let (a, b) = split_range(s, |v| v.parse::<i64>().ok())?;
    let (a, b) = if a > b { (b, a) } else { (a, b) };
    if b < lo || a > hi {
        return None;
    }
    Some((a.max(lo), b.min(hi)))
}

pub fn float_range(s: &str, lo: f64, hi: f64) -> Option<(f64, f64)> {
    let (a, b) = split_range(s, |v| v.parse::<f64>().ok().filter(|f| f.is_finite()))?;
    let (a, b) = if a > b { (b, a) } else { (a, b) };
    if b < lo || a > hi {
        return None;
    }
    Some((a.max(lo), b.min(hi)))
}

fn split_range<T: Copy>(s: &str, parse: impl Fn(&str) -> Option<T>) -> Option<(T, T)> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(v) = parse(s) {
        return Some((v, v));
    }
    for (i, c) in s.char_indices().skip(1) {
        if c != '-' {
            continue;
        }
        if let (Some(a), Some(b)) = (parse(s[..i].trim()), parse(s[i + 1..].trim())) {
            return Some((a, b));
        }
    }
    None
}

/// Integer alternatives for year/month/day filters. `unknown` and `-1` map to
/// [`UNKNOWN`]; values outside `1..=max` are dropped.
pub fn any_int(s: &str, max: i64) -> Vec<i64> {
    let mut out = Vec::new();
    for v in split_or(s) {
        let n = if v.eq_ignore_ascii_case("unknown") {
            UNKNOWN
        } else {
            match v.parse::<i64>() {
                Ok(n) if n == UNKNOWN || (1..=max).contains(&n) => n,
                _ => continue,
            }
        };
        if !out.contains(&n) {
            out.push(n);
        }
    }
    out
}

pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut dash = false;
    for c in s.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Alphanumeric runs of `s`, in order.
pub fn words(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lowercase word set of a free text query. Empty when the query has no words,
/// e.g. when it is only made of wildcards.
pub fn search_terms(s: &str) -> BTreeSet<String> {
    words(&s.to_lowercase()).into_iter().collect()
}

/// Collapses whitespace left behind after removing words from a query.
pub fn clean_query(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escapes LIKE metacharacters for use with `ESCAPE '\'`.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Turns a user pattern into a LIKE prefix pattern. `*` is the only wildcard.
pub fn like_prefix(s: &str) -> String {
    format!("{}%", escape_like(s.trim().trim_matches('*')).replace('*', "%"))
}

/// LIKE pattern that matches the value exactly unless it contains `*`.
pub fn like_pattern(s: &str) -> String {
    escape_like(s.trim()).replace('*', "%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_or_and() {
        assert_eq!(split_or("cat| dog||"), vec!["cat", "dog"]);
        assert_eq!(split_and("jane & john  doe"), vec!["jane", "john", "doe"]);
        assert!(split_or("").is_empty());
    }

    #[test]
    fn test_tri_state() {
        assert_eq!(tri_state(""), Ok(None));
        assert_eq!(tri_state("yes"), Ok(Some(true)));
        assert_eq!(tri_state("1"), Ok(Some(true)));
        assert_eq!(tri_state("False"), Ok(Some(false)));
        assert!(tri_state("maybe").is_err());
    }

    #[test]
    fn test_int_range() {
        assert_eq!(int_range("200", 0, 10_000_000), Some((200, 200)));
        assert_eq!(int_range("100-400", 0, 10_000_000), Some((100, 400)));
        assert_eq!(int_range("400-100", 0, 10_000_000), Some((100, 400)));
        assert_eq!(int_range("-100-50", -6_378_000, 1_000_000_000), Some((-100, 50)));
        assert_eq!(int_range("-200--100", -6_378_000, 1_000_000_000), Some((-200, -100)));
        assert_eq!(int_range("50-90000", 0, 32000), Some((50, 32000)));
        assert_eq!(int_range("40000-50000", 0, 32000), None);
        assert_eq!(int_range("abc", 0, 100), None);
        assert_eq!(int_range("", 0, 100), None);
    }

    #[test]
    fn test_float_range() {
        assert_eq!(float_range("1.8-4", 0.0, 10_000_000.0), Some((1.8, 4.0)));
        assert_eq!(float_range("2.8", 0.0, 10_000_000.0), Some((2.8, 2.8)));
        assert_eq!(float_range("nan", 0.0, 1.0), None);
    }

    #[test]
    fn test_any_int() {
        assert_eq!(any_int("2016|2018", YEAR_MAX), vec![2016, 2018]);
        assert_eq!(any_int("unknown|-1|13|5", MONTH_MAX), vec![UNKNOWN, 5]);
        assert!(any_int("x", DAY_MAX).is_empty());
    }

    #[test]
    fn test_uid_and_hash() {
        assert!(is_uid("at9lxuqxpogaaba7", 'a'));
        assert!(!is_uid("pt9lxuqxpogaaba7", 'a'));
        assert!(!is_uid("at9lxuqxpogaaba", 'a'));
        assert!(!is_uid("AT9LXUQXPOGAABA7", 'a'));
        assert!(is_hash("2cad9168fa6acc5c5c2965ddf6ec465ca42fd818"));
        assert!(!is_hash("2cad9168fa6acc5c5c2965ddf6ec465ca42fd81z"));
    }

    #[test]
    fn test_slug_and_terms() {
        assert_eq!(slug("  Lake Como! "), "lake-como");
        assert_eq!(slug("Café"), "café");
        let terms = search_terms("Cat videos");
        assert!(terms.contains("videos"));
        assert!(terms.contains("cat"));
        assert!(search_terms("**").is_empty());
        assert_eq!(clean_query("  a   b "), "a b");
        assert_eq!(like_prefix("*canon*"), "canon%");
        assert_eq!(like_pattern("IMG_*"), r"IMG\_%");
        assert_eq!(like_pattern("100%"), r"100\%");
        assert_eq!(like_prefix(r"a\b*"), r"a\\b%");
        assert_eq!(escape_like("plain"), "plain");
    }
}
