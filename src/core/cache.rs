//! Process-wide content-keyed caches.
//!
//! Two independent caches live here:
//!   - a Unicode-property validity oracle backed by the `regex` crate
//!     (compiling a one-off `\p{Name}` pattern is the only reliable way to
//!     ask "does this engine recognize this property name" without vendoring
//!     the Unicode property tables ourselves);
//!   - a quantifier-bounds parse cache, since `{n,m}` reprs are revisited
//!     repeatedly across `firstChars`/`lastChars`, the validator, and the
//!     ReDoS profiler for the same node.
//!
//! Both are write-once-per-key and safe to share across threads, via a
//! lazily-initialized mutex-guarded map.

use once_cell::sync::Lazy;
use regex::Regex as EngineRegex;
use std::collections::HashMap;
use std::sync::Mutex;

static UNICODE_PROPERTY_CACHE: Lazy<Mutex<HashMap<String, bool>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

static QUANTIFIER_BOUNDS_CACHE: Lazy<Mutex<HashMap<String, (u32, Option<u32>)>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Whether `\p{name}` (or `\P{name}`) is a property name the `regex` crate's
/// Unicode tables recognize. Used by the validator as an oracle for
/// `regex.unicode.unsupported_property`.
///
/// `name` should be the bare property name/alias, without `\p{`/`}` or a
/// leading `^` negation marker.
pub fn is_known_unicode_property(name: &str) -> bool {
    if let Some(hit) = UNICODE_PROPERTY_CACHE.lock().unwrap().get(name) {
        log::trace!("unicode property cache hit for {name:?}");
        return *hit;
    }
    let probe = format!(r"\p{{{}}}", name);
    let known = EngineRegex::new(&probe).is_ok();
    log::debug!("unicode property cache miss for {name:?}, probed as {known}");
    UNICODE_PROPERTY_CACHE
        .lock()
        .unwrap()
        .insert(name.to_string(), known);
    known
}

/// Whether `\N{name}` is a recognized Unicode character name. The `regex`
/// crate has no surface for named-character lookup, so this is approximated
/// by recognizing the always-valid `U+XXXX` spelling PCRE also accepts; any
/// other name is treated as unknown (conservative: callers only use this to
/// emit a validation error, never to accept a pattern).
pub fn is_known_unicode_name(name: &str) -> bool {
    if let Some(hex) = name.strip_prefix("U+") {
        return hex.len() >= 2 && hex.len() <= 6 && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    false
}

/// Parse a quantifier's source representation (`*`, `+`, `?`, `{n}`,
/// `{n,}`, `{n,m}`, each optionally followed by `?` or `+` for
/// laziness/possessiveness, already stripped by the caller) into `(min,
/// max)`. `max` is `None` for unbounded quantifiers.
///
/// Malformed reprs (which the parser should never hand us) parse as `(0,
/// None)`, the most permissive reading, rather than panicking.
pub fn parse_quantifier_bounds(repr: &str) -> (u32, Option<u32>) {
    let base = repr.trim_end_matches(['?', '+']);
    if let Some(hit) = QUANTIFIER_BOUNDS_CACHE.lock().unwrap().get(base) {
        log::trace!("quantifier bounds cache hit for {base:?}");
        return *hit;
    }
    let parsed = parse_quantifier_bounds_uncached(base);
    log::trace!("quantifier bounds cache miss for {base:?}, parsed as {parsed:?}");
    QUANTIFIER_BOUNDS_CACHE
        .lock()
        .unwrap()
        .insert(base.to_string(), parsed);
    parsed
}

fn parse_quantifier_bounds_uncached(base: &str) -> (u32, Option<u32>) {
    match base {
        "*" => (0, None),
        "+" => (1, None),
        "?" => (0, Some(1)),
        _ if base.starts_with('{') && base.ends_with('}') => {
            let inner = &base[1..base.len() - 1];
            match inner.split_once(',') {
                Some((lo, hi)) => {
                    let min = lo.trim().parse().unwrap_or(0);
                    let max = if hi.trim().is_empty() {
                        None
                    } else {
                        hi.trim().parse().ok()
                    };
                    (min, max)
                }
                None => {
                    let n = inner.trim().parse().unwrap_or(0);
                    (n, Some(n))
                }
            }
        }
        _ => (0, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_star_plus_question() {
        assert_eq!(parse_quantifier_bounds("*"), (0, None));
        assert_eq!(parse_quantifier_bounds("+"), (1, None));
        assert_eq!(parse_quantifier_bounds("?"), (0, Some(1)));
    }

    #[test]
    fn parses_brace_forms() {
        assert_eq!(parse_quantifier_bounds("{3}"), (3, Some(3)));
        assert_eq!(parse_quantifier_bounds("{2,}"), (2, None));
        assert_eq!(parse_quantifier_bounds("{2,5}"), (2, Some(5)));
    }

    #[test]
    fn strips_laziness_and_possessive_suffix() {
        assert_eq!(parse_quantifier_bounds("*?"), (0, None));
        assert_eq!(parse_quantifier_bounds("{2,5}+"), (2, Some(5)));
    }

    #[test]
    fn unicode_property_oracle_accepts_known_rejects_garbage() {
        assert!(is_known_unicode_property("L"));
        assert!(!is_known_unicode_property("Not_A_Real_Property_Xyz"));
    }

    #[test]
    fn repeated_lookup_hits_cache_and_agrees_with_fresh_value() {
        assert_eq!(is_known_unicode_property("N"), is_known_unicode_property("N"));
    }
}
