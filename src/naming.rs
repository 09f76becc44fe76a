//! Identifier sanitization and unique display names.

/// Words that are never emitted as bare property names.
const RESERVED_WORDS: &[&str] = &[
    "do", "if", "in", "for", "let", "new", "try", "var", "case", "else", "enum", "eval", "null",
    "this", "true", "void", "with", "await", "break", "catch", "class", "const", "false", "super",
    "throw", "while", "yield", "delete", "export", "import", "public", "return", "static",
    "switch", "typeof", "default", "extends", "finally", "package", "private", "continue",
    "debugger", "function", "arguments", "interface", "protected", "implements", "instanceof",
];

/// Fallback base for geometry display names whose source name has no letters.
pub const FALLBACK_DISPLAY_NAME: &str = "Part";

fn is_identifier_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_alphabetic()
}

fn is_identifier_continue(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_alphanumeric() || ch == '\u{200c}' || ch == '\u{200d}'
}

/// Whether `name` can appear after a `.` in a property access.
pub fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    is_identifier_start(first)
        && chars.all(is_identifier_continue)
        && !RESERVED_WORDS.contains(&name)
}

/// Single-quoted literal with `\` and `'` escaped.
pub fn quote_single(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// `.name` when `name` is a bare identifier, `['name']` otherwise.
pub fn property_suffix(name: &str) -> String {
    if is_bare_identifier(name) {
        format!(".{name}")
    } else {
        format!("[{}]", quote_single(name))
    }
}

pub fn property_access(base: &str, name: &str) -> String {
    format!("{base}{}", property_suffix(name))
}

/// Key in an object literal or type: bare when possible, quoted otherwise.
pub fn object_key(name: &str) -> String {
    if is_bare_identifier(name) {
        name.to_string()
    } else {
        quote_single(name)
    }
}

/// Letters only, first letter capitalized, `FALLBACK_DISPLAY_NAME` if nothing remains.
pub fn display_base_name(source: &str) -> String {
    let letters: String = source.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() {
        return FALLBACK_DISPLAY_NAME.to_string();
    }
    let mut chars = letters.chars();
    let mut out = String::with_capacity(letters.len());
    if let Some(first) = chars.next() {
        out.push(first.to_ascii_uppercase());
    }
    out.extend(chars);
    out
}

/// `base`, then `base1`, `base2`, ... until `taken` reports the name as free.
pub fn probe_unique(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut suffix: u64 = 1;
    loop {
        let candidate = format!("{base}{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bare_identifiers_use_dotted_access() {
        assert_eq!(property_access("nodes", "foo"), "nodes.foo");
        assert_eq!(property_access("nodes", "_x$1"), "nodes._x$1");
        assert_eq!(property_access("nodes", "Würfel"), "nodes.Würfel");
    }

    #[test]
    fn everything_else_uses_bracket_access() {
        assert_eq!(property_access("nodes", "foo bar"), "nodes['foo bar']");
        assert_eq!(property_access("nodes", ""), "nodes['']");
        assert_eq!(property_access("nodes", "1st"), "nodes['1st']");
        assert_eq!(property_access("nodes", "Cube.001"), "nodes['Cube.001']");
        assert_eq!(property_access("nodes", "class"), "nodes['class']");
        assert_eq!(property_access("nodes", "it's"), "nodes['it\\'s']");
        assert_eq!(property_access("nodes", "🙂"), "nodes['🙂']");
    }

    #[test]
    fn object_keys_quote_when_needed() {
        assert_eq!(object_key("model"), "model");
        assert_eq!(object_key("0"), "'0'");
        assert_eq!(object_key("Cube.001"), "'Cube.001'");
    }

    #[test]
    fn display_base_name_keeps_letters() {
        assert_eq!(display_base_name("cube.001"), "Cube");
        assert_eq!(display_base_name("Wheel_FL"), "WheelFL");
        assert_eq!(display_base_name("123"), "Part");
        assert_eq!(display_base_name(""), "Part");
    }

    #[test]
    fn probe_unique_suffixes_from_one() {
        let taken: HashSet<&str> = ["Cube", "Cube1"].into_iter().collect();
        assert_eq!(probe_unique("Cube", |n| taken.contains(n)), "Cube2");
        assert_eq!(probe_unique("Wheel", |n| taken.contains(n)), "Wheel");
    }
}
