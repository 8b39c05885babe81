use std::fmt;

/// A type name split into namespace path and simple name.
///
/// Namespaces are joined with `::`, the separator the unit language uses.
/// Generic arguments stay attached to the simple name.
///
/// # Examples
///
/// ```
/// use stencil_core::QualifiedName;
///
/// let person = QualifiedName::from_qualified_string("app::models::Person");
/// assert_eq!(person.name, "Person");
/// assert_eq!(person.namespace, vec!["app".to_string(), "models".to_string()]);
///
/// let wrapped = QualifiedName::from_qualified_string("app::Page<app::Item>");
/// assert_eq!(wrapped.name, "Page<app::Item>");
/// assert_eq!(wrapped.namespace_path(), "app");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Simple name, including any generic arguments.
    pub name: String,
    /// Namespace path; empty for the global namespace.
    pub namespace: Vec<String>,
}

impl QualifiedName {
    pub fn new(name: impl Into<String>, namespace: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
        }
    }

    pub fn global(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Split a `::`-separated string. Separators inside `<...>` belong to
    /// generic arguments and do not split.
    pub fn from_qualified_string(s: &str) -> Self {
        let s = s.trim_start_matches("::");
        let mut depth = 0usize;
        let mut parts = Vec::new();
        let mut start = 0;
        let bytes = s.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'<' => depth += 1,
                b'>' => depth = depth.saturating_sub(1),
                b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                    parts.push(&s[start..i]);
                    i += 2;
                    start = i;
                    continue;
                }
                _ => {}
            }
            i += 1;
        }
        parts.push(&s[start..]);

        let name = parts.pop().unwrap_or_default().to_string();
        let namespace = parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        Self { name, namespace }
    }

    pub fn is_global(&self) -> bool {
        self.namespace.is_empty()
    }

    /// The namespace joined with `::`.
    pub fn namespace_path(&self) -> String {
        self.namespace.join("::")
    }

    /// Every namespace prefix, outermost first: `a::b::T` yields `a`, `a::b`.
    pub fn namespace_prefixes(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.namespace.len()).map(|n| self.namespace[..n].join("::"))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ns in &self.namespace {
            write!(f, "{ns}::")?;
        }
        f.write_str(&self.name)
    }
}

/// Normalize a host type name into the form the unit language accepts.
///
/// Whitespace is removed (`Pair<a::A, b::B>` becomes `Pair<a::A,b::B>`).
/// Returns `None` for names no synthesized unit could spell: anonymous types
/// (closures, `impl Trait`), references, pointers, slices, arrays, tuples,
/// trait objects, and function pointers.
pub fn normalize_type_name(raw: &str) -> Option<String> {
    if raw.contains("dyn ") || raw.contains("impl ") {
        return None;
    }
    let name: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if name.is_empty() {
        return None;
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '<' | '>' | ','))
    {
        return None;
    }
    validate_path(&name).then_some(name)
}

/// Check that every path segment is an identifier and brackets balance.
fn validate_path(name: &str) -> bool {
    let mut depth = 0i32;
    let mut segment_start = true;
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ':' => {
                if chars.next() != Some(':') || segment_start {
                    return false;
                }
                segment_start = true;
            }
            '<' => {
                if segment_start {
                    return false;
                }
                depth += 1;
                segment_start = true;
            }
            ',' => {
                if depth == 0 || segment_start {
                    return false;
                }
                segment_start = true;
            }
            '>' => {
                depth -= 1;
                if depth < 0 || segment_start {
                    return false;
                }
            }
            c if segment_start => {
                if c.is_ascii_digit() {
                    return false;
                }
                segment_start = false;
            }
            _ => {}
        }
    }
    depth == 0 && !segment_start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_top_level_separators_only() {
        let q = QualifiedName::from_qualified_string("a::b::Map<k::K,v::V>");
        assert_eq!(q.name, "Map<k::K,v::V>");
        assert_eq!(q.namespace_path(), "a::b");
        assert_eq!(q.to_string(), "a::b::Map<k::K,v::V>");
    }

    #[test]
    fn global_names_have_no_namespace() {
        let q = QualifiedName::from_qualified_string("Person");
        assert!(q.is_global());
        assert_eq!(q, QualifiedName::global("Person"));
    }

    #[test]
    fn prefixes_outermost_first() {
        let q = QualifiedName::from_qualified_string("a::b::T");
        let prefixes: Vec<_> = q.namespace_prefixes().collect();
        assert_eq!(prefixes, vec!["a".to_string(), "a::b".to_string()]);
    }

    #[test]
    fn normalizes_generic_spacing() {
        assert_eq!(
            normalize_type_name("app::Pair<app::A, app::B>").as_deref(),
            Some("app::Pair<app::A,app::B>")
        );
        assert_eq!(normalize_type_name("Person").as_deref(), Some("Person"));
    }

    #[test]
    fn rejects_unnameable_types() {
        for raw in [
            "",
            "app::main::{{closure}}",
            "&app::Person",
            "(i32, i32)",
            "[u8; 4]",
            "dyn core::any::Any",
            "fn(i32) -> i32",
            "app::",
            "::",
            "app::Vec<>",
            "app::Vec<a::B",
            "9lives::Cat",
        ] {
            assert_eq!(normalize_type_name(raw), None, "{raw:?} should be rejected");
        }
    }
}
