//! Mapping between dotted namespace paths and generated type names.
//!
//! The mapping is deterministic so a consumer can compute the type name of a
//! unit without compiling it: the trailing path segment is capitalized and
//! suffixed with [`TYPE_NAME_MARKER`].

/// File suffix every glang source file carries.
pub const SOURCE_SUFFIX: &str = ".glang";

/// Suffix appended to the trailing segment of a generated type name.
pub const TYPE_NAME_MARKER: &str = "Ns";

/// Derive the generated type name for a dotted namespace path.
///
/// `a.b.test` becomes `a.b.TestNs`.
pub fn type_name_for(namespace: &str) -> String {
    let (package, leaf) = match namespace.rfind('.') {
        Some(idx) => (&namespace[..=idx], &namespace[idx + 1..]),
        None => ("", namespace),
    };
    let mut name = String::with_capacity(namespace.len() + TYPE_NAME_MARKER.len());
    name.push_str(package);
    let mut chars = leaf.chars();
    if let Some(first) = chars.next() {
        name.extend(first.to_uppercase());
        name.push_str(chars.as_str());
    }
    name.push_str(TYPE_NAME_MARKER);
    name
}

/// Derive the dotted namespace path from a source path like `a/b/test.glang`.
///
/// Returns `None` when the path does not carry [`SOURCE_SUFFIX`].
pub fn namespace_for_path(path: &str) -> Option<String> {
    let stem = path.strip_prefix("./").unwrap_or(path).strip_suffix(SOURCE_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.replace(['/', '\\'], "."))
}

/// Map a generated type name back to the source path it was compiled from.
///
/// Nested type qualifiers (`$Inner`) are dropped since they live in the same
/// source file as their outer type. Returns `None` for names that were not
/// produced by [`type_name_for`].
pub fn source_path_for(type_name: &str) -> Option<String> {
    let outer = type_name.split('$').next().unwrap_or(type_name);
    let (package, leaf) = match outer.rfind('.') {
        Some(idx) => (&outer[..idx], &outer[idx + 1..]),
        None => ("", outer),
    };
    let leaf = leaf.strip_suffix(TYPE_NAME_MARKER)?;
    let mut chars = leaf.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    let mut path = String::with_capacity(outer.len() + SOURCE_SUFFIX.len());
    if !package.is_empty() {
        path.push_str(&package.replace('.', "/"));
        path.push('/');
    }
    path.extend(first.to_lowercase());
    path.push_str(chars.as_str());
    path.push_str(SOURCE_SUFFIX);
    Some(path)
}
