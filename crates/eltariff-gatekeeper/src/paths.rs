//! JSON path helpers for violation locations

/// `parent.key`, or `key` at the root
pub fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// `parent[i]`
pub fn index(parent: &str, i: usize) -> String {
    format!("{}[{}]", parent, i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(join("", "tariffs"), "tariffs");
        assert_eq!(join(&index("tariffs", 0), "name"), "tariffs[0].name");
    }
}
