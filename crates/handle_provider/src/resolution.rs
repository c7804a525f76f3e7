//! Recognition of handle-shaped identifier strings

use handle_types::Handle;

/// Extract `prefix/suffix` from the last two path segments of a URL.
///
/// Trailing empty segments are ignored, so `http://host/1/2/` yields `1/2`.
pub fn handle_from_url(url: &str) -> Option<Handle> {
    if !url.contains('/') {
        return None;
    }

    let mut segments: Vec<&str> = url.split('/').collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    match segments.as_slice() {
        [.., prefix, suffix] => Some(Handle::new(format!("{prefix}/{suffix}"))),
        _ => None,
    }
}

/// True when `identifier` starts with one of `schemes`.
pub fn matches_scheme<S: AsRef<str>>(identifier: &str, schemes: &[S]) -> bool {
    schemes
        .iter()
        .any(|scheme| identifier.starts_with(scheme.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_last_two_segments() {
        assert_eq!(
            handle_from_url("https://repo.example.edu/handle/123456789/42"),
            Some(Handle::new("123456789/42"))
        );
        assert_eq!(
            handle_from_url("https://repo.example.edu/handle/123456789/42/"),
            Some(Handle::new("123456789/42"))
        );
        assert_eq!(
            handle_from_url("123456789/42.3"),
            Some(Handle::new("123456789/42.3"))
        );
    }

    #[test]
    fn rejects_strings_without_path() {
        assert_eq!(handle_from_url("doi:10.1000"), None);
        assert_eq!(handle_from_url("/"), None);
        assert_eq!(handle_from_url("///"), None);
    }

    #[test]
    fn scheme_prefix_matching() {
        let schemes = ["info:hdl", "hdl", "http://"];
        assert!(matches_scheme("hdl:123456789/1", &schemes));
        assert!(matches_scheme("info:hdl/123456789/1", &schemes));
        assert!(!matches_scheme("doi:10.1000/1", &schemes));
    }
}
