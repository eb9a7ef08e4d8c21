//! Small shared helpers for naming and selectors

use std::collections::BTreeMap;

use chrono::Utc;

/// Maximum length of a Kubernetes object name (DNS label limits aside,
/// namespaces cap at 63 characters).
const MAX_NAME_LEN: usize = 63;

/// Generate a unique namespace name for a test case:
/// `kubetest-{sanitized test name}-{UTC timestamp to microseconds}`.
///
/// The test name is lowercased and underscores become hyphens so Rust
/// test function names produce valid DNS labels. The result is truncated
/// to the 63-character namespace limit; the timestamp suffix keeps
/// truncated names unique.
pub fn new_namespace(test_name: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d-%H-%M-%S-%6f").to_string();
    let sanitized = test_name.to_lowercase().replace('_', "-");

    let prefix_len = "kubetest-".len() + timestamp.len() + 1;
    let budget = MAX_NAME_LEN.saturating_sub(prefix_len);
    // Truncation must land on a char boundary; test names are not
    // guaranteed to be ASCII.
    let mut end = budget.min(sanitized.len());
    while !sanitized.is_char_boundary(end) {
        end -= 1;
    }

    format!("kubetest-{}-{timestamp}", &sanitized[..end])
}

/// Render a label map as a comma-joined selector string
/// (`app=web,tier=frontend`), the form list endpoints accept.
pub fn selector_string(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_namespace_format() {
        let ns = new_namespace("test_deployment_rollout");
        assert!(ns.starts_with("kubetest-test-deployment-rollout-"));
        assert!(ns.len() <= MAX_NAME_LEN);
        assert!(!ns.contains('_'));
        assert_eq!(ns, ns.to_lowercase());
    }

    #[test]
    fn test_new_namespace_truncates_long_names() {
        let long = "a".repeat(100);
        let ns = new_namespace(&long);
        assert!(ns.len() <= MAX_NAME_LEN);
        assert!(ns.starts_with("kubetest-aaa"));
    }

    #[test]
    fn test_new_namespace_truncates_multibyte_names() {
        let long = "é".repeat(40);
        let ns = new_namespace(&long);
        assert!(ns.len() <= MAX_NAME_LEN);
        assert!(ns.starts_with("kubetest-é"));
    }

    #[test]
    fn test_new_namespace_unique() {
        assert_ne!(new_namespace("t"), new_namespace("t"));
    }

    #[test]
    fn test_selector_string() {
        let labels = BTreeMap::from([
            ("app".to_string(), "web".to_string()),
            ("tier".to_string(), "frontend".to_string()),
        ]);
        assert_eq!(selector_string(&labels), "app=web,tier=frontend");
        assert_eq!(selector_string(&BTreeMap::new()), "");
    }
}
