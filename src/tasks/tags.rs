//! Tag helpers shared by tasks.

use crate::provider::Tags;

/// Tag carrying the resource name.
pub const NAME_TAG: &str = "Name";

/// Tag carrying the owning project.
pub const PROJECT_TAG: &str = "converge.io/project";

/// Keeps the remote tags whose keys are declared, with their remote values.
///
/// Undeclared remote tags are dropped so that foreign tags never show up as
/// drift; declared tags missing remotely are absent from the result.
#[must_use]
pub fn intersect_tags(remote: &Tags, desired: &Tags) -> Tags {
    remote
        .iter()
        .filter(|(k, _)| desired.contains_key(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Gets the value of the name tag.
#[must_use]
pub fn find_name_tag(tags: &Tags) -> Option<String> {
    tags.get(NAME_TAG).cloned()
}

/// Formats tags as `k=v` pairs for display.
#[must_use]
pub fn format_tags(tags: &Tags) -> String {
    tags.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_intersection_drops_foreign_and_keeps_remote_values() {
        let remote = tags(&[("a", "1"), ("b", "2"), ("foreign", "9")]);
        let desired = tags(&[("a", "1"), ("b", "3")]);

        assert_eq!(intersect_tags(&remote, &desired), tags(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_intersection_omits_desired_only_keys() {
        let remote = tags(&[("a", "1")]);
        let desired = tags(&[("a", "1"), ("new", "x")]);

        assert_eq!(intersect_tags(&remote, &desired), tags(&[("a", "1")]));
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(format_tags(&tags(&[("b", "2"), ("a", "1")])), "a=1,b=2");
        assert_eq!(format_tags(&Tags::new()), "");
    }
}
