//! Local filename derivation
//!
//! A resource's filename is derived once, when its manifest entry is first
//! created, and never recomputed. Renaming a resource on the hub therefore
//! leaves the local file where it is.

use crate::resource::Resource;
use crate::{Error, Result};

/// Extension of every synchronized source file
pub const SOURCE_EXTENSION: &str = "groovy";

/// Derive `{namespace}-{normalized name}.groovy` for a resource.
///
/// The name is lowercased and each whitespace run becomes one underscore.
/// Path separators are replaced so the result is always a single file name.
pub fn derive_filename(resource: &Resource) -> Result<String> {
    let name = resource.name.trim();
    let namespace = resource.namespace.trim();

    if name.is_empty() {
        return Err(Error::InvalidResource {
            message: format!("{} {} has an empty name", resource.kind, resource.id),
        });
    }
    if namespace.is_empty() {
        return Err(Error::InvalidResource {
            message: format!("{} {} has an empty namespace", resource.kind, resource.id),
        });
    }

    Ok(format!(
        "{}-{}.{}",
        sanitize(namespace),
        sanitize(&normalize_name(name)),
        SOURCE_EXTENSION
    ))
}

/// Lowercase and collapse whitespace runs into single underscores.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

fn sanitize(part: &str) -> String {
    part.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::CodeType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn resource(namespace: &str, name: &str) -> Resource {
        Resource {
            id: 7,
            kind: CodeType::Driver,
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    #[rstest]
    #[case("acme", "Door Sensor", "acme-door_sensor.groovy")]
    #[case("acme", "Door   Sensor\tV2", "acme-door_sensor_v2.groovy")]
    #[case("jdoe", "Lights", "jdoe-lights.groovy")]
    #[case("acme", "  Padded Name ", "acme-padded_name.groovy")]
    #[case("acme", "On/Off Switch", "acme-on_off_switch.groovy")]
    fn derives_expected_filename(#[case] ns: &str, #[case] name: &str, #[case] expected: &str) {
        assert_eq!(derive_filename(&resource(ns, name)).unwrap(), expected);
    }

    #[test]
    fn empty_name_is_invalid() {
        let err = derive_filename(&resource("acme", "  ")).unwrap_err();
        assert!(matches!(err, Error::InvalidResource { .. }));
    }

    #[test]
    fn empty_namespace_is_invalid() {
        let err = derive_filename(&resource("", "Door")).unwrap_err();
        assert!(matches!(err, Error::InvalidResource { .. }));
    }
}
