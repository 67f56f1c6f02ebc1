//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a property name (starts with a letter, no `=`)
    pub fn property_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9_]{0,15}"
    }

    /// Generate a property value, possibly empty
    pub fn property_value() -> impl Strategy<Value = String> {
        "[A-Za-z0-9.;=_-]{0,12}"
    }

    /// Generate a `(name, value)` property pair
    pub fn property_pair() -> impl Strategy<Value = (String, String)> {
        (property_name(), property_value())
    }

    /// Generate a target name
    pub fn target_name() -> impl Strategy<Value = String> {
        "[A-Z][A-Za-z]{0,11}"
    }

    /// Generate a relative project file path
    pub fn project_path() -> impl Strategy<Value = String> {
        (
            "[A-Za-z][A-Za-z0-9]{0,8}",
            prop_oneof![Just("csproj"), Just("fsproj"), Just("vbproj"), Just("proj")],
        )
            .prop_map(|(name, ext)| format!("src/{name}/{name}.{ext}"))
    }

    /// Generate a plain argument that never names a tool, verb, or project
    pub fn plain_argument() -> impl Strategy<Value = String> {
        prop_oneof![
            property_pair().prop_map(|(n, v)| format!("/p:{n}={v}")),
            target_name().prop_map(|t| format!("/t:{t}")),
            "-[a-z]{1,8}",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_property_name_has_no_separator(name in property_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(!name.contains('='));
        }

        #[test]
        fn test_project_path_is_project_file(path in project_path()) {
            prop_assert!(crate::infra::discover::is_project_file(std::path::Path::new(&path)));
        }

        #[test]
        fn test_plain_argument_is_a_switch(arg in plain_argument()) {
            prop_assert!(arg.starts_with('/') || arg.starts_with('-'));
        }
    }
}
