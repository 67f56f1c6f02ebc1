//! Command line reconciliation
//!
//! Recovers the arguments a user actually typed from the full argument
//! vector of a build tool process. Everything the build engine put there
//! itself (tool verbs, its own paths, the project file) is described by an
//! [`ExclusionSet`] and filtered out with
//! [`names_match`](crate::core::matcher::names_match).

use std::path::Path;

use serde::Serialize;

use crate::core::matcher::matches_any;
use crate::core::properties::{PropertySource, RESERVED_PROPERTY_NAMES};

/// Build tool verbs and tool names never treated as user arguments
pub const TOOL_VERBS: &[&str] = &[
    "msbuild", "build", "pack", "restore", "clean", "test", "publish", "run", "dotnet",
];

/// Strings to strip from a raw argument vector
///
/// Kept as an ordered list: membership is decided by
/// [`names_match`](crate::core::matcher::names_match), which no hash can
/// agree with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    entries: Vec<String>,
    /// Reserved properties that had a value, for diagnostics
    reserved: Vec<(String, String)>,
}

impl ExclusionSet {
    /// Create an empty exclusion set
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusion set from explicit strings
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
            reserved: Vec::new(),
        }
    }

    /// Compute the exclusion set for one invocation
    ///
    /// Contains the tool verbs, the current value of every reserved property
    /// that has one, and `project_file` both as given and as a bare file name.
    pub fn from_source(source: &dyn PropertySource, project_file: &Path) -> Self {
        let mut set = Self::from_entries(TOOL_VERBS.iter().copied());

        for name in RESERVED_PROPERTY_NAMES {
            match source.property(name) {
                Some(value) if !value.is_empty() => {
                    set.entries.push(value.to_string());
                    set.reserved.push(((*name).to_string(), value.to_string()));
                }
                _ => tracing::debug!("Reserved property {name} has no value"),
            }
        }

        set.entries.push(project_file.display().to_string());
        if let Some(file_name) = project_file.file_name() {
            set.entries.push(file_name.to_string_lossy().into_owned());
        }

        set
    }

    /// Add one more string to exclude
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    /// Whether `arg` matches any excluded string
    pub fn excludes(&self, arg: &str) -> bool {
        matches_any(arg, &self.entries)
    }

    /// Excluded strings in order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Reserved properties that contributed a value
    pub fn reserved_values(&self) -> &[(String, String)] {
        &self.reserved
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of reconciling one argument vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledCommandLine {
    /// Arguments left after removing excluded ones, in original order
    pub residual: Vec<String>,
    /// The original arguments joined with single spaces
    pub rendered: String,
}

impl ReconciledCommandLine {
    /// Residual arguments joined with single spaces
    pub fn residual_line(&self) -> String {
        self.residual.join(" ")
    }
}

/// Split `raw_args` into the user's arguments and the full command line
pub fn reconcile<S: AsRef<str>>(raw_args: &[S], exclusions: &ExclusionSet) -> ReconciledCommandLine {
    let residual: Vec<String> = raw_args
        .iter()
        .map(AsRef::as_ref)
        .filter(|arg| !exclusions.excludes(arg))
        .map(str::to_string)
        .collect();

    let rendered = raw_args
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(" ");

    tracing::info!("Full command line: *{rendered}*");
    tracing::info!("Command line args: {}", residual.join(" "));
    tracing::info!(
        "Properties to remove: {}",
        exclusions
            .reserved_values()
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    );

    ReconciledCommandLine { residual, rendered }
}

/// Reconcile the arguments this process was started with
pub fn reconcile_current_process(
    source: &dyn PropertySource,
    project_file: &Path,
) -> ReconciledCommandLine {
    let raw_args: Vec<String> = std::env::args().collect();
    let exclusions = ExclusionSet::from_source(source, project_file);
    reconcile(&raw_args, &exclusions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::MIN_PROPTEST_ITERATIONS;
    use crate::core::properties::MapPropertySource;
    use crate::test_utils::generators::{plain_argument, project_path};
    use proptest::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn test_reconcile_removes_tool_and_project() {
        let raw = ["dotnet", "build", "MyProj.csproj", "/p:Configuration=Release"];
        let exclusions = ExclusionSet::from_entries(["dotnet", "MyProj.csproj"]);

        let result = reconcile(&raw, &exclusions);
        assert_eq!(result.residual, vec!["build", "/p:Configuration=Release"]);
        assert_eq!(
            result.rendered,
            "dotnet build MyProj.csproj /p:Configuration=Release"
        );
    }

    #[test]
    fn test_reconcile_keeps_order_and_duplicates() {
        let raw = ["dotnet.exe", "-v", "q", "-v", "q", "dotnet"];
        let exclusions = ExclusionSet::from_entries(["dotnet"]);

        let result = reconcile(&raw, &exclusions);
        assert_eq!(result.residual, vec!["-v", "q", "-v", "q"]);
        assert_eq!(result.residual_line(), "-v q -v q");
    }

    #[test]
    fn test_reconcile_with_empty_exclusions_keeps_everything() {
        let raw = vec!["dotnet".to_string(), "build".to_string()];
        let result = reconcile(&raw, &ExclusionSet::new());
        assert_eq!(result.residual, raw);
    }

    #[test]
    fn test_reconcile_empty_args() {
        let raw: Vec<String> = Vec::new();
        let result = reconcile(&raw, &ExclusionSet::from_entries(["dotnet"]));
        assert!(result.residual.is_empty());
        assert_eq!(result.rendered, "");
    }

    #[test]
    fn test_from_source_collects_verbs_properties_and_project() {
        let source = MapPropertySource::from_pairs([
            ("MSBuildBinPath", "/usr/share/dotnet/sdk/8.0.100"),
            ("MSBuildExtensionsPath", ""),
            ("Configuration", "Release"),
        ]);
        let project = PathBuf::from("/work/src/App/App.csproj");

        let set = ExclusionSet::from_source(&source, &project);
        let entries = set.entries();

        for verb in TOOL_VERBS {
            assert!(entries.iter().any(|e| e == verb));
        }
        assert!(entries.iter().any(|e| e == "/usr/share/dotnet/sdk/8.0.100"));
        assert!(entries.iter().any(|e| e == "/work/src/App/App.csproj"));
        assert!(entries.iter().any(|e| e == "App.csproj"));
        // Empty and non-reserved properties contribute nothing
        assert!(!entries.iter().any(String::is_empty));
        assert!(!entries.iter().any(|e| e == "Release"));
        assert_eq!(
            set.reserved_values(),
            &[(
                "MSBuildBinPath".to_string(),
                "/usr/share/dotnet/sdk/8.0.100".to_string()
            )]
        );
        assert_eq!(set.len(), TOOL_VERBS.len() + 3);
    }

    #[test]
    fn test_reconcile_with_engine_injected_arguments() {
        let source = MapPropertySource::from_pairs([(
            "MSBuildBinPath",
            "/usr/share/dotnet/sdk/8.0.100/MSBuild",
        )]);
        let project = PathBuf::from("/work/App.csproj");
        let set = ExclusionSet::from_source(&source, &project);

        let raw = [
            "/usr/share/dotnet/sdk/8.0.100/MSBuild.dll",
            "build",
            "App.csproj",
            "-nologo",
            "/work/App.csproj",
            "/p:Version=1.2.3",
        ];
        let result = reconcile(&raw, &set);
        assert_eq!(result.residual, vec!["-nologo", "/p:Version=1.2.3"]);
    }

    #[test]
    fn test_push_adds_exclusion() {
        let mut set = ExclusionSet::new();
        assert!(set.is_empty());
        set.push("custom-tool");
        assert!(set.excludes("custom-tool.exe"));
        assert!(set.excludes("CUSTOM-TOOL.dll"));
        assert!(!set.excludes("other"));
    }

    #[test]
    fn test_reconcile_current_process_renders_own_args() {
        let source = MapPropertySource::new();
        let result = reconcile_current_process(&source, Path::new("none.csproj"));
        let expected: Vec<String> = std::env::args().collect();
        assert_eq!(result.rendered, expected.join(" "));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(MIN_PROPTEST_ITERATIONS))]

        #[test]
        fn prop_plain_arguments_survive_in_order(
            project in project_path(),
            plain in proptest::collection::vec(plain_argument(), 0..8),
        ) {
            let set = ExclusionSet::from_source(&MapPropertySource::new(), Path::new(&project));
            let mut raw = vec!["dotnet".to_string(), "build".to_string(), project.clone()];
            raw.extend(plain.iter().cloned());

            let result = reconcile(&raw, &set);
            prop_assert_eq!(result.residual, plain);
            prop_assert_eq!(result.rendered, raw.join(" "));
        }
    }
}
