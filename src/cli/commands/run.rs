//! Run command implementation
//!
//! Implements `buildfleet run`. Settings are merged with command-line flags
//! first, then the project manifest, then the global config, then built-in
//! defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use crate::cli::commands::properties::load_source;
use crate::cli::output::{self, status, ProgressSink};
use crate::config::defaults::{
    DEFAULT_COMMAND, DEFAULT_CONFIGURATION, DEFAULT_JOBS, DEFAULT_OUTPUT_TYPE, DEFAULT_TOOL,
    MANIFEST_FILE, PROJECT_ITEM_TYPE,
};
use crate::core::entry::ProjectEntry;
use crate::core::global_config::GlobalConfig;
use crate::core::manifest::FleetManifest;
use crate::core::orchestrator::{BuildOrchestrator, FailurePolicy, RunReport, RunSettings};
use crate::core::properties::{PropertyItem, PropertySource};
use crate::core::template::{BuildOptions, PropertyOverride};
use crate::error::{BuildfleetError, OrchestrateError};
use crate::infra::dirs::BuildfleetDirs;
use crate::infra::discover::discover_projects;
use crate::infra::process::{locate_program, TokioProcessRunner};

/// Arguments of `buildfleet run`
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Project files to build
    pub projects: Vec<PathBuf>,

    /// Build tool verb (build, pack, publish, ...)
    #[arg(long)]
    pub command: Option<String>,

    /// Manifest to read (defaults to ./buildfleet.toml when present)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Also build every project file found under this directory
    #[arg(long, value_name = "DIR")]
    pub discover: Option<PathBuf>,

    /// Also build the `Project` items of a properties file
    #[arg(long)]
    pub properties_file: Option<PathBuf>,

    /// Configuration property
    #[arg(short, long)]
    pub configuration: Option<String>,

    /// Framework property
    #[arg(short, long)]
    pub framework: Option<String>,

    /// OutputDirectory property
    #[arg(long)]
    pub output_directory: Option<String>,

    /// OutputName property
    #[arg(long)]
    pub output_name: Option<String>,

    /// OutputType property
    #[arg(long)]
    pub output_type: Option<String>,

    /// Version property
    #[arg(long, value_name = "VERSION")]
    pub set_version: Option<String>,

    /// AssemblyName property
    #[arg(long)]
    pub assembly_name: Option<String>,

    /// Extra property (repeatable)
    #[arg(short = 'p', long = "property", value_name = "NAME=VALUE")]
    pub properties: Vec<PropertyOverride>,

    /// Target to run (repeatable)
    #[arg(short = 't', long = "target", value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Property to remove (repeatable)
    #[arg(long = "remove-property", value_name = "NAME")]
    pub remove_properties: Vec<String>,

    /// Continue after a project exits nonzero
    #[arg(long)]
    pub ignore_exit_codes: bool,

    /// Build every project even after a failure
    #[arg(long)]
    pub keep_going: bool,

    /// Projects built at once (0 means one per CPU)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Build tool program
    #[arg(long, env = "BUILDFLEET_TOOL")]
    pub tool: Option<String>,
}

/// A manifest together with the directory its paths are relative to
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub manifest: FleetManifest,
    pub base_dir: PathBuf,
}

/// Everything a run needs, after merging all settings layers
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub command: String,
    pub entries: Vec<ProjectEntry>,
    pub options: BuildOptions,
    pub settings: RunSettings,
}

/// Execute the run command
pub async fn execute(args: RunArgs) -> Result<()> {
    let global = GlobalConfig::load(&BuildfleetDirs::new())
        .map_err(BuildfleetError::from)
        .context("Failed to load global configuration")?;
    let manifest = load_manifest(args.manifest.as_deref())?;

    let items = match &args.properties_file {
        Some(path) => load_source(Some(path), false)?
            .items_of_type(PROJECT_ITEM_TYPE)
            .into_iter()
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    let discovered = match &args.discover {
        Some(root) => {
            let found = discover_projects(root);
            tracing::info!("Discovered {} projects under {}", found.len(), root.display());
            found
        }
        None => Vec::new(),
    };

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let plan = resolve_plan(&args, manifest.as_ref(), &global, &items, &discovered, &cwd)
        .map_err(BuildfleetError::from)?;

    for entry in &plan.entries {
        entry.ensure_exists().map_err(BuildfleetError::from)?;
    }

    if locate_program(&plan.settings.tool).is_none() {
        tracing::warn!("'{}' was not found in PATH", plan.settings.tool);
    }

    let report = run_plan(&plan).await;
    print_report(&report)?;

    match report.error() {
        Some(error) => Err(BuildfleetError::from(error).into()),
        None => Ok(()),
    }
}

/// Run a resolved plan, cancelling on Ctrl-C
async fn run_plan(plan: &RunPlan) -> RunReport {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping builds");
            on_interrupt.cancel();
        }
    });

    let sink = Arc::new(ProgressSink::new(plan.entries.len()));
    let orchestrator = BuildOrchestrator::new(TokioProcessRunner)
        .with_settings(plan.settings.clone())
        .with_sink(Arc::clone(&sink))
        .with_cancellation(cancel);

    let report = orchestrator
        .run(&plan.command, &plan.entries, &plan.options)
        .await;

    sink.finish();
    interrupt.abort();
    report
}

fn print_report(report: &RunReport) -> Result<()> {
    if output::is_json() {
        return output::print_json(report);
    }

    let failed = report.failures.len();
    let built = report.exit_codes.iter().filter(|e| e.exit_code == 0).count();
    if report.success {
        output::say(format!(
            "{} {} succeeded for {built} of {} projects",
            status::SUCCESS,
            report.command,
            report.exit_codes.len()
        ));
    } else if report.cancelled {
        output::say(format!("{} {} cancelled", status::WARNING, report.command));
    } else {
        output::say(format!(
            "{} {} failed for {failed} of {} projects",
            status::ERROR,
            report.command,
            report.exit_codes.len()
        ));
    }
    Ok(())
}

/// Load the manifest named on the command line, or `./buildfleet.toml`
fn load_manifest(explicit: Option<&Path>) -> Result<Option<LoadedManifest>, BuildfleetError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(MANIFEST_FILE);
            if !default.is_file() {
                return Ok(None);
            }
            default
        }
    };

    let manifest = FleetManifest::load(&path)?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    Ok(Some(LoadedManifest { manifest, base_dir }))
}

/// Merge every settings layer into a run plan
///
/// Projects come from the command line, the manifest, `Project` items and
/// discovery, in that order; relative paths are anchored at `cwd` and a path
/// listed twice is built once.
pub fn resolve_plan(
    args: &RunArgs,
    manifest: Option<&LoadedManifest>,
    global: &GlobalConfig,
    items: &[PropertyItem],
    discovered: &[PathBuf],
    cwd: &Path,
) -> Result<RunPlan, OrchestrateError> {
    let build = manifest.map(|m| &m.manifest.build);
    let defaults = &global.defaults;

    let mut candidates: Vec<ProjectEntry> =
        args.projects.iter().cloned().map(ProjectEntry::new).collect();
    if let Some(loaded) = manifest {
        candidates.extend(loaded.manifest.project_entries(&loaded.base_dir));
    }
    candidates.extend(items.iter().map(ProjectEntry::from_item));
    candidates.extend(discovered.iter().cloned().map(ProjectEntry::new));

    let mut seen = HashSet::new();
    let entries: Vec<ProjectEntry> = candidates
        .into_iter()
        .map(|entry| entry.anchored_at(cwd))
        .filter(|entry| seen.insert(entry.path().to_path_buf()))
        .collect();

    if entries.is_empty() {
        return Err(OrchestrateError::Configuration {
            message: "No projects to build; pass project files, use --discover, or list them in buildfleet.toml"
                .to_string(),
        });
    }

    // An empty value (e.g. an unset `${VAR}`) counts as absent
    let pick = |flag: &Option<String>, from_manifest: Option<&Option<String>>| {
        flag.clone()
            .filter(|v| !v.is_empty())
            .or_else(|| from_manifest.cloned().flatten().filter(|v| !v.is_empty()))
    };

    let mut properties = build.map(|b| b.property_overrides()).unwrap_or_default();
    properties.extend(args.properties.iter().cloned());

    let list = |flag: &Vec<String>, from_manifest: Option<&Vec<String>>| {
        if flag.is_empty() {
            from_manifest.cloned().unwrap_or_default()
        } else {
            flag.clone()
        }
    };

    let ignore_exit_codes = args.ignore_exit_codes
        || build
            .and_then(|b| b.ignore_exit_codes)
            .or(defaults.ignore_exit_codes)
            .unwrap_or(false);

    let options = BuildOptions {
        configuration: pick(&args.configuration, build.map(|b| &b.configuration))
            .or_else(|| defaults.configuration.clone())
            .or_else(|| Some(DEFAULT_CONFIGURATION.to_string())),
        framework: pick(&args.framework, build.map(|b| &b.framework)),
        output_directory: pick(&args.output_directory, build.map(|b| &b.output_directory)),
        output_name: pick(&args.output_name, build.map(|b| &b.output_name)),
        output_type: pick(&args.output_type, build.map(|b| &b.output_type))
            .or_else(|| Some(DEFAULT_OUTPUT_TYPE.to_string())),
        version: pick(&args.set_version, build.map(|b| &b.version)),
        assembly_name: pick(&args.assembly_name, build.map(|b| &b.assembly_name)),
        properties,
        targets: list(&args.targets, build.map(|b| &b.targets)),
        remove_properties: list(&args.remove_properties, build.map(|b| &b.remove_properties)),
        ignore_exit_codes,
    };

    let keep_going = args.keep_going
        || build
            .and_then(|b| b.keep_going)
            .or(defaults.keep_going)
            .unwrap_or(false);

    let jobs = match args
        .jobs
        .or_else(|| build.and_then(|b| b.jobs))
        .or(defaults.jobs)
        .unwrap_or(DEFAULT_JOBS)
    {
        0 => num_cpus::get(),
        n => n,
    };

    let settings = RunSettings {
        tool: pick(&args.tool, build.map(|b| &b.tool))
            .or_else(|| defaults.tool.clone())
            .unwrap_or_else(|| DEFAULT_TOOL.to_string()),
        jobs,
        failure_policy: if keep_going {
            FailurePolicy::KeepGoing
        } else {
            FailurePolicy::FailFast
        },
        stdout_to_stderr: output::is_json(),
    };

    let command = pick(&args.command, build.map(|b| &b.command))
        .unwrap_or_else(|| DEFAULT_COMMAND.to_string());

    tracing::debug!(
        "Resolved {command} for {} projects via {} ({} jobs, {:?})",
        entries.len(),
        settings.tool,
        settings.jobs,
        settings.failure_policy
    );

    Ok(RunPlan {
        command,
        entries,
        options,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::global_config::DefaultsConfig;

    fn args_for(projects: &[&str]) -> RunArgs {
        RunArgs {
            projects: projects.iter().map(PathBuf::from).collect(),
            ..RunArgs::default()
        }
    }

    fn resolve(
        args: &RunArgs,
        manifest: Option<&LoadedManifest>,
        global: &GlobalConfig,
    ) -> Result<RunPlan, OrchestrateError> {
        resolve_plan(args, manifest, global, &[], &[], Path::new("/work"))
    }

    fn loaded(toml: &str) -> LoadedManifest {
        LoadedManifest {
            manifest: FleetManifest::from_toml(toml).unwrap(),
            base_dir: PathBuf::from("/repo"),
        }
    }

    #[test]
    fn test_no_projects_is_configuration_error() {
        let err = resolve(&RunArgs::default(), None, &GlobalConfig::default()).unwrap_err();
        assert!(matches!(err, OrchestrateError::Configuration { .. }));
    }

    #[test]
    fn test_defaults_apply_without_other_layers() {
        let plan = resolve(&args_for(&["a.csproj"]), None, &GlobalConfig::default()).unwrap();
        assert_eq!(plan.command, DEFAULT_COMMAND);
        assert_eq!(plan.settings.tool, DEFAULT_TOOL);
        assert_eq!(plan.settings.jobs, DEFAULT_JOBS);
        assert_eq!(plan.settings.failure_policy, FailurePolicy::FailFast);
        assert_eq!(plan.options, BuildOptions::default());
    }

    #[test]
    fn test_flags_override_manifest_and_global() {
        let manifest = loaded(
            r#"
[build]
command = "pack"
configuration = "Debug"
tool = "msbuild"
jobs = 3
targets = ["Pack"]
"#,
        );
        let global = GlobalConfig {
            defaults: DefaultsConfig {
                configuration: Some("Checked".to_string()),
                tool: Some("xbuild".to_string()),
                jobs: Some(8),
                ..DefaultsConfig::default()
            },
            ..GlobalConfig::default()
        };
        let args = RunArgs {
            configuration: Some("Release".to_string()),
            jobs: Some(2),
            ..args_for(&["a.csproj"])
        };

        let plan = resolve(&args, Some(&manifest), &global).unwrap();
        assert_eq!(plan.command, "pack");
        assert_eq!(plan.options.configuration.as_deref(), Some("Release"));
        assert_eq!(plan.options.targets, vec!["Pack"]);
        assert_eq!(plan.settings.tool, "msbuild");
        assert_eq!(plan.settings.jobs, 2);
    }

    #[test]
    fn test_global_config_fills_gaps() {
        let global = GlobalConfig {
            defaults: DefaultsConfig {
                configuration: Some("Debug".to_string()),
                keep_going: Some(true),
                ignore_exit_codes: Some(true),
                ..DefaultsConfig::default()
            },
            ..GlobalConfig::default()
        };

        let plan = resolve(&args_for(&["a.csproj"]), None, &global).unwrap();
        assert_eq!(plan.options.configuration.as_deref(), Some("Debug"));
        assert!(plan.options.ignore_exit_codes);
        assert_eq!(plan.settings.failure_policy, FailurePolicy::KeepGoing);
    }

    #[test]
    fn test_zero_jobs_means_one_per_cpu() {
        let args = RunArgs {
            jobs: Some(0),
            ..args_for(&["a.csproj"])
        };
        let plan = resolve(&args, None, &GlobalConfig::default()).unwrap();
        assert_eq!(plan.settings.jobs, num_cpus::get());
    }

    #[test]
    fn test_projects_merge_in_order_without_duplicates() {
        let manifest = loaded(r#"projects = ["Lib/Lib.csproj"]"#);
        let items = [PropertyItem::new("Project", "/other/Tool.csproj")
            .with_metadata("RootDir", "/other")];
        let discovered = [
            PathBuf::from("/repo/Lib/Lib.csproj"),
            PathBuf::from("/repo/Test.csproj"),
        ];

        let plan = resolve_plan(
            &args_for(&["App.csproj"]),
            Some(&manifest),
            &GlobalConfig::default(),
            &items,
            &discovered,
            Path::new("/work"),
        )
        .unwrap();

        let paths: Vec<_> = plan.entries.iter().map(ProjectEntry::identity).collect();
        assert_eq!(
            paths,
            vec![
                "/work/App.csproj",
                "/repo/Lib/Lib.csproj",
                "/other/Tool.csproj",
                "/repo/Test.csproj"
            ]
        );
        assert_eq!(plan.entries[2].working_directory(), Path::new("/other"));
    }

    #[test]
    fn test_empty_option_values_are_omitted() {
        let manifest = loaded("[build]\nframework = \"\"\nconfiguration = \"\"\n");
        let global = GlobalConfig {
            defaults: DefaultsConfig {
                configuration: Some("Debug".to_string()),
                ..DefaultsConfig::default()
            },
            ..GlobalConfig::default()
        };
        let args = RunArgs {
            set_version: Some(String::new()),
            ..args_for(&["a.csproj"])
        };

        let plan = resolve(&args, Some(&manifest), &global).unwrap();
        assert_eq!(plan.options.framework, None);
        assert_eq!(plan.options.version, None);
        assert_eq!(plan.options.configuration.as_deref(), Some("Debug"));
    }

    #[test]
    fn test_cli_properties_follow_manifest_properties() {
        let manifest = loaded("[build.properties]\nSignAssembly = \"true\"\n");
        let args = RunArgs {
            properties: vec![PropertyOverride::new("SignAssembly", "false")],
            ..args_for(&["a.csproj"])
        };

        let plan = resolve(&args, Some(&manifest), &GlobalConfig::default()).unwrap();
        assert_eq!(
            plan.options.properties,
            vec![
                PropertyOverride::new("SignAssembly", "true"),
                PropertyOverride::new("SignAssembly", "false"),
            ]
        );
    }
}
