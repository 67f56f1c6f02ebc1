//! Default configuration values

/// External build tool invoked for every project
pub const DEFAULT_TOOL: &str = "dotnet";

/// Build tool verb passed as the first argument
pub const DEFAULT_COMMAND: &str = "build";

/// Value of the `Configuration` property
pub const DEFAULT_CONFIGURATION: &str = "Release";

/// Value of the `OutputType` property
pub const DEFAULT_OUTPUT_TYPE: &str = "Library";

/// Number of projects built at the same time
pub const DEFAULT_JOBS: usize = 1;

/// Exit code recorded for a project whose process never ran
pub const NOT_RUN_EXIT_CODE: i32 = -1;

/// Project manifest file name looked up in the working directory
pub const MANIFEST_FILE: &str = "buildfleet.toml";

/// Item type that marks a project entry in a property source
pub const PROJECT_ITEM_TYPE: &str = "Project";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
