//! ROSA HCP suite runner library
//!
//! Runs Ansible playbook test suites one playbook at a time, aggregates the
//! outcome and renders JSON, HTML and JUnit reports. Alongside it live the
//! environment tools: a notification parser and a small JSON-backed history
//! of test environments.

pub mod cli;
pub mod config;
pub mod console;
pub mod envdb;
pub mod error;
pub mod executor;
pub mod invocation;
pub mod jsonquery;
pub mod logging;
pub mod notify;
pub mod orchestrator;
pub mod process_guard;
pub mod report;
pub mod results;
pub mod suite;

// Re-export main types for convenience
pub use config::RunnerConfig;
pub use envdb::{EnvStatus, EnvStore, EnvironmentRecord};
pub use error::{Result, RunnerError};
pub use executor::{PlaybookExecutor, PlaybookLauncher};
pub use invocation::{CommandArgs, ExtraVars, PlaybookInvocation};
pub use notify::{ClusterInfo, EnvData, NotificationInfo};
pub use orchestrator::{BatchOutcome, SuiteRunner};
pub use process_guard::{ChildRegistry, CommandProcessGroup, Interrupt};
pub use report::{ReportFormat, ResultWriter};
pub use results::{PlaybookResult, RunResult, SuiteResult};
pub use suite::{PlaybookSpec, SuiteCatalog, SuiteDefinition};
