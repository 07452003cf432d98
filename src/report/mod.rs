//! Report rendering and persistence
//!
//! Every renderer is a pure function of a [`RunResult`]; nothing here looks
//! at live state. [`persist`] decides where the rendered text lands.

pub mod env_info;
pub mod html;
pub mod junit;
pub mod persist;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::Result;
use crate::results::RunResult;

pub use env_info::EnvironmentInfo;
pub use persist::{batch_label, suite_label, ResultWriter};

/// Requested report format; `All` expands to every concrete format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Html,
    Junit,
    #[default]
    All,
}

impl ReportFormat {
    /// Concrete formats this request stands for, in save order
    pub fn expand(self) -> Vec<ReportFormat> {
        match self {
            ReportFormat::All => ReportFormat::iter().filter(|f| *f != ReportFormat::All).collect(),
            format => vec![format],
        }
    }

    /// File extension of a concrete format
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
            ReportFormat::Junit => "xml",
            ReportFormat::All => "",
        }
    }
}

/// Render `run` in one concrete format
pub fn render(run: &RunResult, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => run.to_json(),
        ReportFormat::Html => html::render(run),
        ReportFormat::Junit => Ok(junit::render(run)),
        ReportFormat::All => Err(crate::error::RunnerError::report(
            "'all' is not a concrete report format",
        )),
    }
}
