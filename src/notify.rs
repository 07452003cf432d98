//! Test notification and spreadsheet row parsing.
//!
//! All extraction is best effort: a pattern that does not match leaves its
//! field empty and never produces an error.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::LazyLock;

use crate::invocation::CommandArgs;

static MCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"MCE:\s*([^\n]+)").expect("valid MCE regex"));
static ACM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ACM:\s*([^\n]+)").expect("valid ACM regex"));
static HUB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Hub creds:\s*(\S+)").expect("valid hub regex"));
static POLARION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Polarion:\s*(\S+)").expect("valid Polarion regex"));
static JIRA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Jira ticket:\s*(\S+)").expect("valid Jira regex"));
static COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+)\((\d+)\):\s*@?([^-]+)\s*-->\s*Jenkins Job").expect("valid component regex")
});
static ROW_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+|\s{4,}").expect("valid row separator regex"));
static ROW_MCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"MCE:\s*([^\n"]+)"#).expect("valid row MCE regex"));
static ROW_ACM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ACM:\s*([^\n"]+)"#).expect("valid row ACM regex"));

/// Username every hub cluster is accessed with
pub const KUBEADMIN: &str = "kubeadmin";

const RULE: &str = "================================================================================";

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].trim().to_string())
}

/// Failures reported for one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentFailures {
    pub failures: u32,
    #[serde(default)]
    pub owner: String,
}

/// What a test notification message says about a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub mce_version: Option<String>,
    #[serde(default)]
    pub acm_version: Option<String>,
    /// `Hub creds:` reference
    #[serde(default)]
    pub hub_cluster: Option<String>,
    #[serde(default)]
    pub polarion: Option<String>,
    #[serde(default)]
    pub jira: Option<String>,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentFailures>,
    #[serde(default)]
    pub total_failures: u64,
}

impl NotificationInfo {
    /// Components, most failures first
    pub fn components_by_failures(&self) -> Vec<(&str, &ComponentFailures)> {
        let mut sorted: Vec<_> = self
            .components
            .iter()
            .map(|(name, c)| (name.as_str(), c))
            .collect();
        sorted.sort_by(|a, b| b.1.failures.cmp(&a.1.failures));
        sorted
    }
}

/// Parse a free-text notification message
pub fn parse_notification(text: &str) -> NotificationInfo {
    let title = text
        .trim()
        .lines()
        .filter(|line| !line.contains("---"))
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string);

    let mut components = BTreeMap::new();
    for caps in COMPONENT_RE.captures_iter(text) {
        // Digit runs too long for u32 are not a real count
        let Ok(failures) = caps[2].parse::<u32>() else {
            continue;
        };
        components.insert(
            caps[1].to_string(),
            ComponentFailures {
                failures,
                owner: caps[3].trim().to_string(),
            },
        );
    }
    let total_failures = components.values().map(|c| u64::from(c.failures)).sum();

    NotificationInfo {
        title,
        mce_version: capture(&MCE_RE, text),
        acm_version: capture(&ACM_RE, text),
        hub_cluster: capture(&HUB_RE, text),
        polarion: capture(&POLARION_RE, text),
        jira: capture(&JIRA_RE, text),
        components,
        total_failures,
    }
}

/// One spreadsheet row describing a hub cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub hub_cluster: String,
    #[serde(default)]
    pub ocp_version: String,
    #[serde(default)]
    pub mce_version: Option<String>,
    #[serde(default)]
    pub acm_version: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub console_url: String,
}

impl ClusterInfo {
    pub fn api_url(&self) -> String {
        login_endpoint(&self.hub_cluster, &self.platform)
    }

    pub fn login_command(&self) -> LoginCommand {
        LoginCommand {
            api_url: self.api_url(),
            password: self.password.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("running")
    }
}

/// Parse `platform | hub | ocp | versions | status | password [| console]`.
///
/// Fields are separated by tabs or runs of four or more whitespace
/// characters. Fewer than six fields yields `None`.
pub fn parse_spreadsheet_row(row: &str) -> Option<ClusterInfo> {
    let parts: Vec<&str> = ROW_SPLIT_RE.split(row.trim()).map(str::trim).collect();
    if parts.len() < 6 {
        return None;
    }
    let versions = parts[3];
    Some(ClusterInfo {
        platform: parts[0].to_string(),
        hub_cluster: parts[1].to_string(),
        ocp_version: parts[2].to_string(),
        mce_version: capture(&ROW_MCE_RE, versions),
        acm_version: capture(&ROW_ACM_RE, versions),
        status: parts[4].to_string(),
        password: parts[5].to_string(),
        console_url: parts.get(6).map(|s| s.to_string()).unwrap_or_default(),
    })
}

/// API endpoint for a hub cluster on `platform`
pub fn login_endpoint(hub: &str, platform: &str) -> String {
    if platform.contains("IBM") || platform.contains("Power") {
        format!("https://api.{hub}.rdr-ppcloud.sandbox.cis.ibm.net:6443")
    } else if platform.contains("ARM") || platform.contains("AWS") {
        format!("https://api.{hub}.dev09.red-chesterfield.com:6443")
    } else {
        format!("https://api.{hub}:6443")
    }
}

/// `oc login` against a hub cluster as kubeadmin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCommand {
    pub api_url: String,
    pub password: String,
}

impl CommandArgs for LoginCommand {
    fn program(&self) -> &str {
        "oc"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "login".to_string(),
            self.api_url.clone(),
            "-u".to_string(),
            KUBEADMIN.to_string(),
            "-p".to_string(),
            self.password.clone(),
            "--insecure-skip-tls-verify".to_string(),
        ]
    }
}

/// Everything parsed about one test environment; stored verbatim in the
/// environment database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterInfo>,
}

impl EnvData {
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize environment data")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write environment data to {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read environment data from {:?}", path.as_ref()))?;
        serde_json::from_str(&content).context("Failed to parse environment data JSON")
    }
}

/// Prompt for a pasted notification (ended by a blank line or end of
/// input) and then a spreadsheet row, parsing whatever was given
pub fn read_pasted<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> std::io::Result<EnvData> {
    let mut data = EnvData::default();

    writeln!(out, "Paste the test notification message (end with empty line or Ctrl+D):")?;
    out.flush()?;
    let mut lines = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        lines.push(trimmed.to_string());
    }
    if !lines.is_empty() {
        data.notification = Some(parse_notification(&lines.join("\n")));
        writeln!(out, "\n✓ Notification parsed")?;
    }

    writeln!(out, "\nPaste the spreadsheet row data (all fields tab/space separated):")?;
    out.flush()?;
    line.clear();
    input.read_line(&mut line)?;
    let row = line.trim();
    if !row.is_empty() {
        match parse_spreadsheet_row(row) {
            Some(cluster) => {
                data.cluster = Some(cluster);
                writeln!(out, "✓ Spreadsheet data parsed")?;
            }
            None => writeln!(out, "⚠ Spreadsheet row needs at least 6 fields; ignored")?,
        }
    }
    Ok(data)
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

/// Human-readable connection sheet for a parsed environment
pub fn connection_report(data: &EnvData) -> String {
    let Some(cluster) = &data.cluster else {
        return "No cluster data available".to_string();
    };
    let login = cluster.login_command();
    let mut out = String::new();

    out.push_str(&format!("{RULE}\nMCE TEST ENVIRONMENT - CONNECTION INFO\n{RULE}\n\n"));
    out.push_str("ENVIRONMENT DETAILS:\n");
    out.push_str(&format!("  Platform:        {}\n", cluster.platform));
    out.push_str(&format!("  Hub Cluster:     {}\n", cluster.hub_cluster));
    out.push_str(&format!("  Status:          {}\n", cluster.status));
    out.push_str(&format!("  OCP Version:     {}\n", cluster.ocp_version));
    out.push_str(&format!("  MCE Version:     {}\n", or_na(cluster.mce_version.as_deref())));
    out.push_str(&format!("  ACM Version:     {}\n\n", or_na(cluster.acm_version.as_deref())));

    if let Some(notification) = &data.notification {
        out.push_str("TEST RUN INFO:\n");
        out.push_str(&format!("  Title:           {}\n", or_na(notification.title.as_deref())));
        out.push_str(&format!("  Jira Ticket:     {}\n", or_na(notification.jira.as_deref())));
        out.push_str(&format!("  Polarion:        {}\n", or_na(notification.polarion.as_deref())));
        out.push_str(&format!("  Total Failures:  {}\n\n", notification.total_failures));

        if !notification.components.is_empty() {
            out.push_str("COMPONENT FAILURES:\n");
            for (name, component) in notification.components_by_failures() {
                out.push_str(&format!(
                    "  {:20} {:3} failures  ({})\n",
                    name, component.failures, component.owner
                ));
            }
            out.push('\n');
        }
    }

    out.push_str("CONNECTION DETAILS:\n");
    out.push_str(&format!("  API URL:         {}\n", login.api_url));
    out.push_str(&format!("  Username:        {KUBEADMIN}\n"));
    out.push_str(&format!("  Password:        {}\n", cluster.password));
    if !cluster.console_url.is_empty() {
        out.push_str(&format!("  Console:         {}\n", cluster.console_url));
    }
    out.push('\n');

    out.push_str(&format!("QUICK LOGIN:\n  {}\n\n", login.display_command()));

    out.push_str(
        "CAPI VERIFICATION COMMANDS:
  # Check CAPI installation
  oc get deployment -n multicluster-engine | grep capi

  # Check CAPI CRDs
  oc get crd | grep cluster.x-k8s.io | wc -l

  # Check for ROSA CRDs
  oc get crd | grep rosa

  # Check CAPI controller logs
  oc logs -n multicluster-engine deployment/capi-controller-manager --tail=50

  # Check MCE components
  oc get mce multiclusterengine -o jsonpath='{.spec.overrides.components}' | jq

",
    );

    out.push_str(&format!(
        "SAVE THIS CONFIG:\n  parse-test-env --save /tmp/mce-env-{}.json\n\n",
        cluster.hub_cluster
    ));
    out.push_str(RULE);
    out
}
