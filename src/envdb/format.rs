//! Text rendering of environment records

use chrono::NaiveDateTime;

use super::{EnvStats, EnvStatus, EnvironmentRecord};
use crate::invocation::CommandArgs;

const RULE: &str = "================================================================================";
const THIN_RULE: &str = "--------------------------------------------------------------------------------";

fn date(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Column header matching [`format_env_line`]
pub fn list_header() -> String {
    format!(
        "{:4} {:2} {:30} {:15} {:12} {}\n{THIN_RULE}",
        "#", "", "Cluster Name", "Platform", "Test Status", "Last Used"
    )
}

/// One-line summary, optionally numbered
pub fn format_env_line(env: &EnvironmentRecord, index: Option<usize>) -> String {
    let prefix = index.map(|i| format!("[{i:2}] ")).unwrap_or_default();
    format!(
        "{}{} {:30} {:15} {:12} {}",
        prefix,
        env.status.glyph(),
        env.cluster_name,
        env.platform,
        env.status.to_string(),
        date(env.last_accessed)
    )
}

/// Multi-line detail block
pub fn format_env_details(env: &EnvironmentRecord, index: Option<usize>) -> String {
    let cluster = env.data.cluster.as_ref();
    let notification = env.data.notification.as_ref();
    let mut out = String::new();

    out.push_str(&format!("\n{RULE}\n"));
    match index {
        Some(i) => {
            out.push_str(&format!("[{i}] {}\n", env.cluster_name));
        }
        None => {
            out.push_str(&format!("{}\n", env.cluster_name));
        }
    }
    out.push_str(&format!("{RULE}\n"));
    out.push_str(&format!("  Platform:        {}\n", env.platform));
    out.push_str(&format!(
        "  Test Status:     {} {}\n",
        env.status.glyph(),
        env.status.to_string().to_uppercase()
    ));
    out.push_str(&format!(
        "  Cluster Status:  {}\n",
        cluster.map(|c| c.status.as_str()).unwrap_or("N/A")
    ));
    out.push_str(&format!(
        "  OCP Version:     {}\n",
        cluster.map(|c| c.ocp_version.as_str()).unwrap_or("N/A")
    ));
    out.push_str(&format!("  Jira:            {}\n", env.jira().unwrap_or("N/A")));
    out.push_str(&format!("  Polarion:        {}\n", env.polarion().unwrap_or("N/A")));
    out.push_str(&format!("  Added:           {}\n", date(env.added_date)));
    out.push_str(&format!("  Last Accessed:   {}", date(env.last_accessed)));
    if !env.notes.is_empty() {
        out.push_str(&format!("\n  Notes:           {}", env.notes));
    }
    if let Some(n) = notification.filter(|n| !n.components.is_empty()) {
        out.push_str(&format!("\n  Total Failures:  {}", n.total_failures));
    }
    out
}

/// Login command block plus a warning for clusters that are not running
pub fn format_connection(env: &EnvironmentRecord) -> String {
    let Some(cluster) = env.data.cluster.as_ref() else {
        return format!("No cluster data stored for {}", env.cluster_name);
    };
    let mut out = format!(
        "\n{RULE}\nCONNECTION COMMAND:\n{RULE}\n{}\n{RULE}",
        cluster.login_command().display_command()
    );
    if !cluster.is_running() {
        let status = if cluster.status.is_empty() { "Unknown" } else { cluster.status.as_str() };
        out.push_str(&format!(
            "\n\n⚠️  WARNING: Cluster status is '{status}' (not Running)\nYou may not be able to connect to this cluster."
        ));
    }
    out
}

pub fn format_stats(stats: &EnvStats<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{RULE}\nMCE ENVIRONMENT STATISTICS\n{RULE}\n\n"));
    out.push_str(&format!("Total Environments: {}\n\n", stats.total));

    out.push_str("By Platform:\n");
    for (platform, count) in &stats.by_platform {
        out.push_str(&format!("  {platform:20} {count:3}\n"));
    }
    out.push('\n');

    out.push_str("By Test Status:\n");
    for (status, count) in &stats.by_status {
        let glyph = status
            .parse::<EnvStatus>()
            .unwrap_or_default()
            .glyph();
        out.push_str(&format!("  {glyph} {status:15} {count:3}\n"));
    }
    out.push('\n');

    if !stats.recent.is_empty() {
        out.push_str("Recently Accessed:\n");
        for env in &stats.recent {
            out.push_str(&format!(
                "  {} {:30} {}\n",
                env.status.glyph(),
                env.cluster_name,
                env.last_accessed.format("%Y-%m-%d %H:%M")
            ));
        }
    }
    out.push_str(RULE);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ClusterInfo, EnvData};

    fn record(status: &str) -> EnvironmentRecord {
        let data = EnvData {
            notification: None,
            cluster: Some(ClusterInfo {
                platform: "IBM Power".into(),
                hub_cluster: "hub-power-17".into(),
                status: status.into(),
                password: "pw".into(),
                ..Default::default()
            }),
        };
        EnvironmentRecord::new(data, EnvStatus::InProgress, "rerun pending")
    }

    #[test]
    fn test_compact_line() {
        let line = format_env_line(&record("Running"), Some(3));
        assert!(line.starts_with("[ 3] ⏳ hub-power-17 "));
        assert!(line.contains(" in_progress  "));
    }

    #[test]
    fn test_details() {
        let details = format_env_details(&record("Running"), None);
        assert!(details.contains("Test Status:     ⏳ IN_PROGRESS"));
        assert!(details.contains("Cluster Status:  Running"));
        assert!(details.contains("Jira:            N/A"));
        assert!(details.contains("Notes:           rerun pending"));
        assert!(!details.contains("Total Failures"));
    }

    #[test]
    fn test_connection_warns_when_not_running() {
        let running = format_connection(&record("Running"));
        assert!(running.contains("oc login https://api.hub-power-17.rdr-ppcloud.sandbox.cis.ibm.net:6443"));
        assert!(!running.contains("WARNING"));

        let stopped = format_connection(&record("Hibernating"));
        assert!(stopped.contains("Cluster status is 'Hibernating' (not Running)"));
    }

    #[test]
    fn test_connection_without_cluster() {
        let env = EnvironmentRecord::new(EnvData::default(), EnvStatus::Unknown, "");
        assert_eq!(format_connection(&env), "No cluster data stored for unknown");
    }
}
