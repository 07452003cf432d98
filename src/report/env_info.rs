//! Environment facts scraped from playbook output for the HTML report.
//!
//! Purely informational: the playbooks print these markers as debug lines
//! and any of them may be missing.

use regex::Regex;
use std::sync::LazyLock;

use crate::results::RunResult;

static LOGIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Successfully logged in - User: ([\w:]+) \| API: (https://\S+) \| Context: (\S+)")
        .expect("valid login regex")
});
static CAPI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CAPI controller deployed - (\{[^}]+\})").expect("valid CAPI regex"));
static CAPA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CAPA controller deployed - (\{[^}]+\})").expect("valid CAPA regex"));

const ROSA_NETWORK_ABSENT: &str = "No RosaNetwork resources found";
const ROSA_NETWORK_PRESENT: &str = "RosaNetwork resources found";
const ROLE_CONFIG_PRESENT: &str = "rosa-creds-secret found";
const ROLE_CONFIG_ABSENT: &str = "rosa-creds-secret not found";

/// What the hub cluster looked like during the run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentInfo {
    pub ocp_user: Option<String>,
    pub ocp_api_url: Option<String>,
    pub ocp_context: Option<String>,
    pub capi_controller: Option<String>,
    pub capa_controller: Option<String>,
    /// `Some(true)` available, `Some(false)` reported absent
    pub rosa_network: Option<bool>,
    pub rosa_role_config: Option<bool>,
}

impl EnvironmentInfo {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Extract whatever markers `output` contains
    pub fn extract(output: &str) -> Self {
        let mut info = Self::default();

        if let Some(caps) = LOGIN_RE.captures(output) {
            info.ocp_user = Some(caps[1].to_string());
            info.ocp_api_url = Some(caps[2].to_string());
            info.ocp_context = Some(caps[3].to_string());
        }
        info.capi_controller = CAPI_RE.captures(output).map(|c| c[1].to_string());
        info.capa_controller = CAPA_RE.captures(output).map(|c| c[1].to_string());

        // The "present" marker is a substring of the "absent" one
        if output.contains(ROSA_NETWORK_ABSENT) {
            info.rosa_network = Some(false);
        } else if output.contains(ROSA_NETWORK_PRESENT) {
            info.rosa_network = Some(true);
        }

        if output.contains(ROLE_CONFIG_PRESENT) {
            info.rosa_role_config = Some(true);
        } else if output.contains(ROLE_CONFIG_ABSENT) {
            info.rosa_role_config = Some(false);
        }

        info
    }

    /// From the first successful playbook whose output yields anything
    pub fn from_run(run: &RunResult) -> Self {
        run.suites
            .iter()
            .flat_map(|suite| suite.playbooks.iter())
            .filter(|playbook| playbook.success && !playbook.output.is_empty())
            .map(|playbook| Self::extract(&playbook.output))
            .find(|info| !info.is_empty())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{PlaybookResult, SuiteResult};

    const OUTPUT: &str = "\
TASK [login] ****
ok: [localhost] => msg: Successfully logged in - User: kube:admin | API: https://api.hub.example.com:6443 | Context: default/api-hub/kube:admin
msg: CAPI controller deployed - {'ready': 1, 'replicas': 1}
msg: CAPA controller deployed - {'ready': 1}
msg: No RosaNetwork resources found
msg: rosa-creds-secret found
";

    #[test]
    fn test_extracts_all_markers() {
        let info = EnvironmentInfo::extract(OUTPUT);
        assert_eq!(info.ocp_user.as_deref(), Some("kube:admin"));
        assert_eq!(info.ocp_api_url.as_deref(), Some("https://api.hub.example.com:6443"));
        assert_eq!(info.ocp_context.as_deref(), Some("default/api-hub/kube:admin"));
        assert_eq!(info.capi_controller.as_deref(), Some("{'ready': 1, 'replicas': 1}"));
        assert_eq!(info.capa_controller.as_deref(), Some("{'ready': 1}"));
        assert_eq!(info.rosa_network, Some(false));
        assert_eq!(info.rosa_role_config, Some(true));
    }

    #[test]
    fn test_present_markers() {
        let info = EnvironmentInfo::extract("3 RosaNetwork resources found\nrosa-creds-secret not found");
        assert_eq!(info.rosa_network, Some(true));
        assert_eq!(info.rosa_role_config, Some(false));
    }

    #[test]
    fn test_missing_markers_are_not_errors() {
        let info = EnvironmentInfo::extract("PLAY RECAP ok=3 changed=0");
        assert!(info.is_empty());
    }

    #[test]
    fn test_from_run_uses_first_successful_output() {
        let pb = |name: &str, success: bool, output: &str| PlaybookResult {
            name: name.into(),
            description: String::new(),
            test_case_id: String::new(),
            success,
            duration: 1.0,
            output: output.into(),
            error: None,
        };
        let mut suite = SuiteResult::begin("s", "S");
        suite.push(pb("failed", false, OUTPUT));
        suite.push(pb("quiet", true, "nothing here"));
        suite.push(pb("login", true, "rosa-creds-secret not found"));
        let mut run = RunResult::new();
        run.push_suite(suite);

        let info = EnvironmentInfo::from_run(&run);
        assert_eq!(info.rosa_role_config, Some(false));
        assert!(info.ocp_user.is_none());
    }
}
