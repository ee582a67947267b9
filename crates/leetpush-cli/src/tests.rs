use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use leetpush_core::config::{ConfigError, CredentialStore};
use leetpush_core::page::{PageHost, PageSnapshot};
use pretty_assertions::assert_eq;

use crate::cli::CompletionShell;
use crate::commands::common::{build_sync_service, normalize_problem_slug};
use crate::commands::completions::{render_completions, run_completions};
use crate::commands::config::{format_config_lines, run_config_init, store_secret, ConfigInit};
use crate::commands::inspect::{inspect_page, InspectReport};
use crate::commands::push::read_submission;
use crate::commands::watch::watcher_config;
use crate::config_store::CliConfig;
use crate::error::CliError;
use crate::secrets::{KeychainCredentialStore, SecretKind, SecretStore};
use crate::snapshot_host::{watch_file, SnapshotFileHost, FILE_EVENT_DEBOUNCE};

const PYTHON: &str = "class Solution:\n    def twoSum(self, nums, target):\n        return []";

#[test]
fn normalize_problem_slug_replaces_dashes_and_rejects_empty() {
    assert_eq!(normalize_problem_slug(" two-sum ").unwrap(), "two_sum");
    assert_eq!(normalize_problem_slug("/add-two-numbers/").unwrap(), "add_two_numbers");
    assert!(matches!(
        normalize_problem_slug("  "),
        Err(CliError::EmptyProblem)
    ));
}

#[test]
fn read_submission_cleans_code_and_normalizes_language() {
    let path = unique_temp_path("solution", "py");
    std::fs::write(&path, "\n\nprint(1)   \n\n\n").unwrap();

    let event = read_submission("two-sum", "Python3", &path).unwrap();
    assert_eq!(event.problem_identifier(), "two_sum");
    assert_eq!(event.source_code(), "print(1)");
    assert_eq!(event.language_tag(), "python");

    std::fs::write(&path, " \n\t\n").unwrap();
    assert!(matches!(
        read_submission("two-sum", "Python3", &path),
        Err(CliError::EmptySolution(_))
    ));

    let _ = std::fs::remove_file(path);
}

#[test]
fn build_sync_service_requires_username() {
    assert!(matches!(
        build_sync_service(&CliConfig::default()),
        Err(CliError::NotConfigured)
    ));
}

#[test]
fn config_init_merges_with_existing_values() {
    let path = unique_temp_path("config", "json");

    let config = run_config_init(
        &path,
        ConfigInit {
            username: " octocat ".to_string(),
            repository: Some("algorithms".to_string()),
            ..ConfigInit::default()
        },
    )
    .unwrap();
    assert_eq!(config.username(), Some("octocat".to_string()));

    let config = run_config_init(
        &path,
        ConfigInit {
            username: "octocat".to_string(),
            branch: Some("solutions".to_string()),
            ..ConfigInit::default()
        },
    )
    .unwrap();
    assert_eq!(config.repository.as_deref(), Some("algorithms"));
    assert_eq!(config.branch.as_deref(), Some("solutions"));

    let _ = std::fs::remove_file(path);
}

#[test]
fn config_init_rejects_invalid_urls_and_blank_username() {
    let path = unique_temp_path("config-invalid", "json");

    let result = run_config_init(
        &path,
        ConfigInit {
            username: "octocat".to_string(),
            api_base_url: Some("api.github.com".to_string()),
            ..ConfigInit::default()
        },
    );
    assert!(matches!(result, Err(CliError::Config(_))));
    assert!(!path.exists());

    let result = run_config_init(&path, ConfigInit::default());
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn format_config_lines_reports_secret_status() {
    let username = unique_username("show");
    let config = CliConfig {
        username: Some(username.clone()),
        ..CliConfig::default()
    };
    let path = PathBuf::from("/tmp/leetpush/config.json");

    let lines = format_config_lines(&config, &path).unwrap();
    assert!(lines.contains(&format!("username:        {username}")));
    assert!(lines.contains(&"repository:      leetcode".to_string()));
    assert!(lines.contains(&"formatter key:   not set".to_string()));

    let store = SecretStore::new(&username);
    store_secret(&store, SecretKind::FormatterKey, "sk-or-v1-abc").unwrap();
    let lines = format_config_lines(&config, &path).unwrap();
    assert!(lines.contains(&"formatter key:   set (keychain)".to_string()));
    assert!(lines.iter().all(|line| !line.contains("sk-or-v1-abc")));
}

#[test]
fn store_secret_validates_and_round_trips() {
    let store = SecretStore::new(&unique_username("secrets"));

    assert!(matches!(
        store_secret(&store, SecretKind::AccessToken, "not-a-token"),
        Err(CliError::Settings(ConfigError::AccessTokenFormat))
    ));
    assert_eq!(store.load(SecretKind::AccessToken).unwrap(), None);

    store_secret(&store, SecretKind::AccessToken, "  ghp_abc123  ").unwrap();
    assert_eq!(
        store.load(SecretKind::AccessToken).unwrap().as_deref(),
        Some("ghp_abc123")
    );

    store.clear(SecretKind::AccessToken).unwrap();
    assert_eq!(store.load(SecretKind::AccessToken).unwrap(), None);
}

#[test]
fn keychain_credential_store_needs_username_and_token() {
    assert_eq!(
        KeychainCredentialStore::new(None).load_credentials().unwrap(),
        None
    );

    let username = unique_username("credentials");
    let store = KeychainCredentialStore::new(Some(username.clone()));
    if std::env::var(SecretKind::AccessToken.env_var()).is_err() {
        assert_eq!(store.load_credentials().unwrap(), None);
    }

    SecretStore::new(&username)
        .save(SecretKind::AccessToken, "github_pat_xyz")
        .unwrap();
    let credentials = store.load_credentials().unwrap().unwrap();
    assert_eq!(credentials.username, username);
}

#[test]
fn inspect_page_reports_target_path() {
    let page = PageSnapshot::from_json(&format!(
        r#"{{
          "url": "https://leetcode.com/problems/two-sum/submissions/",
          "bodyText": "Accepted 63 / 63 testcases passed",
          "elements": [{{ "tag": "span", "classes": ["text-green-500"], "text": "Accepted" }}],
          "editors": [{{ "value": {}, "languageId": "python" }}]
        }}"#,
        serde_json::to_string(PYTHON).unwrap()
    ))
    .unwrap();

    assert_eq!(
        inspect_page(&page),
        InspectReport {
            accepted: true,
            problem_identifier: Some("two_sum".to_string()),
            language: "python".to_string(),
            target_path: Some("solutions/two_sum.py".to_string()),
            own_source: false,
            code: PYTHON.to_string(),
        }
    );
}

#[test]
fn inspect_page_without_problem_has_no_target() {
    let report = inspect_page(&PageSnapshot::default());
    assert!(!report.accepted);
    assert_eq!(report.problem_identifier, None);
    assert_eq!(report.target_path, None);
    assert_eq!(report.code, "");
}

#[test]
fn snapshot_host_detaches_when_file_is_removed() {
    let path = unique_temp_path("snapshot", "json");
    std::fs::write(&path, r#"{ "url": "https://leetcode.com/problems/two-sum/" }"#).unwrap();

    let mut host = SnapshotFileHost::new(&path);
    assert!(host.is_attached());
    assert_eq!(
        host.snapshot().problem_identifier().as_deref(),
        Some("two_sum")
    );

    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(host.snapshot(), PageSnapshot::default());

    std::fs::remove_file(&path).unwrap();
    assert!(!host.is_attached());
}

#[test]
fn watch_file_requires_existing_file() {
    let path = unique_temp_path("watched-missing", "json");
    assert!(matches!(
        watch_file(&path, FILE_EVENT_DEBOUNCE),
        Err(CliError::Io(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn watch_file_reports_writes_and_closes_on_removal() {
    let path = unique_temp_path("watched", "json");
    std::fs::write(&path, "{}").unwrap();
    let (_watch, mut receiver) = watch_file(&path, FILE_EVENT_DEBOUNCE).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(&path, r#"{ "url": "https://leetcode.com/problems/two-sum/" }"#).unwrap();
    let notified = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .unwrap();
    assert_eq!(notified, Some(()));

    std::fs::remove_file(&path).unwrap();
    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while receiver.recv().await.is_some() {}
    })
    .await;
    assert!(closed.is_ok());
}

#[test]
fn watcher_config_clamps_poll_interval() {
    assert_eq!(watcher_config(3000).poll_interval, Duration::from_secs(3));
    assert_eq!(watcher_config(0).poll_interval, Duration::from_millis(100));
    assert_eq!(watcher_config(3000).cooldown, Duration::from_secs(15));
}

#[test]
fn run_completions_writes_bash_script_file() {
    let output_path = unique_temp_path("completions", "bash");

    run_completions(CompletionShell::Bash, Some(&output_path)).unwrap();

    let script = std::fs::read_to_string(&output_path).unwrap();
    assert!(script.contains("_leetpush()"));
    assert!(script.contains("complete -F _leetpush"));

    let _ = std::fs::remove_file(output_path);
}

#[test]
fn render_completions_covers_subcommands() {
    let zsh = String::from_utf8(render_completions(CompletionShell::Zsh)).unwrap();
    assert!(zsh.contains("#compdef leetpush"));
    assert!(zsh.contains("test-connection"));

    let fish = String::from_utf8(render_completions(CompletionShell::Fish)).unwrap();
    assert!(fish.contains("complete -c leetpush"));
    assert!(fish.contains("watch"));
}

fn unique_suffix() -> String {
    static NEXT_TEST_ID: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let sequence = NEXT_TEST_ID.fetch_add(1, Ordering::Relaxed);
    format!("{timestamp}-{sequence}")
}

fn unique_temp_path(label: &str, extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "leetpush-cli-{label}-{}.{extension}",
        unique_suffix()
    ))
}

fn unique_username(label: &str) -> String {
    format!("{label}-{}", unique_suffix())
}
