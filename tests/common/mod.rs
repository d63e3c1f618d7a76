#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use repomentor::api::{create_router, AppState};
use repomentor::{AnalysisPipeline, Config};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

pub const TEST_API_KEY: &str = "sk-test-secret-0123456789";

pub mod test_helpers {
    use super::*;

    pub fn setup_test_logger() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    }

    /// Config pointing both the GitHub API and the completion API at local mock servers
    pub fn create_test_config(github_base: &str, llm_base: &str) -> Config {
        let mut config = Config::default();
        config.github.api_base = github_base.to_string();
        config.github.timeout = Duration::from_secs(5);
        config.llm.api_key = Some(TEST_API_KEY.to_string());
        config.llm.base_url = Some(llm_base.to_string());
        config.llm.timeout = Duration::from_secs(5);
        config.llm.retry_delay = Duration::from_millis(10);
        config
    }

    pub fn create_test_router(config: &Config) -> axum::Router {
        let pipeline = AnalysisPipeline::from_config(config).expect("pipeline");
        create_router(AppState::new(pipeline))
    }

    pub async fn mock_repo_found(server: &mut ServerGuard, owner: &str, name: &str) -> Mock {
        server
            .mock("GET", format!("/repos/{}/{}", owner, name).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "full_name": format!("{}/{}", owner, name) }).to_string())
            .create_async()
            .await
    }

    pub async fn mock_root_contents(
        server: &mut ServerGuard,
        owner: &str,
        name: &str,
        files: &[&str],
    ) -> Mock {
        let entries: Vec<Value> = files
            .iter()
            .map(|f| json!({ "name": f, "type": "file" }))
            .collect();
        server
            .mock("GET", format!("/repos/{}/{}/contents", owner, name).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(Value::Array(entries).to_string())
            .create_async()
            .await
    }

    /// Completion endpoint replying with `content` as the first choice
    pub async fn mock_completion(server: &mut ServerGuard, content: &str) -> Mock {
        server
            .mock("POST", "/chat/completions")
            .match_header("authorization", format!("Bearer {}", TEST_API_KEY).as_str())
            .match_body(Matcher::PartialJson(json!({ "model": "gpt-4o-mini" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "chatcmpl-1",
                    "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_completion_status(server: &mut ServerGuard, status: usize, body: &str) -> Mock {
        server
            .mock("POST", "/chat/completions")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Entries directly under `dir`
    pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .expect("read temp root")
            .map(|entry| entry.expect("dir entry").path())
            .collect()
    }

    /// Path to a stand-in `git` that behaves according to the repository name:
    /// `missing` fails like an unknown remote, `slow` hangs, `forking` hangs
    /// while a background helper keeps writing into the checkout, anything
    /// else produces a small checkout with a `.git` directory.
    #[cfg(unix)]
    pub fn fake_git() -> PathBuf {
        static SCRIPT_DIR: OnceLock<TempDir> = OnceLock::new();
        let dir = SCRIPT_DIR.get_or_init(|| {
            use std::os::unix::fs::PermissionsExt;

            let dir = TempDir::new().expect("script dir");
            let path = dir.path().join("git");
            std::fs::write(&path, FAKE_GIT).expect("write fake git");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod fake git");
            dir
        });
        dir.path().join("git")
    }

    const FAKE_GIT: &str = r##"#!/bin/sh
for last; do :; done
dest="$last"
case "$*" in
  *github.com/acme/missing*)
    echo "fatal: repository 'https://github.com/acme/missing/' not found" >&2
    exit 128
    ;;
  *github.com/acme/slow*)
    exec sleep 30
    ;;
  *github.com/acme/forking*)
    (
      while :; do
        mkdir -p "$dest/objects/pack"
        echo x >> "$dest/objects/pack/partial"
        sleep 0.05
      done
    ) &
    sleep 30
    exit 0
    ;;
esac
mkdir -p "$dest/.git/objects" "$dest/src" "$dest/tests"
echo "[core]" > "$dest/.git/config"
echo "ref" > "$dest/.git/objects/test_object"
echo "# widgets" > "$dest/README.md"
echo "fn main() {}" > "$dest/src/main.rs"
echo "fn it_works() {}" > "$dest/tests/test_smoke.rs"
exit 0
"##;
}
