use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

// Each integration binary uses a different subset of these helpers.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub config_path: PathBuf,
    pub state_path: PathBuf,
    pub bin_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config").join("config.json");
        let state_path = temp_dir.path().join("config").join("state.json");
        let bin_dir = temp_dir.path().join("bin");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_ir"));

        Self {
            _temp_dir: temp_dir,
            config_path,
            state_path,
            bin_dir,
            bin_path,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("IR_CONFIG_PATH", &self.config_path);
        cmd.env("IR_STATE_PATH", &self.state_path);
        cmd.env("IR_BIN_DIR", &self.bin_dir);
        cmd.env("HOME", self._temp_dir.path());
        cmd.env("XDG_CONFIG_HOME", self._temp_dir.path().join("xdg"));
        cmd.env_remove("GITHUB_TOKEN");
        cmd.env_remove("GITLAB_TOKEN");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> CommandOutput {
        self.cmd()
            .args(args)
            .output()
            .expect("Failed to run ir")
            .into()
    }

    /// Write a state file with one entry per `(name, tag, held)`.
    pub fn seed_state(&self, tools: &[(&str, &str, bool)]) {
        let mut state = serde_json::Map::new();
        for (name, tag, held) in tools {
            let url = format!("https://github.com/owner/{}", name);
            let mut release = serde_json::json!({
                "url": url,
                "name": tag,
                "tag_name": tag,
                "prerelease": false,
                "published_at": "2024-05-01T00:00:00Z",
                "assets": [{
                    "browser_download_url": format!("{}/releases/download/{}/{}-linux-amd64", url, tag, name),
                    "content_type": "application/octet-stream",
                    "created_at": "2024-05-01T00:00:00Z",
                    "download_count": 1,
                    "id": 1,
                    "name": format!("{}-linux-amd64", name),
                    "node_id": "RA_1",
                    "size": 1024,
                    "state": "uploaded",
                    "updated_at": "2024-05-01T00:00:00Z"
                }]
            });
            if *held {
                release["hold_update"] = serde_json::Value::Bool(true);
            }
            state.insert(format!("{}#{}", url, name), release);
        }

        fs::create_dir_all(self.state_path.parent().expect("state dir")).expect("create state dir");
        fs::write(
            &self.state_path,
            serde_json::to_string_pretty(&serde_json::Value::Object(state)).expect("serialize"),
        )
        .expect("write state");
    }

    pub fn read_state(&self) -> serde_json::Value {
        let raw = fs::read_to_string(&self.state_path).expect("read state");
        serde_json::from_str(&raw).expect("state is JSON")
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.status.success(),
            "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
