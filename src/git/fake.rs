//! Scripted git runner for unit tests.

use super::{GitOutput, GitRunner};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Answers git invocations from a script keyed by the joined argument list.
///
/// Unscripted invocations fail, which is how most read paths report
/// "absent". Config writes (`config <key> <value>`, `config --unset <key>`)
/// are applied to an in-memory local store so that a fix followed by a
/// re-check observes the new value.
#[derive(Default)]
pub struct FakeGit {
    responses: Mutex<HashMap<(Option<PathBuf>, String), GitOutput>>,
    local_config: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<(PathBuf, String)>>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful response for any directory.
    pub fn ok(self, args: &str, stdout: &str) -> Self {
        self.set(None, args, GitOutput::success(stdout));
        self
    }

    /// Script a failing response for any directory.
    pub fn fail(self, args: &str) -> Self {
        self.set(None, args, GitOutput::failure("scripted failure"));
        self
    }

    /// Script a successful response for one directory only.
    pub fn ok_in(self, dir: &Path, args: &str, stdout: &str) -> Self {
        self.set(Some(dir.to_path_buf()), args, GitOutput::success(stdout));
        self
    }

    /// Seed the repository-local config store.
    pub fn config(self, key: &str, value: &str) -> Self {
        self.local_config.lock().expect("lock").insert(key.to_string(), value.to_string());
        self
    }

    pub fn set(&self, dir: Option<PathBuf>, args: &str, output: GitOutput) {
        self.responses.lock().expect("lock").insert((dir, args.to_string()), output);
    }

    pub fn local(&self, key: &str) -> Option<String> {
        self.local_config.lock().expect("lock").get(key).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").iter().map(|(_, a)| a.clone()).collect()
    }

    pub fn calls_in(&self, dir: &Path) -> Vec<String> {
        self.calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|(d, _)| d == dir)
            .map(|(_, a)| a.clone())
            .collect()
    }

    pub fn count(&self, args: &str) -> usize {
        self.calls().iter().filter(|a| a.as_str() == args).count()
    }

    fn config_op(&self, args: &[&str]) -> Option<GitOutput> {
        let mut store = self.local_config.lock().expect("lock");
        match args {
            ["config", "--local", "--get", key] => Some(match store.get(*key) {
                Some(v) => GitOutput::success(v.clone()),
                None => GitOutput::failure(""),
            }),
            ["config", "--unset", key] => Some(match store.remove(*key) {
                Some(_) => GitOutput::success(""),
                None => GitOutput::failure("key not set"),
            }),
            ["config", key, value] if !key.starts_with('-') => {
                store.insert(key.to_string(), value.to_string());
                Some(GitOutput::success(""))
            }
            _ => None,
        }
    }
}

impl GitRunner for FakeGit {
    fn run(&self, dir: &Path, args: &[&str]) -> GitOutput {
        let joined = args.join(" ");
        self.calls.lock().expect("lock").push((dir.to_path_buf(), joined.clone()));

        let responses = self.responses.lock().expect("lock");
        if let Some(out) = responses.get(&(Some(dir.to_path_buf()), joined.clone())) {
            return out.clone();
        }
        if let Some(out) = responses.get(&(None, joined.clone())) {
            return out.clone();
        }
        drop(responses);

        if let Some(out) = self.config_op(args) {
            return out;
        }
        // Effective lookups fall back to the local store.
        if let ["config", "--get", key] = args {
            if let Some(v) = self.local(key) {
                return GitOutput::success(v);
            }
        }
        GitOutput::failure(format!("unscripted: git {joined}"))
    }
}
