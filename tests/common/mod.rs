// Shared helpers for integration tests.
//
// Provides a temporary pack project (manifest, frame and fuel directories)
// with a fluent builder, plus prompters and hook listeners used across the
// integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use config_rocket::config::ParamValue;
use config_rocket::hooks::{HookResult, RocketHooks};
use config_rocket::output::FileOutputState;
use config_rocket::pack::{self, BundleOptions};
use config_rocket::prompt::{PromptError, PromptRequest, Prompter};

/// An isolated pack project backed by a [`tempfile::TempDir`].
///
/// Layout:
/// - `rocket.config.json`  manifest
/// - `frame/`              files to assemble
/// - `fuel/`               fuel files
/// - `out/`                install target (created on demand)
pub struct PackProject {
    /// Temporary directory holding the project.
    pub root: tempfile::TempDir,
}

impl PackProject {
    /// Path to the project root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Frame directory.
    pub fn frame_dir(&self) -> PathBuf {
        self.root.path().join("frame")
    }

    /// Fuel directory.
    pub fn fuel_dir(&self) -> PathBuf {
        self.root.path().join("fuel")
    }

    /// Install target.
    pub fn out_dir(&self) -> PathBuf {
        self.root.path().join("out")
    }

    /// Read a file from the install target.
    pub fn read_out(&self, relative: &str) -> String {
        std::fs::read_to_string(self.out_dir().join(relative)).expect("read output file")
    }

    /// Write a file into the install target before installing.
    pub fn seed_out(&self, relative: &str, content: &str) {
        write(&self.out_dir().join(relative), content);
    }

    /// Bundle the project into `dist/<name>.zip` and return the archive bytes.
    pub fn bundle(&self) -> Vec<u8> {
        let mut options = BundleOptions::new(self.root.path().join("dist"));
        options.frame_dir = Some(self.frame_dir());
        if self.fuel_dir().is_dir() {
            options.fuel_dir = Some(self.fuel_dir());
        }
        let report = pack::bundle(&options, &config_rocket::logging::NullLog).expect("bundle project");
        std::fs::read(report.path).expect("read bundle")
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}

/// Fluent builder for [`PackProject`].
pub struct PackProjectBuilder {
    project: PackProject,
}

impl PackProjectBuilder {
    /// Begin a project with an empty manifest and an empty frame.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("frame")).expect("create frame dir");
        std::fs::write(root.path().join("rocket.config.json"), "{}").expect("write manifest");
        Self {
            project: PackProject { root },
        }
    }

    /// Replace the manifest.
    pub fn manifest(self, content: &str) -> Self {
        write(&self.project.root.path().join("rocket.config.json"), content);
        self
    }

    /// Add a frame file.
    pub fn frame_file(self, relative: &str, content: &str) -> Self {
        write(&self.project.frame_dir().join(relative), content);
        self
    }

    /// Add a fuel file.
    pub fn fuel(self, name: &str, content: &str) -> Self {
        write(&self.project.fuel_dir().join(name), content);
        self
    }

    /// Finish building.
    pub fn build(self) -> PackProject {
        self.project
    }
}

/// Answers prompts from a fixed queue and records every label asked.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Result<ParamValue, PromptError>>>,
    /// Labels of the prompts shown, in order.
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    /// Queue text answers.
    pub fn answering(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|a| Ok(ParamValue::from(*a))).collect()),
            asked: RefCell::default(),
        }
    }

    /// Queue one raw answer.
    pub fn then(self, answer: Result<ParamValue, PromptError>) -> Self {
        self.answers.borrow_mut().push_back(answer);
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&self, request: &PromptRequest) -> Result<ParamValue, PromptError> {
        self.asked.borrow_mut().push(request.label.clone());
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(PromptError::Failed(format!("unexpected prompt '{}'", request.label))))
    }
}

/// Records the path of every `on_write` and `on_merge` event.
#[derive(Clone, Default)]
pub struct RecordingHook {
    /// Paths seen by `on_write`.
    pub writes: Rc<RefCell<Vec<PathBuf>>>,
    /// Paths seen by `on_merge`, with their merge eligibility.
    pub merges: Rc<RefCell<BTreeMap<PathBuf, bool>>>,
}

impl RocketHooks for RecordingHook {
    fn on_write(&mut self, state: &mut FileOutputState) -> HookResult {
        self.writes.borrow_mut().push(state.path.clone());
        Ok(())
    }

    fn on_merge(&mut self, state: &mut FileOutputState) -> HookResult {
        self.merges
            .borrow_mut()
            .insert(state.path.clone(), state.is_merge_eligible);
        Ok(())
    }
}
