#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for bundling a project and unpacking the result.
//!
//! Each test builds a pack from a temporary project with the real bundler,
//! then installs it through [`unpack_scoped`] or the `unpack` command.

mod common;

use common::{PackProjectBuilder, RecordingHook, ScriptedPrompter};

use config_rocket::cli::{GlobalOpts, MergeArg, NonAssemblyArg, ParameterOpts, UnpackOpts};
use config_rocket::commands;
use config_rocket::config::ParamValue;
use config_rocket::error::{ConfigError, PackError, RocketError};
use config_rocket::hooks::HookBus;
use config_rocket::logging::{FileOutcome, Logger, NullLog};
use config_rocket::output::MergeMode;
use config_rocket::pack::{self, UnpackOptions, UnpackOutcome, unpack_scoped};
use config_rocket::prompt::PromptError;

const MANIFEST: &str = r#"{
    "parameters": [
        {"id": "$name", "resolver": {"operation": "prompt",
            "type": "text", "label": "Your name?", "initial": "Ada"}},
        {"id": "$private", "resolver": {"operation": "prompt",
            "type": "confirm", "label": "Private setup?", "initial": false}}
    ],
    "variablesResolver": {
        "{{NAME}}": "$name",
        "{{TITLE}}": {"type": "format", "a": "$name", "b": "Rocket", "result": "{a} & {b}"}
    },
    "excludesResolver": {
        "private.txt": {"type": "not", "a": "$private", "b": true}
    },
    "filesBuildResolver": {
        "notes": {"filePath": "docs/NOTES.md", "content": "fuel:notes.md"}
    }
}"#;

fn project() -> common::PackProject {
    PackProjectBuilder::new()
        .manifest(MANIFEST)
        .frame_file("README.md", "# {{TITLE}}\n\nMaintainer: {{NAME}}\n")
        .frame_file("private.txt", "secret for {{NAME}}\n")
        .frame_file(".config/app.json", r#"{"user": "{{NAME}}", "features": ["rocket"]}"#)
        .fuel("notes.md", "Notes for {{NAME}}\n")
        .build()
}

#[test]
fn bundled_pack_installs_with_prompted_answers() {
    let project = project();
    let bytes = project.bundle();
    let prompter = ScriptedPrompter::answering(&["Grace"]).then(Ok(ParamValue::Bool(false)));

    let outcome = unpack_scoped(
        &bytes,
        &UnpackOptions::new(project.out_dir()),
        &prompter,
        &mut HookBus::new(),
        &NullLog,
    )
    .unwrap();

    assert_eq!(*prompter.asked.borrow(), vec!["Your name?", "Private setup?"]);
    assert_eq!(project.read_out("README.md"), "# Grace & Rocket\n\nMaintainer: Grace\n");
    assert_eq!(project.read_out("docs/NOTES.md"), "Notes for Grace\n");
    assert!(!project.out_dir().join("private.txt").exists());
    assert!(!project.out_dir().join(pack::MANIFEST_FILE).exists());

    assert!(matches!(
        &outcome,
        UnpackOutcome::Assembled(report)
            if report.assembly.outcome_of("private.txt") == Some(FileOutcome::Excluded)
                && report.assembly.count(FileOutcome::Written) == 3
                && report.parameters["$name"] == ParamValue::from("Grace")
    ));
}

#[test]
fn confirm_answer_includes_excluded_file() {
    let project = project();
    let prompter = ScriptedPrompter::answering(&["Ada"]).then(Ok(ParamValue::Bool(true)));
    unpack_scoped(
        &project.bundle(),
        &UnpackOptions::new(project.out_dir()),
        &prompter,
        &mut HookBus::new(),
        &NullLog,
    )
    .unwrap();
    assert_eq!(project.read_out("private.txt"), "secret for Ada\n");
}

#[test]
fn cancelled_prompt_writes_nothing() {
    let project = project();
    let prompter = ScriptedPrompter::default().then(Err(PromptError::Cancelled));
    let err = unpack_scoped(
        &project.bundle(),
        &UnpackOptions::new(project.out_dir()),
        &prompter,
        &mut HookBus::new(),
        &NullLog,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RocketError::Config(ConfigError::UserCancelled { ref parameter }) if parameter == "$name"
    ));
    assert!(!project.out_dir().exists());
}

#[test]
fn existing_structured_files_are_deep_merged() {
    let project = project();
    project.seed_out(".config/app.json", r#"{"theme": "dark", "features": ["vim"]}"#);
    let hook = RecordingHook::default();
    let mut hooks = HookBus::new().with(hook.clone());
    let prompter = ScriptedPrompter::answering(&["Ada"]).then(Ok(ParamValue::Bool(false)));

    unpack_scoped(
        &project.bundle(),
        &UnpackOptions::new(project.out_dir()),
        &prompter,
        &mut hooks,
        &NullLog,
    )
    .unwrap();

    let merged: serde_json::Value = serde_json::from_str(&project.read_out(".config/app.json")).unwrap();
    assert_eq!(
        merged,
        serde_json::json!({"theme": "dark", "features": ["rocket", "vim"], "user": "Ada"})
    );
    let merges = hook.merges.borrow();
    assert_eq!(merges.len(), 1);
    assert_eq!(merges.values().copied().collect::<Vec<_>>(), vec![true]);
    assert_eq!(hook.writes.borrow().len(), 3);
}

#[test]
fn merge_off_overwrites_existing_files() {
    let project = project();
    project.seed_out(".config/app.json", r#"{"theme": "dark"}"#);
    let mut options = UnpackOptions::new(project.out_dir());
    options.assemble.merge = MergeMode::Off;
    let prompter = ScriptedPrompter::answering(&["Ada"]).then(Ok(ParamValue::Bool(false)));
    unpack_scoped(&project.bundle(), &options, &prompter, &mut HookBus::new(), &NullLog).unwrap();

    let written: serde_json::Value = serde_json::from_str(&project.read_out(".config/app.json")).unwrap();
    assert!(written.get("theme").is_none());
}

#[test]
fn concat_merge_appends_text() {
    let project = project();
    project.seed_out("README.md", "Existing\n");
    let mut options = UnpackOptions::new(project.out_dir());
    options.assemble.merge = MergeMode::Concat;
    let prompter = ScriptedPrompter::answering(&["Ada"]).then(Ok(ParamValue::Bool(false)));
    unpack_scoped(&project.bundle(), &options, &prompter, &mut HookBus::new(), &NullLog).unwrap();
    assert_eq!(
        project.read_out("README.md"),
        "Existing\n# Ada & Rocket\n\nMaintainer: Ada\n"
    );
}

#[test]
fn dry_run_reports_without_writing() {
    let project = project();
    let mut options = UnpackOptions::new(project.out_dir());
    options.assemble.dry_run = true;
    let prompter = ScriptedPrompter::answering(&["Ada"]).then(Ok(ParamValue::Bool(false)));
    let outcome = unpack_scoped(&project.bundle(), &options, &prompter, &mut HookBus::new(), &NullLog).unwrap();
    assert!(!project.out_dir().exists());
    assert!(matches!(
        outcome,
        UnpackOutcome::Assembled(report) if report.assembly.count(FileOutcome::DryRun) == 3
    ));
}

#[test]
fn corrupted_archive_fails_checksum() {
    let project = project();
    let bytes = project.bundle();
    let mut options = UnpackOptions::new(project.out_dir());
    options.sha256 = Some(pack::hash_bytes(b"something else", pack::HashEncoding::Base64Url));
    let err = unpack_scoped(&bytes, &options, &ScriptedPrompter::default(), &mut HookBus::new(), &NullLog)
        .unwrap_err();
    assert!(matches!(err, RocketError::Pack(PackError::ChecksumMismatch { .. })));
}

fn unpack_opts(source: String, out: std::path::PathBuf, params: &[&str]) -> UnpackOpts {
    UnpackOpts {
        source,
        sha256: None,
        non_assembly: NonAssemblyArg::Abort,
        out,
        merge: MergeArg::Deep,
        parameters: ParameterOpts {
            params: params.iter().map(ToString::to_string).collect(),
            yes: true,
        },
    }
}

#[test]
fn unpack_command_installs_from_a_file() {
    let project = project();
    let path = project.root_path().join("dist/rocket-bundle.zip");
    let checksum = pack::hash_bytes(&project.bundle(), pack::HashEncoding::Hex);

    let mut opts = unpack_opts(
        path.display().to_string(),
        project.out_dir(),
        &["$name=Linus", "$private=yes"],
    );
    opts.sha256 = Some(checksum);
    let global = GlobalOpts {
        dry_run: false,
        parallel: false,
    };
    commands::unpack::run(&global, &opts, &Logger::new("unpack-test")).unwrap();

    assert_eq!(project.read_out("README.md"), "# Linus & Rocket\n\nMaintainer: Linus\n");
    assert_eq!(project.read_out("private.txt"), "secret for Linus\n");
}

#[test]
fn unpack_command_rejects_plain_archive_on_abort() {
    let tmp = tempfile::tempdir().unwrap();
    let entries = [("README.md".to_string(), b"hi".to_vec())].into_iter().collect();
    let path = tmp.path().join("plain.zip");
    std::fs::write(&path, pack::zip_entries(&entries).unwrap()).unwrap();

    let opts = unpack_opts(path.display().to_string(), tmp.path().join("out"), &[]);
    let global = GlobalOpts {
        dry_run: false,
        parallel: true,
    };
    let err = commands::unpack::run(&global, &opts, &Logger::new("unpack-test")).unwrap_err();
    assert!(format!("{err:#}").contains("not a config pack"));
    assert!(!tmp.path().join("out").exists());
}
