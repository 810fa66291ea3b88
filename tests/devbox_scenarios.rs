//! End-to-end flows through `Devbox` with fake installer, shell and builder

mod support;

use devbox::devbox::{GEN_DIR, PROFILE_DIR};
use devbox::fs::RealFileSystem;
use devbox::planner::RustPlanner;
use devbox::{Devbox, DevboxError, EnvironmentState, PlannerRegistry, TemplateSet};
use std::fs;
use std::sync::Arc;
use support::{project, read, strings, AcceptAllIndex, Harness, RecordingInstaller};

const EMPTY_CONFIG: &str = "{\n  \"packages\": []\n}\n";

#[test]
fn test_add_twice_installs_once() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG)]);
    let mut h = Harness::open(dir.path(), false);

    let first = h.devbox.add(&strings(&["git"])).unwrap();
    assert!(first.applied);
    assert_eq!(first.changed, vec!["git"]);
    assert_eq!(first.message.as_deref(), Some("git is now installed."));

    let second = h.devbox.add(&strings(&["git"])).unwrap();
    assert!(!second.applied);
    assert!(second.changed.is_empty());

    assert_eq!(h.installer.call_count(), 1);
    assert_eq!(h.devbox.config().packages, vec!["git"]);
    assert!(read(dir.path().join("devbox.json")).contains("\"git\""));
}

#[test]
fn test_add_rejects_whole_batch_on_unknown_package() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG)]);
    let mut h = Harness::open(dir.path(), false);

    let err = h.devbox.add(&strings(&["git", "nope"])).unwrap_err();
    assert!(matches!(err, DevboxError::PackageNotFound { ref package } if package == "nope"));

    assert!(h.devbox.config().packages.is_empty());
    assert_eq!(read(dir.path().join("devbox.json")), EMPTY_CONFIG);
    assert_eq!(h.installer.call_count(), 0);
}

#[test]
fn test_add_rejects_malformed_identifier_before_saving() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG)]);
    let mut h = Harness::open(dir.path(), false);
    h.devbox = h.devbox.with_package_index(Arc::new(AcceptAllIndex));

    let err = h.devbox.add(&strings(&["git", "foo bar"])).unwrap_err();
    assert!(matches!(err, DevboxError::InvalidPackage(_)));
    assert!(err.to_string().contains("\"foo bar\""));

    assert!(h.devbox.config().packages.is_empty());
    assert_eq!(read(dir.path().join("devbox.json")), EMPTY_CONFIG);
    assert_eq!(h.installer.call_count(), 0);
    assert!(Devbox::open(dir.path(), false).is_ok());
}

#[test]
fn test_add_reports_repeated_package_once() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG)]);
    let mut h = Harness::open(dir.path(), false);

    let update = h.devbox.add(&strings(&["git", "git"])).unwrap();
    assert_eq!(update.message.as_deref(), Some("git is now installed."));
    assert_eq!(update.changed, vec!["git"]);
    assert_eq!(h.devbox.config().packages, vec!["git"]);
}

#[test]
fn test_remove_unlisted_package_skips_installer() {
    let dir = project(&[("devbox.json", "{\"packages\": [\"git\"]}")]);
    let mut h = Harness::open(dir.path(), false);

    let update = h.devbox.remove(&strings(&["ripgrep"])).unwrap();
    assert!(!update.applied);
    assert_eq!(h.installer.call_count(), 0);
    assert_eq!(h.devbox.config().packages, vec!["git"]);
}

#[test]
fn test_remove_listed_package_reinstalls_profile() {
    let dir = project(&[("devbox.json", "{\"packages\": [\"git\", \"go\"]}")]);
    let mut h = Harness::open(dir.path(), false);

    let update = h.devbox.remove(&strings(&["git"])).unwrap();
    assert!(update.applied);
    assert_eq!(update.message.as_deref(), Some("git is now removed."));
    assert_eq!(h.devbox.config().packages, vec!["go"]);

    let development = read(h.devbox.gen_dir().join("development.nix"));
    assert!(development.contains("    go\n"));
    assert!(!development.contains("    git\n"));
}

#[test]
fn test_install_failure_propagates() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG)]);
    let mut h = Harness::open_with(dir.path(), false, RecordingInstaller::failing());

    let err = h.devbox.add(&strings(&["git"])).unwrap_err();
    match err {
        DevboxError::InstallFailure { output, .. } => assert!(output.contains("undefined variable")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_ne!(h.devbox.state(), EnvironmentState::Realized);
}

#[test]
fn test_hash_hint_only_inside_shell() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG)]);

    let mut outside = Harness::open(dir.path(), false);
    let update = outside.devbox.add(&strings(&["git"])).unwrap();
    assert!(!update.message.unwrap().contains("hash -r"));

    let mut inside = Harness::open(dir.path(), true);
    let update = inside.devbox.add(&strings(&["go", "ripgrep"])).unwrap();
    assert_eq!(
        update.message.as_deref(),
        Some("go, ripgrep are now installed. Run `hash -r` to ensure your shell is updated.")
    );
}

#[test]
fn test_generate_writes_both_sets() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG)]);
    let mut h = Harness::open(dir.path(), false);
    assert_eq!(h.devbox.state(), EnvironmentState::Configured);

    let written = h.devbox.generate().unwrap();
    assert_eq!(written.len(), 6);

    let gen_dir = dir.path().join(GEN_DIR);
    for name in TemplateSet::Shell
        .file_names()
        .into_iter()
        .chain(TemplateSet::Build.file_names())
    {
        assert!(gen_dir.join(name).is_file(), "{} was not written", name);
    }
    assert_eq!(h.devbox.state(), EnvironmentState::Generated);
    assert_eq!(h.installer.call_count(), 0);
}

#[test]
fn test_packages_only_project_has_post_init_hook_only() {
    let dir = project(&[("devbox.json", "{\"packages\": [\"git\"]}")]);
    let mut h = Harness::open(dir.path(), false);

    h.devbox.generate().unwrap();
    let shellrc = read(h.devbox.gen_dir().join("shellrc"));
    assert!(shellrc.contains("# Begin Devbox Post-init Hook"));
    assert!(!shellrc.contains("# Begin Devbox User Hook"));
    assert!(!shellrc.contains("# Begin Plan Init Hook"));
    assert!(!shellrc.contains("run_script()"));

    let development = read(h.devbox.gen_dir().join("development.nix"));
    assert!(development.contains("    git\n"));

    let dockerfile = read(h.devbox.gen_dir().join("Dockerfile"));
    assert!(!dockerfile.contains("CMD"));
}

#[test]
fn test_declared_build_stage_overrides_npm() {
    let dir = project(&[
        ("devbox.json", "{\"packages\": [], \"build_stage\": {\"command\": \"make\"}}"),
        ("package.json", r#"{"scripts": {"build": "tsc", "start": "node dist/index.js"}}"#),
        ("package-lock.json", "{}"),
    ]);
    let mut h = Harness::open(dir.path(), false);

    let plan = h.devbox.build_plan().unwrap();
    assert_eq!(plan.build_stage.command, vec!["make"]);
    assert_eq!(plan.install_stage.command, vec!["npm ci"]);
    assert!(plan.dev_packages.contains(&"nodejs".to_string()));

    h.devbox.generate().unwrap();
    let dockerfile = read(h.devbox.gen_dir().join("Dockerfile"));
    assert!(dockerfile.contains("RUN npm ci\n"));
    assert!(dockerfile.contains("RUN make\n"));
    assert!(dockerfile.contains(r#"CMD ["sh","-c","npm start"]"#));
}

#[test]
fn test_poetry_build_override_conflicts_before_anything_is_written() {
    let dir = project(&[
        ("devbox.json", "{\"packages\": [], \"build_stage\": {\"command\": [\"make dist\"]}}"),
        (
            "pyproject.toml",
            "[tool.poetry]\nname = \"app\"\n\n[tool.poetry.scripts]\napp = \"app:main\"\n",
        ),
    ]);
    let mut h = Harness::open(dir.path(), false);

    let err = h.devbox.build(Default::default()).unwrap_err();
    assert!(matches!(err, DevboxError::PlanConflict(_)));
    assert!(!h.devbox.gen_dir().join("Dockerfile").exists());
    assert!(h.builder.builds.lock().unwrap().is_empty());
}

#[test]
fn test_poetry_build_and_start_override_inherits_install() {
    let dir = project(&[
        (
            "devbox.json",
            "{\"packages\": [], \"build_stage\": {\"command\": \"make\"}, \"start_stage\": {\"command\": \"./app\"}}",
        ),
        (
            "pyproject.toml",
            "[tool.poetry]\nname = \"app\"\n\n[tool.poetry.scripts]\napp = \"app:main\"\n",
        ),
    ]);
    let mut h = Harness::open(dir.path(), false);

    let plan = h.devbox.build_plan().unwrap();
    assert_eq!(plan.install_stage.command, vec!["poetry install --no-root --no-interaction"]);
    assert_eq!(plan.build_stage.command, vec!["make"]);
    assert_eq!(plan.start_stage.command, vec!["./app"]);

    h.devbox.build(Default::default()).unwrap();
    let dockerfile = read(h.devbox.gen_dir().join("Dockerfile"));
    assert!(dockerfile.contains("RUN poetry install --no-root --no-interaction\n"));
    assert!(dockerfile.contains("RUN make\n"));
    assert_eq!(h.builder.builds.lock().unwrap().len(), 1);
}

#[test]
fn test_custom_planner_registry_is_consulted() {
    let dir = project(&[
        ("devbox.json", EMPTY_CONFIG),
        ("go.mod", "module app\n"),
        ("Cargo.toml", "[package]\nname = \"hello\"\n"),
    ]);
    let mut registry = PlannerRegistry::new(Arc::new(RealFileSystem::new()));
    registry.register(Arc::new(RustPlanner));
    let mut h = Harness::open(dir.path(), false);
    h.devbox = h.devbox.with_planners(registry);

    let plan = h.devbox.build_plan().unwrap();
    assert_eq!(plan.planner.as_deref(), Some("rust"));
    assert_eq!(plan.start_stage.command, vec!["./target/release/hello"]);
}

#[test]
fn test_build_defaults_to_generated_dockerfile() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG), ("go.mod", "module app\n\ngo 1.19\n")]);
    let mut h = Harness::open(dir.path(), false);

    h.devbox.build(Default::default()).unwrap();

    let builds = h.builder.builds.lock().unwrap();
    assert_eq!(builds.len(), 1);
    let (context, flags) = &builds[0];
    assert_eq!(context, h.devbox.src_dir());
    assert_eq!(flags.dockerfile, Some(h.devbox.gen_dir().join("Dockerfile")));
    assert!(flags.name.is_none());
    assert!(read(h.devbox.gen_dir().join("Dockerfile")).contains("RUN go get\n"));
}

#[test]
fn test_build_keeps_explicit_flags() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG)]);
    let mut h = Harness::open(dir.path(), false);

    let flags = devbox::BuildFlags {
        name: Some("app:1".to_string()),
        dockerfile: Some(dir.path().join("Dockerfile.custom")),
    };
    h.devbox.build(flags.clone()).unwrap();

    let builds = h.builder.builds.lock().unwrap();
    assert_eq!(builds[0].1, flags);
}

#[test]
fn test_exec_prefixes_profile_path() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG)]);
    let mut h = Harness::open(dir.path(), false);

    h.devbox.exec(&strings(&["make test"])).unwrap();

    let execs = h.shell.execs.lock().unwrap();
    assert_eq!(execs.len(), 1);
    let (shell_nix, commands) = &execs[0];
    assert_eq!(shell_nix, &h.devbox.gen_dir().join("shell.nix"));
    let profile_bin = h.devbox.src_dir().join(PROFILE_DIR).join("bin");
    assert_eq!(
        commands,
        &vec![
            format!("PATH=\"{}:$PATH\"", profile_bin.display()),
            "make test".to_string(),
        ]
    );
    assert_eq!(h.installer.call_count(), 1);
    assert_eq!(h.devbox.state(), EnvironmentState::Realized);
}

#[test]
fn test_shell_installs_then_launches() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG)]);
    let mut h = Harness::open(dir.path(), false);

    h.devbox.shell().unwrap();

    let runs = h.shell.runs.lock().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].shell_nix, h.devbox.gen_dir().join("shell.nix"));
    assert_eq!(runs[0].shellrc, h.devbox.gen_dir().join("shellrc"));
    assert_eq!(runs[0].project_dir, h.devbox.src_dir());
    assert!(runs[0].shellrc.is_file());
    assert_eq!(h.installer.call_count(), 1);
}

#[test]
fn test_shell_plan_takes_ecosystem_hook() {
    let dir = project(&[
        ("devbox.json", "{\"packages\": [\"git\"]}"),
        ("requirements.txt", "flask\n"),
    ]);
    let mut h = Harness::open(dir.path(), false);

    let plan = h.devbox.shell_plan();
    assert_eq!(plan.dev_packages, vec!["git"]);
    assert!(plan.install_stage.is_absent());
    assert_eq!(
        plan.shell_init_hook,
        vec!["[ -f .venv/bin/activate ] && . .venv/bin/activate"]
    );

    h.devbox.generate().unwrap();
    let shellrc = read(h.devbox.gen_dir().join("shellrc"));
    assert!(shellrc.contains("# Begin Plan Init Hook"));
    assert!(shellrc.contains(". .venv/bin/activate"));
}

#[test]
fn test_user_hook_is_rendered() {
    let dir = project(&[(
        "devbox.json",
        "{\"packages\": [], \"shell\": {\"init_hook\": [\"export FOO=bar\", \"echo ready\"]}}",
    )]);
    let mut h = Harness::open(dir.path(), false);

    h.devbox.generate().unwrap();
    let shellrc = read(h.devbox.gen_dir().join("shellrc"));
    assert!(shellrc.contains("# Begin Devbox User Hook"));
    assert!(shellrc.contains("export FOO=bar\necho ready\n"));
}

#[test]
fn test_open_from_nested_directory() {
    let dir = project(&[("devbox.json", EMPTY_CONFIG)]);
    let nested = dir.path().join("src").join("pkg");
    fs::create_dir_all(&nested).unwrap();

    let h = Harness::open(&nested, false);
    assert_eq!(
        h.devbox.src_dir().canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
    assert_eq!(h.devbox.state(), EnvironmentState::Configured);
}

#[test]
fn test_open_without_config_fails() {
    let dir = project(&[]);

    let err = devbox::Devbox::open(dir.path(), false).err().unwrap();
    assert!(matches!(err, DevboxError::ConfigNotFound { .. }));
    assert!(err.to_string().contains("devbox init"));
}

#[test]
fn test_malformed_config_is_reported() {
    let dir = project(&[("devbox.json", "{\"packages\": [\"git\"], \"pakages\": []}")]);

    let err = devbox::Devbox::open(dir.path(), false).err().unwrap();
    assert!(matches!(err, DevboxError::ConfigMalformed { .. }));
}
