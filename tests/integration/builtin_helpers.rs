//! Built-in helpers against a temporary workspace and a fake command runner.

use crate::integration::test_utils::{memory_context, workspace_context, FakeBehaviour, FakeRunner};
use dxready::config::ReadinessConfig;
use dxready::error::ReadinessError;
use dxready::helpers::{
    default_registry, ComposerHelper, GitRepositoryHelper, PhpRuntimeHelper, COMPOSER_KEY, GIT_KEY,
    PHP_RUNTIME_KEY,
};
use dxready::readiness::{OutcomeStatus, ReadinessRegistry};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn git_initialises_missing_repository() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeRunner::new().on("git", FakeBehaviour::Creates(vec![".git/"])));
    let mut registry = ReadinessRegistry::new();
    registry.register(GitRepositoryHelper::new(runner.clone())).unwrap();
    let (_sink, context) = workspace_context(temp.path());

    let first = registry.plan(&[GIT_KEY]).unwrap().run(&context).await;
    assert_eq!(first.outcome(GIT_KEY).unwrap().status, OutcomeStatus::Updated);
    assert!(temp.path().join(".git").is_dir());
    assert_eq!(runner.calls(), vec!["git init"]);

    let second = registry.plan(&[GIT_KEY]).unwrap().run(&context).await;
    assert_eq!(second.outcome(GIT_KEY).unwrap().status, OutcomeStatus::Ready);
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn helpers_without_workspace_are_blocked() {
    let runner = Arc::new(FakeRunner::new());
    let registry = default_registry(&ReadinessConfig::default(), runner.clone()).unwrap();
    let (_sink, context) = memory_context();

    let result = registry
        .plan(&[GIT_KEY, COMPOSER_KEY])
        .unwrap()
        .run(&context)
        .await;

    assert_eq!(
        result.statuses().into_iter().map(|(_, s)| s).collect::<Vec<_>>(),
        vec![OutcomeStatus::Blocked, OutcomeStatus::Blocked]
    );
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn composer_without_manifest_is_blocked() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeRunner::new());
    let mut registry = ReadinessRegistry::new();
    registry.register(ComposerHelper::new(runner.clone(), true)).unwrap();
    let (_sink, context) = workspace_context(temp.path());

    let result = registry.plan(&[COMPOSER_KEY]).unwrap().run(&context).await;

    let outcome = result.outcome(COMPOSER_KEY).unwrap();
    assert_eq!(outcome.status, OutcomeStatus::Blocked);
    assert_eq!(
        outcome.message(),
        Some("composer.json missing. Run composer init or add manifest.")
    );
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn composer_installs_when_autoload_missing() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("composer.json"), "{}").unwrap();
    let runner = Arc::new(
        FakeRunner::new().on("composer", FakeBehaviour::Creates(vec!["vendor/autoload.php"])),
    );
    let mut registry = ReadinessRegistry::new();
    registry.register(ComposerHelper::new(runner.clone(), true)).unwrap();
    let (_sink, context) = workspace_context(temp.path());

    let result = registry.plan(&[COMPOSER_KEY]).unwrap().run(&context).await;

    assert_eq!(result.outcome(COMPOSER_KEY).unwrap().status, OutcomeStatus::Updated);
    assert_eq!(runner.calls(), vec!["composer install --no-interaction"]);
    assert!(temp.path().join("vendor/autoload.php").is_file());
}

#[tokio::test]
async fn composer_reports_pending_when_install_disabled() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("composer.json"), "{}").unwrap();
    let runner = Arc::new(FakeRunner::new());
    let mut registry = ReadinessRegistry::new();
    registry.register(ComposerHelper::new(runner.clone(), false)).unwrap();
    let (_sink, context) = workspace_context(temp.path());

    let result = registry.plan(&[COMPOSER_KEY]).unwrap().run(&context).await;

    assert_eq!(result.outcome(COMPOSER_KEY).unwrap().status, OutcomeStatus::Pending);
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn failed_install_rolls_back_git_init() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("composer.json"), "{}").unwrap();
    let runner = Arc::new(
        FakeRunner::new()
            .on("git", FakeBehaviour::Creates(vec![".git/"]))
            .on(
                "composer",
                FakeBehaviour::Fails(2, "Your requirements could not be resolved."),
            ),
    );
    let mut registry = ReadinessRegistry::new();
    registry.register(GitRepositoryHelper::new(runner.clone())).unwrap();
    registry.register(ComposerHelper::new(runner.clone(), true)).unwrap();
    let (_sink, context) = workspace_context(temp.path());

    let result = registry
        .plan(&[GIT_KEY, COMPOSER_KEY])
        .unwrap()
        .run(&context)
        .await;

    assert_eq!(result.outcome(GIT_KEY).unwrap().status, OutcomeStatus::Updated);
    assert_eq!(result.outcome(COMPOSER_KEY).unwrap().status, OutcomeStatus::Failed);
    assert!(!temp.path().join(".git").exists(), "git cleanup should remove .git");

    let aggregate = result.error.unwrap();
    match &aggregate.primary {
        ReadinessError::CommandFailed {
            command, exit_code, ..
        } => {
            assert_eq!(command, "composer install --no-interaction");
            assert_eq!(*exit_code, Some(2));
        }
        other => panic!("unexpected primary error: {:?}", other),
    }
    assert!(aggregate
        .primary
        .detail_lines()
        .contains(&"Your requirements could not be resolved.".to_string()));
}

#[tokio::test]
async fn composer_cleanup_keeps_preexisting_vendor() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("composer.json"), "{}").unwrap();
    std::fs::create_dir_all(temp.path().join("vendor/acme")).unwrap();
    let runner = Arc::new(
        FakeRunner::new().on("composer", FakeBehaviour::Creates(vec!["vendor/autoload.php"])),
    );
    let mut registry = ReadinessRegistry::new();
    registry.register(ComposerHelper::new(runner.clone(), true)).unwrap();
    // `git` runs after composer and fails because the fake has no `git`.
    registry.register(GitRepositoryHelper::new(runner.clone())).unwrap();
    let (_sink, context) = workspace_context(temp.path());

    let result = registry
        .plan(&[COMPOSER_KEY, GIT_KEY])
        .unwrap()
        .run(&context)
        .await;

    assert!(result.is_aborted());
    assert_eq!(
        result.error.as_ref().unwrap().primary.code(),
        "EnvironmentalError"
    );
    assert!(temp.path().join("vendor/acme").is_dir());
    assert!(temp.path().join("vendor/autoload.php").is_file());
}

#[tokio::test]
async fn composer_cleanup_removes_vendor_it_created() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("composer.json"), "{}").unwrap();
    let runner = Arc::new(
        FakeRunner::new().on("composer", FakeBehaviour::Creates(vec!["vendor/autoload.php"])),
    );
    let mut registry = ReadinessRegistry::new();
    registry.register(ComposerHelper::new(runner.clone(), true)).unwrap();
    registry.register(GitRepositoryHelper::new(runner.clone())).unwrap();
    let (_sink, context) = workspace_context(temp.path());

    let result = registry
        .plan(&[COMPOSER_KEY, GIT_KEY])
        .unwrap()
        .run(&context)
        .await;

    assert!(result.is_aborted());
    assert!(!temp.path().join("vendor").exists());
}

#[tokio::test]
async fn php_runtime_resolves_from_search_path() {
    let temp = TempDir::new().unwrap();
    let bin = temp.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    std::fs::write(bin.join("php"), "").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(bin.join("php"), std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let mut registry = ReadinessRegistry::new();
    registry
        .register(PhpRuntimeHelper::new("php").with_search_path(bin.as_os_str()))
        .unwrap();
    let (_sink, context) = memory_context();

    let result = registry.plan(&[PHP_RUNTIME_KEY]).unwrap().run(&context).await;
    assert_eq!(result.outcome(PHP_RUNTIME_KEY).unwrap().status, OutcomeStatus::Ready);
}

#[tokio::test]
async fn php_runtime_missing_is_blocked() {
    let temp = TempDir::new().unwrap();
    let mut registry = ReadinessRegistry::new();
    registry
        .register(PhpRuntimeHelper::new("php").with_search_path(temp.path().as_os_str()))
        .unwrap();
    let (_sink, context) = memory_context();

    let result = registry.plan(&[PHP_RUNTIME_KEY]).unwrap().run(&context).await;

    let outcome = result.outcome(PHP_RUNTIME_KEY).unwrap();
    assert_eq!(outcome.status, OutcomeStatus::Blocked);
    assert_eq!(outcome.message(), Some("`php` not found on PATH."));
    assert!(result.error.is_none());
}
