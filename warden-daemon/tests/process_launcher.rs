//! Real child processes through `ProcessLauncher` (requires `/bin/sh` and `cat`).

use std::path::PathBuf;
use std::time::Duration;

use warden_core::{DaemonId, SupervisorConfig, SwitchUserConfig, SUCCESS_SENTINEL};
use warden_daemon::{DaemonError, DaemonRegistry, SyncOutcome};

const EVAL_LOOP: &str = r#"while IFS= read -r line; do if eval "$line"; then echo '~~~~COMMAND SUCCESFULL~~~~'; else echo '~~~~COMMAND FAILED~~~~'; fi; done"#;

fn registry() -> DaemonRegistry {
    DaemonRegistry::from_config(&SupervisorConfig {
        sync_timeout_secs: Some(10),
        ..SupervisorConfig::default()
    })
}

#[tokio::test]
async fn cat_echoes_commands_until_sentinel() {
    let registry = registry();
    let daemon = registry
        .get_or_create(DaemonId::from("cat"), "cat", None)
        .await
        .expect("spawn cat");
    assert!(daemon.pid().is_some());

    daemon.execute("hello").await.unwrap();
    daemon.execute(SUCCESS_SENTINEL).await.unwrap();

    let mut seen = Vec::new();
    let outcome = daemon.sync_with(|l| seen.push(l.to_string())).await;
    assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
    assert_eq!(seen, vec!["hello"]);
    assert!(!daemon.has_exited());
}

#[tokio::test]
async fn closing_input_ends_the_daemon() {
    let registry = registry();
    let daemon = registry
        .get_or_create(DaemonId::from("cat"), "cat", None)
        .await
        .unwrap();

    daemon.close_input().await.unwrap();
    assert_eq!(daemon.sync().await.unwrap(), SyncOutcome::StreamClosed);

    let mut exited = false;
    for _ in 0..50 {
        if daemon.has_exited() {
            exited = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(exited, "cat should exit after stdin closes");
    assert!(registry.is_running(&DaemonId::from("cat")).await);
}

#[tokio::test]
async fn shell_loop_reports_success_and_failure() {
    let registry = registry();
    let daemon = registry
        .get_or_create(DaemonId::from("sh"), EVAL_LOOP, None)
        .await
        .unwrap();

    daemon.execute("echo hi; echo there").await.unwrap();
    let mut seen = Vec::new();
    let outcome = daemon.sync_with(|l| seen.push(l.to_string())).await;
    assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
    assert_eq!(seen, vec!["hi", "there"]);

    daemon.execute("echo to-stderr >&2; false").await.unwrap();
    let mut seen = Vec::new();
    let err = daemon
        .sync_with(|l| seen.push(l.to_string()))
        .await
        .unwrap_err();
    assert!(err.is_command_failed(), "got: {err}");
    assert!(seen.is_empty());

    daemon.execute("true").await.unwrap();
    assert_eq!(daemon.sync().await.unwrap(), SyncOutcome::Completed);
}

#[tokio::test]
async fn switch_shell_receives_command_as_first_line() {
    // Stand-in for `su - {user}`: read one line, run it with the rest of stdin.
    let config = SupervisorConfig {
        switch_user: SwitchUserConfig {
            program: "/bin/sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"IFS= read -r cmd; exec /bin/sh -c "$cmd""#.to_string(),
                "{user}".to_string(),
            ],
        },
        sync_timeout_secs: Some(10),
        ..SupervisorConfig::default()
    };
    let registry: DaemonRegistry = DaemonRegistry::from_config(&config);
    let daemon = registry
        .get_or_create(DaemonId::from("as-user"), "cat", Some("nobody"))
        .await
        .unwrap();

    daemon.execute("ping").await.unwrap();
    daemon.execute(SUCCESS_SENTINEL).await.unwrap();

    let mut seen = Vec::new();
    daemon.sync_with(|l| seen.push(l.to_string())).await.unwrap();
    assert_eq!(seen, vec!["ping"]);
}

#[tokio::test]
async fn unknown_shell_is_a_spawn_failure() {
    let registry: DaemonRegistry = DaemonRegistry::from_config(&SupervisorConfig {
        shell: PathBuf::from("/no/such/shell"),
        ..SupervisorConfig::default()
    });
    let err = registry
        .get_or_create(DaemonId::from("x"), "cat", None)
        .await
        .unwrap_err();
    assert!(matches!(err, DaemonError::Spawn { .. }), "got: {err}");
    assert!(registry.is_empty().await);
}
