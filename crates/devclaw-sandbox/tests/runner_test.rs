//! Runner integration tests. Direct-tier executions use real child
//! processes (`bash`), so these exercise the full spawn/supervise path.

use std::collections::HashMap;
use std::time::Duration;

use devclaw_core::config::{IsolationLevel, SandboxConfig};
use devclaw_core::Ctx;
use devclaw_sandbox::{ExecRequest, Runner};

fn write_script(dir: &std::path::Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn runner() -> Runner {
    Runner::new(SandboxConfig::default())
}

fn direct_request(script_path: &std::path::Path) -> ExecRequest {
    ExecRequest {
        script_path: script_path.display().to_string(),
        isolation: Some(IsolationLevel::None),
        ..ExecRequest::default()
    }
}

#[tokio::test]
async fn python_eval_is_preflight_blocked() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "danger.py", "eval(\"2+2\")\n");

    let result = runner()
        .run(&direct_request(&script), &Ctx::background())
        .await
        .unwrap();

    assert_eq!(result.exit_code, 1);
    assert!(result.killed);
    assert_eq!(result.kill_reason.as_deref(), Some("preflight_blocked"));
    assert!(result.stderr.contains("line 1"), "stderr: {}", result.stderr);
}

#[tokio::test]
async fn missing_script_is_policy_violation() {
    let request = ExecRequest {
        script_path: "/definitely/missing/tool.py".to_string(),
        isolation: Some(IsolationLevel::Restricted),
        ..ExecRequest::default()
    };
    let result = runner().run(&request, &Ctx::background()).await.unwrap();
    assert_eq!(result.exit_code, 1);
    assert!(result.killed);
    assert_eq!(result.kill_reason.as_deref(), Some("policy_violation"));
}

#[tokio::test]
async fn unknown_extension_is_unsupported_runtime() {
    let request = ExecRequest {
        script_path: "/opt/skill/blob.bin".to_string(),
        ..ExecRequest::default()
    };
    let result = runner().run(&request, &Ctx::background()).await.unwrap();
    assert_eq!(result.kill_reason.as_deref(), Some("unsupported_runtime"));
}

#[tokio::test]
async fn direct_shell_run_captures_output_and_files() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "hello.sh",
        "echo hello from sandbox\necho artifact > \"$DEVCLAW_TMPDIR/out.txt\"\n",
    );

    let result = runner()
        .run(&direct_request(&script), &Ctx::background())
        .await
        .unwrap();

    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
    assert!(!result.killed);
    assert!(result.stdout.contains("hello from sandbox"));
    assert_eq!(result.output_files.len(), 1);
    assert!(result.output_files[0].ends_with("out.txt"));
}

#[tokio::test]
async fn timeout_kills_the_process_group() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "slow.sh", "sleep 30\n");

    let mut request = direct_request(&script);
    request.timeout = Some(Duration::from_millis(200));
    let result = runner().run(&request, &Ctx::background()).await.unwrap();

    assert!(result.killed);
    assert_eq!(result.kill_reason.as_deref(), Some("timeout"));
    assert!(result.duration < Duration::from_secs(10));
}

#[tokio::test]
async fn cancellation_kills_the_child() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "slow.sh", "sleep 30\n");

    let runner = runner();
    let ctx = Ctx::background();
    let cancel = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        cancel.cancel();
    });

    let result = runner.run(&direct_request(&script), &ctx).await.unwrap();
    assert!(result.killed);
    assert_eq!(result.kill_reason.as_deref(), Some("cancelled"));
}

#[tokio::test]
async fn stdout_is_truncated_with_marker() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "noisy.sh", "yes devclaw | head -n 5000\n");

    let config = SandboxConfig {
        max_output_bytes: 512,
        ..SandboxConfig::default()
    };
    let result = Runner::new(config)
        .run(&direct_request(&script), &Ctx::background())
        .await
        .unwrap();

    assert!(result.stdout.ends_with("... [output truncated]"));
    assert!(result.stdout.len() < 600);
}

#[tokio::test]
async fn base_dir_substitution_resolves_script() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "tool.sh", "echo from-skill\n");

    let request = ExecRequest {
        script_path: "{baseDir}/tool.sh".to_string(),
        base_dir: Some(dir.path().to_path_buf()),
        isolation: Some(IsolationLevel::None),
        ..ExecRequest::default()
    };
    let result = runner().run(&request, &Ctx::background()).await.unwrap();
    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.contains("from-skill"));
}

#[tokio::test]
async fn filtered_env_does_not_reach_the_child() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "env.sh",
        "printf 'token=%s pythonpath=%s\\n' \"${SKILL_TOKEN:-unset}\" \"${PYTHONPATH:-unset}\"\n",
    );

    let mut env = HashMap::new();
    env.insert("SKILL_TOKEN".to_string(), "abc".to_string());
    env.insert("PYTHONPATH".to_string(), "/evil".to_string());

    let mut request = direct_request(&script);
    request.env = env;
    let result = runner().run(&request, &Ctx::background()).await.unwrap();

    assert!(result.stdout.contains("token=abc"));
    assert!(result.stdout.contains("pythonpath=unset"));
}
