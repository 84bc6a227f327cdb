use std::process::Command;

fn bridge_bootstrap() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_bridge-bootstrap"));
    // Keep the developer's environment out of argument parsing.
    for var in [
        "BRIDGE_NETWORK",
        "DEPLOYER_PRIVATE_KEY",
        "DEPLOYER_MNEMONIC",
        "BRIDGE_RPC_URL",
    ] {
        command.env_remove(var);
    }
    command
}

#[test]
fn deploy_help_lists_option_groups() {
    let output = bridge_bootstrap()
        .args(["deploy", "--help"])
        .output()
        .expect("failed to execute bridge-bootstrap binary");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    for expected in [
        "--network",
        "--private-key",
        "--mnemonic",
        "--emergency-operator",
        "--emergency-upgrade-operator",
        "--genesis",
        "--skip-compile",
        "--deployment-dir",
        "--fund-relayers",
        "Funding options",
    ] {
        assert!(stdout.contains(expected), "help is missing {expected}");
    }
}

#[test]
fn networks_lists_every_preset() {
    let output = bridge_bootstrap()
        .arg("networks")
        .output()
        .expect("failed to execute bridge-bootstrap binary");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    assert_eq!(stdout.lines().count(), 13);
    assert!(stdout.contains("bsc "));
    assert!(stdout.contains("chain_id=56"));
    assert!(stdout.contains("MechainExecutor"));
}

#[test]
fn production_network_without_key_fails() {
    let output = bridge_bootstrap()
        .args(["--log.color", "never", "deploy", "--network", "bsc"])
        .output()
        .expect("failed to execute bridge-bootstrap binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("stderr should be utf-8");
    assert!(stderr.contains("--private-key"), "unexpected stderr: {stderr}");
}

#[test]
fn unknown_network_is_a_usage_error() {
    let output = bridge_bootstrap()
        .args(["deploy", "--network", "moon"])
        .output()
        .expect("failed to execute bridge-bootstrap binary");

    assert_eq!(output.status.code(), Some(2));
}
