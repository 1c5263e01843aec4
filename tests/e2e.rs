use std::process::Command;

fn run(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_vendcore"))
        .args(args.iter().map(|arg| arg.replace("@", "tests/fixtures/")))
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn purchase_with_change() {
    let (stdout, stderr, success) = run(&["@purchase.csv", "@machine.yaml"]);

    assert!(success);
    assert!(stderr.is_empty(), "unexpected stderr: {stderr}");

    // 50.10 paid for 3.50: 2x20 + 6x1.00 + 2x0.25 + 1x0.10 handed back
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "channel,worth,count",
            "note,50.00,1",
            "coin,1.00,14",
            "coin,0.25,18",
            "coin,0.10,20",
        ]
    );
}

#[test]
fn errors_warn_but_do_not_block() {
    let (stdout, stderr, success) = run(&["@with_errors.csv", "@machine.yaml"]);

    assert!(success);
    assert!(stderr.contains("unrecognized action"));
    assert!(stderr.contains("missing amount"));

    // the note pushed into the coin slot was rejected, the three coins paid
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "channel,worth,count",
            "note,20.00,2",
            "coin,1.00,23",
            "coin,0.25,20",
            "coin,0.10,20",
        ]
    );
}

#[test]
fn cancel_refunds_with_default_config() {
    let (stdout, stderr, success) = run(&["@refund.csv"]);

    assert!(success);
    assert!(stderr.is_empty(), "unexpected stderr: {stderr}");
    assert_eq!(stdout.trim(), "channel,worth,count");
}

#[test]
fn missing_arguments_fail() {
    let (stdout, stderr, success) = run(&[]);

    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("usage"));
}

#[test]
fn missing_config_fails() {
    let (_, stderr, success) = run(&["@purchase.csv", "@nope.yaml"]);

    assert!(!success);
    assert!(stderr.contains("failed to read config"));
}
