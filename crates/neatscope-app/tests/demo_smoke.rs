use std::process::Command;

#[test]
fn demo_session_runs_clean() {
    let bin = env!("CARGO_BIN_EXE_neatscope");
    let status = Command::new(bin)
        .env("RUST_LOG", "off")
        .env_remove("NEATSCOPE_CONFIG")
        .status()
        .expect("failed to run neatscope binary");
    assert!(status.success(), "demo session exited non-zero");
}
