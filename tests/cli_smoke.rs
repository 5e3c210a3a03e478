use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn daycard_help_works() {
    Command::cargo_bin("daycard")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("personal day planner"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "signup", "login", "logout", "whoami", "add", "toggle", "edit", "rm", "show", "cards",
        "stats", "rebuild",
    ];

    for cmd in subcommands {
        Command::cargo_bin("daycard")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn invalid_rust_log_does_not_break_startup() {
    Command::cargo_bin("daycard")
        .expect("binary")
        .env("RUST_LOG", "this is [not a filter")
        .arg("--help")
        .assert()
        .success();
}
