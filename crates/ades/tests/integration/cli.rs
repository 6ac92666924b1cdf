use anyhow::Result;

use crate::common::{OutputMode, ades, input_under_test};

#[test]
fn test_version() -> Result<()> {
    insta::assert_snapshot!(
        ades().no_progress(false).args(["--version"]).run()?,
        @"ades @@VERSION@@"
    );

    // Single-dash long flags are accepted too.
    insta::assert_snapshot!(
        ades().no_progress(false).args(["-version"]).run()?,
        @"ades @@VERSION@@"
    );

    Ok(())
}

#[test]
fn test_help() -> Result<()> {
    let help = ades().no_progress(false).args(["--help"]).run()?;

    assert!(help.contains("Usage: ades [OPTIONS] [PATHS]..."), "{help}");
    for flag in [
        "--conservative",
        "--explain <RULE>",
        "--json",
        "--suggestions",
        "--legal",
        "--completions <SHELL>",
    ] {
        assert!(help.contains(flag), "missing {flag} in help");
    }

    Ok(())
}

#[test]
fn test_legal() -> Result<()> {
    insta::assert_snapshot!(ades().no_progress(false).args(["-legal"]).run()?, @r"
    ades  Copyright (C) 2024  Eric Cornelissen
    This program comes with ABSOLUTELY NO WARRANTY; see the GPL v3.0 for details.
    This is free software, and you are welcome to redistribute it under certain
    conditions; see the GPL v3.0 for details.
    ");

    Ok(())
}

#[test]
fn test_explain() -> Result<()> {
    for args in [
        ["--explain", "ADES100"],
        ["-explain", "ADES100"],
        ["--explain", "ades100"],
    ] {
        let explanation = ades().no_progress(false).args(args).run()?;
        assert!(
            explanation.starts_with("ADES100 - Expression in 'run:' directive\n"),
            "{args:?}: {explanation}"
        );
    }

    let explanation = ades().no_progress(false).args(["--explain=ADES200"]).run()?;
    assert!(explanation.starts_with(
        "ADES200 - Expression in 'tag' input of 'ericcornelissen/git-tag-annotation-action'\n"
    ));

    Ok(())
}

#[test]
fn test_explain_unknown_rule() -> Result<()> {
    let output = ades()
        .no_progress(false)
        .expects_failure(true)
        .args(["--explain", "ADES999"])
        .run()?;

    assert!(output.contains(r#"unknown rule "ADES999""#), "{output}");
    assert!(output.contains("known rules are ADES100, ADES101"), "{output}");

    Ok(())
}

#[test]
fn test_explain_is_exclusive() -> Result<()> {
    let output = ades()
        .no_progress(false)
        .expects_failure(true)
        .args(["--explain", "ADES100", "--json"])
        .run()?;

    assert!(output.starts_with("error: "), "{output}");

    Ok(())
}

#[test]
fn test_unknown_flag() -> Result<()> {
    // Usage errors exit with 1, since 2 means violations were found.
    let output = ades().expects_failure(true).args(["--bogus"]).run()?;

    assert!(
        output.starts_with("error: unexpected argument '--bogus' found"),
        "{output}"
    );

    Ok(())
}

#[test]
fn test_completions() -> Result<()> {
    for shell in ["bash", "elvish", "fish", "nushell", "powershell", "zsh"] {
        let completions = ades()
            .no_progress(false)
            .args(["--completions", shell]).run()?;
        assert!(completions.contains("ades"), "{shell}: {completions}");
    }

    Ok(())
}

#[test]
fn test_nonexistent_path() -> Result<()> {
    let output = ades()
        .expects_failure(true)
        .input(input_under_test("repo"))
        .input("this/does/not/exist")
        .run()?;

    assert!(
        output.contains("couldn't read this/does/not/exist"),
        "{output}"
    );

    Ok(())
}

#[test]
fn test_invalid_input() -> Result<()> {
    let output = ades()
        .expects_failure(true)
        .input(input_under_test("invalid.yml"))
        .run()?;

    assert!(
        output.contains("couldn't parse @@TEST_PREFIX@@/invalid.yml as workflow"),
        "{output}"
    );

    Ok(())
}

#[test]
fn test_quiet() -> Result<()> {
    // Errors are still reflected in the exit status when logging is off.
    insta::assert_snapshot!(
        ades()
            .expects_failure(true)
            .output(OutputMode::Stderr)
            .args(["-qq"])
            .input("this/does/not/exist")
            .run()?,
        @""
    );

    Ok(())
}
