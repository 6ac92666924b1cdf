use anyhow::Result;

use crate::common::{ades, input_under_test};

const UNSAFE_WORKFLOW: &str = r#"
on: workflow_dispatch

jobs:
  unsafe:
    name: Unsafe
    runs-on: ubuntu-latest
    steps:
      - name: Example
        run: echo ${{ inputs.value }}
"#;

const UNSAFE_MANIFEST: &str = r#"
name: Example
runs:
  using: composite
  steps:
    - uses: actions/github-script@v6
      with:
        script: console.log('${{ inputs.value }}')
"#;

#[test]
fn test_stdin_json() -> Result<()> {
    let output = ades()
        .expects_violations(true)
        .stdin(UNSAFE_WORKFLOW)
        .args(["--json", "-"])
        .run()?;

    assert_eq!(
        output,
        "{\"problems\":[{\"target\":\"stdin\",\"file\":\"stdin\",\"job\":\"Unsafe\",\"step\":\"Example\",\"problem\":\"${{ inputs.value }}\"}]}\n"
    );

    Ok(())
}

#[test]
fn test_stdin_manifest() -> Result<()> {
    insta::assert_snapshot!(
        ades()
            .expects_violations(true)
            .stdin(UNSAFE_MANIFEST)
            .args(["-"])
            .run()?,
        @r##"
    Detected 1 violation(s) in "stdin":
        step "#0" contains "${{ inputs.value }}" (ADES101)

    Use --explain for more details and fix suggestions (example: 'ades --explain ADES100')
    "##
    );

    Ok(())
}

#[test]
fn test_stdin_clean() -> Result<()> {
    insta::assert_snapshot!(
        ades().stdin("jobs: {}\n").args(["-json", "-"]).run()?,
        @r#"{"problems":[]}"#
    );

    Ok(())
}

#[test]
fn test_single_file() -> Result<()> {
    insta::assert_snapshot!(
        ades()
            .expects_violations(true)
            .input(input_under_test("unsafe.yml"))
            .run()?,
        @r#"
    Detected 1 violation(s) in "@@TEST_PREFIX@@/unsafe.yml":
      1 in job "Unsafe":
        step "Example" contains "${{ inputs.value }}" (ADES100)

    Use --explain for more details and fix suggestions (example: 'ades --explain ADES100')
    "#
    );

    insta::assert_snapshot!(
        ades().input(input_under_test("safe.yml")).run()?,
        @"Ok"
    );

    Ok(())
}

#[test]
fn test_repository() -> Result<()> {
    insta::assert_snapshot!(
        ades()
            .expects_violations(true)
            .input(input_under_test("repo"))
            .run()?,
        @r##"
    Detected 2 violation(s) in ".github/workflows/ci.yml":
      1 in job "Release":
        step "#0" contains "${{ github.ref_name }}" (ADES200)
      1 in job "test":
        step "Greet" contains "${{ github.event.pull_request.title }}" (ADES100)
    Detected 1 violation(s) in "action.yml":
        step "Log" contains "${{ inputs.message }}" (ADES101)

    Use --explain for more details and fix suggestions (example: 'ades --explain ADES100')
    "##
    );

    Ok(())
}

#[test]
fn test_repository_json() -> Result<()> {
    insta::assert_snapshot!(
        ades()
            .expects_violations(true)
            .args(["--json"])
            .input(input_under_test("repo"))
            .run()?,
        @r##"{"problems":[{"target":"@@TEST_PREFIX@@/repo","file":".github/workflows/ci.yml","job":"test","step":"Greet","problem":"${{ github.event.pull_request.title }}"},{"target":"@@TEST_PREFIX@@/repo","file":".github/workflows/ci.yml","job":"Release","step":"#0","problem":"${{ github.ref_name }}"},{"target":"@@TEST_PREFIX@@/repo","file":"action.yml","job":"","step":"Log","problem":"${{ inputs.message }}"}]}"##
    );

    Ok(())
}

#[test]
fn test_working_directory() -> Result<()> {
    // Without any paths, the current directory is analyzed.
    insta::assert_snapshot!(
        ades()
            .expects_violations(true)
            .working_dir(input_under_test("repo"))
            .run()?,
        @r##"
    Detected 2 violation(s) in ".github/workflows/ci.yml":
      1 in job "Release":
        step "#0" contains "${{ github.ref_name }}" (ADES200)
      1 in job "test":
        step "Greet" contains "${{ github.event.pull_request.title }}" (ADES100)
    Detected 1 violation(s) in "action.yml":
        step "Log" contains "${{ inputs.message }}" (ADES101)

    Use --explain for more details and fix suggestions (example: 'ades --explain ADES100')
    "##
    );

    Ok(())
}

#[test]
fn test_multiple_targets() -> Result<()> {
    insta::assert_snapshot!(
        ades()
            .expects_violations(true)
            .input(input_under_test("safe.yml"))
            .input(input_under_test("unsafe.yml"))
            .run()?,
        @r#"
    [@@TEST_PREFIX@@/safe.yml]
    Ok

    [@@TEST_PREFIX@@/unsafe.yml]
    Detected 1 violation(s) in "@@TEST_PREFIX@@/unsafe.yml":
      1 in job "Unsafe":
        step "Example" contains "${{ inputs.value }}" (ADES100)

    Use --explain for more details and fix suggestions (example: 'ades --explain ADES100')
    "#
    );

    Ok(())
}

#[test]
fn test_matrix() -> Result<()> {
    insta::assert_snapshot!(
        ades()
            .expects_violations(true)
            .input(input_under_test("matrix.yml"))
            .run()?,
        @r##"
    Detected 1 violation(s) in "@@TEST_PREFIX@@/matrix.yml":
      1 in job "unsafe":
        step "#0" contains "${{ matrix.runtime }}" (ADES100)

    Use --explain for more details and fix suggestions (example: 'ades --explain ADES100')
    "##
    );

    Ok(())
}

#[test]
fn test_suggestions() -> Result<()> {
    insta::assert_snapshot!(
        ades()
            .expects_violations(true)
            .args(["--suggestions"])
            .input(input_under_test("repo"))
            .run()?,
        @r##"
    Detected 2 violation(s) in ".github/workflows/ci.yml":
      1 in job "Release":
        step "#0" contains "${{ github.ref_name }}", suggestion:
          1. Upgrade the action to a non-vulnerable version
      1 in job "test":
        step "Greet" contains "${{ github.event.pull_request.title }}", suggestion:
          1. Set `TITLE: ${{ github.event.pull_request.title }}` in the step's `env` map
          2. Replace all occurrences of `${{ github.event.pull_request.title }}` by `$TITLE`
             (make sure to keep the behavior of the script the same)
    Detected 1 violation(s) in "action.yml":
        step "Log" contains "${{ inputs.message }}", suggestion:
          1. Set `MESSAGE: ${{ inputs.message }}` in the step's `env` map
          2. Replace all occurrences of `${{ inputs.message }}` by `process.env.MESSAGE`
             (make sure to keep the behavior of the script the same)

    Use --explain for more details and fix suggestions (example: 'ades --explain ADES100')
    "##
    );

    Ok(())
}

#[test]
fn test_conservative() -> Result<()> {
    let expected = r#"
Detected 2 violation(s) in "@@TEST_PREFIX@@/conservative.yml":
  2 in job "check":
    step "Title" contains "${{ github.event.pull_request.title }}" (ADES100)
    step "Fallback" contains "${{ github.head_ref || 'main' }}" (ADES100)

Use --explain for more details and fix suggestions (example: 'ades --explain ADES100')
"#
    .trim_start();

    let output = ades()
        .expects_violations(true)
        .args(["--conservative"])
        .input(input_under_test("conservative.yml"))
        .run()?;
    assert_eq!(output, expected);

    let output = ades()
        .expects_violations(true)
        .setenv("ADES_CONSERVATIVE", "true")
        .input(input_under_test("conservative.yml"))
        .run()?;
    assert_eq!(output, expected);

    // Without it, every expression is reported.
    let output = ades()
        .expects_violations(true)
        .args(["--json"])
        .input(input_under_test("conservative.yml"))
        .run()?;
    assert_eq!(output.matches("\"problem\":").count(), 3);

    Ok(())
}
