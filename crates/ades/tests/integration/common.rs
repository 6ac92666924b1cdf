use anyhow::Result;
use camino::Utf8PathBuf;
use std::{env::current_dir, sync::LazyLock};

use assert_cmd::{Command, cargo};

static TEST_PREFIX: LazyLock<Utf8PathBuf> = LazyLock::new(|| {
    let current_dir = current_dir().expect("Cannot figure out current directory");

    let file_path = current_dir
        .join("tests")
        .join("integration")
        .join("test-data");

    if !file_path.exists() {
        panic!("Cannot find test data directory: {}", file_path.display());
    }

    Utf8PathBuf::try_from(file_path).expect("Cannot create UTF-8 path from test data directory")
});

pub fn input_under_test(name: &str) -> String {
    let file_path = TEST_PREFIX.join(name);

    if !file_path.exists() {
        panic!("Cannot find input under test: {file_path}");
    }

    file_path.to_string()
}

pub enum OutputMode {
    Stdout,
    Stderr,
    Both,
}

pub struct Ades {
    cmd: Command,
    stdin: Option<String>,
    inputs: Vec<String>,
    no_progress: bool,
    output: OutputMode,
    expects_failure: bool,
    expects_violations: bool,
}

impl Ades {
    /// Create a new ades runner.
    pub fn new() -> Self {
        let mut cmd = Command::new(cargo::cargo_bin!());

        // Our child `ades` process starts with a clean environment, so
        // that things like `ADES_CONSERVATIVE` and `NO_COLOR` only come
        // from the test itself.
        cmd.env_clear();

        Self {
            cmd,
            stdin: None,
            inputs: vec![],
            no_progress: true,
            output: OutputMode::Stdout,
            expects_failure: false,
            expects_violations: false,
        }
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn args<'a>(mut self, args: impl IntoIterator<Item = &'a str>) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn setenv(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// Whether to pass `--no-progress`. Flags that must be used alone,
    /// like `--explain`, need this turned off.
    pub fn no_progress(mut self, flag: bool) -> Self {
        self.no_progress = flag;
        self
    }

    pub fn output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Expect exit status 1, i.e. an error.
    pub fn expects_failure(mut self, flag: bool) -> Self {
        if flag {
            self = self.output(OutputMode::Both);
        }
        self.expects_failure = flag;
        self
    }

    /// Expect exit status 2, i.e. at least one violation.
    pub fn expects_violations(mut self, flag: bool) -> Self {
        self.expects_violations = flag;
        self
    }

    pub fn working_dir(mut self, dir: impl Into<String>) -> Self {
        self.cmd.current_dir(dir.into());
        self
    }

    pub fn run(mut self) -> Result<String> {
        if let Some(stdin) = &self.stdin {
            self.cmd.write_stdin(stdin.as_bytes());
        }

        if self.no_progress {
            // NOTE: Progress bars are never useful in test runs, and
            // tracing-indicatif misbehaves when there's no terminal.
            self.cmd.arg("--no-progress");
        }

        for input in &self.inputs {
            self.cmd.arg(input);
        }

        let output = self.cmd.output()?;

        let mut raw = String::from_utf8(match self.output {
            OutputMode::Stdout => output.stdout,
            OutputMode::Stderr => output.stderr,
            OutputMode::Both => [output.stderr, output.stdout].concat(),
        })?;

        let expected = match (self.expects_failure, self.expects_violations) {
            (true, _) => 1,
            (false, true) => 2,
            (false, false) => 0,
        };

        match output.status.code() {
            Some(code) if code == expected => {}
            code => anyhow::bail!("ades exited with unexpected code {code:?}: {raw}"),
        }

        let test_prefix_placeholder = "@@TEST_PREFIX@@";
        raw = raw.replace(TEST_PREFIX.as_str(), test_prefix_placeholder);

        let version_placeholder = "@@VERSION@@";
        raw = raw.replace(env!("CARGO_PKG_VERSION"), version_placeholder);

        Ok(raw)
    }
}

pub fn ades() -> Ades {
    Ades::new()
}
