#![warn(clippy::all)]

use std::{
    ffi::OsString,
    io::{Write, stdout},
    process::ExitCode,
};

use anstream::{println, stream::IsTerminal};
use anyhow::{Result, anyhow};
use camino::Utf8PathBuf;
use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::Generator;
use clap_verbosity_flag::WarnLevel;
use expr::{AllMatcher, ConservativeMatcher, ExprMatcher};
use indicatif::ProgressStyle;
use itertools::Itertools as _;
use owo_colors::OwoColorize;
use registry::{Report, input::collect_target};
use tracing::{Span, info_span};
use tracing_indicatif::{IndicatifLayer, span_ext::IndicatifSpanExt};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};
use utils::tips;

mod analyze;
mod expr;
mod models;
mod output;
mod registry;
mod rules;
mod utils;

#[cfg(not(any(target_family = "windows", target_os = "openbsd")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const LEGAL: &str = "\
ades  Copyright (C) 2024  Eric Cornelissen
This program comes with ABSOLUTELY NO WARRANTY; see the GPL v3.0 for details.
This is free software, and you are welcome to redistribute it under certain
conditions; see the GPL v3.0 for details.";

/// Finds dangerous uses of expressions in GitHub Actions workflows and manifests.
#[derive(Parser)]
#[command(about, version)]
struct App {
    /// Only report expressions known to be controllable by attackers.
    #[arg(long, env = "ADES_CONSERVATIVE")]
    conservative: bool,

    /// Explain the given rule, e.g. ADES100.
    #[arg(long, value_name = "RULE", exclusive = true)]
    explain: Option<String>,

    /// Output results as JSON.
    #[arg(long)]
    json: bool,

    /// Show how to address each violation, instead of its rule.
    #[arg(long)]
    suggestions: bool,

    /// Show legal information and exit.
    #[arg(long, exclusive = true)]
    legal: bool,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity<WarnLevel>,

    /// Don't show progress bars, even if the terminal supports them.
    #[arg(long)]
    no_progress: bool,

    /// Control the use of color in output.
    #[arg(long, value_enum, value_name = "MODE")]
    color: Option<ColorMode>,

    /// Generate tab completion scripts for the specified shell.
    #[arg(long, value_enum, value_name = "SHELL", exclusive = true)]
    completions: Option<Shell>,

    /// The inputs to analyze.
    ///
    /// These can be individual workflow files, action manifests
    /// (`action.yml`), or entire repositories. `-` reads a workflow or
    /// manifest from standard input. Defaults to the current directory.
    paths: Vec<String>,
}

/// Shell with auto-generated completion script available.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, ValueEnum)]
#[allow(clippy::enum_variant_names)]
enum Shell {
    /// Bourne Again `SHell` (bash)
    Bash,
    /// Elvish shell
    Elvish,
    /// Friendly Interactive `SHell` (fish)
    Fish,
    /// Nushell
    Nushell,
    /// `PowerShell`
    Powershell,
    /// Z `SHell` (zsh)
    Zsh,
}

impl Generator for Shell {
    fn file_name(&self, name: &str) -> String {
        match self {
            Shell::Bash => clap_complete::shells::Bash.file_name(name),
            Shell::Elvish => clap_complete::shells::Elvish.file_name(name),
            Shell::Fish => clap_complete::shells::Fish.file_name(name),
            Shell::Nushell => clap_complete_nushell::Nushell.file_name(name),
            Shell::Powershell => clap_complete::shells::PowerShell.file_name(name),
            Shell::Zsh => clap_complete::shells::Zsh.file_name(name),
        }
    }

    fn generate(&self, cmd: &clap::Command, buf: &mut dyn std::io::Write) {
        match self {
            Shell::Bash => clap_complete::shells::Bash.generate(cmd, buf),
            Shell::Elvish => clap_complete::shells::Elvish.generate(cmd, buf),
            Shell::Fish => clap_complete::shells::Fish.generate(cmd, buf),
            Shell::Nushell => clap_complete_nushell::Nushell.generate(cmd, buf),
            Shell::Powershell => clap_complete::shells::PowerShell.generate(cmd, buf),
            Shell::Zsh => clap_complete::shells::Zsh.generate(cmd, buf),
        }
    }
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub(crate) enum ColorMode {
    /// Use color output if the output supports it.
    Auto,
    /// Force color output, even if the output isn't a terminal.
    Always,
    /// Disable color output, even if the output is a compatible terminal.
    Never,
}

impl ColorMode {
    /// Returns a concrete (i.e. non-auto) `anstream::ColorChoice` for the given terminal.
    ///
    /// This is useful for passing to `anstream::AutoStream` when the underlying
    /// stream is something that is a terminal or should be treated as such,
    /// but can't be inferred due to type erasure (e.g. `Box<dyn Write>`).
    fn color_choice_for_terminal(&self, io: impl IsTerminal) -> anstream::ColorChoice {
        match self {
            ColorMode::Auto => {
                if io.is_terminal() {
                    anstream::ColorChoice::Always
                } else {
                    anstream::ColorChoice::Never
                }
            }
            ColorMode::Always => anstream::ColorChoice::Always,
            ColorMode::Never => anstream::ColorChoice::Never,
        }
    }
}

impl From<ColorMode> for anstream::ColorChoice {
    /// Maps `ColorMode` to `anstream::ColorChoice`.
    fn from(value: ColorMode) -> Self {
        match value {
            ColorMode::Auto => Self::Auto,
            ColorMode::Always => Self::Always,
            ColorMode::Never => Self::Never,
        }
    }
}

/// Rewrites single-dash long flags (`-json`, `-explain ADES100`) into
/// their double-dash form, leaving short flags like `-v` alone.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let cmd = App::command();
    let longs = cmd
        .get_arguments()
        .filter_map(|arg| arg.get_long())
        .chain(["help", "version"])
        .collect::<Vec<_>>();

    let mut args = args.into_iter();
    let mut normalized = args.next().into_iter().collect::<Vec<_>>();

    for arg in args.by_ref() {
        if arg == "--" {
            normalized.push(arg);
            break;
        }

        let long = arg
            .to_str()
            .and_then(|arg| arg.strip_prefix('-'))
            .filter(|rest| !rest.starts_with('-'))
            .filter(|rest| {
                let name = rest.split_once('=').map_or(*rest, |(name, _)| name);
                longs.contains(&name)
            })
            .map(|rest| OsString::from(format!("--{rest}")));

        normalized.push(long.unwrap_or(arg));
    }

    normalized.extend(args);
    normalized
}

fn completions<G: clap_complete::Generator>(generator: G, cmd: &mut clap::Command) {
    clap_complete::generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut std::io::stdout(),
    );
}

fn run() -> Result<ExitCode> {
    human_panic::setup_panic!();

    let mut app = match App::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(app) => app,
        Err(e) => {
            e.print()?;
            // NOTE: clap uses 2 for usage errors, which we reserve for
            // violations.
            return Ok(if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    if app.legal {
        println!("{LEGAL}");
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(shell) = app.completions {
        let mut cmd = App::command();
        completions(shell, &mut cmd);
        return Ok(ExitCode::SUCCESS);
    }

    let color_mode = match app.color {
        Some(color_mode) => color_mode,
        None => {
            // If `--color` wasn't specified, we first check a handful
            // of common environment variables, and then fall
            // back to `anstream`'s auto detection.
            if std::env::var("NO_COLOR").is_ok() {
                ColorMode::Never
            } else if std::env::var("FORCE_COLOR").is_ok()
                || std::env::var("CLICOLOR_FORCE").is_ok()
            {
                ColorMode::Always
            } else {
                ColorMode::Auto
            }
        }
    };

    anstream::ColorChoice::write_global(color_mode.into());

    // Progress bars need line control, which `anstream` strips along
    // with colors.
    if matches!(color_mode, ColorMode::Never) {
        app.no_progress = true;
    }

    let indicatif_layer = IndicatifLayer::new();

    let writer = std::sync::Mutex::new(anstream::AutoStream::new(
        Box::new(indicatif_layer.get_stderr_writer()) as Box<dyn Write + Send>,
        color_mode.color_choice_for_terminal(std::io::stderr()),
    ));

    let filter = EnvFilter::builder()
        .with_default_directive(app.verbose.tracing_level_filter().into())
        .from_env()?;

    let reg = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                // NOTE: We don't need `with_ansi` here since our writer is
                // an `anstream::AutoStream` that handles color output for us.
                .with_writer(writer),
        )
        .with(filter);

    if app.no_progress {
        reg.init();
    } else {
        reg.with(indicatif_layer).init();
    }

    if let Some(id) = &app.explain {
        let explanation = rules::explain(id).map_err(|e| {
            anyhow!(tips(
                e.to_string(),
                &[format!(
                    "known rules are {rules}",
                    rules = rules::rules().iter().map(|rule| rule.id).join(", ")
                )]
            ))
        })?;

        println!("{explanation}");
        return Ok(ExitCode::SUCCESS);
    }

    let matcher: &dyn ExprMatcher = if app.conservative {
        &ConservativeMatcher
    } else {
        &AllMatcher
    };

    let targets = if app.paths.is_empty() {
        let cwd = Utf8PathBuf::try_from(std::env::current_dir()?)?;
        vec![cwd.into_string()]
    } else {
        app.paths.clone()
    };

    let mut report = Report::new();
    let mut inputs = vec![];
    for target in &targets {
        match collect_target(target) {
            Ok(collected) => {
                tracing::debug!("collected {n} inputs from {target}", n = collected.len());
                report.add_target(target);
                inputs.extend(collected);
            }
            Err(e) => {
                tracing::error!("{e}");
                report.record_error();
            }
        }
    }

    {
        // Note: block here so that we drop the span here at the right time.
        let span = info_span!("analyze");
        span.pb_set_length(inputs.len() as u64);
        span.pb_set_style(
            &ProgressStyle::with_template("[{elapsed_precise}] {bar:!30.cyan/blue} {msg}")?,
        );

        let _guard = span.enter();

        for input in &inputs {
            Span::current().pb_set_message(&input.key.file);
            match input.analyze(matcher) {
                Ok(violations) => {
                    tracing::info!(
                        "{completed} {file} ({n} violations)",
                        completed = "completed".green(),
                        file = input.key.file,
                        n = violations.len()
                    );
                    report.record(&input.key, violations);
                }
                Err(e) => {
                    tracing::error!("{e}");
                    report.record_error();
                }
            }
            Span::current().pb_inc(1);
        }
    }

    if app.json {
        output::json::output(stdout(), &report)?;
    } else {
        output::plain::output(anstream::stdout(), &report, app.suggestions)?;

        if report.violation_count() > 0 {
            println!();
            println!(
                "Use {explain} for more details and fix suggestions (example: '{example}')",
                explain = "--explain".bold(),
                example = "ades --explain ADES100"
            );
        }
    }

    Ok(report.exit_code())
}

fn main() -> ExitCode {
    // This is a little silly, but returning an ExitCode like this ensures
    // we always exit cleanly, rather than performing a hard process exit.
    match run() {
        Ok(exit) => exit,
        Err(err) => {
            anstream::eprintln!("{fatal}: {err:?}", fatal = "fatal".red().bold());
            ExitCode::FAILURE
        }
    }
}
