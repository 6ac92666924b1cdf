/// Command-line surface tests.
mod cli;
/// Helpers.
mod common;
/// End-to-end tests, i.e. tests that analyze real inputs and check
/// the rendered output and exit status.
mod e2e;
