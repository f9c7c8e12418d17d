use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    varisearch_cli::run()
}
