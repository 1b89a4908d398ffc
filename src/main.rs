use std::process::ExitCode;

fn main() -> ExitCode {
    git_lint::cli::run()
}
