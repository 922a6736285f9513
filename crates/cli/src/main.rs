use std::process::ExitCode;

fn main() -> ExitCode {
    hookline_cli::run()
}
