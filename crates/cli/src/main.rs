use std::process::ExitCode;

fn main() -> ExitCode {
    trivia_cli::run()
}
