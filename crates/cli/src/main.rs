use std::process::ExitCode;

fn main() -> ExitCode {
    quoter_cli::run()
}
