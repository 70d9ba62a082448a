use std::process::ExitCode;

fn main() -> ExitCode {
    pricerule_cli::run()
}
