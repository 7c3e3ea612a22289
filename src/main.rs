use std::process::ExitCode;

fn main() -> ExitCode {
    dotnet_binder::run_cli()
}
