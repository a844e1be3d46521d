use std::process::ExitCode;

fn main() -> ExitCode {
    match platescan::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
