//! # Till Register Entry Point
//!
//! Setup lives in `lib.rs` so it can be tested; this only reports a failed
//! startup and sets the exit code.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match till_register::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("till-register: {}", err);
            ExitCode::FAILURE
        }
    }
}
