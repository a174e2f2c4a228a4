use exrec_core::error::ExrecError;
use exrec_core::session::api::ErrorResponse;
use serde::Serialize;

/// Prints a response as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Error body for any CLI failure. Store errors keep their own kind.
pub fn error_response(err: &anyhow::Error) -> ErrorResponse {
    match err.downcast_ref::<ExrecError>() {
        Some(exrec) => ErrorResponse {
            error: format!("{:#}", err),
            ..ErrorResponse::from(exrec)
        },
        None => ErrorResponse {
            success: false,
            kind: "cli_error".to_string(),
            error: format!("{:#}", err),
        },
    }
}

pub fn print_error(err: &anyhow::Error) {
    let response = error_response(err);
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(_) => eprintln!("{:#}", err),
    }
}
