// responses/xlsx.rs
use crate::errors::ServerError;
use crate::responses::ResultResp;
use astra::{Body, ResponseBuilder};
use std::io::ErrorKind;
use std::path::Path;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Serves a workbook from disk as an attachment named after the file.
pub fn xlsx_response(path: &Path) -> ResultResp {
    let buffer = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ServerError::NotFound,
        _ => ServerError::XlsxError(format!("Failed to read {}: {e}", path.display())),
    })?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("listings.xlsx");

    ResponseBuilder::new()
        .status(200)
        .header("Content-Type", XLSX_CONTENT_TYPE)
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(buffer))
        .map_err(|_| ServerError::InternalError)
}
