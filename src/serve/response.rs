//! HTTP response handlers.

use crate::error::TransferError;
use crate::utils::date::DateTimeUtc;
use crate::utils::mime::{self, types};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tiny_http::{Header, Request, Response, StatusCode};

/// The embedded view loads pages from a custom scheme, so every successful
/// response must be readable cross-origin.
const ALLOW_ORIGIN: (&str, &str) = ("Access-Control-Allow-Origin", "*");

/// A file opened for serving, with its metadata taken from the open handle.
struct OpenFile {
    file: File,
    len: usize,
    last_modified: Option<String>,
}

/// Respond with a static file, or 404 if it can't be served.
///
/// HEAD requests get the same headers; tiny_http drops the body.
pub fn respond_file(request: Request, path: &Path) -> Result<u16, TransferError> {
    let Some(OpenFile {
        file,
        len,
        last_modified,
    }) = open_file(path)
    else {
        return respond_not_found(request, "File not found");
    };

    let mut headers = vec![("Content-Type", mime::from_path(path)), ALLOW_ORIGIN];
    if let Some(date) = last_modified.as_deref() {
        headers.push(("Last-Modified", date));
    }

    let response = Response::new(StatusCode(200), make_headers(&headers), file, Some(len), None)
        .with_chunked_threshold(usize::MAX);
    request.respond(response)?;
    Ok(200)
}

/// Open `path` for reading. Directories, paths that can't be stat'ed (too
/// long, missing, bad permissions) and unreadable files all yield `None`.
fn open_file(path: &Path) -> Option<OpenFile> {
    if fs::metadata(path).ok()?.is_dir() {
        return None;
    }

    let file = File::open(path).ok()?;
    let metadata = file.metadata().ok()?;
    if metadata.is_dir() {
        return None;
    }

    Some(OpenFile {
        len: usize::try_from(metadata.len()).ok()?,
        last_modified: metadata
            .modified()
            .ok()
            .map(|time| DateTimeUtc::from_system_time(time).to_http_date()),
        file,
    })
}

/// Respond with an opaque command payload.
pub fn respond_bytes(request: Request, data: Vec<u8>) -> Result<u16, TransferError> {
    let response = with_headers(
        Response::from_data(data),
        &[("Content-Type", types::BINARY), ALLOW_ORIGIN],
    )
    .with_chunked_threshold(usize::MAX);
    request.respond(response)?;
    Ok(200)
}

/// Respond with 404 and a short plain-text reason.
pub fn respond_not_found(request: Request, reason: &str) -> Result<u16, TransferError> {
    send_error(request, 404, reason)
}

/// Respond with 501 for methods other than GET, HEAD and POST.
pub fn respond_unsupported(request: Request) -> Result<u16, TransferError> {
    let reason = format!("Unsupported method ({})", request.method());
    send_error(request, 501, &reason)
}

fn send_error(request: Request, status: u16, reason: &str) -> Result<u16, TransferError> {
    let body = format!("{status} {reason}");
    let response = with_headers(
        Response::from_string(body).with_status_code(StatusCode(status)),
        &[("Content-Type", types::PLAIN)],
    );
    request.respond(response)?;
    Ok(status)
}

fn with_headers<R: Read>(mut response: Response<R>, headers: &[(&str, &str)]) -> Response<R> {
    for header in make_headers(headers) {
        response.add_header(header);
    }
    response
}

fn make_headers(headers: &[(&str, &str)]) -> Vec<Header> {
    headers
        .iter()
        .filter_map(|(key, value)| Header::from_bytes(*key, *value).ok())
        .collect()
}
