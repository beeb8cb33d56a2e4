//! Per-request handling.
//!
//! `GET`/`HEAD` resolve to a file, `POST` goes to the command dispatcher,
//! every other method is rejected. Each call runs on its own thread and owns
//! its request, so nothing here blocks another client.

pub mod command;
pub mod response;

#[cfg(test)]
mod tests;

use crate::debug;
use crate::error::TransferError;
use crate::host::HostContext;
use crate::resolve::{ServeRoots, resolve, translate_path};
use tiny_http::{Method, Request};

/// Everything a request handler needs, shared across request threads.
pub struct ServeContext {
    pub roots: ServeRoots,
    pub host: HostContext,
}

impl ServeContext {
    pub fn new(roots: ServeRoots, host: HostContext) -> Self {
        Self { roots, host }
    }
}

/// Handle a single HTTP request.
///
/// Transfer failures end here: the client is gone, so there is nobody left
/// to report them to except the developer console.
pub fn handle_request(request: Request, ctx: &ServeContext) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let client = request
        .remote_addr()
        .map_or_else(|| "-".to_string(), ToString::to_string);

    let result = match method {
        Method::Get | Method::Head => serve_file(request, ctx),
        Method::Post => command::respond_command(request, ctx.host.backend()),
        _ => response::respond_unsupported(request),
    };

    match result {
        Ok(status) => debug!("serve"; "{} \"{} {}\" {}", client, method, url, status),
        Err(e) => debug!("serve"; "{} \"{} {}\" {}: {}", client, method, url, e, e.0),
    }
}

fn serve_file(request: Request, ctx: &ServeContext) -> Result<u16, TransferError> {
    let virtual_path = translate_path(request.url(), &ctx.roots.web_root);
    let path = resolve(&virtual_path, &ctx.roots, ctx.host.addons());
    response::respond_file(request, &path)
}
