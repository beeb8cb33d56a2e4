//! RPC-style POST commands under `/_anki/`.
//!
//! | Command         | Body                         | Returns                    |
//! |-----------------|------------------------------|----------------------------|
//! | `graphData`     | `{"search": "", "days": 0}`  | serialized graph data      |
//! | `i18nResources` | ignored                      | serialized i18n bundle     |
//!
//! Payloads are opaque bytes produced by the backend.

use super::response::{respond_bytes, respond_not_found};
use crate::error::TransferError;
use crate::host::Backend;
use crate::log;
use serde::Deserialize;
use std::io::Read;
use tiny_http::Request;

/// URL prefix all commands live under.
pub const COMMAND_PREFIX: &str = "/_anki/";

/// A recognized command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GraphData,
    I18nResources,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "graphData" => Some(Self::GraphData),
            "i18nResources" => Some(Self::I18nResources),
            _ => None,
        }
    }

    /// Whether the request body is needed to run the command.
    const fn reads_body(self) -> bool {
        matches!(self, Self::GraphData)
    }
}

/// Body of a `graphData` request.
#[derive(Debug, Deserialize)]
pub struct GraphQuery {
    pub search: String,
    /// Unsigned like the backend's day count; negative or oversized values
    /// fail to parse and take the empty-payload path.
    pub days: u32,
}

/// Run command `name` with `body`. `None` means the command is unknown.
pub fn dispatch(name: &str, body: &[u8], backend: &dyn Backend) -> Option<Vec<u8>> {
    Command::from_name(name).map(|command| run(command, body, backend))
}

fn run(command: Command, body: &[u8], backend: &dyn Backend) -> Vec<u8> {
    match command {
        Command::GraphData => graph_data(body, backend),
        Command::I18nResources => backend.i18n_resources(),
    }
}

/// Graph failures (usually a bad search) come back as an empty payload, which
/// the graph pages render as "no data".
fn graph_data(body: &[u8], backend: &dyn Backend) -> Vec<u8> {
    let query: GraphQuery = match serde_json::from_slice(body) {
        Ok(query) => query,
        Err(e) => {
            log!("command"; "graphData: invalid request: {}", e);
            return Vec::new();
        }
    };

    match backend.graphs(&query.search, query.days) {
        Ok(data) => data,
        Err(e) => {
            log!("command"; "graphData: {}", e);
            Vec::new()
        }
    }
}

/// Handle a POST request: read the body if needed, run the command, reply.
pub fn respond_command(mut request: Request, backend: &dyn Backend) -> Result<u16, TransferError> {
    let name = request
        .url()
        .strip_prefix(COMMAND_PREFIX)
        .unwrap_or_default()
        .to_string();

    let mut body = Vec::new();
    if Command::from_name(&name).is_some_and(Command::reads_body) {
        request.as_reader().read_to_end(&mut body)?;
    }

    match dispatch(&name, &body, backend) {
        Some(data) => respond_bytes(request, data),
        None => respond_not_found(request, "Method not found"),
    }
}
