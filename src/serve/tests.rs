use super::*;
use crate::host::{BundleBackend, SharedAddons};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tiny_http::TestRequest;

fn context(dir: &TempDir) -> ServeContext {
    let root = dir.path();
    fs::create_dir_all(root.join("web")).unwrap();
    fs::create_dir_all(root.join("export")).unwrap();
    fs::create_dir_all(root.join("addons/demo/web")).unwrap();
    fs::write(root.join("web/index.html"), "<p>").unwrap();
    fs::write(root.join("export/reviewer.js"), "js").unwrap();
    fs::write(root.join("addons/demo/web/panel.css"), "css").unwrap();

    let addons = SharedAddons::new(root.join("addons")).with_exports([("demo", r"web/.*")]);
    let host = HostContext::new(Arc::new(BundleBackend::new(b"i18n".to_vec())))
        .with_addons(Arc::new(addons));
    ServeContext::new(ServeRoots::new(root.join("web"), root.join("export")), host)
}

fn request(method: Method, path: &str) -> Request {
    TestRequest::new().with_method(method).with_path(path).into()
}

#[test]
fn test_serve_file_from_each_root() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    assert_eq!(serve_file(request(Method::Get, "/index.html"), &ctx).unwrap(), 200);
    assert_eq!(serve_file(request(Method::Get, "/_anki/reviewer.js"), &ctx).unwrap(), 200);
    assert_eq!(
        serve_file(request(Method::Get, "/_addons/demo/web/panel.css"), &ctx).unwrap(),
        200
    );
}

#[test]
fn test_serve_file_not_found() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    assert_eq!(serve_file(request(Method::Get, "/missing.js"), &ctx).unwrap(), 404);
    assert_eq!(serve_file(request(Method::Get, "/_anki/"), &ctx).unwrap(), 404);
    assert_eq!(serve_file(request(Method::Head, "/_addons/demo/"), &ctx).unwrap(), 404);
}

#[test]
fn test_commands_through_host_backend() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let backend = ctx.host.backend();

    let post = |path: &str| request(Method::Post, path);
    assert_eq!(command::respond_command(post("/_anki/i18nResources"), backend).unwrap(), 200);
    assert_eq!(command::respond_command(post("/_anki/graphData"), backend).unwrap(), 200);
    assert_eq!(command::respond_command(post("/_anki/nope"), backend).unwrap(), 404);
    assert_eq!(command::respond_command(post("/index.html"), backend).unwrap(), 404);
}

#[test]
fn test_unsupported_method() {
    let status = response::respond_unsupported(request(Method::Delete, "/index.html")).unwrap();
    assert_eq!(status, 501);
}
