//! Local HTTP preview server
//!
//! Serves the rendered document at `/` and local asset files from beneath
//! the serving root (the process working directory). The responder runs on
//! its own thread with a short `recv_timeout` poll so `stop()` can tear it
//! down promptly; requests resolving outside the root are refused with 403.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::SceneError;

/// A running scene server
///
/// Owned by the scene that started it. Stopping is idempotent and also
/// happens on drop.
#[derive(Debug)]
pub(crate) struct SceneServer {
    address: SocketAddr,
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SceneServer {
    /// Bind `host:port` and start serving `document` at `/` plus files
    /// beneath `root_dir`. Port 0 binds an ephemeral port; the actual
    /// address is available via [`SceneServer::address`].
    pub fn start(
        document: String,
        root_dir: PathBuf,
        host: &str,
        port: u16,
    ) -> Result<Self, SceneError> {
        let server = tiny_http::Server::http((host, port))
            .map_err(|e| SceneError::ServerStart(e.to_string()))?;
        let address = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| SceneError::ServerStart("server has no TCP address".to_string()))?;

        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_flag = stop_flag.clone();

        let handle = std::thread::spawn(move || {
            while !thread_flag.load(Ordering::Relaxed) {
                // Poll with a short timeout so the stop flag is noticed
                match server.recv_timeout(Duration::from_millis(100)) {
                    Ok(Some(request)) => handle_request(request, &document, &root_dir),
                    Ok(None) => {}
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            address,
            stop_flag,
            handle: Some(handle),
        })
    }

    /// The bound address
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Stop the responder and free the bound address. Safe to call twice.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SceneServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Outcome of resolving a request path against the serving root
enum Resolution {
    File(PathBuf),
    Forbidden,
    NotFound,
}

fn handle_request(request: tiny_http::Request, document: &str, root_dir: &Path) {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("");

    if path == "/" || path == "/index.html" {
        let response = tiny_http::Response::from_string(document).with_header(
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
                .unwrap(),
        );
        let _ = request.respond(response);
        return;
    }

    let decoded = match urlencoding::decode(path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            respond_plain(request, 404, "Not Found");
            return;
        }
    };
    let relative = decoded.trim_start_matches('/');

    match resolve_local(root_dir, relative) {
        Resolution::File(full_path) => match std::fs::read(&full_path) {
            Ok(data) => {
                let response = tiny_http::Response::from_data(data).with_header(
                    tiny_http::Header::from_bytes(
                        &b"Content-Type"[..],
                        content_type(&full_path).as_bytes(),
                    )
                    .unwrap(),
                );
                let _ = request.respond(response);
            }
            Err(_) => respond_plain(request, 404, "Not Found"),
        },
        Resolution::Forbidden => respond_plain(request, 403, "Forbidden"),
        Resolution::NotFound => respond_plain(request, 404, "Not Found"),
    }
}

fn respond_plain(request: tiny_http::Request, status: u16, body: &str) {
    let response = tiny_http::Response::from_string(body).with_status_code(status);
    let _ = request.respond(response);
}

/// Resolve a decoded request path to a file at or below the serving root.
///
/// Canonicalization settles symlinks and `..` segments before the boundary
/// check, so escapes are refused regardless of how they are spelled.
fn resolve_local(root: &Path, relative: &str) -> Resolution {
    if relative.is_empty() {
        return Resolution::NotFound;
    }

    let root_canonical = match root.canonicalize() {
        Ok(p) => p,
        Err(_) => return Resolution::NotFound,
    };

    match root.join(relative).canonicalize() {
        Ok(full) if full.starts_with(&root_canonical) => {
            if full.is_file() {
                Resolution::File(full)
            } else {
                Resolution::NotFound
            }
        }
        Ok(_) => Resolution::Forbidden,
        // The target does not exist; still refuse paths that try to climb out
        Err(_) => {
            if relative.split('/').any(|segment| segment == "..") {
                Resolution::Forbidden
            } else {
                Resolution::NotFound
            }
        }
    }
}

/// Content-Type by file extension; unknown extensions are served as bytes
fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("gltf") => "model/gltf+json",
        Some("glb") => "model/gltf-binary",
        Some("obj") | Some("mtl") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn start_server(root: &Path) -> SceneServer {
        SceneServer::start(
            "<html><body>scene document</body></html>".to_string(),
            root.to_path_buf(),
            "127.0.0.1",
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_root_serves_document() {
        let dir = TempDir::new().unwrap();
        let mut server = start_server(dir.path());

        let body = ureq::get(&format!("http://{}/", server.address()))
            .call()
            .unwrap()
            .into_string()
            .unwrap();
        assert!(body.contains("scene document"));

        server.stop();
    }

    #[test]
    fn test_local_file_served_with_content_type() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("models")).unwrap();
        std::fs::write(dir.path().join("models/cube.json"), "{\"cube\":true}").unwrap();
        let mut server = start_server(dir.path());

        let response = ureq::get(&format!("http://{}/models/cube.json", server.address()))
            .call()
            .unwrap();
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.into_string().unwrap(), "{\"cube\":true}");

        server.stop();
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut server = start_server(dir.path());

        let err = ureq::get(&format!("http://{}/missing.json", server.address()))
            .call()
            .unwrap_err();
        match err {
            ureq::Error::Status(code, _) => assert_eq!(code, 404),
            other => panic!("unexpected error: {:?}", other),
        }

        server.stop();
    }

    #[test]
    fn test_escape_outside_root_is_forbidden() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("web");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "top secret").unwrap();
        let mut server = start_server(&root);

        // Percent-encoded so the client does not normalize the dot segments away
        let err = ureq::get(&format!(
            "http://{}/%2e%2e/secret.txt",
            server.address()
        ))
        .call()
        .unwrap_err();
        match err {
            ureq::Error::Status(code, _) => assert_eq!(code, 403),
            other => panic!("unexpected error: {:?}", other),
        }

        server.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut server = start_server(dir.path());
        server.stop();
        server.stop();
    }

    #[test]
    fn test_resolve_local_refuses_missing_climb() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            resolve_local(dir.path(), "../nope.txt"),
            Resolution::Forbidden
        ));
        assert!(matches!(
            resolve_local(dir.path(), "nope.txt"),
            Resolution::NotFound
        ));
    }
}
