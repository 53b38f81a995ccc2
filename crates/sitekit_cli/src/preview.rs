//! Preview server for a built site
//!
//! Serves the output dir as is. Pretty urls resolve to `index.html` inside
//! the matching directory.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow, bail};
use tiny_http::{Header, Method, Request, Response, Server};

/// Output dir used when none is given on the command line.
pub const DEFAULT_OUT_DIR: &str = "_site";

const INDEX_FILE: &str = "index.html";

type Reply = Response<Cursor<Vec<u8>>>;

pub struct PreviewServer {
    server: Arc<Server>,
    root: PathBuf,
    url: String,
}

impl PreviewServer {
    /// Bind `host:port` for `root`. Port 0 picks a free port.
    pub fn bind(root: &Path, host: &str, port: u16) -> Result<Self> {
        if !root.is_dir() {
            bail!(
                "output dir {} does not exist; run `sitekit build` first",
                root.display()
            );
        }
        let server =
            Server::http((host, port)).map_err(|err| anyhow!("failed to bind {host}:{port}: {err}"))?;
        let port = server.server_addr().to_ip().map_or(port, |addr| addr.port());
        Ok(Self {
            server: Arc::new(server),
            root: root.to_path_buf(),
            url: format!("http://{host}:{port}/"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Answer requests until the server is unblocked.
    pub fn run(&self) {
        log::info!("serving {} at {}", self.root.display(), self.url);
        for request in self.server.incoming_requests() {
            respond(request, &self.root);
        }
    }

    /// Run on a background thread.
    pub fn spawn(self) -> PreviewThread {
        let server = Arc::clone(&self.server);
        let url = self.url.clone();
        let join = thread::spawn(move || self.run());
        PreviewThread { url, server, join }
    }
}

pub struct PreviewThread {
    pub url: String,
    server: Arc<Server>,
    join: JoinHandle<()>,
}

impl PreviewThread {
    pub fn stop(self) -> Result<()> {
        self.server.unblock();
        self.join
            .join()
            .map_err(|_| anyhow!("preview thread panicked"))
    }
}

fn respond(request: Request, root: &Path) {
    let reply = match request.method() {
        Method::Get | Method::Head => match resolve_request(root, request.url()) {
            Some(path) => file_reply(&path),
            None => text_reply(404, "Not Found"),
        },
        _ => text_reply(405, "Method Not Allowed"),
    };
    log::debug!("{} {}", request.method(), request.url());
    if let Err(err) = request.respond(reply) {
        log::warn!("failed to send response: {err}");
    }
}

/// File under `root` answering `url`. `None` when nothing is there or the
/// path would leave `root`.
fn resolve_request(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path).ok()?;
    let mut file = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            _ if segment.contains('\\') => return None,
            _ => file.push(segment),
        }
    }
    if file.is_dir() {
        file.push(INDEX_FILE);
    }
    file.is_file().then_some(file)
}

fn file_reply(path: &Path) -> Reply {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("{}: {err}", path.display());
            return text_reply(500, "Internal Server Error");
        }
    };
    let mut reply = Response::from_data(bytes);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], mime_type(path).as_bytes()) {
        reply.add_header(header);
    }
    reply
}

fn text_reply(status: u16, text: &str) -> Reply {
    Response::from_string(text).with_status_code(status)
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml; charset=utf-8",
        "yml" | "yaml" => "text/yaml; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("about")).unwrap();
        fs::create_dir_all(root.join("news/my post")).unwrap();
        fs::create_dir_all(root.join("static")).unwrap();
        fs::write(root.join("index.html"), "home").unwrap();
        fs::write(root.join("about/index.html"), "about").unwrap();
        fs::write(root.join("news/my post/index.html"), "post").unwrap();
        fs::write(root.join("static/site.css"), "css").unwrap();
        temp
    }

    #[test]
    fn pretty_urls_resolve_to_index_files() {
        let temp = site();
        let root = temp.path();
        assert_eq!(resolve_request(root, "/"), Some(root.join("index.html")));
        assert_eq!(resolve_request(root, "/about/"), Some(root.join("about/index.html")));
        assert_eq!(resolve_request(root, "/about"), Some(root.join("about/index.html")));
        assert_eq!(
            resolve_request(root, "/news/my%20post/?page=2"),
            Some(root.join("news/my post/index.html"))
        );
        assert_eq!(
            resolve_request(root, "/./static/site.css#x"),
            Some(root.join("static/site.css"))
        );
        assert_eq!(resolve_request(root, "/missing/"), None);
        assert_eq!(resolve_request(root, "/static/"), None);
    }

    #[test]
    fn requests_cannot_leave_the_output_dir() {
        let temp = site();
        let root = temp.path().join("about");
        assert_eq!(resolve_request(&root, "/../index.html"), None);
        assert_eq!(resolve_request(&root, "/x/%2e%2e/%2e%2e/index.html"), None);
        assert_eq!(resolve_request(&root, "/..%5cindex.html"), None);
    }

    #[test]
    fn mime_types_cover_site_assets() {
        assert_eq!(mime_type(Path::new("a/index.HTML")), "text/html; charset=utf-8");
        assert_eq!(mime_type(Path::new("admin/config.yml")), "text/yaml; charset=utf-8");
        assert_eq!(mime_type(Path::new("fonts/a.woff2")), "font/woff2");
        assert_eq!(mime_type(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn binding_a_missing_dir_fails() {
        let temp = TempDir::new().unwrap();
        let err = PreviewServer::bind(&temp.path().join(DEFAULT_OUT_DIR), "127.0.0.1", 0)
            .err()
            .expect("missing output dir");
        assert!(err.to_string().contains("does not exist"), "{err}");
    }
}
