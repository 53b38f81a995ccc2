use std::fs;
use std::time::{Duration, Instant};

use sitekit_cli::preview::PreviewServer;
use tempfile::TempDir;

fn wait_for_ready(url: &str) {
    let start = Instant::now();
    loop {
        match ureq::get(url).call() {
            Ok(_) => return,
            Err(ureq::Error::Status(_, _)) => return,
            Err(_) => {
                if start.elapsed() > Duration::from_secs(2) {
                    panic!("preview server did not start in time");
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

#[test]
fn preview_serves_pretty_urls_and_assets() {
    let temp = TempDir::new().expect("tempdir");
    let out_dir = temp.path().join("_site");
    fs::create_dir_all(out_dir.join("about")).expect("create dirs");
    fs::create_dir_all(out_dir.join("static/css")).expect("create dirs");
    fs::write(out_dir.join("index.html"), "<h1>Home</h1>").expect("write index");
    fs::write(out_dir.join("about/index.html"), "<h1>About</h1>").expect("write about");
    fs::write(out_dir.join("static/css/site.css"), "body { color: red; }").expect("write css");

    let handle = PreviewServer::bind(&out_dir, "127.0.0.1", 0)
        .expect("bind preview")
        .spawn();

    let url = handle.url.clone();
    let result = std::panic::catch_unwind(|| {
        wait_for_ready(&url);
        let response = ureq::get(&url).call().expect("get /");
        assert_eq!(response.status(), 200);
        assert_eq!(response.content_type(), "text/html");
        assert!(response.into_string().expect("read body").contains("Home"));

        let response = ureq::get(&format!("{url}about/")).call().expect("get about");
        assert!(response.into_string().expect("read body").contains("About"));

        let response = ureq::get(&format!("{url}static/css/site.css"))
            .call()
            .expect("get css");
        assert_eq!(response.content_type(), "text/css");
        assert!(response.into_string().expect("read css").contains("color: red"));

        match ureq::get(&format!("{url}missing/")).call() {
            Err(ureq::Error::Status(code, _)) => assert_eq!(code, 404),
            other => panic!("expected 404, got {other:?}"),
        }
        match ureq::get(&format!("{url}../secret")).call() {
            Err(ureq::Error::Status(code, _)) => assert_eq!(code, 404),
            Ok(response) => panic!("escaped output dir: {}", response.status()),
            Err(err) => panic!("unexpected error {err}"),
        }

        let head = ureq::head(&format!("{url}about")).call().expect("head about");
        assert_eq!(head.status(), 200);
        assert_eq!(head.content_type(), "text/html");

        match ureq::post(&url).call() {
            Err(ureq::Error::Status(code, _)) => assert_eq!(code, 405),
            other => panic!("expected 405, got {other:?}"),
        }
    });

    handle.stop().expect("stop preview");
    if let Err(err) = result {
        std::panic::resume_unwind(err);
    }
}

#[test]
fn preview_requires_existing_output_dir() {
    let temp = TempDir::new().expect("tempdir");
    let err = PreviewServer::bind(&temp.path().join("_site"), "127.0.0.1", 0)
        .err()
        .expect("missing output dir");
    assert!(err.to_string().contains("does not exist"));
}
