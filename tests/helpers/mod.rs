use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

use reelpress::config::{Config, MediaConfig, StorageConfig};
use reelpress::storage::Storage;
use reelpress::web::{router, AppState};
use reelpress::workflow::Workflow;

const BOUNDARY: &str = "reelpress-test-boundary";

/// Reports a video stream when the probed file contains `VIDEO`.
const FAKE_FFPROBE: &str = r#"#!/bin/sh
for last; do :; done
if grep -q VIDEO "$last"; then echo video; fi
exit 0
"#;

/// Records its argv, then copies the input to the output.
/// Inputs containing FAIL exit non-zero, inputs containing SLOW hang.
const FAKE_FFMPEG: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "$(dirname "$0")/ffmpeg-args.txt"
prev=""
for arg; do
  if [ "$prev" = "-i" ]; then input="$arg"; fi
  prev="$arg"
  last="$arg"
done
if grep -q FAIL "$input"; then echo "boom: invalid data found" >&2; exit 1; fi
if grep -q SLOW "$input"; then exec sleep 30; fi
cat "$input" > "$last"
"#;

pub struct TestApp {
    pub dir: TempDir,
    pub router: Router,
    pub config: Config,
}

impl TestApp {
    pub fn upload_dir(&self) -> &Path {
        &self.config.storage.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.storage.output_dir
    }

    /// Arguments passed to the last ffmpeg run, one per line.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("bin/ffmpeg-args.txt"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Response<Body> {
        let request = Request::post("/process")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, file)))
            .unwrap();
        self.send(request).await
    }
}

fn write_script(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

pub async fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let dir = TempDir::new().unwrap();
    let bin: PathBuf = dir.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    write_script(&bin.join("ffprobe"), FAKE_FFPROBE);
    write_script(&bin.join("ffmpeg"), FAKE_FFMPEG);

    let mut config = Config {
        storage: StorageConfig {
            upload_dir: dir.path().join("uploads"),
            output_dir: dir.path().join("outputs"),
            ..Default::default()
        },
        media: MediaConfig {
            ffmpeg_path: bin.join("ffmpeg").display().to_string(),
            ffprobe_path: bin.join("ffprobe").display().to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    config.server.secret = "test-secret".to_string();
    customize(&mut config);

    Storage::new(&config.storage).ensure_dirs().await.unwrap();

    let workflow = Workflow::new(&config);
    let router = router(&config, AppState::new(&config, workflow));

    TestApp { dir, router, config }
}

pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"input_file\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION].to_str().unwrap().to_string()
}

/// `name=value` part of the response's Set-Cookie header.
pub fn cookie_pair(response: &Response<Body>) -> String {
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
