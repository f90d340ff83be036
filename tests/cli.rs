// End-to-end command tests: argv in, rendered text out, against a mock
// gist API.

use gist::cli;
use gist::model::encode_content;
use gist::Config;
use serde_json::{json, Value};
use std::path::PathBuf;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config {
        token: "f00".into(),
        api_url: server.uri(),
        editor: None,
    }
}

/// Run `cmd` (whitespace-separated) on the blocking pool and return
/// stdout split into lines.
async fn gist_command(config: Config, cmd: &str) -> anyhow::Result<Vec<String>> {
    let args: Vec<String> = cmd.split_whitespace().map(str::to_string).collect();
    tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<String>> {
        let mut out = Vec::new();
        cli::run(args, &config, &mut out)?;
        Ok(String::from_utf8(out)?.lines().map(str::to_string).collect())
    })
    .await
    .expect("command panicked")
}

fn two_file_gist() -> Value {
    json!({
        "id": 1,
        "description": "test-gist",
        "public": true,
        "html_url": "https://gist.github.com/1",
        "files": {
            "file-A.txt": {"filename": "file-A.txt", "content": encode_content("test-content-A")},
            "file-B.txt": {"filename": "file-B.txt", "content": encode_content("test-content-\u{212C}"), "language": "Text"}
        }
    })
}

async fn serve_gist(server: &MockServer, id: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/gists/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn list_prints_one_line_per_gist() {
    let server = MockServer::start().await;
    let mut message = Vec::new();
    let mut expected = Vec::new();
    for id in 0..300 {
        let public = id % 2 == 0;
        message.push(json!({"id": id, "description": format!("test-{}", id), "public": public}));
        expected.push(format!("{} {} test-{}", id, if public { "+" } else { "-" }, id));
    }
    Mock::given(method("GET"))
        .and(path("/gists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(message)))
        .mount(&server)
        .await;

    let lines = gist_command(config_for(&server), "list").await.unwrap();
    assert_eq!(lines, expected);
}

#[tokio::test]
async fn content_prints_headers_and_decoded_bodies() {
    let server = MockServer::start().await;
    serve_gist(&server, "1", two_file_gist()).await;

    let lines = gist_command(config_for(&server), "content 1").await.unwrap();

    assert_eq!(
        lines,
        [
            "file-A.txt:",
            "test-content-A",
            "",
            "file-B.txt:",
            "test-content-\u{212c}",
        ]
    );
}

#[tokio::test]
async fn content_can_select_one_file() {
    let server = MockServer::start().await;
    serve_gist(&server, "1", two_file_gist()).await;

    let lines = gist_command(config_for(&server), "content 1 file-B.txt").await.unwrap();
    assert_eq!(lines, ["file-B.txt:", "test-content-\u{212c}"]);

    let err = gist_command(config_for(&server), "content 1 missing.txt")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no file named 'missing.txt'"));
}

#[tokio::test]
async fn files_and_info() {
    let server = MockServer::start().await;
    serve_gist(&server, "1", two_file_gist()).await;

    let files = gist_command(config_for(&server), "files 1").await.unwrap();
    assert_eq!(files, ["file-A.txt", "file-B.txt"]);

    let info = gist_command(config_for(&server), "info 1").await.unwrap();
    assert_eq!(
        info,
        [
            "id: 1",
            "description: test-gist",
            "public: true",
            "url: https://gist.github.com/1",
            "files:",
            "  file-A.txt",
            "  file-B.txt (Text)",
        ]
    );
}

#[tokio::test]
async fn rejected_token_error_points_at_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gists"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(&server)
        .await;

    let err = gist_command(config_for(&server), "list").await.unwrap_err();
    let chain = format!("{:#}", err);
    assert!(chain.contains("token was rejected"), "{}", chain);
    assert!(chain.contains("Bad credentials"), "{}", chain);
}

#[tokio::test]
async fn create_uploads_files_from_disk() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.rs");
    std::fs::write(&a, "alpha\n").unwrap();
    std::fs::write(&b, "fn main() {}\n").unwrap();

    Mock::given(method("POST"))
        .and(path("/gists"))
        .and(body_json(json!({
            "description": "notes",
            "public": false,
            "files": {
                "a.txt": {"content": encode_content("alpha\n")},
                "b.rs": {"content": encode_content("fn main() {}\n")}
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "n3w", "html_url": "https://gist.github.com/n3w"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cmd = format!("create notes {} {}", a.display(), b.display());
    let lines = gist_command(config_for(&server), &cmd).await.unwrap();
    assert_eq!(lines, ["https://gist.github.com/n3w"]);
}

#[tokio::test]
async fn create_rejects_duplicate_basenames() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("x")).unwrap();
    let first = dir.path().join("same.txt");
    let second = dir.path().join("x").join("same.txt");
    std::fs::write(&first, "1").unwrap();
    std::fs::write(&second, "2").unwrap();

    let cmd = format!("create dup {} {}", first.display(), second.display());
    let err = gist_command(config_for(&server), &cmd).await.unwrap_err();
    assert!(err.to_string().contains("more than one file is named 'same.txt'"));
}

#[cfg(unix)]
#[tokio::test]
async fn edit_uploads_only_changed_files() {
    use std::os::unix::fs::PermissionsExt;

    let server = MockServer::start().await;
    serve_gist(
        &server,
        "7",
        json!({
            "id": "7",
            "files": {
                "notes.md": {"content": encode_content("old\n")},
                "keep.txt": {"content": encode_content("same\n")}
            }
        }),
    )
    .await;
    Mock::given(method("PATCH"))
        .and(path("/gists/7"))
        .and(body_json(json!({
            "files": {"notes.md": {"content": encode_content("old\nappended\n")}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "7"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let script: PathBuf = dir.path().join("append-editor");
    std::fs::write(
        &script,
        "#!/bin/sh\nfor f in \"$@\"; do\n  case \"$f\" in *notes.md) echo appended >> \"$f\";; esac\ndone\n",
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let mut config = config_for(&server);
    config.editor = Some(script.display().to_string());
    let lines = gist_command(config, "edit 7").await.unwrap();
    assert_eq!(lines, ["updated 7 (1 file(s) changed)"]);
}

#[cfg(unix)]
#[tokio::test]
async fn edit_without_changes_sends_nothing() {
    let server = MockServer::start().await;
    serve_gist(
        &server,
        "7",
        json!({"id": "7", "files": {"a.txt": {"content": encode_content("x")}}}),
    )
    .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.editor = Some("true".into());
    let lines = gist_command(config, "edit 7").await.unwrap();
    assert_eq!(lines, ["no changes"]);
}

#[tokio::test]
async fn description_patches_only_the_description() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/gists/abc"))
        .and(body_json(json!({"description": "renamed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let lines = gist_command(config_for(&server), "description abc renamed").await.unwrap();
    assert_eq!(lines, ["updated abc"]);
}

#[tokio::test]
async fn delete_with_yes_skips_prompt() {
    let server = MockServer::start().await;
    for id in ["a1", "b2"] {
        Mock::given(method("DELETE"))
            .and(path(format!("/gists/{}", id)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    let lines = gist_command(config_for(&server), "delete --yes a1 b2").await.unwrap();
    assert_eq!(lines, ["deleted a1", "deleted b2"]);
}

#[tokio::test]
async fn fork_prints_new_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gists/abc/forks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "f0rk"})))
        .mount(&server)
        .await;

    let lines = gist_command(config_for(&server), "fork abc").await.unwrap();
    assert_eq!(lines, ["f0rk"]);
}

#[tokio::test]
async fn archive_writes_tarball() {
    let server = MockServer::start().await;
    serve_gist(&server, "1", two_file_gist()).await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.tar.gz");

    let cmd = format!("archive 1 -o {}", target.display());
    let lines = gist_command(config_for(&server), &cmd).await.unwrap();
    assert_eq!(lines, [target.display().to_string()]);

    let file = std::fs::File::open(&target).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    let names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["1/file-A.txt", "1/file-B.txt"]);
}

#[tokio::test]
async fn failed_archive_leaves_no_file_behind() {
    let server = MockServer::start().await;
    serve_gist(
        &server,
        "9",
        json!({
            "id": "9",
            "files": {
                "ok.txt": {"content": encode_content("fine\n")},
                "../escape.txt": {"content": encode_content("nope\n")}
            }
        }),
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.tar.gz");

    let cmd = format!("archive 9 -o {}", target.display());
    let err = gist_command(config_for(&server), &cmd).await.unwrap_err();

    assert!(format!("{:#}", err).contains(".."), "{:#}", err);
    assert!(!target.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
