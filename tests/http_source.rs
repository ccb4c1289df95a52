use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use biosite::source::{HttpSource, MarkdownSource as _};

fn spawn_markdown_server() -> (String, mpsc::Sender<()>, thread::JoinHandle<()>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
    let base_url = format!("http://{}/content/", server.server_addr());

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            let (status, body) = match request.url() {
                "/content/bio/a.md" => (200, "# A\nText with [link](../notes/b.md).\n"),
                "/content/notes/b.md" => (200, "**B**"),
                _ => (404, "not found"),
            };
            let _ = request.respond(
                tiny_http::Response::from_string(body).with_status_code(status),
            );
        }
    });

    (base_url, shutdown_tx, handle)
}

#[tokio::test]
async fn http_source_resolves_paths_against_base() -> anyhow::Result<()> {
    let (base_url, shutdown, handle) = spawn_markdown_server();
    let source = HttpSource::new(url::Url::parse(&base_url)?)?;

    let text = source.fetch("bio/a.md").await?;
    assert!(text.starts_with("# A"));
    assert_eq!(source.fetch("notes/b.md").await?, "**B**");

    let err = source.fetch("missing.md").await.err().map(|e| format!("{e:#}"));
    assert!(err.is_some_and(|e| e.contains("404")));

    let _ = shutdown.send(());
    let _ = handle.join();
    Ok(())
}

#[test]
fn build_reads_markdown_from_base_url() -> anyhow::Result<()> {
    let (base_url, shutdown, handle) = spawn_markdown_server();
    let temp = tempfile::TempDir::new()?;
    let data = temp.path().join("content");
    let out = temp.path().join("site");
    std::fs::create_dir_all(data.join("data"))?;
    std::fs::write(
        data.join("data").join("biography.json"),
        r#"{"people":[{"id":"a","full_name":"A","biography_text":"bio/a.md"}]}"#,
    )?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("biosite");
    cmd.args(["build", "--markdown-base", &base_url, "--data"])
        .arg(&data)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let _ = shutdown.send(());
    let _ = handle.join();

    let person = std::fs::read_to_string(out.join("person").join("a.html"))?;
    assert!(person.contains("<h1>A</h1>"));
    assert!(person.contains("data-md=\"../notes/b.md\""));
    Ok(())
}
