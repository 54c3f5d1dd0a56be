//! HTTP server for artifact preview
//!
//! `daygraph serve` → serves the generated chart on localhost. One
//! route, no request logging.

use colored::Colorize;
use std::path::{Path, PathBuf};
use tiny_http::{Header, Method, Request, Response, Server};

/// Start the preview server, blocking until killed
pub fn start(port: u16, artifact: PathBuf) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    eprintln!("\n{}", "daygraph".green().bold());
    eprintln!("   Preview: http://localhost:{}", port);
    eprintln!("   Serving: {}", artifact.display());
    eprintln!("   Press Ctrl+C to stop\n");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &artifact) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

fn handle_request(request: Request, artifact: &Path) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let method = request.method().clone();

    match (&method, path) {
        (&Method::Get, "/") => match std::fs::read_to_string(artifact) {
            Ok(html) => {
                let response = Response::from_string(html).with_header(
                    Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..]).unwrap(),
                );
                request.respond(response)
            }
            Err(_) => {
                let response = Response::from_string(missing_artifact_message(artifact))
                    .with_status_code(404);
                request.respond(response)
            }
        },
        _ => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

fn missing_artifact_message(artifact: &Path) -> String {
    format!(
        "No artifact at {}. Run `daygraph build` first.",
        artifact.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_message_names_the_path() {
        let msg = missing_artifact_message(Path::new("out/chart.html"));
        assert!(msg.contains("out/chart.html"));
        assert!(msg.contains("daygraph build"));
    }
}
