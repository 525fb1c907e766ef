//! Loopback HTTP stub used by unit tests that exercise the real client.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

/// Serves fixed bodies by request path; anything unknown gets a 404.
pub struct StubServer {
    pub base_url: String,
}

impl StubServer {
    pub fn start(routes: Vec<(&str, u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: HashMap<String, (u16, String)> = routes
            .into_iter()
            .map(|(path, status, body)| (path.to_string(), (status, body)))
            .collect();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve(stream, &routes);
            }
        });

        Self {
            base_url: format!("http://{}", addr),
        }
    }
}

fn serve(mut stream: TcpStream, routes: &HashMap<String, (u16, String)>) {
    let mut request = Vec::new();
    let mut buffer = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buffer) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buffer[..n]),
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let (status, body) = routes
        .get(&path)
        .cloned()
        .unwrap_or((404, "Not Found".to_string()));
    let reason = match status {
        200 => "OK",
        203 => "Non-Authoritative Information",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Minimal PokeAPI-shaped payload.
pub fn pokemon_json(id: u32, name: &str, types: &[&str]) -> String {
    let types: Vec<serde_json::Value> = types
        .iter()
        .enumerate()
        .map(|(i, t)| serde_json::json!({"slot": i + 1, "type": {"name": t}}))
        .collect();
    serde_json::json!({"id": id, "name": name, "types": types}).to_string()
}
