#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use errorkube_core::config::{Endpoints, ServerConfig};
use tungstenite::Message;

/// Serve canned HTTP responses, one per connection, in order. The requested
/// paths are sent back on the returned channel.
pub fn serve_http(responses: Vec<(u16, String)>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind http listener");
    let base = format!("http://{}", listener.local_addr().expect("local addr"));
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let path = read_request_path(&stream);
            let _ = tx.send(path);
            write_response(stream, status, &body);
        }
    });

    (base, rx)
}

fn read_request_path(stream: &TcpStream) -> String {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    loop {
        let mut header = String::new();
        let read = reader.read_line(&mut header).expect("header line");
        if read == 0 || header == "\r\n" {
            break;
        }
    }
    request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string()
}

fn write_response(mut stream: TcpStream, status: u16, body: &str) {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).expect("write response");
    stream.flush().expect("flush response");
}

/// Accept one WebSocket client, send `messages`, then close.
pub fn serve_ws(messages: Vec<Message>) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ws listener");
    let url = format!("ws://{}/events", listener.local_addr().expect("local addr"));

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept ws client");
        let mut socket = tungstenite::accept(stream).expect("ws handshake");
        for message in messages {
            socket.send(message).expect("send ws message");
        }
        socket.close(None).expect("send close");
        // Drain until the client acknowledges the close.
        while socket.read().is_ok() {}
    });

    (url, handle)
}

/// Accept one WebSocket client and keep it open without sending anything
/// until the client goes away.
pub fn serve_quiet_ws() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ws listener");
    let url = format!("ws://{}/events", listener.local_addr().expect("local addr"));

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept ws client");
        let mut socket = tungstenite::accept(stream).expect("ws handshake");
        while socket.read().is_ok() {}
    });

    (url, handle)
}

/// A listener whose connections complete at the TCP level but never get a
/// WebSocket handshake reply. Keep the listener alive for the test's duration.
pub fn stalled_ws() -> (String, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ws listener");
    let url = format!("ws://{}/events", listener.local_addr().expect("local addr"));
    (url, listener)
}

pub fn endpoints(base: &str) -> Endpoints {
    ServerConfig::default()
        .endpoints(base)
        .expect("valid test server url")
}

pub fn encoded_record(uid: &str, namespace: &str, created: &str) -> String {
    let body = serde_json::json!({
        "metadata": {"uid": uid, "namespace": namespace, "creationTimestamp": created},
        "involvedObject": {"kind": "Pod"},
        "reason": "BackOff",
    });
    let raw = errorkube_core::RawEvent::encoded(
        Some(uid),
        &serde_json::to_vec(&body).expect("serializable"),
    );
    serde_json::to_string(&raw).expect("serializable")
}

pub fn inline_record(uid: &str, namespace: &str, created: &str) -> String {
    serde_json::json!({
        "uid": uid,
        "data": {
            "metadata": {"uid": uid, "namespace": namespace, "creationTimestamp": created},
            "involvedObject": {"kind": "Pod"},
            "reason": "Unhealthy",
        }
    })
    .to_string()
}
