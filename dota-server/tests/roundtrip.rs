//! End-to-end check of the length-prefixed JSON framing over a real socket:
//! binds a listener, drives one request through it, and reads the response
//! back the way a client would.

use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dota_graph::dispatch::{CreateOp, Operator, Success};
use dota_graph::pattern::{Entity, VertexSpec};
use dota_graph::{Request, Response, Storage};
use dota_server::net;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
async fn create_request_round_trips_over_the_wire() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let file = File::options()
        .read(true)
        .write(true)
        .open(tmp.path())
        .unwrap();
    let storage = Storage::init(file).unwrap();

    let listener = net::bind(0).unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(AtomicBool::new(false));

    let server = tokio::spawn(net::serve(listener, storage, shutdown.clone()));

    let mut stream = TcpStream::connect(addr).await.unwrap();

    let request = Request {
        match_entities: Vec::new(),
        where_clause: None,
        operator: Operator::Create(CreateOp {
            entities: vec![Entity::Vertex(VertexSpec {
                name: Some("a".into()),
                labels: vec!["Person".into()],
                attrs: vec![],
            })],
        }),
    };
    let payload = serde_json::to_vec(&request).unwrap();
    stream.write_u32(payload.len() as u32).await.unwrap();
    stream.write_all(&payload).await.unwrap();

    let len = stream.read_u32().await.unwrap();
    let mut buf = vec![0u8; len as usize];
    stream.read_exact(&mut buf).await.unwrap();
    let response: Response = serde_json::from_slice(&buf).unwrap();

    assert_eq!(response, Response::Success(Success::Amount(1)));

    shutdown.store(true, Ordering::SeqCst);
    drop(stream);
    server.abort();
}
