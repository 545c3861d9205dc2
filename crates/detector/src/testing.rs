//! Builders for provider catalog fixtures.

use radar_core::types::ExternalId;

use crate::source::{ApiDatacenter, ApiDatacenterServerTypes, ApiLocation, ApiServerType, RawCatalog};

pub fn server_type(id: ExternalId, name: &str) -> ApiServerType {
    ApiServerType {
        id,
        name: name.to_string(),
        cores: 2,
        memory: 4.0,
    }
}

pub fn datacenter(id: ExternalId, location_id: ExternalId, available: &[ExternalId]) -> ApiDatacenter {
    ApiDatacenter {
        id,
        name: format!("dc-{id}"),
        location: ApiLocation {
            id: location_id,
            name: format!("loc-{location_id}"),
        },
        server_types: ApiDatacenterServerTypes {
            available: available.to_vec(),
        },
    }
}

pub fn raw_catalog(server_types: Vec<ApiServerType>, datacenters: Vec<ApiDatacenter>) -> RawCatalog {
    RawCatalog {
        server_types,
        datacenters,
    }
}

/// What a [`one_shot_server`] received. `head` is lowercased.
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

/// Accept one HTTP connection, capture the request and answer with `status`.
pub async fn one_shot_server(status: u16) -> (String, tokio::task::JoinHandle<CapturedRequest>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let captured = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let head = text[..split].to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                let body = &text[split + 4..];
                if body.len() >= length || n == 0 {
                    break CapturedRequest {
                        head,
                        body: body.to_string(),
                    };
                }
            } else if n == 0 {
                break CapturedRequest {
                    head: text.to_ascii_lowercase(),
                    body: String::new(),
                };
            }
        };
        let response =
            format!("HTTP/1.1 {status} Status\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        socket.write_all(response.as_bytes()).await.unwrap();
        captured
    });

    (url, handle)
}
