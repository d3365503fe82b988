use crate::command::server::error::Error;
use crate::command::server::listeners::{accept, build_listener};
use crate::command::server::serve_request;
use crate::command::server::ServerContext;
use crate::configuration::ServerConfig;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info};

pub struct InsecureListener {
    binding_address: SocketAddr,
    context: Arc<ServerContext>,
    timeouts: Arc<[Duration; 2]>,
}

impl InsecureListener {
    pub fn new(server_config: &ServerConfig, context: ServerContext) -> Self {
        let binding_address = SocketAddr::new(server_config.bind_address, server_config.port);

        let timeouts = [
            Duration::from_secs(server_config.query_timeout),
            Duration::from_secs(server_config.query_timeout_grace_period),
        ];

        Self {
            binding_address,
            context: Arc::new(context),
            timeouts: Arc::new(timeouts),
        }
    }

    pub async fn serve(&self) -> Result<(), Error> {
        let listener = build_listener(self.binding_address).await?;
        self.serve_on(listener).await
    }

    pub async fn serve_on(&self, listener: TcpListener) -> Result<(), Error> {
        let local_address = listener
            .local_addr()
            .map_err(|err| Error::Initialization(format!("Failed to read local address: {err}")))?;
        info!("Listening on {local_address} (non-TLS)");

        loop {
            debug!("Waiting for incoming connection");
            let (tcp, _remote_address) = accept(&listener).await?;

            let stream = TokioIo::new(tcp);

            tokio::spawn(Box::pin(serve_request(
                stream,
                Arc::clone(&self.context),
                Arc::clone(&self.timeouts),
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::server::server_context::tests::create_test_server_context;
    use serde_json::{json, Value};
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::atomic::Ordering;

    #[test]
    fn test_new_uses_server_config() {
        let server_config = ServerConfig {
            bind_address: IpAddr::from(Ipv4Addr::LOCALHOST),
            port: 9000,
            query_timeout: 30,
            query_timeout_grace_period: 5,
        };
        let (context, _) = create_test_server_context();

        let listener = InsecureListener::new(&server_config, context);

        assert_eq!(listener.binding_address.to_string(), "127.0.0.1:9000");
        assert_eq!(
            *listener.timeouts,
            [Duration::from_secs(30), Duration::from_secs(5)]
        );
    }

    #[tokio::test]
    async fn test_serve_characters_end_to_end() {
        let (context, upstream) = create_test_server_context();
        let listener = Arc::new(InsecureListener::new(&ServerConfig::default(), context));

        let tcp_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = tcp_listener.local_addr().unwrap();

        let server = Arc::clone(&listener);
        let handle = tokio::spawn(async move { server.serve_on(tcp_listener).await });

        let client = reqwest::Client::new();
        let base = format!("http://{address}");

        let greeting = client.get(&base).send().await.unwrap();
        assert_eq!(greeting.status(), reqwest::StatusCode::OK);
        assert_eq!(greeting.text().await.unwrap(), "Hello World");

        for _ in 0..3 {
            let response = client
                .get(format!("{base}/characters/1"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::OK);
            let body: Value = response.json().await.unwrap();
            assert_eq!(body, json!({"id": 1, "name": "Rick Sanchez"}));
        }
        assert_eq!(upstream.calls.load(Ordering::Relaxed), 1);

        let missing = client
            .get(format!("{base}/characters/9999"))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
        assert_eq!(
            missing.text().await.unwrap(),
            r#"{"error":"Character not found"}"#
        );

        handle.abort();
    }
}
