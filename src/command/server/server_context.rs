use crate::character::CharacterStore;

pub struct ServerContext {
    pub store: CharacterStore,
}

impl ServerContext {
    pub fn new(store: CharacterStore) -> Self {
        Self { store }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::cache::{memory, Cache};
    use crate::upstream::{self, Resource, Upstream};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    pub struct FixedUpstream {
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl Upstream for FixedUpstream {
        async fn fetch(&self, resource: &Resource) -> Result<Value, upstream::Error> {
            self.calls.fetch_add(1, Ordering::Relaxed);

            match resource {
                Resource::Characters => Ok(json!([
                    {"id": 1, "name": "Rick Sanchez"},
                    {"id": 2, "name": "Morty Smith"}
                ])),
                Resource::Character { id } if id == "1" => {
                    Ok(json!({"id": 1, "name": "Rick Sanchez"}))
                }
                Resource::Character { id } if id == "unreachable" => Err(
                    upstream::Error::Transport("connection refused".to_string()),
                ),
                Resource::Character { id } if id == "500" => Err(upstream::Error::Status {
                    status: 500,
                    content_type: Some("text/html; charset=utf-8".to_string()),
                    body: b"<html>upstream failure</html>".to_vec(),
                }),
                Resource::Character { .. } => Err(upstream::Error::Status {
                    status: 404,
                    content_type: Some("application/json; charset=utf-8".to_string()),
                    body: br#"{"error":"Character not found"}"#.to_vec(),
                }),
            }
        }
    }

    pub fn create_test_server_context() -> (ServerContext, Arc<FixedUpstream>) {
        let upstream = Arc::new(FixedUpstream::default());
        let cache: Arc<dyn Cache> = Arc::new(memory::Backend::new());
        let store = CharacterStore::new(upstream.clone(), Some(cache), None);

        (ServerContext::new(store), upstream)
    }

    #[tokio::test]
    async fn test_server_context_serves_through_store() {
        let (context, upstream) = create_test_server_context();

        let first = context.store.get_character("1").await.unwrap();
        let second = context.store.get_character("1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(upstream.calls.load(Ordering::Relaxed), 1);
    }
}
