//! Integration tests for the REST ledger client.
//!
//! Each test serves a small axum router on an OS-assigned port and
//! points an [`HttpLedgerClient`] at it.

#[cfg(feature = "http")]
mod http {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use roomledger_ledger::{
        ConfirmationPoller, HttpLedgerClient, LedgerClient, LedgerError,
        SignedTransaction, TransactionId,
    };
    use roomledger_retry::{Classify, ErrorClass, RetryPolicy};
    use serde_json::{json, Value};

    /// Serves `router` on 127.0.0.1 and returns the base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("server should run");
        });
        format!("http://{addr}")
    }

    fn node_router(polls: Arc<AtomicU32>) -> Router {
        Router::new()
            .route(
                "/testnet/transaction/broadcast",
                post(|body: String| async move {
                    assert!(body.contains("rm_create_room"));
                    Json(json!("at1broadcasted"))
                }),
            )
            .route(
                "/testnet/transaction/{id}",
                get(
                    |State(polls): State<Arc<AtomicU32>>, Path(id): Path<String>| async move {
                        if id != "at1broadcasted" {
                            return Err(StatusCode::NOT_FOUND);
                        }
                        let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
                        let outputs = if n < 2 {
                            json!([])
                        } else {
                            json!([{ "type": "public", "id": "1field", "value": "{ seats: 4u8 }" }])
                        };
                        Ok(Json(json!({
                            "type": "execute",
                            "id": id,
                            "execution": { "transitions": [{ "outputs": outputs }] }
                        })))
                    },
                ),
            )
            .route(
                "/testnet/program/{program}/mapping/{mapping}/{key}",
                get(|Path((program, mapping, key)): Path<(String, String, String)>| async move {
                    match (program.as_str(), mapping.as_str(), key.as_str()) {
                        ("room_manager.aleo", "rooms", "1u32") => Json(json!("{ seats: 4u8 }")),
                        ("credits.aleo", "account", _) => Json(json!("1000u64")),
                        _ => Json(Value::Null),
                    }
                }),
            )
            .with_state(polls)
    }

    #[tokio::test]
    async fn test_broadcast_returns_node_assigned_id() {
        let base = serve(node_router(Arc::default())).await;
        let client = HttpLedgerClient::new(&base, "testnet").unwrap();

        let id = client
            .submit_transaction(&SignedTransaction::new(r#"{"function":"rm_create_room"}"#))
            .await
            .unwrap();
        assert_eq!(id.as_str(), "at1broadcasted");
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_none() {
        let base = serve(node_router(Arc::default())).await;
        let client = HttpLedgerClient::new(&base, "testnet").unwrap();

        let tx = client
            .get_transaction(&TransactionId::new("at1other"))
            .await
            .unwrap();
        assert!(tx.is_none());
    }

    #[tokio::test]
    async fn test_poller_confirms_over_http() {
        let polls = Arc::new(AtomicU32::new(0));
        let base = serve(node_router(polls.clone())).await;
        let client = HttpLedgerClient::new(&base, "testnet").unwrap();
        let poller = ConfirmationPoller::new(RetryPolicy::immediate(5));

        let tx = poller
            .await_confirmation(&client, &TransactionId::new("at1broadcasted"))
            .await
            .unwrap();

        assert_eq!(polls.load(Ordering::SeqCst), 2);
        assert_eq!(tx.outputs()[0].value.as_deref(), Some("{ seats: 4u8 }"));
    }

    #[tokio::test]
    async fn test_mapping_values_and_absent_keys() {
        let base = serve(node_router(Arc::default())).await;
        let client = HttpLedgerClient::new(&base, "testnet").unwrap();

        let room = client
            .get_mapping_value("room_manager.aleo", "rooms", "1u32")
            .await
            .unwrap();
        assert_eq!(room.as_deref(), Some("{ seats: 4u8 }"));

        let missing = client
            .get_mapping_value("room_manager.aleo", "rooms", "9u32")
            .await
            .unwrap();
        assert!(missing.is_none());

        let balance = client
            .get_mapping_value("credits.aleo", "account", "aleo1anyone")
            .await
            .unwrap();
        assert_eq!(balance.as_deref(), Some("1000u64"));
    }

    #[tokio::test]
    async fn test_error_statuses_are_classified() {
        let router = Router::new()
            .route(
                "/testnet/transaction/broadcast",
                post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "room is full") }),
            )
            .route(
                "/testnet/transaction/{id}",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "syncing") }),
            );
        let base = serve(router).await;
        let client = HttpLedgerClient::new(&base, "testnet").unwrap();

        let err = client
            .submit_transaction(&SignedTransaction::new("{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Status { status: 422, ref body } if body == "room is full"));
        assert_eq!(err.class(), ErrorClass::Permanent);

        let err = client
            .get_transaction(&TransactionId::new("at1x"))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transient() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpLedgerClient::new(&format!("http://{addr}"), "testnet").unwrap();
        let err = client
            .get_transaction(&TransactionId::new("at1x"))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
    }
}
