// Remote moderation client - the uniform call surface over the operation catalogue.
//
// This client handles:
// - Connectivity probing (Disconnected -> Testing -> Connected/Disconnected)
// - Gating every operation on the connection status
// - Local parameter validation before dispatch
// - Normalizing every response, or failure, into one `InvocationResult`
//
// NO transport details here - the wire lives behind `ModerationTransport`.

use super::catalogue::{Operation, OperationId, ParamKind, ResultShape};
use super::moderation_models::{
    ConnectionStatus, HarassmentAssessment, InvocationError, InvocationParams, InvocationResult,
    MessageRecord, Payload,
};
use super::session::{InvocationHistory, ModerationSession};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The remote service itself raised an error. The message is passed through verbatim.
    #[error("{0}")]
    Remote(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<TransportError> for InvocationError {
    fn from(err: TransportError) -> Self {
        match &err {
            // An empty underlying message falls back to the generic reason, unprefixed
            TransportError::Request(m) | TransportError::Remote(m) | TransportError::Malformed(m)
                if m.trim().is_empty() =>
            {
                InvocationError::remote("")
            }
            _ => InvocationError::remote(err.to_string()),
        }
    }
}

// ============================================================================
// TRANSPORT TRAIT (PORT)
// ============================================================================

/// One request, one response, against the remote moderation service.
#[async_trait]
pub trait ModerationTransport: Send + Sync {
    /// Call a remote method with positional arguments and return its raw result.
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError>;

    /// A cheap, read-only call used to test reachability.
    async fn probe(&self) -> Result<(), TransportError>;
}

// Lets the console hold the HTTP transport or a test double behind one type.
#[async_trait]
impl ModerationTransport for Box<dyn ModerationTransport> {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        (**self).call(method, args).await
    }

    async fn probe(&self) -> Result<(), TransportError> {
        (**self).probe().await
    }
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct RemoteModerationClient<T: ModerationTransport> {
    transport: T,
    session: Arc<ModerationSession>,
}

impl<T: ModerationTransport> RemoteModerationClient<T> {
    /// Create a client over an existing session without probing. Status stays as-is.
    pub fn new(transport: T, session: Arc<ModerationSession>) -> Self {
        Self { transport, session }
    }

    /// Create a client and probe immediately.
    pub async fn connect(transport: T, session: Arc<ModerationSession>) -> Self {
        let client = Self::new(transport, session);
        client.probe().await;
        client
    }

    pub fn status(&self) -> ConnectionStatus {
        self.session.connection().status
    }

    pub fn session(&self) -> &Arc<ModerationSession> {
        &self.session
    }

    pub fn history(&self) -> &InvocationHistory {
        self.session.history()
    }

    /// Test reachability and replace the live handle with the outcome.
    ///
    /// Concurrent probes are not coordinated; whichever finishes last decides the status.
    pub async fn probe(&self) -> ConnectionStatus {
        let current = self.session.connection();
        self.session
            .replace_connection(current.with_status(ConnectionStatus::Testing));

        let status = match self.transport.probe().await {
            Ok(()) => {
                tracing::info!(
                    endpoint = %current.endpoint_address,
                    service = %current.service_identifier,
                    "Moderation service reachable"
                );
                ConnectionStatus::Connected
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %current.endpoint_address,
                    "Connection probe failed: {}",
                    e
                );
                ConnectionStatus::Disconnected
            }
        };

        self.session
            .replace_connection(current.with_status(status));
        status
    }

    /// Run one catalogued operation. Always yields exactly one result, which is also
    /// recorded in the session history.
    pub async fn invoke(&self, id: OperationId, params: InvocationParams) -> Arc<InvocationResult> {
        let operation = id.operation();

        let result = match self.dispatch(operation, &params).await {
            Ok(payload) => InvocationResult::success(id, params, payload),
            Err(e) => {
                if let InvocationError::Remote { reason } = &e {
                    tracing::warn!(operation = %id, "Remote call failed: {}", reason);
                }
                InvocationResult::failure(id, params, e)
            }
        };

        tracing::info!(
            operation = %id,
            succeeded = result.succeeded(),
            negative = result.payload().is_some_and(Payload::is_business_negative),
            "Invocation finished"
        );

        let result = Arc::new(result);
        self.session.history().record(Arc::clone(&result)).await;
        result
    }

    async fn dispatch(
        &self,
        operation: &Operation,
        params: &InvocationParams,
    ) -> Result<Payload, InvocationError> {
        let connection = self.session.connection();
        if !connection.is_connected() {
            return Err(InvocationError::NotConnected {
                status: connection.status,
            });
        }

        let call = prepare_call(operation, params)?;

        tracing::debug!(method = operation.method, "Dispatching remote call");
        let raw = self.transport.call(operation.method, call.args).await?;

        let decoded = decode_shape(operation.result_shape, raw)
            .map_err(|e| InvocationError::from(TransportError::Malformed(e)))?;

        build_payload(operation.id, params, call.message_index, decoded)
            .map_err(|e| InvocationError::from(TransportError::Malformed(e)))
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

struct PreparedCall {
    args: Vec<Value>,
    message_index: Option<u64>,
}

/// Check every catalogued parameter and turn them into positional wire arguments.
fn prepare_call(
    operation: &Operation,
    params: &InvocationParams,
) -> Result<PreparedCall, InvocationError> {
    let mut args = Vec::with_capacity(operation.parameters.len());
    let mut message_index = None;

    for parameter in operation.parameters {
        let value = params
            .get(parameter.name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| InvocationError::validation(parameter.name, "is required"))?;

        match parameter.kind {
            ParamKind::Text => args.push(json!(value)),
            ParamKind::Index => {
                let index = value.trim().parse::<u64>().map_err(|_| {
                    InvocationError::validation(parameter.name, "must be a non-negative integer")
                })?;
                message_index = Some(index);
                args.push(json!(index));
            }
        }
    }

    Ok(PreparedCall {
        args,
        message_index,
    })
}

// ============================================================================
// RESPONSE NORMALIZATION
// ============================================================================

/// A raw response read according to its catalogue shape.
#[derive(Debug, PartialEq)]
enum Decoded {
    Flag(bool),
    Messages(Vec<MessageRecord>),
    Text(String),
    MaybeText(Option<String>),
}

#[derive(Deserialize)]
struct WireMessage {
    sender: String,
    receiver: String,
    content: String,
    timestamp: WireTimestamp,
}

/// Nanoseconds since the epoch. Large integers may arrive as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Number(i64),
    Text(String),
}

impl WireTimestamp {
    fn nanos(&self) -> Result<i64, String> {
        match self {
            WireTimestamp::Number(n) => Ok(*n),
            WireTimestamp::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid timestamp {:?}", s)),
        }
    }
}

fn decode_shape(shape: ResultShape, raw: Value) -> Result<Decoded, String> {
    match shape {
        ResultShape::Acceptance | ResultShape::Flag => raw
            .as_bool()
            .map(Decoded::Flag)
            .ok_or_else(|| format!("expected a boolean, got {}", raw)),
        ResultShape::SeverityLabel | ResultShape::Text => match raw {
            Value::String(s) => Ok(Decoded::Text(s)),
            other => Err(format!("expected text, got {}", other)),
        },
        ResultShape::OptionalKey => decode_optional_text(raw).map(Decoded::MaybeText),
        ResultShape::MessageList => {
            let wire: Vec<WireMessage> =
                serde_json::from_value(raw).map_err(|e| format!("expected messages: {}", e))?;
            wire.into_iter()
                .enumerate()
                .map(|(i, m)| {
                    Ok(MessageRecord {
                        index: i as u64,
                        timestamp: Utc.timestamp_nanos(m.timestamp.nanos()?),
                        sender: m.sender,
                        receiver: m.receiver,
                        content: m.content,
                    })
                })
                .collect::<Result<Vec<_>, String>>()
                .map(Decoded::Messages)
        }
    }
}

/// Accepts `null`, a string, or the candid option encoding `[]` / `[value]`.
/// Empty strings count as absent.
fn decode_optional_text(raw: Value) -> Result<Option<String>, String> {
    let inner = match raw {
        Value::Array(mut items) if items.len() <= 1 => items.pop().unwrap_or(Value::Null),
        other => other,
    };

    match inner {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(format!("expected an optional key, got {}", other)),
    }
}

fn build_payload(
    id: OperationId,
    params: &InvocationParams,
    message_index: Option<u64>,
    decoded: Decoded,
) -> Result<Payload, String> {
    let param = |name: &str| params.get(name).cloned().unwrap_or_default();

    let payload = match (id, decoded) {
        (OperationId::SendMessage, Decoded::Flag(accepted)) => Payload::Delivery { accepted },
        (OperationId::ReceiveMessages, Decoded::Messages(messages)) => Payload::Messages {
            receiver: param("receiverAddress"),
            messages,
        },
        (OperationId::EditMessage, Decoded::Flag(applied)) => Payload::Edit {
            message_index: message_index.unwrap_or_default(),
            applied,
        },
        (OperationId::DeleteUserMessages, Decoded::Flag(deleted)) => Payload::Deletion {
            sender: param("senderAddress"),
            deleted,
        },
        (OperationId::ClearMessages, Decoded::Flag(cleared)) => Payload::Clear { cleared },
        (OperationId::HarassmentLevel, Decoded::Text(label)) => {
            Payload::Harassment(HarassmentAssessment::from_label(label))
        }
        (OperationId::SuggestImprovement, Decoded::Text(suggestion)) => Payload::Suggestion {
            original: param("text"),
            suggestion,
        },
        (OperationId::GenerateKey, Decoded::MaybeText(key)) => Payload::KeyIssue { key },
        (OperationId::VerifyKey, Decoded::Flag(valid)) => Payload::KeyCheck { valid },
        (id, decoded) => return Err(format!("{} cannot carry {:?}", id, decoded)),
    };

    Ok(payload)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Scripted transport that counts calls per method.
    struct MockTransport {
        responses: DashMap<String, Result<Value, String>>,
        calls: DashMap<String, usize>,
        last_args: DashMap<String, Vec<Value>>,
        total_calls: AtomicUsize,
        probe_ok: AtomicBool,
        probe_gate: Option<Arc<Notify>>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                responses: DashMap::new(),
                calls: DashMap::new(),
                last_args: DashMap::new(),
                total_calls: AtomicUsize::new(0),
                probe_ok: AtomicBool::new(true),
                probe_gate: None,
            }
        }

        fn respond(self, method: &str, value: Value) -> Self {
            self.responses.insert(method.to_string(), Ok(value));
            self
        }

        fn fail(self, method: &str, message: &str) -> Self {
            self.responses
                .insert(method.to_string(), Err(message.to_string()));
            self
        }

        fn calls_to(&self, method: &str) -> usize {
            self.calls.get(method).map(|c| *c).unwrap_or(0)
        }
    }

    #[async_trait]
    impl ModerationTransport for MockTransport {
        async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError> {
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            *self.calls.entry(method.to_string()).or_insert(0) += 1;
            self.last_args.insert(method.to_string(), args);

            match self.responses.get(method).map(|r| r.clone()) {
                Some(Ok(value)) => Ok(value),
                Some(Err(message)) => Err(TransportError::Remote(message)),
                None => Err(TransportError::Request("no scripted response".to_string())),
            }
        }

        async fn probe(&self) -> Result<(), TransportError> {
            if let Some(gate) = &self.probe_gate {
                gate.notified().await;
            }
            if self.probe_ok.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(TransportError::Request("connection refused".to_string()))
            }
        }
    }

    fn params(pairs: &[(&str, &str)]) -> InvocationParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn session() -> Arc<ModerationSession> {
        Arc::new(ModerationSession::new("http://localhost:4943", "svc"))
    }

    async fn connected(transport: MockTransport) -> RemoteModerationClient<MockTransport> {
        let client = RemoteModerationClient::connect(transport, session()).await;
        assert_eq!(client.status(), ConnectionStatus::Connected);
        client
    }

    fn sample_params(id: OperationId) -> InvocationParams {
        id.operation()
            .parameters
            .iter()
            .map(|p| {
                let value = match p.kind {
                    ParamKind::Index => "0",
                    ParamKind::Text => "value",
                };
                (p.name.to_string(), value.to_string())
            })
            .collect()
    }

    #[tokio::test]
    async fn test_new_client_starts_disconnected() {
        let client = RemoteModerationClient::new(MockTransport::new(), session());
        assert_eq!(client.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_probe_failure_leaves_client_disconnected() {
        let transport = MockTransport::new();
        transport.probe_ok.store(false, Ordering::SeqCst);

        let client = RemoteModerationClient::connect(transport, session()).await;
        assert_eq!(client.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_failed_probe_passes_through_testing() {
        let gate = Arc::new(Notify::new());
        let mut transport = MockTransport::new();
        transport.probe_ok.store(false, Ordering::SeqCst);
        transport.probe_gate = Some(Arc::clone(&gate));

        let client = Arc::new(RemoteModerationClient::new(transport, session()));
        let probing = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.probe().await })
        };

        while client.status() != ConnectionStatus::Testing {
            tokio::task::yield_now().await;
        }

        gate.notify_one();
        assert_eq!(probing.await.unwrap(), ConnectionStatus::Disconnected);
        assert_eq!(client.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_blank_transport_messages_become_unknown_error() {
        for err in [
            TransportError::Request(String::new()),
            TransportError::Remote("  ".to_string()),
            TransportError::Malformed(String::new()),
        ] {
            assert_eq!(
                InvocationError::from(err),
                InvocationError::Remote {
                    reason: "unknown error".to_string()
                }
            );
        }

        assert_eq!(
            InvocationError::from(TransportError::Request("timed out".to_string())),
            InvocationError::Remote {
                reason: "request failed: timed out".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_probe_passes_through_testing() {
        let gate = Arc::new(Notify::new());
        let mut transport = MockTransport::new().respond("clearMessages", json!(true));
        transport.probe_gate = Some(Arc::clone(&gate));

        let client = Arc::new(RemoteModerationClient::new(transport, session()));
        let probing = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.probe().await })
        };

        while client.status() != ConnectionStatus::Testing {
            tokio::task::yield_now().await;
        }

        // Gated while the probe is still in flight.
        let result = client
            .invoke(OperationId::ClearMessages, InvocationParams::new())
            .await;
        assert_eq!(
            result.error(),
            Some(&InvocationError::NotConnected {
                status: ConnectionStatus::Testing
            })
        );

        gate.notify_one();
        assert_eq!(probing.await.unwrap(), ConnectionStatus::Connected);
        assert_eq!(client.status(), ConnectionStatus::Connected);
        assert_eq!(client.transport.calls_to("clearMessages"), 0);
    }

    #[tokio::test]
    async fn test_reprobe_can_disconnect() {
        let client = connected(MockTransport::new()).await;
        client.transport.probe_ok.store(false, Ordering::SeqCst);

        assert_eq!(client.probe().await, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_every_operation_is_gated_when_disconnected() {
        let client = RemoteModerationClient::new(MockTransport::new(), session());

        for id in OperationId::ALL {
            let result = client.invoke(id, sample_params(id)).await;
            assert!(!result.succeeded());
            assert!(matches!(
                result.error(),
                Some(InvocationError::NotConnected { .. })
            ));
        }

        assert_eq!(client.transport.total_calls.load(Ordering::SeqCst), 0);
        assert_eq!(client.history().len().await, OperationId::ALL.len());
    }

    #[tokio::test]
    async fn test_missing_or_blank_parameter_never_reaches_service() {
        let client = connected(MockTransport::new().respond("sendMessage", json!(true))).await;

        for id in OperationId::ALL {
            for parameter in id.operation().parameters {
                let mut missing = sample_params(id);
                missing.remove(parameter.name);
                let result = client.invoke(id, missing).await;
                assert!(matches!(
                    result.error(),
                    Some(InvocationError::Validation { field, .. }) if field == parameter.name
                ));

                let mut blank = sample_params(id);
                blank.insert(parameter.name.to_string(), "   ".to_string());
                let result = client.invoke(id, blank).await;
                assert!(matches!(
                    result.error(),
                    Some(InvocationError::Validation { .. })
                ));
            }
        }

        assert_eq!(client.transport.total_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_message_index_parsing() {
        let client = connected(MockTransport::new().respond("editMessage", json!(true))).await;

        for bad in ["-1", "abc", "1.5"] {
            let result = client
                .invoke(
                    OperationId::EditMessage,
                    params(&[
                        ("senderAddress", "A"),
                        ("messageIndex", bad),
                        ("newMessage", "fixed"),
                    ]),
                )
                .await;
            assert!(matches!(
                result.error(),
                Some(InvocationError::Validation { field, .. }) if field == "messageIndex"
            ));
        }
        assert_eq!(client.transport.calls_to("editMessage"), 0);

        let result = client
            .invoke(
                OperationId::EditMessage,
                params(&[
                    ("senderAddress", "A"),
                    ("messageIndex", "0"),
                    ("newMessage", "fixed"),
                ]),
            )
            .await;
        assert!(result.succeeded());
        assert_eq!(
            result.payload(),
            Some(&Payload::Edit {
                message_index: 0,
                applied: true
            })
        );

        let args = client.transport.last_args.get("editMessage").unwrap().clone();
        assert_eq!(args, vec![json!("A"), json!(0), json!("fixed")]);
    }

    #[tokio::test]
    async fn test_send_message_accepted() {
        let client = connected(MockTransport::new().respond("sendMessage", json!(true))).await;

        let result = client
            .invoke(
                OperationId::SendMessage,
                params(&[
                    ("senderAddress", "A"),
                    ("receiverAddress", "B"),
                    ("message", "hello"),
                ]),
            )
            .await;

        assert!(result.succeeded());
        let payload = result.payload().unwrap();
        assert_eq!(payload, &Payload::Delivery { accepted: true });
        assert!(!payload.is_business_negative());
        assert_eq!(result.supplied_parameters().get("message").unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_blocked_message_is_still_a_success() {
        let client = connected(MockTransport::new().respond("sendMessage", json!(false))).await;

        let result = client
            .invoke(
                OperationId::SendMessage,
                params(&[
                    ("senderAddress", "A"),
                    ("receiverAddress", "B"),
                    ("message", "you are very bad"),
                ]),
            )
            .await;

        assert!(result.succeeded());
        assert!(result.failure_reason().is_none());
        assert!(result.payload().unwrap().is_business_negative());
    }

    #[tokio::test]
    async fn test_harassment_label_normalized() {
        let client =
            connected(MockTransport::new().respond("harassmentLevel", json!("HIGH"))).await;

        let result = client
            .invoke(OperationId::HarassmentLevel, params(&[("text", "test")]))
            .await;

        match result.payload() {
            Some(Payload::Harassment(assessment)) => {
                assert_eq!(assessment.category, crate::core::moderation::SeverityCategory::High);
                assert_eq!(assessment.scale, 85);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_key_absent_is_business_negative() {
        for absent in [json!(null), json!(""), json!([]), json!([""])] {
            let client = connected(MockTransport::new().respond("generateKey", absent)).await;

            let result = client
                .invoke(
                    OperationId::GenerateKey,
                    params(&[("projectIdentifier", "demo"), ("developerIdentity", "dev-1")]),
                )
                .await;

            assert!(result.succeeded());
            assert_eq!(result.payload(), Some(&Payload::KeyIssue { key: None }));
            assert!(result.failure_reason().is_none());
        }
    }

    #[tokio::test]
    async fn test_generate_key_issued_in_option_encoding() {
        let client =
            connected(MockTransport::new().respond("generateKey", json!(["vetkey-abc"]))).await;

        let result = client
            .invoke(
                OperationId::GenerateKey,
                params(&[("projectIdentifier", "demo"), ("developerIdentity", "dev-1")]),
            )
            .await;

        assert_eq!(
            result.payload(),
            Some(&Payload::KeyIssue {
                key: Some("vetkey-abc".to_string())
            })
        );
    }

    #[tokio::test]
    async fn test_receive_messages_converts_nanosecond_timestamps() {
        let client = connected(MockTransport::new().respond(
            "receiveMessages",
            json!([
                {"sender": "A", "receiver": "B", "content": "hi", "timestamp": 1_700_000_000_000_000_000i64},
                {"sender": "C", "receiver": "B", "content": "yo", "timestamp": "1700000001000000000"}
            ]),
        ))
        .await;

        let result = client
            .invoke(OperationId::ReceiveMessages, params(&[("receiverAddress", "B")]))
            .await;

        match result.payload() {
            Some(Payload::Messages { receiver, messages }) => {
                assert_eq!(receiver, "B");
                assert_eq!(messages.len(), 2);
                assert_eq!(messages[0].index, 0);
                assert_eq!(messages[0].timestamp.timestamp(), 1_700_000_000);
                assert_eq!(messages[1].index, 1);
                assert_eq!(messages[1].sender, "C");
                assert_eq!(messages[1].timestamp.timestamp(), 1_700_000_001);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_failure_is_captured() {
        let client = connected(MockTransport::new().fail("clearMessages", "canister trapped")).await;

        let result = client
            .invoke(OperationId::ClearMessages, InvocationParams::new())
            .await;

        assert!(!result.succeeded());
        assert_eq!(result.failure_reason().as_deref(), Some("canister trapped"));
        assert_eq!(client.history().len().await, 1);
    }

    #[tokio::test]
    async fn test_remote_failure_without_message() {
        let client = connected(MockTransport::new().fail("clearMessages", "")).await;

        let result = client
            .invoke(OperationId::ClearMessages, InvocationParams::new())
            .await;

        assert_eq!(result.failure_reason().as_deref(), Some("unknown error"));
    }

    #[tokio::test]
    async fn test_malformed_response_is_a_remote_failure() {
        let client =
            connected(MockTransport::new().respond("verifyKey", json!("definitely"))).await;

        let result = client
            .invoke(
                OperationId::VerifyKey,
                params(&[
                    ("projectIdentifier", "demo"),
                    ("developerIdentity", "dev-1"),
                    ("key", "k"),
                ]),
            )
            .await;

        assert!(!result.succeeded());
        assert!(result
            .failure_reason()
            .unwrap()
            .starts_with("malformed response"));
    }

    #[tokio::test]
    async fn test_identical_calls_are_not_deduplicated() {
        let client =
            connected(MockTransport::new().respond("suggestImprovedMessage", json!("Please stop."))).await;

        let first = client
            .invoke(OperationId::SuggestImprovement, params(&[("text", "stop it")]))
            .await;
        let second = client
            .invoke(OperationId::SuggestImprovement, params(&[("text", "stop it")]))
            .await;

        assert!(first.succeeded() && second.succeeded());
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(client.transport.calls_to("suggestImprovedMessage"), 2);

        let history = client.history().snapshot().await;
        assert_eq!(history.len(), 2);
        assert!(Arc::ptr_eq(&history[0], &second));
    }

    #[tokio::test]
    async fn test_concurrent_invocations_resolve_independently() {
        let client = connected(
            MockTransport::new()
                .respond("harassmentLevel", json!("low"))
                .fail("deleteUserMessages", "not allowed"),
        )
        .await;

        let (a, b) = tokio::join!(
            client.invoke(OperationId::HarassmentLevel, params(&[("text", "hi")])),
            client.invoke(
                OperationId::DeleteUserMessages,
                params(&[("senderAddress", "A")])
            ),
        );

        assert!(a.succeeded());
        assert!(!b.succeeded());
        assert_eq!(client.history().len().await, 2);
    }
}
