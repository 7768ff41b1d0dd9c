use std::sync::Arc;
use std::time::Instant;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::debug;

use crate::engine::{applicable_rules_for_period, lint_config, validate_booking};
use crate::limits::MAX_LINE_LEN;
use crate::model::*;
use crate::protocol::{self, Command, Reply};
use crate::store::{PropertyStore, StoreError};
use crate::summary;

/// Serve one connection: a JSON request per line in, a JSON reply per line out.
///
/// Bad requests get an error reply and the connection stays open. Returns
/// when the peer closes or the socket fails.
pub async fn process_connection<S>(socket: S, store: Arc<PropertyStore>) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(socket, LinesCodec::new_with_max_length(MAX_LINE_LEN));
    // `Framed` ends the stream with one `None` after a decode error, then
    // resumes reading on the next poll.
    let mut resuming = false;

    loop {
        let frame = match framed.next().await {
            Some(frame) => {
                resuming = false;
                frame
            }
            None if resuming => {
                resuming = false;
                continue;
            }
            None => break,
        };

        let reply = match frame {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                handle_line(&store, &line)
            }
            // The codec discards up to the next newline before decoding again.
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                resuming = true;
                Reply::err(protocol::ProtocolError::LineTooLong)
            }
            Err(LinesCodecError::Io(e)) => return Err(e),
        };

        let encoded = serde_json::to_string(&reply).map_err(std::io::Error::other)?;
        framed.send(encoded).await.map_err(|e| match e {
            LinesCodecError::Io(e) => e,
            other => std::io::Error::other(other.to_string()),
        })?;
    }
    Ok(())
}

/// Why an accepted request produced no result.
#[derive(Debug)]
pub enum RequestError {
    Store(StoreError),
    Encode(serde_json::Error),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Store(e) => write!(f, "{e}"),
            RequestError::Encode(e) => write!(f, "could not encode result: {e}"),
        }
    }
}

impl std::error::Error for RequestError {}

impl From<StoreError> for RequestError {
    fn from(e: StoreError) -> Self {
        RequestError::Store(e)
    }
}

/// Parse, execute and time one request.
pub fn handle_line(store: &PropertyStore, line: &str) -> Reply {
    let cmd = match protocol::parse_command(line) {
        Ok(cmd) => cmd,
        Err(e) => {
            metrics::counter!(crate::observability::REQUESTS_TOTAL, "command" => "unknown", "status" => "error")
                .increment(1);
            return Reply::err(e);
        }
    };

    let label = cmd.label();
    let started = Instant::now();
    let result = execute_command(store, cmd);
    metrics::histogram!(crate::observability::REQUEST_DURATION_SECONDS, "command" => label)
        .record(started.elapsed().as_secs_f64());

    match result {
        Ok(value) => {
            metrics::counter!(crate::observability::REQUESTS_TOTAL, "command" => label, "status" => "ok")
                .increment(1);
            Reply::ok(value)
        }
        Err(e) => {
            metrics::counter!(crate::observability::REQUESTS_TOTAL, "command" => label, "status" => "error")
                .increment(1);
            debug!(command = label, "request failed: {e}");
            Reply::err(e)
        }
    }
}

fn execute_command(store: &PropertyStore, cmd: Command) -> Result<Value, RequestError> {
    match cmd {
        Command::Validate { booking, occupancy } => {
            let config = store.get(&booking.property_id)?;
            evaluate(&booking, &config, &occupancy)
        }
        Command::ValidateWith {
            booking,
            config,
            occupancy,
        } => evaluate(&booking, &config, &occupancy),
        Command::RulesForPeriod {
            property_id,
            start,
            end,
        } => {
            let config = store.get(&property_id)?;
            to_value(&applicable_rules_for_period(start, end, &config))
        }
        Command::Lint { property_id } => {
            let config = store.get(&property_id)?;
            to_value(&lint_config(&config))
        }
        Command::Reload { property_id } => {
            let was_cached = store.reload(&property_id);
            Ok(serde_json::json!({ "reloaded": was_cached }))
        }
    }
}

/// Run the engine and attach the text summary to the JSON result.
fn evaluate(
    booking: &BookingRequest,
    config: &RuleSetConfig,
    occupancy: &[OccupancySample],
) -> Result<Value, RequestError> {
    let result = validate_booking(booking, config, occupancy);
    crate::observability::record_evaluation(&result);
    debug!(property = %booking.property_id, "evaluation:\n{result}");

    let mut value = to_value(&result)?;
    if let Value::Object(map) = &mut value {
        map.insert("summary".into(), Value::String(summary::render(&result)));
    }
    Ok(value)
}

fn to_value<T: serde::Serialize>(v: &T) -> Result<Value, RequestError> {
    serde_json::to_value(v).map_err(RequestError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn test_store(name: &str) -> Arc<PropertyStore> {
        let dir: PathBuf = std::env::temp_dir().join("staywindow_test_wire").join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("villa.json"),
            r#"{
                "enabled": true,
                "minimumStayRules": [{
                    "id": "holiday",
                    "name": "Holiday Season",
                    "dateRange": { "start": "2024-12-20", "end": "2025-01-02" },
                    "minStay": 3,
                    "triggerType": "season",
                    "priority": 10
                }],
                "defaults": { "minStay": 1 }
            }"#,
        )
        .unwrap();
        Arc::new(PropertyStore::new(dir))
    }

    #[test]
    fn validate_against_stored_rule_set() {
        let store = test_store("validate");
        let reply = handle_line(
            &store,
            r#"{"op":"validate","booking":{"checkIn":"2024-12-30","checkOut":"2025-01-01","bookingDate":"2024-11-01","propertyId":"villa"}}"#,
        );
        assert!(reply.ok, "{:?}", reply.error);
        let result = reply.result.unwrap();
        assert_eq!(result["isValid"], false);
        assert_eq!(result["appliedRules"]["stayRule"]["id"], "holiday");
        assert!(result["errors"][0].as_str().unwrap().contains("Required: 3 nights"));
        assert!(result["summary"].as_str().unwrap().starts_with("INVALID"));
    }

    #[test]
    fn unknown_property_is_error_reply() {
        let store = test_store("unknown");
        let reply = handle_line(
            &store,
            r#"{"op":"validate","booking":{"checkIn":"2024-12-30","checkOut":"2025-01-01","bookingDate":"2024-11-01","propertyId":"ghost"}}"#,
        );
        assert!(!reply.ok);
        assert!(reply.error.unwrap().contains("ghost"));
    }

    #[test]
    fn rules_for_period_and_lint() {
        let store = test_store("period");
        let reply = handle_line(
            &store,
            r#"{"op":"rulesForPeriod","propertyId":"villa","start":"2024-12-01","end":"2024-12-24"}"#,
        );
        let result = reply.result.unwrap();
        assert_eq!(result["stayRules"][0]["id"], "holiday");
        assert_eq!(result["windowRules"].as_array().unwrap().len(), 0);

        let reply = handle_line(&store, r#"{"op":"lint","propertyId":"villa"}"#);
        assert_eq!(reply.result.unwrap().as_array().unwrap().len(), 0);
    }

    #[test]
    fn reload_reports_cache_state() {
        let store = test_store("reload");
        let reply = handle_line(&store, r#"{"op":"reload","propertyId":"villa"}"#);
        assert_eq!(reply.result.unwrap()["reloaded"], false);
        store.get("villa").unwrap();
        let reply = handle_line(&store, r#"{"op":"reload","propertyId":"villa"}"#);
        assert_eq!(reply.result.unwrap()["reloaded"], true);
    }

    #[tokio::test]
    async fn connection_survives_bad_lines() {
        let store = test_store("conn");
        let (client, server) = tokio::io::duplex(64 * 1024);
        let handle = tokio::spawn(process_connection(server, store));

        let (read, mut write) = tokio::io::split(client);
        let mut lines = BufReader::new(read).lines();

        write.write_all(b"not json\n").await.unwrap();
        let first: Reply = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert!(!first.ok);
        assert!(first.error.unwrap().starts_with("parse error"));

        write
            .write_all(b"{\"op\":\"validateWith\",\"booking\":{\"checkIn\":\"2024-06-10\",\"checkOut\":\"2024-06-12\",\"bookingDate\":\"2024-06-01\"},\"config\":{\"enabled\":false}}\n")
            .await
            .unwrap();
        let second: Reply = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert!(second.ok, "{:?}", second.error);
        assert_eq!(second.result.unwrap()["isValid"], true);

        drop(write);
        drop(lines);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn connection_survives_oversized_line() {
        let store = test_store("oversized");
        let (client, server) = tokio::io::duplex(64 * 1024);
        let handle = tokio::spawn(process_connection(server, store));

        let (read, mut write) = tokio::io::split(client);
        let mut lines = BufReader::new(read).lines();

        let mut huge = vec![b'x'; MAX_LINE_LEN + 10];
        huge.push(b'\n');
        write.write_all(&huge).await.unwrap();
        let first: Reply = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert!(!first.ok);
        assert_eq!(first.error.unwrap(), protocol::ProtocolError::LineTooLong.to_string());

        write
            .write_all(b"{\"op\":\"validateWith\",\"booking\":{\"checkIn\":\"2024-06-10\",\"checkOut\":\"2024-06-12\",\"bookingDate\":\"2024-06-01\"},\"config\":{\"enabled\":false}}\n")
            .await
            .unwrap();
        let second = tokio::time::timeout(std::time::Duration::from_secs(5), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .expect("connection closed after oversized line");
        let second: Reply = serde_json::from_str(&second).unwrap();
        assert!(second.ok, "{:?}", second.error);
        assert_eq!(second.result.unwrap()["isValid"], true);

        drop(write);
        drop(lines);
        handle.await.unwrap().unwrap();
    }

    struct Unencodable;

    impl serde::Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("unsupported value"))
        }
    }

    #[test]
    fn encode_failure_is_an_error_not_null() {
        let err = to_value(&Unencodable).unwrap_err();
        assert!(matches!(err, RequestError::Encode(_)));
        let reply = Reply::err(err);
        assert!(!reply.ok);
        assert!(reply.result.is_none());
        assert!(reply.error.unwrap().starts_with("could not encode result"));
    }

    #[test]
    fn store_errors_keep_their_message() {
        let err = RequestError::from(StoreError::NotFound("ghost".into()));
        assert_eq!(err.to_string(), "no rule set for property: ghost");
    }
}
