//! Handler scenarios against the in-memory inventory.

use serde_json::json;

use asg_core::Config;
use asg_events::{EventError, SnsEnvelope};
use asg_handler::{Handler, HandlerError, HandlerOutcome};
use asg_zabbix::memory::{MemoryInventory, RecordedCall};
use asg_zabbix::{HostRecord, TransitionAnnotation, TransitionOutcome, ZabbixError};

fn config(delete_mode: bool) -> Config {
    Config {
        profile: String::new(),
        zabbix_url: "https://zabbix.example.com/api_jsonrpc.php".into(),
        zabbix_user: "api".into(),
        zabbix_password: "secret".into(),
        delete_mode,
        debug: true,
        credentials_encrypted: false,
        aws_region: "us-east-1".into(),
        request_timeout_secs: 10,
    }
}

fn termination_envelope(instance_id: &str) -> SnsEnvelope {
    let message = json!({
        "version": "0",
        "source": "aws.autoscaling",
        "detail-type": "EC2 Instance Terminate Successful",
        "account": "123456789012",
        "time": "2024-03-01T10:00:00Z",
        "region": "eu-west-1",
        "detail": {
            "EC2InstanceId": instance_id,
            "AutoScalingGroupName": "web",
            "Cause": "scale in",
            "StartTime": "2024-03-01T09:59:00Z",
            "EndTime": "2024-03-01T10:00:00Z",
            "StatusCode": "InProgress",
            "Description": format!("Terminating EC2 instance: {instance_id}")
        }
    });
    SnsEnvelope::with_message(message.to_string())
}

fn host(id: &str, name: &str) -> HostRecord {
    HostRecord::new(id, name).with_alias("i-123")
}

#[tokio::test]
async fn test_scenario_a_disable_and_mark() {
    let cfg = config(false);
    let inventory = MemoryInventory::new(vec![host("55", "i-123").with_description("web tier")]);

    let outcome = Handler::new(&cfg, &inventory)
        .handle(&termination_envelope("i-123"))
        .await
        .unwrap();

    assert_eq!(outcome.message(), "i-123");
    assert!(matches!(
        outcome,
        HandlerOutcome::Deregistered {
            transition: TransitionOutcome::Disabled { .. },
            ..
        }
    ));

    let calls = inventory.calls();
    assert_eq!(calls[0], RecordedCall::Authenticate("api".into()));
    assert_eq!(calls[1], RecordedCall::Find("i-123".into()));
    let update = match &calls[2] {
        RecordedCall::Update(update) => update,
        other => panic!("expected update, got {other:?}"),
    };
    assert_eq!(calls.len(), 3);
    assert_eq!(update.host_id, "55");
    assert_eq!(update.host_name, "ZDTP_i-123");
    assert_eq!(update.status, 1);

    let annotation: TransitionAnnotation = serde_json::from_str(&update.description).unwrap();
    assert_eq!(annotation.previous_host, "i-123");
    assert_eq!(annotation.instance_id, "i-123");
    assert_eq!(annotation.previous_description.as_deref(), Some("web tier"));
    assert!(!annotation.transitioned_at.is_empty());

    assert_eq!(inventory.host("55").unwrap().host_name, "ZDTP_i-123");
}

#[tokio::test]
async fn test_scenario_b_already_updated() {
    let cfg = config(false);
    let inventory = MemoryInventory::new(vec![host("55", "ZDTP_i-123")]);

    let outcome = Handler::new(&cfg, &inventory)
        .handle(&termination_envelope("i-123"))
        .await
        .unwrap();

    assert_eq!(outcome.message(), "host already updated");
    assert!(!inventory.has_mutations());
}

#[tokio::test]
async fn test_scenario_c_host_not_found() {
    let cfg = config(false);
    let inventory = MemoryInventory::new(vec![]);

    let outcome = Handler::new(&cfg, &inventory)
        .handle(&termination_envelope("i-123"))
        .await
        .unwrap();

    assert_eq!(outcome.message(), "host not found");
    assert!(!inventory.has_mutations());
}

#[tokio::test]
async fn test_scenario_d_ambiguous_match() {
    let cfg = config(false);
    let inventory = MemoryInventory::new(vec![host("55", "i-123"), host("56", "i-123-old")]);

    let err = Handler::new(&cfg, &inventory)
        .handle(&termination_envelope("i-123"))
        .await
        .unwrap_err();

    match &err {
        HandlerError::AmbiguousMatch { instance_id, count } => {
            assert_eq!(instance_id, "i-123");
            assert_eq!(*count, 2);
        }
        other => panic!("expected AmbiguousMatch, got {other:?}"),
    }
    assert!(err.to_string().contains("more than one hosts found"));
    assert!(!inventory.has_mutations());
}

#[tokio::test]
async fn test_replay_is_idempotent() {
    let cfg = config(false);
    let inventory = MemoryInventory::new(vec![host("55", "i-123")]);
    let handler = Handler::new(&cfg, &inventory);
    let envelope = termination_envelope("i-123");

    assert_eq!(handler.handle(&envelope).await.unwrap().message(), "i-123");
    assert_eq!(
        handler.handle(&envelope).await.unwrap().message(),
        "host already updated"
    );

    let updates = inventory
        .calls()
        .into_iter()
        .filter(RecordedCall::is_mutation)
        .count();
    assert_eq!(updates, 1);
}

#[tokio::test]
async fn test_delete_mode_deletes_once() {
    let cfg = config(true);
    let inventory = MemoryInventory::new(vec![host("55", "i-123")]);
    let handler = Handler::new(&cfg, &inventory);
    let envelope = termination_envelope("i-123");

    let outcome = handler.handle(&envelope).await.unwrap();
    assert_eq!(outcome.message(), "i-123");
    assert!(inventory.calls().contains(&RecordedCall::Delete("55".into())));
    assert!(!inventory
        .calls()
        .iter()
        .any(|c| matches!(c, RecordedCall::Update(_))));

    // The deleted host is gone; a replay is a benign not-found.
    assert_eq!(handler.handle(&envelope).await.unwrap().message(), "host not found");
    let deletes = inventory
        .calls()
        .into_iter()
        .filter(|c| matches!(c, RecordedCall::Delete(_)))
        .count();
    assert_eq!(deletes, 1);
}

#[tokio::test]
async fn test_parse_error_makes_no_calls() {
    let cfg = config(false);
    let inventory = MemoryInventory::new(vec![host("55", "i-123")]);
    let handler = Handler::new(&cfg, &inventory);

    let missing_id = SnsEnvelope::with_message(
        json!({"source": "aws.autoscaling", "detail": {"AutoScalingGroupName": "web"}}).to_string(),
    );
    let err = handler.handle(&missing_id).await.unwrap_err();
    assert!(matches!(err, HandlerError::Parse(EventError::MissingInstanceId)));

    let err = handler.handle(&SnsEnvelope::default()).await.unwrap_err();
    assert!(matches!(err, HandlerError::Parse(EventError::NoRecords)));

    let err = handler.handle_json("{not json").await.unwrap_err();
    assert!(matches!(err, HandlerError::Parse(EventError::Parse(_))));

    assert!(inventory.calls().is_empty());
}

#[tokio::test]
async fn test_auth_failure_is_resolution_error() {
    let cfg = config(false);
    let inventory = MemoryInventory::new(vec![host("55", "i-123")]).fail_auth();

    let err = Handler::new(&cfg, &inventory)
        .handle(&termination_envelope("i-123"))
        .await
        .unwrap_err();

    assert!(matches!(err, HandlerError::Resolution(ZabbixError::Auth(_))));
    assert_eq!(inventory.calls().len(), 1);
}

#[tokio::test]
async fn test_query_failure_is_resolution_error() {
    let cfg = config(false);
    let inventory = MemoryInventory::new(vec![host("55", "i-123")]).fail_find();

    let err = Handler::new(&cfg, &inventory)
        .handle(&termination_envelope("i-123"))
        .await
        .unwrap_err();

    assert!(matches!(err, HandlerError::Resolution(ZabbixError::Http { .. })));
    assert!(!inventory.has_mutations());
}

#[tokio::test]
async fn test_update_failure_is_transition_error() {
    let cfg = config(false);
    let inventory = MemoryInventory::new(vec![host("55", "i-123")]).fail_mutations();

    let err = Handler::new(&cfg, &inventory)
        .handle(&termination_envelope("i-123"))
        .await
        .unwrap_err();

    match err {
        HandlerError::Transition { host_id, source } => {
            assert_eq!(host_id, "55");
            assert!(matches!(source, ZabbixError::Rpc { .. }));
        }
        other => panic!("expected Transition error, got {other:?}"),
    }
    assert_eq!(inventory.host("55").unwrap().host_name, "i-123");
}
