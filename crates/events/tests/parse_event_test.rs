//! Parsing real-shaped SNS deliveries into termination events.

use serde_json::json;

use asg_events::{parse_event, EventError, SnsEnvelope};

fn sns_event(message: &str) -> SnsEnvelope {
    let raw = json!({
        "Records": [{
            "EventSource": "aws:sns",
            "EventVersion": "1.0",
            "EventSubscriptionArn": "arn:aws:sns:eu-west-1:123456789012:asg-events:sub",
            "Sns": {
                "Type": "Notification",
                "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
                "TopicArn": "arn:aws:sns:eu-west-1:123456789012:asg-events",
                "Subject": "Auto Scaling: termination for group \"web\"",
                "Message": message,
                "Timestamp": "2024-03-01T10:00:01.000Z",
                "SignatureVersion": "1",
                "MessageAttributes": {}
            }
        }]
    });
    SnsEnvelope::from_json(&raw.to_string()).unwrap()
}

#[test]
fn test_wrapped_event_yields_instance_id() {
    let message = json!({
        "source": "aws.autoscaling",
        "detail-type": "EC2 Instance Terminate Successful",
        "account": "123456789012",
        "time": "2024-03-01T10:00:00Z",
        "region": "eu-west-1",
        "detail": {
            "EC2InstanceId": "i-123",
            "AutoScalingGroupName": "web",
            "Cause": "At 2024-03-01T09:59:00Z an instance was taken out of service",
            "StartTime": "2024-03-01T09:59:00Z",
            "EndTime": "2024-03-01T10:00:00Z",
            "StatusCode": "InProgress",
            "Description": "Terminating EC2 instance: i-123",
            "ActivityId": "ignored",
            "RequestId": "ignored"
        }
    })
    .to_string();

    let event = parse_event(&sns_event(&message)).unwrap();
    assert_eq!(event.instance_id, "i-123");
    assert_eq!(event.status_code.as_deref(), Some("InProgress"));
    assert_eq!(event.account.as_deref(), Some("123456789012"));
    assert_eq!(event.trigger.as_deref(), Some("EC2 Instance Terminate Successful"));
}

#[test]
fn test_flat_event_yields_instance_id() {
    let message = json!({
        "Progress": 50,
        "AccountId": "123456789012",
        "Description": "Terminating EC2 instance: i-0abc",
        "RequestId": "r-1",
        "EndTime": "2024-03-01T10:00:00Z",
        "AutoScalingGroupARN": "arn:aws:autoscaling:eu-west-1:123456789012:autoScalingGroup:x",
        "ActivityId": "a-1",
        "StartTime": "2024-03-01T09:59:00Z",
        "Service": "AWS Auto Scaling",
        "Time": "2024-03-01T10:00:00Z",
        "EC2InstanceId": "i-0abc",
        "StatusCode": "InProgress",
        "StatusMessage": "",
        "Details": {"Subnet ID": "subnet-1"},
        "AutoScalingGroupName": "web",
        "Cause": "scale in",
        "Event": "autoscaling:EC2_INSTANCE_TERMINATE"
    })
    .to_string();

    let event = parse_event(&sns_event(&message)).unwrap();
    assert_eq!(event.instance_id, "i-0abc");
    assert_eq!(event.autoscaling_group_name.as_deref(), Some("web"));
}

#[test]
fn test_wrapped_event_without_instance_id_fails() {
    let message = json!({
        "source": "aws.autoscaling",
        "detail-type": "EC2 Instance Terminate Successful",
        "detail": {"AutoScalingGroupName": "web"}
    })
    .to_string();

    let err = parse_event(&sns_event(&message)).unwrap_err();
    assert!(matches!(err, EventError::MissingInstanceId));
}

#[test]
fn test_flat_event_without_instance_id_fails() {
    let message = json!({
        "Event": "autoscaling:TEST_NOTIFICATION",
        "AutoScalingGroupName": "web"
    })
    .to_string();

    let err = parse_event(&sns_event(&message)).unwrap_err();
    assert!(matches!(err, EventError::MissingInstanceId));
}

#[test]
fn test_empty_records_fail() {
    let envelope = SnsEnvelope::from_json(r#"{"Records": []}"#).unwrap();
    assert!(matches!(parse_event(&envelope), Err(EventError::NoRecords)));
}
