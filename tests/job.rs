//! Tests for status event parsing and the job tracker state machine.
mod common;
use common::*;
use tenkai::prelude::*;

fn sample_job() -> Job {
    Job {
        correlation_id: "prompt-1".to_string(),
        session_id: "session-1".to_string(),
    }
}

#[test]
fn test_parses_known_status_events() {
    assert_eq!(
        StatusEvent::parse(r#"{"type":"progress","data":{"value":3,"max":20}}"#),
        Some(StatusEvent::Progress { value: 3, max: 20 })
    );
    assert_eq!(
        StatusEvent::parse(r#"{"type":"executing","data":{"node":"3"}}"#),
        Some(StatusEvent::Executing {
            node: Some("3".to_string())
        })
    );
    // A null node is the backend's end-of-execution marker.
    assert_eq!(
        StatusEvent::parse(r#"{"type":"executing","data":{"node":null}}"#),
        Some(StatusEvent::Executing { node: None })
    );
    assert_eq!(
        StatusEvent::parse(r#"{"type":"tenkai_image_ready","data":{"image_url":"/view?f=x.png"}}"#),
        Some(StatusEvent::ImageReady {
            url: "/view?f=x.png".to_string()
        })
    );
    assert_eq!(
        StatusEvent::parse(r#"{"type":"tenkai_video_ready","data":{"video_url":"/view?f=x.mp4"}}"#),
        Some(StatusEvent::VideoReady {
            url: "/view?f=x.mp4".to_string()
        })
    );
    assert_eq!(
        StatusEvent::parse(r#"{"type":"tenkai_prompt_done","data":{}}"#),
        Some(StatusEvent::Done)
    );
}

#[test]
fn test_ignores_unknown_and_malformed_messages() {
    assert_eq!(StatusEvent::parse(r#"{"type":"crystools.monitor","data":{}}"#), None);
    assert_eq!(StatusEvent::parse(r#"{"data":{"value":1}}"#), None);
    assert_eq!(StatusEvent::parse(r#"{"type":"progress","data":{"value":1}}"#), None);
    assert_eq!(StatusEvent::parse("not json"), None);
}

#[test]
fn test_begin_queues_the_job() {
    let mut tracker = JobTracker::new();
    assert_eq!(tracker.state(), JobState::Idle);
    assert!(!tracker.is_busy());

    tracker.begin(sample_job(), &create_simple_template());
    assert_eq!(tracker.state(), JobState::Queued);
    assert!(tracker.is_busy());
    assert_eq!(tracker.job().map(|j| j.correlation_id.as_str()), Some("prompt-1"));
}

#[test]
fn test_artifact_before_any_progress_completes() {
    let mut tracker = JobTracker::new();
    tracker.begin(sample_job(), &create_simple_template());

    tracker.apply(StatusEvent::ImageReady {
        url: "X".to_string(),
    });
    assert_eq!(tracker.state(), JobState::Completed);
    assert_eq!(tracker.artifact_url(), Some("X"));
    assert!(!tracker.is_busy());
}

#[test]
fn test_latest_progress_pair_wins() {
    let mut tracker = JobTracker::new();
    tracker.begin(sample_job(), &create_simple_template());

    tracker.apply(StatusEvent::Progress { value: 5, max: 20 });
    tracker.apply(StatusEvent::Progress { value: 3, max: 20 });
    assert_eq!(tracker.progress(), Some((3, 20)));
}

#[test]
fn test_executing_resolves_node_label() {
    let mut tracker = JobTracker::new();
    tracker.begin(sample_job(), &create_simple_template());

    // Node "3" carries a display title in the template's metadata.
    tracker.apply(StatusEvent::Executing {
        node: Some("3".to_string()),
    });
    assert_eq!(tracker.state(), JobState::Executing);
    assert_eq!(tracker.current_step(), Some("Sampler"));

    // An id absent from the template falls back to the raw id.
    tracker.apply(StatusEvent::Executing {
        node: Some("99".to_string()),
    });
    assert_eq!(tracker.current_step(), Some("99"));
}

#[test]
fn test_null_executing_marker_completes_the_job() {
    let mut tracker = JobTracker::new();
    tracker.begin(sample_job(), &create_simple_template());

    tracker.apply(StatusEvent::Executing {
        node: Some("3".to_string()),
    });
    tracker.apply(StatusEvent::Executing { node: None });

    assert_eq!(tracker.state(), JobState::Completed);
    assert_eq!(tracker.current_step(), None);
    assert!(!tracker.is_busy());
}

#[test]
fn test_null_executing_marker_does_not_reopen_completed_job() {
    let mut tracker = JobTracker::new();
    tracker.begin(sample_job(), &create_simple_template());

    tracker.apply(StatusEvent::ImageReady {
        url: "X".to_string(),
    });
    // The backend emits its end-of-execution marker after the artifact.
    tracker.apply(StatusEvent::Executing { node: None });

    assert_eq!(tracker.state(), JobState::Completed);
    assert!(!tracker.is_busy());
    assert_eq!(tracker.artifact_url(), Some("X"));
}

#[test]
fn test_done_without_artifact_keeps_previous_one() {
    let mut tracker = JobTracker::new();
    tracker.restore_artifact_url("/view?f=old.png");
    tracker.begin(sample_job(), &create_simple_template());

    tracker.apply(StatusEvent::Done);
    assert_eq!(tracker.state(), JobState::Completed);
    assert_eq!(tracker.artifact_url(), Some("/view?f=old.png"));
}

#[test]
fn test_completion_clears_progress_and_step() {
    let mut tracker = JobTracker::new();
    tracker.begin(sample_job(), &create_simple_template());

    tracker.apply(StatusEvent::Progress { value: 5, max: 20 });
    tracker.apply(StatusEvent::Executing {
        node: Some("3".to_string()),
    });
    tracker.apply(StatusEvent::Done);

    assert_eq!(tracker.progress(), None);
    assert_eq!(tracker.current_step(), None);
}

#[test]
fn test_events_without_an_active_job_are_dropped() {
    let mut tracker = JobTracker::new();

    tracker.apply(StatusEvent::Progress { value: 5, max: 20 });
    tracker.apply(StatusEvent::ImageReady {
        url: "X".to_string(),
    });

    assert_eq!(tracker.state(), JobState::Idle);
    assert_eq!(tracker.progress(), None);
    assert_eq!(tracker.artifact_url(), None);
}
