//! Tests for value injection, parameter deletion, bypass rewiring, and
//! submission tagging.
mod common;
use common::*;
use serde_json::json;
use tenkai::prelude::*;

/// Resolves a template with a fixed token, bypassing the named controls.
fn resolve_with(
    template: &Graph,
    bypassed: &[&str],
    token: u64,
) -> std::result::Result<Graph, ResolveError> {
    let (controls, _, values) = controls_and_values(template);
    Rewriter::new().resolve_with_token(
        template,
        &controls,
        &values,
        |c| bypassed.contains(&c.name.as_str()),
        token,
    )
}

#[test]
fn test_injection_replaces_links_and_deletes_parameters() {
    let graph = create_simple_template();
    let resolved = resolve_with(&graph, &[], 42).expect("resolution succeeds");

    // Plain parameter slots are gone.
    assert!(!resolved.contains("10"));
    assert!(!resolved.contains("11"));

    // Their consumers now hold the resolved literals.
    let sampler = resolved.get("3").unwrap();
    assert_eq!(sampler.input_i64("steps"), Some(20));
    assert_eq!(sampler.input_f64("cfg"), Some(7.5));
    let encoder = resolved.get("4").unwrap();
    assert_eq!(encoder.input_str("text"), Some("a quiet harbor"));
}

#[test]
fn test_dynamic_slot_is_retained_with_its_value() {
    let graph = create_simple_template();
    let resolved = resolve_with(&graph, &[], 42).unwrap();

    let slot = resolved.get("12").expect("dynamic slot survives resolution");
    assert_eq!(slot.input_f64("default_value"), Some(7.5));
}

#[test]
fn test_resolved_graph_has_no_dangling_references() {
    let graph = create_simple_template();
    let resolved = resolve_with(&graph, &[], 42).unwrap();
    assert_eq!(resolved.find_dangling_reference(), None);
}

#[test]
fn test_resolution_is_idempotent() {
    let graph = create_simple_template();
    let first = resolve_with(&graph, &[], 42).unwrap();
    let second = resolve_with(&graph, &[], 42).unwrap();

    let first = serde_json::to_string(&first.to_value()).unwrap();
    let second = serde_json::to_string(&second.to_value()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_template_is_untouched_by_resolution() {
    let graph = create_simple_template();
    let before = serde_json::to_string(&graph.to_value()).unwrap();
    let _ = resolve_with(&graph, &[], 42).unwrap();
    let after = serde_json::to_string(&graph.to_value()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_missing_image_fails_before_submission() {
    let graph = create_image_template();
    let result = resolve_with(&graph, &[], 42);

    match result {
        Err(ResolveError::MissingRequiredImage { name }) => {
            assert_eq!(name, "Source Image");
        }
        other => panic!("expected MissingRequiredImage, got {other:?}"),
    }
}

#[test]
fn test_image_injection_fills_consumer_and_slot() {
    let graph = create_image_template();
    let controls = extract_controls(&graph).unwrap();
    let mut form = FormState::new();
    form.seed_defaults(&controls);
    form.set_value("Source Image", json!("input.png"));
    let values = resolve_values(&controls, &mut form, &mut rand::rng());

    let resolved = Rewriter::new()
        .resolve_with_token(&graph, &controls, &values, |_| false, 42)
        .unwrap();

    assert_eq!(resolved.get("5").unwrap().input_str("pixels"), Some("input.png"));
    let slot = resolved.get("13").expect("image slot survives resolution");
    assert_eq!(slot.input_str("image_filename"), Some("input.png"));
}

#[test]
fn test_simple_bypass_rewires_around_target() {
    let graph = create_bypass_template();
    let resolved = resolve_with(&graph, &["Upscale"], 42).unwrap();

    // The upscaler and its controlling slot are gone.
    assert!(!resolved.contains("2"));
    assert!(!resolved.contains("20"));

    // The decoder now reads the loader directly.
    let decoder = resolved.get("3").unwrap();
    assert_eq!(
        decoder.input("samples").and_then(FieldValue::as_link),
        Some(&EdgeRef::new("1", 0))
    );
    assert_eq!(resolved.find_dangling_reference(), None);
}

#[test]
fn test_bypass_off_keeps_target() {
    let graph = create_bypass_template();
    let resolved = resolve_with(&graph, &[], 42).unwrap();

    assert!(resolved.contains("2"));
    assert_eq!(resolved.get("2").unwrap().input_f64("scale_by"), Some(1.5));
}

#[test]
fn test_unsupported_fanout_skips_bypass() {
    let graph = create_fan_out_template();
    let resolved = resolve_with(&graph, &["Upscale"], 42).unwrap();

    // The skip leaves the target and the slot in place; the request is
    // dropped, not partially applied.
    assert!(resolved.contains("2"));
    assert!(resolved.contains("20"));
    assert_eq!(resolved.len(), graph.len());
    assert_eq!(resolved.get("20").unwrap().input_f64("default_value"), Some(1.5));
}

#[test]
fn test_two_upstream_sources_skip_bypass() {
    let graph = Graph::from_value(json!({
        "1": { "class_type": "CheckpointLoaderSimple", "inputs": {} },
        "5": { "class_type": "EmptyLatentImage", "inputs": {} },
        "2": {
            "class_type": "LatentBlend",
            "inputs": {
                "samples1": ["1", 0],
                "samples2": ["5", 0],
                "blend_factor": ["20", 0]
            }
        },
        "20": {
            "class_type": "TenkaiDynamicInput",
            "inputs": { "param_name": "Blend", "param_type": "FLOAT", "default_value": 0.5 }
        },
        "3": { "class_type": "VAEDecode", "inputs": { "samples": ["2", 0] } },
        "9": { "class_type": "TenkaiOutput", "inputs": { "image": ["3", 0] } }
    }))
    .unwrap();

    let resolved = resolve_with(&graph, &["Blend"], 42).unwrap();
    assert!(resolved.contains("2"));
    assert!(resolved.contains("20"));
    assert_eq!(resolved.len(), graph.len());
}

#[test]
fn test_dual_output_bypass_rewires_both_channels() {
    let graph = create_lora_template();
    let resolved = resolve_with(&graph, &["Lora Strength"], 42).unwrap();

    assert!(!resolved.contains("2"));
    assert!(!resolved.contains("20"));

    // Slot 0 readers follow the model channel, slot 1 readers the clip.
    let sampler = resolved.get("3").unwrap();
    assert_eq!(
        sampler.input("model").and_then(FieldValue::as_link),
        Some(&EdgeRef::new("1", 0))
    );
    let encoder = resolved.get("4").unwrap();
    assert_eq!(
        encoder.input("clip").and_then(FieldValue::as_link),
        Some(&EdgeRef::new("1", 1))
    );
    assert_eq!(resolved.find_dangling_reference(), None);
}

#[test]
fn test_sink_gets_token_and_field_rename() {
    let graph = create_simple_template();
    let resolved = resolve_with(&graph, &[], 42).unwrap();

    let sink = resolved.get("9").unwrap();

    // The `image` field is renamed for the backend.
    assert!(sink.input("image").is_none());
    assert_eq!(
        sink.input("images").and_then(FieldValue::as_link),
        Some(&EdgeRef::new("3", 0))
    );
    assert_eq!(sink.input_str("filename_prefix"), Some("tenkai"));

    // The submission token lands in the sink's metadata field.
    let info = match sink.input("extra_pnginfo") {
        Some(FieldValue::Literal(serde_json::Value::Object(map))) => map,
        other => panic!("expected metadata object, got {other:?}"),
    };
    assert_eq!(info.get("tenkai_unique_id"), Some(&json!(42)));
}

#[test]
fn test_custom_bypass_rule() {
    let graph = Graph::from_value(json!({
        "1": { "class_type": "SourcePair", "inputs": {} },
        "2": {
            "class_type": "DualFilter",
            "inputs": {
                "left": ["1", 0],
                "right": ["1", 1],
                "amount": ["20", 0]
            }
        },
        "20": {
            "class_type": "TenkaiDynamicInput",
            "inputs": { "param_name": "Filter", "param_type": "FLOAT", "default_value": 0.5 }
        },
        "3": { "class_type": "Collector", "inputs": { "a": ["2", 0], "b": ["2", 1] } },
        "9": { "class_type": "TenkaiOutput", "inputs": { "image": ["3", 0] } }
    }))
    .unwrap();

    let (controls, _, values) = controls_and_values(&graph);
    let rewriter = Rewriter::new()
        .with_bypass_rule("DualFilter", BypassRule::new([(0, "left"), (1, "right")]));
    let resolved = rewriter
        .resolve_with_token(&graph, &controls, &values, |c| c.name == "Filter", 42)
        .unwrap();

    assert!(!resolved.contains("2"));
    let collector = resolved.get("3").unwrap();
    assert_eq!(
        collector.input("a").and_then(FieldValue::as_link),
        Some(&EdgeRef::new("1", 0))
    );
    assert_eq!(
        collector.input("b").and_then(FieldValue::as_link),
        Some(&EdgeRef::new("1", 1))
    );
}
