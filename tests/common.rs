//! Common test utilities for building template graphs and resolving them.
use tenkai::prelude::*;

/// Creates a simple, valid template with all three scalar parameter shapes.
///
/// Layout: two plain parameters ("Prompt" at priority 1, "Steps" at
/// priority 2) feed a text encoder and a sampler, and a randomizable
/// dynamic input ("CFG" at priority 3) feeds the sampler. The sink reads
/// the sampler's output through its `image` field.
#[allow(dead_code)]
pub fn create_simple_template() -> Graph {
    Graph::from_value(serde_json::json!({
        "1": {
            "class_type": "CheckpointLoaderSimple",
            "inputs": { "ckpt_name": "base.safetensors" }
        },
        "10": {
            "class_type": "TenkaiParameter",
            "inputs": {
                "title": "Steps",
                "type": "INT",
                "default": 20,
                "min": 1,
                "max": 100,
                "priority": 2
            }
        },
        "11": {
            "class_type": "TenkaiParameter",
            "inputs": {
                "title": "Prompt",
                "type": "STRING",
                "default": "a quiet harbor",
                "priority": 1
            }
        },
        "12": {
            "class_type": "TenkaiDynamicInput",
            "inputs": {
                "param_name": "CFG",
                "param_type": "FLOAT",
                "default_value": 7.5,
                "min_value": 1.0,
                "max_value": 30.0,
                "step": 0.5,
                "priority": 3,
                "add_randomize_toggle": true
            }
        },
        "3": {
            "class_type": "KSampler",
            "inputs": {
                "model": ["1", 0],
                "positive": ["4", 0],
                "steps": ["10", 0],
                "cfg": ["12", 0]
            },
            "_meta": { "title": "Sampler" }
        },
        "4": {
            "class_type": "CLIPTextEncode",
            "inputs": {
                "clip": ["1", 1],
                "text": ["11", 0]
            }
        },
        "9": {
            "class_type": "TenkaiOutput",
            "inputs": {
                "image": ["3", 0],
                "filename_prefix": "tenkai"
            }
        }
    }))
    .expect("simple template must parse")
}

/// Creates a template whose only parameter is an image input feeding an
/// encoder node.
#[allow(dead_code)]
pub fn create_image_template() -> Graph {
    Graph::from_value(serde_json::json!({
        "13": {
            "class_type": "TenkaiImageInput",
            "inputs": { "param_name": "Source Image", "priority": 1 }
        },
        "5": {
            "class_type": "VAEEncode",
            "inputs": { "pixels": ["13", 0] }
        },
        "9": {
            "class_type": "TenkaiOutput",
            "inputs": { "image": ["5", 0] }
        }
    }))
    .expect("image template must parse")
}

/// Creates a template with the simple bypass topology: one dynamic input
/// ("Upscale") feeds an upscaler that sits between a loader and a decoder,
/// with exactly one upstream source and one downstream reader.
#[allow(dead_code)]
pub fn create_bypass_template() -> Graph {
    Graph::from_value(serde_json::json!({
        "1": {
            "class_type": "CheckpointLoaderSimple",
            "inputs": {}
        },
        "2": {
            "class_type": "LatentUpscale",
            "inputs": {
                "samples": ["1", 0],
                "scale_by": ["20", 0]
            }
        },
        "20": {
            "class_type": "TenkaiDynamicInput",
            "inputs": {
                "param_name": "Upscale",
                "param_type": "FLOAT",
                "default_value": 1.5
            }
        },
        "3": {
            "class_type": "VAEDecode",
            "inputs": { "samples": ["2", 0] }
        },
        "9": {
            "class_type": "TenkaiOutput",
            "inputs": { "image": ["3", 0] }
        }
    }))
    .expect("bypass template must parse")
}

/// As [`create_bypass_template`], but with a second reader of the
/// upscaler's output, making the topology unsupported for the simple
/// bypass case.
#[allow(dead_code)]
pub fn create_fan_out_template() -> Graph {
    Graph::from_value(serde_json::json!({
        "1": {
            "class_type": "CheckpointLoaderSimple",
            "inputs": {}
        },
        "2": {
            "class_type": "LatentUpscale",
            "inputs": {
                "samples": ["1", 0],
                "scale_by": ["20", 0]
            }
        },
        "20": {
            "class_type": "TenkaiDynamicInput",
            "inputs": {
                "param_name": "Upscale",
                "param_type": "FLOAT",
                "default_value": 1.5
            }
        },
        "3": {
            "class_type": "VAEDecode",
            "inputs": { "samples": ["2", 0] }
        },
        "4": {
            "class_type": "VAEDecode",
            "inputs": { "samples": ["2", 0] }
        },
        "9": {
            "class_type": "TenkaiOutput",
            "inputs": { "image": ["3", 0] }
        }
    }))
    .expect("fan-out template must parse")
}

/// Creates a template with a dual-output loader: a LoraLoader whose model
/// output (slot 0) feeds a sampler and whose clip output (slot 1) feeds a
/// text encoder, controlled by a bypassable dynamic input.
#[allow(dead_code)]
pub fn create_lora_template() -> Graph {
    Graph::from_value(serde_json::json!({
        "1": {
            "class_type": "CheckpointLoaderSimple",
            "inputs": {}
        },
        "2": {
            "class_type": "LoraLoader",
            "inputs": {
                "model": ["1", 0],
                "clip": ["1", 1],
                "lora_name": "detail.safetensors",
                "strength_model": ["20", 0]
            }
        },
        "20": {
            "class_type": "TenkaiDynamicInput",
            "inputs": {
                "param_name": "Lora Strength",
                "param_type": "FLOAT",
                "default_value": 1.0
            }
        },
        "3": {
            "class_type": "KSampler",
            "inputs": { "model": ["2", 0] }
        },
        "4": {
            "class_type": "CLIPTextEncode",
            "inputs": {
                "clip": ["2", 1],
                "text": "hi"
            }
        },
        "9": {
            "class_type": "TenkaiOutput",
            "inputs": { "image": ["3", 0] }
        }
    }))
    .expect("lora template must parse")
}

/// Extracts the controls of a template and resolves them against a fresh
/// default-seeded form. Randomization stays off, so the result is
/// deterministic.
#[allow(dead_code)]
pub fn controls_and_values(template: &Graph) -> (Vec<ControlDescriptor>, FormState, ResolvedValues) {
    let controls = extract_controls(template).expect("template declares controls");
    let mut form = FormState::new();
    form.seed_defaults(&controls);
    let values = resolve_values(&controls, &mut form, &mut rand::rng());
    (controls, form, values)
}
