//! Payloads shared by the integration tests

#![allow(dead_code)]

use serde_json::{json, Value};

/// A 10 KB buffer with a JPEG/JFIF header; enough for format sniffing.
pub fn jpeg_bytes() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
    bytes.resize(10 * 1024, 0);
    bytes
}

pub fn step(id: i64, name: &str, status: &str) -> Value {
    json!({
        "step_id": id,
        "name": name,
        "description": format!("{name} check"),
        "status": status,
        "confidence": 0.8,
        "details": {"checked": true},
        "timestamp": "2025-03-01T12:00:00Z"
    })
}

pub fn job(id: &str, status: &str, steps: Vec<Value>) -> Value {
    json!({
        "verification_id": id,
        "status": status,
        "steps": steps,
    })
}

pub fn needs_info_job(id: &str, message: &str) -> Value {
    json!({
        "verification_id": id,
        "status": "needs_info",
        "steps": [step(1, "Document classification", "completed")],
        "needs_info": {"message": message, "fields": ["ssn"]},
    })
}

pub fn completed_job(id: &str, confidence: f64) -> Value {
    json!({
        "verification_id": id,
        "status": "completed",
        "document_type": "passport",
        "confidence": confidence,
        "result_summary": "Document appears genuine",
        "steps": [
            step(1, "Document classification", "completed"),
            step(2, "Identity cross-check", "completed"),
        ],
    })
}

pub fn model(sk: &str, value: &str, active: bool) -> Value {
    json!({
        "pk": "MODEL_IDS",
        "sk": sk,
        "value": value,
        "description": format!("{sk} model"),
        "is_active": active,
    })
}

pub fn param(sk: &str, value: &str) -> Value {
    json!({"pk": "INFERENCE_PARAMS", "sk": sk, "value": value})
}

pub fn prompt(pk: &str, role: &str) -> Value {
    json!({
        "pk": pk,
        "role": role,
        "tasks": "Inspect the document for tampering",
        "is_active": false,
    })
}
