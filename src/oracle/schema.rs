//! Strict JSON schemas for structured oracle output.

use serde_json::{json, Value};

fn nullable(schema: Value) -> Value {
    json!({ "anyOf": [schema, { "type": "null" }] })
}

pub fn exercise_batch() -> Value {
    let pair = json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["term", "definition"],
        "properties": {
            "term": { "type": "string" },
            "definition": { "type": "string" }
        }
    });
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["exercises"],
        "properties": {
            "exercises": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["id", "type", "question", "answer", "options", "pairs"],
                    "properties": {
                        "id": { "type": "integer" },
                        "type": {
                            "type": "string",
                            "enum": ["multiple_choice", "fill_in_blank", "matching"]
                        },
                        "question": { "type": "string" },
                        "answer": nullable(json!({ "type": "string" })),
                        "options": nullable(json!({ "type": "array", "items": { "type": "string" } })),
                        "pairs": nullable(json!({ "type": "array", "items": pair }))
                    }
                }
            }
        }
    })
}

pub fn validation_batch() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["results"],
        "properties": {
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["is_valid", "reason"],
                    "properties": {
                        "is_valid": { "type": "boolean" },
                        "reason": nullable(json!({ "type": "string" }))
                    }
                }
            }
        }
    })
}

pub fn answer_verdict() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["is_correct", "feedback"],
        "properties": {
            "is_correct": { "type": "boolean" },
            "feedback": { "type": "string" }
        }
    })
}

pub fn session_feedback() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["summary", "recommendations"],
        "properties": {
            "summary": { "type": "string" },
            "recommendations": { "type": "string" }
        }
    })
}
