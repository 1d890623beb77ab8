//! Minimal JSON-schema-shaped argument validation: each [`ToolDescriptor`]
//! carries a `parameters` object of the form
//! `{"type": "object", "required": [...], "properties": {"name": {"type": "string"}}}`.
//! We only check presence and the handful of primitive types the registered
//! tools actually use — this is not a general JSON-schema implementation.

use serde_json::Value;
use tg_domain::tool::ToolDescriptor;

pub fn validate_arguments(descriptor: &ToolDescriptor, arguments: &Value) -> Result<(), String> {
    let Some(schema) = descriptor.parameters.as_object() else {
        return Ok(());
    };

    let args = arguments
        .as_object()
        .ok_or_else(|| "arguments must be a JSON object".to_string())?;

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required {
            let Some(name) = field.as_str() else { continue };
            if !args.contains_key(name) {
                return Err(format!("missing required field \"{name}\""));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, value) in args {
            let Some(prop_schema) = properties.get(name) else {
                continue;
            };
            if let Some(expected_type) = prop_schema.get("type").and_then(Value::as_str) {
                if !matches_type(value, expected_type) {
                    return Err(format!(
                        "field \"{name}\" must be of type \"{expected_type}\", got {value}"
                    ));
                }
            }

            if let Some(allowed) = prop_schema.get("enum").and_then(Value::as_array) {
                if !allowed.iter().any(|a| a == value) {
                    return Err(format!(
                        "field \"{name}\" must be one of {allowed:?}, got {value}"
                    ));
                }
            }

            if let Some(n) = value.as_f64() {
                if let Some(min) = prop_schema.get("minimum").and_then(Value::as_f64) {
                    if n < min {
                        return Err(format!("field \"{name}\" must be >= {min}, got {n}"));
                    }
                }
                if let Some(max) = prop_schema.get("maximum").and_then(Value::as_f64) {
                    if n > max {
                        return Err(format!("field \"{name}\" must be <= {max}, got {n}"));
                    }
                }
            }
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor() -> ToolDescriptor {
        ToolDescriptor {
            name: "ping_host".into(),
            description: "ping a host".into(),
            parameters: json!({
                "type": "object",
                "required": ["host"],
                "properties": {
                    "host": {"type": "string"},
                    "count": {"type": "integer"},
                },
            }),
        }
    }

    #[test]
    fn accepts_valid_arguments() {
        let d = descriptor();
        assert!(validate_arguments(&d, &json!({"host": "example.com"})).is_ok());
    }

    #[test]
    fn rejects_missing_required_field() {
        let d = descriptor();
        let err = validate_arguments(&d, &json!({"count": 3})).unwrap_err();
        assert!(err.contains("host"));
    }

    #[test]
    fn rejects_wrong_type() {
        let d = descriptor();
        let err = validate_arguments(&d, &json!({"host": 123})).unwrap_err();
        assert!(err.contains("string"));
    }

    #[test]
    fn rejects_non_object_arguments() {
        let d = descriptor();
        assert!(validate_arguments(&d, &json!([1, 2, 3])).is_err());
    }

    fn brightness_descriptor() -> ToolDescriptor {
        ToolDescriptor {
            name: "ha_control_light".into(),
            description: "".into(),
            parameters: json!({
                "type": "object",
                "required": ["action"],
                "properties": {
                    "action": {"type": "string", "enum": ["turn_on", "turn_off", "toggle"]},
                    "brightness": {"type": "integer", "minimum": 0, "maximum": 255},
                },
            }),
        }
    }

    #[test]
    fn accepts_boundary_brightness_values() {
        let d = brightness_descriptor();
        assert!(validate_arguments(&d, &json!({"action": "turn_on", "brightness": 0})).is_ok());
        assert!(validate_arguments(&d, &json!({"action": "turn_on", "brightness": 255})).is_ok());
    }

    #[test]
    fn rejects_out_of_range_brightness() {
        let d = brightness_descriptor();
        assert!(validate_arguments(&d, &json!({"action": "turn_on", "brightness": -1})).is_err());
        assert!(validate_arguments(&d, &json!({"action": "turn_on", "brightness": 256})).is_err());
    }

    #[test]
    fn rejects_action_outside_enum() {
        let d = brightness_descriptor();
        let err = validate_arguments(&d, &json!({"action": "dim"})).unwrap_err();
        assert!(err.contains("action"));
    }
}
