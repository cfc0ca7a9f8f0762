//! Parse model output against the structured-output contract
//!
//! The contract is a JSON object with a non-empty `tariffs` array of
//! objects. Code fences and prose around the object are tolerated.

use serde_json::Value;

/// Parse raw model output into a document, or describe why it does not fit
pub fn parse_model_output(response: &str) -> Result<Value, String> {
    let json_str = extract_json(response)?;

    let value: Value =
        serde_json::from_str(json_str).map_err(|e| format!("output is not valid JSON: {}", e))?;

    let Value::Object(root) = &value else {
        return Err("expected a JSON object at the top level".to_string());
    };
    let Some(tariffs) = root.get("tariffs") else {
        return Err("the object has no \"tariffs\" array".to_string());
    };
    let Some(tariffs) = tariffs.as_array() else {
        return Err("\"tariffs\" must be an array".to_string());
    };
    if tariffs.is_empty() {
        return Err("\"tariffs\" is empty; at least one tariff is required".to_string());
    }
    if let Some(i) = tariffs.iter().position(|t| !t.is_object()) {
        return Err(format!("tariffs[{}] is not an object", i));
    }
    Ok(value)
}

/// Slice the JSON object out of a response, handling code fences and prose
fn extract_json(response: &str) -> Result<&str, String> {
    let mut text = response.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // skip the language tag line
        let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        text = body.trim_end().strip_suffix("```").unwrap_or(body).trim();
    }

    if text.is_empty() {
        return Err("output is empty".to_string());
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err("no JSON object found in output".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_object() {
        let value = parse_model_output(r#"{"tariffs": [{"name": "Enkeltariff"}]}"#).unwrap();
        assert_eq!(value["tariffs"][0]["name"], "Enkeltariff");
    }

    #[test]
    fn test_parse_with_markdown_wrapper() {
        let response = "```json\n{\"tariffs\": [{\"name\": \"Tidstariff\"}]}\n```";
        let value = parse_model_output(response).unwrap();
        assert_eq!(value["tariffs"][0]["name"], "Tidstariff");
    }

    #[test]
    fn test_parse_with_surrounding_prose() {
        let response = "Här är resultatet:\n{\"tariffs\": [{\"name\": \"Effekttariff\"}]}\nHoppas det hjälper!";
        assert!(parse_model_output(response).is_ok());
    }

    #[test]
    fn test_contract_violations() {
        assert!(parse_model_output("This is not JSON").is_err());
        assert!(parse_model_output("").unwrap_err().contains("empty"));
        assert!(parse_model_output(r#"{"tariff": {}}"#).unwrap_err().contains("no \"tariffs\""));
        assert!(parse_model_output(r#"{"tariffs": []}"#).unwrap_err().contains("empty"));
        assert!(parse_model_output(r#"{"tariffs": [1]}"#).unwrap_err().contains("tariffs[0]"));
        assert!(parse_model_output(r#"{"tariffs": [{"name": "x"}"#).is_err());
    }

    #[test]
    fn test_extract_json_from_markdown_without_language() {
        let response = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json(response).unwrap(), r#"{"key": "value"}"#);
    }
}
