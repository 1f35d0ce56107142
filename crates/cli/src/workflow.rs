//! n8n workflow JSON generation.

use serde_json::{json, Value};

/// Placeholder for the API base URL in template request nodes.
const API_URL_PLACEHOLDER: &str = "={{$env.API_BASE_URL}}";
const HTTP_REQUEST_NODE: &str = "n8n-nodes-base.httpRequest";

/// Fill a workflow template: substitute the API base URL into every HTTP
/// request node and set `confidence_threshold` on the "modify" nodes.
pub fn apply_template(mut workflow: Value, api_url: &str, confidence: f64) -> Value {
    let nodes = workflow
        .get_mut("nodes")
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten();

    for node in nodes {
        if node.get("type").and_then(Value::as_str) != Some(HTTP_REQUEST_NODE) {
            continue;
        }
        let is_modify = node
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| name.to_lowercase().contains("modify"));
        let Some(params) = node.get_mut("parameters") else {
            continue;
        };

        if let Some(url) = params.get_mut("url") {
            if let Some(current) = url.as_str() {
                *url = Value::String(current.replace(API_URL_PLACEHOLDER, api_url));
            }
        }

        if is_modify {
            let query = params
                .pointer_mut("/options/queryParameters/parameters")
                .and_then(Value::as_array_mut);
            for param in query.into_iter().flatten() {
                if param.get("name").and_then(Value::as_str) == Some("confidence_threshold") {
                    param["value"] = Value::String(confidence.to_string());
                }
            }
        }
    }

    workflow
}

/// Webhook → text detection → response.
pub fn simple_detection_workflow(api_url: &str) -> Value {
    json!({
        "name": "Simple AI Detection",
        "nodes": [
            {
                "parameters": {"path": "detect-ai", "responseMode": "responseNode"},
                "id": "webhook",
                "name": "Webhook",
                "type": "n8n-nodes-base.webhook",
                "typeVersion": 1,
                "position": [250, 300]
            },
            {
                "parameters": {
                    "method": "POST",
                    "url": format!("{}/api/detect/text", api_url.trim_end_matches('/')),
                    "sendBody": true,
                    "specifyBody": "json",
                    "jsonBody": "={{ {\"text\": $json.text} }}"
                },
                "id": "detect",
                "name": "Detect AI",
                "type": HTTP_REQUEST_NODE,
                "typeVersion": 3,
                "position": [450, 300]
            },
            {
                "parameters": {"respondWith": "allIncomingItems"},
                "id": "respond",
                "name": "Respond",
                "type": "n8n-nodes-base.respondToWebhook",
                "typeVersion": 1,
                "position": [650, 300]
            }
        ],
        "connections": {
            "Webhook": {"main": [[{"node": "Detect AI", "type": "main", "index": 0}]]},
            "Detect AI": {"main": [[{"node": "Respond", "type": "main", "index": 0}]]}
        },
        "active": false,
        "settings": {}
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Value {
        json!({
            "name": "Deck pipeline",
            "nodes": [
                {
                    "name": "Detect PPTX",
                    "type": HTTP_REQUEST_NODE,
                    "parameters": {"url": "={{$env.API_BASE_URL}}/api/detect/pptx"}
                },
                {
                    "name": "Modify PPTX",
                    "type": HTTP_REQUEST_NODE,
                    "parameters": {
                        "url": "={{$env.API_BASE_URL}}/api/modify/pptx",
                        "options": {"queryParameters": {"parameters": [
                            {"name": "confidence_threshold", "value": "0.7"},
                            {"name": "font_name", "value": "Arial"}
                        ]}}
                    }
                },
                {
                    "name": "Modify note",
                    "type": "n8n-nodes-base.set",
                    "parameters": {"url": "={{$env.API_BASE_URL}}"}
                }
            ]
        })
    }

    #[test]
    fn test_template_urls_and_threshold() {
        let workflow = apply_template(template(), "https://api.test", 0.85);
        let nodes = workflow["nodes"].as_array().unwrap();

        assert_eq!(nodes[0]["parameters"]["url"], "https://api.test/api/detect/pptx");
        assert_eq!(nodes[1]["parameters"]["url"], "https://api.test/api/modify/pptx");

        let params = &nodes[1]["parameters"]["options"]["queryParameters"]["parameters"];
        assert_eq!(params[0]["value"], "0.85");
        assert_eq!(params[1]["value"], "Arial");

        // Only HTTP request nodes are touched
        assert_eq!(nodes[2]["parameters"]["url"], "={{$env.API_BASE_URL}}");
    }

    #[test]
    fn test_template_without_nodes() {
        let workflow = apply_template(json!({"name": "empty"}), "http://x", 0.7);
        assert_eq!(workflow, json!({"name": "empty"}));
    }

    #[test]
    fn test_simple_workflow_wiring() {
        let workflow = simple_detection_workflow("http://localhost:8000/");

        assert_eq!(
            workflow["nodes"][1]["parameters"]["url"],
            "http://localhost:8000/api/detect/text"
        );
        assert_eq!(
            workflow["connections"]["Webhook"]["main"][0][0]["node"],
            "Detect AI"
        );
        assert_eq!(workflow["active"], false);
    }
}
