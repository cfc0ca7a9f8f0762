//! OpenAPI contract of the generated server
//!
//! Tariff objects come straight from the schema descriptor in published
//! mode, so the contract describes exactly what the validator accepts.

use crate::service::ServiceInfo;
use eltariff_domain::schema::SchemaMode;
use eltariff_domain::{SchemaDescriptor, TariffModel};
use serde_json::{json, Map, Value};

/// Base path every endpoint is served under
pub const BASE_PATH: &str = "/gridtariff/v0";

const REF_PREFIX: &str = "#/components/schemas/";

/// Build the OpenAPI 3.0.1 document
pub fn build_openapi(descriptor: &SchemaDescriptor, model: &TariffModel, info: &ServiceInfo) -> Result<Value, serde_json::Error> {
    let mut schemas = descriptor.component_schemas(SchemaMode::Published, REF_PREFIX);
    schemas.extend(response_schemas());

    Ok(json!({
        "openapi": "3.0.1",
        "info": {
            "title": format!("{} - Elnätstariff API", info.operator),
            "description": format!("Grid tariffs of {} in the RISE grid tariff format, schema version {}", info.operator, info.api_version),
            "version": info.api_version,
            "contact": {"name": info.operator},
        },
        "servers": [{"url": BASE_PATH, "description": "Grid Tariff API"}],
        "paths": {
            "/health": {
                // served outside the base path
                "servers": [{"url": "/"}],
                "get": {
                    "operationId": "getHealth",
                    "summary": "Liveness check",
                    "responses": {"200": json_response("Service is up", "HealthResponse", Some(json!({"status": "ok"})))},
                }
            },
            "/info": {
                "get": {
                    "operationId": "getInfo",
                    "summary": "API and operator information",
                    "responses": {"200": json_response("API information", "InfoResponse", Some(info.to_json()))},
                }
            },
            "/tariffs": {
                "get": {
                    "operationId": "listTariffs",
                    "summary": "All tariffs with their calendar patterns",
                    "responses": {"200": json_response("List of tariffs", "TariffsResponse", Some(model.to_value()?))},
                }
            },
            "/tariffs/{id}": {
                "get": {
                    "operationId": "getTariff",
                    "summary": "One tariff by id",
                    "parameters": [{
                        "name": "id",
                        "in": "path",
                        "required": true,
                        "schema": {"type": "string"},
                    }],
                    "responses": {
                        "200": json_response("Tariff details", "TariffResponse", None),
                        "404": json_response("Tariff not found", "ErrorResponse", None),
                    },
                }
            },
        },
        "components": {"schemas": Value::Object(schemas)},
    }))
}

fn json_response(description: &str, schema: &str, example: Option<Value>) -> Value {
    let mut media = Map::new();
    media.insert("schema".to_string(), schema_ref(schema));
    if let Some(example) = example {
        media.insert("example".to_string(), example);
    }
    json!({
        "description": description,
        "content": {"application/json": Value::Object(media)},
    })
}

fn schema_ref(name: &str) -> Value {
    json!({"$ref": format!("{}{}", REF_PREFIX, name)})
}

fn response_schemas() -> Map<String, Value> {
    let mut schemas = Map::new();
    schemas.insert(
        "InfoResponse".to_string(),
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "apiVersion": {"type": "string"},
                "implementationVersion": {"type": "string"},
                "lastUpdated": {"type": "string", "format": "date-time", "nullable": true},
                "operator": {"type": "string"},
                "operatorId": {"type": "string"},
                "timeZone": {"type": "string"},
            },
            "required": ["name", "apiVersion", "implementationVersion", "operator", "timeZone"],
        }),
    );
    schemas.insert(
        "TariffsResponse".to_string(),
        json!({
            "type": "object",
            "properties": {
                "tariffs": {"type": "array", "items": schema_ref("Tariff")},
                "calendarPatterns": {"type": "array", "items": schema_ref("CalendarPattern")},
            },
            "required": ["tariffs", "calendarPatterns"],
        }),
    );
    schemas.insert(
        "TariffResponse".to_string(),
        json!({
            "type": "object",
            "properties": {
                "tariff": schema_ref("Tariff"),
                "calendarPatterns": {"type": "array", "items": schema_ref("CalendarPattern")},
            },
            "required": ["tariff", "calendarPatterns"],
        }),
    );
    schemas.insert(
        "HealthResponse".to_string(),
        json!({
            "type": "object",
            "properties": {"status": {"type": "string"}},
            "required": ["status"],
        }),
    );
    schemas.insert(
        "ErrorResponse".to_string(),
        json!({
            "type": "object",
            "properties": {"error": {"type": "string"}},
            "required": ["error"],
        }),
    );
    schemas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_model;

    #[test]
    fn test_contract_embeds_descriptor_schemas() {
        let descriptor = SchemaDescriptor::current();
        let model = sample_model();
        let info = ServiceInfo::from_model(&model, descriptor);
        let doc = build_openapi(descriptor, &model, &info).unwrap();

        assert_eq!(doc["openapi"], "3.0.1");
        let schemas = doc["components"]["schemas"].as_object().unwrap();
        for object in descriptor.objects() {
            assert!(schemas.contains_key(object.name), "missing {}", object.name);
        }
        assert_eq!(
            schemas["Tariff"]["properties"]["fixedPrice"]["$ref"],
            "#/components/schemas/PriceElement"
        );
        assert!(schemas.contains_key("TariffsResponse"));
    }

    #[test]
    fn test_tariffs_example_is_the_document() {
        let descriptor = SchemaDescriptor::current();
        let model = sample_model();
        let info = ServiceInfo::from_model(&model, descriptor);
        let doc = build_openapi(descriptor, &model, &info).unwrap();

        let example = &doc["paths"]["/tariffs"]["get"]["responses"]["200"]["content"]["application/json"]["example"];
        assert_eq!(example, &model.to_value().unwrap());
        assert_eq!(doc["servers"][0]["url"], BASE_PATH);
    }

    #[test]
    fn test_every_served_route_is_in_the_contract() {
        let descriptor = SchemaDescriptor::current();
        let model = sample_model();
        let info = ServiceInfo::from_model(&model, descriptor);
        let doc = build_openapi(descriptor, &model, &info).unwrap();

        let paths: Vec<&String> = doc["paths"].as_object().unwrap().keys().collect();
        assert_eq!(paths, vec!["/health", "/info", "/tariffs", "/tariffs/{id}"]);
        assert_eq!(doc["paths"]["/health"]["servers"][0]["url"], "/");

        // supplied ids need not be UUIDs
        let id = &doc["paths"]["/tariffs/{id}"]["get"]["parameters"][0]["schema"];
        assert_eq!(id, &json!({"type": "string"}));
    }
}
