//! Text templates of the generated package
//!
//! Placeholders are written `{{key}}` and filled in one pass; unknown keys
//! are left as they are.

use crate::openapi::BASE_PATH;
use crate::service::ServiceInfo;
use eltariff_domain::TariffModel;

/// Fill `{{key}}` placeholders
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match values.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Rust string literal for embedding text in generated code
fn rust_literal(text: &str) -> String {
    format!("{:?}", text)
}

/// `Cargo.toml` of the generated server
pub fn cargo_toml(info: &ServiceInfo) -> String {
    fill(
        CARGO_TOML,
        &[
            ("service_name", &info.service_name),
            ("implementation_version", &info.implementation_version),
        ],
    )
}

/// `src/main.rs` of the generated server
pub fn main_rs(info: &ServiceInfo) -> String {
    let last_updated = match &info.last_updated {
        Some(ts) => format!("Some({})", rust_literal(ts)),
        None => "None".to_string(),
    };
    fill(
        MAIN_RS,
        &[
            ("title", &info.name),
            ("base_path", BASE_PATH),
            ("name", &rust_literal(&info.name)),
            ("api_version", &rust_literal(&info.api_version)),
            ("implementation_version", &rust_literal(&info.implementation_version)),
            ("operator", &rust_literal(&info.operator)),
            ("operator_id", &rust_literal(&info.operator_id)),
            ("time_zone", &rust_literal(&info.time_zone)),
            ("last_updated", &last_updated),
        ],
    )
}

/// `Dockerfile` building and running the server
///
/// The image is labelled with the schema version and the ids of the tariffs
/// it serves.
pub fn dockerfile(info: &ServiceInfo, model: &TariffModel) -> String {
    let tariff_ids = model
        .tariffs
        .iter()
        .map(|t| t.id.as_str())
        .collect::<Vec<_>>()
        .join(",");
    fill(
        DOCKERFILE,
        &[
            ("service_name", &info.service_name),
            ("title", &rust_literal(&info.name)),
            ("implementation_version", &rust_literal(&info.implementation_version)),
            ("api_version", &rust_literal(&info.api_version)),
            ("tariff_ids", &rust_literal(&tariff_ids)),
        ],
    )
}

/// `docker-compose.yml` for local deployment
pub fn docker_compose(info: &ServiceInfo) -> String {
    fill(
        DOCKER_COMPOSE,
        &[
            ("service_name", &info.service_name),
            ("implementation_version", &info.implementation_version),
        ],
    )
}

/// `README.md` with endpoints and deployment steps
pub fn readme(info: &ServiceInfo, model: &TariffModel) -> String {
    let tariff_rows: String = model
        .tariffs
        .iter()
        .map(|t| format!("| {} | `{}` | {} |\n", t.name, t.id, t.valid_period.from_including))
        .collect();
    fill(
        README,
        &[
            ("operator", &info.operator),
            ("operator_id", &info.operator_id),
            ("api_version", &info.api_version),
            ("service_name", &info.service_name),
            ("base_path", BASE_PATH),
            ("tariff_rows", &tariff_rows),
        ],
    )
}

const CARGO_TOML: &str = r#"[package]
name = "{{service_name}}"
version = "{{implementation_version}}"
edition = "2021"
publish = false

[dependencies]
axum = "0.8"
serde_json = "1.0"
tokio = { version = "1", features = ["macros", "rt-multi-thread", "net"] }

[workspace]
"#;

const MAIN_RS: &str = r#"//! {{title}}
//!
//! Generated by eltariff. Serves the embedded tariff document unchanged.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

const TARIFFS_JSON: &str = include_str!("../tariffs.json");

const NAME: &str = {{name}};
const API_VERSION: &str = {{api_version}};
const IMPLEMENTATION_VERSION: &str = {{implementation_version}};
const OPERATOR: &str = {{operator}};
const OPERATOR_ID: &str = {{operator_id}};
const TIME_ZONE: &str = {{time_zone}};
const LAST_UPDATED: Option<&str> = {{last_updated}};

type Document = Arc<Value>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let document: Document = Arc::new(serde_json::from_str(TARIFFS_JSON)?);
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("{} listening on {}", NAME, addr);
    axum::serve(listener, router(document)).await?;
    Ok(())
}

fn router(document: Document) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("{{base_path}}/info", get(info))
        .route("{{base_path}}/tariffs", get(tariffs))
        .route("{{base_path}}/tariffs/{id}", get(tariff))
        .with_state(document)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn info() -> Json<Value> {
    Json(json!({
        "name": NAME,
        "apiVersion": API_VERSION,
        "implementationVersion": IMPLEMENTATION_VERSION,
        "lastUpdated": LAST_UPDATED,
        "operator": OPERATOR,
        "operatorId": OPERATOR_ID,
        "timeZone": TIME_ZONE,
    }))
}

async fn tariffs(State(document): State<Document>) -> Json<Value> {
    Json(json!({
        "tariffs": document["tariffs"],
        "calendarPatterns": document["calendarPatterns"],
    }))
}

async fn tariff(State(document): State<Document>, Path(id): Path<String>) -> Response {
    let found = document["tariffs"]
        .as_array()
        .and_then(|tariffs| tariffs.iter().find(|t| t["id"] == id.as_str()));
    match found {
        Some(tariff) => Json(json!({
            "tariff": tariff,
            "calendarPatterns": document["calendarPatterns"],
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("tariff {} not found", id)})),
        )
            .into_response(),
    }
}
"#;

const DOCKERFILE: &str = r#"FROM rust:1.88-slim AS build
WORKDIR /app
COPY Cargo.toml tariffs.json ./
COPY src ./src
RUN cargo build --release

FROM debian:bookworm-slim
LABEL org.opencontainers.image.title={{title}}
LABEL org.opencontainers.image.version={{implementation_version}}
LABEL se.eltariff.schema-version={{api_version}}
LABEL se.eltariff.tariff-ids={{tariff_ids}}
COPY --from=build /app/target/release/{{service_name}} /usr/local/bin/tariff-api
ENV BIND_ADDR=0.0.0.0:8000
EXPOSE 8000
CMD ["tariff-api"]
"#;

const DOCKER_COMPOSE: &str = r#"services:
  {{service_name}}:
    build: .
    image: {{service_name}}:{{implementation_version}}
    ports:
      - "8000:8000"
    environment:
      BIND_ADDR: "0.0.0.0:8000"
    restart: unless-stopped
"#;

const README: &str = r#"# {{operator}} grid tariff API

Grid tariffs of {{operator}} ({{operator_id}}) in the RISE grid tariff
format, schema version {{api_version}}.

## Tariffs

| Name | Id | Valid from |
|------|----|------------|
{{tariff_rows}}
## Endpoints

- `GET {{base_path}}/info`
- `GET {{base_path}}/tariffs`
- `GET {{base_path}}/tariffs/{id}` (404 for an unknown id)
- `GET /health`

The contract is in `openapi.json`; the served document is `tariffs.json`.

## Running

```sh
docker compose up --build
curl http://localhost:8000{{base_path}}/tariffs
```

Without Docker:

```sh
cargo run --release
```

The listen address defaults to `0.0.0.0:8000`; set `BIND_ADDR` to change it.
The container is named `{{service_name}}`.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_placeholders() {
        let out = fill("a {{x}} b {{y}} {{unknown}} {{x}}", &[("x", "1"), ("y", "{{x}}")]);
        assert_eq!(out, "a 1 b {{x}} {{unknown}} 1");
        assert_eq!(fill("open {{ end", &[]), "open {{ end");
    }

    #[test]
    fn test_rust_literal_escapes() {
        assert_eq!(rust_literal(r#"Nät "AB""#), r#""Nät \"AB\"""#);
    }
}
