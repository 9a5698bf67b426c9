use crate::error::Result;
use crate::extractor::{HttpMethod, RequestRecord};
use crate::serializer::to_canonical_json;
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Postman collection format identifier
pub const COLLECTION_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// Collection name used when none is configured
pub const DEFAULT_COLLECTION_NAME: &str = "Reap API Tools (Generated)";

/// Environment template name used when none is configured
pub const DEFAULT_ENVIRONMENT_NAME: &str = "Reap API (Template)";

/// URL prefix that is decomposed into host and path segments
pub const BASE_URL_PLACEHOLDER: &str = "{{API_BASE_URL}}";

const EXPORTED_USING: &str = "generate_postman_schema";

/// Variables declared by both documents, all empty by default
const DEFAULT_VARIABLES: [&str; 4] = [
    "API_BASE_URL",
    "API_KEY",
    "ACCEPT_VERSION",
    "WEBHOOK_SUBSCRIBE_URL",
];

/// Headers attached to every request, whatever its method
const CONSISTENT_HEADERS: [(&str, &str); 4] = [
    ("x-reap-api-key", "{{API_KEY}}"),
    ("Accept-Version", "{{ACCEPT_VERSION}}"),
    ("Content-Type", "application/json"),
    ("accept", "application/json"),
];

/// Postman collection builder
pub struct CollectionBuilder {
    /// Collection display name
    name: String,
    /// Environment template display name
    environment_name: String,
    /// Directory that item names are made relative to
    base_dir: PathBuf,
    /// Records in arrival order
    records: Vec<RequestRecord>,
}

/// A `key`/`value` pair, used for variables and headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Collection info section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub name: String,
    pub schema: String,
}

/// Complete Postman collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDocument {
    pub info: Info,
    /// Declared collection variables
    pub variable: Vec<KeyValue>,
    /// Request items in canonical order
    pub item: Vec<Item>,
}

/// One request entry of the collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// `<METHOD> <url> (<relative source path>)`
    pub name: String,
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: HttpMethod,
    pub header: Vec<KeyValue>,
    pub url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

/// Request URL. `host` and `path` are only present for URLs under the base URL variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Url {
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

/// Raw JSON request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub mode: String,
    pub raw: String,
    pub options: BodyOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyOptions {
    pub raw: RawOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOptions {
    pub language: String,
}

/// Postman environment template.
///
/// Unlike the collection, this document is not reproducible: it records the time it was
/// generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentTemplateDocument {
    pub name: String,
    pub values: Vec<EnvironmentValue>,
    #[serde(rename = "_postman_variable_scope")]
    pub variable_scope: String,
    #[serde(rename = "_postman_exported_at")]
    pub exported_at: String,
    #[serde(rename = "_postman_exported_using")]
    pub exported_using: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentValue {
    pub key: String,
    pub value: String,
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: String,
}

impl CollectionBuilder {
    /// Create a new CollectionBuilder with default names, relative to the current directory
    pub fn new() -> Self {
        debug!("Initializing CollectionBuilder");
        Self {
            name: DEFAULT_COLLECTION_NAME.to_string(),
            environment_name: DEFAULT_ENVIRONMENT_NAME.to_string(),
            base_dir: PathBuf::from("."),
            records: Vec::new(),
        }
    }

    /// Set the collection display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the environment template display name
    pub fn with_environment_name(mut self, name: impl Into<String>) -> Self {
        self.environment_name = name.into();
        self
    }

    /// Set the directory that source paths in item names are made relative to
    pub fn with_base_dir(mut self, base_dir: PathBuf) -> Self {
        self.base_dir = base_dir;
        self
    }

    /// Add a request record to the collection
    pub fn add_record(&mut self, record: RequestRecord) {
        debug!("Adding request: {} {}", record.method, record.url_template);
        self.records.push(record);
    }

    /// Add many request records at once
    pub fn add_records(&mut self, records: impl IntoIterator<Item = RequestRecord>) {
        for record in records {
            self.add_record(record);
        }
    }

    /// Build the collection document.
    ///
    /// Items are ordered by URL template, then method, then source path, so the result does
    /// not depend on the order records were added in.
    pub fn build_collection(&self) -> Result<CollectionDocument> {
        debug!("Building collection with {} requests", self.records.len());

        let mut sorted: Vec<&RequestRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| compare_records(a, b));

        let item = sorted
            .into_iter()
            .map(|record| self.build_item(record))
            .collect::<Result<Vec<_>>>()?;

        Ok(CollectionDocument {
            info: Info {
                name: self.name.clone(),
                schema: COLLECTION_SCHEMA.to_string(),
            },
            variable: default_variables(),
            item,
        })
    }

    /// Build the environment template, stamped with `exported_at`
    pub fn build_environment(&self, exported_at: DateTime<Utc>) -> EnvironmentTemplateDocument {
        EnvironmentTemplateDocument {
            name: self.environment_name.clone(),
            values: default_variables()
                .into_iter()
                .map(|v| EnvironmentValue {
                    key: v.key,
                    value: v.value,
                    enabled: true,
                    kind: "default".to_string(),
                })
                .collect(),
            variable_scope: "environment".to_string(),
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            exported_using: EXPORTED_USING.to_string(),
        }
    }

    /// Build both documents
    pub fn build(
        self,
        exported_at: DateTime<Utc>,
    ) -> Result<(CollectionDocument, EnvironmentTemplateDocument)> {
        let collection = self.build_collection()?;
        let environment = self.build_environment(exported_at);
        Ok((collection, environment))
    }

    fn build_item(&self, record: &RequestRecord) -> Result<Item> {
        let body = match &record.body {
            Some(value) if is_truthy(value) => Some(Body {
                mode: "raw".to_string(),
                raw: to_canonical_json(value)?.trim_end().to_string(),
                options: BodyOptions {
                    raw: RawOptions {
                        language: "json".to_string(),
                    },
                },
            }),
            _ => None,
        };

        Ok(Item {
            name: format!(
                "{} {} ({})",
                record.method,
                record.url_template,
                self.display_path(&record.source_path)
            ),
            request: Request {
                method: record.method,
                header: CONSISTENT_HEADERS
                    .iter()
                    .map(|(key, value)| KeyValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    })
                    .collect(),
                url: build_url(&record.url_template),
                body,
            },
        })
    }

    /// Source path relative to the base directory, with forward slashes
    fn display_path(&self, path: &Path) -> String {
        pathdiff::diff_paths(path, &self.base_dir)
            .unwrap_or_else(|| path.to_path_buf())
            .to_string_lossy()
            .replace('\\', "/")
    }
}

impl Default for CollectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Orders records by URL template, method and source path, comparing bytes.
fn compare_records(a: &RequestRecord, b: &RequestRecord) -> Ordering {
    a.url_template
        .cmp(&b.url_template)
        .then_with(|| a.method.as_str().cmp(b.method.as_str()))
        .then_with(|| {
            a.source_path
                .to_string_lossy()
                .cmp(&b.source_path.to_string_lossy())
        })
}

fn default_variables() -> Vec<KeyValue> {
    DEFAULT_VARIABLES
        .iter()
        .map(|key| KeyValue {
            key: key.to_string(),
            value: String::new(),
        })
        .collect()
}

/// Splits a URL under the base URL variable into host and path segments.
///
/// The query string is dropped from the path segments; other URLs keep only `raw`.
fn build_url(raw: &str) -> Url {
    let Some(rest) = raw.strip_prefix(BASE_URL_PLACEHOLDER) else {
        return Url {
            raw: raw.to_string(),
            host: None,
            path: None,
        };
    };

    let without_query = rest.split('?').next().unwrap_or_default();
    let path = without_query
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    Url {
        raw: raw.to_string(),
        host: Some(vec![BASE_URL_PLACEHOLDER.to_string()]),
        path: Some(path),
    }
}

/// Bodies that are `false`, `0`, `""` or `null` are left out of the request.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(path: &str, method: HttpMethod, url: &str) -> RequestRecord {
        RequestRecord::new(PathBuf::from(path), method, url.to_string())
    }

    fn item_names(doc: &CollectionDocument) -> Vec<&str> {
        doc.item.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_new_builder() {
        let doc = CollectionBuilder::new().build_collection().unwrap();

        assert_eq!(doc.info.name, DEFAULT_COLLECTION_NAME);
        assert_eq!(doc.info.schema, COLLECTION_SCHEMA);
        assert!(doc.item.is_empty());
        assert_eq!(
            doc.variable
                .iter()
                .map(|v| (v.key.as_str(), v.value.as_str()))
                .collect::<Vec<_>>(),
            vec![
                ("API_BASE_URL", ""),
                ("API_KEY", ""),
                ("ACCEPT_VERSION", ""),
                ("WEBHOOK_SUBSCRIBE_URL", ""),
            ]
        );
    }

    #[test]
    fn test_with_name() {
        let doc = CollectionBuilder::new()
            .with_name("Cards API")
            .build_collection()
            .unwrap();

        assert_eq!(doc.info.name, "Cards API");
    }

    #[test]
    fn test_post_item_with_body() {
        let mut builder = CollectionBuilder::new().with_base_dir(PathBuf::from("/repo"));
        let mut rec = record(
            "/repo/tools/1_cards/index.js",
            HttpMethod::Post,
            "{{API_BASE_URL}}/cards",
        );
        rec.body = Some(json!({ "spendLimit": 1000, "cardType": "Virtual" }));
        builder.add_record(rec);

        let doc = builder.build_collection().unwrap();
        let item = &doc.item[0];

        assert_eq!(item.name, "POST {{API_BASE_URL}}/cards (tools/1_cards/index.js)");
        assert_eq!(item.request.method, HttpMethod::Post);
        assert_eq!(
            item.request.url,
            Url {
                raw: "{{API_BASE_URL}}/cards".to_string(),
                host: Some(vec!["{{API_BASE_URL}}".to_string()]),
                path: Some(vec!["cards".to_string()]),
            }
        );

        let body = item.request.body.as_ref().unwrap();
        assert_eq!(body.mode, "raw");
        assert_eq!(body.options.raw.language, "json");
        assert_eq!(
            body.raw,
            "{\n  \"cardType\": \"Virtual\",\n  \"spendLimit\": 1000\n}"
        );
        let parsed: serde_json::Value = serde_json::from_str(&body.raw).unwrap();
        assert_eq!(parsed, json!({ "cardType": "Virtual", "spendLimit": 1000 }));
    }

    #[test]
    fn test_get_item_has_no_body_and_same_headers() {
        let mut builder = CollectionBuilder::new();
        builder.add_record(record("a.js", HttpMethod::Get, "/health"));
        builder.add_record(record("a.js", HttpMethod::Delete, "/cards/{{id}}"));

        let doc = builder.build_collection().unwrap();

        for item in &doc.item {
            assert!(item.request.body.is_none());
            assert_eq!(
                item.request
                    .header
                    .iter()
                    .map(|h| (h.key.as_str(), h.value.as_str()))
                    .collect::<Vec<_>>(),
                vec![
                    ("x-reap-api-key", "{{API_KEY}}"),
                    ("Accept-Version", "{{ACCEPT_VERSION}}"),
                    ("Content-Type", "application/json"),
                    ("accept", "application/json"),
                ]
            );
        }
    }

    #[test]
    fn test_falsy_bodies_are_omitted() {
        let mut builder = CollectionBuilder::new();
        for (url, body) in [
            ("/a", json!(0)),
            ("/b", json!(false)),
            ("/c", json!("")),
            ("/d", json!(null)),
            ("/e", json!(0.0)),
        ] {
            let mut rec = record("a.js", HttpMethod::Post, url);
            rec.body = Some(body);
            builder.add_record(rec);
        }

        let doc = builder.build_collection().unwrap();

        assert_eq!(doc.item.len(), 5);
        assert!(doc.item.iter().all(|item| item.request.body.is_none()));
    }

    #[test]
    fn test_empty_containers_and_truthy_scalars_are_attached() {
        let mut builder = CollectionBuilder::new();
        for (url, body) in [
            ("/a", json!({})),
            ("/b", json!([])),
            ("/c", json!(1)),
            ("/d", json!("0")),
            ("/e", json!(true)),
        ] {
            let mut rec = record("a.js", HttpMethod::Put, url);
            rec.body = Some(body);
            builder.add_record(rec);
        }

        let doc = builder.build_collection().unwrap();

        let raws: Vec<&str> = doc
            .item
            .iter()
            .map(|item| item.request.body.as_ref().unwrap().raw.as_str())
            .collect();
        assert_eq!(raws, vec!["{}", "[]", "1", "\"0\"", "true"]);
    }

    #[test]
    fn test_url_decomposition() {
        assert_eq!(
            build_url("{{API_BASE_URL}}/cards/{{cardId}}/status?limit=10&x=/y"),
            Url {
                raw: "{{API_BASE_URL}}/cards/{{cardId}}/status?limit=10&x=/y".to_string(),
                host: Some(vec!["{{API_BASE_URL}}".to_string()]),
                path: Some(vec![
                    "cards".to_string(),
                    "{{cardId}}".to_string(),
                    "status".to_string()
                ]),
            }
        );
        assert_eq!(
            build_url("{{API_BASE_URL}}"),
            Url {
                raw: "{{API_BASE_URL}}".to_string(),
                host: Some(vec!["{{API_BASE_URL}}".to_string()]),
                path: Some(vec![]),
            }
        );
    }

    #[test]
    fn test_url_without_base_keeps_raw_only() {
        let url = build_url("{{API_BASE_URL_SANDBOX}}/webhooks");

        assert_eq!(url.raw, "{{API_BASE_URL_SANDBOX}}/webhooks");
        assert!(url.host.is_none());
        assert!(url.path.is_none());
    }

    #[test]
    fn test_items_sorted_by_url_method_path() {
        let mut builder = CollectionBuilder::new();
        builder.add_record(record("b.js", HttpMethod::Post, "/cards"));
        builder.add_record(record("a.js", HttpMethod::Post, "/cards"));
        builder.add_record(record("a.js", HttpMethod::Get, "/cards"));
        builder.add_record(record("a.js", HttpMethod::Get, "/accounts"));
        builder.add_record(record("a.js", HttpMethod::Get, "/Zebra"));

        let doc = builder.build_collection().unwrap();

        assert_eq!(
            item_names(&doc),
            vec![
                "GET /Zebra (a.js)",
                "GET /accounts (a.js)",
                "GET /cards (a.js)",
                "POST /cards (a.js)",
                "POST /cards (b.js)",
            ]
        );
    }

    #[test]
    fn test_sort_is_independent_of_input_order() {
        let records = vec![
            record("2.js", HttpMethod::Put, "{{API_BASE_URL}}/b"),
            record("1.js", HttpMethod::Get, "{{API_BASE_URL}}/a"),
            record("1.js", HttpMethod::Delete, "{{API_BASE_URL}}/a"),
            record("3.js", HttpMethod::Get, "/z"),
        ];

        let mut forward = CollectionBuilder::new();
        forward.add_records(records.clone());
        let mut reverse = CollectionBuilder::new();
        reverse.add_records(records.into_iter().rev());

        assert_eq!(
            forward.build_collection().unwrap(),
            reverse.build_collection().unwrap()
        );
    }

    #[test]
    fn test_environment_template() {
        let builder = CollectionBuilder::new().with_environment_name("Staging");
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();

        let env = builder.build_environment(at);

        assert_eq!(env.name, "Staging");
        assert_eq!(env.variable_scope, "environment");
        assert_eq!(env.exported_at, "2026-03-04T05:06:07.000Z");
        assert_eq!(env.exported_using, "generate_postman_schema");
        assert_eq!(env.values.len(), 4);
        assert!(env.values.iter().all(|v| v.enabled && v.kind == "default" && v.value.is_empty()));
        assert_eq!(env.values[3].key, "WEBHOOK_SUBSCRIBE_URL");

        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["values"][0]["type"], "default");
        assert_eq!(json["_postman_exported_at"], "2026-03-04T05:06:07.000Z");
    }

    #[test]
    fn test_build_returns_both_documents() {
        let mut builder = CollectionBuilder::new().with_name("N");
        builder.add_record(record("a.js", HttpMethod::Head, "/ping"));

        let (collection, environment) = builder.build(Utc::now()).unwrap();

        assert_eq!(collection.item.len(), 1);
        assert_eq!(environment.values.len(), collection.variable.len());
    }

    #[test]
    fn test_optional_url_fields_not_serialized() {
        let mut builder = CollectionBuilder::new();
        builder.add_record(record("a.js", HttpMethod::Get, "https://example.com/x"));

        let json = serde_json::to_value(builder.build_collection().unwrap()).unwrap();
        let request = &json["item"][0]["request"];

        assert_eq!(request["url"], json!({ "raw": "https://example.com/x" }));
        assert!(request.get("body").is_none());
    }

    #[test]
    fn test_item_names_use_path_relative_to_base_dir() {
        let mut builder = CollectionBuilder::new().with_base_dir(PathBuf::from("/repo/sub"));
        builder.add_record(record("/repo/tools/1_x/a.js", HttpMethod::Get, "/a"));
        builder.add_record(record("/repo/sub/tools/2_y/b.js", HttpMethod::Get, "/b"));

        let doc = builder.build_collection().unwrap();

        assert_eq!(
            item_names(&doc),
            vec!["GET /a (../tools/1_x/a.js)", "GET /b (tools/2_y/b.js)"]
        );
    }
}
