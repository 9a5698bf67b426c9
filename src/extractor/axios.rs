use crate::extractor::{CallSiteExtractor, HttpMethod, RequestRecord};
use crate::literal::{named_children, reconstruct_template, reconstruct_value};
use crate::parser::ParsedFile;
use log::debug;
use serde_json::Value;
use tree_sitter::Node;

/// Client identifier recognized when none is configured.
pub const DEFAULT_CLIENT: &str = "axios";

/// Body used when a POST, PUT or PATCH call has no second argument, or passes `null`.
pub const BODY_PLACEHOLDER: &str = "{{BODY}}";

/// Extractor for `axios.<method>(url, body?)` calls.
///
/// A call is recognized when its callee is a plain member access on the client identifier
/// and the property name, uppercased, is an HTTP method. Optional calls (`axios?.get()`),
/// computed members (`axios['get']()`) and tagged templates are not recognized.
pub struct AxiosExtractor {
    client: String,
}

impl AxiosExtractor {
    /// Creates an extractor that matches calls on `client` instead of `axios`.
    pub fn new(client: impl Into<String>) -> Self {
        Self {
            client: client.into(),
        }
    }

    /// Extracts request records from one file in document order.
    pub fn extract_file(&self, file: &ParsedFile) -> Vec<RequestRecord> {
        let mut records = Vec::new();
        let mut stack = vec![file.root()];

        while let Some(node) = stack.pop() {
            if node.kind() == "call_expression" {
                if let Some(record) = self.parse_call(node, file) {
                    records.push(record);
                }
            }

            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        debug!(
            "Extracted {} {} calls from {}",
            records.len(),
            self.client,
            file.path.display()
        );
        records
    }

    /// Builds a record for a recognized call, or `None` when the call is not a request
    /// or its URL cannot be reconstructed.
    fn parse_call(&self, call: Node<'_>, file: &ParsedFile) -> Option<RequestRecord> {
        let method = self.method_of(call, file)?;

        let arguments = call.child_by_field_name("arguments")?;
        if arguments.kind() != "arguments" {
            return None;
        }
        let args = named_children(arguments);

        let Some(url_template) = args
            .first()
            .and_then(|url| reconstruct_template(*url, &file.source))
            .filter(|url| !url.is_empty())
        else {
            debug!(
                "Skipping {}.{} call at {}:{}: URL is not a non-empty string or template literal",
                self.client,
                method.as_str().to_lowercase(),
                file.path.display(),
                call.start_position().row + 1
            );
            return None;
        };

        let mut record = RequestRecord::new(file.path.clone(), method, url_template);
        if method.carries_body() {
            let body = args
                .get(1)
                .map(|body| reconstruct_value(*body, &file.source))
                .filter(|body| !body.is_null());
            record.body =
                Some(body.unwrap_or_else(|| Value::String(BODY_PLACEHOLDER.to_string())));
        }

        Some(record)
    }

    /// Method named by a `<client>.<method>` callee.
    fn method_of(&self, call: Node<'_>, file: &ParsedFile) -> Option<HttpMethod> {
        let callee = call.child_by_field_name("function")?;
        if callee.kind() != "member_expression" {
            return None;
        }

        if has_optional_chain(call) || has_optional_chain(callee) {
            return None;
        }

        let object = callee.child_by_field_name("object")?;
        if object.kind() != "identifier" || file.text(object) != self.client {
            return None;
        }

        let property = callee.child_by_field_name("property")?;
        if property.kind() != "property_identifier" {
            return None;
        }

        HttpMethod::from_name(file.text(property))
    }
}

fn has_optional_chain(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| child.kind() == "optional_chain");
    found
}

impl Default for AxiosExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT)
    }
}

impl CallSiteExtractor for AxiosExtractor {
    fn extract_calls(&self, parsed_files: &[ParsedFile]) -> Vec<RequestRecord> {
        parsed_files
            .iter()
            .flat_map(|file| self.extract_file(file))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::{Path, PathBuf};

    fn extract(code: &str) -> Vec<RequestRecord> {
        let parsed = AstParser::parse_source(Path::new("tools/1_x/index.js"), code.to_string())
            .unwrap();
        AxiosExtractor::default().extract_file(&parsed)
    }

    #[test]
    fn test_extract_post_with_body() {
        let records = extract(
            "axios.post(`${API_BASE_URL}/cards`, { cardType: 'Virtual', spendLimit: 1000 })",
        );

        assert_eq!(
            records,
            vec![RequestRecord {
                source_path: PathBuf::from("tools/1_x/index.js"),
                method: HttpMethod::Post,
                url_template: "{{API_BASE_URL}}/cards".to_string(),
                body: Some(json!({ "cardType": "Virtual", "spendLimit": 1000 })),
            }]
        );
    }

    #[test]
    fn test_method_name_restriction() {
        let records = extract(
            r#"
            axios.fetch('/a')
            axios.create({ baseURL: '/b' })
            axios.post('/c', {})
            axios.PUT('/d', {})
            axios.Patch('/e', {})
            "#,
        );

        let methods: Vec<HttpMethod> = records.iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            vec![HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch]
        );
    }

    #[test]
    fn test_other_clients_ignored() {
        let records = extract(
            r#"
            client.get('/a')
            this.axios.get('/b')
            axios['get']('/c')
            axios?.get('/d')
            axios.get?.('/e')
            get('/f')
            "#,
        );

        assert!(records.is_empty(), "unexpected records: {:?}", records);
    }

    #[test]
    fn test_custom_client_identifier() {
        let parsed = AstParser::parse_source(
            Path::new("a.js"),
            "http.get('/a'); axios.get('/b')".to_string(),
        )
        .unwrap();

        let records = AxiosExtractor::new("http").extract_file(&parsed);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url_template, "/a");
    }

    #[test]
    fn test_url_discard_rule() {
        assert!(extract("axios.get(someVariable)").is_empty());
        assert!(extract("axios.get()").is_empty());
        assert!(extract("axios.get(base + '/x')").is_empty());
        assert!(extract("axios.get(''); axios.post(``, { a: 1 })").is_empty());

        let records = extract("axios.get(`${BASE}/x`)");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url_template, "{{BASE}}/x");
    }

    #[test]
    fn test_body_fallback_rule() {
        let records = extract("axios.post(url, computeBody())");
        assert!(records.is_empty(), "identifier URL must be discarded");

        let records = extract("axios.post('/x', computeBody())");
        assert_eq!(records[0].body, Some(json!("{{VALUE}}")));

        let records = extract("axios.get('/x', computeBody())");
        assert_eq!(records[0].body, None);
    }

    #[test]
    fn test_missing_body_argument() {
        let records = extract("axios.post('/x')");

        assert_eq!(records[0].body, Some(json!("{{BODY}}")));
    }

    #[test]
    fn test_null_body_argument_uses_placeholder() {
        let records = extract("axios.put('/x', null); axios.patch('/y', (null))");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].body, Some(json!("{{BODY}}")));
        assert_eq!(records[1].body, Some(json!("{{BODY}}")));
    }

    #[test]
    fn test_tagged_template_is_not_a_call() {
        assert!(extract("axios.get`/x`").is_empty());
        assert!(extract("axios.post`${API_BASE_URL}/cards`").is_empty());
    }

    #[test]
    fn test_config_argument_not_modeled_for_get() {
        let records = extract(
            "axios.delete(`${API_BASE_URL}/cards/${id}`, { headers: { accept: 'application/json' } })",
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, HttpMethod::Delete);
        assert_eq!(records[0].url_template, "{{API_BASE_URL}}/cards/{{id}}");
        assert_eq!(records[0].body, None);
    }

    #[test]
    fn test_document_order_and_nesting() {
        let records = extract(
            r#"
            async function run() {
                const a = await axios.get('/first')
                await axios.post('/outer', { inner: await axios.get('/inner') })
            }
            axios.head('/last')
            "#,
        );

        let urls: Vec<&str> = records.iter().map(|r| r.url_template.as_str()).collect();
        assert_eq!(urls, vec!["/first", "/outer", "/inner", "/last"]);
        assert_eq!(records[1].body, Some(json!({ "inner": "{{VALUE}}" })));
    }

    #[test]
    fn test_comments_are_not_arguments() {
        let records = extract("axios.post(/* url */ '/x', /* body */ { a: 1 })");

        assert_eq!(records[0].url_template, "/x");
        assert_eq!(records[0].body, Some(json!({ "a": 1 })));
    }

    #[test]
    fn test_extract_calls_across_files() {
        let a = AstParser::parse_source(Path::new("a.js"), "axios.get('/a')".to_string()).unwrap();
        let b = AstParser::parse_source(
            Path::new("b.js"),
            "axios.options('/b'); axios.patch('/c', null)".to_string(),
        )
        .unwrap();

        let records = AxiosExtractor::default().extract_calls(&[a, b]);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].source_path, PathBuf::from("a.js"));
        assert_eq!(records[1].method, HttpMethod::Options);
        assert_eq!(records[2].body, Some(json!("{{BODY}}")));
    }
}
