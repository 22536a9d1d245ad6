//! Per-kind dispatch over raw Luogu responses.
//!
//! Articles and user profiles always arrive as pages, pastes as decoded JSON.
//! Judgement logs are the awkward one: they show up as JSON with the logs at
//! one of several paths, as a page, or as JSON encoded inside a string.

use std::sync::Arc;

use luogu_common::{Result, StructureError};
use luogu_common::diagnostics::{Diagnostics, TracingDiagnostics, snippet};
use luogu_config::ExtractorConfig;
use serde_json::Value;

use crate::author::{AuthorInfo, normalize_author};
use crate::logs::{JSON_STRATEGIES, LogCollection};
use crate::markup::EmbeddedPayloadExtractor;
use crate::response::{ExtractedValue, RawResponse, ResponseKind};

const ARTICLE_MALFORMED: &str = "article markup malformed";
const USER_PAGE_MALFORMED: &str = "user page malformed";
const NOT_MARKUP_NOR_JSON: &str = "judgement payload neither markup nor valid JSON";
const UNSUPPORTED_JUDGEMENT: &str = "unsupported judgement payload type";
const NESTED_TOO_DEEPLY: &str = "judgement payload nested too deeply";

/// Drives the kind-specific extraction strategy for a [`RawResponse`].
///
/// ```
/// use luogu_config::ExtractorConfig;
/// use luogu_extract::{RawResponse, ResponseClassifier, ResponseKind};
/// use serde_json::json;
///
/// let classifier = ResponseClassifier::new(ExtractorConfig::default());
/// let response = RawResponse::from_json(json!({ "data": { "logs": [{ "id": 1 }] } }));
///
/// let logs = classifier
///     .normalize(&response, ResponseKind::JudgementLog)
///     .unwrap()
///     .into_logs()
///     .unwrap();
/// assert_eq!(logs.len(), 1);
/// ```
#[derive(Clone)]
pub struct ResponseClassifier {
    extractor: EmbeddedPayloadExtractor,
}

impl ResponseClassifier {
    /// Classifier reporting through `tracing`.
    pub fn new(config: ExtractorConfig) -> Self {
        Self::with_diagnostics(config, Arc::new(TracingDiagnostics))
    }

    pub fn with_diagnostics(config: ExtractorConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            extractor: EmbeddedPayloadExtractor::new(config, diagnostics),
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        self.extractor.config()
    }

    pub fn extractor(&self) -> &EmbeddedPayloadExtractor {
        &self.extractor
    }

    pub fn normalize(&self, response: &RawResponse, kind: ResponseKind) -> Result<ExtractedValue> {
        let payload = &response.data;
        match kind {
            ResponseKind::Article => self
                .hydrated_field(payload, "/data/article", ARTICLE_MALFORMED)
                .map(ExtractedValue::Article),
            ResponseKind::Paste => Ok(ExtractedValue::Paste(
                payload.pointer("/currentData/paste").cloned(),
            )),
            ResponseKind::JudgementLog => self
                .judgement_log(payload, 0)
                .map(ExtractedValue::JudgementLog),
            ResponseKind::UserProfile => self
                .hydrated_field(payload, "/data/user", USER_PAGE_MALFORMED)
                .map(ExtractedValue::UserProfile),
        }
    }

    /// See [`normalize_author`].
    pub fn normalize_author(&self, record: Option<&Value>) -> AuthorInfo {
        normalize_author(record)
    }

    fn hydrated_field(&self, payload: &Value, pointer: &str, malformed: &str) -> Result<Option<Value>> {
        let Some(markup) = payload.as_str() else {
            self.diagnostics()
                .error(&format!("expected markup, got {}", json_type(payload)));
            return Err(self.extractor.structure_error(malformed));
        };
        let root = self.extractor.read_context(markup, malformed)?;
        Ok(root.pointer(pointer).cloned())
    }

    fn judgement_log(&self, payload: &Value, depth: usize) -> Result<LogCollection> {
        match payload {
            Value::Object(_) | Value::Array(_) => {
                self.diagnostics().debug("judgement response is a decoded JSON value");
                for (name, strategy) in JSON_STRATEGIES {
                    if let Some(found) = strategy(payload) {
                        self.diagnostics().debug(&format!(
                            "judgement response matched {name}: {} entries",
                            found.len()
                        ));
                        return Ok(found);
                    }
                }

                self.diagnostics()
                    .warn("judgement JSON response has an unexpected structure");
                self.diagnostics().debug(&format!(
                    "response structure: {}",
                    snippet(payload, self.config().snippet_limit)
                ));
                Err(self.unsupported(payload))
            }
            Value::String(text) => {
                if self.looks_like_markup(text) {
                    self.diagnostics()
                        .debug("judgement response is markup, reading hydration payload");
                    return self.extractor.extract_logs(text);
                }

                match serde_json::from_str::<Value>(text) {
                    Ok(decoded) => {
                        if depth >= self.config().max_decode_depth {
                            self.diagnostics().error(&format!(
                                "judgement response still encoded after {depth} decode hops"
                            ));
                            return Err(self.extractor.structure_error(NESTED_TOO_DEEPLY));
                        }
                        self.diagnostics()
                            .debug("judgement response was a JSON string, decoded it");
                        self.judgement_log(&decoded, depth + 1)
                    }
                    Err(e) => {
                        self.diagnostics()
                            .error("judgement response is neither markup nor valid JSON");
                        Err(self
                            .extractor
                            .structure_error(NOT_MARKUP_NOR_JSON)
                            .with_cause(e))
                    }
                }
            }
            other => Err(self.unsupported(other)),
        }
    }

    fn looks_like_markup(&self, text: &str) -> bool {
        text.contains("<!DOCTYPE")
            || text.contains("<html")
            || text.contains(&self.config().context_marker_id())
    }

    fn unsupported(&self, payload: &Value) -> StructureError {
        self.diagnostics().error(&format!(
            "cannot handle judgement response of type {}",
            json_type(payload)
        ));
        self.extractor.structure_error(UNSUPPORTED_JUDGEMENT)
    }

    fn diagnostics(&self) -> &dyn Diagnostics {
        self.extractor.diagnostics()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luogu_common::diagnostics::RecordingDiagnostics;
    use serde_json::json;
    use tracing::Level;

    fn classifier() -> (ResponseClassifier, Arc<RecordingDiagnostics>) {
        let sink = Arc::new(RecordingDiagnostics::new());
        let classifier = ResponseClassifier::with_diagnostics(ExtractorConfig::default(), sink.clone());
        (classifier, sink)
    }

    fn logs_of(classifier: &ResponseClassifier, data: Value) -> Result<Value> {
        classifier
            .normalize(&RawResponse::from_json(data), ResponseKind::JudgementLog)
            .map(|v| v.into_value().unwrap())
    }

    fn context_page(context: &str) -> String {
        format!(
            r#"<!DOCTYPE html><html><body><script id="lentille-context" type="application/json">{context}</script></body></html>"#
        )
    }

    #[test]
    fn data_logs_return_data_unchanged() {
        let (c, _) = classifier();
        let data = json!({ "logs": [{ "id": 1 }], "count": 1, "extra": { "k": true } });
        let got = logs_of(&c, json!({ "data": data.clone(), "logs": [{ "id": 2 }] })).unwrap();
        assert_eq!(got, data);
    }

    #[test]
    fn top_level_logs_return_whole_payload() {
        let (c, _) = classifier();
        let payload = json!({ "logs": [], "page": 1 });
        assert_eq!(logs_of(&c, payload.clone()).unwrap(), payload);
    }

    #[test]
    fn nested_paths_follow_candidate_order() {
        let (c, _) = classifier();
        let got = logs_of(
            &c,
            json!({
                "data": { "logs": "not-a-list" },
                "result": { "logs": [{ "id": "r" }] },
                "currentData": { "logs": [{ "id": "c" }] }
            }),
        )
        .unwrap();
        assert_eq!(got, json!({ "logs": [{ "id": "c" }] }));

        let got = logs_of(&c, json!({ "result": { "logs": [{ "id": "r" }] } })).unwrap();
        assert_eq!(got, json!({ "logs": [{ "id": "r" }] }));
    }

    #[test]
    fn object_without_logs_is_unsupported() {
        let (c, sink) = classifier();
        let err = logs_of(&c, json!({ "data": { "items": [] } })).unwrap_err();
        assert_eq!(err.message(), UNSUPPORTED_JUDGEMENT);
        assert!(sink.contains(Level::WARN, "unexpected structure"));
        assert!(sink.contains(Level::ERROR, "type object"));
    }

    #[test]
    fn scalars_are_unsupported() {
        let (c, _) = classifier();
        for payload in [json!(null), json!(3), json!(false)] {
            let err = logs_of(&c, payload).unwrap_err();
            assert_eq!(err.message(), UNSUPPORTED_JUDGEMENT);
        }
    }

    #[test]
    fn double_encoded_matches_pre_decoded() {
        let (c, _) = classifier();
        let decoded = json!({ "data": { "logs": [{ "id": 3 }], "total": 1 } });
        let encoded = Value::String(decoded.to_string());
        assert_eq!(logs_of(&c, encoded).unwrap(), logs_of(&c, decoded).unwrap());
    }

    #[test]
    fn decode_hops_are_bounded() {
        let (c, _) = classifier();
        let once = Value::String(json!({ "logs": [] }).to_string());
        let twice = Value::String(once.to_string());
        assert!(logs_of(&c, twice.clone()).is_ok());

        let thrice = Value::String(twice.to_string());
        let err = logs_of(&c, thrice).unwrap_err();
        assert_eq!(err.message(), NESTED_TOO_DEEPLY);
    }

    #[test]
    fn plain_text_is_neither_markup_nor_json() {
        let (c, sink) = classifier();
        let err = logs_of(&c, json!("Service Unavailable")).unwrap_err();
        assert!(err.message().starts_with(NOT_MARKUP_NOR_JSON));
        assert!(std::error::Error::source(&err).is_some());
        assert!(sink.contains(Level::ERROR, "neither markup nor valid JSON"));
    }

    #[test]
    fn markup_is_delegated_to_the_extractor() {
        let (c, _) = classifier();
        let page = context_page(r#"{"data":{"logs":[{"id":1}]}}"#);
        assert_eq!(logs_of(&c, json!(page)).unwrap(), json!({ "logs": [{ "id": 1 }] }));

        // a bare fragment still counts as markup when it names the marker
        let fragment = r#"<div id="lentille-context">{"data":{}}</div>"#;
        assert_eq!(logs_of(&c, json!(fragment)).unwrap(), json!({ "logs": [] }));
    }

    #[test]
    fn markup_without_marker_fails() {
        let (c, _) = classifier();
        let err = logs_of(&c, json!("<html><body>maintenance</body></html>")).unwrap_err();
        assert_eq!(err.message(), "judgement page malformed");
    }

    #[test]
    fn article_and_user_read_the_context() {
        let (c, _) = classifier();
        let page = context_page(
            r#"{"data":{"article":{"lid":"abc","title":"T"},"user":{"uid":1}}}"#,
        );
        let response = RawResponse::from_text(page);

        let article = c.normalize(&response, ResponseKind::Article).unwrap();
        assert_eq!(
            article,
            ExtractedValue::Article(Some(json!({ "lid": "abc", "title": "T" })))
        );
        let user = c.normalize(&response, ResponseKind::UserProfile).unwrap();
        assert_eq!(user.into_value(), Some(json!({ "uid": 1 })));
    }

    #[test]
    fn absent_article_field_is_not_an_error() {
        let (c, _) = classifier();
        let response = RawResponse::from_text(context_page(r#"{"data":{}}"#));
        assert_eq!(
            c.normalize(&response, ResponseKind::Article).unwrap(),
            ExtractedValue::Article(None)
        );
    }

    #[test]
    fn missing_marker_messages_are_kind_specific() {
        let (c, _) = classifier();
        let response = RawResponse::from_text("<html><body></body></html>");
        let err = c.normalize(&response, ResponseKind::Article).unwrap_err();
        assert_eq!(err.message(), ARTICLE_MALFORMED);
        let err = c.normalize(&response, ResponseKind::UserProfile).unwrap_err();
        assert_eq!(err.message(), USER_PAGE_MALFORMED);

        let json_body = RawResponse::from_json(json!({ "data": { "article": {} } }));
        let err = c.normalize(&json_body, ResponseKind::Article).unwrap_err();
        assert_eq!(err.message(), ARTICLE_MALFORMED);
    }

    #[test]
    fn paste_reads_current_data() {
        let (c, _) = classifier();
        let response = RawResponse::from_json(json!({ "currentData": { "paste": { "id": "p1" } } }));
        assert_eq!(
            c.normalize(&response, ResponseKind::Paste).unwrap(),
            ExtractedValue::Paste(Some(json!({ "id": "p1" })))
        );

        let empty = RawResponse::from_json(json!({}));
        assert_eq!(
            c.normalize(&empty, ResponseKind::Paste).unwrap(),
            ExtractedValue::Paste(None)
        );
    }

    #[test]
    fn service_label_comes_from_config() {
        let config = ExtractorConfig {
            service_label: "Luogu mirror".to_string(),
            ..ExtractorConfig::default()
        };
        let c = ResponseClassifier::with_diagnostics(
            config,
            Arc::new(luogu_common::diagnostics::NoopDiagnostics),
        );
        let err = c
            .normalize(&RawResponse::from_json(json!(1)), ResponseKind::JudgementLog)
            .unwrap_err();
        assert_eq!(err.service(), "Luogu mirror");
        assert_eq!(err.to_string(), "Luogu mirror: unsupported judgement payload type");
    }
}
