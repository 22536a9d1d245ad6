//! Extraction of the `lentille` hydration payload embedded in Luogu pages.
//!
//! Pages ship their client state as JSON inside a fixed-id element
//! (`#lentille-context`):
//!
//! ```html
//! <script id="lentille-context" type="application/json">
//! { "data": { "logs": [ ... ] }, ... }
//! </script>
//! ```
//!
//! Newer pages split that state into numbered partitions. The context then
//! only carries the active index under the reserved `":"` key and the logs
//! live in `#lentille-state-<index>` (or `#lentille-data-<index>`).

use std::sync::Arc;

use luogu_common::diagnostics::{Diagnostics, snippet};
use luogu_common::{Result, StructureError};
use luogu_config::ExtractorConfig;
use scraper::{Html, Selector};
use serde_json::{Number, Value};

use crate::logs::{LogCollection, recognize_logs};

const JUDGEMENT_PAGE_MALFORMED: &str = "judgement page malformed";

#[derive(Clone)]
pub struct EmbeddedPayloadExtractor {
    config: ExtractorConfig,
    diagnostics: Arc<dyn Diagnostics>,
}

impl EmbeddedPayloadExtractor {
    pub fn new(config: ExtractorConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            config,
            diagnostics,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    /// Build an error labelled with the configured upstream service.
    pub fn structure_error(&self, message: impl Into<String>) -> StructureError {
        StructureError::new(message, &self.config.service_label)
    }

    /// Decode the hydration payload of `markup`.
    ///
    /// `missing_message` becomes the error message when the context marker is
    /// absent, so each caller can say which page it expected.
    pub fn read_context(&self, markup: &str, missing_message: &str) -> Result<Value> {
        let document = Html::parse_document(markup);
        self.decode_context(&document, missing_message)
    }

    /// Locate the judgement log collection inside a page.
    ///
    /// Fails only when the context marker is missing or undecodable. A page
    /// whose payload holds no recognizable logs yields an empty collection.
    pub fn extract_logs(&self, markup: &str) -> Result<LogCollection> {
        let document = Html::parse_document(markup);
        let root = self.decode_context(&document, JUDGEMENT_PAGE_MALFORMED)?;
        let data = root.get("data");

        if let Some(found) = data.and_then(recognize_logs) {
            self.diagnostics.debug(&format!(
                "judgement page context carried {} log entries",
                found.len()
            ));
            return Ok(found);
        }

        let selectors = self.fallback_selectors(data);
        if let Some(found) = self.scan_fallbacks(&document, &selectors) {
            return Ok(found);
        }

        let result = LogCollection::empty();
        let limit = self.config.snippet_limit;
        self.diagnostics.debug(&format!(
            "judgement payload structure unexpected: {}",
            snippet(&Value::from(result.clone()), limit)
        ));
        self.diagnostics
            .debug(&format!("hydration root: {}", snippet(&root, limit)));
        Ok(result)
    }

    /// State partition selectors (when `data` names an index) followed by the
    /// generic embedded-JSON selector.
    pub fn fallback_selectors(&self, data: Option<&Value>) -> Vec<String> {
        let mut selectors = Vec::with_capacity(3);
        let index = data
            .and_then(|d| d.get(&self.config.state_index_key))
            .and_then(Value::as_number)
            .map(render_index);
        if let Some(index) = index {
            selectors.extend(self.config.state_selectors(&index));
        }
        selectors.push(self.config.generic_fallback_selector.clone());
        selectors
    }

    fn decode_context(&self, document: &Html, missing_message: &str) -> Result<Value> {
        let marker = self.config.context_marker_id();
        let selector = self.selector(&format!("#{marker}"))?;

        let Some(element) = document.select(&selector).next() else {
            self.diagnostics.error(&format!("no #{marker} element in page"));
            return Err(self.structure_error(missing_message));
        };

        let text = element.text().collect::<String>();
        serde_json::from_str(text.trim()).map_err(|e| {
            self.diagnostics
                .error(&format!("#{marker} content is not valid JSON: {e}"));
            self.structure_error(format!("failed to decode #{marker} payload"))
                .with_cause(e)
        })
    }

    fn scan_fallbacks(&self, document: &Html, selectors: &[String]) -> Option<LogCollection> {
        for css in selectors {
            let Ok(selector) = self.selector(css) else {
                self.diagnostics
                    .warn(&format!("skipping unparsable fallback selector {css}"));
                continue;
            };

            for (index, element) in document.select(&selector).enumerate() {
                let text = element.text().collect::<String>();
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }

                match serde_json::from_str::<Value>(text) {
                    Ok(parsed) => {
                        if let Some(found) = recognize_logs(&parsed) {
                            self.diagnostics.debug(&format!(
                                "extracted {} log entries from {css}",
                                found.len()
                            ));
                            return Some(found);
                        }
                    }
                    Err(e) => self.diagnostics.debug(&format!(
                        "failed to decode {css} JSON (element {index}): {e}"
                    )),
                }
            }
        }
        None
    }

    fn selector(&self, css: &str) -> Result<Selector> {
        Selector::parse(css)
            .map_err(|e| self.structure_error(format!("invalid selector {css}: {e:?}")))
    }
}

/// Render a partition index the way it appears in element ids: integral
/// values print without a fractional part.
fn render_index(number: &Number) -> String {
    if let Some(i) = number.as_i64() {
        return i.to_string();
    }
    if let Some(u) = number.as_u64() {
        return u.to_string();
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        _ => number.to_string(),
    }
}
