//! De-identification engine
//!
//! [`DeidEngine`] ties the pipeline together for one document at a time:
//! match every rule, resolve overlaps, substitute placeholders, and record
//! the pass in the audit trail. Restoration runs the same way in reverse.
//!
//! # Examples
//!
//! ```no_run
//! use phiguard::deid::{DeidConfig, DeidEngine};
//! use phiguard::domain::{Document, DocumentId};
//!
//! # fn example() -> phiguard::domain::Result<()> {
//! let engine = DeidEngine::new(DeidConfig::default())?;
//! let doc = Document::new(
//!     DocumentId::new("nota-001").unwrap(),
//!     "CURP: GOHM450315MGTRNR08 NSS: 12345678901",
//! );
//!
//! let result = engine.sanitize(&doc)?;
//! assert_eq!(result.sanitized_text, "CURP: [CURP_0] NSS: [NSS_1]");
//!
//! let restored = engine.restore(&doc.id, &result.sanitized_text, &result.map)?;
//! assert_eq!(restored, doc.text);
//! # Ok(())
//! # }
//! ```

use crate::deid::audit::{AuditEvent, AuditRecord, AuditSink, JsonLinesAuditLog};
use crate::deid::config::DeidConfig;
use crate::deid::detector::{resolve, PatternRegistry, ResolvedMatchSet, RuleSkip, SpanMatcher};
use crate::deid::models::PhiType;
use crate::deid::placeholder::{self, PhiMap, SanitizationResult};
use crate::deid::report::DetectionReport;
use crate::deid::translate::Translator;
use crate::deid::verify::{check_placeholder_integrity, verify_round_trip, PlaceholderIntegrity};
use crate::domain::{DeidError, Document, DocumentId, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Where a document is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentState {
    Raw,
    Matched,
    Resolved,
    Sanitized,
    Restored,
    /// Registry or engine configuration rejected; nothing was matched
    ConfigError,
    /// Restored text does not reproduce what it should
    Mismatch,
}

impl DocumentState {
    /// State a document is left in when processing fails with `error`
    ///
    /// Failures other than configuration and mismatch are never partially
    /// applied, so the document stays `Raw`.
    pub fn from_error(error: &DeidError) -> Self {
        match error {
            DeidError::Configuration(_) => Self::ConfigError,
            DeidError::RestorationMismatch { .. } => Self::Mismatch,
            _ => Self::Raw,
        }
    }
}

/// Outcome of matching and resolving one text
#[derive(Debug, Default)]
pub struct Detection {
    /// Selected spans, disjoint and in document order
    pub matches: ResolvedMatchSet,
    /// Candidates before overlap resolution
    pub candidate_count: usize,
    /// Rules dropped for this text
    pub skipped_rules: Vec<RuleSkip>,
}

impl Detection {
    /// Distinct PHI types among the selected spans
    pub fn phi_types(&self) -> BTreeSet<PhiType> {
        self.matches.iter().map(|m| m.phi_type).collect()
    }
}

/// Sanitize, restore and verify in one go
#[derive(Debug)]
pub struct RoundTrip {
    pub result: SanitizationResult,
    pub restored: String,
    pub state: DocumentState,
    /// First differing byte when the restored text is not the original
    pub mismatch_offset: Option<usize>,
}

impl RoundTrip {
    /// Turn a mismatch into an error
    pub fn check(&self) -> Result<()> {
        match self.mismatch_offset {
            Some(offset) => Err(DeidError::RestorationMismatch { offset }),
            None => Ok(()),
        }
    }
}

/// Translation performed on sanitized text, with PHI put back
#[derive(Debug)]
pub struct ProtectedTranslation {
    pub document_id: DocumentId,
    /// Translated text with original values restored
    pub text: String,
    pub integrity: PlaceholderIntegrity,
    pub phi_count: usize,
    /// `Restored` when every placeholder survived, `Mismatch` otherwise
    pub state: DocumentState,
}

/// Main de-identification engine
///
/// Cheap to clone: the registry and audit sink are shared.
#[derive(Clone)]
pub struct DeidEngine {
    config: DeidConfig,
    matcher: SpanMatcher,
    audit: Option<Arc<dyn AuditSink>>,
}

impl DeidEngine {
    /// Create an engine from configuration
    ///
    /// Loads the configured pattern library (or the built-in one) and opens
    /// the audit log when auditing is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`DeidError::Configuration`] for an invalid configuration or
    /// pattern library, and [`DeidError::AuditWrite`] when the audit log
    /// cannot be opened.
    pub fn new(config: DeidConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| DeidError::Configuration(format!("{e:#}")))?;

        let registry = match config.detection.pattern_library {
            Some(ref path) => PatternRegistry::from_file(path)?,
            None => PatternRegistry::default_rules()?,
        };

        Self::with_registry(config, registry)
    }

    /// Create an engine with an explicit pattern registry
    pub fn with_registry(config: DeidConfig, registry: PatternRegistry) -> Result<Self> {
        config
            .validate()
            .map_err(|e| DeidError::Configuration(format!("{e:#}")))?;

        let audit: Option<Arc<dyn AuditSink>> = if config.audit.enabled {
            Some(Arc::new(JsonLinesAuditLog::open(&config.audit.log_path)?))
        } else {
            None
        };

        let matcher = SpanMatcher::new(Arc::new(registry))
            .with_rule_timeout(config.detection.rule_timeout())
            .with_min_confidence(config.detection.min_confidence)
            .with_parallelism(config.detection.parallel_rules);

        tracing::info!(
            rules = matcher.registry().len(),
            audit_enabled = config.audit.enabled,
            "De-identification engine ready"
        );

        Ok(Self {
            config,
            matcher,
            audit,
        })
    }

    /// Replace the audit sink
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn config(&self) -> &DeidConfig {
        &self.config
    }

    pub fn registry(&self) -> &PatternRegistry {
        self.matcher.registry()
    }

    /// Match and resolve without substituting
    pub fn detect(&self, text: &str) -> Detection {
        let outcome = self.matcher.scan(text);
        let candidate_count = outcome.candidates.len();
        tracing::trace!(state = ?DocumentState::Matched, candidates = candidate_count);
        let matches = resolve(outcome.candidates);
        tracing::debug!(
            state = ?DocumentState::Resolved,
            candidates = candidate_count,
            selected = matches.len(),
            "Overlaps resolved"
        );
        Detection {
            matches,
            candidate_count,
            skipped_rules: outcome.skipped,
        }
    }

    /// Sanitize one document and record the detection pass
    pub fn sanitize(&self, document: &Document) -> Result<SanitizationResult> {
        self.sanitize_unless_abandoned(document, None)
    }

    /// Sanitize, skipping the audit record once `abandoned` is set
    ///
    /// A batch worker that outlived its document budget must not leave a
    /// detection record for a document reported as failed.
    fn sanitize_unless_abandoned(
        &self,
        document: &Document,
        abandoned: Option<&AtomicBool>,
    ) -> Result<SanitizationResult> {
        let span = tracing::info_span!("sanitize", document_id = %document.id);
        let _enter = span.enter();
        let started = Instant::now();

        let detection = self.detect(&document.text);
        let result = placeholder::sanitize(&document.id, &document.text, &detection.matches)?;

        if self.config.detection.verify_round_trip {
            let restored = placeholder::restore(&result.sanitized_text, &result.map);
            if let Err(e) = verify_round_trip(&document.text, &restored) {
                tracing::error!(error = %e, "Sanitized document does not restore");
                return Err(e);
            }
        }
        tracing::trace!(state = ?DocumentState::Sanitized);

        if abandoned.is_some_and(|flag| flag.load(Ordering::Acquire)) {
            tracing::warn!("Document abandoned after its time budget; audit record skipped");
            return Err(DeidError::DocumentTimeout {
                document_id: document.id.to_string(),
                budget_ms: self.config.detection.document_timeout_ms,
            });
        }

        self.record(
            &document.id,
            AuditEvent::Detection,
            &document.text,
            detection.matches.iter().map(|m| (m.phi_type, m.confidence)),
        )?;

        crate::log_document_processed!(
            &document.id,
            result.phi_count(),
            detection.skipped_rules.len(),
            started.elapsed()
        );
        Ok(result)
    }

    /// Restore a (possibly translated) text and record the restoration pass
    pub fn restore(&self, document_id: &DocumentId, text: &str, map: &PhiMap) -> Result<String> {
        let restored = placeholder::restore(text, map);
        self.record(
            document_id,
            AuditEvent::Restoration,
            &restored,
            map.iter().map(|e| (e.phi_type, e.confidence)),
        )?;
        tracing::info!(
            document_id = %document_id,
            state = ?DocumentState::Restored,
            placeholders = map.len(),
            "Document restored"
        );
        Ok(restored)
    }

    /// Sanitize, restore and compare with the original
    pub fn round_trip(&self, document: &Document) -> Result<RoundTrip> {
        let result = self.sanitize(document)?;
        let restored = self.restore(&document.id, &result.sanitized_text, &result.map)?;

        let mismatch_offset = match verify_round_trip(&document.text, &restored) {
            Ok(()) => None,
            Err(DeidError::RestorationMismatch { offset }) => Some(offset),
            Err(e) => return Err(e),
        };
        let state = if mismatch_offset.is_some() {
            DocumentState::Mismatch
        } else {
            DocumentState::Restored
        };

        Ok(RoundTrip {
            result,
            restored,
            state,
            mismatch_offset,
        })
    }

    /// Sanitize many documents concurrently
    ///
    /// Each document runs on a blocking worker and gets the configured
    /// document budget. A document over budget yields
    /// [`DeidError::DocumentTimeout`]; no partial result is returned for it.
    /// Results are in input order. A worker still running when its budget
    /// expires finishes in the background but writes no audit record.
    pub async fn sanitize_batch(&self, documents: Vec<Document>) -> Vec<Result<SanitizationResult>> {
        let budget = self.config.detection.document_timeout();
        let total = documents.len();

        let tasks = documents.into_iter().map(|document| {
            let engine = self.clone();
            async move {
                let document_id = document.id.to_string();
                let abandoned = Arc::new(AtomicBool::new(false));
                let flag = Arc::clone(&abandoned);
                let worker = tokio::task::spawn_blocking(move || {
                    engine.sanitize_unless_abandoned(&document, Some(&flag))
                });
                match tokio::time::timeout(budget, worker).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(join_error)) => Err(DeidError::Worker(join_error.to_string())),
                    Err(_) => {
                        abandoned.store(true, Ordering::Release);
                        Err(DeidError::DocumentTimeout {
                            document_id,
                            budget_ms: budget.as_millis() as u64,
                        })
                    }
                }
            }
        });

        let results = futures::future::join_all(tasks).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        for error in results.iter().filter_map(|r| r.as_ref().err()) {
            tracing::error!(
                error = %error,
                state = ?DocumentState::from_error(error),
                "Failed to sanitize document"
            );
        }
        crate::log_batch_processing!(total - failed, total);

        results
    }

    /// Translate a document without letting PHI reach the translator
    ///
    /// The translator sees sanitized text only. Its output is checked for
    /// lost or foreign placeholders and then restored.
    pub async fn protect_translation(
        &self,
        document: &Document,
        translator: &dyn Translator,
    ) -> Result<ProtectedTranslation> {
        let sanitized = self.sanitize(document)?;

        let translated = translator
            .translate(&sanitized.sanitized_text)
            .await
            .map_err(|e| DeidError::Translation(format!("{}: {e:#}", translator.name())))?;

        let integrity = check_placeholder_integrity(&translated, &sanitized.map);
        if !integrity.is_intact() {
            tracing::warn!(
                document_id = %document.id,
                translator = translator.name(),
                missing = ?integrity.missing,
                unexpected = ?integrity.unexpected,
                "Placeholders altered by translation"
            );
        }

        let text = self.restore(&document.id, &translated, &sanitized.map)?;
        let state = if integrity.is_intact() {
            DocumentState::Restored
        } else {
            DocumentState::Mismatch
        };

        Ok(ProtectedTranslation {
            document_id: document.id.clone(),
            text,
            phi_count: sanitized.phi_count(),
            integrity,
            state,
        })
    }

    /// PHI still detectable in a sanitized text
    ///
    /// Placeholders are never reported, so any match is a leak.
    pub fn residual_phi(&self, sanitized_text: &str) -> ResolvedMatchSet {
        self.detect(sanitized_text).matches
    }

    /// Detection report over documents, substituting nothing
    pub fn report(&self, documents: &[Document]) -> DetectionReport {
        let mut report = DetectionReport::new();
        for document in documents {
            let started = Instant::now();
            let detection = self.detect(&document.text);
            report.add_document(
                document.id.as_str(),
                &detection,
                started.elapsed().as_millis() as u64,
                self.config.detection.high_confidence_threshold,
            );
        }
        report
    }

    /// Flush and close the audit sink
    pub fn close(&self) -> Result<()> {
        match self.audit {
            Some(ref sink) => {
                sink.flush()?;
                sink.close()
            }
            None => Ok(()),
        }
    }

    fn record<I>(&self, document_id: &DocumentId, event: AuditEvent, text: &str, detections: I) -> Result<()>
    where
        I: IntoIterator<Item = (PhiType, f32)>,
    {
        let Some(ref sink) = self.audit else {
            return Ok(());
        };
        let record = AuditRecord::new(
            document_id.as_str(),
            event,
            text,
            detections,
            self.config.detection.high_confidence_threshold,
        );
        sink.append(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deid::audit::MemoryAuditLog;
    use crate::deid::translate::PassthroughTranslator;

    fn engine_with_memory_audit() -> (DeidEngine, Arc<MemoryAuditLog>) {
        let sink = Arc::new(MemoryAuditLog::new());
        let engine = DeidEngine::new(DeidConfig::without_audit())
            .unwrap()
            .with_audit_sink(sink.clone());
        (engine, sink)
    }

    fn doc(id: &str, text: &str) -> Document {
        Document::new(DocumentId::new(id).unwrap(), text)
    }

    #[test]
    fn test_engine_creation() {
        let engine = DeidEngine::new(DeidConfig::without_audit());
        assert!(engine.is_ok());
    }

    #[test]
    fn test_sanitize_mexican_identifiers() {
        let (engine, sink) = engine_with_memory_audit();
        let document = doc("a", "CURP: GOHM450315MGTRNR08 NSS: 12345678901");
        let result = engine.sanitize(&document).unwrap();
        assert_eq!(result.sanitized_text, "CURP: [CURP_0] NSS: [NSS_1]");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event, AuditEvent::Detection);
        assert_eq!(records[0].phi_count, 2);
    }

    #[test]
    fn test_no_phi_is_empty_success() {
        let (engine, _) = engine_with_memory_audit();
        let document = doc("b", "sin hallazgos relevantes");
        let result = engine.sanitize(&document).unwrap();
        assert_eq!(result.sanitized_text, document.text);
        assert!(result.map.is_empty());
    }

    #[test]
    fn test_round_trip_state() {
        let (engine, sink) = engine_with_memory_audit();
        let document = doc("c", "DR. JUAN PÉREZ LÓPEZ atendió a la PACIENTE: MARÍA GONZÁLEZ");
        let outcome = engine.round_trip(&document).unwrap();
        assert_eq!(outcome.state, DocumentState::Restored);
        assert_eq!(outcome.restored, document.text);
        assert!(outcome.check().is_ok());
        assert_eq!(sink.records().len(), 2);
    }

    #[test]
    fn test_residual_phi_empty_after_sanitize() {
        let (engine, _) = engine_with_memory_audit();
        let document = doc("d", "Email: paciente@correo.mx, CURP: GOHM450315MGTRNR08");
        let result = engine.sanitize(&document).unwrap();
        assert!(engine.residual_phi(&result.sanitized_text).is_empty());
    }

    #[tokio::test]
    async fn test_protect_translation_passthrough() {
        let (engine, _) = engine_with_memory_audit();
        let document = doc("e", "NSS: 12345678901");
        let protected = engine
            .protect_translation(&document, &PassthroughTranslator)
            .await
            .unwrap();
        assert_eq!(protected.text, document.text);
        assert_eq!(protected.state, DocumentState::Restored);
        assert_eq!(protected.phi_count, 1);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let (engine, _) = engine_with_memory_audit();
        let documents = vec![
            doc("1", "NSS: 12345678901"),
            doc("2", "sin datos"),
            doc("3", "CURP: GOHM450315MGTRNR08"),
        ];
        let results = engine.sanitize_batch(documents).await;
        assert_eq!(results.len(), 3);
        let ids: Vec<String> = results
            .iter()
            .map(|r| r.as_ref().unwrap().document_id.to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_invalid_config_is_config_error_state() {
        let mut config = DeidConfig::without_audit();
        config.detection.rule_timeout_ms = 0;
        let err = DeidEngine::new(config).err().unwrap();
        assert_eq!(DocumentState::from_error(&err), DocumentState::ConfigError);
    }

    #[test]
    fn test_state_after_failure() {
        let mismatch = DeidError::RestorationMismatch { offset: 3 };
        let timeout = DeidError::DocumentTimeout {
            document_id: "f".to_string(),
            budget_ms: 5,
        };
        assert_eq!(DocumentState::from_error(&mismatch), DocumentState::Mismatch);
        assert_eq!(DocumentState::from_error(&timeout), DocumentState::Raw);
    }

    #[test]
    fn test_abandoned_document_writes_no_audit_record() {
        let (engine, sink) = engine_with_memory_audit();
        let document = doc("g", "NSS: 12345678901");
        let abandoned = AtomicBool::new(true);

        let result = engine.sanitize_unless_abandoned(&document, Some(&abandoned));
        assert!(matches!(
            result,
            Err(DeidError::DocumentTimeout { ref document_id, .. }) if document_id == "g"
        ));
        assert!(sink.records().is_empty());

        abandoned.store(false, Ordering::Release);
        engine
            .sanitize_unless_abandoned(&document, Some(&abandoned))
            .unwrap();
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn test_report_counts() {
        let (engine, _) = engine_with_memory_audit();
        let report = engine.report(&[
            doc("1", "CURP: GOHM450315MGTRNR08 NSS: 12345678901"),
            doc("2", "sin datos"),
        ]);
        assert_eq!(report.total_documents, 2);
        assert_eq!(report.total_phi_detected, 2);
        assert_eq!(report.stats.documents_without_phi, 1);
    }
}
