use crate::blob_store::FsBlobStore;
use crate::error::ServiceError;
use crate::model::{AnalysisResult, Issue, SkinType};
use crate::result_store::FsResultStore;
use md5::{Digest, Md5};
use metrics::counter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{info, instrument};

/// Idempotent analysis engine
///
/// Coordinates the result store (idempotency) and the blob store
/// (referential integrity) around a deterministic derivation. Holds no
/// state of its own between calls: the result store is consulted on
/// every request, which keeps concurrent server processes sharing the
/// same data directory consistent.
pub struct AnalysisEngine {
    blob_store: Arc<FsBlobStore>,
    result_store: Arc<FsResultStore>,
}

impl AnalysisEngine {
    pub fn new(blob_store: Arc<FsBlobStore>, result_store: Arc<FsResultStore>) -> Self {
        Self {
            blob_store,
            result_store,
        }
    }

    /// Analyze an image, deriving at most once per identifier
    ///
    /// Fast path: an existing record is returned verbatim without
    /// re-deriving or re-checking blob existence. Miss path: the blob
    /// must exist, the result is derived, persisted, and returned. Two
    /// concurrent first calls may both derive; the derivation is a pure
    /// function of the identifier, so the last write is identical to
    /// the first and the race is harmless.
    #[instrument(skip(self))]
    pub async fn analyze(&self, image_id: &str) -> Result<AnalysisResult, ServiceError> {
        if let Some(cached) = self.result_store.get(image_id).await {
            info!(image_id = %image_id, "Analysis retrieved from cache");
            counter!("analysis_requests_total", "outcome" => "cached").increment(1);
            return Ok(cached);
        }

        if !self.blob_store.exists(image_id).await? {
            counter!("analysis_requests_total", "outcome" => "not_found").increment(1);
            return Err(ServiceError::NotFound {
                image_id: image_id.to_string(),
            });
        }

        let result = derive_result(image_id);
        self.result_store.put(image_id, &result).await?;

        info!(
            image_id = %image_id,
            skin_type = %result.skin_type,
            confidence = result.confidence,
            "Analysis performed"
        );
        counter!("analysis_requests_total", "outcome" => "derived").increment(1);

        Ok(result)
    }
}

/// Reduce the MD5 digest of the identifier to a 32-bit seed
///
/// The digest is read as a big non-negative integer and taken modulo
/// 2^32, which is its low 4 bytes in big-endian order. MD5 matches the
/// digest the original deployment seeded from; the seed rule must stay
/// stable or previously stored results would diverge from fresh ones.
fn seed_for(image_id: &str) -> u32 {
    let digest = Md5::digest(image_id.as_bytes());
    u32::from_be_bytes([digest[12], digest[13], digest[14], digest[15]])
}

/// Derive the analysis result for an identifier
///
/// Pure function: no clock, no I/O, no global state. The draw order is
/// fixed — skin type, issue count, issue sample, confidence — so the
/// same identifier maps to the same record on every call in every
/// process.
pub fn derive_result(image_id: &str) -> AnalysisResult {
    let mut rng = StdRng::seed_from_u64(seed_for(image_id) as u64);

    let skin_type = SkinType::ALL[rng.gen_range(0..SkinType::ALL.len())];

    let issue_count = rng.gen_range(1..=3);
    let issues: Vec<Issue> = Issue::ALL
        .choose_multiple(&mut rng, issue_count)
        .copied()
        .collect();

    let confidence = 0.70 + rng.gen::<f64>() * 0.25;
    let confidence = (confidence * 100.0).round() / 100.0;

    AnalysisResult {
        image_id: image_id.to_string(),
        skin_type,
        issues,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct TestHarness {
        _temp_dir: TempDir,
        blob_store: Arc<FsBlobStore>,
        result_store: Arc<FsResultStore>,
        engine: AnalysisEngine,
    }

    fn harness() -> TestHarness {
        let temp_dir = TempDir::new().unwrap();
        let blob_store = Arc::new(FsBlobStore::new(temp_dir.path().join("images")));
        let result_store = Arc::new(FsResultStore::new(temp_dir.path().join("analysis")));
        let engine = AnalysisEngine::new(blob_store.clone(), result_store.clone());
        TestHarness {
            _temp_dir: temp_dir,
            blob_store,
            result_store,
            engine,
        }
    }

    #[test]
    fn test_derivation_is_deterministic() {
        for id in ["a", "some-uuid-ish-id", "5bb0e8400-e29b-41d4"] {
            assert_eq!(derive_result(id), derive_result(id));
        }
    }

    #[test]
    fn test_derivation_respects_field_invariants() {
        for i in 0..200 {
            let result = derive_result(&format!("image-{i}"));

            assert!((1..=3).contains(&result.issues.len()));

            let mut deduped = result.issues.clone();
            deduped.sort_by_key(|issue| issue.to_string());
            deduped.dedup();
            assert_eq!(deduped.len(), result.issues.len(), "duplicate issues");

            assert!(result.confidence >= 0.70 && result.confidence <= 0.95);
            // Rounded to 2 decimals
            let scaled = result.confidence * 100.0;
            assert!((scaled - scaled.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_different_ids_can_diverge() {
        // Not guaranteed for any given pair, but across 50 ids the
        // derivation must not be constant.
        let first = derive_result("id-0");
        let diverges = (1..50).any(|i| derive_result(&format!("id-{i}")) != first);
        assert!(diverges);
    }

    #[test]
    fn test_seed_is_stable() {
        assert_eq!(seed_for("x"), seed_for("x"));
        assert_ne!(seed_for("x"), seed_for("y"));
    }

    #[tokio::test]
    async fn test_analyze_unknown_id_is_not_found() {
        let h = harness();

        let err = h.engine.analyze("missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_analyze_derives_persists_and_repeats() {
        let h = harness();
        h.blob_store.save("img-1", "png", b"png").await.unwrap();

        let first = h.engine.analyze("img-1").await.unwrap();
        assert_eq!(first, derive_result("img-1"));
        assert_eq!(h.result_store.get("img-1").await.unwrap(), first);

        let second = h.engine.analyze("img-1").await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_cached_result_returned_verbatim() {
        // A pre-existing record wins even if it differs from what a
        // fresh derivation would produce, and no write replaces it.
        let h = harness();
        h.blob_store.save("img-2", "jpg", b"jpg").await.unwrap();

        let mut doctored = derive_result("img-2");
        doctored.confidence = 0.71;
        doctored.skin_type = SkinType::Normal;
        h.result_store.put("img-2", &doctored).await.unwrap();

        let returned = h.engine.analyze("img-2").await.unwrap();
        assert_eq!(returned, doctored);
        assert_eq!(h.result_store.get("img-2").await.unwrap(), doctored);
    }

    #[tokio::test]
    async fn test_cached_result_skips_existence_check() {
        // Fast path must not consult the blob store: a record with no
        // backing image is still served.
        let h = harness();

        let orphan = derive_result("img-3");
        h.result_store.put("img-3", &orphan).await.unwrap();

        let returned = h.engine.analyze("img-3").await.unwrap();
        assert_eq!(returned, orphan);
    }

    #[tokio::test]
    async fn test_corrupt_record_triggers_rederivation() {
        let h = harness();
        h.blob_store.save("img-4", "png", b"png").await.unwrap();

        tokio::fs::create_dir_all(h.result_store.analysis_dir())
            .await
            .unwrap();
        tokio::fs::write(
            h.result_store.analysis_dir().join("img-4.json"),
            b"garbage",
        )
        .await
        .unwrap();

        let result = h.engine.analyze("img-4").await.unwrap();
        assert_eq!(result, derive_result("img-4"));
        assert_eq!(h.result_store.get("img-4").await.unwrap(), result);
    }
}
