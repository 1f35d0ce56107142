//! One shared detector per model, created on first use.

use crate::classifier::ClassifierLoader;
use crate::detector::{AiDetector, MIN_TEXT_LENGTH_FOR_DETECTION};
use crate::store::validate_model_id;
use deck_core::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

/// A model's detector, filled by the first caller that asks for it.
type Slot = Arc<Mutex<Option<Arc<AiDetector>>>>;

/// Lazily-populated map from model id to detector. Entries are never evicted.
///
/// The map lock is only held to look up a model's slot. Loading happens under
/// that model's slot lock, so a slow load blocks callers of the same model and
/// nobody else.
pub struct DetectorRegistry {
    loader: Box<dyn ClassifierLoader>,
    default_model: String,
    min_text_length: usize,
    detectors: Mutex<HashMap<String, Slot>>,
}

impl DetectorRegistry {
    pub fn new(loader: impl ClassifierLoader + 'static, default_model: impl Into<String>) -> Self {
        Self {
            loader: Box::new(loader),
            default_model: default_model.into(),
            min_text_length: MIN_TEXT_LENGTH_FOR_DETECTION,
            detectors: Mutex::new(HashMap::new()),
        }
    }

    /// Length below which created detectors warn about reliability.
    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// The detector for `model`, or for the default model when `model` is
    /// absent or blank. The first request for a model loads it.
    pub fn get(&self, model: Option<&str>) -> Result<Arc<AiDetector>> {
        let model_id = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model);
        validate_model_id(model_id)?;

        let slot = {
            let mut detectors = self.lock();
            Arc::clone(detectors.entry(model_id.to_string()).or_default())
        };

        // Concurrent first requests for one model load it once
        let mut loaded = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(detector) = loaded.as_ref() {
            return Ok(Arc::clone(detector));
        }

        log::info!("Loading detector model '{}'", model_id);
        let classifier = self.loader.load(model_id)?;
        let detector = Arc::new(
            AiDetector::new(model_id, classifier).with_min_text_length(self.min_text_length),
        );
        *loaded = Some(Arc::clone(&detector));
        Ok(detector)
    }

    /// Whether `model_id` has finished loading. Never waits on a load in
    /// progress.
    pub fn is_loaded(&self, model_id: &str) -> bool {
        let Some(slot) = self.lock().get(model_id).cloned() else {
            return false;
        };
        let loaded = match slot.try_lock() {
            Ok(guard) => guard.is_some(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_some(),
            Err(TryLockError::WouldBlock) => false,
        };
        loaded
    }

    /// Whether the default model is loaded or could be loaded.
    pub fn is_ready(&self) -> bool {
        self.is_loaded(&self.default_model) || self.loader.is_available(&self.default_model)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // Slots are only inserted, so a poisoned map is still consistent
        self.detectors.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SequenceClassifier;
    use crate::detector::tests::FixedClassifier;
    use deck_core::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    struct CountingLoader {
        loads: Arc<AtomicUsize>,
        available: bool,
    }

    impl ClassifierLoader for CountingLoader {
        fn load(&self, model_id: &str) -> Result<Box<dyn SequenceClassifier>> {
            if model_id == "missing" {
                return Err(Error::ModelLoad("no such model".into()));
            }
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(FixedClassifier::boxed(0.9).0)
        }

        fn is_available(&self, _model_id: &str) -> bool {
            self.available
        }
    }

    fn registry(available: bool) -> (DetectorRegistry, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let loader = CountingLoader {
            loads: Arc::clone(&loads),
            available,
        };
        (DetectorRegistry::new(loader, "default-model"), loads)
    }

    #[test]
    fn test_detectors_are_reused_per_model() {
        let (registry, loads) = registry(true);

        let first = registry.get(None).unwrap();
        let second = registry.get(Some("default-model")).unwrap();
        let other = registry.get(Some("other-model")).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.model_name(), "default-model");
        assert_eq!(other.model_name(), "other-model");
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_blank_model_means_default() {
        let (registry, _) = registry(true);
        assert_eq!(registry.get(Some("  ")).unwrap().model_name(), "default-model");
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let (registry, _) = registry(true);

        assert!(registry.get(Some("missing")).is_err());
        assert!(!registry.is_loaded("missing"));
    }

    #[test]
    fn test_invalid_model_name_rejected() {
        let (registry, loads) = registry(true);

        let err = registry.get(Some("../../etc/passwd")).unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    /// Blocks in `load` until released, after announcing that it started.
    struct SlowLoader {
        started: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl ClassifierLoader for SlowLoader {
        fn load(&self, model_id: &str) -> Result<Box<dyn SequenceClassifier>> {
            if model_id == "slow-model" {
                let _ = self.started.lock().unwrap().send(());
                let _ = self.release.lock().unwrap().recv_timeout(Duration::from_secs(10));
            }
            Ok(FixedClassifier::boxed(0.9).0)
        }

        fn is_available(&self, _model_id: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_slow_load_does_not_block_other_models() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let registry = Arc::new(DetectorRegistry::new(
            SlowLoader {
                started: Mutex::new(started_tx),
                release: Mutex::new(release_rx),
            },
            "default-model",
        ));
        registry.get(None).unwrap();

        let loading = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.get(Some("slow-model")).map(|d| d.model_name().to_string()))
        };
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // The slow load is still in progress here
        assert!(registry.is_ready());
        assert!(!registry.is_loaded("slow-model"));
        assert_eq!(registry.get(None).unwrap().model_name(), "default-model");

        release_tx.send(()).unwrap();
        assert_eq!(loading.join().unwrap().unwrap(), "slow-model");
        assert!(registry.is_loaded("slow-model"));
    }

    #[test]
    fn test_readiness() {
        let (registry, _) = registry(false);
        assert!(!registry.is_ready());

        registry.get(None).unwrap();
        assert!(registry.is_ready());
    }
}
