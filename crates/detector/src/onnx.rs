//! Sequence classification with an exported ONNX model and a Hugging Face
//! `tokenizer.json`.

use crate::classifier::{softmax, ClassifierLoader, SequenceClassifier};
use crate::store::ModelStore;
use deck_core::{Error, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tokenizers::{Tokenizer, TruncationParams};

const TOKENIZER_FILE: &str = "tokenizer.json";

/// Knobs for loading and running a classifier.
#[derive(Debug, Clone)]
pub struct OnnxOptions {
    /// Path of the graph inside the model directory.
    pub onnx_file: String,
    /// Longer inputs are truncated to this many tokens.
    pub max_tokens: usize,
    /// Index of the AI-generated class in the model's logits.
    pub ai_label_index: usize,
    pub intra_threads: usize,
}

impl Default for OnnxOptions {
    fn default() -> Self {
        Self {
            onnx_file: "onnx/model.onnx".to_string(),
            max_tokens: 512,
            ai_label_index: 1,
            intra_threads: 4,
        }
    }
}

/// A loaded tokenizer + ONNX session pair.
pub struct OnnxClassifier {
    tokenizer: Tokenizer,
    // Running a session needs exclusive access
    session: Mutex<Session>,
    uses_token_type_ids: bool,
    ai_label_index: usize,
}

impl OnnxClassifier {
    pub fn load(tokenizer_path: &Path, model_path: &Path, options: &OnnxOptions) -> Result<Self> {
        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| Error::ModelLoad(format!("{}: {}", tokenizer_path.display(), e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: options.max_tokens,
                ..Default::default()
            }))
            .map_err(|e| Error::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(None);

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(options.intra_threads))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| Error::ModelLoad(format!("{}: {}", model_path.display(), e)))?;

        let uses_token_type_ids = session.inputs.iter().any(|input| input.name == "token_type_ids");
        log::debug!(
            "Loaded ONNX graph {} (inputs: {:?})",
            model_path.display(),
            session.inputs.iter().map(|i| i.name.as_str()).collect::<Vec<_>>()
        );

        Ok(Self {
            tokenizer,
            session: Mutex::new(session),
            uses_token_type_ids,
            ai_label_index: options.ai_label_index,
        })
    }

    fn logits(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::Tokenizer(e.to_string()))?;

        let to_tensor = |values: &[u32]| {
            let data: Vec<i64> = values.iter().map(|&v| v as i64).collect();
            Tensor::from_array(([1usize, data.len()], data.into_boxed_slice()))
                .map_err(|e| Error::Inference(e.to_string()))
        };
        let input_ids = to_tensor(encoding.get_ids())?;
        let attention_mask = to_tensor(encoding.get_attention_mask())?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Inference("session lock poisoned".to_string()))?;

        let outputs = if self.uses_token_type_ids {
            let token_type_ids = to_tensor(encoding.get_type_ids())?;
            session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])
        }
        .map_err(|e| Error::Inference(e.to_string()))?;

        let (_, logits) = outputs["logits"]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference(e.to_string()))?;
        Ok(logits.to_vec())
    }
}

impl SequenceClassifier for OnnxClassifier {
    fn ai_probability(&self, text: &str) -> Result<f64> {
        let logits = self.logits(text)?;
        let probabilities = softmax(&logits);

        probabilities.get(self.ai_label_index).copied().ok_or_else(|| {
            Error::Inference(format!(
                "model produced {} labels; AI label index is {}",
                probabilities.len(),
                self.ai_label_index
            ))
        })
    }
}

/// Loads [`OnnxClassifier`]s from a [`ModelStore`].
pub struct OnnxClassifierLoader {
    store: ModelStore,
    options: OnnxOptions,
}

impl OnnxClassifierLoader {
    pub fn new(store: ModelStore, options: OnnxOptions) -> Self {
        Self { store, options }
    }
}

impl ClassifierLoader for OnnxClassifierLoader {
    fn load(&self, model_id: &str) -> Result<Box<dyn SequenceClassifier>> {
        log::info!("Initializing AI detector with model: {}", model_id);

        let tokenizer_path = self.store.fetch(model_id, TOKENIZER_FILE)?;
        let model_path = self.store.fetch(model_id, &self.options.onnx_file)?;
        let classifier = OnnxClassifier::load(&tokenizer_path, &model_path, &self.options)?;

        log::info!("AI detector initialized successfully");
        Ok(Box::new(classifier))
    }

    fn is_available(&self, model_id: &str) -> bool {
        self.store.can_download()
            || (self.store.contains(model_id, TOKENIZER_FILE)
                && self.store.contains(model_id, &self.options.onnx_file))
    }
}
