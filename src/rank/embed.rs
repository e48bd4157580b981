//! Text embedders.
//!
//! [`Embedder`] is the boundary the ranker calls exactly once per run.
//! [`HashingEmbedder`] is deterministic and needs no model files;
//! `MiniLmEmbedder` (feature `local-embeddings`) runs all-MiniLM-L6-v2
//! locally through candle.

use super::similarity::l2_normalize;
use crate::error::{Error, Result};

/// Produces one vector per input text, order preserving.
pub trait Embedder: Send + Sync {
    /// Short identifier used in log output.
    fn name(&self) -> &str;

    /// Embed a batch of texts.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Default embedding dimension, matching all-MiniLM-L6-v2.
pub const DEFAULT_DIMENSION: usize = 384;

/// Function words that carry no topical signal.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is",
    "it", "its", "of", "on", "or", "that", "the", "this", "to", "was", "were", "will", "with",
];

/// Weight of a character trigram relative to a whole word.
const TRIGRAM_WEIGHT: f32 = 0.5;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Feature-hashing embedder over words and character trigrams.
///
/// Texts sharing vocabulary (including inflected forms, through the
/// trigrams) land close together. Output is L2-normalized.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_DIMENSION)
    }

    /// Embedder with a custom dimension (at least 1).
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimension as u64) as usize;
        // Top bit picks the sign so collisions tend to cancel.
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    /// Embed a single text.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
        {
            if STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            self.add_feature(&mut vector, &format!("w:{word}"), 1.0);

            let padded: Vec<char> = format!("^{word}$").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut vector, &format!("t:{gram}"), TRIGRAM_WEIGHT);
            }
        }

        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

/// Check an embedder response: one vector per input, one shared non-zero
/// dimension.
pub fn validate_embeddings(expected: usize, vectors: &[Vec<f32>]) -> Result<usize> {
    if vectors.len() != expected {
        return Err(Error::EmbeddingCountMismatch {
            expected,
            actual: vectors.len(),
        });
    }
    let dimension = vectors.first().map_or(0, Vec::len);
    if dimension == 0 && expected > 0 {
        return Err(Error::Embedding("embedder returned empty vectors".into()));
    }
    if let Some(bad) = vectors.iter().position(|v| v.len() != dimension) {
        return Err(Error::Embedding(format!(
            "vector {} has dimension {}, expected {}",
            bad,
            vectors[bad].len(),
            dimension
        )));
    }
    Ok(dimension)
}

#[cfg(feature = "local-embeddings")]
pub use minilm::MiniLmEmbedder;

#[cfg(feature = "local-embeddings")]
mod minilm {
    use candle_core::{Device, Tensor};
    use candle_nn::VarBuilder;
    use candle_transformers::models::bert::{BertModel, Config, HiddenAct, DTYPE};
    use hf_hub::{api::sync::Api, Repo, RepoType};
    use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

    use super::Embedder;
    use crate::error::{Error, Result};

    const MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
    const REVISION: &str = "main";
    const BATCH_SIZE: usize = 32;

    fn embed_err(context: &str) -> impl Fn(candle_core::Error) -> Error + '_ {
        move |e| Error::Embedding(format!("{context}: {e}"))
    }

    /// all-MiniLM-L6-v2 sentence embeddings on the CPU.
    ///
    /// Model files are fetched from the Hugging Face Hub on first use and
    /// cached locally.
    pub struct MiniLmEmbedder {
        model: BertModel,
        tokenizer: Tokenizer,
        device: Device,
    }

    impl MiniLmEmbedder {
        /// Download (or reuse the cached) model and load it.
        pub fn load() -> Result<Self> {
            let device = Device::Cpu;

            let api = Api::new().map_err(|e| Error::Embedding(format!("hf-hub: {e}")))?;
            let repo = api.repo(Repo::with_revision(
                MODEL_ID.to_string(),
                RepoType::Model,
                REVISION.to_string(),
            ));
            let fetch = |file: &str| {
                repo.get(file)
                    .map_err(|e| Error::Embedding(format!("failed to fetch {file}: {e}")))
            };
            let config_path = fetch("config.json")?;
            let tokenizer_path = fetch("tokenizer.json")?;
            let weights_path = fetch("model.safetensors")?;

            let mut config: Config = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
            config.hidden_act = HiddenAct::Gelu;

            let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| Error::Embedding(format!("failed to load tokenizer: {e}")))?;
            tokenizer.with_padding(Some(PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                ..Default::default()
            }));
            tokenizer
                .with_truncation(Some(TruncationParams {
                    max_length: 512,
                    ..Default::default()
                }))
                .map_err(|e| Error::Embedding(format!("failed to set truncation: {e}")))?;

            // SAFETY: the safetensors file is owned by the hf-hub cache and
            // is not modified while mapped.
            let vb = unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                    .map_err(embed_err("failed to load weights"))?
            };
            let model = BertModel::load(vb, &config).map_err(embed_err("failed to build model"))?;

            log::info!("loaded embedding model {}", MODEL_ID);
            Ok(Self {
                model,
                tokenizer,
                device,
            })
        }

        fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let encodings = self
                .tokenizer
                .encode_batch(texts.to_vec(), true)
                .map_err(|e| Error::Embedding(format!("tokenization failed: {e}")))?;

            let batch_size = encodings.len();
            let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());

            let mut ids = Vec::with_capacity(batch_size * seq_len);
            let mut mask = Vec::with_capacity(batch_size * seq_len);
            let mut type_ids = Vec::with_capacity(batch_size * seq_len);
            for encoding in &encodings {
                ids.extend(encoding.get_ids().iter().map(|&x| x as i64));
                mask.extend(encoding.get_attention_mask().iter().map(|&x| x as i64));
                type_ids.extend(encoding.get_type_ids().iter().map(|&x| x as i64));
            }

            let shape = (batch_size, seq_len);
            let input_ids = Tensor::from_vec(ids, shape, &self.device).map_err(embed_err("input_ids"))?;
            let attention_mask =
                Tensor::from_vec(mask, shape, &self.device).map_err(embed_err("attention_mask"))?;
            let token_type_ids =
                Tensor::from_vec(type_ids, shape, &self.device).map_err(embed_err("token_type_ids"))?;

            let hidden = self
                .model
                .forward(&input_ids, &token_type_ids, Some(&attention_mask))
                .map_err(embed_err("forward pass"))?;

            // Mean pooling over non-padding tokens
            let mask = attention_mask
                .unsqueeze(2)
                .and_then(|m| m.to_dtype(DTYPE))
                .and_then(|m| m.broadcast_as(hidden.shape()))
                .map_err(embed_err("mask"))?;
            let summed = hidden.mul(&mask).and_then(|h| h.sum(1)).map_err(embed_err("pooling"))?;
            let counts = mask
                .sum(1)
                .and_then(|c| c.clamp(1e-9, f64::MAX))
                .map_err(embed_err("pooling"))?;
            let pooled = summed.div(&counts).map_err(embed_err("pooling"))?;

            // L2 normalize
            let norm = pooled
                .sqr()
                .and_then(|p| p.sum_keepdim(1))
                .and_then(|p| p.sqrt())
                .and_then(|p| p.clamp(1e-12, f64::MAX))
                .map_err(embed_err("normalize"))?;
            let normalized = pooled.broadcast_div(&norm).map_err(embed_err("normalize"))?;

            normalized.to_vec2::<f32>().map_err(embed_err("to_vec2"))
        }
    }

    impl Embedder for MiniLmEmbedder {
        fn name(&self) -> &str {
            MODEL_ID
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut vectors = Vec::with_capacity(texts.len());
            for chunk in texts.chunks(BATCH_SIZE) {
                vectors.extend(self.embed_chunk(chunk)?);
            }
            Ok(vectors)
        }
    }
}
