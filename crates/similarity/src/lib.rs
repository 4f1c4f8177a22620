pub mod cache;
pub mod embeddings;
pub mod scorer;

pub use cache::{CacheStats, CachedEmbedder};
pub use embeddings::{Embedder, EmbeddingClient};
pub use scorer::{SimilarityBand, cosine_similarity, interpret_similarity};
