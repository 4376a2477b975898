//! Text processing, extraction, similarity and ranking

pub mod embedding_manager;
pub mod embeddings;
pub mod entities;
pub mod pipeline;
pub mod ranker;
pub mod text_processor;
pub mod vocabulary;
