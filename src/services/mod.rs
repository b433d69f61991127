// src/services/mod.rs
pub mod index_builder;
pub mod lead_detector;
pub mod lead_notifier;
pub mod llm;
pub mod metrics_manager;
pub mod retriever;
pub mod text_splitter;
pub mod vector_index;
