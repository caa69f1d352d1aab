//! Schema-learning memory: remembered mappings and relationship vocabulary.

mod mapping_memory;
mod vocabulary;

pub use mapping_memory::MappingMemory;
pub use vocabulary::VocabularyLearner;
