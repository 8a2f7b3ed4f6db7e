// src/generate/mod.rs

//! Question production for both lanes.
//!
//! - [`backend`] defines the text-generation collaborator.
//! - [`normalize`] cleans generated text and fingerprints questions.
//! - [`prompt`] builds the generation prompt.
//! - [`generator`] applies admission, backpressure and duplicate rules.

pub mod backend;
pub mod generator;
pub mod normalize;
pub mod prompt;

pub use backend::{CommandTextGenerator, TextGenerator};
pub use generator::{ExploreOutcome, GeneratorSettings, QuestionGenerator, StructuredAdmission};
pub use normalize::{clean_generated, fingerprint, normalize_question};
