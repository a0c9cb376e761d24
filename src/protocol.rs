//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::catalog::ModelInfo;
use crate::domain::{Level, Question};

#[derive(Debug, Deserialize)]
pub struct GenerateTextIn {
    pub topic: String,
    pub language: String,
    pub level: Level,
    pub style: String,
    /// Provider identifier ("ollama" | "groq"); server default when absent.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsIn {
    pub generated_text: String,
    pub num_questions: usize,
    pub language: String,
    pub choices_num: usize,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionsOut {
    pub questions: Vec<Question>,
}

#[derive(Debug, Serialize)]
pub struct ModelsOut {
    pub models: Vec<ModelInfo>,
}

#[derive(Serialize)]
pub struct RootOut {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
