//! Exam document parsing.
//!
//! Loads exams (rubric sets) from TOML files and directories, parses
//! extracted answer-sheet payloads from JSON, and validates exams for
//! common authoring issues.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Exam, RubricItem, StudentAnswer};

/// Intermediate TOML structure for exam files.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: String,
    name: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    text: String,
    model_answer: String,
    #[serde(default)]
    keywords: Vec<String>,
    max_marks: f64,
}

/// Parse a single TOML file into an [`Exam`].
pub fn parse_exam(path: &Path) -> Result<Exam> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, path)
}

/// Parse a TOML string into an [`Exam`] (useful for testing).
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<Exam> {
    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| RubricItem::new(q.id, q.text, q.model_answer, q.keywords, q.max_marks))
        .collect();

    Ok(Exam {
        id: parsed.exam.id,
        name: parsed.exam.name,
        subject: parsed.exam.subject,
        description: parsed.exam.description,
        questions,
    })
}

/// Recursively load all `.toml` exam files from a directory. Files that
/// fail to parse are skipped with a warning.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<Exam>> {
    let mut exams = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            exams.extend(load_exam_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exam(&path) {
                Ok(exam) => exams.push(exam),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(exams)
}

/// One sheet's extracted answers, as delivered by the upstream
/// OCR/upload pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetAnswers {
    /// Identifier of the uploaded answer sheet.
    pub sheet_id: String,
    /// Identifier of the student the sheet belongs to.
    pub student_id: String,
    /// Extracted answers; questions without an answer may be omitted.
    #[serde(default)]
    pub answers: Vec<StudentAnswer>,
}

/// Parse an extracted answer-sheet payload from JSON.
pub fn parse_answers_json_str(content: &str) -> Result<SheetAnswers> {
    serde_json::from_str(content).context("failed to parse answer sheet JSON")
}

/// A warning from exam validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question id (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an exam for common authoring issues.
pub fn validate_exam(exam: &Exam) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Duplicate question ids
    let mut seen_ids = std::collections::HashSet::new();
    for question in &exam.questions {
        if !seen_ids.insert(&question.question_id) {
            warnings.push(ValidationWarning {
                question_id: Some(question.question_id.clone()),
                message: format!("duplicate question id: {}", question.question_id),
            });
        }
    }

    // Keyword sets that ended up empty (nothing usable survives
    // normalization) cannot be auto-graded
    for question in &exam.questions {
        if question.keywords.is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(question.question_id.clone()),
                message: "no usable keywords; this question will require manual grading".into(),
            });
        }
    }

    // Non-positive max marks
    for question in &exam.questions {
        if question.max_marks.is_nan() || question.max_marks <= 0.0 {
            warnings.push(ValidationWarning {
                question_id: Some(question.question_id.clone()),
                message: format!("max_marks must be positive, got {}", question.max_marks),
            });
        }
    }

    // Empty model answers weaken the length signal
    for question in &exam.questions {
        if question.model_answer.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(question.question_id.clone()),
                message: "model answer is empty".into(),
            });
        }
    }

    if exam.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "exam has no questions".into(),
        });
    }

    warnings
}
