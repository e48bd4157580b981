//! Analysis request (input JSON).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The persona the ranking is performed for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PersonaRepr")]
pub struct Persona {
    pub role: String,
}

/// The task the persona wants to accomplish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "JobRepr")]
pub struct JobToBeDone {
    pub task: String,
}

/// Accepts both `{"role": "..."}` and a bare string.
#[derive(Deserialize)]
#[serde(untagged)]
enum PersonaRepr {
    Structured { role: String },
    Plain(String),
}

impl From<PersonaRepr> for Persona {
    fn from(repr: PersonaRepr) -> Self {
        match repr {
            PersonaRepr::Structured { role } | PersonaRepr::Plain(role) => Persona { role },
        }
    }
}

/// Accepts both `{"task": "..."}` and a bare string.
#[derive(Deserialize)]
#[serde(untagged)]
enum JobRepr {
    Structured { task: String },
    Plain(String),
}

impl From<JobRepr> for JobToBeDone {
    fn from(repr: JobRepr) -> Self {
        match repr {
            JobRepr::Structured { task } | JobRepr::Plain(task) => JobToBeDone { task },
        }
    }
}

/// A document entry in the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// PDF file name, resolved against the PDF directory
    pub filename: String,
    /// Human-readable title
    #[serde(default)]
    pub title: String,
}

impl DocumentRef {
    pub fn new(filename: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            title: title.into(),
        }
    }
}

/// A persona + task request over an ordered list of documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub persona: Persona,
    #[serde(alias = "job")]
    pub job_to_be_done: JobToBeDone,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}

impl AnalysisRequest {
    /// Create a request.
    pub fn new(role: impl Into<String>, task: impl Into<String>, documents: Vec<DocumentRef>) -> Self {
        Self {
            persona: Persona { role: role.into() },
            job_to_be_done: JobToBeDone { task: task.into() },
            documents,
        }
    }

    /// Parse a request from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let request: AnalysisRequest = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }

    /// Read and parse a request file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Check the request for structural problems.
    pub fn validate(&self) -> Result<()> {
        if self.persona.role.trim().is_empty() && self.job_to_be_done.task.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "persona and job_to_be_done are both empty".to_string(),
            ));
        }
        if let Some(pos) = self
            .documents
            .iter()
            .position(|d| d.filename.trim().is_empty())
        {
            return Err(Error::InvalidRequest(format!(
                "document {} has an empty filename",
                pos
            )));
        }
        Ok(())
    }

    /// The semantic query: persona role followed by the task.
    pub fn query(&self) -> String {
        format!("{} {}", self.persona.role.trim(), self.job_to_be_done.task.trim())
            .trim()
            .to_string()
    }

    /// Filenames in input order.
    pub fn filenames(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }
}
