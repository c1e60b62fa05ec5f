//! Project description supplied when a flow starts.

use crate::errors::{FlowError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The project a flow is run for.
///
/// Created once at flow start and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    /// Project name.
    pub name: String,
    /// First day of the project.
    pub start_date: Option<NaiveDate>,
    /// Planned delivery date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_end_date: Option<NaiveDate>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProjectContext {
    /// Creates a new project context.
    #[must_use]
    pub fn new(name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date: Some(start_date),
            target_end_date: None,
            description: None,
        }
    }

    /// Sets the target end date.
    #[must_use]
    pub fn with_target_end_date(mut self, date: NaiveDate) -> Self {
        self.target_end_date = Some(date);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks that the fields required to start a flow are present.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidContext` if the name is blank or the start
    /// date is missing.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FlowError::invalid_context("name is required"));
        }
        if self.start_date.is_none() {
            return Err(FlowError::invalid_context("startDate is required"));
        }
        Ok(())
    }
}
