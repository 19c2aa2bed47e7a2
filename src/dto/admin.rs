//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::validate_target_year;
use crate::schedule::GenerationBreakdown;

/// Request to generate the yearly service schedule.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateYearRequest {
    /// Calendar year to generate services for.
    pub year: i32,
}

impl Validate for GenerateYearRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_target_year(self.year) {
            errors.add("year", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Summary returned after a successful yearly generation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenerationSummary {
    /// The year that was generated.
    pub year: i32,
    /// Number of Sunday services inserted (two per Sunday).
    pub sunday_services: usize,
    /// Number of Saturday quarantine services inserted.
    pub quarantine_saturdays: usize,
    /// Number of Wednesday quarantine services inserted.
    pub quarantine_wednesdays: usize,
    /// Total rows written to storage.
    pub total_inserted: usize,
    /// Whether the rotation continued from the previous December.
    pub continued_from_prior_year: bool,
}

impl GenerationSummary {
    /// Assemble the summary from the planner's breakdown.
    pub fn from_breakdown(
        year: i32,
        breakdown: &GenerationBreakdown,
        inserted: usize,
        continued_from_prior_year: bool,
    ) -> Self {
        Self {
            year,
            sunday_services: breakdown.sunday_services,
            quarantine_saturdays: breakdown.quarantine_saturdays,
            quarantine_wednesdays: breakdown.quarantine_wednesdays,
            total_inserted: inserted,
            continued_from_prior_year,
        }
    }
}

/// Summary returned after deleting a year's schedule.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeleteYearSummary {
    /// The year whose services were removed.
    pub year: i32,
    /// Number of rows deleted.
    pub deleted: u64,
}
