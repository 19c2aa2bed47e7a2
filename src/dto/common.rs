use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::timer::ProgramItem;

/// Snapshot of one program section for DTO use.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ProgramItemSnapshot {
    pub id: Uuid,
    pub position: u32,
    pub title: String,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible: Option<String>,
}

impl From<&ProgramItem> for ProgramItemSnapshot {
    fn from(item: &ProgramItem) -> Self {
        Self {
            id: item.id,
            position: item.position,
            title: item.title.clone(),
            duration_minutes: item.duration_minutes,
            responsible: item.responsible.clone(),
        }
    }
}
