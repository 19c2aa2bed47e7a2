use indexmap::IndexMap;
use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::SESSION_COLLECTION_NAME;
use crate::dao::models::{
    EventReportEntity, ItemReportEntity, ProgramItemEntity, ServiceEntity, ServiceType,
    SessionEntity,
};
use crate::dao::storage::StorageError;

/// Service row as stored in the `services` collection. Dates are kept as BSON
/// datetimes so range filters and sorts can run server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoServiceDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    title: String,
    service_date: DateTime,
    leader: String,
    assigned_group_id: Option<Uuid>,
    service_type: ServiceType,
    location: String,
    is_confirmed: bool,
    month_name: String,
    month_order: Option<i32>,
}

impl From<ServiceEntity> for MongoServiceDocument {
    fn from(value: ServiceEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            service_date: DateTime::from_system_time(value.service_date),
            leader: value.leader,
            assigned_group_id: value.assigned_group_id,
            service_type: value.service_type,
            location: value.location,
            is_confirmed: value.is_confirmed,
            month_name: value.month_name,
            month_order: value.month_order,
        }
    }
}

impl From<MongoServiceDocument> for ServiceEntity {
    fn from(value: MongoServiceDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            service_date: value.service_date.to_system_time(),
            leader: value.leader,
            assigned_group_id: value.assigned_group_id,
            service_type: value.service_type,
            location: value.location,
            is_confirmed: value.is_confirmed,
            month_name: value.month_name,
            month_order: value.month_order,
        }
    }
}

/// One recorded actual time. BSON map keys must be strings, so the entity's
/// id-keyed map is flattened to an array of pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoActualTime {
    item_id: Uuid,
    seconds: i64,
}

/// Live session row as stored in the `live_sessions` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    event_id: Uuid,
    current_item_index: u32,
    elapsed_seconds: i64,
    preparation_seconds: i64,
    is_running: bool,
    is_paused: bool,
    is_preparation_phase: bool,
    completed_items: Vec<Uuid>,
    item_actual_times: Vec<MongoActualTime>,
    event_start_time: Option<DateTime>,
    event_end_time: Option<DateTime>,
    updated_at: DateTime,
}

impl From<SessionEntity> for MongoSessionDocument {
    fn from(value: SessionEntity) -> Self {
        Self {
            id: value.id,
            event_id: value.event_id,
            current_item_index: value.current_item_index as u32,
            elapsed_seconds: value.elapsed_seconds as i64,
            preparation_seconds: value.preparation_seconds as i64,
            is_running: value.is_running,
            is_paused: value.is_paused,
            is_preparation_phase: value.is_preparation_phase,
            completed_items: value.completed_items,
            item_actual_times: value
                .item_actual_times
                .into_iter()
                .map(|(item_id, seconds)| MongoActualTime {
                    item_id,
                    seconds: seconds as i64,
                })
                .collect(),
            event_start_time: value.event_start_time.map(DateTime::from_system_time),
            event_end_time: value.event_end_time.map(DateTime::from_system_time),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoSessionDocument> for SessionEntity {
    type Error = StorageError;

    /// Counters are stored as BSON int64; a negative value means the row was
    /// written by something other than this backend and is rejected rather
    /// than clamped.
    fn try_from(value: MongoSessionDocument) -> Result<Self, Self::Error> {
        let elapsed_seconds = non_negative_seconds(value.elapsed_seconds, "elapsed_seconds")?;
        let preparation_seconds =
            non_negative_seconds(value.preparation_seconds, "preparation_seconds")?;

        let mut item_actual_times = IndexMap::with_capacity(value.item_actual_times.len());
        for entry in value.item_actual_times {
            let seconds = non_negative_seconds(entry.seconds, "item_actual_times")?;
            item_actual_times.insert(entry.item_id, seconds);
        }

        Ok(Self {
            id: value.id,
            event_id: value.event_id,
            current_item_index: value.current_item_index as usize,
            elapsed_seconds,
            preparation_seconds,
            is_running: value.is_running,
            is_paused: value.is_paused,
            is_preparation_phase: value.is_preparation_phase,
            completed_items: value.completed_items,
            item_actual_times,
            event_start_time: value.event_start_time.map(|dt| dt.to_system_time()),
            event_end_time: value.event_end_time.map(|dt| dt.to_system_time()),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

fn non_negative_seconds(value: i64, field: &str) -> Result<u64, StorageError> {
    u64::try_from(value).map_err(|_| {
        StorageError::corrupted(
            SESSION_COLLECTION_NAME,
            format!("negative `{field}` value {value}"),
        )
    })
}

/// Program item as stored in the `program_items` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoProgramItemDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    event_id: Uuid,
    position: u32,
    title: String,
    duration_minutes: u32,
    responsible: Option<String>,
}

impl From<MongoProgramItemDocument> for ProgramItemEntity {
    fn from(value: MongoProgramItemDocument) -> Self {
        Self {
            id: value.id,
            event_id: value.event_id,
            position: value.position,
            title: value.title,
            duration_minutes: value.duration_minutes,
            responsible: value.responsible,
        }
    }
}

/// Event report as stored in the `event_reports` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoReportDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    event_id: Uuid,
    session_id: Uuid,
    generated_at: DateTime,
    planned_total_seconds: i64,
    actual_total_seconds: i64,
    ahead_of_schedule: bool,
    items: Vec<ItemReportEntity>,
}

impl From<EventReportEntity> for MongoReportDocument {
    fn from(value: EventReportEntity) -> Self {
        Self {
            id: value.id,
            event_id: value.event_id,
            session_id: value.session_id,
            generated_at: DateTime::from_system_time(value.generated_at),
            planned_total_seconds: value.planned_total_seconds as i64,
            actual_total_seconds: value.actual_total_seconds as i64,
            ahead_of_schedule: value.ahead_of_schedule,
            items: value.items,
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn session_entity() -> SessionEntity {
        let mut item_actual_times = IndexMap::new();
        item_actual_times.insert(Uuid::new_v4(), 120);
        SessionEntity {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            current_item_index: 1,
            elapsed_seconds: 42,
            preparation_seconds: 7,
            is_running: true,
            is_paused: false,
            is_preparation_phase: false,
            completed_items: vec![Uuid::new_v4()],
            item_actual_times,
            event_start_time: Some(SystemTime::UNIX_EPOCH),
            event_end_time: None,
            updated_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn session_documents_decode_back_into_equal_entities() {
        let entity = session_entity();
        let document = MongoSessionDocument::from(entity.clone());
        let decoded = SessionEntity::try_from(document).unwrap();
        assert_eq!(decoded, entity);
    }

    #[test]
    fn negative_counters_are_rejected_as_corrupted() {
        let mut document = MongoSessionDocument::from(session_entity());
        document.elapsed_seconds = -5;

        let err = SessionEntity::try_from(document).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Corrupted {
                collection: SESSION_COLLECTION_NAME,
                ..
            }
        ));
    }
}
