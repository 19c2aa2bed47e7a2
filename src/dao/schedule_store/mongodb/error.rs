use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to insert batch of {count} service rows")]
    InsertServices {
        count: usize,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete service rows in range")]
    DeleteServices {
        #[source]
        source: MongoError,
    },
    #[error("failed to count service rows in range")]
    CountServices {
        #[source]
        source: MongoError,
    },
    #[error("failed to query service rows")]
    QueryServices {
        #[source]
        source: MongoError,
    },
    #[error("failed to save live session `{id}`")]
    SaveSession {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load open session for event `{event_id}`")]
    LoadSession {
        event_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list program items for event `{event_id}`")]
    ListProgramItems {
        event_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save event report `{id}`")]
    SaveReport {
        id: Uuid,
        #[source]
        source: MongoError,
    },
}
