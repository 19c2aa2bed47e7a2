use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoProgramItemDocument, MongoReportDocument, MongoServiceDocument, MongoSessionDocument,
        doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    models::{EventReportEntity, ProgramItemEntity, ServiceEntity, SessionEntity},
    schedule_store::ScheduleStore,
    storage::StorageResult,
};

const SERVICE_COLLECTION_NAME: &str = "services";
pub(super) const SESSION_COLLECTION_NAME: &str = "live_sessions";
const PROGRAM_ITEM_COLLECTION_NAME: &str = "program_items";
const REPORT_COLLECTION_NAME: &str = "event_reports";

/// Wire value of [`ServiceType::Sunday`], used in server-side filters.
const SUNDAY_SERVICE_TYPE: &str = "Servicio Dominical";

#[derive(Clone)]
pub struct MongoScheduleStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoScheduleStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // Range deletes, the prior-December lookup, and year counts all filter
        // or sort on service_date.
        let services = database.collection::<mongodb::bson::Document>(SERVICE_COLLECTION_NAME);
        let service_index = mongodb::IndexModel::builder()
            .keys(doc! {"service_date": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("service_date_idx".to_owned()))
                    .build(),
            )
            .build();
        services
            .create_index(service_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SERVICE_COLLECTION_NAME,
                index: "service_date",
                source,
            })?;

        let sessions = database.collection::<mongodb::bson::Document>(SESSION_COLLECTION_NAME);
        let session_index = mongodb::IndexModel::builder()
            .keys(doc! {"event_id": 1, "event_end_time": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("session_event_idx".to_owned()))
                    .build(),
            )
            .build();
        sessions
            .create_index(session_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SESSION_COLLECTION_NAME,
                index: "event_id,event_end_time",
                source,
            })?;

        let items = database.collection::<mongodb::bson::Document>(PROGRAM_ITEM_COLLECTION_NAME);
        let item_index = mongodb::IndexModel::builder()
            .keys(doc! {"event_id": 1, "position": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("program_item_event_idx".to_owned()))
                    .build(),
            )
            .build();
        items
            .create_index(item_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PROGRAM_ITEM_COLLECTION_NAME,
                index: "event_id,position",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn service_collection(&self) -> Collection<MongoServiceDocument> {
        self.database()
            .await
            .collection::<MongoServiceDocument>(SERVICE_COLLECTION_NAME)
    }

    async fn session_collection(&self) -> Collection<MongoSessionDocument> {
        self.database()
            .await
            .collection::<MongoSessionDocument>(SESSION_COLLECTION_NAME)
    }

    async fn program_item_collection(&self) -> Collection<MongoProgramItemDocument> {
        self.database()
            .await
            .collection::<MongoProgramItemDocument>(PROGRAM_ITEM_COLLECTION_NAME)
    }

    async fn report_collection(&self) -> Collection<MongoReportDocument> {
        self.database()
            .await
            .collection::<MongoReportDocument>(REPORT_COLLECTION_NAME)
    }

    async fn insert_services(&self, services: Vec<ServiceEntity>) -> MongoResult<usize> {
        let count = services.len();
        let documents = services
            .into_iter()
            .map(MongoServiceDocument::from)
            .collect::<Vec<_>>();

        let collection = self.service_collection().await;
        let result = collection
            .insert_many(documents)
            .await
            .map_err(|source| MongoDaoError::InsertServices { count, source })?;

        Ok(result.inserted_ids.len())
    }

    async fn delete_services_between(&self, from: SystemTime, to: SystemTime) -> MongoResult<u64> {
        let collection = self.service_collection().await;
        let result = collection
            .delete_many(doc! {
                "service_date": {
                    "$gte": DateTime::from_system_time(from),
                    "$lt": DateTime::from_system_time(to),
                }
            })
            .await
            .map_err(|source| MongoDaoError::DeleteServices { source })?;

        Ok(result.deleted_count)
    }

    async fn count_services_between(&self, from: SystemTime, to: SystemTime) -> MongoResult<u64> {
        let collection = self.service_collection().await;
        collection
            .count_documents(doc! {
                "service_date": {
                    "$gte": DateTime::from_system_time(from),
                    "$lt": DateTime::from_system_time(to),
                }
            })
            .await
            .map_err(|source| MongoDaoError::CountServices { source })
    }

    async fn last_sunday_services_before(
        &self,
        cutoff: SystemTime,
        limit: usize,
    ) -> MongoResult<Vec<ServiceEntity>> {
        let collection = self.service_collection().await;
        let documents: Vec<MongoServiceDocument> = collection
            .find(doc! {
                "service_type": SUNDAY_SERVICE_TYPE,
                "service_date": { "$lt": DateTime::from_system_time(cutoff) },
            })
            .sort(doc! {"service_date": -1})
            .limit(limit as i64)
            .await
            .map_err(|source| MongoDaoError::QueryServices { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryServices { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_open_session(&self, event_id: Uuid) -> MongoResult<Option<MongoSessionDocument>> {
        let collection = self.session_collection().await;
        collection
            .find_one(doc! {
                "event_id": uuid_as_binary(event_id),
                "event_end_time": null,
            })
            .await
            .map_err(|source| MongoDaoError::LoadSession { event_id, source })
    }

    async fn save_session(&self, session: SessionEntity) -> MongoResult<()> {
        let id = session.id;
        let document: MongoSessionDocument = session.into();
        let collection = self.session_collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveSession { id, source })?;

        Ok(())
    }

    async fn list_program_items(&self, event_id: Uuid) -> MongoResult<Vec<ProgramItemEntity>> {
        let collection = self.program_item_collection().await;
        let documents: Vec<MongoProgramItemDocument> = collection
            .find(doc! {"event_id": uuid_as_binary(event_id)})
            .sort(doc! {"position": 1})
            .await
            .map_err(|source| MongoDaoError::ListProgramItems { event_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListProgramItems { event_id, source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn save_report(&self, report: EventReportEntity) -> MongoResult<()> {
        let id = report.id;
        let document: MongoReportDocument = report.into();
        let collection = self.report_collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveReport { id, source })?;

        Ok(())
    }
}

impl ScheduleStore for MongoScheduleStore {
    fn insert_services(
        &self,
        services: Vec<ServiceEntity>,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { store.insert_services(services).await.map_err(Into::into) })
    }

    fn delete_services_between(
        &self,
        from: SystemTime,
        to: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_services_between(from, to)
                .await
                .map_err(Into::into)
        })
    }

    fn count_services_between(
        &self,
        from: SystemTime,
        to: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .count_services_between(from, to)
                .await
                .map_err(Into::into)
        })
    }

    fn last_sunday_services_before(
        &self,
        cutoff: SystemTime,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ServiceEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .last_sunday_services_before(cutoff, limit)
                .await
                .map_err(Into::into)
        })
    }

    fn find_open_session(
        &self,
        event_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store.find_open_session(event_id).await?;
            document.map(SessionEntity::try_from).transpose()
        })
    }

    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_session(session).await.map_err(Into::into) })
    }

    fn list_program_items(
        &self,
        event_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ProgramItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_program_items(event_id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_report(&self, report: EventReportEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_report(report).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
