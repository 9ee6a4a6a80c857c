use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::AccountSettings;
use crate::error::Result;
use crate::models::{
    AttendanceRecord, ClientRef, ClientStatus, LiveInteractionRecord, MessageEvent, ScoreSnapshot,
    ValueEvent,
};

/// Everything the engine reads from or writes to the data store.
///
/// Event readers return rows with timestamps at or after `since`.
#[async_trait]
pub trait ScoringStore: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<Uuid>>;

    /// `None` when the account has no settings row.
    async fn load_settings(&self, account_id: Uuid) -> Result<Option<AccountSettings>>;

    async fn list_clients(&self, account_id: Uuid) -> Result<Vec<ClientRef>>;

    async fn find_client(&self, account_id: Uuid, client_id: Uuid) -> Result<Option<ClientRef>>;

    async fn value_events(&self, client: &ClientRef, since: DateTime<Utc>)
        -> Result<Vec<ValueEvent>>;

    async fn message_events(
        &self,
        client: &ClientRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<MessageEvent>>;

    async fn attendance_records(
        &self,
        client: &ClientRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>>;

    /// Sessions offered account-wide with `start_time >= since`.
    async fn count_sessions(&self, account_id: Uuid, since: DateTime<Utc>) -> Result<i64>;

    async fn live_interactions(
        &self,
        client: &ClientRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<LiveInteractionRecord>>;

    async fn latest_snapshot(&self, client: &ClientRef) -> Result<Option<ScoreSnapshot>>;

    async fn insert_snapshot(&self, snapshot: &ScoreSnapshot) -> Result<()>;

    async fn update_client_status(&self, client: &ClientRef, status: ClientStatus) -> Result<()>;
}
