use chrono::{DateTime, Duration, Utc};

use crate::config::WINDOW_DAYS;
use crate::error::Result;
use crate::models::{ClientRef, ClientSignals};
use crate::store::ScoringStore;

/// Lower bound of the scoring window, recomputed from `now` on every run.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(WINDOW_DAYS)
}

/// Reads every signal family for one client. Any failed read fails the whole client.
pub async fn read_client_signals(
    store: &dyn ScoringStore,
    client: &ClientRef,
    since: DateTime<Utc>,
) -> Result<ClientSignals> {
    let value_events = store.value_events(client, since).await?;
    let messages = store.message_events(client, since).await?;
    let attendance = store.attendance_records(client, since).await?;
    let sessions_offered = store.count_sessions(client.account_id, since).await?;
    let interactions = store.live_interactions(client, since).await?;

    Ok(ClientSignals {
        value_events,
        messages,
        attendance,
        sessions_offered,
        interactions,
    })
}
