use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classify;
use crate::config::AccountSettings;
use crate::engagement::score_engagement;
use crate::error::{Result, ScoringError};
use crate::models::{AccountResult, ClientRef, ClientStatus, RunRequest, RunSummary, ScoreSnapshot};
use crate::roi::score_roi;
use crate::signals::{read_client_signals, window_start};
use crate::store::ScoringStore;

/// Appends the snapshot, then applies the status policy. Status is only touched
/// once the insert has succeeded. Once the snapshot is persisted the client counts
/// as processed, so a failed status update is logged rather than returned.
pub async fn write_snapshot(
    store: &dyn ScoringStore,
    client: &ClientRef,
    snapshot: &ScoreSnapshot,
    settings: &AccountSettings,
) -> Result<Option<ClientStatus>> {
    store.insert_snapshot(snapshot).await?;

    let Some(status) = classify::status_change(snapshot.escore, snapshot.roizometer, settings)
    else {
        return Ok(None);
    };

    match store.update_client_status(client, status).await {
        Ok(()) => {
            info!(
                client_id = %client.id,
                status = status.as_str(),
                "client status updated"
            );
            Ok(Some(status))
        }
        Err(err) => {
            warn!(
                client_id = %client.id,
                status = status.as_str(),
                error = %err,
                "status update failed after snapshot insert"
            );
            Ok(None)
        }
    }
}

pub async fn score_client(
    store: &dyn ScoringStore,
    client: &ClientRef,
    settings: &AccountSettings,
    now: DateTime<Utc>,
) -> Result<ScoreSnapshot> {
    let signals = read_client_signals(store, client, window_start(now)).await?;

    let roizometer = score_roi(&signals.value_events, settings).roizometer();
    let engagement = score_engagement(&signals, settings);
    let escore = engagement.escore();

    let previous = store.latest_snapshot(client).await?;
    let snapshot = ScoreSnapshot {
        account_id: client.account_id,
        client_id: client.id,
        escore,
        roizometer,
        quadrant: classify::quadrant(escore, roizometer),
        trend: classify::trend(escore, roizometer, previous.as_ref()),
        computed_at: now,
    };
    debug!(
        client_id = %client.id,
        escore,
        roizometer,
        messages = engagement.messages,
        presence = engagement.presence,
        participation = engagement.participation,
        last_activity = ?signals.last_activity(),
        "client scored"
    );

    write_snapshot(store, client, &snapshot, settings).await?;
    Ok(snapshot)
}

async fn clients_for(
    store: &dyn ScoringStore,
    account_id: Uuid,
    client_id: Option<Uuid>,
) -> Result<Vec<ClientRef>> {
    match client_id {
        Some(client_id) => store
            .find_client(account_id, client_id)
            .await?
            .map(|client| vec![client])
            .ok_or_else(|| ScoringError::NotFound(format!("client {client_id}"))),
        None => store.list_clients(account_id).await,
    }
}

pub async fn score_account(
    store: &dyn ScoringStore,
    account_id: Uuid,
    client_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> AccountResult {
    let mut result = AccountResult {
        account_id,
        clients_processed: 0,
        errors: Vec::new(),
    };

    let settings = match store.load_settings(account_id).await {
        Ok(settings) => settings.unwrap_or_default(),
        Err(err) => {
            result.errors.push(format!("settings: {err}"));
            return result;
        }
    };

    let clients = match clients_for(store, account_id, client_id).await {
        Ok(clients) => clients,
        Err(err) => {
            warn!(account_id = %account_id, error = %err, "failed to list clients");
            result.errors.push(format!("clients: {err}"));
            return result;
        }
    };

    for client in clients.iter() {
        match score_client(store, client, &settings, now).await {
            Ok(_) => result.clients_processed += 1,
            Err(err) => {
                warn!(client_id = %client.id, error = %err, "client scoring failed");
                result.errors.push(format!("client {}: {err}", client.id));
            }
        }
    }

    result
}

/// Executes one scoring run. Only a failure to list accounts is returned as `Err`.
pub async fn run(
    store: &dyn ScoringStore,
    request: &RunRequest,
    now: DateTime<Utc>,
) -> Result<RunSummary> {
    if request.client_id.is_some() && request.account_id.is_none() {
        return Err(ScoringError::InvalidInput(
            "client_id requires account_id".to_string(),
        ));
    }

    let accounts = match request.account_id {
        Some(account_id) => vec![account_id],
        None => store.list_accounts().await?,
    };
    info!(accounts = accounts.len(), "scoring run started");

    let mut results = Vec::with_capacity(accounts.len());
    for account_id in accounts {
        let result = score_account(store, account_id, request.client_id, now).await;
        info!(
            account_id = %account_id,
            clients_processed = result.clients_processed,
            errors = result.errors.len(),
            "account scored"
        );
        results.push(result);
    }

    let processed: usize = results.iter().map(|result| result.clients_processed).sum();
    Ok(RunSummary {
        success: true,
        message: format!(
            "Scored {processed} clients across {} accounts",
            results.len()
        ),
        results,
    })
}
