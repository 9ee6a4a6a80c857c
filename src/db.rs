use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::config::AccountSettings;
use crate::error::{Result, ScoringError};
use crate::models::{
    AttendanceRecord, ClientRef, ClientStatus, Direction, Impact, LiveInteractionRecord,
    MessageEvent, Quadrant, RoiCategory, RoiType, ScoreSnapshot, Trend, ValueEvent,
};
use crate::store::ScoringStore;

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Latest snapshot per client for one account.
    pub async fn fetch_latest_snapshots(&self, account_id: Uuid) -> Result<Vec<ScoreSnapshot>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT ON (client_id)
                account_id, client_id, escore, roizometer, quadrant, trend, computed_at
            FROM engagement_scoring.score_snapshots
            WHERE account_id = $1
            ORDER BY client_id, computed_at DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(snapshot_from_row).collect()
    }
}

fn settings_from_row(row: &PgRow) -> Result<AccountSettings> {
    let defaults = AccountSettings::default();
    Ok(AccountSettings {
        weight_whatsapp_text: row
            .try_get::<Option<f64>, _>("weight_whatsapp_text")?
            .unwrap_or(defaults.weight_whatsapp_text),
        weight_whatsapp_audio: row
            .try_get::<Option<f64>, _>("weight_whatsapp_audio")?
            .unwrap_or(defaults.weight_whatsapp_audio),
        weight_live_interaction: row
            .try_get::<Option<f64>, _>("weight_live_interaction")?
            .unwrap_or(defaults.weight_live_interaction),
        escore_whatsapp_engagement: row
            .try_get::<Option<i32>, _>("escore_whatsapp_engagement")?
            .unwrap_or(defaults.escore_whatsapp_engagement),
        escore_live_presence: row
            .try_get::<Option<i32>, _>("escore_live_presence")?
            .unwrap_or(defaults.escore_live_presence),
        escore_live_participation: row
            .try_get::<Option<i32>, _>("escore_live_participation")?
            .unwrap_or(defaults.escore_live_participation),
        threshold_low_escore: row
            .try_get::<Option<i32>, _>("threshold_low_escore")?
            .unwrap_or(defaults.threshold_low_escore),
        threshold_low_roizometer: row
            .try_get::<Option<i32>, _>("threshold_low_roizometer")?
            .unwrap_or(defaults.threshold_low_roizometer),
    })
}

fn value_event_from_row(row: &PgRow) -> Result<ValueEvent> {
    let roi_type: String = row.try_get("roi_type")?;
    let category: String = row.try_get("category")?;
    let impact: Option<String> = row.try_get("impact")?;

    let category = RoiCategory::parse(&category);
    let roi_type = match RoiType::parse(&roi_type) {
        Some(roi_type) => roi_type,
        None => category
            .map(RoiCategory::roi_type)
            .ok_or_else(|| ScoringError::Malformed(format!("roi_type {roi_type:?}")))?,
    };

    Ok(ValueEvent {
        roi_type,
        category,
        impact: impact.as_deref().map(Impact::parse).unwrap_or(Impact::Low),
        source: row.try_get::<Option<String>, _>("source")?.unwrap_or_default(),
        happened_at: row.try_get("happened_at")?,
    })
}

fn snapshot_from_row(row: &PgRow) -> Result<ScoreSnapshot> {
    let quadrant: String = row.try_get("quadrant")?;
    let trend: String = row.try_get("trend")?;
    Ok(ScoreSnapshot {
        account_id: row.try_get("account_id")?,
        client_id: row.try_get("client_id")?,
        escore: row.try_get("escore")?,
        roizometer: row.try_get("roizometer")?,
        quadrant: Quadrant::parse(&quadrant)
            .ok_or_else(|| ScoringError::Malformed(format!("quadrant {quadrant:?}")))?,
        trend: Trend::parse(&trend)
            .ok_or_else(|| ScoringError::Malformed(format!("trend {trend:?}")))?,
        computed_at: row.try_get("computed_at")?,
    })
}

#[async_trait]
impl ScoringStore for PgStore {
    async fn list_accounts(&self) -> Result<Vec<Uuid>> {
        let rows = sqlx::query("SELECT id FROM engagement_scoring.accounts ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<Uuid, _>("id").map_err(ScoringError::from))
            .collect()
    }

    async fn load_settings(&self, account_id: Uuid) -> Result<Option<AccountSettings>> {
        let row = sqlx::query(
            r#"
            SELECT weight_whatsapp_text, weight_whatsapp_audio, weight_live_interaction,
                   escore_whatsapp_engagement, escore_live_presence, escore_live_participation,
                   threshold_low_escore, threshold_low_roizometer
            FROM engagement_scoring.account_settings
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(settings_from_row).transpose()
    }

    async fn list_clients(&self, account_id: Uuid) -> Result<Vec<ClientRef>> {
        let rows = sqlx::query(
            "SELECT id FROM engagement_scoring.clients WHERE account_id = $1 ORDER BY created_at",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<ClientRef> {
                Ok(ClientRef {
                    id: row.try_get("id")?,
                    account_id,
                })
            })
            .collect()
    }

    async fn find_client(&self, account_id: Uuid, client_id: Uuid) -> Result<Option<ClientRef>> {
        let row = sqlx::query(
            "SELECT id FROM engagement_scoring.clients WHERE account_id = $1 AND id = $2",
        )
        .bind(account_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|_| ClientRef {
            id: client_id,
            account_id,
        }))
    }

    async fn value_events(
        &self,
        client: &ClientRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<ValueEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT roi_type, category, impact, source, happened_at
            FROM engagement_scoring.value_events
            WHERE account_id = $1 AND client_id = $2 AND happened_at >= $3
            "#,
        )
        .bind(client.account_id)
        .bind(client.id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(value_event_from_row).collect()
    }

    async fn message_events(
        &self,
        client: &ClientRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<MessageEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT source, direction, sent_at
            FROM engagement_scoring.message_events
            WHERE account_id = $1 AND client_id = $2 AND sent_at >= $3
            "#,
        )
        .bind(client.account_id)
        .bind(client.id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<MessageEvent> {
                let direction: String = row.try_get("direction")?;
                Ok(MessageEvent {
                    source: row.try_get::<Option<String>, _>("source")?.unwrap_or_default(),
                    direction: Direction::parse(&direction),
                    sent_at: row.try_get("sent_at")?,
                })
            })
            .collect()
    }

    async fn attendance_records(
        &self,
        client: &ClientRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT a.session_id, a.duration_sec, a.join_delay_sec, a.join_time
            FROM engagement_scoring.attendance_records a
            JOIN engagement_scoring.live_sessions s ON s.id = a.session_id
            WHERE a.account_id = $1 AND a.client_id = $2 AND a.join_time >= $3
            "#,
        )
        .bind(client.account_id)
        .bind(client.id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<AttendanceRecord> {
                Ok(AttendanceRecord {
                    session_id: row.try_get("session_id")?,
                    duration_sec: row.try_get::<Option<i64>, _>("duration_sec")?.unwrap_or(0),
                    join_delay_sec: row.try_get::<Option<i64>, _>("join_delay_sec")?.unwrap_or(0),
                    join_time: row.try_get("join_time")?,
                })
            })
            .collect()
    }

    async fn count_sessions(&self, account_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM engagement_scoring.live_sessions
            WHERE account_id = $1 AND start_time >= $2
            "#,
        )
        .bind(account_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?
        .try_get("total")?;
        Ok(count)
    }

    async fn live_interactions(
        &self,
        client: &ClientRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<LiveInteractionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT interaction_type, count, created_at
            FROM engagement_scoring.live_interactions
            WHERE account_id = $1 AND client_id = $2 AND created_at >= $3
            "#,
        )
        .bind(client.account_id)
        .bind(client.id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<LiveInteractionRecord> {
                Ok(LiveInteractionRecord {
                    kind: row.try_get("interaction_type")?,
                    count: row.try_get::<Option<i32>, _>("count")?.map(i64::from),
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn latest_snapshot(&self, client: &ClientRef) -> Result<Option<ScoreSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT account_id, client_id, escore, roizometer, quadrant, trend, computed_at
            FROM engagement_scoring.score_snapshots
            WHERE account_id = $1 AND client_id = $2
            ORDER BY computed_at DESC
            LIMIT 1
            "#,
        )
        .bind(client.account_id)
        .bind(client.id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(snapshot_from_row).transpose()
    }

    async fn insert_snapshot(&self, snapshot: &ScoreSnapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO engagement_scoring.score_snapshots
            (id, account_id, client_id, escore, roizometer, quadrant, trend, computed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(snapshot.account_id)
        .bind(snapshot.client_id)
        .bind(snapshot.escore)
        .bind(snapshot.roizometer)
        .bind(snapshot.quadrant.as_str())
        .bind(snapshot.trend.as_str())
        .bind(snapshot.computed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_client_status(&self, client: &ClientRef, status: ClientStatus) -> Result<()> {
        sqlx::query(
            "UPDATE engagement_scoring.clients SET status = $1 WHERE account_id = $2 AND id = $3",
        )
        .bind(status.as_str())
        .bind(client.account_id)
        .bind(client.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub async fn seed(pool: &PgPool) -> Result<()> {
    let account_id = Uuid::parse_str("6f1c2a9e-4b1d-4d8e-9c3a-2f7b8e1d5a40")
        .map_err(|err| ScoringError::InvalidInput(err.to_string()))?;
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO engagement_scoring.accounts (id, name)
        VALUES ($1, $2)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(account_id)
    .bind("Northwind Advisory")
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO engagement_scoring.account_settings (account_id)
        VALUES ($1)
        ON CONFLICT (account_id) DO NOTHING
        "#,
    )
    .bind(account_id)
    .execute(pool)
    .await?;

    let clients = vec![
        ("Harbor Dental Group", "2b0f5f0e-8c61-4f5c-a5a4-0f1f8f0c1a11"),
        ("Lumen Fitness Studio", "9a1e2d3c-4b5a-4c6d-8e7f-1a2b3c4d5e62"),
        ("Orchard Lane Bakery", "c3d4e5f6-a7b8-4c9d-8e0f-1a2b3c4d5e73"),
    ];

    let mut client_ids = Vec::new();
    for (name, id) in clients {
        let id = Uuid::parse_str(id).map_err(|err| ScoringError::InvalidInput(err.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO engagement_scoring.clients (id, account_id, display_name, status)
            VALUES ($1, $2, $3, 'active')
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(account_id)
        .bind(name)
        .execute(pool)
        .await?;
        client_ids.push(id);
    }

    let session_ids = [
        Uuid::parse_str("0d9e8f7a-6b5c-4d3e-9f10-a1b2c3d4e501"),
        Uuid::parse_str("0d9e8f7a-6b5c-4d3e-9f10-a1b2c3d4e502"),
    ];
    for (offset, id) in session_ids.into_iter().enumerate() {
        let id = id.map_err(|err| ScoringError::InvalidInput(err.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO engagement_scoring.live_sessions (id, account_id, start_time)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(account_id)
        .bind(now - Duration::days(3 + 7 * offset as i64))
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO engagement_scoring.attendance_records
            (id, account_id, client_id, session_id, duration_sec, join_delay_sec,
             join_time, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(client_ids[0])
        .bind(id)
        .bind(3300_i64)
        .bind(120_i64)
        .bind(now - Duration::days(3 + 7 * offset as i64))
        .bind(format!("seed-attendance-{offset}"))
        .execute(pool)
        .await?;
    }

    let value_events = vec![
        ("seed-roi-001", client_ids[0], "tangible", "revenue", "high", "whatsapp_audio"),
        ("seed-roi-002", client_ids[0], "intangible", "confidence", "medium", "zoom"),
        ("seed-roi-003", client_ids[1], "tangible", "time", "low", "whatsapp_text"),
    ];
    for (source_key, client_id, roi_type, category, impact, source) in value_events {
        sqlx::query(
            r#"
            INSERT INTO engagement_scoring.value_events
            (id, account_id, client_id, roi_type, category, impact, source, happened_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(client_id)
        .bind(roi_type)
        .bind(category)
        .bind(impact)
        .bind(source)
        .bind(now - Duration::days(5))
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    for index in 0..12 {
        let direction = if index % 3 == 0 { "team_to_client" } else { "client_to_team" };
        let source = if index % 4 == 0 { "whatsapp_audio" } else { "whatsapp_text" };
        sqlx::query(
            r#"
            INSERT INTO engagement_scoring.message_events
            (id, account_id, client_id, source, direction, sent_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(client_ids[0])
        .bind(source)
        .bind(direction)
        .bind(now - Duration::hours(6 * index))
        .bind(format!("seed-message-{index:03}"))
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO engagement_scoring.live_interactions
        (id, account_id, client_id, interaction_type, count, created_at, source_key)
        VALUES ($1, $2, $3, 'question', 3, $4, 'seed-interaction-001')
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(account_id)
    .bind(client_ids[0])
    .bind(now - Duration::days(3))
    .execute(pool)
    .await?;

    Ok(())
}

/// Imports classifier output as value events. Rows are de-duplicated by `source_key`.
pub async fn import_value_events(
    pool: &PgPool,
    account_id: Uuid,
    csv_path: &std::path::Path,
) -> Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        client_id: Uuid,
        roi_type: String,
        category: String,
        impact: String,
        source: String,
        happened_at: DateTime<Utc>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        if RoiType::parse(&row.roi_type).is_none() && RoiCategory::parse(&row.category).is_none() {
            return Err(ScoringError::InvalidInput(format!(
                "unrecognised roi_type {:?} and category {:?}",
                row.roi_type, row.category
            )));
        }

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO engagement_scoring.value_events
            (id, account_id, client_id, roi_type, category, impact, source, happened_at, source_key)
            SELECT $1, $2, c.id, $4, $5, $6, $7, $8, $9
            FROM engagement_scoring.clients c
            WHERE c.id = $3 AND c.account_id = $2
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(row.client_id)
        .bind(&row.roi_type)
        .bind(&row.category)
        .bind(&row.impact)
        .bind(&row.source)
        .bind(row.happened_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
