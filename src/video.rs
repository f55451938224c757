use anyhow::Context;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiResult;

/// Transcoder-side handles for a chapter's video. `asset_id` names the
/// ingested source, `playback_id` the stream viewers fetch; playback becomes
/// available once the transcoder finishes, so it can lag behind the asset.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct MuxData {
    pub id: i64,
    pub chapter_id: i64,
    pub asset_id: String,
    pub playback_id: Option<String>,
}

/// Register a chapter's current video with the transcoder. A chapter holds at
/// most one asset record, so re-registering replaces the previous handles.
pub async fn register_asset(database: &SqlitePool, chapter_id: i64) -> ApiResult<MuxData> {
    let asset_id = Uuid::new_v4().to_string();
    let playback_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO mux_data (chapter_id, asset_id, playback_id) VALUES (?, ?, ?)
         ON CONFLICT(chapter_id) DO UPDATE SET
            asset_id = excluded.asset_id,
            playback_id = excluded.playback_id",
    )
    .bind(chapter_id)
    .bind(&asset_id)
    .bind(&playback_id)
    .execute(database)
    .await?;
    let registered = for_chapter(database, chapter_id)
        .await?
        .context("asset row missing right after registration")?;
    Ok(registered)
}

pub async fn for_chapter(database: &SqlitePool, chapter_id: i64) -> ApiResult<Option<MuxData>> {
    Ok(
        sqlx::query_as::<_, MuxData>("SELECT * FROM mux_data WHERE chapter_id = ?")
            .bind(chapter_id)
            .fetch_optional(database)
            .await?,
    )
}
