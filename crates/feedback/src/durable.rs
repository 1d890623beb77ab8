//! Durable feedback store: MySQL tables `interactions`, `negative_feedback`,
//! `feedback_stats` (spec §4.4's schema table).

use chrono::Utc;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use tg_domain::error::{Error, Result};
use tg_domain::interaction::{Interaction, NegativeFeedbackRow, RoutingType};

pub struct DurableStore {
    pool: Pool<MySql>,
}

fn routing_type_str(routing_type: RoutingType) -> &'static str {
    match routing_type {
        RoutingType::DirectShortcut => "direct_shortcut",
        RoutingType::LlmWithTools => "llm_with_tools",
        RoutingType::LlmOnly => "llm_only",
    }
}

impl DurableStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| Error::Other(format!("mysql connect failed: {e}")))?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS interactions (
                interaction_id VARCHAR(64) PRIMARY KEY,
                session_id VARCHAR(128) NOT NULL,
                user_message TEXT NOT NULL,
                final_response TEXT NOT NULL,
                routing_type VARCHAR(32) NOT NULL,
                tools_used JSON NOT NULL,
                tool_results JSON NOT NULL,
                llm_payload JSON NULL,
                llm_response TEXT NULL,
                debug_info JSON NOT NULL,
                feedback VARCHAR(16) NOT NULL DEFAULT 'none',
                created_at DATETIME NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Other(format!("create interactions table failed: {e}")))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS negative_feedback (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                interaction_id VARCHAR(64) NOT NULL,
                session_id VARCHAR(128) NOT NULL,
                user_message TEXT NOT NULL,
                final_response TEXT NOT NULL,
                routing_type VARCHAR(32) NOT NULL,
                tools_used JSON NOT NULL,
                reason TEXT NULL,
                created_at DATETIME NOT NULL,
                UNIQUE KEY uniq_interaction_id (interaction_id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Other(format!("create negative_feedback table failed: {e}")))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS feedback_stats (
                stat_date DATE PRIMARY KEY,
                direct_shortcut_count BIGINT NOT NULL DEFAULT 0,
                llm_with_tools_count BIGINT NOT NULL DEFAULT 0,
                llm_only_count BIGINT NOT NULL DEFAULT 0,
                thumbs_up_count BIGINT NOT NULL DEFAULT 0,
                thumbs_down_count BIGINT NOT NULL DEFAULT 0
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Other(format!("create feedback_stats table failed: {e}")))?;

        Ok(())
    }

    /// Promotes an ephemeral interaction into the durable store. Idempotent:
    /// `interaction_id` is the primary key, so a repeat call updates the row
    /// in place rather than erroring (P5 in spec §8).
    pub async fn promote_interaction(&self, interaction: &Interaction) -> Result<()> {
        let tools_used = serde_json::to_string(&interaction.tools_used)?;
        let tool_results = serde_json::to_string(&interaction.tool_results)?;
        let llm_payload = match &interaction.llm_payload {
            Some(v) => Some(serde_json::to_string(v)?),
            None => None,
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Other(format!("begin tx failed: {e}")))?;

        sqlx::query(
            "INSERT INTO interactions
                (interaction_id, session_id, user_message, final_response, routing_type,
                 tools_used, tool_results, llm_payload, llm_response, debug_info, feedback, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'thumbs_up', ?)
             ON DUPLICATE KEY UPDATE feedback = 'thumbs_up'",
        )
        .bind(&interaction.interaction_id)
        .bind(&interaction.session_id)
        .bind(&interaction.user_message)
        .bind(&interaction.final_response)
        .bind(routing_type_str(interaction.routing_type))
        .bind(tools_used)
        .bind(tool_results)
        .bind(llm_payload)
        .bind(&interaction.llm_response)
        .bind(serde_json::to_string(&interaction.debug_info)?)
        .bind(interaction.created_at.naive_utc())
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Other(format!("insert interaction failed: {e}")))?;

        bump_stat(&mut tx, interaction.created_at, Stat::Routing(interaction.routing_type)).await?;
        bump_stat(&mut tx, interaction.created_at, Stat::ThumbsUp).await?;

        tx.commit()
            .await
            .map_err(|e| Error::Other(format!("commit tx failed: {e}")))?;
        Ok(())
    }

    pub async fn get_interaction(&self, interaction_id: &str) -> Result<Option<Interaction>> {
        let row = sqlx::query_as::<_, InteractionRow>(
            "SELECT interaction_id, session_id, user_message, final_response, routing_type,
                    tools_used, tool_results, llm_payload, llm_response, debug_info, feedback, created_at
             FROM interactions WHERE interaction_id = ?",
        )
        .bind(interaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Other(format!("fetch interaction failed: {e}")))?;

        row.map(InteractionRow::into_interaction).transpose()
    }

    /// Records a negative-feedback row. Idempotent on `interaction_id`: a
    /// repeat call is a no-op update rather than a duplicate row.
    pub async fn record_negative_feedback(&self, row: &NegativeFeedbackRow) -> Result<()> {
        let tools_used = serde_json::to_string(&row.tools_used)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Other(format!("begin tx failed: {e}")))?;

        sqlx::query(
            "INSERT INTO negative_feedback
                (interaction_id, session_id, user_message, final_response, routing_type, tools_used, reason, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE reason = VALUES(reason)",
        )
        .bind(&row.interaction_id)
        .bind(&row.session_id)
        .bind(&row.user_message)
        .bind(&row.final_response)
        .bind(routing_type_str(row.routing_type))
        .bind(tools_used)
        .bind(&row.reason)
        .bind(row.created_at.naive_utc())
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Other(format!("insert negative_feedback failed: {e}")))?;

        bump_stat(&mut tx, row.created_at, Stat::Routing(row.routing_type)).await?;
        bump_stat(&mut tx, row.created_at, Stat::ThumbsDown).await?;

        tx.commit()
            .await
            .map_err(|e| Error::Other(format!("commit tx failed: {e}")))?;
        Ok(())
    }
}

enum Stat {
    Routing(RoutingType),
    ThumbsUp,
    ThumbsDown,
}

async fn bump_stat(
    tx: &mut sqlx::Transaction<'_, MySql>,
    at: chrono::DateTime<Utc>,
    stat: Stat,
) -> Result<()> {
    let column = match stat {
        Stat::Routing(RoutingType::DirectShortcut) => "direct_shortcut_count",
        Stat::Routing(RoutingType::LlmWithTools) => "llm_with_tools_count",
        Stat::Routing(RoutingType::LlmOnly) => "llm_only_count",
        Stat::ThumbsUp => "thumbs_up_count",
        Stat::ThumbsDown => "thumbs_down_count",
    };
    let date = at.date_naive();
    let sql = format!(
        "INSERT INTO feedback_stats (stat_date, {column}) VALUES (?, 1)
         ON DUPLICATE KEY UPDATE {column} = {column} + 1"
    );
    sqlx::query(&sql)
        .bind(date)
        .execute(&mut **tx)
        .await
        .map_err(|e| Error::Other(format!("bump feedback_stats failed: {e}")))?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct InteractionRow {
    interaction_id: String,
    session_id: String,
    user_message: String,
    final_response: String,
    routing_type: String,
    tools_used: String,
    tool_results: String,
    llm_payload: Option<String>,
    llm_response: Option<String>,
    debug_info: String,
    feedback: String,
    created_at: chrono::NaiveDateTime,
}

impl InteractionRow {
    fn into_interaction(self) -> Result<Interaction> {
        let routing_type = match self.routing_type.as_str() {
            "direct_shortcut" => RoutingType::DirectShortcut,
            "llm_with_tools" => RoutingType::LlmWithTools,
            _ => RoutingType::LlmOnly,
        };
        let feedback = match self.feedback.as_str() {
            "thumbs_up" => tg_domain::interaction::Feedback::ThumbsUp,
            "thumbs_down" => tg_domain::interaction::Feedback::ThumbsDown,
            _ => tg_domain::interaction::Feedback::None,
        };
        Ok(Interaction {
            interaction_id: self.interaction_id,
            session_id: self.session_id,
            user_message: self.user_message,
            final_response: self.final_response,
            routing_type,
            tools_used: serde_json::from_str(&self.tools_used)?,
            tool_results: serde_json::from_str(&self.tool_results)?,
            llm_payload: self
                .llm_payload
                .map(|p| serde_json::from_str(&p))
                .transpose()?,
            llm_response: self.llm_response,
            debug_info: serde_json::from_str(&self.debug_info)?,
            feedback,
            created_at: self.created_at.and_utc(),
        })
    }
}
