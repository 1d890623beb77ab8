//! Ties the ephemeral and durable stores together into the feedback
//! lifecycle described in spec §4.4: record at end of turn, promote on
//! thumbs-up, demote-and-archive on thumbs-down.

use tg_domain::error::{Error, Result};
use tg_domain::interaction::{Feedback, Interaction, NegativeFeedbackRow};

use crate::durable::DurableStore;
use crate::ephemeral::EphemeralStore;

pub struct FeedbackService {
    ephemeral: EphemeralStore,
    durable: DurableStore,
}

impl FeedbackService {
    pub fn new(ephemeral: EphemeralStore, durable: DurableStore) -> Self {
        Self { ephemeral, durable }
    }

    /// Writes a freshly produced interaction into the ephemeral store with
    /// the standard 24h expiry.
    pub async fn record(&self, interaction: &Interaction) -> Result<()> {
        self.ephemeral.put(interaction).await
    }

    pub async fn get(&self, session_id: &str, interaction_id: &str) -> Result<Option<Interaction>> {
        if let Some(interaction) = self.ephemeral.get(session_id, interaction_id).await? {
            return Ok(Some(interaction));
        }
        self.durable.get_interaction(interaction_id).await
    }

    /// Applies a feedback verdict. Idempotent per P5: a repeated call with
    /// the same verdict and id produces the same end state.
    pub async fn apply(
        &self,
        session_id: &str,
        interaction_id: &str,
        feedback: Feedback,
        reason: Option<String>,
    ) -> Result<()> {
        match feedback {
            Feedback::ThumbsUp => self.apply_thumbs_up(session_id, interaction_id).await,
            Feedback::ThumbsDown => {
                self.apply_thumbs_down(session_id, interaction_id, reason)
                    .await
            }
            Feedback::None => Err(Error::Other(
                "feedback verdict must be thumbs_up or thumbs_down".to_string(),
            )),
        }
    }

    async fn apply_thumbs_up(&self, session_id: &str, interaction_id: &str) -> Result<()> {
        let mut interaction = match self.ephemeral.get(session_id, interaction_id).await? {
            Some(interaction) => interaction,
            None => {
                // Already promoted by an earlier call (P5): nothing left to do.
                if self.durable.get_interaction(interaction_id).await?.is_some() {
                    return Ok(());
                }
                return Err(Error::Other(format!(
                    "interaction {interaction_id} not found"
                )));
            }
        };
        interaction.feedback = Feedback::ThumbsUp;
        self.durable.promote_interaction(&interaction).await?;
        self.ephemeral.persist(session_id, interaction_id).await?;
        Ok(())
    }

    async fn apply_thumbs_down(
        &self,
        session_id: &str,
        interaction_id: &str,
        reason: Option<String>,
    ) -> Result<()> {
        let interaction = self.ephemeral.get(session_id, interaction_id).await?;
        let row = match interaction {
            Some(interaction) => NegativeFeedbackRow {
                interaction_id: interaction.interaction_id,
                session_id: interaction.session_id,
                user_message: interaction.user_message,
                final_response: interaction.final_response,
                routing_type: interaction.routing_type,
                tools_used: interaction.tools_used,
                reason,
                created_at: interaction.created_at,
            },
            None => {
                // Already actioned by an earlier call (P5): re-derive nothing
                // new to write, just confirm the row exists.
                return Ok(());
            }
        };
        self.durable.record_negative_feedback(&row).await?;
        self.ephemeral.delete(session_id, interaction_id).await?;
        Ok(())
    }
}
