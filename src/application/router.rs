//! # Message Router
//!
//! Drives one full handling cycle per inbound message: fetch the membership
//! and policy documents, parse them, interpret the message, dispatch the
//! action, deliver notifications and the reply, and write back whichever
//! document changed.
//!
//! The documents are re-fetched and re-parsed for every message rather than
//! cached: humans edit the remote pages directly, and the write-back must
//! merge onto whatever is there now, not onto a stale in-memory copy.
//! Notifications go out before the write-back; a failed publish is logged
//! and never un-sends them.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::policy::GroupPolicy;
use crate::application::{dispatcher, interpreter, parser};
use crate::domain::config::AppConfig;
use crate::domain::traits::{DocumentStore, Messenger};
use crate::domain::types::{
    AuthContext, CommandError, Interpretation, SendError, Source,
};
use crate::strings::messages;

pub struct MessageRouter {
    config: AppConfig,
    store: Arc<dyn DocumentStore>,
    policy_store: Arc<dyn DocumentStore>,
    /// Channel for maintainer-facing notices (parse warnings).
    admin: Option<Arc<dyn Messenger>>,
    /// Warnings reported last cycle, to avoid repeating the same notice
    /// on every message while a page stays broken.
    last_warnings: Mutex<Vec<String>>,
}

impl MessageRouter {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        policy_store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            config,
            store,
            policy_store,
            admin: None,
            last_warnings: Mutex::new(Vec::new()),
        }
    }

    pub fn with_admin(mut self, admin: Arc<dyn Messenger>) -> Self {
        self.admin = Some(admin);
        self
    }

    pub async fn route(
        &self,
        chat: &impl Messenger,
        body: &str,
        sender: &str,
        source: Source,
    ) -> Result<()> {
        let interpretation =
            interpreter::interpret(body, source, self.config.limits.max_pings_per_message);

        let action = match interpretation {
            Interpretation::NotAPing => return Ok(()),
            Interpretation::Invalid(err) => {
                let reply = match err {
                    CommandError::Malformed(text) => text,
                    CommandError::Unknown(verb) => messages::unknown_command(&verb),
                };
                chat.reply(&reply).await.map_err(|e| anyhow::anyhow!(e))?;
                return Ok(());
            }
            Interpretation::Act(action) => action,
        };

        tracing::info!("Routing {:?} from {}", action, sender);

        // Fresh copies every cycle: merge onto the documents as they are now.
        let document = self
            .store
            .fetch()
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .context("failed to fetch membership document")?;
        let (mut roster, warnings) = parser::parse(&document);

        let policy_document = self
            .policy_store
            .fetch()
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .context("failed to fetch policy document")?;
        let (mut policy, policy_warnings) = GroupPolicy::parse(&policy_document);

        let rendered: Vec<String> = warnings
            .iter()
            .map(|w| format!("membership document: {w}"))
            .chain(
                policy_warnings
                    .iter()
                    .map(|w| format!("policy document: {w}")),
            )
            .collect();
        self.report_warnings(rendered).await;

        let ctx = AuthContext {
            sender: sender.to_string(),
            is_moderator: self.config.community.is_moderator(sender),
        };
        let result = dispatcher::dispatch(action, &mut roster, &ctx, &mut policy);

        // Accounts the platform no longer recognizes get dropped from every
        // group; transient delivery failures are only logged.
        let mut invalid_recipients: Vec<String> = Vec::new();
        for notification in &result.notifications {
            match chat
                .direct_message(&notification.recipient, &notification.body)
                .await
            {
                Ok(()) => {}
                Err(SendError::InvalidRecipient(user)) => {
                    tracing::warn!("Recipient {} is invalid, pruning from all groups", user);
                    invalid_recipients.push(user);
                }
                Err(SendError::Other(e)) => {
                    tracing::error!("Could not notify {}: {}", notification.recipient, e);
                }
            }
        }

        if let Some(reply) = &result.reply {
            chat.reply(reply).await.map_err(|e| anyhow::anyhow!(e))?;
        }

        let mut dirty = result.dirty;
        let mut reasons: Vec<String> = result.publish_reason.into_iter().collect();
        for user in invalid_recipients {
            if !roster.remove_from_all(&user).is_empty() {
                dirty = true;
                reasons.push(format!("Removed invalid account {user}"));
            }
        }

        if dirty {
            let reason = if reasons.is_empty() {
                "Updated groups".to_string()
            } else {
                reasons.join("; ")
            };
            self.publish(&self.store, &roster.serialize(), &reason, "group")
                .await;
        }

        if result.policy_dirty {
            let reason = reasons.last().map(String::as_str).unwrap_or("Updated policy");
            self.publish(&self.policy_store, &policy.serialize(), reason, "policy")
                .await;
        }

        Ok(())
    }

    async fn publish(&self, store: &Arc<dyn DocumentStore>, content: &str, reason: &str, kind: &str) {
        if let Err(e) = store.publish(content, reason).await {
            // Notifications are already out; losing the write-back must
            // not crash the loop. The next mutation retries implicitly.
            tracing::error!("Failed to publish {} document: {}", kind, e);
            if let Some(admin) = &self.admin {
                let _ = admin
                    .reply(&format!("⚠️ Failed to publish {kind} document: {e}"))
                    .await;
            }
        }
    }

    /// Log parse warnings and relay them to the admin room, but only when
    /// they changed since the previous cycle.
    async fn report_warnings(&self, rendered: Vec<String>) {
        for warning in &rendered {
            tracing::warn!("{}", warning);
        }

        let mut last = self.last_warnings.lock().await;
        if *last == rendered {
            return;
        }
        if !rendered.is_empty()
            && let Some(admin) = &self.admin
        {
            let notice = format!(
                "⚠️ **Group documents have {} problem(s):**\n{}",
                rendered.len(),
                rendered
                    .iter()
                    .map(|w| format!("* {w}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            );
            if let Err(e) = admin.reply(&notice).await {
                tracing::error!("Could not relay parse warnings: {}", e);
            }
        }
        *last = rendered;
    }
}
