use spyglass_audit::{Actor, AuditAction, AuditResult};
use spyglass_policy::PolicyError;

use crate::bot::Bot;
use crate::error::BotError;
use crate::format::enabled;

impl Bot {
    pub(crate) async fn admin_add(&self, actor: &Actor, target: &str) -> Result<String, BotError> {
        match self.policy.add_admin(target) {
            Ok(added) => {
                let total = self.policy.snapshot().admins.len();
                let action = if added {
                    "Added new admin user"
                } else {
                    "Admin user already present"
                };
                self.record(
                    actor,
                    AuditAction::new("!admin-add", action, AuditResult::Success)
                        .with_change("new_admin", target)
                        .with_change("total_admins", total),
                )
                .await;
                Ok(if added {
                    format!("✅ Added <@{target}> as admin\n*All admins:* {total} users")
                } else {
                    format!("⚠️ <@{target}> is already an admin")
                })
            }
            Err(e) => {
                self.record_failure(actor, "!admin-add", "Failed to add admin", &e)
                    .await;
                Err(e.into())
            }
        }
    }

    pub(crate) async fn admin_remove(
        &self,
        actor: &Actor,
        target: &str,
    ) -> Result<String, BotError> {
        match self.policy.remove_admin(target) {
            Ok(true) => {
                let remaining = self.policy.snapshot().admins.len();
                self.record(
                    actor,
                    AuditAction::new("!admin-remove", "Removed admin user", AuditResult::Success)
                        .with_change("removed_admin", target)
                        .with_change("total_admins", remaining),
                )
                .await;
                Ok(format!(
                    "✅ Removed <@{target}> from admins\n*Remaining admins:* {remaining} users"
                ))
            }
            Ok(false) => {
                self.record(
                    actor,
                    AuditAction::new("!admin-remove", "User was not an admin", AuditResult::Success)
                        .with_change("removed_admin", target),
                )
                .await;
                Ok(format!("⚠️ <@{target}> is not an admin"))
            }
            Err(PolicyError::LastAdmin(id)) => {
                self.record(
                    actor,
                    AuditAction::new(
                        "!admin-remove",
                        "Attempted to remove the last admin",
                        AuditResult::Failed,
                    )
                    .with_change("removed_admin", id.as_str())
                    .with_error("Cannot remove the last admin"),
                )
                .await;
                Ok(if id == actor.user_id {
                    "❌ Cannot remove yourself as the last admin".to_owned()
                } else {
                    format!("❌ Cannot remove <@{id}>: they are the last remaining admin")
                })
            }
            Err(e) => {
                self.record_failure(actor, "!admin-remove", "Failed to remove admin", &e)
                    .await;
                Err(e.into())
            }
        }
    }

    pub(crate) async fn channel_allow(
        &self,
        actor: &Actor,
        channel: &str,
    ) -> Result<String, BotError> {
        match self.policy.allow_channel(channel) {
            Ok(added) => {
                let total = self.policy.snapshot().channels.len();
                if added {
                    self.record(
                        actor,
                        AuditAction::new(
                            "!admin-channel-add",
                            "Added allowed channel",
                            AuditResult::Success,
                        )
                        .with_change("channel", channel)
                        .with_change("total_channels", total),
                    )
                    .await;
                    Ok(format!(
                        "✅ Added <#{channel}> to allowed channels\n*Allowed channels:* {total}"
                    ))
                } else {
                    self.record(
                        actor,
                        AuditAction::new(
                            "!admin-channel-add",
                            "Channel already allowed",
                            AuditResult::Success,
                        )
                        .with_change("channel", channel),
                    )
                    .await;
                    Ok(format!("⚠️ Channel <#{channel}> already in allowed list"))
                }
            }
            Err(e) => {
                self.record_failure(actor, "!admin-channel-add", "Failed to add channel", &e)
                    .await;
                Err(e.into())
            }
        }
    }

    pub(crate) async fn channel_deny(
        &self,
        actor: &Actor,
        channel: &str,
    ) -> Result<String, BotError> {
        match self.policy.deny_channel(channel) {
            Ok(removed) => {
                let total = self.policy.snapshot().channels.len();
                let action = if removed {
                    "Removed allowed channel"
                } else {
                    "Channel was not allowed"
                };
                self.record(
                    actor,
                    AuditAction::new("!admin-channel-remove", action, AuditResult::Success)
                        .with_change("channel", channel)
                        .with_change("total_channels", total),
                )
                .await;
                Ok(if removed {
                    format!(
                        "✅ Removed <#{channel}> from allowed channels\n*Allowed channels:* {total}"
                    )
                } else {
                    format!("⚠️ Channel <#{channel}> not in allowed list")
                })
            }
            Err(e) => {
                self.record_failure(
                    actor,
                    "!admin-channel-remove",
                    "Failed to remove channel",
                    &e,
                )
                .await;
                Err(e.into())
            }
        }
    }

    pub(crate) async fn feature_toggle(
        &self,
        actor: &Actor,
        name: &str,
    ) -> Result<String, BotError> {
        match self.policy.toggle_feature(name) {
            Ok((flag, value)) => {
                self.record(
                    actor,
                    AuditAction::new(
                        "!feature-toggle",
                        format!("Toggled feature {}", flag.name()),
                        AuditResult::Success,
                    )
                    .with_change("feature", flag.name())
                    .with_change("new_value", value),
                )
                .await;
                Ok(format!("✅ {flag} feature: {}", enabled(value)))
            }
            Err(PolicyError::UnknownFeature(feature)) => {
                self.record(
                    actor,
                    AuditAction::new(
                        "!feature-toggle",
                        "Attempted to toggle feature",
                        AuditResult::Failed,
                    )
                    .with_error(format!("Unknown feature: {feature}")),
                )
                .await;
                Ok(format!(
                    "❌ Unknown feature: `{feature}`\nAvailable: `spl_query`, `approval`"
                ))
            }
            Err(e) => {
                self.record_failure(actor, "!feature-toggle", "Failed to toggle feature", &e)
                    .await;
                Err(e.into())
            }
        }
    }

    pub(crate) async fn record_failure(
        &self,
        actor: &Actor,
        command: &str,
        action: &str,
        error: &(dyn std::fmt::Display + Sync),
    ) {
        self.record(
            actor,
            AuditAction::new(command, action, AuditResult::Failed).with_error(error.to_string()),
        )
        .await;
    }
}
