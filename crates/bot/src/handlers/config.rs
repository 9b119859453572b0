use serde::Serialize;
use spyglass_audit::{Actor, AuditAction, AuditResult};

use crate::bot::Bot;
use crate::error::BotError;
use crate::format::{enabled, mask_secret};

/// Non-secret configuration, as exported by `!config-backup`.
#[derive(Debug, Serialize)]
struct ConfigBackup<'a> {
    admin_user_ids: &'a [String],
    admin_channel_ids: &'a [String],
    spl_query_enabled: bool,
    approval_required: bool,
    result_limit: usize,
    search_verify_tls: bool,
    search_base_url: &'a str,
}

impl Bot {
    pub(crate) fn config_show(&self) -> String {
        let state = self.policy.snapshot();
        let channels = if state.channels.is_empty() {
            "All".to_owned()
        } else {
            state.channels.len().to_string()
        };
        format!(
            "*⚙️ Current Configuration*\n\n\
             *Chat:*\n\
             • Bot Token: `{}`\n\n\
             *Search:*\n\
             • URL: `{}`\n\
             • Token: `{}`\n\
             • TLS Verification: {}\n\n\
             *Admin & Security:*\n\
             • Admins: {}\n\
             • Admin Channels: {channels}\n\
             • Channel Enforcement: {}\n\
             • SPL Query: {}\n\
             • Approval Required: {}\n\n\
             *Settings:*\n\
             • Result Limit: {}\n\n\
             *Commands:*\n\
             • Export: `!config-backup`\n\
             • Security: `!security-config`",
            mask_secret(self.settings.chat_token.as_deref(), 6),
            self.settings.search_base_url,
            mask_secret(self.settings.search_token.as_deref(), 6),
            if self.settings.verify_tls { "Enabled" } else { "Disabled" },
            state.admins.len(),
            if self.policy.enforces_channel_allowlist() { "On" } else { "Off" },
            if state.spl_enabled { "Enabled" } else { "Disabled" },
            if state.approval_required { "Yes" } else { "No" },
            self.result_limit(),
        )
    }

    pub(crate) async fn config_backup(&self, actor: &Actor) -> Result<String, BotError> {
        let state = self.policy.snapshot();
        let backup = ConfigBackup {
            admin_user_ids: &state.admins,
            admin_channel_ids: &state.channels,
            spl_query_enabled: state.spl_enabled,
            approval_required: state.approval_required,
            result_limit: self.result_limit(),
            search_verify_tls: self.settings.verify_tls,
            search_base_url: &self.settings.search_base_url,
        };
        let json = serde_json::to_string_pretty(&backup)?;

        self.record(
            actor,
            AuditAction::new(
                "!config-backup",
                "Exported configuration backup",
                AuditResult::Success,
            )
            .with_change("admins", state.admins.len())
            .with_change("channels", state.channels.len()),
        )
        .await;

        Ok(format!(
            "*📦 Configuration Backup*\n\n\
             ```{json}```\n\n\
             *Note:* Sensitive tokens not included. Copy this config and save securely.\n\
             *Restore:* Update `{}` with these values",
            self.policy.store().path().display()
        ))
    }

    pub(crate) async fn set_result_limit(
        &self,
        actor: &Actor,
        limit: usize,
    ) -> Result<String, BotError> {
        let previous = self.result_limit();
        match self.policy.set_result_limit(limit) {
            Ok(()) => {
                self.record(
                    actor,
                    AuditAction::new("!config-set", "Changed result limit", AuditResult::Success)
                        .with_change("setting", "result_limit")
                        .with_change("old_value", previous)
                        .with_change("new_value", limit),
                )
                .await;
                Ok(format!("✅ Result limit set to {limit}"))
            }
            Err(e) => {
                self.record_failure(actor, "!config-set", "Failed to change result limit", &e)
                    .await;
                Err(e.into())
            }
        }
    }

    pub(crate) fn security_config(&self) -> String {
        let state = self.policy.snapshot();
        let channels = if state.channels.is_empty() {
            "All channels allowed".to_owned()
        } else {
            state.channels.len().to_string()
        };
        let tls = if self.settings.verify_tls {
            "🟢 Enabled"
        } else {
            "🔴 Disabled (Lab mode)"
        };
        format!(
            "*🔐 Security Configuration*\n\n\
             *Admin Access:*\n\
             • Admin Users: {}\n\
             • Admin Channels: {channels}\n\n\
             *Feature Flags:*\n\
             • SPL Query: {}\n\
             • Approval Required: {}\n\n\
             *Settings:*\n\
             • Result Limit: {}\n\
             • TLS Verification: {tls}\n\n\
             *Commands:*\n\
             • Toggle features: `!feature-toggle <feature>`\n\
             • Manage admins: `!admin-add`, `!admin-remove`, `!admin-list`\n\
             • View audit log: `!audit-logs`",
            state.admins.len(),
            enabled(state.spl_enabled),
            if state.approval_required { "🟢 Yes" } else { "🔴 No" },
            self.result_limit(),
        )
    }

    pub(crate) fn prod_check(&self) -> String {
        const MAX_SCORE: u32 = 5;

        let state = self.policy.snapshot();
        let has_admins = !state.admins.is_empty();
        let mut checks = Vec::new();
        let mut score = 0;

        if has_admins {
            checks.push("✅ Admin users configured");
            score += 1;
        } else {
            checks.push("❌ No admin users (use `!admin-add`)");
        }

        if state.spl_enabled && has_admins {
            checks.push("✅ SPL queries restricted to admins");
            score += 1;
        } else if !state.spl_enabled {
            checks.push("✅ SPL queries disabled");
            score += 1;
        } else {
            checks.push("⚠️ SPL queries not properly restricted");
        }

        if self.settings.verify_tls {
            checks.push("✅ TLS certificate verification enabled");
            score += 1;
        } else {
            checks.push("⚠️ TLS verification disabled (lab mode)");
        }

        checks.push("✅ Audit logging enabled");
        score += 1;

        checks.push("⚠️ Create config backup (`!config-backup`)");

        let has = |t: &Option<String>| t.as_deref().is_some_and(|s| !s.is_empty());
        if has(&self.settings.chat_token) && has(&self.settings.search_token) {
            checks.push("✅ Tokens configured");
            score += 1;
        } else {
            checks.push("❌ Missing tokens");
        }

        let status = match score {
            4.. => "✅ Production Ready",
            3 => "⚠️ Needs Attention",
            _ => "❌ Not Production Ready",
        };

        format!(
            "*🔍 Production Readiness Check*\n\n\
             {}\n\n\
             *Score:* {score}/{MAX_SCORE}\n\
             *Status:* {status}\n\n\
             *Recommendations:*\n\
             • Configure all admin users\n\
             • Enable TLS for production\n\
             • Create configuration backup\n\
             • Test all commands\n\
             • Monitor audit logs",
            checks.join("\n")
        )
    }
}
