use spyglass_audit::Actor;

use crate::args::preview;
use crate::bot::Bot;
use crate::format::enabled;

impl Bot {
    pub(crate) fn whoami(&self, actor: &Actor) -> String {
        let is_admin = self.policy.is_admin(&actor.user_id);
        let decision = self
            .policy
            .can_execute_raw_query(&actor.user_id, &actor.channel_id);

        let mut out = format!(
            "*🔍 Your Info*\n\
             *User ID:* `{}`\n\
             *Channel:* `{}`\n\
             *Role:* {}\n\
             *SPL Query:* {}\n",
            actor.user_id,
            actor.channel_id,
            if is_admin { "👑 Admin" } else { "👤 User" },
            if decision.is_allowed() { "✅ Allowed" } else { "❌ Restricted" },
        );
        if is_admin {
            out.push_str(
                "\n*Admin Commands Available:*\n• `!splunk-query`, `!admin-add`, `!export-logs`, etc.",
            );
        } else {
            out.push_str("\n*Available Commands:*\n• `!search-alert`, `!search-list`, `!help`");
        }
        out
    }

    pub(crate) async fn system_status(&self) -> String {
        let backend = match self.backend.get_server_info().await {
            Ok(info) => format!("✅ Connected (v{})", info.version),
            Err(e) => format!("❌ Disconnected: {}", preview(&e.to_string(), 50)),
        };
        let state = self.policy.snapshot();
        let entries = self.audit.len().await;

        format!(
            "*🛠️ System Status*\n\n\
             *Bot:*\n\
             • Status: ✅ Running\n\
             • Mode: {}\n\
             • Admins: {}\n\
             • Audit Entries: {entries}\n\n\
             *Search:*\n\
             • Status: {backend}\n\
             • URL: `{}`\n\
             • TLS: {}\n\n\
             *Features:*\n\
             • SPL Query: {}\n\
             • Result Limit: {}\n\n\
             Use `!help` for all commands",
            self.settings.transport,
            state.admins.len(),
            self.settings.search_base_url,
            if self.settings.verify_tls { "Enabled" } else { "Disabled" },
            enabled(state.spl_enabled),
            self.result_limit(),
        )
    }
}
