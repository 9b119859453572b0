use std::sync::Arc;

use spyglass_audit::{Actor, AuditAction, AuditResult, AuditTrail};
use spyglass_policy::AuthorizationPolicy;
use spyglass_search::SearchBackend;
use tracing::{debug, info, warn};

use crate::args::preview;
use crate::command::{self, Command, Gate, Invocation, Parsed};
use crate::error::BotError;
use crate::message::IncomingMessage;
use crate::respond::Responder;
use crate::settings::BotSettings;

/// Length of the query preview stored when a raw query is refused.
pub const DENIED_PREVIEW_LEN: usize = 50;
/// Length of the query preview stored when a raw query runs.
pub const EXECUTED_PREVIEW_LEN: usize = 100;

/// Routes chat commands to handlers.
///
/// Each command produces exactly one reply. Privileged commands consult the
/// [`AuthorizationPolicy`] before doing anything, and refusals are recorded in
/// the [`AuditTrail`].
pub struct Bot {
    pub(crate) backend: Arc<dyn SearchBackend>,
    pub(crate) policy: Arc<AuthorizationPolicy>,
    pub(crate) audit: Arc<AuditTrail>,
    pub(crate) settings: BotSettings,
}

impl Bot {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        policy: Arc<AuthorizationPolicy>,
        audit: Arc<AuditTrail>,
        settings: BotSettings,
    ) -> Self {
        Self {
            backend,
            policy,
            audit,
            settings,
        }
    }

    pub fn policy(&self) -> &Arc<AuthorizationPolicy> {
        &self.policy
    }

    pub fn audit(&self) -> &Arc<AuditTrail> {
        &self.audit
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Handle a message and send the reply, if any, through `responder`.
    ///
    /// Returns whether a reply was sent. Messages that are not commands get
    /// none.
    pub async fn handle(
        &self,
        message: &IncomingMessage,
        responder: &dyn Responder,
    ) -> Result<bool, BotError> {
        let Some(reply) = self.reply_for(message).await else {
            return Ok(false);
        };
        responder.send(&reply).await?;
        Ok(true)
    }

    /// Compute the reply to a message without sending it.
    pub async fn reply_for(&self, message: &IncomingMessage) -> Option<String> {
        let parsed = command::parse(&message.text)?;
        let actor = message.actor();
        match parsed {
            Parsed::Unknown(keyword) => {
                debug!(user = %actor.user_id, keyword = %keyword, "unknown command");
                Some(format!(
                    "❓ Unknown command `{keyword}`. Type `!help` for the command list."
                ))
            }
            Parsed::Known(invocation) => Some(self.run(&actor, invocation).await),
        }
    }

    /// Effective row limit: the persisted override or the process default.
    pub fn result_limit(&self) -> usize {
        self.policy
            .snapshot()
            .result_limit
            .unwrap_or(self.settings.default_result_limit)
    }

    async fn run(&self, actor: &Actor, invocation: Invocation) -> String {
        let spec = invocation.spec;
        info!(
            user = %actor.user_id,
            channel = %actor.channel_id,
            command = spec.keyword,
            "command received"
        );

        match self.check_gate(actor, &invocation).await {
            Ok(()) => {}
            Err(BotError::Denied(reply)) => return reply,
            Err(e) => return format!("❌ {}: `{e}`", spec.failure),
        }

        let command = match invocation.command {
            Ok(command) => command,
            Err(invalid) => {
                if spec.audited {
                    self.record(
                        actor,
                        AuditAction::new(
                            spec.keyword,
                            format!("Attempted to {}", spec.attempt),
                            AuditResult::Failed,
                        )
                        .with_error(invalid.to_string()),
                    )
                    .await;
                }
                return invalid.0;
            }
        };

        match self.execute(actor, command).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(command = spec.keyword, error = %e, "command failed");
                format!("❌ {}: `{e}`", spec.failure)
            }
        }
    }

    /// Refusals come back as [`BotError::Denied`] carrying the reply text,
    /// after being recorded in the audit trail.
    async fn check_gate(&self, actor: &Actor, invocation: &Invocation) -> Result<(), BotError> {
        let spec = invocation.spec;
        match spec.gate {
            Gate::Open => Ok(()),
            Gate::Admin | Gate::AdminOrEmptyRoster => {
                let bootstrap =
                    spec.gate == Gate::AdminOrEmptyRoster && !self.policy.has_admins();
                if bootstrap || self.policy.is_admin(&actor.user_id) {
                    return Ok(());
                }
                self.record(
                    actor,
                    AuditAction::new(
                        spec.keyword,
                        format!("Attempted to {}", spec.attempt),
                        AuditResult::Denied,
                    )
                    .with_error("User is not admin"),
                )
                .await;
                Err(BotError::Denied(spec.denied.to_owned()))
            }
            Gate::RawQuery => {
                let decision = self
                    .policy
                    .can_execute_raw_query(&actor.user_id, &actor.channel_id);
                if decision.is_allowed() {
                    return Ok(());
                }
                self.record(
                    actor,
                    AuditAction::new(spec.keyword, "Denied SPL query", AuditResult::Denied)
                        .with_change("reason", decision.reason())
                        .with_change("channel", actor.channel_id.clone())
                        .with_change(
                            "query_preview",
                            preview(&invocation.rest, DENIED_PREVIEW_LEN),
                        )
                        .with_error(decision.reason()),
                )
                .await;
                Err(BotError::Denied(decision.reason().to_owned()))
            }
        }
    }

    async fn execute(&self, actor: &Actor, command: Command) -> Result<String, BotError> {
        match command {
            Command::Help => Ok(crate::format::help_text()),
            Command::WhoAmI => Ok(self.whoami(actor)),
            Command::AdminList => Ok(crate::format::format_admin_list(
                &self.policy.snapshot().admins,
            )),
            Command::AdminAdd(target) => self.admin_add(actor, &target).await,
            Command::AdminRemove(target) => self.admin_remove(actor, &target).await,
            Command::ChannelAllow(channel) => self.channel_allow(actor, &channel).await,
            Command::ChannelDeny(channel) => self.channel_deny(actor, &channel).await,
            Command::SecurityConfig => Ok(self.security_config()),
            Command::FeatureToggle(name) => self.feature_toggle(actor, &name).await,
            Command::ConfigShow => Ok(self.config_show()),
            Command::ConfigBackup => self.config_backup(actor).await,
            Command::SetResultLimit(limit) => self.set_result_limit(actor, limit).await,
            Command::ProdCheck => Ok(self.prod_check()),
            Command::AuditLogs(count) => Ok(self.audit_logs(count).await),
            Command::ExportLogs(format) => self.export_logs(actor, format).await,
            Command::SearchAlert { name, range, limit } => {
                self.search_alert(&name, &range, limit).await
            }
            Command::SearchList { contains, limit } => {
                self.search_list(contains.as_deref(), limit).await
            }
            Command::SearchInfo(name) => self.search_info(&name).await,
            Command::RawQuery(query) => self.raw_query(actor, &query).await,
            Command::SearchJobs => self.search_jobs().await,
            Command::SearchHistory(count) => Ok(self.search_history(count).await),
            Command::Indexes => self.indexes().await,
            Command::ServerStatus => self.server_status().await,
            Command::SystemStatus => Ok(self.system_status().await),
        }
    }

    /// Append to the audit trail. Persistence failures are reported by the
    /// trail itself and never fail the command.
    pub(crate) async fn record(&self, actor: &Actor, action: AuditAction) {
        let _ = self.audit.log_action(actor, action).await;
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("policy", &self.policy)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
