//! The static command table and per-command argument parsers.

use spyglass_audit::ExportFormat;
use spyglass_search::TimeRange;

use crate::args::{self, parse_args};
use crate::error::ValidationError;

/// Keyword of the raw-query command, also used to find its audit entries.
pub const RAW_QUERY_COMMAND: &str = "!splunk-query";

const DEFAULT_AUDIT_COUNT: usize = 10;
const MAX_AUDIT_COUNT: usize = 50;
const DEFAULT_LIST_LIMIT: usize = 20;

/// Who may run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    Admin,
    /// Admins, or anyone while the roster is empty.
    AdminOrEmptyRoster,
    /// The raw-query policy decision.
    RawQuery,
}

/// Help section a command is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Search,
    Monitoring,
    Configuration,
    Admins,
    Security,
    System,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Self::Search,
        Self::Monitoring,
        Self::Configuration,
        Self::Admins,
        Self::Security,
        Self::System,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Search => "📊 SEARCH COMMANDS",
            Self::Monitoring => "🔍 MONITORING COMMANDS",
            Self::Configuration => "⚙️ CONFIGURATION COMMANDS",
            Self::Admins => "👥 ADMIN MANAGEMENT",
            Self::Security => "🔐 SECURITY COMMANDS",
            Self::System => "🛠️ SYSTEM COMMANDS",
        }
    }
}

/// One row of the command table.
#[derive(Debug)]
pub struct CommandSpec {
    pub keyword: &'static str,
    pub gate: Gate,
    /// Whether invocations past the gate are recorded in the audit trail.
    pub audited: bool,
    pub section: Section,
    pub usage: &'static str,
    pub summary: &'static str,
    /// Completes "Attempted to ..." in audit entries.
    pub attempt: &'static str,
    /// Reply when an admin gate refuses the caller.
    pub denied: &'static str,
    /// Prefix of the reply when the handler fails.
    pub failure: &'static str,
    parse: fn(&str) -> Result<Command, ValidationError>,
}

/// A parsed command with typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    WhoAmI,
    AdminList,
    AdminAdd(String),
    AdminRemove(String),
    ChannelAllow(String),
    ChannelDeny(String),
    SecurityConfig,
    FeatureToggle(String),
    ConfigShow,
    ConfigBackup,
    SetResultLimit(usize),
    ProdCheck,
    AuditLogs(usize),
    ExportLogs(ExportFormat),
    SearchAlert {
        name: String,
        range: TimeRange,
        limit: Option<usize>,
    },
    SearchList {
        contains: Option<String>,
        limit: usize,
    },
    SearchInfo(String),
    RawQuery(String),
    SearchJobs,
    SearchHistory(usize),
    Indexes,
    ServerStatus,
    SystemStatus,
}

/// A `!`-prefixed message matched against the table.
#[derive(Debug)]
pub enum Parsed {
    Known(Invocation),
    Unknown(String),
}

/// A known command and the outcome of parsing its arguments.
#[derive(Debug)]
pub struct Invocation {
    pub spec: &'static CommandSpec,
    /// Text after the keyword, trimmed.
    pub rest: String,
    pub command: Result<Command, ValidationError>,
}

/// Match `text` against the command table.
///
/// Returns `None` for messages that are not commands at all.
pub fn parse(text: &str) -> Option<Parsed> {
    let text = text.trim();
    if !text.starts_with('!') {
        return None;
    }
    let (keyword, rest) = text
        .split_once(char::is_whitespace)
        .map_or((text, ""), |(k, r)| (k, r.trim()));

    let Some(spec) = lookup(keyword) else {
        return Some(Parsed::Unknown(keyword.to_owned()));
    };
    Some(Parsed::Known(Invocation {
        spec,
        rest: rest.to_owned(),
        command: (spec.parse)(rest),
    }))
}

/// Find a command by keyword (case-sensitive).
pub fn lookup(keyword: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.keyword == keyword)
}

fn no_args(command: Command) -> Result<Command, ValidationError> {
    Ok(command)
}

fn parse_admin_add(rest: &str) -> Result<Command, ValidationError> {
    args::user_id(rest).map(Command::AdminAdd).ok_or_else(|| {
        ValidationError::new(
            "❌ Usage: `!admin-add @username` or `!admin-add U123456789`\n\
             *Tip:* Right-click user → Copy user ID",
        )
    })
}

fn parse_admin_remove(rest: &str) -> Result<Command, ValidationError> {
    args::user_id(rest).map(Command::AdminRemove).ok_or_else(|| {
        ValidationError::new("❌ Usage: `!admin-remove @username` or `!admin-remove U123456789`")
    })
}

fn parse_channel_add(rest: &str) -> Result<Command, ValidationError> {
    args::channel_id(rest).map(Command::ChannelAllow).ok_or_else(|| {
        ValidationError::new(
            "❌ Usage: `!admin-channel-add #channel` or `!admin-channel-add C123456789`\n\
             *Tip:* Right-click channel → Copy channel ID",
        )
    })
}

fn parse_channel_remove(rest: &str) -> Result<Command, ValidationError> {
    args::channel_id(rest).map(Command::ChannelDeny).ok_or_else(|| {
        ValidationError::new(
            "❌ Usage: `!admin-channel-remove #channel` or `!admin-channel-remove C123456789`",
        )
    })
}

fn parse_feature_toggle(rest: &str) -> Result<Command, ValidationError> {
    if rest.is_empty() {
        return Err(ValidationError::new(
            "❌ Usage: `!feature-toggle <feature>`\n\
             *Available features:*\n\
             • `spl_query` - Enable/disable SPL queries\n\
             • `approval` - Require approval for SPL queries\n\n\
             *Example:* `!feature-toggle spl_query`",
        ));
    }
    Ok(Command::FeatureToggle(rest.to_lowercase()))
}

fn parse_config_set(rest: &str) -> Result<Command, ValidationError> {
    let mut parts = rest.split_whitespace();
    let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ValidationError::new(
            "❌ Usage: `!config-set <key> <value>`\n*Example:* `!config-set result_limit 10`",
        ));
    };
    if key != "result_limit" {
        return Err(ValidationError(format!(
            "❌ Unknown setting: `{key}`\nAvailable: `result_limit`"
        )));
    }
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(Command::SetResultLimit(n)),
        _ => Err(ValidationError::new("❌ Result limit must be a positive number")),
    }
}

fn parse_audit_logs(rest: &str) -> Result<Command, ValidationError> {
    Ok(Command::AuditLogs(args::count(
        rest,
        DEFAULT_AUDIT_COUNT,
        MAX_AUDIT_COUNT,
    )))
}

fn parse_search_history(rest: &str) -> Result<Command, ValidationError> {
    Ok(Command::SearchHistory(args::count(
        rest,
        DEFAULT_AUDIT_COUNT,
        MAX_AUDIT_COUNT,
    )))
}

fn parse_export_logs(rest: &str) -> Result<Command, ValidationError> {
    let requested = rest.split_whitespace().next().unwrap_or("json");
    ExportFormat::from_name(requested)
        .map(Command::ExportLogs)
        .ok_or_else(|| {
            ValidationError::new(
                "❌ Invalid format. Use: `!export-logs <json|csv|txt>`\n\
                 *Examples:*\n\
                 • `!export-logs json` → Structured data format\n\
                 • `!export-logs csv` → Spreadsheet format\n\
                 • `!export-logs txt` → Readable text format",
            )
        })
}

fn parse_limit(value: Option<&str>) -> Result<Option<usize>, ValidationError> {
    match value {
        None => Ok(None),
        Some(v) => match v.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ValidationError(format!(
                "❌ `limit` must be a positive number, got `{v}`"
            ))),
        },
    }
}

fn parse_search_alert(rest: &str) -> Result<Command, ValidationError> {
    let parsed = parse_args(rest);
    let name = match parsed.name.as_deref() {
        Some(name) if !name.eq_ignore_ascii_case("help") => name.to_owned(),
        _ => {
            return Err(ValidationError::new(
                "*Usage:* `!search-alert <search_name> [earliest=-24h] [latest=now] [limit=5]`\n\
                 *Example:* `!search-alert failed_logins earliest=-2h limit=10`",
            ));
        }
    };
    let defaults = TimeRange::default();
    let range = TimeRange::new(
        parsed.param("earliest").unwrap_or(defaults.earliest.as_str()),
        parsed.param("latest").unwrap_or(defaults.latest.as_str()),
    );
    Ok(Command::SearchAlert {
        name,
        range,
        limit: parse_limit(parsed.param("limit"))?,
    })
}

fn parse_search_list(rest: &str) -> Result<Command, ValidationError> {
    let parsed = parse_args(rest);
    let positional = parsed.name.filter(|n| !n.contains('='));
    let contains = parsed
        .params
        .get("contains")
        .cloned()
        .or(positional)
        .filter(|c| !c.is_empty());
    let limit = parse_limit(parsed.params.get("limit").map(String::as_str))?
        .unwrap_or(DEFAULT_LIST_LIMIT);
    Ok(Command::SearchList { contains, limit })
}

fn parse_search_info(rest: &str) -> Result<Command, ValidationError> {
    parse_args(rest)
        .name
        .map(Command::SearchInfo)
        .ok_or_else(|| ValidationError::new("*Usage:* `!search-info <saved_search_name>`"))
}

fn parse_raw_query(rest: &str) -> Result<Command, ValidationError> {
    let query = args::unquote(rest);
    if query.is_empty() {
        return Err(ValidationError::new(
            "*Usage:* `!splunk-query \"index=_internal | head 5\"`",
        ));
    }
    Ok(Command::RawQuery(query.to_owned()))
}

/// Every command the bot understands.
pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        keyword: "!search-alert",
        gate: Gate::Open,
        audited: false,
        section: Section::Search,
        usage: "!search-alert <name>",
        summary: "Run saved search",
        attempt: "run saved search",
        denied: "",
        failure: "Error running saved search",
        parse: parse_search_alert,
    },
    CommandSpec {
        keyword: "!search-list",
        gate: Gate::Open,
        audited: false,
        section: Section::Search,
        usage: "!search-list [contains=keyword]",
        summary: "List saved searches",
        attempt: "list saved searches",
        denied: "",
        failure: "Error listing saved searches",
        parse: parse_search_list,
    },
    CommandSpec {
        keyword: "!search-info",
        gate: Gate::Open,
        audited: false,
        section: Section::Search,
        usage: "!search-info <name>",
        summary: "Show search details",
        attempt: "describe saved search",
        denied: "",
        failure: "Error getting search info",
        parse: parse_search_info,
    },
    CommandSpec {
        keyword: "!splunk-status",
        gate: Gate::Open,
        audited: false,
        section: Section::Search,
        usage: "!splunk-status",
        summary: "Check search server health",
        attempt: "check server status",
        denied: "",
        failure: "Cannot reach the search server",
        parse: |_| no_args(Command::ServerStatus),
    },
    CommandSpec {
        keyword: "!splunk-indexes",
        gate: Gate::Open,
        audited: false,
        section: Section::Search,
        usage: "!splunk-indexes",
        summary: "List available indexes",
        attempt: "list indexes",
        denied: "",
        failure: "Error listing indexes",
        parse: |_| no_args(Command::Indexes),
    },
    CommandSpec {
        keyword: RAW_QUERY_COMMAND,
        gate: Gate::RawQuery,
        audited: true,
        section: Section::Search,
        usage: "!splunk-query \"<SPL>\"",
        summary: "Run raw SPL query *(admin only)*",
        attempt: "run SPL query",
        denied: "",
        failure: "Error running SPL query",
        parse: parse_raw_query,
    },
    CommandSpec {
        keyword: "!search-jobs",
        gate: Gate::Admin,
        audited: false,
        section: Section::Monitoring,
        usage: "!search-jobs",
        summary: "List recent search jobs *(admin only)*",
        attempt: "list search jobs",
        denied: "❌ Only admins can view search jobs",
        failure: "Error listing search jobs",
        parse: |_| no_args(Command::SearchJobs),
    },
    CommandSpec {
        keyword: "!search-history",
        gate: Gate::Admin,
        audited: false,
        section: Section::Monitoring,
        usage: "!search-history [count]",
        summary: "Show recent SPL queries *(admin only)*",
        attempt: "view search history",
        denied: "❌ Only admins can view search history",
        failure: "Error reading search history",
        parse: parse_search_history,
    },
    CommandSpec {
        keyword: "!whoami",
        gate: Gate::Open,
        audited: false,
        section: Section::Monitoring,
        usage: "!whoami",
        summary: "Show your user info and permissions",
        attempt: "show user info",
        denied: "",
        failure: "Error reading user info",
        parse: |_| no_args(Command::WhoAmI),
    },
    CommandSpec {
        keyword: "!config-show",
        gate: Gate::Admin,
        audited: false,
        section: Section::Configuration,
        usage: "!config-show",
        summary: "Show current configuration",
        attempt: "view configuration",
        denied: "❌ Only admins can view configuration",
        failure: "Error reading configuration",
        parse: |_| no_args(Command::ConfigShow),
    },
    CommandSpec {
        keyword: "!config-backup",
        gate: Gate::Admin,
        audited: true,
        section: Section::Configuration,
        usage: "!config-backup",
        summary: "Export configuration as JSON",
        attempt: "back up configuration",
        denied: "❌ Only admins can backup configuration",
        failure: "Error backing up configuration",
        parse: |_| no_args(Command::ConfigBackup),
    },
    CommandSpec {
        keyword: "!config-set",
        gate: Gate::Admin,
        audited: true,
        section: Section::Configuration,
        usage: "!config-set result_limit <n>",
        summary: "Change a setting",
        attempt: "change configuration",
        denied: "❌ Only admins can change configuration",
        failure: "Failed to save setting",
        parse: parse_config_set,
    },
    CommandSpec {
        keyword: "!prod-check",
        gate: Gate::Admin,
        audited: false,
        section: Section::Configuration,
        usage: "!prod-check",
        summary: "Production readiness checklist",
        attempt: "run production check",
        denied: "❌ Only admins can run production check",
        failure: "Error running production check",
        parse: |_| no_args(Command::ProdCheck),
    },
    CommandSpec {
        keyword: "!admin-list",
        gate: Gate::Open,
        audited: false,
        section: Section::Admins,
        usage: "!admin-list",
        summary: "Show all admins",
        attempt: "list admins",
        denied: "",
        failure: "Error listing admins",
        parse: |_| no_args(Command::AdminList),
    },
    CommandSpec {
        keyword: "!admin-add",
        gate: Gate::AdminOrEmptyRoster,
        audited: true,
        section: Section::Admins,
        usage: "!admin-add @user",
        summary: "Add admin *(admin only)*",
        attempt: "add admin",
        denied: "❌ Only admins can add other admins",
        failure: "Failed to add admin",
        parse: parse_admin_add,
    },
    CommandSpec {
        keyword: "!admin-remove",
        gate: Gate::Admin,
        audited: true,
        section: Section::Admins,
        usage: "!admin-remove @user",
        summary: "Remove admin *(admin only)*",
        attempt: "remove admin",
        denied: "❌ Only admins can remove other admins",
        failure: "Failed to remove admin",
        parse: parse_admin_remove,
    },
    CommandSpec {
        keyword: "!admin-channel-add",
        gate: Gate::Admin,
        audited: true,
        section: Section::Admins,
        usage: "!admin-channel-add #channel",
        summary: "Allow SPL in channel",
        attempt: "allow channel",
        denied: "❌ Only admins can configure channel restrictions",
        failure: "Failed to update allowed channels",
        parse: parse_channel_add,
    },
    CommandSpec {
        keyword: "!admin-channel-remove",
        gate: Gate::Admin,
        audited: true,
        section: Section::Admins,
        usage: "!admin-channel-remove #channel",
        summary: "Block SPL in channel",
        attempt: "remove allowed channel",
        denied: "❌ Only admins can configure channel restrictions",
        failure: "Failed to update allowed channels",
        parse: parse_channel_remove,
    },
    CommandSpec {
        keyword: "!security-config",
        gate: Gate::Admin,
        audited: false,
        section: Section::Security,
        usage: "!security-config",
        summary: "View security settings",
        attempt: "view security configuration",
        denied: "❌ Only admins can view security configuration",
        failure: "Error reading security configuration",
        parse: |_| no_args(Command::SecurityConfig),
    },
    CommandSpec {
        keyword: "!feature-toggle",
        gate: Gate::Admin,
        audited: true,
        section: Section::Security,
        usage: "!feature-toggle <feature>",
        summary: "Enable/disable features",
        attempt: "toggle feature",
        denied: "❌ Only admins can toggle features",
        failure: "Failed to toggle feature",
        parse: parse_feature_toggle,
    },
    CommandSpec {
        keyword: "!audit-logs",
        gate: Gate::Admin,
        audited: false,
        section: Section::Security,
        usage: "!audit-logs [count]",
        summary: "View recent security events",
        attempt: "view audit logs",
        denied: "❌ Only admins can view audit logs",
        failure: "Error reading audit logs",
        parse: parse_audit_logs,
    },
    CommandSpec {
        keyword: "!export-logs",
        gate: Gate::Admin,
        audited: true,
        section: Section::Security,
        usage: "!export-logs <json|csv|txt>",
        summary: "Export audit logs *(admin only)*",
        attempt: "export logs",
        denied: "❌ Only admins can export logs",
        failure: "Failed to export logs",
        parse: parse_export_logs,
    },
    CommandSpec {
        keyword: "!system-status",
        gate: Gate::Open,
        audited: false,
        section: Section::System,
        usage: "!system-status",
        summary: "Bot health check",
        attempt: "check system status",
        denied: "",
        failure: "Error checking system status",
        parse: |_| no_args(Command::SystemStatus),
    },
    CommandSpec {
        keyword: "!help",
        gate: Gate::Open,
        audited: false,
        section: Section::System,
        usage: "!help",
        summary: "Show this message",
        attempt: "show help",
        denied: "",
        failure: "Error showing help",
        parse: |_| no_args(Command::Help),
    },
];
