//! Per-field cleaning rules
//!
//! Pure functions, no I/O besides the injected resolver. Each rule returns
//! the cleaned value plus an optional problem; any problem makes the store
//! not exportable.

use std::sync::LazyLock;

use regex::Regex;

use super::canonical::{Resolve, canonicalize};
use super::schema::HostRecord;

/// Port used when none is configured
pub const DEFAULT_PORT: u16 = 22;

static ALIAS_INVALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("alias pattern is valid"));

/// Cleaned value of one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutcome {
    pub value: String,
    pub problem: Option<String>,
}

impl FieldOutcome {
    fn ok(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            problem: None,
        }
    }

    fn problem(value: impl Into<String>, problem: String) -> Self {
        Self {
            value: value.into(),
            problem: Some(problem),
        }
    }
}

/// Integer prefix of `raw`, 0 when there is none
fn leading_int(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits
        .parse::<i64>()
        .map(|n| sign * n)
        .unwrap_or(if digits.is_empty() { 0 } else { sign * i64::MAX })
}

/// Coerce a port to a decimal string; 0/empty becomes 22
pub fn clean_port(key: &str, raw: &str) -> FieldOutcome {
    let port = leading_int(raw);
    if port == 0 {
        return FieldOutcome::ok(DEFAULT_PORT.to_string());
    }
    if !(1..=i64::from(u16::MAX)).contains(&port) {
        return FieldOutcome::problem(
            raw,
            format!(
                "Invalid port '{raw}' for host '{key}' - must be between 1 and 65535. Edit the host to fix it."
            ),
        );
    }
    FieldOutcome::ok(port.to_string())
}

/// Trim a user name; empty is a problem
pub fn clean_user(key: &str, raw: &str) -> FieldOutcome {
    let user = raw.trim();
    if user.is_empty() {
        return FieldOutcome::problem(
            user,
            format!("Empty user for host '{key}'. Set ssh:user or remove the key."),
        );
    }
    FieldOutcome::ok(user)
}

/// Trim an alias and replace invalid runs with `_`; empty is a problem
pub fn clean_alias(key: &str, raw: &str) -> FieldOutcome {
    let alias = ALIAS_INVALID.replace_all(raw.trim(), "_").into_owned();
    if alias.is_empty() {
        return FieldOutcome::problem(
            alias,
            format!("Empty alias for host '{key}'. Set pssh:alias to a name made of A-Z, a-z, 0-9, '.', '_' or '-'."),
        );
    }
    FieldOutcome::ok(alias)
}

/// Canonicalize a hostname; empty is a problem
pub fn clean_hostname(
    key: &str,
    raw: &str,
    lookup_enabled: bool,
    resolver: &dyn Resolve,
) -> FieldOutcome {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldOutcome::problem(
            trimmed,
            format!("Empty hostname for host '{key}'. Set ssh:hostname to a domain or IP."),
        );
    }
    let canonical = canonicalize(resolver, trimmed, lookup_enabled, true);
    FieldOutcome {
        value: canonical.hostname,
        problem: canonical.warning,
    }
}

/// Clean every field of one host in place, returning the problems found
pub fn clean_host(key: &str, host: &mut HostRecord, resolver: &dyn Resolve) -> Vec<String> {
    let mut problems = Vec::new();
    let mut record = |outcome: FieldOutcome| {
        if let Some(problem) = outcome.problem {
            problems.push(problem);
        }
        outcome.value
    };

    if host.pssh.alias.is_empty() {
        host.pssh.alias = key.to_string();
    }

    if host.pssh.cleaning_enabled("hostname") {
        if let Some(raw) = host.ssh.get("hostname") {
            let lookup = host.pssh.lookup_enabled();
            let value = record(clean_hostname(key, raw, lookup, resolver));
            host.ssh.insert("hostname".to_string(), value);
        }
    }

    if host.pssh.cleaning_enabled("port") {
        let raw = host.ssh.get("port").map(String::as_str).unwrap_or("");
        let value = record(clean_port(key, raw));
        host.ssh.insert("port".to_string(), value);
    }

    if host.pssh.cleaning_enabled("user") {
        if let Some(raw) = host.ssh.get("user") {
            let value = record(clean_user(key, raw));
            host.ssh.insert("user".to_string(), value);
        }
    }

    if host.pssh.cleaning_enabled("alias") {
        host.pssh.alias = record(clean_alias(key, &host.pssh.alias));
    }

    if host.pssh.cleaning_enabled("alias_additional") {
        let additional = std::mem::take(&mut host.pssh.alias_additional);
        host.pssh.alias_additional = additional
            .iter()
            .map(|alias| record(clean_alias(key, alias)))
            .filter(|alias| !alias.is_empty())
            .collect();
    }

    problems
}
