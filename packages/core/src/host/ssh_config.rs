//! SSH config file parsing and writing
//!
//! Reads `~/.ssh/config` style files into the store and renders the store
//! back out. Keys are stored lowercase and written in their canonical case.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::error::StoreError;
use super::schema::HostRecord;
use super::store::ConfigStore;

static KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+(.*)$").expect("key/value pattern is valid"));

/// Canonical case of every ssh_config keyword we know about
const CONFIG_KEYS: &[&str] = &[
    "AddKeysToAgent",
    "AddressFamily",
    "BatchMode",
    "BindAddress",
    "BindInterface",
    "CanonicalDomains",
    "CanonicalizeFallbackLocal",
    "CanonicalizeHostname",
    "CanonicalizeMaxDots",
    "CanonicalizePermittedCNAMEs",
    "CASignatureAlgorithms",
    "CertificateFile",
    "ChallengeResponseAuthentication",
    "CheckHostIP",
    "Ciphers",
    "ClearAllForwardings",
    "Compression",
    "ConnectionAttempts",
    "ConnectTimeout",
    "ControlMaster",
    "ControlPath",
    "ControlPersist",
    "DynamicForward",
    "EnableEscapeCommandline",
    "EnableSSHKeysign",
    "EscapeChar",
    "ExitOnForwardFailure",
    "FingerprintHash",
    "ForkAfterAuthentication",
    "ForwardAgent",
    "ForwardX11",
    "ForwardX11Timeout",
    "ForwardX11Trusted",
    "GatewayPorts",
    "GlobalKnownHostsFile",
    "GSSAPIAuthentication",
    "GSSAPIDelegateCredentials",
    "HashKnownHosts",
    "Host",
    "HostbasedAcceptedAlgorithms",
    "HostbasedAuthentication",
    "HostKeyAlgorithms",
    "HostKeyAlias",
    "HostName",
    "IdentitiesOnly",
    "IdentityAgent",
    "IdentityFile",
    "IgnoreUnknown",
    "Include",
    "IPQoS",
    "KbdInteractiveAuthentication",
    "KbdInteractiveDevices",
    "KexAlgorithms",
    "KnownHostsCommand",
    "LocalCommand",
    "LocalForward",
    "LogLevel",
    "LogVerbose",
    "MACs",
    "Match",
    "NoHostAuthenticationForLocalhost",
    "NumberOfPasswordPrompts",
    "PasswordAuthentication",
    "PermitLocalCommand",
    "PermitRemoteOpen",
    "PKCS11Provider",
    "Port",
    "PreferredAuthentications",
    "ProxyCommand",
    "ProxyJump",
    "ProxyUseFdpass",
    "PubkeyAcceptedAlgorithms",
    "PubkeyAcceptedKeyTypes",
    "PubkeyAuthentication",
    "RekeyLimit",
    "RemoteCommand",
    "RemoteForward",
    "RequestTTY",
    "RequiredRSASize",
    "RevokedHostKeys",
    "SecurityKeyProvider",
    "SendEnv",
    "ServerAliveCountMax",
    "ServerAliveInterval",
    "SessionType",
    "SetEnv",
    "StdinNull",
    "StreamLocalBindMask",
    "StreamLocalBindUnlink",
    "StrictHostKeyChecking",
    "SyslogFacility",
    "TCPKeepAlive",
    "Tag",
    "Tunnel",
    "TunnelDevice",
    "UpdateHostKeys",
    "UseKeychain",
    "User",
    "UserKnownHostsFile",
    "VerifyHostKeyDNS",
    "VisualHostKey",
    "XAuthLocation",
];

/// Canonical spelling of a lowercase key, if known
pub fn known_key(key: &str) -> Option<&'static str> {
    CONFIG_KEYS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(key))
}

/// Key as written to ssh_config: canonical case, or first letter uppercased
pub fn display_key(key: &str) -> Cow<'_, str> {
    if let Some(known) = known_key(key) {
        return Cow::Borrowed(known);
    }
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => Cow::Owned(first.to_uppercase().chain(chars).collect()),
        None => Cow::Borrowed(key),
    }
}

/// Timestamp format used in the generated header
pub const STAMP_FORMAT: &str = "%Y-%m-%d_%H.%M.%S";

impl ConfigStore {
    /// Load hosts from an ssh_config file
    ///
    /// Options before the first `Host` line become global options. Unknown
    /// keys are reported once, but still loaded.
    pub fn read_ssh(&mut self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        self.read_ssh_str(&text, path)
    }

    /// Parse ssh_config text; `origin` is only used in error messages
    pub fn read_ssh_str(&mut self, text: &str, origin: &Path) -> Result<(), StoreError> {
        self.reset_derived();
        let mut unknown_keys: BTreeMap<String, String> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(captures) = KEY_VALUE.captures(line) else {
                return Err(StoreError::SshSyntax {
                    path: origin.to_path_buf(),
                    line: index + 1,
                });
            };
            let original_key = &captures[1];
            let key = original_key.to_lowercase();
            let value = captures[2].trim().to_string();

            if known_key(&key).is_none() {
                unknown_keys.insert(key.clone(), original_key.to_string());
            }

            if key == "host" {
                self.data.hosts.insert(value.clone(), HostRecord::default());
                current = Some(value);
                continue;
            }

            match current.as_ref().and_then(|host| self.data.hosts.get_mut(host)) {
                Some(host) => {
                    host.ssh.insert(key, value);
                }
                None => {
                    self.data.ssh.insert(key, value);
                }
            }
        }

        if !unknown_keys.is_empty() {
            let keys: BTreeSet<String> = unknown_keys.into_values().collect();
            let keys: Vec<String> = keys.into_iter().collect();
            self.reporter.warn(&format!(
                "Unknown Config Key(s) Present - if these are valid, the key table should be updated to know about them: {}",
                keys.join(", ")
            ));
        }

        tracing::debug!(
            "Read {} hosts from {}",
            self.data.hosts.len(),
            origin.display()
        );
        Ok(())
    }

    /// Render the store as ssh_config text
    ///
    /// Every alias gets its own `Host` block, in alias map order. The store
    /// should have been cleaned first.
    pub fn render_ssh(&self, stamp: &str) -> String {
        let mut out = String::new();
        let rule = "# ---------------------------------------\n";

        out.push_str(rule);
        out.push_str(&format!("# Generated by PSSH - {stamp}\n"));
        out.push_str("#   - DO NOT EDIT THIS FILE, USE PSSH\n");
        out.push_str(rule);

        out.push('\n');
        out.push_str(rule);
        out.push_str("# General Config\n");
        out.push_str(rule);
        for (key, value) in self.global_options() {
            out.push_str(&format!("{} {value}\n", display_key(key)));
        }

        out.push('\n');
        out.push_str(rule);
        out.push_str("# HOSTS\n");
        out.push_str(rule);
        for (alias, key) in self.alias_map().iter() {
            if let Some(host) = self.hosts().get(key) {
                out.push_str(&render_host(alias, host));
            }
        }

        out.push_str("\n# vim: syntax=sshconfig\n");
        out
    }

    /// Clean, check exportability and write ssh_config to `path`
    pub fn write_ssh(&mut self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        if !self.clean()? {
            return Err(StoreError::NotExportable);
        }

        let stamp = chrono::Local::now().format(STAMP_FORMAT).to_string();
        let content = self.render_ssh(&stamp);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }
        fs::write(path, content).map_err(|e| StoreError::io(path, e))?;

        tracing::info!(
            "Wrote {} aliases to {}",
            self.alias_map().len(),
            path.display()
        );
        Ok(())
    }
}

/// One `Host` block
pub fn render_host(alias: &str, host: &HostRecord) -> String {
    let mut out = format!("Host {alias}\n");
    for (key, value) in &host.ssh {
        out.push_str(&format!("    {} {value}\n", display_key(key)));
    }
    out
}
