//! IP ban list (§4.2), grounded on `SDK/include/network.hpp`'s
//! `BanEntry` and the flat `samp.ban`-style persistence the original
//! server tooling maintains alongside it.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use wireproto::time::timestamp_secs;

#[derive(Clone, Debug)]
pub struct BanEntry {
    /// Dotted-quad pattern; an octet of `*` matches any value, e.g.
    /// `"203.0.113.*"`.
    pub pattern: String,
    pub name: Option<String>,
    pub reason: Option<String>,
    pub issued_at: u64,
    /// `None` means permanent.
    pub expires_at: Option<u64>,
}

impl BanEntry {
    pub fn new(pattern: impl Into<String>) -> Self {
        BanEntry {
            pattern: pattern.into(),
            name: None,
            reason: None,
            issued_at: timestamp_secs(),
            expires_at: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expires_at = Some(self.issued_at + ttl.as_secs());
        self
    }

    fn is_expired(&self, now: u64) -> bool {
        self.expires_at.map_or(false, |expiry| now >= expiry)
    }

    fn matches(&self, ip: &str) -> bool {
        let pattern_octets: Vec<&str> = self.pattern.split('.').collect();
        let ip_octets: Vec<&str> = ip.split('.').collect();
        if pattern_octets.len() != ip_octets.len() {
            return false;
        }
        pattern_octets
            .iter()
            .zip(ip_octets.iter())
            .all(|(p, i)| *p == "*" || p == i)
    }
}

#[derive(Default)]
pub struct BanList {
    entries: Vec<BanEntry>,
}

impl BanList {
    pub fn new() -> Self {
        BanList::default()
    }

    pub fn add(&mut self, entry: BanEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry whose TTL has elapsed as of `now`.
    pub fn expire(&mut self, now: SystemTime) {
        let now_secs = now
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.entries.retain(|e| !e.is_expired(now_secs));
    }

    /// Whether `ip` matches any unexpired entry, honoring `*` wildcard
    /// octets.
    pub fn is_banned(&self, ip: &str) -> bool {
        let now = timestamp_secs();
        self.entries.iter().any(|e| !e.is_expired(now) && e.matches(ip))
    }

    pub fn entries(&self) -> &[BanEntry] {
        &self.entries
    }

    pub fn unban(&mut self, pattern: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.pattern != pattern);
        self.entries.len() != before
    }

    /// Loads a flat ban file, one entry per line:
    /// `pattern[,name[,reason[,ttl_secs]]]`. Blank lines and lines
    /// starting with `#` are skipped.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut list = BanList::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split(',').map(str::trim);
            let pattern = match fields.next() {
                Some(p) if !p.is_empty() => p,
                _ => continue,
            };
            let mut entry = BanEntry::new(pattern);
            if let Some(name) = fields.next().filter(|s| !s.is_empty()) {
                entry = entry.with_name(name);
            }
            if let Some(reason) = fields.next().filter(|s| !s.is_empty()) {
                entry = entry.with_reason(reason);
            }
            if let Some(ttl) = fields.next().and_then(|s| s.parse::<u64>().ok()) {
                entry = entry.with_ttl(Duration::from_secs(ttl));
            }
            list.add(entry);
        }
        Ok(list)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut text = String::new();
        for e in &self.entries {
            text.push_str(&e.pattern);
            text.push(',');
            text.push_str(e.name.as_deref().unwrap_or(""));
            text.push(',');
            text.push_str(e.reason.as_deref().unwrap_or(""));
            text.push(',');
            if let Some(expires) = e.expires_at {
                text.push_str(&(expires - e.issued_at).to_string());
            }
            text.push('\n');
        }
        fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_octet_matches_any_value() {
        let mut list = BanList::new();
        list.add(BanEntry::new("203.0.113.*"));
        assert!(list.is_banned("203.0.113.42"));
        assert!(!list.is_banned("203.0.114.42"));
    }

    #[test]
    fn exact_pattern_requires_full_match() {
        let mut list = BanList::new();
        list.add(BanEntry::new("192.168.1.1"));
        assert!(list.is_banned("192.168.1.1"));
        assert!(!list.is_banned("192.168.1.2"));
    }

    #[test]
    fn expired_entry_is_dropped() {
        let mut list = BanList::new();
        let mut entry = BanEntry::new("1.2.3.4");
        entry.issued_at = 0;
        entry.expires_at = Some(1);
        list.add(entry);
        list.expire(SystemTime::UNIX_EPOCH + Duration::from_secs(100));
        assert!(list.is_empty());
    }

    #[test]
    fn unban_removes_matching_pattern() {
        let mut list = BanList::new();
        list.add(BanEntry::new("1.2.3.4"));
        assert!(list.unban("1.2.3.4"));
        assert!(list.is_empty());
    }

    #[test]
    fn round_trips_through_flat_file() {
        let mut list = BanList::new();
        list.add(BanEntry::new("10.0.0.*").with_name("griefer").with_reason("cheating"));
        let path = std::env::temp_dir().join(format!("sampcore-test-bans-{}.txt", std::process::id()));
        list.save(&path).unwrap();
        let reloaded = BanList::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.is_banned("10.0.0.5"));
        assert_eq!(reloaded.entries()[0].name.as_deref(), Some("griefer"));
    }
}
