//! Authorization boundary for managed domains
//!
//! Matching is case-insensitive and ignores a trailing root dot on both the
//! configured entries and the candidate name. A name matches an entry when it
//! equals the entry or ends with `"." + entry`.
//!
//! An empty filter matches every name. Whether an empty filter is acceptable
//! at all is decided by configuration (`DomainFilterConfig::allow_all_when_empty`),
//! not here.

/// Second-level labels that form a public suffix under a country code
/// (`co.uk`, `com.au`). Only used when guessing a registrable domain.
const SECOND_LEVEL_SUFFIXES: &[&str] = &[
    "ac", "co", "com", "edu", "gov", "ltd", "mil", "net", "nic", "org", "plc", "sch",
];

/// Ordered set of managed root domains
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainFilter {
    filters: Vec<String>,
}

/// Lowercase and strip surrounding whitespace and the trailing root dot
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

impl DomainFilter {
    /// Create a filter from root domain strings
    ///
    /// Entries are normalized; blanks and duplicates are dropped, first
    /// occurrence wins.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filters: Vec<String> = Vec::new();
        for domain in domains {
            let domain = normalize_name(domain.as_ref());
            if !domain.is_empty() && !filters.contains(&domain) {
                filters.push(domain);
            }
        }
        Self { filters }
    }

    /// Configured root domains, normalized
    pub fn domains(&self) -> &[String] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Whether `name` falls under a managed root domain
    pub fn matches(&self, name: &str) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        self.root_for(name).is_some()
    }

    /// Outermost configured entry that `name` falls under
    ///
    /// A nested entry (`dev.example.com` next to `example.com`) authorizes
    /// nothing extra; its names still live in the outer domain's record list.
    pub fn root_for(&self, name: &str) -> Option<&str> {
        let name = normalize_name(name);
        self.filters
            .iter()
            .filter(|entry| is_within(&name, entry))
            .min_by_key(|entry| entry.len())
            .map(String::as_str)
    }

    /// Domain whose record list holds `name`
    ///
    /// This is the outermost configured entry. With an empty filter the
    /// registrable domain is guessed from the name itself.
    pub fn zone_for(&self, name: &str) -> Option<String> {
        if self.filters.is_empty() {
            return guess_registrable_domain(name);
        }
        self.root_for(name).map(str::to_string)
    }
}

/// `name` equals `domain` or is a subdomain of it (both normalized)
pub(crate) fn is_within(name: &str, domain: &str) -> bool {
    match name.strip_suffix(domain) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

/// Take the last two labels, or three when the last two form a known
/// second-level suffix under a country code (`example.co.uk`).
fn guess_registrable_domain(name: &str) -> Option<String> {
    let name = normalize_name(name);
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    let n = parts.len();
    let zone = if n >= 3 && parts[n - 1].len() == 2 && SECOND_LEVEL_SUFFIXES.contains(&parts[n - 2]) {
        parts[n - 3..].join(".")
    } else {
        parts[n - 2..].join(".")
    };
    Some(zone)
}
