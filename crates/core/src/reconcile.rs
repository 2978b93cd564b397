//! Cookie reconciliation: merging freshly observed session cookies with the
//! cached list into one canonical list.

use std::collections::HashSet;

use slogin_protocol::Cookie;

/// Keeps only cookies whose name starts with `prefix`.
pub fn session_cookies(cookies: Vec<Cookie>, prefix: &str) -> Vec<Cookie> {
	cookies.into_iter().filter(|cookie| cookie.name.starts_with(prefix)).collect()
}

/// Merges `fresh` and `cached` into the canonical cached form.
///
/// Domains appear in order of first occurrence across `fresh` then `cached`.
/// Within a domain the first cookie seen for each name wins, so fresh values
/// replace cached ones. `path` is stripped from every result.
pub fn merge(fresh: &[Cookie], cached: &[Cookie]) -> Vec<Cookie> {
	let combined: Vec<&Cookie> = fresh.iter().chain(cached).collect();

	let mut domains: Vec<&str> = Vec::new();
	for cookie in &combined {
		if !domains.contains(&cookie.domain.as_str()) {
			domains.push(&cookie.domain);
		}
	}

	let mut merged = Vec::with_capacity(combined.len());
	for domain in domains {
		let mut seen: HashSet<&str> = HashSet::new();
		for cookie in combined.iter().filter(|c| c.domain == domain) {
			if seen.insert(&cookie.name) {
				merged.push(cookie.canonical());
			}
		}
	}
	merged
}

/// Whether persisting `merged` would change what is cached. Order-sensitive.
pub fn has_changed(merged: &[Cookie], cached: &[Cookie]) -> bool {
	merged != cached
}
