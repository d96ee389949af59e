//! Pure helpers for search names, fuzzy matching and title selection.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::AnimeEntry;

/// Minimum similarity for a search result to be accepted outright.
pub const MATCH_THRESHOLD: f64 = 0.75;

const MAX_SEARCH_NAME: usize = 100;
const MAX_TITLE: usize = 85;
const TRUNCATED_TITLE: usize = 80;

static SEASON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.\-]S\d+.*").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.\-]\d{4}\..*").unwrap());

/// Search name for a release: cut before the season marker (`.S01…`) or,
/// failing that, the year (`.2019.…`), dots to spaces, at most 100 chars.
pub fn extract_search_name(release_name: &str) -> String {
    let mut name = SEASON_RE.replace(release_name, "").into_owned();
    if name == release_name {
        name = YEAR_RE.replace(release_name, "").into_owned();
    }
    name.replace('.', " ")
        .chars()
        .take(MAX_SEARCH_NAME)
        .collect()
}

/// Catalog id from a link: the fifth `/`-separated segment.
pub fn link_id(link: &str) -> Option<u64> {
    link.split('/').nth(4)?.parse().ok()
}

/// Catalog page without its trailing slug, ending in `/`.
pub fn info_url(url: &str) -> String {
    match url.rsplit_once('/') {
        Some((base, _)) => format!("{}/", base),
        None => url.to_string(),
    }
}

/// Ratcliff/Obershelp similarity: `2 * matches / (len(a) + len(b))`.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

// Earliest longest block, scanning `a` then `b`.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let k = prev[j] + 1;
                row[j + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = row;
    }
    best
}

/// Pick the entry for `query` among search results (in ranking order).
///
/// The first entry whose English, main or first synonym title reaches
/// [`MATCH_THRESHOLD`] wins. Otherwise the entry whose main title is the
/// most similar, the earlier one on ties.
pub fn best_match<'a>(query: &str, results: &'a [AnimeEntry]) -> Option<&'a AnimeEntry> {
    let query = query.to_lowercase();
    let score = |title: Option<&str>| {
        title
            .map(|t| similarity_ratio(&t.to_lowercase(), &query))
            .unwrap_or(0.0)
    };

    let accepted = results.iter().find(|entry| {
        [
            entry.title_english.as_deref(),
            Some(entry.title.as_str()),
            entry.synonyms.first().map(String::as_str),
        ]
        .into_iter()
        .any(|title| score(title) >= MATCH_THRESHOLD)
    });
    if accepted.is_some() {
        return accepted;
    }

    results.iter().enumerate().fold(None, |best, (idx, entry)| {
        let s = score(Some(&entry.title));
        match best {
            Some((_, best_score, _)) if best_score >= s => best,
            _ => Some((idx, s, entry)),
        }
    })
    .map(|(_, _, entry)| entry)
}

/// Title to add to the display name, if the search name lacks it.
///
/// Non-English categories prefer the English title. Otherwise the main
/// title is used; above 85 chars its first short synonym replaces it, or
/// it is truncated to 80 chars.
pub fn select_title(entry: &AnimeEntry, search_name: &str, non_english: bool) -> Option<String> {
    let haystack = search_name.to_lowercase();
    let absent = |title: &str| !haystack.contains(&title.to_lowercase());

    if non_english {
        if let Some(english) = entry.title_english.as_deref().filter(|t| !t.is_empty()) {
            if absent(english) {
                return Some(english.to_string());
            }
        }
    }

    let title = entry.title.as_str();
    if title.is_empty() || !absent(title) {
        return None;
    }
    if title.chars().count() <= MAX_TITLE {
        return Some(title.to_string());
    }

    match entry.synonyms.first() {
        Some(synonym) if synonym.chars().count() < MAX_TITLE && absent(synonym) => {
            Some(synonym.clone())
        }
        _ => Some(title.chars().take(TRUNCATED_TITLE).collect()),
    }
}
