use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::{keys, Bucket, CacheStore};
use crate::models::{ItemType, Library, LibraryId, LibraryKind, MixedItem};

/// One searchable row produced by walking the cache (spec §4.5).
#[derive(Debug, Clone)]
pub struct FilterItem {
    pub item: MixedItem,
    pub title: String,
    pub media_type: ItemType,
    pub library_id: LibraryId,
}

#[derive(Debug, Clone)]
pub struct FilterResult {
    pub filter_item: FilterItem,
    pub matched_indices: Vec<usize>,
    pub score: u32,
}

/// A maximal run of letter/digit codepoints, lowercased, with its byte range
/// in the original string.
struct Token {
    text: String,
    start: usize,
    end: usize,
}

fn tokenize(s: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    for (idx, ch) in s.char_indices() {
        if ch.is_alphanumeric() {
            if current.is_empty() {
                start = idx;
            }
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(Token { text: std::mem::take(&mut current), start, end: idx });
        }
    }
    if !current.is_empty() {
        tokens.push(Token { text: current, start, end: s.len() });
    }
    tokens
}

fn typo_budget(len: usize) -> usize {
    match len {
        0..=3 => 0,
        4..=6 => 1,
        _ => 2,
    }
}

/// Classic Levenshtein edit distance, early-exiting once it provably
/// exceeds `budget` would be premature optimization here; the strings
/// involved are short title tokens.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Byte-range in the original title, translated into char indices.
fn char_range(title: &str, byte_start: usize, byte_end: usize) -> Vec<usize> {
    title
        .char_indices()
        .enumerate()
        .filter_map(|(char_idx, (byte_idx, _))| {
            if byte_idx >= byte_start && byte_idx < byte_end {
                Some(char_idx)
            } else {
                None
            }
        })
        .collect()
}

/// Attempts to match one query token against one title token, in the
/// priority order from spec §4.5 step 2. Returns (score, matched char
/// indices) on success.
fn match_against_token(query: &str, title_token: &Token, title: &str) -> Option<(u32, Vec<usize>)> {
    let indices = || char_range(title, title_token.start, title_token.end);

    if query == title_token.text {
        return Some((0, indices()));
    }
    if title_token.text.starts_with(query) {
        return Some((10, indices()));
    }
    if query.starts_with(&title_token.text) {
        return Some((20, indices()));
    }
    if let Some(pos) = title_token.text.find(query) {
        return Some((50 + pos as u32, indices()));
    }

    let budget = typo_budget(query.len());
    if budget > 0 {
        let distance = levenshtein(query, &title_token.text);
        if distance <= budget {
            return Some((100 + 20 * distance as u32, indices()));
        }
    }
    None
}

/// Scores `title` against `query`, returning the total score and the set of
/// matched character indices, or `None` if any query token goes unmatched.
pub fn fuzzy_match(title: &str, query: &str) -> Option<(u32, Vec<usize>)> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return None;
    }
    let title_tokens = tokenize(title);
    let mut used = vec![false; title_tokens.len()];

    let mut total_score = 0u32;
    let mut matched = HashSet::new();

    for q in &query_tokens {
        let mut best: Option<(usize, u32, Vec<usize>)> = None;
        for (idx, t) in title_tokens.iter().enumerate() {
            if used[idx] {
                continue;
            }
            if let Some((score, idxs)) = match_against_token(&q.text, t, title) {
                let better = match &best {
                    Some((_, best_score, _)) => score < *best_score,
                    None => true,
                };
                if better {
                    best = Some((idx, score, idxs));
                }
            }
        }

        if let Some((idx, score, idxs)) = best {
            used[idx] = true;
            total_score += score;
            matched.extend(idxs);
            continue;
        }

        // No token-level match anywhere: fall back to a whole-title substring
        // search (spec §4.5 step 2, last bullet).
        let lower_title = title.to_lowercase();
        if let Some(byte_pos) = lower_title.find(&q.text) {
            let score = 150 + byte_pos as u32;
            total_score += score;
            matched.extend(char_range(title, byte_pos, byte_pos + q.text.len()));
            continue;
        }

        return None;
    }

    let title_token_count = title_tokens.len();
    let query_token_count = query_tokens.len();
    if title_token_count > query_token_count {
        total_score += 5 * (title_token_count - query_token_count) as u32;
    }

    let mut indices: Vec<usize> = matched.into_iter().collect();
    indices.sort_unstable();
    Some((total_score, indices))
}

/// Filters and scores `items` against `query`, sorted per spec §4.5 step 7.
pub fn filter_items(items: Vec<FilterItem>, query: &str) -> Vec<FilterResult> {
    let mut results: Vec<FilterResult> = items
        .into_iter()
        .filter_map(|filter_item| {
            fuzzy_match(&filter_item.title, query).map(|(score, matched_indices)| FilterResult {
                filter_item,
                matched_indices,
                score,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        a.score
            .cmp(&b.score)
            .then_with(|| a.filter_item.title.len().cmp(&b.filter_item.title.len()))
    });
    results
}

/// Walks the cache's movies/shows/mixed-content buckets and fuzzy-filters
/// them against `query` (spec §4.5 closing paragraph). Never touches the
/// network.
pub struct SearchService {
    store: Arc<CacheStore>,
}

impl SearchService {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    async fn collect_candidates(&self, libraries: &[Library]) -> Vec<FilterItem> {
        let mut candidates = Vec::new();
        for library in libraries {
            match library.kind {
                LibraryKind::Movie => {
                    let key = keys::content_movies(&library.id);
                    if let Some(movies) = self.store.get::<Vec<crate::models::MediaItem>>(Bucket::Content, &key).await {
                        candidates.extend(movies.into_iter().map(|movie| FilterItem {
                            title: movie.title.clone(),
                            media_type: ItemType::Movie,
                            library_id: library.id.clone(),
                            item: MixedItem::Movie(movie),
                        }));
                    }
                }
                LibraryKind::Show => {
                    let key = keys::content_shows(&library.id);
                    if let Some(shows) = self.store.get::<Vec<crate::models::Show>>(Bucket::Content, &key).await {
                        candidates.extend(shows.into_iter().map(|show| FilterItem {
                            title: show.title.clone(),
                            media_type: ItemType::Show,
                            library_id: library.id.clone(),
                            item: MixedItem::Show(show),
                        }));
                    }
                }
                LibraryKind::Mixed => {
                    let key = keys::content_mixed(&library.id);
                    if let Some(items) = self.store.get::<Vec<MixedItem>>(Bucket::Content, &key).await {
                        candidates.extend(items.into_iter().map(|item| {
                            let title = item.title().to_string();
                            let media_type = match &item {
                                MixedItem::Movie(_) => ItemType::Movie,
                                MixedItem::Show(_) => ItemType::Show,
                            };
                            FilterItem { title, media_type, library_id: library.id.clone(), item }
                        }));
                    }
                }
                LibraryKind::Playlist => {}
            }
        }
        candidates
    }

    pub async fn search(&self, libraries: &[Library], query: &str) -> Vec<FilterResult> {
        let candidates = self.collect_candidates(libraries).await;
        filter_items(candidates, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_token_match_scores_zero() {
        let (score, _) = fuzzy_match("Arrival", "arrival").unwrap();
        assert_eq!(score, 0);
    }

    #[test]
    fn word_order_is_irrelevant() {
        assert!(fuzzy_match("Mr. Robot", "robot mr").is_some());
    }

    #[test]
    fn empty_query_matches_nothing() {
        assert!(fuzzy_match("Arrival", "").is_none());
    }

    #[test]
    fn unmatched_token_rejects_title() {
        assert!(fuzzy_match("Arrival", "xenomorph").is_none());
    }

    #[test]
    fn prefix_match_outscores_substring() {
        let (prefix_score, _) = fuzzy_match("Severance", "sev").unwrap();
        let (substring_score, _) = fuzzy_match("The Severance Files", "ver").unwrap();
        assert!(prefix_score < substring_score);
    }

    #[test]
    fn typo_within_budget_still_matches() {
        // "robto" is a 6-char token (budget 1), one transposition away from "robot".
        assert!(fuzzy_match("Mr. Robot", "robto").is_some());
    }

    #[test]
    fn extra_title_tokens_add_a_small_penalty() {
        let (short_score, _) = fuzzy_match("Robot", "robot").unwrap();
        let (long_score, _) = fuzzy_match("Mr. Robot Season One", "robot").unwrap();
        assert!(long_score > short_score);
    }

    #[test]
    fn sorting_prefers_lower_score_then_shorter_title() {
        let items = vec![
            FilterItem {
                item: MixedItem::Movie(crate::models::MediaItem {
                    id: crate::models::MediaItemId::new("1"),
                    title: "Arrival of a Train".into(),
                    sort_title: "arrival of a train".into(),
                    parent_library_id: LibraryId::new("l1"),
                    summary: String::new(),
                    release_year: None,
                    duration: std::time::Duration::ZERO,
                    view_offset: std::time::Duration::ZERO,
                    is_played: false,
                    media_type: crate::models::MediaType::Movie,
                    episode: None,
                    thumbnail_url: None,
                    art_url: None,
                    media_url: String::new(),
                    added_at: None,
                    updated_at: None,
                }),
                title: "Arrival of a Train".into(),
                media_type: ItemType::Movie,
                library_id: LibraryId::new("l1"),
            },
            FilterItem {
                item: MixedItem::Movie(crate::models::MediaItem {
                    id: crate::models::MediaItemId::new("2"),
                    title: "Arrival".into(),
                    sort_title: "arrival".into(),
                    parent_library_id: LibraryId::new("l1"),
                    summary: String::new(),
                    release_year: None,
                    duration: std::time::Duration::ZERO,
                    view_offset: std::time::Duration::ZERO,
                    is_played: false,
                    media_type: crate::models::MediaType::Movie,
                    episode: None,
                    thumbnail_url: None,
                    art_url: None,
                    media_url: String::new(),
                    added_at: None,
                    updated_at: None,
                }),
                title: "Arrival".into(),
                media_type: ItemType::Movie,
                library_id: LibraryId::new("l1"),
            },
        ];
        let results = filter_items(items, "arrival");
        assert_eq!(results[0].filter_item.title, "Arrival");
        assert_eq!(results[1].filter_item.title, "Arrival of a Train");
    }
}
