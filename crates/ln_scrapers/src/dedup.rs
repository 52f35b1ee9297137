use std::collections::HashSet;

use ln_core::Article;

use crate::scrapers::utils::collapse_whitespace;

/// Case-folded, whitespace-collapsed form used for duplicate detection.
pub fn dedup_key(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Tracks the titles and links already accepted in a round.
#[derive(Debug, Default)]
pub struct SeenSet {
    titles: HashSet<String>,
    links: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, article: &Article) -> bool {
        self.titles.contains(&dedup_key(&article.title)) || self.links.contains(&dedup_key(&article.link))
    }

    /// Records `article` and returns `true` if neither its title nor its link was seen before.
    pub fn insert(&mut self, article: &Article) -> bool {
        if self.contains(article) {
            return false;
        }
        self.titles.insert(dedup_key(&article.title));
        self.links.insert(dedup_key(&article.link));
        true
    }
}

/// Merges per-source lists into one ranked list.
///
/// Earlier lists win on collision, so source order acts as priority. The
/// result is sorted newest first with a stable sort and cut to `max_results`.
pub fn merge(lists: Vec<Vec<Article>>, max_results: usize) -> Vec<Article> {
    let mut seen = SeenSet::new();
    let mut merged: Vec<Article> = lists
        .into_iter()
        .flatten()
        .filter(|article| seen.insert(article))
        .collect();

    merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    merged.truncate(max_results);
    merged
}
