use chrono::{DateTime, Utc};
use ln_core::{Article, Language};

use crate::dedup::{merge, SeenSet};

const SEEDS: &[(&str, &str, &str)] = &[
    ("Economic News", "코스피, 외국인 매수세에 상승 마감", "https://example.com/news1"),
    ("Business Today", "반도체 업계, 하반기 회복 전망", "https://example.com/news2"),
    ("Market Watch", "달러 강세 지속, 원화 약세 우려", "https://example.com/news3"),
    ("Tech News", "AI 기술 발전으로 IT 기업 주가 상승", "https://example.com/news4"),
    ("Global Economy", "미 연준 기준금리 동결 결정", "https://example.com/news5"),
    ("Economic News", "수출 증가세 3개월 연속 이어져", "https://example.com/news6"),
    ("Market Watch", "국제 유가 하락에 물가 부담 완화 기대", "https://example.com/news7"),
    ("Business Today", "가계부채 증가 속도 둔화, 금융당국 모니터링 강화", "https://example.com/news8"),
];

/// Fixed articles served when live collection comes up short. No I/O; every
/// item carries `now` so it ranks alongside fresh live items.
pub fn seed_articles(now: DateTime<Utc>) -> Vec<Article> {
    SEEDS
        .iter()
        .map(|(source, title, link)| Article {
            source: source.to_string(),
            title: title.to_string(),
            link: link.to_string(),
            published_at: now,
            description: None,
            category: Some("economy".to_string()),
            language: Language::Ko,
        })
        .collect()
}

/// Tops up a short live list with seed articles.
///
/// An empty live list is replaced by the seeds wholesale. Otherwise seeds
/// that don't collide with live items are appended until `min_viable` is
/// reached and the combined list is ranked again.
pub fn blend(live: Vec<Article>, seeds: Vec<Article>, min_viable: usize, max_results: usize) -> Vec<Article> {
    if live.is_empty() {
        return seeds;
    }
    if live.len() >= min_viable {
        return live;
    }

    let mut seen = SeenSet::new();
    for article in &live {
        seen.insert(article);
    }
    let needed = min_viable - live.len();
    let extra: Vec<Article> = seeds
        .into_iter()
        .filter(|seed| seen.insert(seed))
        .take(needed)
        .collect();

    merge(vec![live, extra], max_results)
}
