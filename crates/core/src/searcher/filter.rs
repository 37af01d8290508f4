//! Parental-control filter and quality scoring.

use super::{ProviderKind, TorrentCandidate};

/// Case-insensitive substrings that mark a release name as adult content.
pub const NSFW_KEYWORDS: &[&str] = &[
    "xxx",
    "porn",
    "hentai",
    "brazzers",
    "bangbros",
    "onlyfans",
    "realitykings",
    "naughtyamerica",
    "playboy",
    "erotica",
];

/// Category labels that mark a PirateBay listing as adult content.
pub const NSFW_CATEGORIES: &[&str] = &["adult", "porn", "xxx"];

pub const CAM_PENALTY: f64 = 500.0;
pub const SAMPLE_PENALTY: f64 = 100.0;
pub const CODEC_BONUS: f64 = 10.0;

const CAM_TOKENS: &[&str] = &[
    "cam", "camrip", "hdcam", "telesync", "hdts", "tsrip", "ts", "tc", "hdtc", "telecine",
];
const CODEC_TOKENS: &[&str] = &["hevc", "x265", "h265"];

/// Whether the candidate must be hidden from the user.
pub fn is_nsfw(candidate: &TorrentCandidate) -> bool {
    let name = candidate.name.to_lowercase();
    if NSFW_KEYWORDS.iter().any(|k| name.contains(k)) {
        return true;
    }

    candidate.provider == ProviderKind::PirateBay
        && candidate
            .category
            .as_deref()
            .map(|c| NSFW_CATEGORIES.contains(&c.to_lowercase().as_str()))
            .unwrap_or(false)
}

/// Lowercase alphanumeric words of a release name.
fn tokens(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn resolution_bonus(tokens: &[String]) -> f64 {
    let has = |wanted: &[&str]| tokens.iter().any(|t| wanted.contains(&t.as_str()));
    if has(&["2160p", "4k", "uhd"]) {
        30.0
    } else if has(&["1080p"]) {
        20.0
    } else if has(&["720p"]) {
        10.0
    } else {
        0.0
    }
}

/// Rank value of a candidate. Higher is better.
pub fn score(candidate: &TorrentCandidate) -> f64 {
    let tokens = tokens(&candidate.name);
    let has_any = |wanted: &[&str]| tokens.iter().any(|t| wanted.contains(&t.as_str()));

    let mut score = candidate.seeders as f64 + 0.1 * candidate.leechers as f64;
    score += candidate.provider.trust_bonus();
    score += resolution_bonus(&tokens);

    if has_any(CODEC_TOKENS) {
        score += CODEC_BONUS;
    }
    if has_any(CAM_TOKENS) {
        score -= CAM_PENALTY;
    }
    if has_any(&["sample"]) {
        score -= SAMPLE_PENALTY;
    }

    score
}
