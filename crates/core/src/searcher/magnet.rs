//! Magnet URI and query helpers shared by the provider adapters.

/// Appended to every magnet so that freshly added torrents find peers even when
/// the listing carries no (or dead) trackers.
pub const FALLBACK_TRACKERS: &[&str] = &[
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://open.demonii.com:1337/announce",
    "udp://open.stealth.si:80/announce",
    "udp://tracker.torrent.eu.org:451/announce",
    "udp://exodus.desync.com:6969/announce",
    "udp://tracker.openbittorrent.com:6969/announce",
    "udp://explodie.org:6969/announce",
    "udp://tracker.dler.org:6969/announce",
];

/// Lowercase `raw` if it is a 40-char hex info hash.
pub fn normalize_info_hash(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.len() == 40 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(raw.to_ascii_lowercase())
    } else {
        None
    }
}

/// Lowercase hex of a 32-char base32 info hash.
fn base32_info_hash(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.len() != 32 {
        return None;
    }
    raw.to_ascii_uppercase()
        .parse::<librqbit_core::Id20>()
        .ok()
        .map(|id| id.as_string())
}

/// Extract the info hash from a `magnet:?xt=urn:btih:` URI as lowercase hex.
/// Both the hex and the base32 forms are accepted.
pub fn info_hash_from_magnet(magnet: &str) -> Option<String> {
    let lower = magnet.to_ascii_lowercase();
    let start = lower.find("xt=urn:btih:")? + "xt=urn:btih:".len();
    let rest = &magnet[start..];
    let end = rest.find('&').unwrap_or(rest.len());
    let raw = &rest[..end];
    normalize_info_hash(raw).or_else(|| base32_info_hash(raw))
}

/// Append the fallback trackers to an existing magnet URI.
pub fn with_fallback_trackers(magnet: &str) -> String {
    let mut uri = magnet.to_string();
    for tracker in FALLBACK_TRACKERS {
        uri.push_str("&tr=");
        uri.push_str(&urlencoding::encode(tracker));
    }
    uri
}

/// Build a magnet for `info_hash` named `name`, fallback trackers included.
pub fn build_magnet(info_hash: &str, name: &str) -> String {
    let base = format!(
        "magnet:?xt=urn:btih:{}&dn={}",
        info_hash,
        urlencoding::encode(name)
    );
    with_fallback_trackers(&base)
}

/// Drop a trailing 4-digit year token: `"Dune 2021"` becomes `"Dune"`.
pub fn strip_trailing_year(query: &str) -> String {
    let trimmed = query.trim();
    if let Some((head, last)) = trimmed.rsplit_once(char::is_whitespace) {
        let last = last.trim_matches(|c| c == '(' || c == ')');
        if last.len() == 4 && last.chars().all(|c| c.is_ascii_digit()) && !head.trim().is_empty()
        {
            return head.trim_end().to_string();
        }
    }
    trimmed.to_string()
}

/// `tt` followed by at least one digit.
pub fn is_valid_imdb_id(id: &str) -> bool {
    id.strip_prefix("tt")
        .map(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0123456789ABCDEF0123456789ABCDEF01234567";

    #[test]
    fn test_normalize_info_hash() {
        assert_eq!(
            normalize_info_hash(HASH).as_deref(),
            Some("0123456789abcdef0123456789abcdef01234567")
        );
        assert!(normalize_info_hash("abc123").is_none());
        assert!(normalize_info_hash("zz23456789abcdef0123456789abcdef01234567").is_none());
    }

    #[test]
    fn test_info_hash_from_magnet() {
        let magnet = format!("magnet:?xt=urn:btih:{}&dn=Some+Movie", HASH);
        assert_eq!(
            info_hash_from_magnet(&magnet).as_deref(),
            Some("0123456789abcdef0123456789abcdef01234567")
        );
        assert!(info_hash_from_magnet("magnet:?dn=nothing").is_none());
    }

    #[test]
    fn test_info_hash_from_base32_magnet() {
        let expected = Some("0123456789abcdef0123456789abcdef01234567");
        let upper = "magnet:?xt=urn:btih:AERUKZ4JVPG66AJDIVTYTK6N54ASGRLH&dn=x";
        assert_eq!(info_hash_from_magnet(upper).as_deref(), expected);
        let lower = "magnet:?xt=urn:btih:aeruKZ4jvpg66ajdivtytk6n54asgrlh";
        assert_eq!(info_hash_from_magnet(lower).as_deref(), expected);
        let invalid = "magnet:?xt=urn:btih:AERUKZ4JVPG66AJDIVTYTK6N54ASGRL1";
        assert!(info_hash_from_magnet(invalid).is_none());
    }

    #[test]
    fn test_build_magnet_appends_all_trackers_in_order() {
        let magnet = build_magnet("abc", "Dune (2021) 1080p");
        assert!(magnet.starts_with("magnet:?xt=urn:btih:abc&dn=Dune%20%282021%29%201080p"));
        let trackers: Vec<_> = magnet.split("&tr=").skip(1).collect();
        assert_eq!(trackers.len(), FALLBACK_TRACKERS.len());
        assert_eq!(
            trackers[0],
            urlencoding::encode(FALLBACK_TRACKERS[0]).as_ref()
        );
    }

    #[test]
    fn test_existing_trackers_are_kept() {
        let magnet = with_fallback_trackers("magnet:?xt=urn:btih:abc&tr=udp%3A%2F%2Fx");
        assert!(magnet.contains("&tr=udp%3A%2F%2Fx&tr="));
    }

    #[test]
    fn test_strip_trailing_year() {
        assert_eq!(strip_trailing_year("Dune 2021"), "Dune");
        assert_eq!(strip_trailing_year("Blade Runner 2049"), "Blade Runner");
        assert_eq!(strip_trailing_year("Movie (1999)"), "Movie");
        assert_eq!(strip_trailing_year("2012"), "2012");
        assert_eq!(strip_trailing_year("Alien 3"), "Alien 3");
        assert_eq!(strip_trailing_year("  Heat  "), "Heat");
    }

    #[test]
    fn test_is_valid_imdb_id() {
        assert!(is_valid_imdb_id("tt0111161"));
        assert!(!is_valid_imdb_id("tt"));
        assert!(!is_valid_imdb_id("0111161"));
        assert!(!is_valid_imdb_id("tt01x"));
    }
}
