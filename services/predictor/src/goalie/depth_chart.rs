//! Depth-chart markup parsing.
//!
//! The starting-goalies page has no stable structure to parse against, so
//! this is a scraper: find the block of markup covering our matchup, then
//! pull out the two starter names (away first, home second) with regex
//! heuristics. Extraction tries three shapes in order:
//!
//! 1. embedded JSON keyed by NHL game id (`"lastName":"Dobes"`, home then
//!    away for that game),
//! 2. card names like `#79 Charlie Lindgren` with a CONFIRMED/PROJECTED
//!    status nearby,
//! 3. bare two-word capitalized names, filtered against team nicknames.
//!
//! Everything here is a pure function of (markup, matchup hints) so the
//! fragile part stays swappable and testable without HTTP; the output is
//! never authoritative and must be cross-checked against the roster.

use std::sync::OnceLock;

use regex::Regex;

use goalbot_core::models::{teams, Game};

/// How close two team fragments must be to count as one matchup block.
const MATCHUP_WINDOW: usize = 250;
/// Markup scanned for names after the matchup starts.
const BLOCK_LEN: usize = 3000;
/// JSON scanned after a game-id hit.
const GAME_ID_BLOCK_LEN: usize = 1500;
/// Status keyword must appear within this many bytes after a card name.
const STATUS_WINDOW: usize = 400;

#[derive(Debug, Clone)]
pub struct MatchupHints {
    pub game_id: i64,
    pub subject_is_home: bool,
    pub subject_fragments: Vec<&'static str>,
    pub opponent_fragments: Vec<&'static str>,
}

impl MatchupHints {
    /// None when the opponent abbrev is not a known team (nothing to search
    /// for).
    pub fn for_game(game: &Game, subject_team: &str) -> Option<Self> {
        let opponent = game.opponent(subject_team);
        let opponent_fragments = teams::matchup_fragments(opponent);
        if opponent_fragments.is_empty() {
            return None;
        }
        Some(Self {
            game_id: game.game_id,
            subject_is_home: game.is_home(subject_team),
            subject_fragments: teams::matchup_fragments(subject_team),
            opponent_fragments,
        })
    }
}

/// Opposing starter's name from raw markup, or None when the matchup or the
/// names cannot be found.
pub fn starter_from_markup(html: &str, hints: &MatchupHints) -> Option<String> {
    if hints.game_id != 0 {
        if let Some(name) = starter_by_game_id(html, hints.game_id, hints.subject_is_home) {
            return Some(name);
        }
    }

    let block_start = find_matchup_block(html, hints)?;
    let block = &html[block_start..floor_boundary(html, block_start + BLOCK_LEN)];

    let names = starter_names_from_block(block);
    if names.len() < 2 {
        return None;
    }
    // Page order is away goalie then home goalie; the opponent's starter is
    // whichever side the subject is not on.
    if hints.subject_is_home {
        Some(names[0].clone())
    } else {
        Some(names[1].clone())
    }
}

/// Embedded JSON path: locate the game id, then take the first two
/// `lastName` values after it (home goalie first, away goalie second).
fn starter_by_game_id(html: &str, game_id: i64, subject_is_home: bool) -> Option<String> {
    static LAST_NAME_RE: OnceLock<Regex> = OnceLock::new();
    let re = LAST_NAME_RE.get_or_init(|| {
        Regex::new(r#"\\?"lastName\\?"\s*:\s*\\?"([^"\\]+)\\?""#).expect("lastName regex")
    });

    let id_str = game_id.to_string();
    let idx = html.find(&id_str)?;
    let block = &html[idx..floor_boundary(html, idx + GAME_ID_BLOCK_LEN)];

    let mut names = re.captures_iter(block).map(|c| c[1].trim().to_string());
    let home_last = names.next()?;
    let away_last = names.next()?;
    if subject_is_home {
        Some(away_last)
    } else {
        Some(home_last)
    }
}

/// Byte offset where both a subject fragment and an opponent fragment occur
/// within the matchup window; None when the page has no such block.
fn find_matchup_block(html: &str, hints: &MatchupHints) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets aligned with the original markup.
    let lower = html.to_ascii_lowercase();
    for subject_frag in &hints.subject_fragments {
        let needle = subject_frag.to_ascii_lowercase();
        let mut from = 0;
        while let Some(rel) = lower[from..].find(&needle) {
            let idx = from + rel;
            let win_start = idx.saturating_sub(MATCHUP_WINDOW);
            let win_end = (idx + MATCHUP_WINDOW).min(lower.len());
            let window = &lower[win_start..win_end];
            for opp_frag in &hints.opponent_fragments {
                if let Some(opp_rel) = window.find(&opp_frag.to_ascii_lowercase()) {
                    return Some(win_start + opp_rel.min(idx - win_start));
                }
            }
            from = idx + needle.len();
        }
    }
    None
}

/// First two plausible goalie names in block order (away then home).
fn starter_names_from_block(block: &str) -> Vec<String> {
    static CARD_NAME_RE: OnceLock<Regex> = OnceLock::new();
    static TWO_WORD_RE: OnceLock<Regex> = OnceLock::new();
    let card_re = CARD_NAME_RE.get_or_init(|| {
        Regex::new(r"#\d+\s+([A-Z][a-z]+(?:\s+[A-Z][a-z\-]+)+)").expect("card name regex")
    });
    let two_word_re = TWO_WORD_RE.get_or_init(|| {
        Regex::new(r"\b([A-Z][a-z]+(?:-[A-Z][a-z]+)?\s+[A-Z][a-z]+(?:-[A-Z][a-z]+)?)\b")
            .expect("two-word name regex")
    });

    let mut names: Vec<String> = Vec::new();

    // Card names with a goalie status keyword nearby.
    for caps in card_re.captures_iter(block) {
        let Some(m) = caps.get(1) else { continue };
        let name = m.as_str().trim();
        if !plausible_name(name) || names.iter().any(|n| n == name) {
            continue;
        }
        let after = block[m.end()..floor_boundary(block, m.end() + STATUS_WINDOW)]
            .to_ascii_lowercase();
        if !after.contains("confirmed") && !after.contains("projected") {
            continue;
        }
        names.push(name.to_string());
        if names.len() >= 2 {
            return names;
        }
    }

    // Fallback: bare two-word names without the card prefix.
    for caps in two_word_re.captures_iter(block) {
        let name = caps[1].trim().to_string();
        if !plausible_name(&name) || names.contains(&name) {
            continue;
        }
        names.push(name);
        if names.len() >= 2 {
            break;
        }
    }
    names
}

/// Largest char boundary at or below `at`, so windows never split a
/// multibyte character.
fn floor_boundary(s: &str, at: usize) -> usize {
    let mut at = at.min(s.len());
    while !s.is_char_boundary(at) {
        at -= 1;
    }
    at
}

/// Long enough to be a real name, and not a team link.
fn plausible_name(name: &str) -> bool {
    if name.len() < 4 {
        return false;
    }
    match name.rsplit(' ').next() {
        Some(last_word) => !teams::is_nickname_word(last_word),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn hints(subject_is_home: bool, game_id: i64) -> MatchupHints {
        let game = Game {
            game_id,
            home_abbrev: if subject_is_home { "WSH" } else { "PHI" }.into(),
            away_abbrev: if subject_is_home { "PHI" } else { "WSH" }.into(),
            start_time_utc: Utc::now(),
            game_state: "FUT".into(),
            game_date: "2026-02-23".into(),
            venue: String::new(),
        };
        MatchupHints::for_game(&game, "WSH").unwrap()
    }

    #[test]
    fn test_parse_embedded_json_by_game_id() {
        // Escaped JSON, home goalie listed first.
        let html = r#"prefix {\"id\":\"2025020940\",\"homeGoalie\":{\"lastName\":\"Lindgren\"},\"awayGoalie\":{\"lastName\":\"Vladar\"}} suffix"#;
        // Subject (WSH) home: opponent is away -> Vladar.
        assert_eq!(
            starter_from_markup(html, &hints(true, 2025020940)),
            Some("Vladar".to_string())
        );
        // Subject away: opponent is home -> Lindgren.
        assert_eq!(
            starter_from_markup(html, &hints(false, 2025020940)),
            Some("Lindgren".to_string())
        );
    }

    #[test]
    fn test_parse_card_names_with_status() {
        let html = format!(
            "{}Philadelphia Flyers at Washington Capitals{}#33 Samuel Ersson{}CONFIRMED{}#79 Charlie Lindgren{}PROJECTED{}",
            "x".repeat(50),
            " ".repeat(20),
            " ".repeat(30),
            " ".repeat(40),
            " ".repeat(30),
            " ".repeat(10),
        );
        // No game id hit (id 0 disables the JSON path); subject home, away
        // goalie (Ersson) is the opponent's starter.
        let got = starter_from_markup(&html, &hints(true, 0));
        assert_eq!(got, Some("Samuel Ersson".to_string()));
        let got = starter_from_markup(&html, &hints(false, 0));
        assert_eq!(got, Some("Charlie Lindgren".to_string()));
    }

    #[test]
    fn test_parse_requires_status_keyword_for_cards() {
        // Card names without CONFIRMED/PROJECTED anywhere nearby fall back to
        // the two-word pattern, which still finds them in order.
        let html = "Philadelphia at Washington #33 Samuel Ersson ... #79 Charlie Lindgren";
        let got = starter_from_markup(html, &hints(true, 0));
        assert_eq!(got, Some("Samuel Ersson".to_string()));
    }

    #[test]
    fn test_parse_filters_team_names() {
        // "Washington Capitals" and "Philadelphia Flyers" match the two-word
        // shape but end in nicknames; they must not count as goalies.
        let html = "Philadelphia Flyers at Washington Capitals Samuel Ersson Charlie Lindgren";
        let got = starter_from_markup(html, &hints(true, 0));
        assert_eq!(got, Some("Samuel Ersson".to_string()));
    }

    #[test]
    fn test_parse_no_matchup_returns_none() {
        let html = "Boston Bruins at Toronto Maple Leafs Joseph Woll CONFIRMED Jeremy Swayman CONFIRMED";
        assert_eq!(starter_from_markup(html, &hints(true, 0)), None);
    }

    #[test]
    fn test_parse_fragments_too_far_apart() {
        // Both teams on the page but in different game blocks.
        let html = format!(
            "Washington Capitals vs Boston{}Philadelphia at Pittsburgh Samuel Ersson Dan Vladar",
            "x".repeat(2000)
        );
        assert_eq!(starter_from_markup(&html, &hints(true, 0)), None);
    }

    #[test]
    fn test_parse_single_name_insufficient() {
        let html = "Philadelphia at Washington Samuel Ersson";
        assert_eq!(starter_from_markup(html, &hints(true, 0)), None);
    }

    #[test]
    fn test_matchup_uses_alternate_fragments() {
        // Page says "WAS" and "Canadiens" instead of city names.
        let game = Game {
            game_id: 0,
            home_abbrev: "MTL".into(),
            away_abbrev: "WSH".into(),
            start_time_utc: Utc::now(),
            game_state: "FUT".into(),
            game_date: String::new(),
            venue: String::new(),
        };
        let h = MatchupHints::for_game(&game, "WSH").unwrap();
        let html = "WAS at Canadiens Jakub Dobes CONFIRMED Logan Thompson CONFIRMED";
        // Subject away: home goalie is the opponent's starter, but without
        // card markers the two-word order still applies (away, home).
        let got = starter_from_markup(html, &h);
        assert_eq!(got, Some("Logan Thompson".to_string()));
    }
}
