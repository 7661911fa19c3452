//! Roster name matching.
//!
//! Scraped starter names arrive in whatever form the depth-chart page used:
//! "Dan Vladar", a bare last name, or a near-miss spelling. Cross-referencing
//! against the official roster normalizes the name and gives us the player id
//! for the save-percentage lookup. Exact last-name matching comes first;
//! jaro-winkler catches transliteration drift (accents, doubled letters).

use strsim::jaro_winkler;

use crate::clients::nhl::RosterGoalie;

/// Fuzzy last-name similarity below this is not a match.
const FUZZY_THRESHOLD: f64 = 0.92;

#[derive(Debug, Clone, PartialEq)]
pub struct RosterMatch {
    pub player_id: i64,
    /// Normalized display form, e.g. "D. Vladar".
    pub display_name: String,
}

/// Match a scraped name ("Dan Vladar", "Vladar") against roster goalies.
/// Exact last name wins (with a first-name or initial check when both sides
/// have one); otherwise the best fuzzy last-name match above the threshold.
pub fn match_roster_goalie(goalies: &[RosterGoalie], scraped: &str) -> Option<RosterMatch> {
    let scraped = scraped.trim();
    if scraped.is_empty() {
        return None;
    }
    let (first, last) = split_name(scraped);

    for g in goalies {
        if !g.last_name.eq_ignore_ascii_case(last) {
            continue;
        }
        if first_matches(first, &g.first_name) {
            return Some(RosterMatch {
                player_id: g.id,
                display_name: display_name(g),
            });
        }
    }

    // Fuzzy fallback on last names only.
    let mut best: Option<(f64, &RosterGoalie)> = None;
    for g in goalies {
        let score = jaro_winkler(&last.to_lowercase(), &g.last_name.to_lowercase());
        if score >= FUZZY_THRESHOLD && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, g));
        }
    }
    best.map(|(_, g)| RosterMatch {
        player_id: g.id,
        display_name: display_name(g),
    })
}

/// ("Dan", "Vladar") for two-part names, ("", "Vladar") for bare last names.
fn split_name(name: &str) -> (&str, &str) {
    match name.split_once(' ') {
        Some((first, last)) => (first, last.trim()),
        None => ("", name),
    }
}

/// Empty scraped first name matches anything; otherwise full match or same
/// initial (pages abbreviate, rosters do not).
fn first_matches(scraped_first: &str, roster_first: &str) -> bool {
    if scraped_first.is_empty() {
        return true;
    }
    if scraped_first.eq_ignore_ascii_case(roster_first) {
        return true;
    }
    match (scraped_first.chars().next(), roster_first.chars().next()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(&b),
        _ => false,
    }
}

fn display_name(g: &RosterGoalie) -> String {
    match g.first_name.chars().next() {
        Some(initial) => format!("{}. {}", initial, g.last_name),
        None => g.last_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<RosterGoalie> {
        vec![
            RosterGoalie {
                id: 100,
                first_name: "Dan".into(),
                last_name: "Vladar".into(),
            },
            RosterGoalie {
                id: 101,
                first_name: "Samuel".into(),
                last_name: "Ersson".into(),
            },
        ]
    }

    #[test]
    fn test_exact_full_name() {
        let m = match_roster_goalie(&roster(), "Dan Vladar").unwrap();
        assert_eq!(m.player_id, 100);
        assert_eq!(m.display_name, "D. Vladar");
    }

    #[test]
    fn test_last_name_only() {
        let m = match_roster_goalie(&roster(), "Ersson").unwrap();
        assert_eq!(m.player_id, 101);
        assert_eq!(m.display_name, "S. Ersson");
    }

    #[test]
    fn test_first_initial() {
        let m = match_roster_goalie(&roster(), "S Ersson").unwrap();
        assert_eq!(m.player_id, 101);
    }

    #[test]
    fn test_wrong_first_name_rejected_then_fuzzy_still_finds_last() {
        // First name conflicts, but the fuzzy pass matches the last name
        // exactly, so the roster entry still wins.
        let m = match_roster_goalie(&roster(), "Bob Ersson").unwrap();
        assert_eq!(m.player_id, 101);
    }

    #[test]
    fn test_fuzzy_near_miss() {
        let m = match_roster_goalie(&roster(), "Dan Vladdar").unwrap();
        assert_eq!(m.player_id, 100);
    }

    #[test]
    fn test_no_match() {
        assert!(match_roster_goalie(&roster(), "Connor Hellebuyck").is_none());
        assert!(match_roster_goalie(&roster(), "").is_none());
        assert!(match_roster_goalie(&[], "Dan Vladar").is_none());
    }
}
