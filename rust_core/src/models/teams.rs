//! NHL team-name tables.
//!
//! The depth-chart page and the odds API identify teams by city or nickname
//! rather than abbrev, so matchup searches and scraped-name filtering all go
//! through these lookups.

/// City fragment that appears in matchup text for each team abbrev
/// (e.g. "Philadelphia at Washington").
pub fn city_fragment(abbrev: &str) -> Option<&'static str> {
    let frag = match abbrev {
        "ANA" => "Anaheim",
        "BOS" => "Boston",
        "BUF" => "Buffalo",
        "CGY" => "Calgary",
        "CAR" => "Carolina",
        "CHI" => "Chicago",
        "COL" => "Colorado",
        "CBJ" => "Columbus",
        "DAL" => "Dallas",
        "DET" => "Detroit",
        "EDM" => "Edmonton",
        "FLA" => "Florida",
        "LAK" => "Los Angeles",
        "MIN" => "Minnesota",
        "MTL" => "Montreal",
        "NJD" => "New Jersey",
        "NSH" => "Nashville",
        "NYI" => "New York Islanders",
        "NYR" => "New York Rangers",
        "OTT" => "Ottawa",
        "PHI" => "Philadelphia",
        "PIT" => "Pittsburgh",
        "SJS" => "San Jose",
        "SEA" => "Seattle",
        "STL" => "St. Louis",
        "TBL" => "Tampa Bay",
        "TOR" => "Toronto",
        "UTA" => "Utah",
        "VAN" => "Vancouver",
        "VGK" => "Vegas",
        "WPG" => "Winnipeg",
        "WSH" => "Washington",
        _ => return None,
    };
    Some(frag)
}

/// Team nickname for each abbrev (e.g. "Capitals"). Used to filter team
/// names out of scraped goalie-name candidates and to widen matchup searches.
pub fn nickname(abbrev: &str) -> Option<&'static str> {
    let nick = match abbrev {
        "ANA" => "Ducks",
        "BOS" => "Bruins",
        "BUF" => "Sabres",
        "CGY" => "Flames",
        "CAR" => "Hurricanes",
        "CHI" => "Blackhawks",
        "COL" => "Avalanche",
        "CBJ" => "Blue Jackets",
        "DAL" => "Stars",
        "DET" => "Red Wings",
        "EDM" => "Oilers",
        "FLA" => "Panthers",
        "LAK" => "Kings",
        "MIN" => "Wild",
        "MTL" => "Canadiens",
        "NJD" => "Devils",
        "NSH" => "Predators",
        "NYI" => "Islanders",
        "NYR" => "Rangers",
        "OTT" => "Senators",
        "PHI" => "Flyers",
        "PIT" => "Penguins",
        "SJS" => "Sharks",
        "SEA" => "Kraken",
        "STL" => "Blues",
        "TBL" => "Lightning",
        "TOR" => "Maple Leafs",
        "UTA" => "Mammoth",
        "VAN" => "Canucks",
        "VGK" => "Golden Knights",
        "WPG" => "Jets",
        "WSH" => "Capitals",
        _ => return None,
    };
    Some(nick)
}

/// All fragments that may identify a team in third-party markup: city,
/// nickname, and the abbrev itself (some pages use "WAS" for Washington).
pub fn matchup_fragments(abbrev: &str) -> Vec<&'static str> {
    let mut frags = Vec::with_capacity(4);
    if let Some(city) = city_fragment(abbrev) {
        frags.push(city);
    }
    if let Some(nick) = nickname(abbrev) {
        frags.push(nick);
    }
    match abbrev {
        "WSH" => frags.push("WAS"),
        "MTL" => frags.push("MTL"),
        "NJD" => frags.push("NJD"),
        "SJS" => frags.push("SJS"),
        "TBL" => frags.push("TBL"),
        "LAK" => frags.push("LAK"),
        "STL" => frags.push("STL"),
        _ => {}
    }
    frags
}

/// True when `word` is the trailing word of some team nickname. Scraped name
/// candidates ending in one of these are team links, not goalies.
pub fn is_nickname_word(word: &str) -> bool {
    const NICKNAME_WORDS: &[&str] = &[
        "Ducks", "Bruins", "Sabres", "Flames", "Hurricanes", "Blackhawks", "Avalanche",
        "Jackets", "Stars", "Wings", "Oilers", "Panthers", "Kings", "Wild", "Canadiens",
        "Devils", "Predators", "Islanders", "Rangers", "Senators", "Flyers", "Penguins",
        "Sharks", "Kraken", "Blues", "Lightning", "Leafs", "Mammoth", "Canucks", "Knights",
        "Jets", "Capitals",
    ];
    NICKNAME_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word))
}
