//! Strict parsers for the game's console reply formats.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use super::error::{RconError, RconResult};

fn players_header() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r"^Online players \((?P<num>\d+)\):$").unwrap())
}

/// Parse the reply of `/players online`.
///
/// The reply is a header declaring a count followed by exactly that many
/// indented names. Any disagreement between the declared and actual count,
/// or a header that does not match, is an error — a format drift upstream
/// is worth surfacing, not papering over.
pub(crate) fn online_players(input: &str) -> RconResult<Vec<String>> {
    let mut lines = input.lines();
    let header = lines.next().unwrap_or_default().trim_end();

    let captures = players_header()
        .captures(header)
        .ok_or_else(|| RconError::Protocol(format!("unrecognized player-list header {:?}", header)))?;

    let declared: usize = captures["num"]
        .parse()
        .map_err(|_| RconError::Protocol(format!("unparseable player count in {:?}", header)))?;

    let players: Vec<String> = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .collect();

    if players.len() != declared {
        return Err(RconError::Protocol(format!(
            "header declared {} players but {} were listed",
            declared,
            players.len()
        )));
    }

    Ok(players)
}

/// Parse the JSON object printed by the items-launched script.
///
/// An empty reply means no force has launched anything yet and parses to an
/// empty map.
pub(crate) fn items_launched(input: &str) -> RconResult<BTreeMap<String, u64>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(input)
        .map_err(|e| RconError::Protocol(format!("items-launched reply is not a JSON object: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_players() {
        assert_eq!(online_players("Online players (0):").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_one_player() {
        let input = "Online players (1):\n  foo";
        assert_eq!(online_players(input).unwrap(), vec!["foo"]);
    }

    #[test]
    fn test_two_players() {
        let input = "Online players (2):\n  foo\n  bar";
        assert_eq!(online_players(input).unwrap(), vec!["foo", "bar"]);
    }

    #[test]
    fn test_malformed_header_is_a_protocol_error() {
        assert!(matches!(
            online_players("unexpected"),
            Err(RconError::Protocol(_))
        ));
        assert!(matches!(
            online_players("Online players (x):"),
            Err(RconError::Protocol(_))
        ));
    }

    #[test]
    fn test_fewer_players_than_declared() {
        let input = "Online players (2):\n  foo";
        assert!(matches!(online_players(input), Err(RconError::Protocol(_))));
    }

    #[test]
    fn test_more_players_than_declared() {
        let input = "Online players (1):\n  foo\n  bar";
        assert!(matches!(online_players(input), Err(RconError::Protocol(_))));
    }

    #[test]
    fn test_items_launched_empty_reply() {
        assert!(items_launched("").unwrap().is_empty());
        assert!(items_launched("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_items_launched_single_entry() {
        let items = items_launched(r#"{"satellite":1}"#).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items["satellite"], 1);
    }

    #[test]
    fn test_items_launched_kebab_case_keys() {
        let items = items_launched(r#"{"satellite":1,"raw-fish":1}"#).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items["satellite"], 1);
        assert_eq!(items["raw-fish"], 1);
    }

    #[test]
    fn test_items_launched_non_object_is_a_protocol_error() {
        assert!(matches!(
            items_launched("nil"),
            Err(RconError::Protocol(_))
        ));
    }
}
