//! Classification of the server's output lines.
//!
//! The binary has no structured output; everything operational is scraped
//! from free text and therefore fragile across game versions. Keeping the
//! patterns behind one `line -> Option<event>` function lets them evolve
//! without touching supervisor control flow, and makes them testable
//! against captured output.

use std::sync::OnceLock;

use regex::Regex;

use crate::version::FactorioVersion;

/// An operational event recognized in an output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// The save was produced by a newer game version than the binary.
    IncompatibleMapVersion {
        game_version: FactorioVersion,
        map_version: FactorioVersion,
    },
    /// The game finished loading and accepts players.
    GameReady,
    /// A player joined.
    PlayerJoined(String),
    /// A player left.
    PlayerLeft(String),
}

/// Marker the game prints when it transitions into the playable state.
const READY_MARKER: &str = "changing state from(CreatingGame) to(InGame)";

fn incompatible_map_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"Map version (?P<map>\d+\.\d+\.\d+)-\d+ cannot be loaded because it is higher than the game version \((?P<game>\d+\.\d+\.\d+)-\d+\)",
        )
        .unwrap()
    })
}

fn join_leave_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} \[(?P<kind>JOIN|LEAVE)\] (?P<user>\w+) (?:joined|left) the game$",
        )
        .unwrap()
    })
}

/// Classify one stdout line.
pub fn classify_line(line: &str) -> Option<OutputEvent> {
    if let Some(captures) = incompatible_map_pattern().captures(line) {
        let map_version = captures["map"].parse().ok()?;
        let game_version = captures["game"].parse().ok()?;
        return Some(OutputEvent::IncompatibleMapVersion {
            game_version,
            map_version,
        });
    }

    if line.contains(READY_MARKER) {
        return Some(OutputEvent::GameReady);
    }

    if let Some(captures) = join_leave_pattern().captures(line) {
        let user = captures["user"].to_string();
        return Some(match &captures["kind"] {
            "JOIN" => OutputEvent::PlayerJoined(user),
            _ => OutputEvent::PlayerLeft(user),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_map_version_line() {
        let line = "   0.334 Error Main.cpp:1276: Map version 1.1.110-0 cannot be loaded because it is higher than the game version (1.1.100-0)";
        assert_eq!(
            classify_line(line),
            Some(OutputEvent::IncompatibleMapVersion {
                game_version: FactorioVersion::new(1, 1, 100),
                map_version: FactorioVersion::new(1, 1, 110),
            })
        );
    }

    #[test]
    fn test_ready_marker_line() {
        let line = "  12.345 Info AppManagerStates.cpp:1849: changing state from(CreatingGame) to(InGame)";
        assert_eq!(classify_line(line), Some(OutputEvent::GameReady));
    }

    #[test]
    fn test_join_and_leave_lines() {
        assert_eq!(
            classify_line("2024-03-01 18:03:22 [JOIN] engineer joined the game"),
            Some(OutputEvent::PlayerJoined("engineer".to_string()))
        );
        assert_eq!(
            classify_line("2024-03-01 19:44:01 [LEAVE] engineer left the game"),
            Some(OutputEvent::PlayerLeft("engineer".to_string()))
        );
    }

    #[test]
    fn test_ordinary_lines_are_not_events() {
        for line in [
            "  11.903 Info UDPSocket.cpp:27: Opening socket at ({0.0.0.0:34197})",
            "Factorio initialised",
            "2024-03-01 18:03:22 [CHAT] engineer: hello",
            "",
        ] {
            assert_eq!(classify_line(line), None);
        }
    }
}
