//! Core identity and profile types shared across the protocol.

use serde::{Deserialize, Serialize};
use std::fmt;

// ----------------------------------------------------------------------------
// User Identifiers
// ----------------------------------------------------------------------------

/// Server-assigned user identifier.
///
/// The server hands one out on authorization. Id `0` is reserved as the
/// broadcast target ("everyone") and is never assigned to a real user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl UserId {
    /// The broadcast target: a message addressed to all connected peers.
    pub const BROADCAST: UserId = UserId(0);

    /// Whether this id denotes the broadcast target rather than a peer.
    pub fn is_broadcast(self) -> bool {
        self == Self::BROADCAST
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Gender Tag
// ----------------------------------------------------------------------------

/// Display-only gender tag carried on the wire as an integer.
///
/// Out-of-range wire values collapse to `Unknown` rather than failing decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "u8", into = "u8")]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
}

impl From<u8> for Gender {
    fn from(value: u8) -> Self {
        match value {
            1 => Gender::Male,
            2 => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

impl From<Gender> for u8 {
    fn from(value: Gender) -> Self {
        match value {
            Gender::Unknown => 0,
            Gender::Male => 1,
            Gender::Female => 2,
        }
    }
}

// ----------------------------------------------------------------------------
// Identity
// ----------------------------------------------------------------------------

/// A user as known to the session: self after authorization, or a roster peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "userName", default)]
    pub user_name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(rename = "userColor", default)]
    pub user_color: String,
}

// ----------------------------------------------------------------------------
// Connection Profile
// ----------------------------------------------------------------------------

/// Everything needed to open and authorize a connection.
///
/// Built from stored preferences or user input, frozen once a connect attempt
/// begins, and persisted only after the server confirms authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(rename = "userName", default = "default_user_name")]
    pub user_name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(rename = "userColor", default = "default_user_color")]
    pub user_color: String,
}

fn default_server() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    27800
}

fn default_user_name() -> String {
    "Incognito".to_string()
}

fn default_user_color() -> String {
    "#34495e".to_string()
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            user_name: default_user_name(),
            gender: Gender::Unknown,
            user_color: default_user_color(),
        }
    }
}

impl ConnectionProfile {
    /// Build the connection target URL.
    ///
    /// Authorization is implicit in the connection parameters: the server
    /// reads identity from the query string, so no login frame exists in the
    /// protocol. The color's `#` must arrive percent-escaped (`%23`).
    pub fn connection_url(&self) -> String {
        let base = format!("ws://{}:{}", self.server, self.port);
        match url::Url::parse(&base) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("userName", &self.user_name)
                    .append_pair("userColor", &self.user_color)
                    .append_pair("gender", &u8::from(self.gender).to_string());
                url.to_string()
            }
            // Host strings come from settings or user input; the transport
            // surfaces the connect failure for anything the parser rejects.
            Err(_) => format!(
                "{}?userName={}&userColor={}&gender={}",
                base,
                self.user_name,
                self.user_color.replace('#', "%23"),
                u8::from(self.gender)
            ),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_id_is_zero() {
        assert!(UserId(0).is_broadcast());
        assert!(!UserId(7).is_broadcast());
        assert_eq!(UserId::BROADCAST, UserId(0));
    }

    #[test]
    fn gender_round_trips_through_wire_integer() {
        assert_eq!(Gender::from(u8::from(Gender::Male)), Gender::Male);
        assert_eq!(Gender::from(u8::from(Gender::Female)), Gender::Female);
        assert_eq!(Gender::from(u8::from(Gender::Unknown)), Gender::Unknown);
    }

    #[test]
    fn unrecognized_gender_collapses_to_unknown() {
        assert_eq!(Gender::from(9), Gender::Unknown);
    }

    #[test]
    fn profile_defaults_match_persisted_key_defaults() {
        let profile = ConnectionProfile::default();
        assert_eq!(profile.server, "127.0.0.1");
        assert_eq!(profile.port, 27800);
        assert_eq!(profile.gender, Gender::Unknown);
        assert_eq!(profile.user_color, "#34495e");
    }

    #[test]
    fn connection_url_escapes_color_hash() {
        let profile = ConnectionProfile {
            server: "chat.example.org".to_string(),
            port: 27800,
            user_name: "Ann".to_string(),
            gender: Gender::Female,
            user_color: "#16a085".to_string(),
        };

        let url = profile.connection_url();
        assert_eq!(
            url,
            "ws://chat.example.org:27800/?userName=Ann&userColor=%2316a085&gender=2"
        );
        assert!(!url.contains('#'));
    }
}
