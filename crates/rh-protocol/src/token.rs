//! Bracketed `[Key=value]` tokens
//!
//! Tokens are embedded anywhere inside a line. Only the first occurrence of a
//! key is considered, and its whole value up to the closing `]` must parse.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Key carrying a session counter (`[State=7]`)
pub const STATE_KEY: &str = "State";

/// Key carrying an allocated session port (`[Port=3001]`)
pub const PORT_KEY: &str = "Port";

/// Format a token as `[Key=value]`
pub fn format_token(key: &str, value: impl fmt::Display) -> String {
    format!("[{}={}]", key, value)
}

/// Token announcing a counter value
pub fn state_token(counter: u64) -> String {
    format_token(STATE_KEY, counter)
}

/// Token announcing a session port
pub fn port_token(port: u16) -> String {
    format_token(PORT_KEY, port)
}

/// Extract the value of `[key=...]` from `line`.
///
/// Returns `Ok(None)` when the key does not appear at all. A token without a
/// closing bracket is `Unterminated`; a value that does not parse as `T`
/// (empty, trailing junk, out of range) is `InvalidNumber`.
pub fn find_field<T: FromStr>(line: &str, key: &'static str) -> Result<Option<T>, ProtocolError> {
    let needle = format!("[{}=", key);
    let Some(start) = line.find(&needle) else {
        return Ok(None);
    };

    let rest = &line[start + needle.len()..];
    let end = rest.find(']').ok_or(ProtocolError::Unterminated(key))?;
    let value = &rest[..end];

    value
        .parse::<T>()
        .map(Some)
        .map_err(|_| ProtocolError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}

/// Parse an optional `[State=n]` token
pub fn parse_state(line: &str) -> Result<Option<u64>, ProtocolError> {
    find_field(line, STATE_KEY)
}

/// Parse an optional `[Port=n]` token
pub fn parse_port(line: &str) -> Result<Option<u16>, ProtocolError> {
    find_field(line, PORT_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_token_format() {
        assert_eq!(state_token(12), "[State=12]");
        assert_eq!(port_token(3001), "[Port=3001]");
    }

    #[test]
    fn test_parse_state_embedded() {
        let line = "Please host me. Send my port! [State=41]";
        assert_eq!(parse_state(line).unwrap(), Some(41));
    }

    #[test]
    fn test_parse_state_absent() {
        assert_eq!(parse_state("GET / HTTP/1.1").unwrap(), None);
    }

    #[test]
    fn test_parse_port_from_html_line() {
        let line = "[Port=3002]<br/>";
        assert_eq!(parse_port(line).unwrap(), Some(3002));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let line = "[Port=3005] then [Port=3006]";
        assert_eq!(parse_port(line).unwrap(), Some(3005));
    }

    #[test]
    fn test_unbracketed_key_is_ignored() {
        assert_eq!(parse_port("This is PORT 3001 and Port=9").unwrap(), None);
    }

    #[test]
    fn test_malformed_values() {
        let err = parse_state("[State=abc]").unwrap_err();
        match err {
            ProtocolError::InvalidNumber { key, value } => {
                assert_eq!(key, STATE_KEY);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(parse_state("[State=]").is_err());
        assert!(parse_port("[Port=70000]").is_err());
    }

    #[test]
    fn test_trailing_junk_is_rejected() {
        assert!(matches!(
            parse_state("[State=7x]"),
            Err(ProtocolError::InvalidNumber { value, .. }) if value == "7x"
        ));
        assert!(matches!(
            parse_port("Moved to [Port=30x1]<br/>"),
            Err(ProtocolError::InvalidNumber { value, .. }) if value == "30x1"
        ));
    }

    #[test]
    fn test_unterminated_token() {
        assert!(matches!(
            parse_port("[Port=3001"),
            Err(ProtocolError::Unterminated("Port"))
        ));
        assert!(matches!(
            parse_state("host me [State="),
            Err(ProtocolError::Unterminated("State"))
        ));
    }
}
