use http::header::AUTHORIZATION;
use http::HeaderMap;

/// Session tokens are 32 random bytes (256 bits).
const TOKEN_BYTES: usize = 32;

/// Generate a new session token: 64 lowercase hex characters.
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
///
/// Returns `None` if the header is missing, not valid UTF-8, uses another
/// scheme, or carries an empty or whitespace-containing token.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token.to_string())
}
