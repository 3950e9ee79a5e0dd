use crate::error::SessionError;

pub const DEFAULT_LOGIN_URL: &str = "https://play.pokemonshowdown.com/api/login";

/// Exchange credentials and a challstr for a login assertion
pub(crate) async fn get_assertion(
    login_url: &str,
    username: &str,
    password: &str,
    challstr: &str,
) -> Result<String, SessionError> {
    let client = reqwest::Client::new();

    let params = [
        ("name", username),
        ("pass", password),
        ("challstr", challstr),
    ];

    let response = client
        .post(login_url)
        .form(&params)
        .send()
        .await
        .map_err(|e| SessionError::Auth(format!("login request failed: {}", e)))?;

    let text = response
        .text()
        .await
        .map_err(|e| SessionError::Auth(format!("unreadable login response: {}", e)))?;

    parse_login_response(&text)
}

/// Extract the assertion from a login server response
///
/// The body is JSON prefixed with "]". An assertion starting with ";;" is an
/// error message from the login server.
pub(crate) fn parse_login_response(body: &str) -> Result<String, SessionError> {
    let json_str = body.trim().trim_start_matches(']');
    let json: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| SessionError::Auth(format!("invalid login response: {}", e)))?;

    let assertion = json
        .get("assertion")
        .and_then(|v| v.as_str())
        .ok_or_else(|| SessionError::Auth("login response missing assertion".to_string()))?;

    if let Some(error_msg) = assertion.strip_prefix(";;") {
        return Err(SessionError::Auth(error_msg.to_string()));
    }

    if json.get("actionsuccess").and_then(|v| v.as_bool()) == Some(false) {
        return Err(SessionError::Auth("login server rejected the request".to_string()));
    }

    Ok(assertion.to_string())
}
