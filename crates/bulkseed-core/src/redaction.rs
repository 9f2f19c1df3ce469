use serde::{Deserialize, Serialize};

const MASK: &str = "***";

/// Connection metadata safe to log or persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactedConnection {
    pub scheme: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub redacted: String,
}

/// Mask the password and sensitive query parameters of a connection URL.
pub fn redact_connection_string(conn: &str) -> RedactedConnection {
    let Some((scheme, rest)) = conn.split_once("://") else {
        return RedactedConnection {
            scheme: None,
            user: None,
            host: None,
            port: None,
            database: None,
            redacted: MASK.to_string(),
        };
    };

    // Userinfo ends at the last `@`; passwords may contain `@`, `/` or `?`.
    let (credentials, location) = match rest.rsplit_once('@') {
        Some((credentials, location)) => (Some(credentials), location),
        None => (None, rest),
    };
    let (location, query) = match location.split_once('?') {
        Some((location, query)) => (location, Some(query)),
        None => (location, None),
    };
    let (host_port, path) = location.split_once('/').unwrap_or((location, ""));

    let (user, masked_credentials) = match credentials {
        Some(credentials) => match credentials.split_once(':') {
            Some((user, _)) => (Some(user.to_string()), format!("{user}:{MASK}@")),
            None => (Some(credentials.to_string()), format!("{credentials}@")),
        },
        None => (None, String::new()),
    };

    let (host, port) = match host_port.rsplit_once(':') {
        Some((host, port)) => (host, port.parse::<u16>().ok()),
        None => (host_port, None),
    };

    let mut redacted = format!("{scheme}://{masked_credentials}{host_port}");
    if !path.is_empty() {
        redacted.push('/');
        redacted.push_str(path);
    }
    if let Some(query) = query {
        redacted.push('?');
        redacted.push_str(&redact_query(query));
    }

    RedactedConnection {
        scheme: Some(scheme.to_string()),
        user: user.filter(|value| !value.is_empty()),
        host: Some(host.to_string()).filter(|value| !value.is_empty()),
        port,
        database: Some(path.to_string()).filter(|value| !value.is_empty()),
        redacted,
    }
}

fn redact_query(query: &str) -> String {
    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if is_sensitive_key(key) => format!("{key}={MASK}"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn is_sensitive_key(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "password" | "pass" | "token" | "api_key" | "apikey" | "sslpassword"
    )
}
