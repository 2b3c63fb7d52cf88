//! URL construction and credential redaction for log output

use url::form_urlencoded;

/// Query parameters whose values are secrets
const SECRET_PARAMS: [&str; 6] = [
    "key",
    "servicekey",
    "consumer_key",
    "consumer_secret",
    "accesstoken",
    "apikey",
];

/// Append url-encoded query parameters to a base URL
pub fn build_url(base: &str, params: &[(&str, &str)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish();
    if query.is_empty() {
        base.to_string()
    } else if base.contains('?') {
        format!("{}&{}", base, query)
    } else {
        format!("{}?{}", base, query)
    }
}

/// Mask credential-bearing query parameter values in a URL
///
/// Parameter names are compared case-insensitively. Everything else is kept
/// verbatim so the URL stays useful when diagnosing provider drift.
pub fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let redacted = query
        .split('&')
        .map(|pair| {
            let name = pair.split('=').next().unwrap_or_default();
            let decoded: String = form_urlencoded::parse(name.as_bytes())
                .map(|(k, _)| k.into_owned())
                .next()
                .unwrap_or_default();
            if SECRET_PARAMS.contains(&decoded.to_ascii_lowercase().as_str()) {
                format!("{}=***", name)
            } else {
                pair.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", base, redacted)
}
