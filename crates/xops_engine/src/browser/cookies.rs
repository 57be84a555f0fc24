use std::collections::BTreeMap;
use std::path::Path;

use xops_logging::xops_warn;

use super::Cookie;

const SESSION_DOMAINS: &[&str] = &[".x.com", ".twitter.com"];
const HTTP_ONLY_NAMES: &[&str] = &["auth_token", "_twitter_sess"];

/// Explicit cookie values that replace the ones in the raw cookie string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOverrides {
    pub auth_token: Option<String>,
    pub ct0: Option<String>,
    pub twid: Option<String>,
    pub att: Option<String>,
    pub lang: Option<String>,
}

impl CookieOverrides {
    /// Reads `X_AUTH_TOKEN`, `X_CSRF_TOKEN`, `X_TWID`, `X_ATT` and `X_LANG`.
    pub fn from_env() -> Self {
        let var = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            auth_token: var("X_AUTH_TOKEN"),
            ct0: var("X_CSRF_TOKEN"),
            twid: var("X_TWID"),
            att: var("X_ATT"),
            lang: var("X_LANG"),
        }
    }

    fn entries(&self) -> [(&'static str, Option<&String>); 5] {
        [
            ("auth_token", self.auth_token.as_ref()),
            ("ct0", self.ct0.as_ref()),
            ("twid", self.twid.as_ref()),
            ("att", self.att.as_ref()),
            ("lang", self.lang.as_ref()),
        ]
    }
}

/// `name=value; name2=value2` into a map; malformed parts are skipped.
pub fn parse_cookie_string(raw: &str) -> BTreeMap<String, String> {
    raw.split(';')
        .filter_map(|part| {
            let (name, value) = part.trim().split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// The explicit string wins, then the file. An unreadable file counts as no
/// cookies.
pub fn resolve_cookie_string(explicit: Option<&str>, file: Option<&Path>) -> String {
    if let Some(raw) = explicit.map(str::trim).filter(|raw| !raw.is_empty()) {
        return raw.to_string();
    }
    let Some(path) = file else {
        return String::new();
    };
    match std::fs::read_to_string(path) {
        Ok(text) => text.trim().to_string(),
        Err(err) => {
            xops_warn!("Cookie file {:?} unreadable: {}", path, err);
            String::new()
        }
    }
}

/// Session cookies for both platform domains, or `None` unless both
/// `auth_token` and `ct0` are known.
pub fn build_session_cookies(raw: &str, overrides: &CookieOverrides) -> Option<Vec<Cookie>> {
    let mut map = parse_cookie_string(raw);
    for (name, value) in overrides.entries() {
        if let Some(value) = value {
            map.insert(name.to_string(), value.clone());
        }
    }

    let present = |name: &str| map.get(name).is_some_and(|v| !v.trim().is_empty());
    if !present("auth_token") || !present("ct0") {
        return None;
    }

    let cookies = SESSION_DOMAINS
        .iter()
        .flat_map(|domain| {
            map.iter()
                .filter(|(_, value)| !value.is_empty())
                .map(move |(name, value)| Cookie {
                    name: name.clone(),
                    value: value.clone(),
                    domain: domain.to_string(),
                    path: "/".to_string(),
                    http_only: HTTP_ONLY_NAMES.contains(&name.as_str()),
                    secure: true,
                })
        })
        .collect();
    Some(cookies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_string_parsing_skips_malformed_parts() {
        let map = parse_cookie_string(" a=1; broken; =x; b = two=2 ;");
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], "1");
        assert_eq!(map["b"], "two=2");
    }

    #[test]
    fn cookies_require_auth_token_and_csrf() {
        assert!(build_session_cookies("auth_token=a", &CookieOverrides::default()).is_none());

        let overrides = CookieOverrides {
            ct0: Some("csrf".into()),
            ..CookieOverrides::default()
        };
        let cookies = build_session_cookies("auth_token=a; lang=en", &overrides).unwrap();
        assert_eq!(cookies.len(), 6);
        let auth = cookies
            .iter()
            .find(|c| c.name == "auth_token" && c.domain == ".twitter.com")
            .unwrap();
        assert!(auth.http_only && auth.secure);
        assert!(cookies.iter().any(|c| c.name == "ct0" && c.value == "csrf"));
    }

    #[test]
    fn explicit_cookie_string_wins_over_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), " from=file \n").unwrap();
        assert_eq!(resolve_cookie_string(Some("  "), Some(temp.path())), "from=file");
        assert_eq!(resolve_cookie_string(Some("a=b"), Some(temp.path())), "a=b");
        assert_eq!(resolve_cookie_string(None, Some(Path::new("/nonexistent/c"))), "");
    }
}
