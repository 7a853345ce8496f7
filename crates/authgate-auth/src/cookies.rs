//! Cookie lookup and `Set-Cookie` construction on top of the `cookie` crate.

use cookie::time::Duration;
use cookie::{Cookie, SameSite as CookieSameSite};

use authgate_core::config::{SameSite, SessionConfig};

/// Finds the value of cookie `name` in a `Cookie` request header.
/// Malformed pairs are skipped.
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
}

/// A cookie carrying the attributes from the session configuration.
///
/// `max_age` of `None` makes a browser-session cookie; a negative value
/// makes a removal cookie.
pub fn session_cookie(
    name: &str,
    value: String,
    max_age: Option<i64>,
    config: &SessionConfig,
) -> Cookie<'static> {
    let mut cookie = Cookie::build((name.to_string(), value))
        .path(config.path.clone())
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(same_site(config.same_site))
        .build();

    match max_age {
        Some(age) if age < 0 => cookie.make_removal(),
        Some(age) => cookie.set_max_age(Duration::seconds(age)),
        None => {}
    }
    cookie
}

/// A cookie that makes the client drop `name` immediately.
pub fn removal_cookie(name: &str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name.to_string(), ""))
        .path("/")
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}

fn same_site(policy: SameSite) -> CookieSameSite {
    match policy {
        SameSite::Strict => CookieSameSite::Strict,
        SameSite::Lax => CookieSameSite::Lax,
        SameSite::None => CookieSameSite::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_cookie() {
        let header = "theme=dark; session=abc.def; other=\"quoted\"";
        assert_eq!(find_cookie(header, "session").as_deref(), Some("abc.def"));
        assert_eq!(find_cookie(header, "other").as_deref(), Some("quoted"));
        assert_eq!(find_cookie(header, "missing"), None);
        assert_eq!(find_cookie("sessionx=1", "session"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = SessionConfig {
            secure: true,
            ..SessionConfig::default()
        };
        let rendered = session_cookie("session", "v".into(), Some(60), &config).to_string();

        assert!(rendered.starts_with("session=v"), "{rendered}");
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=60"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Lax"));
    }

    #[test]
    fn test_browser_session_cookie_has_no_max_age() {
        let rendered =
            session_cookie("session", "v".into(), None, &SessionConfig::default()).to_string();
        assert!(!rendered.contains("Max-Age"), "{rendered}");
    }

    #[test]
    fn test_removal() {
        let rendered = removal_cookie("portal_token").to_string();
        assert!(rendered.starts_with("portal_token=;"), "{rendered}");
        assert!(rendered.contains("Max-Age=0"));
        assert!(rendered.contains("Expires="));

        let negative =
            session_cookie("session", String::new(), Some(-1), &SessionConfig::default());
        assert!(negative.to_string().contains("Max-Age=0"));
    }
}
