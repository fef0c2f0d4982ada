//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! composes an `HttpRequest` and hands it to a [`Transport`] together with the
//! client's [`Session`]; the transport performs the round-trip and reports an
//! `HttpResponse`. Connection handling and TLS are the transport's business;
//! cookie scoping and expiry live in the session.
//!
//! All fields use owned types (`String`, `Vec`) so a request can move into a
//! blocking task or across threads without lifetime concerns.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cookie_store::CookieStore;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Methods whose unclaimed parameters travel in the JSON body.
    pub fn is_mutating(self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// For GET requests the query pairs are already encoded into `url`; `query`
/// is kept alongside for transports and cache keys that want the pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Executes composed requests.
///
/// Implementations should report any status code as an `HttpResponse` and
/// reserve `Err` for failures that produced no response at all. A transport
/// that understands cookies reads and updates `session` so that state set by
/// one call is visible to the next.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
        session: Session,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn execute(
        &self,
        request: HttpRequest,
        session: Session,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).execute(request, session)
    }
}

/// Credential context shared by every resource of one client.
///
/// A cookie jar that honours `Max-Age`, `Expires`, `Domain` and `Path`:
/// expired cookies are dropped on arrival and a cookie is only offered back
/// to the hosts and paths it is scoped to. Cloning yields another handle to
/// the same jar.
#[derive(Clone, Default)]
pub struct Session {
    jar: Arc<Mutex<CookieStore>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the first unexpired cookie called `name`, for any host.
    pub fn get(&self, name: &str) -> Option<String> {
        self.lock()
            .iter_unexpired()
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.lock().iter_unexpired().next().is_none()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Value for the `Cookie` header of a request to `url`, or `None` when no
    /// held cookie applies to it.
    pub fn cookie_header(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let jar = self.lock();
        let mut pairs: Vec<String> = jar
            .get_request_values(&url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        if pairs.is_empty() {
            return None;
        }
        pairs.sort();
        Some(pairs.join("; "))
    }

    /// Record one `Set-Cookie` header received from `url`. An already
    /// expired cookie removes the stored one with the same name and scope.
    pub fn absorb_set_cookie(&self, url: &str, header: &str) {
        let Ok(url) = Url::parse(url) else {
            debug!(%url, "ignoring Set-Cookie for unparseable url");
            return;
        };
        if let Err(err) = self.lock().parse(header, &url) {
            debug!(%url, error = ?err, "Set-Cookie not stored");
        }
    }

    /// Whether two handles refer to the same jar.
    pub fn same_as(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.jar, &other.jar)
    }

    fn lock(&self) -> MutexGuard<'_, CookieStore> {
        self.jar.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .lock()
            .iter_unexpired()
            .map(|cookie| cookie.name().to_string())
            .collect();
        f.debug_struct("Session").field("cookies", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_round_trips_through_wire_name() {
        let m: HttpMethod = serde_json::from_str(r#""PATCH""#).unwrap();
        assert_eq!(m, HttpMethod::Patch);
        assert_eq!(m.to_string(), "PATCH");
        assert!(!HttpMethod::Get.is_mutating());
        assert!(HttpMethod::Delete.is_mutating());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let resp = HttpResponse {
            status: 200,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: String::new(),
        };
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(resp.header("set-cookie"), None);
    }

    const ACL: &str = "http://api.test/acl/auth";
    const CORE: &str = "http://api.test/core/user/u1";

    #[test]
    fn session_absorbs_set_cookie_and_renders_header() {
        let session = Session::new();
        assert_eq!(session.cookie_header(CORE), None);

        session.absorb_set_cookie(ACL, "sid=abc; Path=/; HttpOnly");
        session.absorb_set_cookie(ACL, "lang=en; Path=/");
        assert_eq!(session.get("sid").as_deref(), Some("abc"));
        assert_eq!(session.cookie_header(CORE).as_deref(), Some("lang=en; sid=abc"));
    }

    #[test]
    fn max_age_zero_removes_the_cookie() {
        let session = Session::new();
        session.absorb_set_cookie(ACL, "sid=abc; Path=/");
        session.absorb_set_cookie(ACL, "sid=deleted; Path=/; Max-Age=0");
        assert_eq!(session.get("sid"), None);
        assert_eq!(session.cookie_header(CORE), None);
        assert!(session.is_empty());
    }

    #[test]
    fn expires_in_the_past_is_not_stored() {
        let session = Session::new();
        session.absorb_set_cookie(ACL, "sid=abc; Path=/");
        session.absorb_set_cookie(ACL, "tok=1; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
        assert_eq!(session.get("tok"), None);
        assert_eq!(session.cookie_header(CORE).as_deref(), Some("sid=abc"));

        session.absorb_set_cookie(ACL, "sid=abc; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
        assert_eq!(session.get("sid"), None);
    }

    #[test]
    fn cookies_stay_on_their_host() {
        let session = Session::new();
        session.absorb_set_cookie(ACL, "sid=abc; Path=/");
        assert_eq!(session.cookie_header("http://elsewhere.test/core").as_deref(), None);
        assert_eq!(session.cookie_header("http://sub.api.test/core"), None);
    }

    #[test]
    fn domain_attribute_widens_to_subdomains() {
        let session = Session::new();
        session.absorb_set_cookie("http://www.api.test/login", "lang=en; Domain=api.test; Path=/");
        assert_eq!(session.cookie_header("http://api.test/").as_deref(), Some("lang=en"));
        assert_eq!(session.cookie_header("http://x.api.test/").as_deref(), Some("lang=en"));
        assert_eq!(session.cookie_header("http://api.other/"), None);

        // A host may not set cookies for an unrelated domain.
        session.absorb_set_cookie(ACL, "sid=abc; Domain=other.test; Path=/");
        assert_eq!(session.get("sid"), None);
    }

    #[test]
    fn path_attribute_limits_where_the_cookie_is_sent() {
        let session = Session::new();
        session.absorb_set_cookie(ACL, "scope=acl; Path=/acl");
        assert_eq!(session.cookie_header("http://api.test/acl/logout").as_deref(), Some("scope=acl"));
        assert_eq!(session.cookie_header(CORE), None);
    }

    #[test]
    fn session_ignores_malformed_set_cookie() {
        let session = Session::new();
        session.absorb_set_cookie(ACL, "garbage");
        session.absorb_set_cookie(ACL, "=value");
        session.absorb_set_cookie("not a url", "sid=abc");
        assert!(session.is_empty());
    }

    #[test]
    fn session_clones_share_state() {
        let a = Session::new();
        let b = a.clone();
        a.absorb_set_cookie(ACL, "sid=1; Path=/");
        assert_eq!(b.get("sid").as_deref(), Some("1"));
        assert!(a.same_as(&b));
        assert!(!a.same_as(&Session::new()));

        b.clear();
        assert!(a.is_empty());
    }
}
