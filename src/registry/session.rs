//! Vendor control-plane capability
//!
//! Every registry vendor exposes the same three capabilities to an adapter:
//! establish a session (yielding a client), list repositories one page at a
//! time, and issue a short-lived authorization token for manifest requests.

use crate::error::RegistryError;
use async_trait::async_trait;
use futures::stream::{self, Stream};
use std::fmt;

/// One page of repository names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryPage {
    /// Repository names in registry order
    pub repositories: Vec<String>,
    /// Cursor for the next page; `None` on the last page
    pub next: Option<String>,
}

impl RepositoryPage {
    /// Create a page; `next` is the cursor of the following page
    pub fn new(repositories: Vec<String>, next: Option<String>) -> Self {
        Self { repositories, next }
    }

    /// Create the final page
    pub fn last(repositories: Vec<String>) -> Self {
        Self::new(repositories, None)
    }

    /// Whether this is the final page
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// Short-lived credential plus the endpoint it is valid for
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationData {
    /// Opaque token sent as `Authorization: Basic {token}`; `None` for anonymous access
    pub token: Option<String>,
    /// Registry endpoint manifests are fetched from
    pub endpoint: String,
}

impl AuthorizationData {
    pub fn new(token: Option<String>, endpoint: impl Into<String>) -> Self {
        Self {
            token,
            endpoint: endpoint.into(),
        }
    }
}

impl fmt::Debug for AuthorizationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationData")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Creates the vendor client; the only place credentials are discovered
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Client produced by a successful session
    type Client: ControlPlane + 'static;

    /// Adapter name for this vendor
    fn registry_name(&self) -> &'static str;

    /// Establish a session and build the control-plane client
    async fn connect(&self) -> Result<Self::Client, RegistryError>;
}

/// Vendor control-plane API used by the adapter
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Fetch one page of repositories; `cursor` is the previous page's `next`
    async fn list_repositories(&self, cursor: Option<&str>)
        -> Result<RepositoryPage, RegistryError>;

    /// Obtain a fresh authorization token and endpoint
    async fn authorization_token(&self) -> Result<AuthorizationData, RegistryError>;
}

/// Lazily walk every repository page of a control plane
///
/// Pages are requested only as the stream is polled. The stream ends after
/// the last page, or right after yielding the first error. A page whose
/// `next` cursor repeats the cursor it was requested with ends the walk with
/// a `Listing` error.
pub fn repository_pages<'a, C>(
    registry: &'static str,
    client: &'a C,
) -> impl Stream<Item = Result<RepositoryPage, RegistryError>> + Send + 'a
where
    C: ControlPlane + ?Sized,
{
    // outer None: walk finished; Some(None): first page
    stream::try_unfold(Some(None::<String>), move |cursor| async move {
        let Some(cursor) = cursor else {
            return Ok::<_, RegistryError>(None);
        };
        let page = client.list_repositories(cursor.as_deref()).await?;
        if cursor.is_some() && page.next == cursor {
            return Err(RegistryError::listing(
                registry,
                format!(
                    "pagination cursor '{}' repeated",
                    cursor.unwrap_or_default()
                ),
            ));
        }
        let next = page.next.clone().map(Some);
        Ok(Some((page, next)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::Mutex;

    /// Control plane serving canned pages keyed by cursor
    struct PagedPlane {
        pages: Vec<Result<RepositoryPage, String>>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl PagedPlane {
        fn new(pages: Vec<Result<RepositoryPage, String>>) -> Self {
            Self {
                pages,
                cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ControlPlane for PagedPlane {
        async fn list_repositories(
            &self,
            cursor: Option<&str>,
        ) -> Result<RepositoryPage, RegistryError> {
            self.cursors
                .lock()
                .unwrap()
                .push(cursor.map(str::to_string));
            let index = cursor.map(|c| c.parse::<usize>().unwrap()).unwrap_or(0);
            self.pages[index]
                .clone()
                .map_err(|message| RegistryError::listing("test", message))
        }

        async fn authorization_token(&self) -> Result<AuthorizationData, RegistryError> {
            Ok(AuthorizationData::new(None, "http://unused"))
        }
    }

    fn page(names: &[&str], next: Option<&str>) -> Result<RepositoryPage, String> {
        Ok(RepositoryPage::new(
            names.iter().map(|n| n.to_string()).collect(),
            next.map(str::to_string),
        ))
    }

    #[test]
    fn test_repository_page_last() {
        assert!(RepositoryPage::last(vec![]).is_last());
        assert!(!RepositoryPage::new(vec![], Some("2".into())).is_last());
    }

    #[test]
    fn test_authorization_debug_redacts_token() {
        let auth = AuthorizationData::new(Some("c2VjcmV0".into()), "https://r.example.com");
        let debug = format!("{:?}", auth);
        assert!(!debug.contains("c2VjcmV0"));
        assert!(debug.contains("r.example.com"));
    }

    #[tokio::test]
    async fn test_pages_walk_until_last() {
        let plane = PagedPlane::new(vec![
            page(&["a", "b"], Some("1")),
            page(&["c"], None),
        ]);

        let pages: Vec<_> = repository_pages("test", &plane).collect().await;
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].as_ref().unwrap().repositories, vec!["a", "b"]);
        assert_eq!(pages[1].as_ref().unwrap().repositories, vec!["c"]);
        assert_eq!(
            *plane.cursors.lock().unwrap(),
            vec![None, Some("1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_pages_end_after_error() {
        let plane = PagedPlane::new(vec![
            page(&["a"], Some("1")),
            Err("throttled".to_string()),
            page(&["c"], None),
        ]);

        let pages: Vec<_> = repository_pages("test", &plane).collect().await;
        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_ok());
        assert!(pages[1].is_err());
        // the third page is never requested
        assert_eq!(plane.cursors.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_pages_stop_on_repeated_cursor() {
        let plane = PagedPlane::new(vec![
            page(&["a"], Some("1")),
            page(&["b"], Some("1")),
        ]);

        let pages: Vec<_> = repository_pages("test", &plane).collect().await;
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].as_ref().unwrap().repositories, vec!["a"]);
        let err = pages[1].as_ref().unwrap_err();
        assert_eq!(err.kind(), "listing");
        assert!(err.to_string().contains("cursor '1' repeated"));
        assert_eq!(
            *plane.cursors.lock().unwrap(),
            vec![None, Some("1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_pages_are_lazy() {
        let plane = PagedPlane::new(vec![page(&["a"], Some("1")), page(&["b"], None)]);

        let mut pages = Box::pin(repository_pages("test", &plane));
        assert!(plane.cursors.lock().unwrap().is_empty());
        let first = pages.next().await.unwrap().unwrap();
        assert_eq!(first.repositories, vec!["a"]);
        assert_eq!(plane.cursors.lock().unwrap().len(), 1);
    }
}
