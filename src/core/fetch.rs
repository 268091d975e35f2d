//! Document fetch abstraction

use crate::core::error::AcquireError;
use async_trait::async_trait;

/// Raw response of one fetch.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub status: u16,
    pub body: String,
}

impl FetchedDocument {
    /// Returns the body of a successful response. Any other status is a
    /// transient failure, same as a network error.
    pub fn into_success(self, locator: &str) -> Result<String, AcquireError> {
        if (200..300).contains(&self.status) {
            Ok(self.body)
        } else {
            Err(AcquireError::TransientFetch {
                locator: locator.to_string(),
                reason: format!("HTTP status {}", self.status),
            })
        }
    }
}

#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<FetchedDocument, AcquireError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_success_status_is_transient() {
        let doc = FetchedDocument {
            status: 503,
            body: "busy".to_string(),
        };
        let err = doc.into_success("http://example.com").unwrap_err();
        assert!(matches!(err, AcquireError::TransientFetch { .. }));
        assert_eq!(
            err.to_string(),
            "Transient fetch failure for http://example.com: HTTP status 503"
        );

        let ok = FetchedDocument {
            status: 200,
            body: "<table></table>".to_string(),
        };
        assert_eq!(ok.into_success("http://example.com").unwrap(), "<table></table>");
    }
}
