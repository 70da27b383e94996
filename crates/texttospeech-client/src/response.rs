use http::{HeaderMap, StatusCode};

/// Header the service uses to report ignored or deprecated parameters
pub const WARNINGS_HEADER: &str = "warnings";

/// Result of a successful call together with its response metadata
#[derive(Debug, Clone)]
pub struct DetailedResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub result: T,
}

impl<T> DetailedResponse<T> {
    /// Value of the `Warnings` header, if the service sent one
    ///
    /// A successful call may still have ignored some of its query parameters;
    /// the service says so here.
    pub fn warnings(&self) -> Option<&str> {
        self.headers.get(WARNINGS_HEADER).and_then(|v| v.to_str().ok())
    }

    /// Drop the metadata
    pub fn into_result(self) -> T {
        self.result
    }

    /// Transform the result, keeping the metadata
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DetailedResponse<U> {
        DetailedResponse {
            status: self.status,
            headers: self.headers,
            result: f(self.result),
        }
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn warnings_header_is_exposed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Warnings",
            HeaderValue::from_static("Unknown arguments: foo. Ignored."),
        );

        let response = DetailedResponse {
            status: StatusCode::OK,
            headers,
            result: (),
        };

        assert_eq!(response.warnings(), Some("Unknown arguments: foo. Ignored."));
    }

    #[test]
    fn map_keeps_metadata() {
        let response = DetailedResponse {
            status: StatusCode::CREATED,
            headers: HeaderMap::new(),
            result: 21,
        }
        .map(|n| n * 2);

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.result, 42);
        assert!(response.warnings().is_none());
    }
}
