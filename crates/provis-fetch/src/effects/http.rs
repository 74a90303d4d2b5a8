use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Status line, declared length and body of a GET response.
pub struct HttpResponse<E> {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects and attach their identifying
/// `User-Agent` themselves. A non-2xx status is returned as a normal
/// response; the [`Fetcher`](crate::Fetcher) turns it into
/// [`Error::Status`](crate::Error::Status) so that status failures and
/// transport failures stay distinct.
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<HttpResponse<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use futures_util::StreamExt;

    /// Production HTTP client implementation using reqwest.
    #[derive(Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Build a client that identifies itself with `user_agent` on every request.
        pub fn new(user_agent: impl AsRef<str>) -> std::result::Result<Self, reqwest::Error> {
            let client = reqwest::Client::builder()
                .user_agent(user_agent.as_ref())
                .build()?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<HttpResponse<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);
            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();
            let content_length = response.content_length();
            let body = response.bytes_stream().boxed();

            Ok(HttpResponse {
                status,
                content_length,
                body,
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
