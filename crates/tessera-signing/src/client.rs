//! Signing wrapper over a reqwest client

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, DATE};
use reqwest::{Client, Request, RequestBuilder, Response, Url};

use crate::credentials::Credentials;
use crate::error::{SigningError, SigningResult};
use crate::signer::RequestSigner;

const DIGEST: HeaderName = HeaderName::from_static("digest");

/// Format an instant as an RFC 7231 IMF-fixdate string, the form the Date
/// header is signed and transmitted in.
pub fn imf_fixdate(when: DateTime<Utc>) -> String {
    when.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// The request target covered by the signature: path plus query.
fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// An HTTP client that authenticates every outgoing request.
///
/// Requests are signed and forwarded; responses come back unmodified. This
/// layer never interprets status codes, never retries, and propagates
/// transport errors unchanged. Timeouts and cancellation are whatever the
/// wrapped [`Client`] was configured with.
pub struct SigningClient {
    http: Client,
    signer: RequestSigner,
}

impl SigningClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_client(Client::new(), credentials)
    }

    /// Wrap a pre-configured client (timeouts, proxies, pools).
    pub fn with_client(http: Client, credentials: Credentials) -> Self {
        Self {
            http,
            signer: RequestSigner::new(credentials),
        }
    }

    /// The wrapped client, for building requests.
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn key_id(&self) -> &str {
        self.signer.key_id()
    }

    /// Build, sign and dispatch a request.
    pub async fn send(&self, builder: RequestBuilder) -> SigningResult<Response> {
        self.execute(builder.build()?).await
    }

    /// Sign and dispatch an already-built request.
    ///
    /// A missing Date header is set to the current instant; the transmitted
    /// value is exactly the signed value. The body must be buffered in
    /// memory, since the signer has to hash it before dispatch.
    pub async fn execute(&self, mut request: Request) -> SigningResult<Response> {
        let body = match request.body() {
            None => None,
            Some(body) => Some(
                body.as_bytes()
                    .ok_or(SigningError::StreamingBody)?
                    .to_vec(),
            ),
        };
        let date = match request.headers().get(DATE) {
            Some(value) => value
                .to_str()
                .map_err(|_| SigningError::InvalidDateHeader)?
                .to_string(),
            None => imf_fixdate(Utc::now()),
        };
        let target = request_target(request.url());
        let signed = self
            .signer
            .sign(request.method().as_str(), &target, &date, body.as_deref());

        let headers = request.headers_mut();
        headers.insert(DATE, HeaderValue::from_str(&signed.date)?);
        if let Some(digest) = &signed.digest {
            headers.insert(DIGEST, HeaderValue::from_str(digest)?);
        }
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&signed.authorization)?);

        tracing::debug!(method = %request.method(), target, "dispatching signed request");
        Ok(self.http.execute(request).await?)
    }
}
