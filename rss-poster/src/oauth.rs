use crate::credentials::Credentials;
use crate::types::Result;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::Url;
use uuid::Uuid;

type HmacSha1 = Hmac<Sha1>;

/// OAuth 1.0a (HMAC-SHA1) signer for user-context requests.
#[derive(Clone)]
pub struct OAuth1Signer {
    consumer_key: String,
    consumer_secret: String,
    token: String,
    token_secret: String,
}

impl std::fmt::Debug for OAuth1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Signer")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

impl OAuth1Signer {
    pub fn new(consumer_key: &str, consumer_secret: &str, token: &str, token_secret: &str) -> Self {
        Self {
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
            token: token.to_string(),
            token_secret: token_secret.to_string(),
        }
    }

    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::new(
            &credentials.oauth_consumer_key,
            &credentials.oauth_consumer_secret,
            &credentials.oauth_access_token,
            &credentials.oauth_access_token_secret,
        )
    }

    /// `Authorization` header value for a request whose body carries no
    /// form parameters (JSON bodies are not signed).
    pub fn authorization_header(&self, method: &str, url: &str) -> Result<String> {
        let nonce = Uuid::new_v4().simple().to_string();
        let timestamp = Utc::now().timestamp().to_string();
        self.authorization_header_with(method, url, &[], &nonce, &timestamp)
    }

    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        form_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let signature = self.signature(method, url, form_params, nonce, timestamp)?;

        let mut header_params = self.oauth_params(nonce, timestamp);
        header_params.push(("oauth_signature".to_string(), signature));
        header_params.sort();

        let fields = header_params
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {}", fields))
    }

    /// Base64 HMAC-SHA1 over the signature base string.
    pub fn signature(
        &self,
        method: &str,
        url: &str,
        form_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let parsed = Url::parse(url)?;

        let mut params: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (encode(&k), encode(&v)))
            .collect();
        params.extend(form_params.iter().map(|(k, v)| (encode(k), encode(v))));
        params.extend(
            self.oauth_params(nonce, timestamp)
                .into_iter()
                .map(|(k, v)| (encode(&k), encode(&v))),
        );
        params.sort();

        let param_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            encode(&base_url(&parsed)),
            encode(&param_string)
        );

        let signing_key = format!("{}&{}", encode(&self.consumer_secret), encode(&self.token_secret));
        let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
            .map_err(|e| crate::types::PosterError::General(format!("Invalid signing key: {}", e)))?;
        mac.update(base_string.as_bytes());

        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn oauth_params(&self, nonce: &str, timestamp: &str) -> Vec<(String, String)> {
        vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), self.token.clone()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ]
    }
}

/// RFC 3986 percent-encoding: everything but unreserved characters.
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Scheme, host, non-default port and path; no query or fragment.
fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}
