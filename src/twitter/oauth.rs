//! OAuth 1.0a request signing (HMAC-SHA1, header form).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use itertools::Itertools;
use ring::hmac;
use urlencoding::encode;

use crate::settings::TwitterSettings;

pub struct Signer {
    consumer_key: String,
    access_key: String,
    key: hmac::Key,
}

impl Signer {
    pub fn new(creds: &TwitterSettings) -> Self {
        let signing_key = format!(
            "{}&{}",
            encode(&creds.consumer_secret),
            encode(&creds.access_secret)
        );
        Signer {
            consumer_key: creds.consumer_key.clone(),
            access_key: creds.access_key.clone(),
            key: hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, signing_key.as_bytes()),
        }
    }

    /// `Authorization` header value for `method url?query`.
    pub fn authorization(&self, method: &str, url: &str, query: &[(String, String)]) -> String {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_with(method, url, query, &nonce, &timestamp)
    }

    pub(crate) fn authorization_with(
        &self,
        method: &str,
        url: &str,
        query: &[(String, String)],
        nonce: &str,
        timestamp: &str,
    ) -> String {
        let oauth = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.access_key.as_str()),
            ("oauth_version", "1.0"),
        ];

        let params = oauth
            .iter()
            .map(|(k, v)| (encode(k), encode(v)))
            .chain(query.iter().map(|(k, v)| (encode(k), encode(v))))
            .sorted()
            .map(|(k, v)| format!("{}={}", k, v))
            .join("&");

        let base = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            encode(url),
            encode(&params)
        );
        let signature = STANDARD.encode(hmac::sign(&self.key, base.as_bytes()).as_ref());

        let fields = oauth
            .iter()
            .copied()
            .chain(std::iter::once(("oauth_signature", signature.as_str())))
            .sorted()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .join(", ");
        format!("OAuth {}", fields)
    }
}
