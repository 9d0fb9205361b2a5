use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::settings::{HttpSettings, TwilioSettings};

pub const DONE_MESSAGE: &str =
    "Hey big guy,\n\nYour app is all finished running. Congrats on a job well done! (Probably)";

pub trait CompletionNotifier {
    fn notify(&self, to: &str, body: &str) -> Result<()>;
}

/// Send once; log and swallow any failure.
pub fn notify_best_effort(notifier: &dyn CompletionNotifier, to: &str, body: &str) -> bool {
    match notifier.notify(to, body) {
        Ok(()) => true,
        Err(e) => {
            warn!("Completion notice to {} failed: {}", to, e);
            false
        }
    }
}

/// Logs the message instead of sending it.
pub struct LogNotifier;

impl CompletionNotifier for LogNotifier {
    fn notify(&self, to: &str, body: &str) -> Result<()> {
        info!(to, "No notification channel configured. Message:\n{}", body);
        Ok(())
    }
}

/// SMS via the Twilio Messages API.
pub struct TwilioNotifier {
    client: reqwest::blocking::Client,
    account_sid: String,
    auth_token: String,
    from: String,
    api_base: String,
}

impl TwilioNotifier {
    pub fn new(
        account_sid: String,
        auth_token: String,
        from: String,
        api_base: String,
        http: &HttpSettings,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()?;
        Ok(TwilioNotifier {
            client,
            account_sid,
            auth_token,
            from,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.api_base, self.account_sid)
    }
}

impl CompletionNotifier for TwilioNotifier {
    fn notify(&self, to: &str, body: &str) -> Result<()> {
        let url = self.messages_url();
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from.as_str()), ("Body", body)])
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            warn!("Twilio error ({}): {}", status, detail);
            return Err(Error::Status {
                url,
                status: status.as_u16(),
            });
        }
        info!(to, "Completion notice sent");
        Ok(())
    }
}

/// Twilio when sid, token and sender are all set; otherwise the log fallback.
/// Returns the notifier and the destination to send to.
pub fn from_settings(
    twilio: &TwilioSettings,
    http: &HttpSettings,
) -> Result<(Box<dyn CompletionNotifier>, String)> {
    let to = twilio.to.clone().unwrap_or_default();
    match (&twilio.account_sid, &twilio.auth_token, &twilio.from) {
        (Some(sid), Some(token), Some(from)) if !to.is_empty() => {
            let n = TwilioNotifier::new(
                sid.clone(),
                token.clone(),
                from.clone(),
                twilio.api_base.clone(),
                http,
            )?;
            Ok((Box::new(n), to))
        }
        _ => Ok((Box::new(LogNotifier), to)),
    }
}
