// Backend boundary: a trait the workflows depend on, plus the blocking
// HTTP implementation that talks to the URL-shortening service. The
// service authenticates with a session cookie and expects the CSRF
// token echoed back in an `X-CSRFToken` header on mutating calls.
// Transport failures are folded into the (ok, message) outcomes and
// surfaced once, never retried.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client, Response};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Url;
use serde_json::json;

use crate::domain::{Email, Label, LinkDraft, LinkRecord, LinkTarget, Password, Username};

#[cfg_attr(test, mockall::automock)]
pub trait Backend {
    fn login(&mut self, username: &Username, password: &Password) -> bool;
    /// Ends the server session and clears local session state.
    fn logout(&mut self);
    fn register(
        &mut self,
        username: &Username,
        password1: &Password,
        password2: &Password,
        email: &Email,
    ) -> bool;
    fn edit_password(
        &mut self,
        old: &Password,
        new1: &Password,
        new2: &Password,
    ) -> (bool, String);
    fn edit_username(&mut self, new_username: &Username) -> (bool, String);
    /// On success the message carries the generated short code.
    fn create_link(&mut self, draft: &LinkDraft) -> (bool, String);
    fn edit_target(&mut self, record: &LinkRecord, new_target: &LinkTarget) -> bool;
    fn edit_label(&mut self, new_label: &Label, record: &LinkRecord) -> (bool, String);
    fn edit_visibility(&mut self, record: &LinkRecord, private: bool) -> (bool, String);
    fn edit_expiry(
        &mut self,
        record: &LinkRecord,
        new_expiry: Option<NaiveDateTime>,
    ) -> (bool, String);
    fn delete_link(&mut self, record: &LinkRecord) -> (bool, String);
    fn list_links(&mut self) -> Result<Vec<LinkRecord>, String>;
}

/// Blocking HTTP client for the shortener API. Holds the cookie jar
/// separately from the client so the CSRF cookie can be read back.
pub struct HttpBackend {
    client: Client,
    jar: Arc<Jar>,
    base_url: String,
}

impl HttpBackend {
    /// Configured from `SHORTS_API_URL`, defaulting to a local server.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("SHORTS_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api/v1".into());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            jar,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn csrf_token(&self) -> Option<String> {
        let url = Url::parse(&self.base_url).ok()?;
        let header = self.jar.cookies(&url)?;
        let raw = header.to_str().ok()?;
        raw.split("; ")
            .find_map(|pair| pair.strip_prefix("csrftoken=").map(str::to_string))
    }

    fn csrf_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.csrf_token() {
            if let Ok(value) = HeaderValue::from_str(&token) {
                headers.insert("X-CSRFToken", value);
            }
        }
        headers
    }

    fn patch_link(
        &self,
        record: &LinkRecord,
        payload: serde_json::Value,
    ) -> reqwest::Result<Response> {
        self.client
            .patch(self.url(&format!("/shorts/{}/", record.code)))
            .headers(self.csrf_headers())
            .json(&payload)
            .send()
    }
}

/// Collapse a response into the (ok, message) shape the workflows
/// report to the user.
fn outcome(res: reqwest::Result<Response>, success: &str) -> (bool, String) {
    match res {
        Ok(r) if r.status().is_success() => (true, success.to_string()),
        Ok(r) => {
            let status = r.status();
            let txt = r.text().unwrap_or_else(|_| "".into());
            (false, format!("{} - {}", status, txt))
        }
        Err(e) => (false, e.to_string()),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message(message);
    pb
}

impl Backend for HttpBackend {
    fn login(&mut self, username: &Username, password: &Password) -> bool {
        let pb = spinner("Logging in...");
        let res = self
            .client
            .post(self.url("/auth/login/"))
            .form(&[
                ("username", username.as_str()),
                ("password", password.as_str()),
            ])
            .send();
        pb.finish_and_clear();
        matches!(res, Ok(r) if r.status().is_success())
    }

    fn logout(&mut self) {
        let headers = self.csrf_headers();
        let _ = self
            .client
            .post(self.url("/auth/logout/"))
            .headers(headers)
            .send();
        // Drop the local session cookies along with the server session.
        if let Ok(fresh) = Self::new(self.base_url.clone()) {
            *self = fresh;
        }
    }

    fn register(
        &mut self,
        username: &Username,
        password1: &Password,
        password2: &Password,
        email: &Email,
    ) -> bool {
        let pb = spinner("Registering...");
        let res = self
            .client
            .post(self.url("/auth/registration/"))
            .json(&json!({
                "username": username.as_str(),
                "password1": password1.as_str(),
                "password2": password2.as_str(),
                "email": email.as_str(),
            }))
            .send();
        pb.finish_and_clear();
        matches!(res, Ok(r) if r.status().is_success())
    }

    fn edit_password(
        &mut self,
        old: &Password,
        new1: &Password,
        new2: &Password,
    ) -> (bool, String) {
        if new1 != new2 {
            return (false, "New passwords do not match".to_string());
        }
        let res = self
            .client
            .post(self.url("/auth/password/change/"))
            .headers(self.csrf_headers())
            .json(&json!({
                "old_password": old.as_str(),
                "new_password1": new1.as_str(),
                "new_password2": new2.as_str(),
            }))
            .send();
        outcome(res, "Password changed successfully")
    }

    fn edit_username(&mut self, new_username: &Username) -> (bool, String) {
        let res = self
            .client
            .patch(self.url("/auth/user/"))
            .headers(self.csrf_headers())
            .json(&json!({ "username": new_username.as_str() }))
            .send();
        outcome(res, "Username changed successfully")
    }

    fn create_link(&mut self, draft: &LinkDraft) -> (bool, String) {
        let mut payload = json!({
            "target": draft.target.as_str(),
            "label": draft.label.as_str(),
            "private": draft.private,
        });
        if let Some(when) = draft.expired_at.get() {
            payload["expired_at"] = json!(when.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
        let pb = spinner("Creating short URL...");
        let res = self
            .client
            .post(self.url("/shorts/"))
            .headers(self.csrf_headers())
            .json(&payload)
            .send();
        pb.finish_and_clear();
        match res {
            Ok(r) if r.status().is_success() => match r.json::<LinkRecord>() {
                Ok(record) => (true, record.code),
                Err(e) => (false, format!("Unreadable response: {e}")),
            },
            Ok(r) => {
                let status = r.status();
                let txt = r.text().unwrap_or_else(|_| "".into());
                (false, format!("{} - {}", status, txt))
            }
            Err(e) => (false, e.to_string()),
        }
    }

    fn edit_target(&mut self, record: &LinkRecord, new_target: &LinkTarget) -> bool {
        let res = self.patch_link(record, json!({ "target": new_target.as_str() }));
        matches!(res, Ok(r) if r.status().is_success())
    }

    fn edit_label(&mut self, new_label: &Label, record: &LinkRecord) -> (bool, String) {
        let res = self.patch_link(record, json!({ "label": new_label.as_str() }));
        outcome(res, "Label changed successfully")
    }

    fn edit_visibility(&mut self, record: &LinkRecord, private: bool) -> (bool, String) {
        let res = self.patch_link(record, json!({ "private": private }));
        outcome(res, "Visibility changed successfully")
    }

    fn edit_expiry(
        &mut self,
        record: &LinkRecord,
        new_expiry: Option<NaiveDateTime>,
    ) -> (bool, String) {
        let expired_at = new_expiry.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string());
        let res = self.patch_link(record, json!({ "expired_at": expired_at }));
        outcome(res, "Expiry updated successfully")
    }

    fn delete_link(&mut self, record: &LinkRecord) -> (bool, String) {
        let res = self
            .client
            .delete(self.url(&format!("/shorts/{}/", record.code)))
            .headers(self.csrf_headers())
            .send();
        outcome(res, "URL deleted successfully.")
    }

    fn list_links(&mut self) -> Result<Vec<LinkRecord>, String> {
        let res = self
            .client
            .get(self.url("/shorts/"))
            .send()
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            return Err(format!("{} - {}", status, txt));
        }
        res.json::<Vec<LinkRecord>>().map_err(|e| e.to_string())
    }
}
