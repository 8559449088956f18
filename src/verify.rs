use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

const LAST_TWEETS_URL: &str = "https://api.twitterapi.io/twitter/user/last_tweets";

#[derive(Debug, Deserialize)]
struct LastTweetsResponse {
    #[serde(default)]
    tweets: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    #[serde(default)]
    text: String,
}

/// Off-chain handle verification: the trader proves control of a social
/// handle by posting the configured keyword, and we look for it in their
/// recent posts. Best effort only; every failure mode degrades to
/// "not verified" rather than an error.
pub struct HandleVerifier {
    http: reqwest::Client,
    api_key: String,
    keyword: String,
}

impl HandleVerifier {
    pub fn new(api_key: String, keyword: String) -> Self {
        let http = reqwest::Client::builder()
            .tcp_nodelay(true)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .pool_max_idle_per_host(8)
            .build()
            .expect("failed to build reqwest client");
        Self {
            http,
            api_key,
            keyword,
        }
    }

    /// Returns true only when a recent post by `username` contains the
    /// keyword. Network errors, non-success statuses and malformed bodies
    /// all come back false.
    pub async fn handle_posted_keyword(&self, username: &str) -> bool {
        let response = match self
            .http
            .get(LAST_TWEETS_URL)
            .query(&[("username", username)])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("Tweet lookup failed | username={} | err={}", username, err);
                return false;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Tweet lookup returned an error status | username={} | status={}",
                username,
                response.status()
            );
            return false;
        }

        let body: LastTweetsResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    "Tweet lookup returned a malformed body | username={} | err={}",
                    username, err
                );
                return false;
            }
        };

        let verified = contains_keyword(&body, &self.keyword);
        debug!(
            "Handle verification | username={} | verified={}",
            username, verified
        );
        verified
    }
}

fn contains_keyword(response: &LastTweetsResponse, keyword: &str) -> bool {
    response
        .tweets
        .iter()
        .any(|tweet| tweet.text.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_found_in_any_tweet() {
        let body: LastTweetsResponse = serde_json::from_str(
            r#"{"tweets":[{"text":"gm"},{"text":"proof: MintyFunVerification"}]}"#,
        )
        .unwrap();
        assert!(contains_keyword(&body, "MintyFunVerification"));
    }

    #[test]
    fn missing_keyword_is_not_verified() {
        let body: LastTweetsResponse =
            serde_json::from_str(r#"{"tweets":[{"text":"nothing to see"}]}"#).unwrap();
        assert!(!contains_keyword(&body, "MintyFunVerification"));
    }

    #[test]
    fn empty_or_absent_tweet_list_is_not_verified() {
        let empty: LastTweetsResponse = serde_json::from_str(r#"{"tweets":[]}"#).unwrap();
        assert!(!contains_keyword(&empty, "anything"));

        // The tweets field may be absent entirely; serde defaults it.
        let absent: LastTweetsResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(!contains_keyword(&absent, "anything"));
    }
}
