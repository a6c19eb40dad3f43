use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use std::time::Duration;

use crate::models::FetchedJoke;
use crate::store::JokeSource;

const JOKE_API_URL: &str = "https://icanhazdadjoke.com/";

/// Client for the icanhazdadjoke.com API. There is no batch endpoint; each
/// request returns exactly one random joke.
#[derive(Clone)]
pub struct DadJokeClient {
    client: Client,
}

impl DadJokeClient {
    pub fn new() -> Self {
        // icanhazdadjoke asks clients to send a descriptive user agent
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Dad Joke Reader (desktop; dad_joke_reader crate)")
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

impl JokeSource for DadJokeClient {
    fn fetch_joke(&self) -> Result<FetchedJoke> {
        let response = self
            .client
            .get(JOKE_API_URL)
            .header(ACCEPT, "application/json")
            .send()
            .context("joke request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("joke service returned HTTP {}", status));
        }

        let joke: FetchedJoke = response
            .json()
            .context("failed to parse joke response")?;

        Ok(joke)
    }
}

impl Default for DadJokeClient {
    fn default() -> Self {
        Self::new()
    }
}
