use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Joke {
    pub id: String,
    pub text: String,
    pub votes: i32,
    pub locked: bool,
}

impl Joke {
    pub fn new(id: String, text: String) -> Self {
        Self {
            id,
            text,
            votes: 0,
            locked: false,
        }
    }

    // icanhazdadjoke serves a permalink page per joke id
    pub fn permalink(&self) -> String {
        format!("https://icanhazdadjoke.com/j/{}", self.id)
    }
}

/// One joke record as returned by the API. The response also carries a
/// `status` field which we don't need.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchedJoke {
    pub id: String,
    #[serde(rename = "joke")]
    pub text: String,
}

/// Actions the view emits; the store applies them. Keeps mutation logic
/// independent of the rendering code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JokeIntent {
    Vote { id: String, delta: i32 },
    ToggleLock { id: String },
    RequestMore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetched_joke_parses_api_response() {
        let body = r#"{"id":"R7UfaahVfFd","joke":"My dog used to chase people on a bike a lot. It got so bad I had to take his bike away.","status":200}"#;
        let joke: FetchedJoke = serde_json::from_str(body).unwrap();
        assert_eq!(joke.id, "R7UfaahVfFd");
        assert!(joke.text.starts_with("My dog"));
    }

    #[test]
    fn permalink_points_at_joke_id() {
        let joke = Joke::new("abc123".to_string(), "why?".to_string());
        assert_eq!(joke.permalink(), "https://icanhazdadjoke.com/j/abc123");
    }
}
