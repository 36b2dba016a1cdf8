//! Attraction lookup

use async_trait::async_trait;

/// One-line natural-language attraction list for a place
#[async_trait]
pub trait AttractionLookup: Send + Sync {
    /// Highlights for `place`; never fails
    async fn lookup_attractions(&self, place: &str, interests: &[String]) -> String;
}

/// Templated attraction list; no provider call
#[derive(Debug, Clone)]
pub struct StaticAttractions {
    highlights: Vec<String>,
}

impl StaticAttractions {
    /// Use custom highlights instead of the defaults
    pub fn new<I, S>(highlights: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            highlights: highlights.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for StaticAttractions {
    fn default() -> Self {
        Self::new(["Central Park", "City Museum", "Art Gallery"])
    }
}

#[async_trait]
impl AttractionLookup for StaticAttractions {
    async fn lookup_attractions(&self, place: &str, interests: &[String]) -> String {
        let mut line = format!("Top attractions in {}: {}.", place, self.highlights.join(", "));
        if !interests.is_empty() {
            line.push_str(&format!(" Suggested for interests: {}.", interests.join(", ")));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_attractions() {
        let out = StaticAttractions::default().lookup_attractions("Paris", &[]).await;
        assert_eq!(out, "Top attractions in Paris: Central Park, City Museum, Art Gallery.");
    }

    #[tokio::test]
    async fn test_interests_are_mentioned() {
        let interests = vec!["food".to_string(), "culture".to_string()];
        let out = StaticAttractions::new(["Louvre"])
            .lookup_attractions("Paris", &interests)
            .await;
        assert!(out.contains("Paris"));
        assert!(out.ends_with("Suggested for interests: food, culture."));
    }
}
