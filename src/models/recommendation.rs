use serde::{Deserialize, Serialize};

/// Maximum number of entries returned by the recommendation endpoint
pub const MAX_RECOMMENDATIONS: usize = 10;

/// A single LLM-generated recommendation.
///
/// Movies carry a `cast` field, books an `author` field; both are optional on
/// the wire since the model occasionally omits them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub item_type: String,
    pub title: String,
    pub confidence: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_movie_recommendation() {
        let json = r#"{
            "type": "movie",
            "title": "Inception",
            "confidence": 0.92,
            "description": "A heist inside dreams.",
            "genre": "Science Fiction",
            "cast": ["Leonardo DiCaprio", "Elliot Page"]
        }"#;

        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.item_type, "movie");
        assert_eq!(rec.title, "Inception");
        assert_eq!(rec.cast.as_ref().unwrap().len(), 2);
        assert!(rec.author.is_none());
    }

    #[test]
    fn test_tolerates_missing_optional_fields() {
        let json = r#"{"type": "book", "title": "Dune", "confidence": 0.8}"#;
        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert!(rec.description.is_none());
        assert!(rec.genre.is_none());
    }
}
