use serde::{Deserialize, Deserializer, Serialize};

/// Front matter describing a post.
///
/// Fields are carried exactly as the server sends them. The `date` is an opaque,
/// externally formatted string and is never parsed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostMetadata {
    pub title: String,
    pub date: String,
    /// Tags in the order received. The server encodes "no tags" as `null`.
    #[serde(deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    pub description: String,
}

/// A single blog post as served by `/api/posts`.
///
/// # Identity
/// `slug` identifies a post within one snapshot. Uniqueness is assumed from the
/// server, not enforced: lookups return the first match in snapshot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: PostMetadata,
}

impl Post {
    /// Creates a post with empty metadata.
    pub fn new(slug: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            content: content.into(),
            metadata: PostMetadata::default(),
        }
    }

    /// Replaces the metadata, builder style.
    pub fn with_metadata(mut self, metadata: PostMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_payload() {
        let json = r#"[{"slug":"a","content":"C","metadata":{"title":"T","date":"2024-01-01","tags":[],"description":"D"}}]"#;
        let posts: Vec<Post> = serde_json::from_str(json).unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "a");
        assert_eq!(posts[0].content, "C");
        assert_eq!(posts[0].metadata.title, "T");
        assert_eq!(posts[0].metadata.date, "2024-01-01");
        assert!(posts[0].metadata.tags.is_empty());
        assert_eq!(posts[0].metadata.description, "D");
    }

    #[test]
    fn null_tags_decode_as_empty() {
        let json = r#"{"slug":"bare","content":"","metadata":{"title":"","date":"","tags":null,"description":""}}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert!(post.metadata.tags.is_empty());
    }

    #[test]
    fn tag_order_is_preserved() {
        let json = r#"{"slug":"s","content":"x","metadata":{"title":"t","date":"d","tags":["rust","async","blog"],"description":""}}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.metadata.tags, vec!["rust", "async", "blog"]);
    }

    #[test]
    fn missing_metadata_falls_back_to_defaults() {
        let post: Post = serde_json::from_str(r#"{"slug":"only-slug"}"#).unwrap();
        assert_eq!(post, Post::new("only-slug", ""));
    }

    #[test]
    fn date_is_not_validated() {
        let json = r#"{"slug":"s","metadata":{"date":"sometime last spring"}}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.metadata.date, "sometime last spring");
    }
}
