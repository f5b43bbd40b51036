use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Envelope the Directus items API wraps every listing in.
#[derive(Deserialize, Debug)]
pub struct ItemsResponse<T> {
    #[serde(default)]
    pub data: Option<T>,
}

/// A page-like record (page or network conference) with its nested blocks.
/// Fields the site does not interpret are kept in `extra` so loaders can pass
/// the record through untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Document {
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub permalink: Option<String>,
    #[serde(default, deserialize_with = "lenient_blocks")]
    pub blocks: Vec<Block>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Block {
    /// Block payload. Shape depends on the block collection (rich text, hero, team member).
    #[serde(default)]
    pub item: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Item fields that carry searchable text, in extraction order.
pub const TEXT_FIELDS: [&str; 5] = ["content", "title", "description", "bio", "name"];

impl Block {
    /// Non-empty string values of the text-bearing item fields.
    pub fn text_fields(&self) -> impl Iterator<Item = &str> {
        let item = self.item.as_ref().and_then(Value::as_object);
        TEXT_FIELDS.iter().filter_map(move |field| {
            item.and_then(|obj| obj.get(*field))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
    }
}

impl Document {
    /// Space-prefixed concatenation of every block's text fields, in block order.
    pub fn block_text(&self) -> String {
        let mut out = String::new();
        for value in self.blocks.iter().flat_map(Block::text_fields) {
            out.push(' ');
            out.push_str(value);
        }
        out
    }
}

// `blocks` may be null, a list of ids, or an expanded list depending on the
// field selection. Anything that is not an object is dropped.
fn lenient_blocks<'de, D>(deserializer: D) -> Result<Vec<Block>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let blocks = match value {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        _ => Vec::new(),
    };
    Ok(blocks)
}

// A number or object where a string is expected reads as absent instead of
// failing the whole listing.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}
