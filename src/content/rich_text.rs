use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// Node types of the rich text format the frontend
// renders. It's the Contentful one, the query
// backend gets converted into it.
pub const NODE_DOCUMENT: &'static str = "document";
pub const NODE_PARAGRAPH: &'static str = "paragraph";
pub const NODE_HEADING_2: &'static str = "heading-2";
pub const NODE_HEADING_3: &'static str = "heading-3";
pub const NODE_BLOCKQUOTE: &'static str = "blockquote";
pub const NODE_EMBEDDED_ASSET: &'static str = "embedded-asset-block";
pub const NODE_TEXT: &'static str = "text";

pub const MARK_BOLD: &'static str = "bold";
pub const MARK_ITALIC: &'static str = "italic";
pub const MARK_UNDERLINE: &'static str = "underline";
pub const MARK_CODE: &'static str = "code";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
  #[serde(rename = "type")]
  pub mark_type: String
}

impl Mark {
  pub fn new(mark_type: &str) -> Self {
    Self {
      mark_type: mark_type.to_string()
    }
  }
}

// Tagging the nodes instead of shuffling raw JSON
// around lets the translation code walk documents
// and touch nothing but the text leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum RichTextNode {
  Text {
    value: String,
    marks: Vec<Mark>,
    data: Value
  },
  Block {
    node_type: String,
    data: Value,
    content: Vec<RichTextNode>
  },
  EmbeddedAsset {
    data: Value
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RichTextDocument {
  pub data: Value,
  pub content: Vec<RichTextNode>
}

impl RichTextDocument {
  pub fn new(content: Vec<RichTextNode>) -> Self {
    Self {
      data: empty_data(),
      content
    }
  }

  pub fn empty() -> Self {
    Self::new(Vec::new())
  }

  pub fn is_empty(&self) -> bool {
    self.content.is_empty()
  }

  // Reads a wire document out of a JSON value.
  // Anything that isn't an object can't be a
  // document. An object that doesn't look like one
  // simply ends up with no content, callers treat
  // empty documents as missing anyway.
  pub fn parse(value: &Value) -> Option<Self> {
    if !value.is_object() {
      return None;
    }
    serde_json::from_value(value.clone()).ok()
  }
}

fn empty_data() -> Value {
  Value::Object(serde_json::Map::new())
}

// Serialization is written out by hand because the
// three node kinds flatten into one JSON shape
// keyed by nodeType, with text nodes carrying
// value and marks where blocks carry content.

impl Serialize for RichTextNode {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match self {
      RichTextNode::Text { value, marks, data } => {
        let mut state = serializer.serialize_struct("RichTextNode", 4)?;
        state.serialize_field("nodeType", NODE_TEXT)?;
        state.serialize_field("value", value)?;
        state.serialize_field("marks", marks)?;
        state.serialize_field("data", data)?;
        state.end()
      }
      RichTextNode::Block {
        node_type,
        data,
        content
      } => {
        let mut state = serializer.serialize_struct("RichTextNode", 3)?;
        state.serialize_field("nodeType", node_type)?;
        state.serialize_field("data", data)?;
        state.serialize_field("content", content)?;
        state.end()
      }
      RichTextNode::EmbeddedAsset { data } => {
        let mut state = serializer.serialize_struct("RichTextNode", 3)?;
        state.serialize_field("nodeType", NODE_EMBEDDED_ASSET)?;
        state.serialize_field("data", data)?;
        state.serialize_field("content", &[] as &[RichTextNode])?;
        state.end()
      }
    }
  }
}

impl Serialize for RichTextDocument {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    let mut state = serializer.serialize_struct("RichTextDocument", 3)?;
    state.serialize_field("nodeType", NODE_DOCUMENT)?;
    state.serialize_field("data", &self.data)?;
    state.serialize_field("content", &self.content)?;
    state.end()
  }
}

// One permissive intermediate shape for reading,
// the variant gets picked from nodeType afterwards.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
  #[serde(default)]
  node_type: String,
  #[serde(default = "empty_data")]
  data: Value,
  #[serde(default)]
  content: Vec<RawNode>,
  #[serde(default)]
  value: Option<String>,
  #[serde(default)]
  marks: Option<Vec<Mark>>
}

impl From<RawNode> for RichTextNode {
  fn from(raw: RawNode) -> Self {
    match raw.node_type.as_str() {
      NODE_TEXT => RichTextNode::Text {
        value: raw.value.unwrap_or_default(),
        marks: raw.marks.unwrap_or_default(),
        data: raw.data
      },
      NODE_EMBEDDED_ASSET => RichTextNode::EmbeddedAsset { data: raw.data },
      _ => RichTextNode::Block {
        // Unknown block types are kept as they are so
        // the frontend can decide what to do with
        // them. No type at all becomes a paragraph:
        node_type: if raw.node_type.is_empty() {
          NODE_PARAGRAPH.to_string()
        } else {
          raw.node_type
        },
        data: raw.data,
        content: raw.content.into_iter().map(RichTextNode::from).collect()
      }
    }
  }
}

impl<'de> Deserialize<'de> for RichTextNode {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    Ok(RawNode::deserialize(deserializer)?.into())
  }
}

impl<'de> Deserialize<'de> for RichTextDocument {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = RawNode::deserialize(deserializer)?;
    Ok(RichTextDocument {
      data: raw.data,
      content: raw.content.into_iter().map(RichTextNode::from).collect()
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn wire_document() -> Value {
    json!({
      "nodeType": "document",
      "data": {},
      "content": [
        {
          "nodeType": "paragraph",
          "data": {},
          "content": [
            { "nodeType": "text", "value": "Bun ", "marks": [], "data": {} },
            {
              "nodeType": "text",
              "value": "venit",
              "marks": [{ "type": "bold" }],
              "data": {}
            }
          ]
        },
        {
          "nodeType": "embedded-asset-block",
          "data": { "target": { "sys": { "id": "img1" } } },
          "content": []
        }
      ]
    })
  }

  #[test]
  fn wire_documents_parse_into_tagged_nodes() {
    let sut = RichTextDocument::parse(&wire_document()).unwrap();
    assert_eq!(sut.content.len(), 2);
    match &sut.content[0] {
      RichTextNode::Block {
        node_type, content, ..
      } => {
        assert_eq!(node_type, NODE_PARAGRAPH);
        assert_eq!(content.len(), 2);
        match &content[1] {
          RichTextNode::Text { value, marks, .. } => {
            assert_eq!(value, "venit");
            assert_eq!(marks, &vec![Mark::new(MARK_BOLD)]);
          }
          other => panic!("expected a text node, got {:?}", other)
        }
      }
      other => panic!("expected a paragraph, got {:?}", other)
    }
    match &sut.content[1] {
      RichTextNode::EmbeddedAsset { data } => {
        assert_eq!(data["target"]["sys"]["id"], json!("img1"));
      }
      other => panic!("expected an embedded asset, got {:?}", other)
    }
  }

  #[test]
  fn documents_serialize_back_to_the_wire_shape() {
    let sut = RichTextDocument::parse(&wire_document()).unwrap();
    let serialized = serde_json::to_value(&sut).unwrap();
    assert_eq!(serialized, wire_document());
  }

  #[test]
  fn unknown_node_types_survive_the_round_trip() {
    let wire = json!({
      "nodeType": "document",
      "data": {},
      "content": [
        { "nodeType": "callout", "data": { "tone": "info" }, "content": [] }
      ]
    });
    let sut = RichTextDocument::parse(&wire).unwrap();
    match &sut.content[0] {
      RichTextNode::Block { node_type, .. } => {
        assert_eq!(node_type, "callout");
      }
      other => panic!("expected a block, got {:?}", other)
    }
    assert_eq!(serde_json::to_value(&sut).unwrap(), wire);
  }

  #[test]
  fn scalars_and_non_documents_do_not_parse() {
    assert!(RichTextDocument::parse(&json!("just text")).is_none());
    assert!(RichTextDocument::parse(&json!(42)).is_none());
    assert!(RichTextDocument::parse(&Value::Null).is_none());
    // An object with no content is an empty document:
    let empty = RichTextDocument::parse(&json!({})).unwrap();
    assert!(empty.is_empty());
  }

}
