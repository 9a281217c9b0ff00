//! YAML frontmatter → document metadata.

use crate::error::{CompileError, CompileResult};
use mdxir_types::Frontmatter;

/// Parse the YAML between the `---` fences. An empty block is an empty
/// mapping; any other non-mapping document is an error.
pub(crate) fn parse(yaml: &str) -> CompileResult<Frontmatter> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| CompileError::Frontmatter(e.to_string()))?;
    let kind = match &value {
        serde_yaml::Value::Null => return Ok(Frontmatter::new()),
        serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Bool(_) => Some("a boolean"),
        serde_yaml::Value::Number(_) => Some("a number"),
        serde_yaml::Value::String(_) => Some("a string"),
        serde_yaml::Value::Sequence(_) => Some("a sequence"),
        serde_yaml::Value::Tagged(_) => Some("a tagged value"),
    };
    if let Some(kind) = kind {
        return Err(CompileError::Frontmatter(format!("expected a mapping, found {kind}")));
    }
    match serde_json::to_value(&value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(CompileError::Frontmatter("expected a mapping".to_string())),
        Err(e) => Err(CompileError::Frontmatter(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_keeps_key_order() {
        let map = parse("title: Hello\nslug: hello\ntags: [a, b]\ndraft: false").unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["title", "slug", "tags", "draft"]);
        assert_eq!(map["tags"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn empty_block_is_empty_mapping() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn non_mappings_are_rejected() {
        assert_eq!(
            parse("- a\n- b").unwrap_err(),
            CompileError::Frontmatter("expected a mapping, found a sequence".into())
        );
        assert!(matches!(parse("title: [unclosed"), Err(CompileError::Frontmatter(_))));
    }
}
