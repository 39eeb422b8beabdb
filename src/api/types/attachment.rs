use serde::{Deserialize, Serialize};

/// A local file inlined into a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub extracted_content: String,
    pub origin: String,
    pub kind: String,
}

impl Attachment {
    /// A text file uploaded by the user.
    pub fn user_file(file_name: impl Into<String>, file_type: impl Into<String>, content: String) -> Self {
        Self {
            file_name: file_name.into(),
            file_type: file_type.into(),
            file_size: content.len() as u64,
            extracted_content: content,
            origin: "user_upload".to_string(),
            kind: "file".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_file_wire_shape() -> anyhow::Result<()> {
        let attachment = Attachment::user_file("notes.md", "text/markdown", "# Hi".to_string());
        assert_eq!(
            serde_json::to_value(&attachment)?,
            json!({
                "file_name": "notes.md",
                "file_type": "text/markdown",
                "file_size": 4,
                "extracted_content": "# Hi",
                "origin": "user_upload",
                "kind": "file"
            })
        );
        Ok(())
    }
}
