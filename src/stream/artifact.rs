use serde::Deserialize;

pub const UNTITLED: &str = "Untitled";
pub const ARTIFACT_PARSE_ERROR: &str = "\nCould not parse artifact JSON\n";

#[derive(Debug, Deserialize)]
struct Artifact {
    title: Option<String>,
    content: Option<String>,
    language: Option<String>,
}

/// Render an accumulated artifact payload as a markdown fragment.
///
/// The content is fenced verbatim; a payload that does not parse yields a
/// placeholder fragment instead of an error.
pub fn render_artifact(raw: &str) -> String {
    let artifact: Artifact = match serde_json::from_str(raw) {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::warn!("could not parse artifact payload: {}", e);
            return ARTIFACT_PARSE_ERROR.to_string();
        }
    };

    let title = artifact.title.as_deref().unwrap_or(UNTITLED);
    let mut fragment = format!("\n\n### {}\n\n", title);

    let content = artifact.content.unwrap_or_default();
    if !content.is_empty() {
        let language = artifact.language.unwrap_or_default();
        fragment.push_str(&format!("```{}\n{}\n```\n\n", language, content));
    }

    fragment
}
