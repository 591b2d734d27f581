/// Schema sources: where a `definitions` section comes from.
///
/// A source is either a local file or, with the `fetch` feature, an
/// `http(s)://` URL. Both yield the parsed `definitions` of a Swagger
/// document; transport failures are passed through unchanged.
use crate::compiler::CompileError;
use crate::schema::Definitions;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid schema: {0}")]
    Schema(#[from] CompileError),
    #[cfg(feature = "fetch")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("cannot fetch {0}: built without the `fetch` feature")]
    FetchDisabled(String),
}

/// Parse a Swagger document and take its `definitions`.
pub fn parse_document(text: &str) -> Result<Definitions, SourceError> {
    let document: serde_json::Value = serde_json::from_str(text)?;
    Ok(Definitions::from_document(&document)?)
}

/// Read a Swagger document from disk.
pub fn load_definitions(path: &Path) -> Result<Definitions, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_document(&text)
}

/// Whether `source` names a remote document rather than a file.
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetch a Swagger document over HTTP and take its `definitions`.
#[cfg(feature = "fetch")]
pub async fn fetch_definitions(url: &str) -> Result<Definitions, SourceError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("swagger-proptypes/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    tracing::debug!(url, "fetching schema document");
    let document: serde_json::Value = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(Definitions::from_document(&document)?)
}

#[cfg(not(feature = "fetch"))]
pub async fn fetch_definitions(url: &str) -> Result<Definitions, SourceError> {
    Err(SourceError::FetchDisabled(url.to_string()))
}

/// Load definitions from a file path or URL.
pub async fn load(source: &str) -> Result<Definitions, SourceError> {
    if is_url(source) {
        fetch_definitions(source).await
    } else {
        load_definitions(Path::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let defs = parse_document(
            r#"{"swagger": "2.0", "definitions": {"Pet": {"type": "object"}}}"#,
        )
        .unwrap();
        assert_eq!(defs.len(), 1);
    }

    #[test]
    fn test_parse_document_errors() {
        assert!(matches!(parse_document("{"), Err(SourceError::Json(_))));
        assert!(matches!(
            parse_document(r#"{"paths": {}}"#),
            Err(SourceError::Schema(CompileError::MissingDefinitions))
        ));
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://petstore.swagger.io/v2/swagger.json"));
        assert!(is_url("http://localhost:8080/swagger.json"));
        assert!(!is_url("./swagger.json"));
        assert!(!is_url("/tmp/http.json"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_definitions(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().starts_with("cannot read /definitely/not/here.json"));
    }
}
