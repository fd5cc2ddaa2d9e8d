use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::path::PathBuf;

use crate::bible::{parse_translations, BibleDocument, Translation};

pub const DEFAULT_API_URL: &str = "https://api.getbible.net/v2";

#[derive(Clone)]
pub struct BibleApi {
    client: Client,
    base_url: String,
}

impl BibleApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_document(&self, abbreviation: &str) -> Result<BibleDocument> {
        let url = format!("{}/{}.json", self.base_url, abbreviation);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("{} returned status {}", url, response.status()));
        }

        let document = response
            .json()
            .await
            .with_context(|| format!("decoding {}", url))?;
        Ok(document)
    }

    pub async fn fetch_translations(&self) -> Result<Vec<Translation>> {
        let url = format!("{}/translations.json", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("{} returned status {}", url, response.status()));
        }

        let body = response.text().await.with_context(|| format!("reading {}", url))?;
        parse_translations(&body)
    }
}

/// Where translation data comes from: the remote JSON API, or a local
/// directory holding `translations.json` and one `{abbreviation}.json`
/// per translation.
#[derive(Clone)]
pub enum DocumentSource {
    Api(BibleApi),
    Dir(PathBuf),
}

impl DocumentSource {
    pub async fn load_document(&self, abbreviation: &str) -> Result<BibleDocument> {
        match self {
            DocumentSource::Api(api) => api.fetch_document(abbreviation).await,
            DocumentSource::Dir(dir) => {
                BibleDocument::load_from_file(&dir.join(format!("{}.json", abbreviation))).await
            }
        }
    }

    pub async fn load_translations(&self) -> Result<Vec<Translation>> {
        match self {
            DocumentSource::Api(api) => api.fetch_translations().await,
            DocumentSource::Dir(dir) => {
                let path = dir.join("translations.json");
                let content = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                parse_translations(&content)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dir_source_loads_documents_and_index() {
        let dir = tempfile::tempdir().unwrap();

        let doc = r#"{"books":[{"name":"Genesis","chapters":[{"chapter":1,"verses":[{"verse":1,"text":"In the beginning"}]}]}]}"#;
        tokio::fs::write(dir.path().join("kjv.json"), doc).await.unwrap();
        tokio::fs::write(
            dir.path().join("translations.json"),
            r#"[{"abbreviation":"kjv","description":"King James Version"}]"#,
        )
        .await
        .unwrap();

        let source = DocumentSource::Dir(dir.path().to_path_buf());

        let translations = source.load_translations().await.unwrap();
        assert_eq!(translations.len(), 1);
        assert_eq!(translations[0].abbreviation, "kjv");

        let document = source.load_document("kjv").await.unwrap();
        assert_eq!(document.books[0].name, "Genesis");

        assert!(source.load_document("esv").await.is_err());
    }
}
