use crate::core::models::{escape_html, NewsArticle};
use crate::core::settings::{is_usable_api_key, Settings};
use crate::providers::NewsProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

const EVERYTHING_PATH: &str = "/v2/everything";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    #[allow(dead_code)]
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub source: Option<RawSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[allow(dead_code)]
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    #[allow(dead_code)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NewsApiResponse {
    #[serde(rename_all = "camelCase")]
    Ok {
        total_results: u64,
        #[serde(default)]
        articles: Vec<RawArticle>,
    },
    Error {
        code: Option<String>,
        message: Option<String>,
    },
}

/// Builds the dashboard form of an article: its title, and its description
/// followed by a link to the source. Articles missing any of those fields are
/// rejected.
pub fn format_news_article(raw: &RawArticle) -> Option<NewsArticle> {
    let title = raw.title.as_deref()?;
    let description = raw.description.as_deref()?;
    let url = raw.url.as_deref()?;
    let source = raw.source.as_ref()?.name.as_deref()?;

    Some(NewsArticle {
        title: title.to_string(),
        content: format!(
            "{}<a href=\"{}\">{}</a>",
            escape_html(description),
            escape_html(url),
            escape_html(source)
        ),
    })
}

pub struct NewsApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    search_terms: Vec<String>,
}

impl NewsApiClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.news.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_keys.news_api.trim().to_string(),
            search_terms: settings.search_terms(),
        }
    }

    pub async fn news_api_request(
        &self,
        search_terms: &[String],
        page_size: usize,
    ) -> Result<NewsApiResponse> {
        if !is_usable_api_key(&self.api_key) {
            anyhow::bail!("News API key is not configured (set api_keys.news_api)");
        }
        if search_terms.is_empty() {
            anyhow::bail!("No news search terms configured");
        }

        let url = format!("{}{}", self.base_url, EVERYTHING_PATH);
        let query = search_terms.join(" OR ");
        let page_size = page_size.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query.as_str()),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to fetch news")?;

        let status = response.status();
        let body = response.text().await.context("Failed to read news response")?;
        tracing::info!(%query, %page_size, %status, "News API request");

        serde_json::from_str(&body)
            .with_context(|| format!("Unexpected news API response ({status})"))
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    fn name(&self) -> &'static str {
        "News API"
    }

    async fn fetch_articles(&self, page_size: usize) -> Result<Vec<RawArticle>> {
        match self.news_api_request(&self.search_terms, page_size).await? {
            NewsApiResponse::Ok {
                total_results,
                articles,
            } => {
                tracing::debug!(total_results, returned = articles.len(), "News API articles");
                Ok(articles)
            }
            NewsApiResponse::Error { code, message } => anyhow::bail!(
                "News API error: {} - {}",
                code.unwrap_or_default(),
                message.unwrap_or_default()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::API_KEY_PLACEHOLDER;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn raw(title: &str) -> RawArticle {
        RawArticle {
            source: Some(RawSource {
                id: None,
                name: Some("BBC News".to_string()),
            }),
            title: Some(title.to_string()),
            description: Some(format!("About {title}")),
            url: Some("https://example.com/story".to_string()),
            ..Default::default()
        }
    }

    fn client_for(server: &MockServer, key: &str) -> NewsApiClient {
        let mut settings = Settings::default();
        settings.news.base_url = server.uri();
        settings.api_keys.news_api = key.to_string();
        settings.news_search_terms = "Covid coronavirus".to_string();
        NewsApiClient::new(&settings)
    }

    #[test]
    fn test_format_news_article() {
        let article = format_news_article(&raw("Cases fall")).unwrap();
        assert_eq!(article.title, "Cases fall");
        assert_eq!(
            article.content,
            "About Cases fall<a href=\"https://example.com/story\">BBC News</a>"
        );
    }

    #[test]
    fn test_format_news_article_escapes_markup() {
        let mut article = raw("Story");
        article.description = Some("<script>alert(1)</script>".to_string());
        let formatted = format_news_article(&article).unwrap();
        assert!(formatted.content.starts_with("&lt;script&gt;"));
    }

    #[test]
    fn test_format_news_article_requires_fields() {
        let mut missing_url = raw("Story");
        missing_url.url = None;
        assert!(format_news_article(&missing_url).is_none());

        let mut missing_source_name = raw("Story");
        missing_source_name.source = Some(RawSource::default());
        assert!(format_news_article(&missing_source_name).is_none());

        assert!(format_news_article(&RawArticle::default()).is_none());
    }

    #[test]
    fn test_parse_error_response() {
        let body = json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid or incorrect."
        });
        let response: NewsApiResponse = serde_json::from_value(body).unwrap();
        match response {
            NewsApiResponse::Error { code, message } => {
                assert_eq!(code.as_deref(), Some("apiKeyInvalid"));
                assert!(message.unwrap().contains("invalid"));
            }
            NewsApiResponse::Ok { .. } => panic!("expected error response"),
        }
    }

    #[tokio::test]
    async fn test_news_api_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(query_param("q", "Covid OR coronavirus"))
            .and(query_param("pageSize", "20"))
            .and(query_param("apiKey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "totalResults": 2,
                "articles": [
                    {
                        "source": { "id": "bbc-news", "name": "BBC News" },
                        "author": "BBC",
                        "title": "First",
                        "description": "First story",
                        "url": "https://example.com/1",
                        "urlToImage": null,
                        "publishedAt": "2021-10-28T10:00:00Z",
                        "content": "..."
                    },
                    {
                        "source": { "id": null, "name": "Guardian" },
                        "title": "Second",
                        "description": "Second story",
                        "url": "https://example.com/2"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, "secret");
        let terms = vec!["Covid".to_string(), "coronavirus".to_string()];
        let response = client.news_api_request(&terms, 20).await.unwrap();

        match response {
            NewsApiResponse::Ok {
                total_results,
                articles,
            } => {
                assert!(total_results > 0);
                assert_eq!(articles.len(), 2);
                assert_eq!(articles[0].title.as_deref(), Some("First"));
                assert_eq!(
                    articles[1].source.as_ref().unwrap().name.as_deref(),
                    Some("Guardian")
                );
            }
            NewsApiResponse::Error { .. } => panic!("expected ok response"),
        }
    }

    #[tokio::test]
    async fn test_fetch_articles_surfaces_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": "error",
                "code": "apiKeyInvalid",
                "message": "Your API key is invalid or incorrect."
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, "wrong")
            .fetch_articles(10)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("apiKeyInvalid"));
    }

    #[tokio::test]
    async fn test_placeholder_key_is_rejected_before_request() {
        let server = MockServer::start().await;
        let client = client_for(&server, API_KEY_PLACEHOLDER);

        let err = client.fetch_articles(10).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
