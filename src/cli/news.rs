use crate::core::settings::Settings;
use crate::providers::{NewsApiClient, NewsProvider, RawArticle};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct ArticleOutput {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl ArticleOutput {
    fn from_raw(raw: RawArticle) -> Option<Self> {
        Some(Self {
            title: raw.title?,
            source: raw.source.and_then(|s| s.name),
            author: raw.author,
            published_at: raw.published_at,
            description: raw.description,
            url: raw.url,
        })
    }
}

pub async fn run(settings: &Settings, json: bool, count: Option<usize>) -> Result<()> {
    let client = NewsApiClient::new(settings);
    let count = count.unwrap_or(settings.news.article_count);

    let articles: Vec<ArticleOutput> = client
        .fetch_articles(count)
        .await?
        .into_iter()
        .filter_map(ArticleOutput::from_raw)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&articles)?);
        return Ok(());
    }

    if articles.is_empty() {
        println!("No articles found");
        return Ok(());
    }

    for (i, article) in articles.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_article(article);
    }

    Ok(())
}

fn print_article(article: &ArticleOutput) {
    println!("{}", article.title);

    let byline: Vec<&str> = [article.source.as_deref(), article.author.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !byline.is_empty() {
        println!("  {}", byline.join(" / "));
    }
    if let Some(published_at) = &article.published_at {
        println!("  Published: {}", published_at);
    }
    if let Some(description) = &article.description {
        println!("  {}", description);
    }
    if let Some(url) = &article.url {
        println!("  {}", url);
    }
}
