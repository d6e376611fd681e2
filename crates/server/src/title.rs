use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use tracing::debug;

use trivia_core::config::ScrapeConfig;

const MAX_BODY_BYTES: usize = 256 * 1024;

/// Looks up a human readable title for a link. Every failure degrades to
/// `None`; archiving never waits on a title.
#[async_trait]
pub trait TitleResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Option<String>;
}

pub struct HttpTitleResolver {
    client: reqwest::Client,
}

impl HttpTitleResolver {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ScrapeConfig) -> Result<Self, reqwest::Error> {
        Self::new(Duration::from_secs(config.title_timeout_secs), &config.user_agent)
    }

    async fn fetch_head(&self, url: &str) -> Result<Option<String>, reqwest::Error> {
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            debug!(url, status = %response.status(), "title fetch returned non-success status");
            return Ok(None);
        }

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase().contains("html"))
            .unwrap_or(true);
        if !is_html {
            return Ok(None);
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() >= MAX_BODY_BYTES {
                body.truncate(MAX_BODY_BYTES);
                break;
            }
        }

        Ok(Some(String::from_utf8_lossy(&body).into_owned()))
    }
}

#[async_trait]
impl TitleResolver for HttpTitleResolver {
    async fn resolve(&self, url: &str) -> Option<String> {
        match self.fetch_head(url).await {
            Ok(Some(html)) => extract_title(&html),
            Ok(None) => None,
            Err(error) => {
                debug!(url, error = %error, "title fetch failed");
                None
            }
        }
    }
}

/// Returns the text of the document's first `<title>`, whitespace
/// collapsed. Comments and script bodies never count as a title.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let element = document.select(&selector).next()?;

    let text = element.text().collect::<String>();
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{http::header, http::StatusCode, routing::get, Router};

    use super::{extract_title, HttpTitleResolver, TitleResolver};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        format!("http://{address}")
    }

    fn resolver() -> HttpTitleResolver {
        HttpTitleResolver::new(Duration::from_secs(1), "trivia-test").expect("client")
    }

    #[test]
    fn extracts_and_decodes_titles() {
        assert_eq!(
            extract_title("<html><head><TITLE>\n  Pub Quiz &amp; Pints &#8211; Week 3 </TITLE>"),
            Some("Pub Quiz & Pints \u{2013} Week 3".to_owned())
        );
        assert_eq!(
            extract_title("<title data-x=\"1\">Round &#x27;7&#x27;</title>"),
            Some("Round '7'".to_owned())
        );
        assert_eq!(extract_title("<title>   </title>"), None);
        assert_eq!(extract_title("<p>no title here</p>"), None);
        assert_eq!(extract_title("<title>Fish &chips</title>"), Some("Fish &chips".to_owned()));
    }

    #[test]
    fn ignores_titles_in_comments_and_scripts() {
        let html = "<html><head>\
            <!-- <title>Draft Round</title> -->\
            <script>document.write('<title>Injected</title>')</script>\
            <title>Final Round</title></head></html>";

        assert_eq!(extract_title(html), Some("Final Round".to_owned()));
    }

    #[test]
    fn unterminated_titles_still_yield_their_text() {
        assert_eq!(
            extract_title("<html><head><title>Cut off mid"),
            Some("Cut off mid".to_owned())
        );
    }

    #[tokio::test]
    async fn resolves_the_title_of_an_html_page() {
        let base = serve(Router::new().route(
            "/form",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                    "<html><head><title>Trivia Night Round 1</title></head></html>",
                )
            }),
        ))
        .await;

        let title = resolver().resolve(&format!("{base}/form")).await;

        assert_eq!(title.as_deref(), Some("Trivia Night Round 1"));
    }

    #[tokio::test]
    async fn non_html_and_error_responses_have_no_title() {
        let base = serve(
            Router::new()
                .route(
                    "/json",
                    get(|| async {
                        ([(header::CONTENT_TYPE, "application/json")], "{\"title\":\"nope\"}")
                    }),
                )
                .route(
                    "/missing",
                    get(|| async { (StatusCode::NOT_FOUND, "<title>Not Found</title>") }),
                ),
        )
        .await;

        assert_eq!(resolver().resolve(&format!("{base}/json")).await, None);
        assert_eq!(resolver().resolve(&format!("{base}/missing")).await, None);
    }

    #[tokio::test]
    async fn slow_pages_time_out_to_none() {
        let base = serve(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "<title>Too late</title>"
            }),
        ))
        .await;

        assert_eq!(resolver().resolve(&format!("{base}/slow")).await, None);
    }

    #[tokio::test]
    async fn unreachable_hosts_have_no_title() {
        assert_eq!(resolver().resolve("http://127.0.0.1:9/unreachable").await, None);
    }
}
