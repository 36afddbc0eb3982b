use anyhow::{anyhow, Result};
use clap::Parser;
use reqwest::{header, Client, Url};
use scraper::{Html, Selector};
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tokio::time::sleep;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "vitrine-crawler")]
#[command(about = "Crawl a product catalog to JSONL, respecting robots.txt")]
struct Cli {
    /// Seed URL to start from
    #[arg(long)]
    start_url: String,
    /// Output JSONL file path
    #[arg(long, default_value = "./sample_data/products.jsonl")]
    output: String,
    /// Maximum number of pages to visit
    #[arg(long, default_value_t = 50)]
    max_pages: usize,
    /// Politeness delay between requests, in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string to use for robots.txt and crawling
    #[arg(long, default_value = "vitrine-crawler/0.1 (+https://example.com/bot)")]
    user_agent: String,
}

#[derive(Debug, Clone)]
struct Robots {
    allows: Vec<String>,
    disallows: Vec<String>,
    crawl_delay_ms: Option<u64>,
}

/// Catalog record in the corpus input format the indexer consumes. Feature
/// and review extraction is site-specific; a generic crawl leaves them empty.
#[derive(Serialize)]
struct OutDoc<'a> {
    url: &'a str,
    title: &'a str,
    description: &'a str,
    product_features: BTreeMap<String, String>,
    product_reviews: Vec<serde_json::Value>,
    crawled_at: String,
}

/// Two-tier frontier: URLs containing "product" are visited first.
#[derive(Default)]
struct Frontier {
    priority: VecDeque<Url>,
    normal: VecDeque<Url>,
    queued: HashSet<String>,
}

impl Frontier {
    fn push(&mut self, url: Url, visited: &HashSet<String>) {
        let key = norm(&url);
        if visited.contains(&key) || !self.queued.insert(key) {
            return;
        }
        if url.as_str().contains("product") {
            self.priority.push_back(url);
        } else {
            self.normal.push_back(url);
        }
    }

    fn pop(&mut self) -> Option<Url> {
        self.priority.pop_front().or_else(|| self.normal.pop_front())
    }

    fn is_empty(&self) -> bool {
        self.priority.is_empty() && self.normal.is_empty()
    }

    fn len(&self) -> usize {
        self.priority.len() + self.normal.len()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();
    if let Some(dir) = std::path::Path::new(&args.output).parent() {
        fs::create_dir_all(dir).ok();
    }

    let client = Client::builder()
        .user_agent(args.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    let start = Url::parse(&args.start_url)
        .or_else(|_| Url::parse(&format!("https://{}", args.start_url)))
        .map_err(|_| anyhow!("invalid start url: {}", args.start_url))?;

    let mut out = BufWriter::new(File::create(&args.output)?);
    let mut robots_cache: HashMap<String, Robots> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut content_seen: HashSet<[u8; 20]> = HashSet::new();
    let mut frontier = Frontier::default();
    frontier.push(start, &visited);

    let sel_title = Selector::parse("title").expect("valid selector");
    let sel_p = Selector::parse("p").expect("valid selector");
    let sel_a = Selector::parse("a[href]").expect("valid selector");

    let mut emitted = 0usize;
    while visited.len() < args.max_pages && !frontier.is_empty() {
        let url = frontier.pop().expect("non-empty frontier");
        let key = norm(&url);
        if !visited.insert(key) {
            continue;
        }

        if !allowed(&client, &mut robots_cache, &url, &args.user_agent).await {
            tracing::info!(%url, "disallowed by robots.txt");
            continue;
        }

        // Politeness: fixed delay, or the host's Crawl-delay when longer
        let robots_ms = url
            .host_str()
            .and_then(|h| robots_cache.get(h))
            .and_then(|r| r.crawl_delay_ms)
            .unwrap_or(0);
        sleep(Duration::from_millis(args.delay_ms.max(robots_ms))).await;

        tracing::info!(%url, "crawling");
        let body = match fetch_html(&client, &url).await {
            Some(body) => body,
            None => continue,
        };

        let doc = Html::parse_document(&body);
        let title = doc
            .select(&sel_title)
            .next()
            .map(|n| n.text().collect::<String>())
            .unwrap_or_default()
            .trim()
            .to_string();
        let first_paragraph = doc
            .select(&sel_p)
            .next()
            .map(|n| n.text().collect::<String>())
            .unwrap_or_default()
            .trim()
            .to_string();

        for a in doc.select(&sel_a) {
            if let Some(href) = a.value().attr("href") {
                if let Ok(link) = Url::parse(href).or_else(|_| url.join(href)) {
                    if link.scheme().starts_with("http") {
                        frontier.push(link, &visited);
                    }
                }
            }
        }

        // Skip pages whose content was already emitted under another URL
        let mut hasher = Sha1::new();
        hasher.update(title.as_bytes());
        hasher.update(first_paragraph.as_bytes());
        if !content_seen.insert(hasher.finalize().into()) {
            tracing::debug!(%url, "duplicate content skipped");
            continue;
        }

        let record = OutDoc {
            url: url.as_str(),
            title: &title,
            description: &first_paragraph,
            product_features: BTreeMap::new(),
            product_reviews: Vec::new(),
            crawled_at: time::OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
        };
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
        emitted += 1;
    }
    out.flush()?;

    tracing::info!(
        emitted,
        visited = visited.len(),
        frontier = frontier.len(),
        output = %args.output,
        "crawl finished"
    );
    Ok(())
}

fn norm(u: &Url) -> String {
    let mut s = u.clone();
    s.set_fragment(None);
    s.to_string()
}

async fn fetch_html(client: &Client, url: &Url) -> Option<String> {
    let resp = match client.get(url.clone()).send().await {
        Ok(resp) => resp,
        Err(err) => {
            tracing::warn!(%url, %err, "request failed");
            return None;
        }
    };
    if !resp.status().is_success() {
        return None;
    }
    if let Some(ct) = resp.headers().get(header::CONTENT_TYPE) {
        if let Ok(v) = ct.to_str() {
            if !v.starts_with("text/html") {
                return None;
            }
        }
    }
    let bytes = resp.bytes().await.ok()?;
    if bytes.len() > 2 * 1024 * 1024 {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes).to_string())
}

fn parse_robots(txt: &str) -> Robots {
    // minimal parser for the '*' group
    let mut active = false;
    let mut allows = Vec::new();
    let mut disallows = Vec::new();
    let mut crawl_delay_ms: Option<u64> = None;
    for line in txt.lines() {
        let l = line.trim();
        if l.is_empty() || l.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = l.split_once(':') {
            let key = k.trim().to_lowercase();
            let val = v.trim();
            match key.as_str() {
                "user-agent" => {
                    active = val == "*";
                }
                "allow" if active => allows.push(val.to_string()),
                "disallow" if active => disallows.push(val.to_string()),
                "crawl-delay" if active => {
                    if let Ok(n) = val.parse::<f64>() {
                        crawl_delay_ms = Some((n * 1000.0) as u64);
                    }
                }
                _ => {}
            }
        }
    }
    Robots {
        allows,
        disallows,
        crawl_delay_ms,
    }
}

async fn allowed(
    client: &Client,
    cache: &mut HashMap<String, Robots>,
    url: &Url,
    ua: &str,
) -> bool {
    let host = match url.host_str() {
        Some(h) => h.to_string(),
        None => return false,
    };
    if !cache.contains_key(&host) {
        let robots_url = format!("{}://{}/robots.txt", url.scheme(), host);
        let txt = match client
            .get(&robots_url)
            .header(header::USER_AGENT, ua)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp.text().await.unwrap_or_default(),
            _ => String::new(),
        };
        cache.insert(host.clone(), parse_robots(&txt));
    }
    path_allowed(url.path(), &cache[&host])
}

fn path_allowed(path: &str, rules: &Robots) -> bool {
    // basic rule precedence: longest matching Allow vs Disallow
    let mut best_allow: Option<&str> = None;
    let mut best_dis: Option<&str> = None;
    for a in &rules.allows {
        if path.starts_with(a) && best_allow.map_or(true, |p| a.len() > p.len()) {
            best_allow = Some(a);
        }
    }
    for d in &rules.disallows {
        if d == "/" {
            best_dis = Some(d);
            continue;
        }
        if path.starts_with(d) && best_dis.map_or(true, |p| d.len() > p.len()) {
            best_dis = Some(d);
        }
    }
    match (best_allow, best_dis) {
        (Some(a), Some(d)) => a.len() >= d.len(),
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disallow_rules_apply_to_matching_paths() {
        let rules = parse_robots("User-agent: *\nDisallow: /private\nAllow: /private/ok\n");
        assert!(!path_allowed("/private/page", &rules));
        assert!(path_allowed("/private/ok/page", &rules));
        assert!(path_allowed("/public", &rules));
    }

    #[test]
    fn product_links_jump_the_queue() {
        let mut frontier = Frontier::default();
        let visited = HashSet::new();
        frontier.push(Url::parse("https://shop.test/about").unwrap(), &visited);
        frontier.push(Url::parse("https://shop.test/product/1").unwrap(), &visited);
        assert_eq!(
            frontier.pop().unwrap().as_str(),
            "https://shop.test/product/1"
        );
    }
}
