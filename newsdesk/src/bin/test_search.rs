use newsdesk::search::firecrawl::FirecrawlClient;
use newsdesk::search::SearchTool;
use newsdesk::search_params::map_search_params;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    dotenv::dotenv().ok();

    let api_key = std::env::var("FIRECRAWL_API_KEY")
        .expect("Set FIRECRAWL_API_KEY environment variable");

    let base_url = std::env::var("FIRECRAWL_API_URL")
        .unwrap_or_else(|_| "https://api.firecrawl.dev/v1".to_string());

    let mut args = std::env::args().skip(1);
    let query = args.next().unwrap_or_else(|| "Latest developments in AI".to_string());
    let recency = args.next().unwrap_or_else(|| "qdr:w".to_string());

    let (params, phrase) = map_search_params(3, &recency);

    println!("\n{}", "=".repeat(60));
    println!("Testing search tool");
    println!("Base URL: {}", base_url);
    println!(
        "Query: {} ({}, tbs={})",
        query,
        phrase,
        params.recency_token.as_deref().unwrap_or("none")
    );
    println!("{}", "=".repeat(60));

    let client = FirecrawlClient::new(&base_url, &api_key, 60)
        .expect("Failed to build Firecrawl client");

    match client.search(&query, &params).await {
        Ok(documents) => {
            println!("✓ Success! {} documents", documents.len());
            for (i, doc) in documents.iter().enumerate() {
                println!("  {}. {}", i + 1, doc.title.as_deref().unwrap_or("(untitled)"));
                println!("     {}", doc.url);
                if let Some(markdown) = &doc.markdown {
                    println!("     {} chars of content", markdown.chars().count());
                }
            }
        }
        Err(e) => {
            eprintln!("✗ Failed: {:#}", e);
        }
    }

    println!("\n{}", "=".repeat(60));
}
