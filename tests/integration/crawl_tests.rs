//! Integration tests for the harvester
//!
//! These tests use wiremock to serve index and detail pages and run the
//! full crawl cycle end-to-end against temporary output files.

use immo_harvest::config::{Config, CrawlerConfig, OutputConfig, SiteConfig};
use immo_harvest::crawler::Harvester;
use immo_harvest::output::export_csv;
use immo_harvest::state::{Category, PaginationState};
use immo_harvest::Record;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/en/search/house-and-apartment";

/// Creates a test configuration pointing at the mock server
fn create_test_config(server_uri: &str, dir: &TempDir, categories: Vec<Category>, max_pages: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_concurrent_details: 5,
            max_pages,
            categories,
            ..CrawlerConfig::default()
        },
        site: SiteConfig {
            base_url: server_uri.to_string(),
            search_url: format!("{}{}", server_uri, SEARCH_PATH),
            ..SiteConfig::default()
        },
        output: OutputConfig {
            records_path: dir.path().join("houses.jsonl").display().to_string(),
            snapshot_path: dir.path().join("houses.json").display().to_string(),
            csv_path: dir.path().join("houses.csv").display().to_string(),
        },
    }
}

fn detail_href(category: Category, id: u32) -> String {
    format!(
        "/en/classified/house/{}/gent/9000/{}",
        category.path_segment(),
        id
    )
}

fn index_page(category: Category, ids: &[u32]) -> String {
    let mut body = String::from("<html><body>");
    for id in ids {
        body.push_str(&format!(
            r#"<article class="card card--result">
                <h2><a class="card__title-link" href="{}">House {}</a></h2>
                <p class="card__price">€ {}</p>
            </article>"#,
            detail_href(category, *id),
            id,
            190_000 + id
        ));
    }
    // Promotional block without a listing link
    body.push_str(r#"<article class="card--result"><div class="promo">Sponsored</div></article>"#);
    body.push_str("</body></html>");
    body
}

fn detail_page(id: u32) -> String {
    format!(
        r#"<html><head>
        <script type="text/javascript">
            window.classified = {{
                "id": {id},
                "property": {{
                    "type": "HOUSE",
                    "subtype": "VILLA",
                    "location": {{"postalCode": "9000", "locality": "Gent"}},
                    "netHabitableSurface": 150,
                    "fireplaceExists": true
                }},
                "transaction": {{"type": "FOR_SALE", "subtype": "BUY"}},
                "price": {{"mainValue": {price}}}
            }};
        </script></head>
        <body>
            <table class="classified-table">
                <tr><th class="classified-table__header">Bedrooms</th><td class="classified-table__data">3</td></tr>
                <tr><th class="classified-table__header">Bathrooms</th><td class="classified-table__data">1</td></tr>
                <tr><th class="classified-table__header">Garden surface</th><td class="classified-table__data">120 m² square meters</td></tr>
                <tr><th class="classified-table__header">Flood zone type</th><td class="classified-table__data">Non flood zone</td></tr>
            </table>
        </body></html>"#,
        id = id,
        price = 200_000 + id
    )
}

async fn mount_index(server: &MockServer, category: Category, page: u32, ids: &[u32]) {
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", SEARCH_PATH, category.path_segment())))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_page(category, ids)))
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer, category: Category) {
    for id in 0..100 {
        Mock::given(method("GET"))
            .and(path(detail_href(category, id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(id)))
            .mount(server)
            .await;
    }
}

fn read_log(config: &Config) -> Vec<Record> {
    std::fs::read_to_string(&config.output.records_path)
        .expect("Failed to read record log")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid record line"))
        .collect()
}

fn read_snapshot(config: &Config) -> Vec<Record> {
    let content =
        std::fs::read_to_string(&config.output.snapshot_path).expect("Failed to read snapshot");
    serde_json::from_str(&content).expect("Invalid snapshot")
}

#[tokio::test]
async fn test_full_harvest_two_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let ids: Vec<u32> = (0..20).collect();
    mount_index(&server, Category::Sale, 1, &ids).await;
    mount_index(&server, Category::Sale, 2, &[]).await;
    mount_details(&server, Category::Sale).await;

    let config = create_test_config(&server.uri(), &dir, vec![Category::Sale], 2);
    let summary = Harvester::new(config.clone(), true)
        .expect("Failed to create harvester")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(summary.records_written, 20);
    assert_eq!(summary.pages_processed, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.categories.len(), 1);
    assert_eq!(summary.categories[0].final_state, PaginationState::Exhausted);
    assert_eq!(summary.categories[0].listings_found, 20);

    let records = read_log(&config);
    assert_eq!(records.len(), 20);

    let record = records
        .iter()
        .find(|r| r.url().ends_with("/gent/9000/7"))
        .expect("Record 7 missing");
    assert_eq!(record.price, Some(200_007));
    assert_eq!(record.zip_code.as_deref(), Some("9000"));
    assert_eq!(record.locality.as_deref(), Some("Gent"));
    assert_eq!(record.type_of_property.as_deref(), Some("HOUSE"));
    assert_eq!(record.surface_livable_space, Some(150));
    assert!(record.extras.open_fire);
    assert!(record.exterior.garden.present);
    assert_eq!(record.exterior.garden.surface, Some(120));
    assert_eq!(record.room_count(), 4);

    // The final snapshot holds the same collection as the log
    assert_eq!(read_snapshot(&config), records);
}

#[tokio::test]
async fn test_card_price_kept_when_detail_has_none() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&server, Category::Sale, 1, &[8]).await;

    // Oddly typed surface, no price in the payload, large plot in the table
    let detail = r#"<html><head><script>
        window.classified = {"property": {"type": "HOUSE", "netHabitableSurface": "180"}};
        </script></head><body>
        <table class="classified-table">
            <tr><th>Surface of the plot</th><td>1,250 m² square meters</td></tr>
        </table>
        </body></html>"#;
    Mock::given(method("GET"))
        .and(path(detail_href(Category::Sale, 8)))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), &dir, vec![Category::Sale], 1);
    let summary = Harvester::new(config.clone(), true)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.records_written, 1);

    let records = read_log(&config);
    assert_eq!(records[0].price, Some(190_008));
    assert_eq!(records[0].surface_livable_space, Some(180));
    assert_eq!(records[0].surface_land, Some(1250));
}

#[tokio::test]
async fn test_duplicate_cards_are_stored_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&server, Category::Sale, 1, &[1, 2, 3, 2]).await;
    mount_details(&server, Category::Sale).await;

    let config = create_test_config(&server.uri(), &dir, vec![Category::Sale], 1);
    let summary = Harvester::new(config.clone(), true)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.duplicates_skipped, 1);
    assert_eq!(read_log(&config).len(), 3);
}

#[tokio::test]
async fn test_failed_listings_are_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&server, Category::Sale, 1, &[1, 2, 3, 4]).await;

    // Listing 2 is gone, listing 3 errors, listing 4 has no payload
    Mock::given(method("GET"))
        .and(path(detail_href(Category::Sale, 2)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(detail_href(Category::Sale, 3)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(detail_href(Category::Sale, 4)))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Removed</body></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(detail_href(Category::Sale, 1)))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(1)))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), &dir, vec![Category::Sale], 1);
    let summary = Harvester::new(config.clone(), true)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.records_written, 1);
    assert_eq!(summary.errors, 3);
    assert_eq!(summary.categories[0].details_failed, 3);

    let records = read_log(&config);
    assert_eq!(records.len(), 1);
    assert!(records[0].url().ends_with("/9000/1"));
}

#[tokio::test]
async fn test_failing_index_page_does_not_stall() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(format!("{}/for-sale", SEARCH_PATH)))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    mount_index(&server, Category::Sale, 2, &[5]).await;
    mount_details(&server, Category::Sale).await;

    let config = create_test_config(&server.uri(), &dir, vec![Category::Sale], 2);
    let summary = Harvester::new(config, true).unwrap().run().await.unwrap();

    let report = &summary.categories[0];
    assert_eq!(report.final_state, PaginationState::Exhausted);
    assert_eq!(report.page_failures, 1);
    assert_eq!(report.pages_processed, 1);
    assert_eq!(summary.records_written, 1);
}

#[tokio::test]
async fn test_categories_run_in_order_with_rent_price_type() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&server, Category::Sale, 1, &[1]).await;
    Mock::given(method("GET"))
        .and(path(format!("{}/for-rent", SEARCH_PATH)))
        .and(query_param("page", "1"))
        .and(query_param("priceType", "MONTHLY_RENTAL_PRICE"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_page(Category::Rent, &[2])))
        .expect(1)
        .mount(&server)
        .await;
    mount_details(&server, Category::Sale).await;
    mount_details(&server, Category::Rent).await;

    let config = create_test_config(
        &server.uri(),
        &dir,
        vec![Category::Sale, Category::Rent],
        1,
    );
    let summary = Harvester::new(config.clone(), true)
        .unwrap()
        .run()
        .await
        .unwrap();

    let order: Vec<Category> = summary.categories.iter().map(|c| c.category).collect();
    assert_eq!(order, vec![Category::Sale, Category::Rent]);
    assert_eq!(summary.records_written, 2);

    let records = read_log(&config);
    assert!(records[0].url().contains("/for-sale/"));
    assert!(records[1].url().contains("/for-rent/"));
}

#[tokio::test]
async fn test_resume_does_not_duplicate_records() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&server, Category::Sale, 1, &[1, 2, 3]).await;
    mount_details(&server, Category::Sale).await;

    let config = create_test_config(&server.uri(), &dir, vec![Category::Sale], 1);

    let first = Harvester::new(config.clone(), true)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(first.records_written, 3);

    let second = Harvester::new(config.clone(), false)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(second.records_written, 0);
    assert_eq!(second.duplicates_skipped, 3);
    assert_eq!(second.total_records, 3);

    assert_eq!(read_log(&config).len(), 3);
    assert_eq!(read_snapshot(&config).len(), 3);
}

#[tokio::test]
async fn test_csv_export_after_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&server, Category::Sale, 1, &[1, 2]).await;
    mount_details(&server, Category::Sale).await;

    let config = create_test_config(&server.uri(), &dir, vec![Category::Sale], 1);
    Harvester::new(config.clone(), true)
        .unwrap()
        .run()
        .await
        .unwrap();

    let rows = export_csv(&config.output.records_path, &config.output.csv_path).unwrap();
    assert_eq!(rows, 2);

    let content = std::fs::read_to_string(&config.output.csv_path).unwrap();
    let header = content.lines().next().unwrap();
    assert!(header.starts_with("url,zip_code,locality,price,"));
    assert!(header.contains("rooms_bedrooms_count"));
    assert_eq!(content.lines().count(), 3);
}

#[tokio::test]
async fn test_unused_paths_are_not_requested() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&server, Category::Sale, 1, &[]).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/en/classified/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), &dir, vec![Category::Sale], 1);
    let summary = Harvester::new(config, true).unwrap().run().await.unwrap();

    assert_eq!(summary.records_written, 0);
    assert_eq!(summary.categories[0].listings_found, 0);
}
