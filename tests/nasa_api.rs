use chrono::NaiveDate;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use mars_rover_story::config::Config;
use mars_rover_story::explorer::Explorer;
use mars_rover_story::filters::PhotoFilter;
use mars_rover_story::mars_client::{MarsPhotosClient, PhotoSource};
use mars_rover_story::session::{MemorySessionStore, SessionStore, ROVER_DATA_KEY};
use mars_rover_story::{Error, SourceError};

const API_KEY: &str = "test-key";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn config(server: &ServerGuard) -> Config {
    let mut config = Config::for_base_url(server.url());
    config.api_key = API_KEY.to_string();
    config
}

fn photo_json(id: u64, rover: &str, camera: &str, earth_date: &str) -> Value {
    json!({
        "id": id,
        "sol": 1000,
        "camera": {"id": 20, "name": "CAM", "rover_id": 5, "full_name": camera},
        "img_src": format!("https://mars.nasa.gov/{id}.jpg"),
        "earth_date": earth_date,
        "rover": {"id": 5, "name": rover, "landing_date": "2012-08-06", "status": "active"}
    })
}

async fn mock_rovers(server: &mut ServerGuard, status: usize, expected_requests: usize) -> Mock {
    let body = json!({
        "rovers": [
            {"id": 5, "name": "Curiosity", "landing_date": "2012-08-06", "launch_date": "2011-11-26",
             "status": "active", "max_sol": 4102, "max_date": "2024-01-01", "total_photos": 695670}
        ]
    });
    server
        .mock("GET", "/rovers")
        .match_query(Matcher::UrlEncoded("api_key".into(), API_KEY.into()))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(expected_requests)
        .create_async()
        .await
}

async fn mock_photos(
    server: &mut ServerGuard,
    rover: &str,
    earth_date: &str,
    photos: Vec<Value>,
    expected_requests: usize,
) -> Mock {
    server
        .mock("GET", format!("/rovers/{rover}/photos").as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("earth_date".into(), earth_date.into()),
            Matcher::UrlEncoded("api_key".into(), API_KEY.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "photos": photos }).to_string())
        .expect(expected_requests)
        .create_async()
        .await
}

fn explorer(server: &ServerGuard) -> Explorer<MarsPhotosClient> {
    let config = config(server);
    let client = MarsPhotosClient::new(&config).unwrap();
    Explorer::new(client, Box::new(MemorySessionStore::new()), &config)
}

#[tokio::test]
async fn nearby_date_is_found_through_the_http_client() {
    let mut server = Server::new_async().await;
    let rovers = mock_rovers(&mut server, 200, 1).await;
    let requested = mock_photos(&mut server, "curiosity", "2015-06-01", vec![], 1).await;
    let plus_one = mock_photos(&mut server, "curiosity", "2015-06-02", vec![], 1).await;
    let minus_one = mock_photos(&mut server, "curiosity", "2015-05-31", vec![], 1).await;
    let found = mock_photos(
        &mut server,
        "curiosity",
        "2015-06-03",
        (1..=4)
            .map(|id| photo_json(id, "Curiosity", "Mast Camera", "2015-06-03"))
            .collect(),
        1,
    )
    .await;
    let minus_two = mock_photos(&mut server, "curiosity", "2015-05-30", vec![], 0).await;

    let explorer = explorer(&server);
    let resolution = explorer
        .resolve(date(2015, 6, 1), &PhotoFilter::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resolution.resolved_date, date(2015, 6, 3));
    assert_eq!(resolution.photos.len(), 4);
    assert!(resolution
        .photos
        .iter()
        .all(|p| p.earth_date == date(2015, 6, 3)));

    rovers.assert_async().await;
    requested.assert_async().await;
    plus_one.assert_async().await;
    minus_one.assert_async().await;
    found.assert_async().await;
    minus_two.assert_async().await;
}

#[tokio::test]
async fn filters_narrow_the_requested_date() {
    let mut server = Server::new_async().await;
    let _rovers = mock_rovers(&mut server, 200, 1).await;
    let _photos = mock_photos(
        &mut server,
        "curiosity",
        "2015-06-01",
        vec![
            photo_json(1, "Curiosity", "Front Hazard Avoidance Camera", "2015-06-01"),
            photo_json(2, "Curiosity", "Mast Camera", "2015-06-01"),
            photo_json(3, "Curiosity", "Rear Hazard Avoidance Camera", "2015-06-01"),
        ],
        1,
    )
    .await;

    let explorer = explorer(&server);
    let filter = PhotoFilter::new(Some("Curiosity".into()), Some("HAZARD".into()));
    let resolution = explorer
        .resolve(date(2015, 6, 1), &filter, &CancellationToken::new())
        .await
        .unwrap();

    let ids: Vec<_> = resolution.photos.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(resolution.is_exact());
}

#[tokio::test]
async fn out_of_range_date_never_queries_photos() {
    let mut server = Server::new_async().await;
    let _rovers = mock_rovers(&mut server, 200, 1).await;
    let photos = server
        .mock("GET", Matcher::Regex(r"^/rovers/.+/photos".into()))
        .expect(0)
        .create_async()
        .await;

    let explorer = explorer(&server);
    let err = explorer
        .resolve(date(2030, 1, 1), &PhotoFilter::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        Error::DateOutOfRange { min, max } => {
            assert_eq!(min, date(2012, 8, 6));
            assert_eq!(max, date(2024, 1, 1));
        }
        other => panic!("expected DateOutOfRange, got {other:?}"),
    }
    photos.assert_async().await;
}

#[tokio::test]
async fn error_status_surfaces_as_source_unavailable() {
    let mut server = Server::new_async().await;
    let _rovers = mock_rovers(&mut server, 200, 1).await;
    let _photos = server
        .mock("GET", "/rovers/curiosity/photos")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let explorer = explorer(&server);
    let err = explorer
        .resolve(date(2015, 6, 1), &PhotoFilter::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SourceUnavailable(SourceError::Status(503))));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn failed_rover_listing_is_retried_on_next_use() {
    let mut server = Server::new_async().await;
    let rovers = mock_rovers(&mut server, 500, 2).await;

    let explorer = explorer(&server);
    for _ in 0..2 {
        let err = explorer.registry().await.unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(SourceError::Status(500))));
    }

    rovers.assert_async().await;
}

#[tokio::test]
async fn registry_is_cached_in_the_session_store() {
    let mut server = Server::new_async().await;
    let rovers = mock_rovers(&mut server, 200, 1).await;
    let config = config(&server);
    let client = MarsPhotosClient::new(&config).unwrap();
    let session = MemorySessionStore::new();

    let registry = mars_rover_story::registry::RoverRegistry::load(&client, &session)
        .await
        .unwrap();
    let again = mars_rover_story::registry::RoverRegistry::load(&client, &session)
        .await
        .unwrap();

    assert_eq!(registry, again);
    assert_eq!(
        session.get(ROVER_DATA_KEY).as_deref(),
        Some(r#"{"curiosity":{"minDate":"2012-08-06","maxDate":"2024-01-01"}}"#)
    );
    rovers.assert_async().await;
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let mut server = Server::new_async().await;
    let _rovers = server
        .mock("GET", "/rovers")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let client = MarsPhotosClient::new(&config(&server)).unwrap();
    let err = client.list_rovers().await.unwrap_err();

    assert!(matches!(err, SourceError::Decode(_)));
}
