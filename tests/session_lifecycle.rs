use futures::TryStreamExt;

use mockito::Server;

use nexusmods::client::{Client, RateLimiter};
use nexusmods::error::Error;

use std::time::Duration;

const MOD_49565: &str = r#"{
    "name": "Nexus Mods API Test",
    "summary": null,
    "description": null,
    "picture_url": null,
    "uid": 429496779165,
    "mod_id": 49565,
    "game_id": 100,
    "allow_rating": false,
    "domain_name": "morrowind",
    "category_id": 15,
    "version": "0.1.0",
    "endorsement_count": 0,
    "created_timestamp": 1618587177,
    "created_time": "2021-04-16T15:32:57.000+00:00",
    "updated_timestamp": 1618587177,
    "updated_time": "2021-04-16T15:32:57.000+00:00",
    "author": "Greatness7",
    "uploaded_by": "Greatness7",
    "uploaded_users_profile_url": "https://nexusmods.com/games/users/64030",
    "contains_adult_content": false,
    "status": "published",
    "available": true
}"#;

fn client(server: &Server) -> Client {
    Client::builder("K", "morrowind")
        .base_url(server.url())
        .rate_limiter(RateLimiter::new(50, Duration::from_secs(3600)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn get_mod_then_close() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/games/morrowind/mods/49565.json")
        .match_header("apikey", "K")
        .with_body(MOD_49565)
        .expect(1)
        .create_async()
        .await;

    let client = client(&server);
    client.open().await.unwrap();

    assert_eq!(client.get_mod(49565).await.unwrap().mod_id, 49565);

    client.close().await.unwrap();
    assert!(matches!(client.get_mod(49565).await, Err(Error::Closed)));

    // the closed client never reached the server
    m.assert_async().await;
}

#[tokio::test]
async fn overlapping_opens() {
    let server = Server::new_async().await;
    let client = client(&server);

    // exactly one of them wins, and its session stays open
    match tokio::join!(client.open(), client.open()) {
        (Ok(()), Err(Error::AlreadyOpen)) | (Err(Error::AlreadyOpen), Ok(())) => {}
        other => panic!("expected a single successful open, got {:?}", other),
    }
    assert!(client.is_open().await);
}

#[tokio::test]
async fn open_close_cycles() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/games/morrowind/mods/49565.json")
        .with_body(MOD_49565)
        .expect(3)
        .create_async()
        .await;

    let client = client(&server);
    assert!(matches!(client.get_mod(49565).await, Err(Error::NotStarted)));

    for _ in 0..3 {
        client.open().await.unwrap();
        assert_eq!(client.get_mod(49565).await.unwrap().mod_id, 49565);
        client.close().await.unwrap();
        assert!(matches!(client.get_mod(49565).await, Err(Error::Closed)));
    }
}

#[tokio::test]
async fn streamed_download_matches_buffered_body() {
    let body: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/cdn/100/49565/archive.zip")
        .with_body(&body)
        .create_async()
        .await;

    let client = Client::builder("K", "morrowind")
        .base_url(server.url())
        .chunk_size(4096)
        .build()
        .unwrap();
    client.open().await.unwrap();

    let link = format!("{}/cdn/100/49565/archive.zip", server.url());
    let buffered = client.get(&link, None).await.unwrap();
    let streamed: Vec<u8> = client
        .stream_download(&link)
        .await
        .unwrap()
        .map_ok(|chunk| chunk.to_vec())
        .try_concat()
        .await
        .unwrap();

    assert_eq!(buffered, body);
    assert_eq!(streamed, body);
}
