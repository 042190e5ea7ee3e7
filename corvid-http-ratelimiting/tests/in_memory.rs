use corvid_http_ratelimiting::{
    headers::{Present, RatelimitHeaders},
    request::Path,
    InMemoryRatelimiter, Ratelimiter,
};

#[tokio::test]
async fn fresh_path_has_no_bucket_until_ticketed() {
    let ratelimiter = InMemoryRatelimiter::new();
    let path = Path::GuildsId(1);

    assert!(!ratelimiter.has(&path).await.unwrap());

    let sender = ratelimiter.wait_for_ticket(path.clone()).await.unwrap();
    sender.headers(Some(RatelimitHeaders::Present(Present {
        bucket: Some("abcd".into()),
        limit: 5,
        remaining: 4,
        reset_after: 1.0,
    })));

    // Give the background queue task a moment to process the report.
    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    assert!(ratelimiter.has(&path).await.unwrap());
    let bucket = ratelimiter.bucket(&path).await.unwrap().unwrap();
    assert_eq!(bucket.limit(), 5);
    assert_eq!(bucket.remaining(), 4);
}

#[tokio::test]
async fn distinct_paths_get_distinct_buckets() {
    let ratelimiter = InMemoryRatelimiter::new();

    let a = ratelimiter
        .wait_for_ticket(Path::GuildsId(1))
        .await
        .unwrap();
    let b = ratelimiter
        .wait_for_ticket(Path::GuildsId(2))
        .await
        .unwrap();

    a.headers(None);
    b.headers(None);

    assert!(ratelimiter.has(&Path::GuildsId(1)).await.unwrap());
    assert!(ratelimiter.has(&Path::GuildsId(2)).await.unwrap());
}
