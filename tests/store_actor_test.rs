use posts_store::mock::{MockPostsSource, MockReloadSource};
use posts_store::model::{Post, PostMetadata};
use posts_store::reload::{ListenerStats, ReloadEvent, ReloadListener};
use posts_store::source::FetchError;
use posts_store::store::{PostsActor, PostsClient, StorePhase};
use std::time::Duration;
use tokio::sync::oneshot;

fn post(slug: &str, content: &str) -> Post {
    Post::new(slug, content).with_metadata(PostMetadata {
        title: format!("Title {slug}"),
        date: "2024-01-01".into(),
        tags: vec![],
        description: "D".into(),
    })
}

fn spawn_actor(mock: &MockPostsSource) -> (PostsClient, tokio::task::JoinHandle<()>) {
    let (actor, client) = PostsActor::new(8);
    let handle = tokio::spawn(actor.run(mock.source()));
    (client, handle)
}

/// Waits until the mock has seen `n` fetches, so deferred answers pair up with
/// fetches in issue order.
async fn wait_calls(mock: &MockPostsSource, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while mock.calls() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("fetch was not issued");
}

/// Success, then a server failure: the snapshot survives and the error slot is set.
#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let mock = MockPostsSource::new();
    mock.expect_fetch().return_ok(vec![post("a", "C")]);
    mock.expect_fetch().return_status(500);
    let (client, _handle) = spawn_actor(&mock);

    assert_eq!(client.refresh().await.unwrap(), 1);
    let state = client.wait_for_revision(1).await.unwrap();
    assert_eq!(state.posts(), &[post("a", "C")]);
    assert!(!state.is_loading());
    assert_eq!(state.error(), None);
    assert_eq!(state.phase(), StorePhase::Ready);

    client.refresh().await.unwrap();
    let state = client.wait_for_revision(2).await.unwrap();
    assert_eq!(state.posts(), &[post("a", "C")]);
    assert_eq!(state.error(), Some("Failed to fetch posts"));
    assert!(!state.is_loading());
    assert_eq!(state.phase(), StorePhase::Errored);

    mock.verify();
}

/// Two fetches in flight; the newer resolves first. The older result arrives
/// last and is discarded.
#[tokio::test]
async fn superseded_fetch_is_discarded() {
    let mock = MockPostsSource::new();
    let first = mock.expect_fetch().deferred();
    let second = mock.expect_fetch().deferred();
    let (client, _handle) = spawn_actor(&mock);

    assert_eq!(client.refresh().await.unwrap(), 1);
    wait_calls(&mock, 1).await;
    assert_eq!(client.refresh().await.unwrap(), 2);
    wait_calls(&mock, 2).await;

    second.resolve_ok(vec![post("s1", "newer")]);
    client.wait_for_revision(2).await.unwrap();

    first.resolve_ok(vec![post("s0", "older")]);
    assert_eq!(client.settle().await.unwrap(), 2);

    let state = client.state();
    assert_eq!(state.posts(), &[post("s1", "newer")]);
    assert_eq!(state.revision(), 2);
    assert_eq!(mock.calls(), 2);
}

/// A stale failure arriving after a newer success must not set the error slot.
#[tokio::test]
async fn superseded_failure_does_not_set_error() {
    let mock = MockPostsSource::new();
    let first = mock.expect_fetch().deferred();
    mock.expect_fetch().return_ok(vec![post("a", "C")]);
    let (client, _handle) = spawn_actor(&mock);

    client.refresh().await.unwrap();
    wait_calls(&mock, 1).await;
    client.refresh().await.unwrap();
    client.wait_for_revision(2).await.unwrap();

    first.resolve_err(FetchError::Network("connection reset".into()));
    client.settle().await.unwrap();

    let state = client.state();
    assert_eq!(state.error(), None);
    assert_eq!(state.posts().len(), 1);
}

/// Loading only covers the first fetch; a reload in progress leaves it false.
#[tokio::test]
async fn loading_is_not_reset_by_later_fetches() {
    let mock = MockPostsSource::new();
    let initial = mock.expect_fetch().deferred();
    let reload = mock.expect_fetch().deferred();
    let (client, _handle) = spawn_actor(&mock);

    assert!(client.state().is_loading());
    assert_eq!(client.state().phase(), StorePhase::Uninitialized);

    client.refresh().await.unwrap();
    assert!(client.state().is_loading());
    assert_eq!(client.state().phase(), StorePhase::Loading);

    initial.resolve_ok(vec![post("a", "C")]);
    client.wait_for_revision(1).await.unwrap();
    assert!(!client.state().is_loading());

    client.refresh().await.unwrap();
    assert!(!client.state().is_loading());
    assert_eq!(client.state().phase(), StorePhase::Ready);

    reload.resolve_ok(vec![]);
    let state = client.wait_for_revision(2).await.unwrap();
    assert!(!state.is_loading());
    assert!(state.posts().is_empty());
}

/// `reload` triggers exactly one fetch; other payloads and named events none.
#[tokio::test]
async fn listener_only_reacts_to_reload_payload() {
    let posts = MockPostsSource::new();
    posts.expect_fetch().return_ok(vec![post("a", "C")]);
    let (client, _handle) = spawn_actor(&posts);

    let reload = MockReloadSource::new();
    let channel = reload.open();
    channel.send("ping");
    channel.send_event(ReloadEvent {
        event: "notice".into(),
        data: "reload".into(),
        id: None,
    });
    channel.send("reload");
    channel.send("reloaded");
    channel.close();

    let stats = ReloadListener::new(reload.source(), client.clone())
        .run()
        .await;
    assert_eq!(stats.connections, 1);
    assert_eq!(stats.events, 4);
    assert_eq!(stats.reloads, 1);

    assert_eq!(client.settle().await.unwrap(), 1);
    assert_eq!(posts.calls(), 1);
    posts.verify();
}

/// The listener reconnects after the stream drops and keeps reacting.
#[tokio::test]
async fn listener_reconnects_after_disconnect() {
    let posts = MockPostsSource::new();
    posts.expect_fetch().return_ok(vec![post("a", "C")]);
    posts.expect_fetch().return_ok(vec![post("b", "D")]);
    let (client, _handle) = spawn_actor(&posts);

    let reload = MockReloadSource::new();
    let first = reload.open();
    first.send("reload");
    first.fail(posts_store::reload::ReloadError::Stream("reset".into()));
    let second = reload.open();
    second.send("reload");

    let listener = tokio::spawn(
        ReloadListener::new(reload.source(), client.clone())
            .with_reconnect_delay(Some(Duration::from_millis(10)))
            .run(),
    );

    let state = tokio::time::timeout(Duration::from_secs(5), client.wait_for_revision(2))
        .await
        .expect("second reload was not applied")
        .unwrap();
    assert_eq!(state.get_post("b").map(|p| p.content.clone()), Some("D".into()));
    assert!(reload.connects() >= 2);

    listener.abort();
    drop(second);
}

/// A server `retry:` hint replaces the configured delay.
#[tokio::test]
async fn listener_honours_retry_hint() {
    let posts = MockPostsSource::new();
    posts.expect_fetch().return_ok(vec![]);
    let (client, _handle) = spawn_actor(&posts);

    let reload = MockReloadSource::new();
    reload
        .open_with_retry(Some(Duration::from_millis(5)))
        .close();
    let next = reload.open();
    next.send("reload");

    let listener = tokio::spawn(
        ReloadListener::new(reload.source(), client.clone())
            .with_reconnect_delay(Some(Duration::from_secs(3600)))
            .run(),
    );

    tokio::time::timeout(Duration::from_secs(5), client.wait_for_revision(1))
        .await
        .expect("retry hint was ignored")
        .unwrap();
    assert_eq!(reload.connects(), 2);

    listener.abort();
}

/// Without reconnection a failed connect ends the listener immediately.
#[tokio::test]
async fn listener_without_reconnect_stops_on_connect_failure() {
    let posts = MockPostsSource::new();
    let (client, _handle) = spawn_actor(&posts);
    let reload = MockReloadSource::new();

    let stats = ReloadListener::new(reload.source(), client).run().await;
    assert_eq!(stats.connections, 0);
    assert_eq!(reload.connects(), 1);
    assert_eq!(posts.calls(), 0);
}

/// The shutdown signal ends a connected listener and hands back its counters.
#[tokio::test]
async fn listener_stops_on_shutdown_signal() {
    let posts = MockPostsSource::new();
    posts.expect_fetch().return_ok(vec![post("a", "C")]);
    let (client, _handle) = spawn_actor(&posts);

    let reload = MockReloadSource::new();
    let channel = reload.open();
    channel.send("reload");

    let (stop, stopped) = oneshot::channel();
    let listener = tokio::spawn(
        ReloadListener::new(reload.source(), client.clone())
            .with_reconnect_delay(Some(Duration::from_secs(3600)))
            .with_shutdown(stopped)
            .run(),
    );
    client.wait_for_revision(1).await.unwrap();

    stop.send(()).unwrap();
    let stats = tokio::time::timeout(Duration::from_secs(5), listener)
        .await
        .expect("listener ignored shutdown")
        .unwrap();
    assert_eq!(
        stats,
        ListenerStats {
            connections: 1,
            events: 1,
            reloads: 1,
        }
    );
    drop(channel);
}

/// Shutdown also interrupts the wait between reconnect attempts.
#[tokio::test]
async fn listener_stops_while_waiting_to_reconnect() {
    let posts = MockPostsSource::new();
    let (client, _handle) = spawn_actor(&posts);
    let reload = MockReloadSource::new();

    let (stop, stopped) = oneshot::channel();
    let listener = tokio::spawn(
        ReloadListener::new(reload.source(), client)
            .with_reconnect_delay(Some(Duration::from_secs(3600)))
            .with_shutdown(stopped)
            .run(),
    );
    drop(stop);

    let stats = tokio::time::timeout(Duration::from_secs(5), listener)
        .await
        .expect("listener kept waiting")
        .unwrap();
    assert_eq!(stats.connections, 0);
    assert!(reload.connects() <= 1);
}

/// Dropping every client ends the actor loop.
#[tokio::test]
async fn actor_stops_when_clients_are_dropped() {
    let mock = MockPostsSource::new();
    let (client, handle) = spawn_actor(&mock);
    drop(client);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("actor did not stop")
        .unwrap();
}
