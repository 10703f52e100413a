use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use sabagram_core::data::post_repository::Pagination;
use sabagram_core::data::repositories::memory::InMemoryStore;
use sabagram_core::domain::interaction::CommentDraft;
use sabagram_core::domain::post::Post;
use sabagram_core::infrastructure::revalidation::RecordingNotifier;
use sabagram_core::{
    CollectionKind, CommentAppendCoordinator, LikeToggleCoordinator, PostCollection, PostId,
    PostService, Session, UserId,
};

fn seeded_store() -> (InMemoryStore, Post) {
    let store = InMemoryStore::new();
    let post = Post::new(
        PostId::new_v4(),
        "https://blob.example/posts/p1.jpg",
        Some("first light".to_string()),
        UserId::new_v4(),
        Utc::now() - Duration::hours(1),
    )
    .expect("sample post must be valid");
    store.insert_post(post.clone()).expect("insert post");
    (store, post)
}

#[tokio::test]
async fn like_toggle_reaches_feed_and_dialog() {
    let (store, p1) = seeded_store();
    let notifier = Arc::new(RecordingNotifier::new());
    let posts = PostService::new(store.clone(), store.clone(), notifier.clone());
    let likes = LikeToggleCoordinator::new(store.clone(), notifier.clone());

    let feed = PostCollection::handle(CollectionKind::Feed);
    posts
        .load_feed(&feed, Pagination::first_page(20))
        .await
        .expect("feed must load");

    // диалог открыт из ленты и держит тот же пост
    let dialog = PostCollection::handle(CollectionKind::PostDialog);
    dialog.load(vec![feed.get(p1.id).expect("p1 in feed")]);
    let views = [feed.clone(), dialog.clone()];

    let u1 = Session::new(UserId::new_v4());

    let first = likes
        .toggle_like(&u1, p1.id, &views)
        .await
        .expect("first toggle");
    assert!(first.liked);
    assert_eq!(feed.likes_of(p1.id), Some(BTreeSet::from([u1.user_id()])));
    assert_eq!(dialog.likes_of(p1.id), Some(BTreeSet::from([u1.user_id()])));
    assert_eq!(
        store.likes_of(p1.id).expect("store likes"),
        BTreeSet::from([u1.user_id()])
    );

    let second = likes
        .toggle_like(&u1, p1.id, &views)
        .await
        .expect("second toggle");
    assert!(!second.liked);
    assert_eq!(feed.likes_of(p1.id), Some(BTreeSet::new()));
    assert_eq!(dialog.likes_of(p1.id), Some(BTreeSet::new()));
    assert!(store.likes_of(p1.id).expect("store likes").is_empty());
}

#[tokio::test]
async fn comment_preview_matches_fresh_load() {
    let (store, p1) = seeded_store();
    let notifier = Arc::new(RecordingNotifier::new());
    let posts = PostService::new(store.clone(), store.clone(), notifier.clone());
    let comments = CommentAppendCoordinator::new(store.clone(), notifier.clone());

    let feed = PostCollection::handle(CollectionKind::Feed);
    posts
        .load_feed(&feed, Pagination::first_page(20))
        .await
        .expect("feed must load");

    let author = Session::new(UserId::new_v4());
    for text in ["one", "two", "three"] {
        let mut draft = CommentDraft::new(text);
        comments
            .submit_draft(&author, p1.id, &mut draft, &[feed.clone()])
            .await
            .expect("comment must be stored");
        assert!(draft.is_blank());
    }

    let fresh = PostCollection::new(CollectionKind::Feed);
    posts
        .load_feed(&fresh, Pagination::first_page(20))
        .await
        .expect("fresh feed must load");

    let shown = feed.get(p1.id).expect("p1 in feed").comments_preview;
    let reloaded = fresh.get(p1.id).expect("p1 in fresh feed").comments_preview;
    assert_eq!(shown.len(), 2);
    assert_eq!(shown, reloaded);

    let thread = comments.load_thread(p1.id).await.expect("thread");
    assert_eq!(thread.len(), 3);
}

#[tokio::test]
async fn like_on_deleted_post_reverts_and_reports_not_found() {
    let (store, p1) = seeded_store();
    let notifier = Arc::new(RecordingNotifier::new());
    let posts = PostService::new(store.clone(), store.clone(), notifier.clone());
    let likes = LikeToggleCoordinator::new(store.clone(), notifier.clone());

    let feed = PostCollection::handle(CollectionKind::Feed);
    posts
        .load_feed(&feed, Pagination::first_page(20))
        .await
        .expect("feed must load");

    // пост удалён автором с другого устройства
    let owner = Session::new(p1.author_id);
    posts
        .delete_post(&owner, p1.id, &[])
        .await
        .expect("owner delete");

    let err = likes
        .toggle_like(&Session::new(UserId::new_v4()), p1.id, &[feed.clone()])
        .await
        .expect_err("post is gone");
    assert!(matches!(err, sabagram_core::DomainError::NotFound(_)));
    assert_eq!(feed.likes_of(p1.id), Some(BTreeSet::new()));
}
