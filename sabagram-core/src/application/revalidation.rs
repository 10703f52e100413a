use std::collections::BTreeSet;

use crate::domain::ids::UserId;

const FEED_PATHS: [&str; 3] = ["/", "/dashboard", "/discover"];

fn feed_paths() -> BTreeSet<String> {
    FEED_PATHS.iter().map(|path| path.to_string()).collect()
}

fn profile_path(user_id: UserId) -> String {
    format!("/profile/{user_id}")
}

pub(crate) fn after_like_toggle() -> BTreeSet<String> {
    let mut paths = feed_paths();
    paths.insert("/liked".to_string());
    paths
}

pub(crate) fn after_comment() -> BTreeSet<String> {
    feed_paths()
}

pub(crate) fn after_post_created(author_id: UserId) -> BTreeSet<String> {
    let mut paths = feed_paths();
    paths.insert(profile_path(author_id));
    paths
}

pub(crate) fn after_post_deleted(author_id: UserId) -> BTreeSet<String> {
    let mut paths = feed_paths();
    paths.insert("/admin".to_string());
    paths.insert(profile_path(author_id));
    paths
}

pub(crate) fn after_profile_updated(user_id: UserId) -> BTreeSet<String> {
    let mut paths = feed_paths();
    paths.insert(profile_path(user_id));
    paths.insert("/settings/profile".to_string());
    paths
}

pub(crate) fn after_moderation() -> BTreeSet<String> {
    BTreeSet::from(["/admin".to_string()])
}
