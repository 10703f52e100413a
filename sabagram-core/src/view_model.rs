//! Экранная проекция постов: пост + множество лайков + превью комментариев.
//!
//! Каждый экран (лента, сетка профиля, диалог поста) владеет своей
//! коллекцией. Координаторы получают `CollectionHandle` всех живых
//! коллекций и явно публикуют в них изменения; общего кэша между
//! экранами нет.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::domain::ids::{PostId, UserId};
use crate::domain::interaction::Comment;
use crate::domain::post::Post;

pub type CollectionHandle = Arc<PostCollection>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Feed,
    Discover,
    ProfileGrid,
    Liked,
    PostDialog,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEntry {
    pub post: Post,
    pub likes: BTreeSet<UserId>,
    pub comments_preview: Vec<Comment>,
}

impl PostEntry {
    pub fn new(post: Post) -> Self {
        Self {
            post,
            likes: BTreeSet::new(),
            comments_preview: Vec::new(),
        }
    }

    pub fn likes_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: UserId) -> bool {
        self.likes.contains(&user_id)
    }
}

#[derive(Debug, Default)]
struct Entries {
    order: Vec<PostId>,
    by_id: HashMap<PostId, PostEntry>,
}

impl Entries {
    fn remove(&mut self, post_id: PostId) -> Option<PostEntry> {
        let removed = self.by_id.remove(&post_id)?;
        self.order.retain(|id| *id != post_id);
        Some(removed)
    }
}

#[derive(Debug)]
pub struct PostCollection {
    kind: CollectionKind,
    alive: AtomicBool,
    entries: Mutex<Entries>,
}

impl PostCollection {
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            alive: AtomicBool::new(true),
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn handle(kind: CollectionKind) -> CollectionHandle {
        Arc::new(Self::new(kind))
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Помечает коллекцию закрытой (экран разобран). Поздние результаты
    /// сетевых вызовов после этого не применяются.
    pub fn close(&self) {
        self.alive.store(false, Ordering::Release);
    }

    // Отравленный мьютекс не ломает экран: данные внутри остаются
    // согласованными, так как все мутации ниже не паникуют посередине.
    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn live_entries(&self) -> Option<MutexGuard<'_, Entries>> {
        if !self.is_alive() {
            debug!(kind = ?self.kind, "collection closed, skipping update");
            return None;
        }
        Some(self.entries())
    }

    /// Идемпотентно выставляет членство `user_id` в лайках поста.
    ///
    /// Возвращает `true`, только если состояние действительно изменилось.
    pub fn apply_like_delta(&self, post_id: PostId, user_id: UserId, liked: bool) -> bool {
        let Some(mut entries) = self.live_entries() else {
            return false;
        };
        let Some(entry) = entries.by_id.get_mut(&post_id) else {
            return false;
        };

        if liked {
            entry.likes.insert(user_id)
        } else {
            entry.likes.remove(&user_id)
        }
    }

    /// Заменяет превью комментариев поста целиком.
    pub fn replace_comments_preview(&self, post_id: PostId, preview: Vec<Comment>) -> bool {
        let Some(mut entries) = self.live_entries() else {
            return false;
        };
        match entries.by_id.get_mut(&post_id) {
            Some(entry) => {
                entry.comments_preview = preview;
                true
            }
            None => false,
        }
    }

    /// Добавляет пост в начало коллекции или обновляет данные уже
    /// известного поста, сохраняя его лайки и превью.
    pub fn upsert(&self, post: Post) {
        let Some(mut entries) = self.live_entries() else {
            return;
        };
        match entries.by_id.get_mut(&post.id) {
            Some(entry) => entry.post = post,
            None => {
                entries.order.insert(0, post.id);
                entries.by_id.insert(post.id, PostEntry::new(post));
            }
        }
    }

    /// Заменяет содержимое коллекции свежей загрузкой в заданном порядке.
    pub fn load(&self, loaded: Vec<PostEntry>) {
        let Some(mut entries) = self.live_entries() else {
            return;
        };
        let mut fresh = Entries::default();
        for entry in first_occurrences(loaded) {
            fresh.order.push(entry.post.id);
            fresh.by_id.insert(entry.post.id, entry);
        }
        *entries = fresh;
    }

    /// Вливает загруженные записи, не трогая остальные.
    ///
    /// Известные посты обновляются на своих местах. Новый пост встаёт перед
    /// ближайшим следующим за ним в загрузке известным постом, а если
    /// такого нет, в конец (подгрузка следующей страницы).
    pub fn merge(&self, loaded: Vec<PostEntry>) {
        let Some(mut entries) = self.live_entries() else {
            return;
        };
        let mut anchor = entries.order.len();
        for entry in first_occurrences(loaded).into_iter().rev() {
            let id = entry.post.id;
            if let Some(existing) = entries.by_id.get_mut(&id) {
                *existing = entry;
                if let Some(position) = entries.order.iter().position(|known| *known == id) {
                    anchor = position;
                }
            } else {
                entries.order.insert(anchor, id);
                entries.by_id.insert(id, entry);
            }
        }
    }

    /// Удаляет все посты, которых нет в авторитетном наборе `live_ids`.
    /// Возвращает идентификаторы удалённых постов.
    pub fn remove_if_absent(&self, live_ids: &BTreeSet<PostId>) -> Vec<PostId> {
        let Some(mut entries) = self.live_entries() else {
            return Vec::new();
        };
        let stale: Vec<PostId> = entries
            .order
            .iter()
            .copied()
            .filter(|id| !live_ids.contains(id))
            .collect();
        for id in &stale {
            entries.remove(*id);
        }
        stale
    }

    pub fn remove(&self, post_id: PostId) -> Option<PostEntry> {
        self.live_entries()?.remove(post_id)
    }

    pub fn contains(&self, post_id: PostId) -> bool {
        self.entries().by_id.contains_key(&post_id)
    }

    pub fn get(&self, post_id: PostId) -> Option<PostEntry> {
        self.entries().by_id.get(&post_id).cloned()
    }

    pub fn likes_of(&self, post_id: PostId) -> Option<BTreeSet<UserId>> {
        self.entries()
            .by_id
            .get(&post_id)
            .map(|entry| entry.likes.clone())
    }

    pub fn is_liked(&self, post_id: PostId, user_id: UserId) -> Option<bool> {
        self.entries()
            .by_id
            .get(&post_id)
            .map(|entry| entry.is_liked_by(user_id))
    }

    pub fn post_ids(&self) -> Vec<PostId> {
        self.entries().order.clone()
    }

    pub fn snapshot(&self) -> Vec<PostEntry> {
        let entries = self.entries();
        entries
            .order
            .iter()
            .filter_map(|id| entries.by_id.get(id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn first_occurrences(loaded: Vec<PostEntry>) -> Vec<PostEntry> {
    let mut seen = BTreeSet::new();
    loaded
        .into_iter()
        .filter(|entry| {
            let first = seen.insert(entry.post.id);
            if !first {
                warn!(post_id = %entry.post.id, "duplicate post in load, keeping first");
            }
            first
        })
        .collect()
}
