use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::application::revalidation;
use crate::data::interaction_gateway::InteractionGateway;
use crate::data::notifier::MutationNotifier;
use crate::domain::error::DomainError;
use crate::domain::ids::{PostId, UserId};
use crate::domain::interaction::{LikeInsert, ToggleOutcome};
use crate::domain::session::Session;
use crate::view_model::CollectionHandle;

type PairKey = (PostId, UserId);

/// Переключает лайк с мгновенным локальным откликом.
///
/// Порядок: оптимистичный флип во всех переданных коллекциях, вызов
/// бэкенда, затем сверка с ответом сервера или откат при ошибке.
/// Для одной пары `(post, user)` одновременно выполняется не больше
/// одного переключения, повторный вызов отклоняется `ToggleInFlight`.
pub struct LikeToggleCoordinator<G: InteractionGateway> {
    gateway: G,
    notifier: Arc<dyn MutationNotifier>,
    in_flight: Mutex<HashSet<PairKey>>,
}

struct InFlightGuard<'a> {
    pending: &'a Mutex<HashSet<PairKey>>,
    key: PairKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock_pending(self.pending).remove(&self.key);
    }
}

fn lock_pending(pending: &Mutex<HashSet<PairKey>>) -> MutexGuard<'_, HashSet<PairKey>> {
    pending
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<G: InteractionGateway> LikeToggleCoordinator<G> {
    pub fn new(gateway: G, notifier: Arc<dyn MutationNotifier>) -> Self {
        Self {
            gateway,
            notifier,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_in_flight(&self, post_id: PostId, user_id: UserId) -> bool {
        lock_pending(&self.in_flight).contains(&(post_id, user_id))
    }

    fn begin(&self, post_id: PostId, user_id: UserId) -> Result<InFlightGuard<'_>, DomainError> {
        let key = (post_id, user_id);
        if !lock_pending(&self.in_flight).insert(key) {
            debug!(%post_id, %user_id, "toggle already in flight, rejecting");
            return Err(DomainError::ToggleInFlight { post_id, user_id });
        }
        Ok(InFlightGuard {
            pending: &self.in_flight,
            key,
        })
    }

    pub async fn toggle_like(
        &self,
        session: &Session,
        post_id: PostId,
        views: &[CollectionHandle],
    ) -> Result<ToggleOutcome, DomainError> {
        let user_id = session.user_id();
        let _guard = self.begin(post_id, user_id)?;

        let previous: Vec<Option<bool>> = views
            .iter()
            .map(|view| view.is_liked(post_id, user_id))
            .collect();
        let currently_liked = views
            .iter()
            .zip(&previous)
            .filter(|(view, _)| view.is_alive())
            .find_map(|(_, liked)| *liked)
            .unwrap_or(false);

        let optimistic = !currently_liked;
        publish(views, post_id, user_id, optimistic);
        debug!(%post_id, %user_id, liked = optimistic, "optimistic like applied");

        match toggle_remote(&self.gateway, post_id, user_id).await {
            Ok(liked) => {
                publish(views, post_id, user_id, liked);
                if liked != optimistic {
                    info!(%post_id, %user_id, liked, "server state differs from optimistic flip, reconciled");
                }
                self.notifier
                    .notify_mutated(&revalidation::after_like_toggle());
                Ok(ToggleOutcome { liked })
            }
            Err(err) => {
                for (view, liked) in views.iter().zip(previous) {
                    if let Some(liked) = liked {
                        view.apply_like_delta(post_id, user_id, liked);
                    }
                }
                warn!(%post_id, %user_id, error = %err, "like toggle failed, optimistic state reverted");
                Err(err)
            }
        }
    }
}

fn publish(views: &[CollectionHandle], post_id: PostId, user_id: UserId, liked: bool) {
    for view in views {
        view.apply_like_delta(post_id, user_id, liked);
    }
}

/// Переключение на стороне хранилища: вставка лайка, а если он уже
/// существует - удаление. Возвращает итоговое состояние `liked`.
pub(crate) async fn toggle_remote<G>(
    gateway: &G,
    post_id: PostId,
    user_id: UserId,
) -> Result<bool, DomainError>
where
    G: InteractionGateway + ?Sized,
{
    match gateway.create_like(post_id, user_id).await? {
        LikeInsert::Created => Ok(true),
        LikeInsert::AlreadyExisted => {
            gateway.delete_like(post_id, user_id).await?;
            Ok(false)
        }
    }
}
