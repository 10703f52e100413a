use std::collections::BTreeSet;

/// Сигнал инвалидации кэша для окружающих страниц после мутации.
pub trait MutationNotifier: Send + Sync {
    fn notify_mutated(&self, paths: &BTreeSet<String>);
}
