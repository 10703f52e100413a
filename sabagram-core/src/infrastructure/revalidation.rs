use std::collections::BTreeSet;
use std::sync::Mutex;

use tracing::info;

use crate::data::notifier::MutationNotifier;

/// Пишет сигналы инвалидации в лог. Используется, когда рядом нет
/// рендерера страниц, которому их можно отдать.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl MutationNotifier for TracingNotifier {
    fn notify_mutated(&self, paths: &BTreeSet<String>) {
        info!(paths = ?paths, "paths mutated");
    }
}

/// Запоминает все полученные сигналы по порядку.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<BTreeSet<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<BTreeSet<String>> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn was_notified(&self, path: &str) -> bool {
        self.calls().iter().any(|paths| paths.contains(path))
    }
}

impl MutationNotifier for RecordingNotifier {
    fn notify_mutated(&self, paths: &BTreeSet<String>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(paths.clone());
        }
    }
}
