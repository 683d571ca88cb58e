//! Storage of the loaded datasets.
//!
//! Views and panels keep [`Handle`]s to datasets and look them up here
//! when they need them; the arena is the only owner.

use crate::dataset::BsdfDataset;
use base::utils::Handle;
use std::collections::HashMap;

/// Datasets indexed by handle, in insertion order, with at most one of them
/// selected.
#[derive(Default)]
pub struct DatasetArena {
    datasets: HashMap<Handle<BsdfDataset>, BsdfDataset>,
    /// Handles in insertion order.
    order: Vec<Handle<BsdfDataset>>,
    selected: Option<Handle<BsdfDataset>>,
}

impl DatasetArena {
    /// Creates an empty arena.
    pub fn new() -> Self { Self::default() }

    /// Stores a dataset and returns its handle.
    pub fn insert(&mut self, dataset: BsdfDataset) -> Handle<BsdfDataset> {
        let handle = Handle::new();
        log::debug!("[DatasetArena] Inserting {} as {}", dataset.metadata().name, handle);
        self.datasets.insert(handle, dataset);
        self.order.push(handle);
        handle
    }

    /// Returns the dataset referenced by `handle`.
    pub fn get(&self, handle: Handle<BsdfDataset>) -> Option<&BsdfDataset> {
        self.datasets.get(&handle)
    }

    /// Returns the dataset referenced by `handle` mutably.
    pub fn get_mut(&mut self, handle: Handle<BsdfDataset>) -> Option<&mut BsdfDataset> {
        self.datasets.get_mut(&handle)
    }

    /// Removes a dataset. Clears the selection if it was the selected one.
    pub fn remove(&mut self, handle: Handle<BsdfDataset>) -> Option<BsdfDataset> {
        let dataset = self.datasets.remove(&handle)?;
        self.order.retain(|h| *h != handle);
        if self.selected == Some(handle) {
            self.selected = None;
        }
        Some(dataset)
    }

    /// Whether `handle` references a stored dataset.
    pub fn contains(&self, handle: Handle<BsdfDataset>) -> bool {
        self.datasets.contains_key(&handle)
    }

    /// Handles of every dataset, in insertion order.
    pub fn handles(&self) -> &[Handle<BsdfDataset>] { &self.order }

    /// Iterates over the datasets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<BsdfDataset>, &BsdfDataset)> {
        self.order
            .iter()
            .filter_map(|h| self.datasets.get(h).map(|d| (*h, d)))
    }

    /// Number of datasets.
    pub fn len(&self) -> usize { self.order.len() }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    /// Selects the dataset referenced by `handle`, or clears the selection
    /// with `None`. Returns `false` for a handle the arena does not know,
    /// leaving the selection unchanged.
    pub fn select(&mut self, handle: Option<Handle<BsdfDataset>>) -> bool {
        match handle {
            Some(h) if !self.contains(h) => {
                log::warn!("[DatasetArena] Cannot select unknown dataset {}", h);
                false
            },
            _ => {
                self.selected = handle;
                true
            },
        }
    }

    /// Handle of the selected dataset.
    pub fn selected(&self) -> Option<Handle<BsdfDataset>> { self.selected }

    /// The selected dataset.
    pub fn selected_dataset(&self) -> Option<&BsdfDataset> { self.get(self.selected?) }

    /// The selected dataset, mutably.
    pub fn selected_mut(&mut self) -> Option<&mut BsdfDataset> {
        let handle = self.selected?;
        self.get_mut(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{source::AnalyticSource, PipelineConfig};

    fn dataset(name: &str) -> BsdfDataset {
        BsdfDataset::new(
            Box::new(AnalyticSource::new(name, Default::default())),
            PipelineConfig::default(),
        )
    }

    #[test]
    fn insertion_order_and_lookup() {
        let mut arena = DatasetArena::new();
        assert!(arena.is_empty());
        let a = arena.insert(dataset("a"));
        let b = arena.insert(dataset("b"));
        let c = arena.insert(dataset("c"));
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.handles(), &[a, b, c]);
        let names = arena
            .iter()
            .map(|(_, d)| d.metadata().name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a", "b", "c"]);

        assert_eq!(arena.remove(b).unwrap().metadata().name, "b");
        assert!(arena.remove(b).is_none());
        assert!(arena.get(b).is_none());
        assert_eq!(arena.handles(), &[a, c]);
        assert_eq!(arena.get(c).unwrap().metadata().name, "c");
        assert!(arena.get(Handle::invalid()).is_none());
    }

    #[test]
    fn selection_follows_removal() {
        let mut arena = DatasetArena::new();
        let a = arena.insert(dataset("a"));
        let b = arena.insert(dataset("b"));
        assert!(arena.selected().is_none());
        assert!(!arena.select(Some(Handle::new())));
        assert!(arena.select(Some(b)));
        assert_eq!(arena.selected(), Some(b));
        arena.selected_mut().unwrap().init().unwrap();
        assert_eq!(arena.selected_dataset().unwrap().generation_id(), 1);
        assert_eq!(arena.get(a).unwrap().generation_id(), 0);

        arena.remove(a);
        assert_eq!(arena.selected(), Some(b));
        arena.remove(b);
        assert!(arena.selected().is_none());
        assert!(arena.selected_mut().is_none());
    }
}
