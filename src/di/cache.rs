use crate::di::Instance;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};

type Slot = Arc<Mutex<Option<Instance>>>;

/// Instance cache with single-flight construction per name.
///
/// Each name owns a slot; the slot stays locked while its instance is being
/// built, so concurrent first resolves of the same service build it once.
#[derive(Default)]
pub(crate) struct InstanceCache {
    slots: DashMap<String, Slot>,
    created: Mutex<Vec<String>>,
}

impl InstanceCache {
    pub(crate) fn get_or_try_init<F>(&self, name: &str, init: F) -> Result<Instance>
    where
        F: FnOnce() -> Result<Instance>,
    {
        // Clone the slot out so no map shard stays locked during construction.
        let slot = Arc::clone(self.slots.entry(name.to_string()).or_default().value());
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(instance) = guard.as_ref() {
            return Ok(instance.clone());
        }

        let instance = init()?;
        *guard = Some(instance.clone());
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_string());
        Ok(instance)
    }

    /// Removes every cached instance, most recently created first.
    pub(crate) fn drain(&self) -> Vec<(String, Instance)> {
        let created = std::mem::take(
            &mut *self.created.lock().unwrap_or_else(PoisonError::into_inner),
        );

        let mut drained = Vec::with_capacity(created.len());
        for name in created.into_iter().rev() {
            if let Some((_, slot)) = self.slots.remove(&name) {
                let instance = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(instance) = instance {
                    drained.push((name, instance));
                }
            }
        }
        self.slots.clear();
        drained
    }

    pub(crate) fn len(&self) -> usize {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
