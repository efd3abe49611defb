//! Handle-based storage for wgpu resources.
//!
//! Delegates refer to GPU objects through copyable [`Handle`]s instead of
//! borrowing them, which keeps resource ownership in one place and lets a
//! model be swapped at runtime without lifetime gymnastics.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Type-safe resource handle.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Handle<T> {
    pub id: u64,
    _phantom: PhantomData<T>,
}

// Hand-written so `Handle<T>` is `Copy` regardless of whether `T` is — the
// only field is `PhantomData<T>`, so `#[derive]`'s spurious `T: Copy`/`T: Clone`
// bounds would otherwise make handles to non-`Copy` resources non-copyable.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Handle<T> {
    /// Allocate a fresh handle id.
    pub fn next() -> Self {
        Self {
            id: HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            _phantom: PhantomData,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Resource kinds the registry can hold.
pub trait RegistryResource: Sized + 'static {
    fn map(registry: &ResourceRegistry) -> &HashMap<u64, Self>;
    fn map_mut(registry: &mut ResourceRegistry) -> &mut HashMap<u64, Self>;
}

macro_rules! registry_resource {
    ($ty:ty, $field:ident) => {
        impl RegistryResource for $ty {
            fn map(registry: &ResourceRegistry) -> &HashMap<u64, Self> {
                &registry.$field
            }
            fn map_mut(registry: &mut ResourceRegistry) -> &mut HashMap<u64, Self> {
                &mut registry.$field
            }
        }
    };
}

/// Registry mapping handles to actual wgpu resources.
#[derive(Default)]
pub struct ResourceRegistry {
    buffers: HashMap<u64, wgpu::Buffer>,
    bind_groups: HashMap<u64, wgpu::BindGroup>,
    bind_group_layouts: HashMap<u64, wgpu::BindGroupLayout>,
    render_pipelines: HashMap<u64, wgpu::RenderPipeline>,
    shader_modules: HashMap<u64, wgpu::ShaderModule>,
}

registry_resource!(wgpu::Buffer, buffers);
registry_resource!(wgpu::BindGroup, bind_groups);
registry_resource!(wgpu::BindGroupLayout, bind_group_layouts);
registry_resource!(wgpu::RenderPipeline, render_pipelines);
registry_resource!(wgpu::ShaderModule, shader_modules);

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a resource and return its handle.
    pub fn insert<T: RegistryResource>(&mut self, resource: T) -> Handle<T> {
        let handle = Handle::next();
        T::map_mut(self).insert(handle.id, resource);
        handle
    }

    /// Look up a resource by handle.
    pub fn get<T: RegistryResource>(&self, handle: Handle<T>) -> Option<&T> {
        T::map(self).get(&handle.id)
    }

    /// Drop a resource. Used when a displayed model is replaced so stale
    /// buffers do not accumulate across loads.
    pub fn remove<T: RegistryResource>(&mut self, handle: Handle<T>) -> Option<T> {
        T::map_mut(self).remove(&handle.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        let a = Handle::<wgpu::Buffer>::next();
        let b = Handle::<wgpu::Buffer>::next();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn lookup_of_unknown_handle_is_none() {
        let registry = ResourceRegistry::new();
        let handle = Handle::<wgpu::Buffer>::next();
        assert!(registry.get(handle).is_none());
    }
}
