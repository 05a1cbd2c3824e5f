/// Mock DescriptorBackend for unit tests (no GPU required)
///
/// Hands out increasing non-null handles and records every call so tests
/// can count native pool creations, resets, destructions and updates.
/// Allocating from a full or destroyed pool fails like a native pool would.

use rustc_hash::FxHashMap;
use crate::descriptor::{
    DescriptorBackend, BucketDesc, DescriptorWriteBatch,
    LayoutHandle, PoolHandle, SetHandle,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct MockPool {
    pub desc: BucketDesc,
    pub allocated: u32,
}

#[derive(Debug, Default)]
pub struct MockDescriptorBackend {
    next_handle: u64,
    /// Pools not destroyed yet
    pub live_pools: FxHashMap<PoolHandle, MockPool>,
    /// Every `create_pool` call, in order
    pub created: Vec<BucketDesc>,
    pub resets: Vec<PoolHandle>,
    pub destroyed: Vec<PoolHandle>,
    /// Sets allocated, with the layout they were allocated for
    pub allocated_sets: Vec<(SetHandle, LayoutHandle)>,
    /// Every `update_set` batch, in order
    pub updates: Vec<DescriptorWriteBatch>,
    /// Make the next `create_pool` calls fail
    pub fail_create: bool,
}

impl MockDescriptorBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl DescriptorBackend for MockDescriptorBackend {
    fn create_pool(&mut self, desc: &BucketDesc) -> Result<PoolHandle> {
        if self.fail_create {
            return Err(Error::OutOfMemory);
        }
        let handle = PoolHandle(self.next());
        self.created.push(*desc);
        self.live_pools.insert(handle, MockPool { desc: *desc, allocated: 0 });
        Ok(handle)
    }

    fn reset_pool(&mut self, pool: PoolHandle) -> Result<()> {
        let Some(entry) = self.live_pools.get_mut(&pool) else {
            return Err(Error::InvalidResource(format!("reset of unknown pool {:?}", pool)));
        };
        entry.allocated = 0;
        self.resets.push(pool);
        Ok(())
    }

    fn destroy_pool(&mut self, pool: PoolHandle) {
        assert!(self.live_pools.remove(&pool).is_some(), "double destroy of {:?}", pool);
        self.destroyed.push(pool);
    }

    fn allocate_set(&mut self, pool: PoolHandle, layout: LayoutHandle) -> Result<SetHandle> {
        let Some(entry) = self.live_pools.get_mut(&pool) else {
            return Err(Error::InvalidResource(format!("allocation from unknown pool {:?}", pool)));
        };
        if entry.allocated >= entry.desc.capacity {
            return Err(Error::OutOfMemory);
        }
        entry.allocated += 1;
        let set = SetHandle(self.next());
        self.allocated_sets.push((set, layout));
        Ok(set)
    }

    fn update_set(&mut self, batch: &DescriptorWriteBatch) {
        self.updates.push(batch.clone());
    }
}
