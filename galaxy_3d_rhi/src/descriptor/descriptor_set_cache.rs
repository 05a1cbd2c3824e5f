/// DescriptorSetCache - per-layout pooled descriptor sets
///
/// Turns "pipeline layout + current bindings" into a ready-to-bind set
/// handle while issuing as few native calls as possible:
///
/// - one `Pool` per layout, created on first `bind_layout` and sized from
///   the program metadata
/// - each pool keeps one bucket list per frame-in-flight slot; buckets grow
///   geometrically (`base`, `base * factor`, ...) when full
/// - bindings patch a write template; `get_or_create_set` writes the whole
///   template in one batched update, once per set
/// - changing a binding after the set was written allocates a fresh set
///   (copy-on-write), the written one may already be referenced by a draw
/// - `next_frame` recycles the buckets of the slot coming back around;
///   `gc` releases pools unused for `time_to_keep` frames
///
/// The cache lives on the execution thread, inside the context.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::config::Config;
use crate::error::Result;
use crate::descriptor::{
    DescriptorBackend, LayoutHandle, PoolHandle, SetHandle, BucketDesc,
    DescriptorWrite, DescriptorWriteBatch, DescriptorBufferInfo,
};
use crate::rhi::{Buffer, Texture, Sampler, ProgramMeta};
use crate::{engine_debug, engine_warn, engine_fatal};

const LOG_SOURCE: &str = "galaxy3d::descriptor";

/// One native pool able to hold `capacity` sets
#[derive(Debug)]
struct Bucket {
    pool: PoolHandle,
    capacity: u32,
    allocated: u32,
}

impl Bucket {
    fn is_full(&self) -> bool {
        self.allocated >= self.capacity
    }
}

/// All buckets of one layout
#[derive(Debug)]
struct Pool {
    uniform_buffers_per_set: u32,
    images_per_set: u32,
    /// Frame in which the layout was last bound
    last_used: u64,
    /// Bucket lists indexed by frame-in-flight slot
    slots: Vec<Vec<Bucket>>,
}

impl Pool {
    fn bucket_desc(&self, capacity: u32) -> BucketDesc {
        BucketDesc {
            capacity,
            uniform_buffers_per_set: self.uniform_buffers_per_set,
            images_per_set: self.images_per_set,
        }
    }
}

/// Counters exposed for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorCacheStats {
    /// Live pools (one per layout)
    pub pools: usize,
    /// Live native pools across every layout and slot
    pub buckets: usize,
    /// Sets currently allocated from live buckets
    pub allocated_sets: u64,
    /// Batched updates issued since creation
    pub updates_issued: u64,
}

pub struct DescriptorSetCache<B: DescriptorBackend> {
    backend: B,

    frames_in_flight: u32,
    pool_alloc_base: u32,
    pool_alloc_factor: u32,
    release_frequency: u32,
    time_to_keep: u32,

    pools: FxHashMap<LayoutHandle, Pool>,

    bound_layout: LayoutHandle,
    /// Write template of the bound layout; `template.set` is the current set
    template: DescriptorWriteBatch,
    /// Uniform block slot -> template index
    uniform_entries: FxHashMap<u32, usize>,
    /// Sampler location -> (template index of element 0, array size)
    sampler_entries: FxHashMap<u32, (usize, u32)>,
    /// The current set has been written and may be referenced by a draw
    written: bool,

    current_frame: u64,
    frame_slot: u32,
    last_release: u64,
    updates_issued: u64,
}

impl<B: DescriptorBackend> DescriptorSetCache<B> {
    /// Create an empty cache over `backend`
    ///
    /// Fails with `Error::InvalidConfig` when `config` does not validate.
    pub fn new(backend: B, config: &Config) -> Result<Self> {
        config.validate()?;

        let frames_in_flight = config.frames_in_flight;
        let mut time_to_keep = config.time_to_keep;
        if time_to_keep < frames_in_flight {
            engine_warn!(LOG_SOURCE,
                "time_to_keep ({}) is shorter than frames_in_flight ({}), clamped to {}",
                time_to_keep, frames_in_flight, frames_in_flight);
            time_to_keep = frames_in_flight;
        }

        Ok(Self {
            backend,
            frames_in_flight,
            pool_alloc_base: config.pool_alloc_base,
            pool_alloc_factor: config.pool_alloc_factor,
            release_frequency: config.release_frequency,
            time_to_keep,
            pools: FxHashMap::default(),
            bound_layout: LayoutHandle::NULL,
            template: DescriptorWriteBatch::default(),
            uniform_entries: FxHashMap::default(),
            sampler_entries: FxHashMap::default(),
            written: false,
            current_frame: 0,
            frame_slot: 0,
            last_release: 0,
            updates_issued: 0,
        })
    }

    // ===== Binding =====

    /// Make `layout` the target of following bindings
    ///
    /// Creates the layout's pool on first use. Binding the layout that is
    /// already bound keeps the current set.
    pub fn bind_layout(&mut self, layout: LayoutHandle, program: &Arc<ProgramMeta>) {
        if layout.is_null() {
            engine_warn!(LOG_SOURCE,
                "bind_layout: null layout for program '{}', bindings dropped until the next layout",
                program.name);
            self.unbind();
            return;
        }

        if layout == self.bound_layout {
            if let Some(pool) = self.pools.get_mut(&layout) {
                pool.last_used = self.current_frame;
            }
            return;
        }

        self.unbind();
        self.bound_layout = layout;
        self.build_template(program);

        if !program.has_bindings() {
            return;
        }

        let frames_in_flight = self.frames_in_flight as usize;
        let pool = self.pools.entry(layout).or_insert_with(|| {
            engine_debug!(LOG_SOURCE,
                "Created pool for layout {:#x} (program '{}', {} uniform buffers, {} images per set)",
                layout.0, program.name, program.uniform_buffer_count(), program.image_count());
            Pool {
                uniform_buffers_per_set: program.uniform_buffer_count(),
                images_per_set: program.image_count(),
                last_used: 0,
                slots: (0..frames_in_flight).map(|_| Vec::new()).collect(),
            }
        });
        debug_assert!(
            pool.uniform_buffers_per_set == program.uniform_buffer_count()
                && pool.images_per_set == program.image_count(),
            "layout {:#x} bound with program '{}' of a different shape",
            layout.0, program.name
        );
        pool.last_used = self.current_frame;
    }

    /// Bind `size` bytes of `buffer` at `offset` to the uniform block at `index`
    pub fn bind_uniform_buffer(&mut self, buffer: &dyn Buffer, index: u32, offset: u64, size: u64) {
        let Some(&entry) = self.uniform_entries.get(&index) else {
            engine_debug!(LOG_SOURCE,
                "bind_uniform_buffer: no uniform block at slot {} in layout {:#x}, dropped",
                index, self.bound_layout.0);
            return;
        };

        self.allocate_set();
        self.template.writes[entry].buffer_info = DescriptorBufferInfo {
            buffer: buffer.native_handle(),
            offset,
            range: size,
        };
    }

    /// Bind the image view of `texture` to element `array_index` of the sampler at `location`
    pub fn bind_texture(&mut self, texture: &dyn Texture, location: u32, array_index: u32) {
        let Some(entry) = self.sampler_entry("bind_texture", location, array_index) else {
            return;
        };

        self.allocate_set();
        let info = &mut self.template.writes[entry].image_info;
        info.image_view = texture.native_view();
        info.image_layout = texture.image_layout();
    }

    /// Bind `sampler` to element `array_index` of the sampler at `location`
    pub fn bind_sampler(&mut self, sampler: &dyn Sampler, location: u32, array_index: u32) {
        let Some(entry) = self.sampler_entry("bind_sampler", location, array_index) else {
            return;
        };

        self.allocate_set();
        self.template.writes[entry].image_info.sampler = sampler.native_handle();
    }

    /// Return the set holding the current bindings, writing it if needed
    ///
    /// Returns `SetHandle::NULL` when no layout with bindings is bound or
    /// nothing was bound since the layout was.
    pub fn get_or_create_set(&mut self) -> SetHandle {
        if self.template.set.is_null() {
            return SetHandle::NULL;
        }

        if !self.written {
            self.backend.update_set(&self.template);
            self.written = true;
            self.updates_issued += 1;
        }

        self.template.set
    }

    // ===== Frame lifecycle =====

    /// Start a frame: recycle the buckets of the slot coming back around
    ///
    /// The caller must have waited for the GPU to retire the frame that last
    /// used this slot (`frames_in_flight` frames ago).
    pub fn next_frame(&mut self) {
        self.unbind();

        self.frame_slot = (self.current_frame % self.frames_in_flight as u64) as u32;
        let slot = self.frame_slot as usize;
        let factor = self.pool_alloc_factor;

        for (layout, pool) in self.pools.iter_mut() {
            match pool.slots[slot].len() {
                0 => {}
                1 => {
                    let bucket = &mut pool.slots[slot][0];
                    if let Err(e) = self.backend.reset_pool(bucket.pool) {
                        engine_fatal!(LOG_SOURCE, "Failed to reset descriptor pool of layout {:#x}: {}", layout.0, e);
                    }
                    bucket.allocated = 0;
                }
                count => {
                    let capacity = pool.slots[slot][count - 1].capacity.saturating_mul(factor);
                    let desc = pool.bucket_desc(capacity);
                    for bucket in pool.slots[slot].drain(..) {
                        self.backend.destroy_pool(bucket.pool);
                    }
                    let handle = match self.backend.create_pool(&desc) {
                        Ok(handle) => handle,
                        Err(e) => engine_fatal!(LOG_SOURCE,
                            "Failed to create descriptor pool of {} sets for layout {:#x}: {}", capacity, layout.0, e),
                    };
                    pool.slots[slot].push(Bucket { pool: handle, capacity, allocated: 0 });
                    engine_debug!(LOG_SOURCE,
                        "Merged {} buckets of layout {:#x} (slot {}) into one of {} sets",
                        count, layout.0, slot, capacity);
                }
            }
        }
    }

    /// End a frame: release idle pools and advance the frame counter
    ///
    /// Runs a sweep at most once every `release_frequency` frames. Returns
    /// the layouts whose pools were released, sorted.
    pub fn gc(&mut self) -> Vec<LayoutHandle> {
        let mut collected = Vec::new();

        if self.current_frame >= self.last_release + self.release_frequency as u64 {
            self.last_release = self.current_frame;

            let current_frame = self.current_frame;
            let time_to_keep = self.time_to_keep as u64;
            let backend = &mut self.backend;

            self.pools.retain(|layout, pool| {
                if pool.last_used + time_to_keep > current_frame {
                    return true;
                }
                for bucket in pool.slots.iter().flatten() {
                    backend.destroy_pool(bucket.pool);
                }
                collected.push(*layout);
                false
            });

            if !collected.is_empty() {
                collected.sort();
                engine_debug!(LOG_SOURCE, "Released {} idle pools at frame {}", collected.len(), current_frame);
            }
            // The current set lived in a destroyed pool
            if collected.contains(&self.bound_layout) {
                self.unbind();
            }
        }

        self.current_frame += 1;
        collected
    }

    // ===== Accessors =====

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Frames completed (number of `gc` calls)
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    /// Frame-in-flight slot selected by the last `next_frame`
    pub fn frame_slot(&self) -> u32 {
        self.frame_slot
    }

    pub fn bound_layout(&self) -> LayoutHandle {
        self.bound_layout
    }

    pub fn time_to_keep(&self) -> u32 {
        self.time_to_keep
    }

    pub fn has_pool(&self, layout: LayoutHandle) -> bool {
        self.pools.contains_key(&layout)
    }

    /// Capacities of the buckets of `layout` in `slot`, oldest first
    pub fn bucket_capacities(&self, layout: LayoutHandle, slot: u32) -> Vec<u32> {
        self.pools
            .get(&layout)
            .and_then(|pool| pool.slots.get(slot as usize))
            .map(|buckets| buckets.iter().map(|b| b.capacity).collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> DescriptorCacheStats {
        let buckets = self.pools.values().flat_map(|p| p.slots.iter().flatten());
        let (count, allocated) = buckets.fold((0usize, 0u64), |(n, sets), b| (n + 1, sets + b.allocated as u64));
        DescriptorCacheStats {
            pools: self.pools.len(),
            buckets: count,
            allocated_sets: allocated,
            updates_issued: self.updates_issued,
        }
    }

    // ===== Internals =====

    /// Drop the bound layout, its template and the current set
    fn unbind(&mut self) {
        self.bound_layout = LayoutHandle::NULL;
        self.template.set = SetHandle::NULL;
        self.template.writes.clear();
        self.uniform_entries.clear();
        self.sampler_entries.clear();
        self.written = false;
    }

    /// One write per uniform block, one per sampler array element
    fn build_template(&mut self, program: &ProgramMeta) {
        for block in &program.uniform_blocks {
            self.uniform_entries.insert(block.slot, self.template.writes.len());
            self.template.writes.push(DescriptorWrite::uniform_buffer(block.slot));
        }
        for sampler in &program.samplers {
            self.sampler_entries.insert(sampler.location, (self.template.writes.len(), sampler.array_size));
            for element in 0..sampler.array_size {
                self.template.writes.push(DescriptorWrite::combined_image_sampler(sampler.location, element));
            }
        }
    }

    fn sampler_entry(&self, op: &str, location: u32, array_index: u32) -> Option<usize> {
        match self.sampler_entries.get(&location) {
            Some(&(base, size)) if array_index < size => Some(base + array_index as usize),
            Some(&(_, size)) => {
                engine_debug!(LOG_SOURCE,
                    "{}: array index {} out of range at location {} (size {}), dropped",
                    op, array_index, location, size);
                None
            }
            None => {
                engine_debug!(LOG_SOURCE,
                    "{}: no sampler at location {} in layout {:#x}, dropped",
                    op, location, self.bound_layout.0);
                None
            }
        }
    }

    /// Make sure the current set can still be patched
    ///
    /// Allocates a new set when there is none or the current one was
    /// already written. The template keeps every previous binding.
    fn allocate_set(&mut self) {
        if !self.template.set.is_null() && !self.written {
            return;
        }

        let layout = self.bound_layout;
        // Template entries only exist for layouts that own a pool
        let Some(pool) = self.pools.get_mut(&layout) else {
            return;
        };

        let slot = self.frame_slot as usize;
        let next_capacity = match pool.slots[slot].last() {
            None => Some(self.pool_alloc_base),
            Some(last) if last.is_full() => Some(last.capacity.saturating_mul(self.pool_alloc_factor)),
            Some(_) => None,
        };

        if let Some(capacity) = next_capacity {
            let desc = pool.bucket_desc(capacity);
            let handle = match self.backend.create_pool(&desc) {
                Ok(handle) => handle,
                Err(e) => engine_fatal!(LOG_SOURCE,
                    "Failed to create descriptor pool of {} sets for layout {:#x}: {}", capacity, layout.0, e),
            };
            pool.slots[slot].push(Bucket { pool: handle, capacity, allocated: 0 });
        }

        let buckets = &mut pool.slots[slot];
        let last = buckets.len() - 1;
        let bucket = &mut buckets[last];
        let set = match self.backend.allocate_set(bucket.pool, layout) {
            Ok(set) => set,
            Err(e) => engine_fatal!(LOG_SOURCE,
                "Failed to allocate descriptor set for layout {:#x}: {}", layout.0, e),
        };
        bucket.allocated += 1;

        self.template.set = set;
        self.written = false;
    }
}

impl<B: DescriptorBackend> Drop for DescriptorSetCache<B> {
    fn drop(&mut self) {
        for pool in self.pools.values() {
            for bucket in pool.slots.iter().flatten() {
                self.backend.destroy_pool(bucket.pool);
            }
        }
        self.pools.clear();
    }
}

#[cfg(test)]
#[path = "descriptor_set_cache_tests.rs"]
mod tests;
