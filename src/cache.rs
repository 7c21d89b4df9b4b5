use lru::LruCache;
use std::num::NonZeroUsize;

/// LRU cache from predicate hash to compiled device pipeline, so switching
/// between a handful of configurations never recompiles shaders.
pub(crate) struct PipelineCache {
    pipelines: LruCache<u64, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub(crate) fn new(size: NonZeroUsize) -> Self {
        Self {
            pipelines: LruCache::new(size),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub(crate) fn get_pipeline(&mut self, predicate_hash: &u64) -> Option<wgpu::RenderPipeline> {
        self.pipelines.get(predicate_hash).cloned()
    }

    pub(crate) fn insert_pipeline(&mut self, predicate_hash: u64, pipeline: wgpu::RenderPipeline) {
        self.pipelines.put(predicate_hash, pipeline);
    }
}
