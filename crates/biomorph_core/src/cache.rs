use crate::develop::{develop_with, DevelopmentOptions};
use biomorph_data::{Genotype, Phenotype};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheEntry {
    phenotype: Arc<Phenotype>,
    last_used: u64,
}

/// Bounded memo of developed phenotypes, keyed by genotype value and
/// development options. Evicts the least recently used entry when full.
pub struct PhenotypeCache {
    capacity: usize,
    entries: HashMap<(Genotype, DevelopmentOptions), CacheEntry>,
    clock: u64,
    stats: CacheStats,
}

impl PhenotypeCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::with_capacity(capacity.max(1)),
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    /// Cached phenotype for `genotype` under default options, developing it
    /// on a miss.
    pub fn phenotype(&mut self, genotype: &Genotype) -> Arc<Phenotype> {
        self.phenotype_with(genotype, &DevelopmentOptions::default())
    }

    pub fn phenotype_with(
        &mut self,
        genotype: &Genotype,
        options: &DevelopmentOptions,
    ) -> Arc<Phenotype> {
        self.clock += 1;
        let key = (genotype.clone(), *options);
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_used = self.clock;
            self.stats.hits += 1;
            return Arc::clone(&entry.phenotype);
        }

        self.stats.misses += 1;
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        let phenotype = Arc::new(develop_with(genotype, options));
        self.entries.insert(
            key,
            CacheEntry {
                phenotype: Arc::clone(&phenotype),
                last_used: self.clock,
            },
        );
        phenotype
    }

    #[must_use]
    pub fn contains(&self, genotype: &Genotype, options: &DevelopmentOptions) -> bool {
        self.entries.contains_key(&(genotype.clone(), *options))
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.stats.evictions += 1;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
