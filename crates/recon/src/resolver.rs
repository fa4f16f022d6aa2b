use crate::cache::EquivalenceCache;
use crate::error::ReconError;
use crate::model::ResolverStats;
use crate::oracle::Oracle;
use crate::prefilter::Prefilter;

/// Decides whether two location strings name the same place.
///
/// Order: cache, verbatim equality, prefilter, oracle. Every ruling that did
/// not come from the cache is written back to it.
pub struct LocationResolver<'a> {
    cache: &'a mut EquivalenceCache,
    oracle: &'a mut dyn Oracle,
    prefilter: Prefilter,
    stats: ResolverStats,
}

impl<'a> LocationResolver<'a> {
    pub fn new(cache: &'a mut EquivalenceCache, oracle: &'a mut dyn Oracle, prefilter: Prefilter) -> Self {
        Self {
            cache,
            oracle,
            prefilter,
            stats: ResolverStats::default(),
        }
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    pub fn resolve(&mut self, a: &str, b: &str) -> Result<bool, ReconError> {
        if let Some(known) = self.cache.query(a, b).as_bool() {
            self.stats.cache_hits += 1;
            return Ok(known);
        }

        if a == b {
            self.stats.verbatim += 1;
            self.cache.record(a, b, true)?;
            return Ok(true);
        }

        if !self.prefilter.is_plausible(a, b) {
            self.stats.prefilter_rejections += 1;
            log::debug!("prefilter rejected {:?} vs {:?}", a, b);
            self.cache.record(a, b, false)?;
            return Ok(false);
        }

        self.stats.prompts += 1;
        let same = self
            .oracle
            .ask(&format!("Are these locations the same? \"{a}\" and \"{b}\""))?;
        self.cache.record(a, b, same)?;
        Ok(same)
    }
}
