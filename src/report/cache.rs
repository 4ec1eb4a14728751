use crate::report::*;

/// Where the survey tables come from.
pub trait DataSource {
    fn fetch(&self) -> BReportResult<SourceTables>;

    fn describe(&self) -> String;
}

impl<S: DataSource + ?Sized> DataSource for &S {
    fn fetch(&self) -> BReportResult<SourceTables> {
        (**self).fetch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// A workbook on the local file system.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct XlsxSource {
    pub path: String,
    pub settings: DataSourceSettings,
    pub grouping_column: String,
}

impl DataSource for XlsxSource {
    fn fetch(&self) -> BReportResult<SourceTables> {
        io_xlsx::load_workbook(&self.path, &self.settings, &self.grouping_column)
    }

    fn describe(&self) -> String {
        format!("workbook {}", self.path)
    }
}

/// Holds the prepared dataset between tabulations.
///
/// Nothing is fetched until the first `load`. A failed fetch is returned as is and
/// leaves the cache empty: the next `load` tries again.
pub struct DatasetCache<S: DataSource> {
    source: S,
    derivations: Vec<Derivation>,
    loaded: Option<PreparedData>,
}

impl<S: DataSource> DatasetCache<S> {
    pub fn new(source: S, derivations: Vec<Derivation>) -> DatasetCache<S> {
        DatasetCache {
            source,
            derivations,
            loaded: None,
        }
    }

    pub fn load(&mut self) -> BReportResult<&PreparedData> {
        let prepared = match self.loaded.take() {
            Some(p) => p,
            None => {
                info!("Loading data from {}", self.source.describe());
                let tables = self.source.fetch()?;
                prepare(tables, &self.derivations)
            }
        };
        Ok(&*self.loaded.insert(prepared))
    }

    pub fn invalidate(&mut self) {
        if self.is_loaded() {
            debug!("invalidate: dropping the cached data");
        }
        self.loaded = None;
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::FakeSource;

    #[test]
    fn loads_once() {
        let mut cache = DatasetCache::new(FakeSource::new(), default_config().derivations());
        assert!(!cache.is_loaded());
        assert_eq!(cache.load().unwrap().data.len(), 3);
        assert_eq!(cache.load().unwrap().data.len(), 3);
        assert!(cache.is_loaded());
        assert_eq!(cache.source.fetches.get(), 1);
    }

    #[test]
    fn invalidate_refetches() {
        let mut cache = DatasetCache::new(FakeSource::new(), vec![]);
        cache.load().unwrap();
        cache.invalidate();
        assert!(!cache.is_loaded());
        // Without derivations nothing is dropped.
        assert_eq!(cache.load().unwrap().data.len(), 5);
        assert_eq!(cache.source.fetches.get(), 2);
    }

    #[test]
    fn failed_fetch_is_not_cached() {
        let source = FakeSource::new();
        source.fail.set(true);
        let mut cache = DatasetCache::new(source, vec![]);
        assert!(cache.load().is_err());
        assert!(!cache.is_loaded());
        cache.source.fail.set(false);
        assert!(cache.load().is_ok());
        assert_eq!(cache.source.fetches.get(), 2);
    }
}
