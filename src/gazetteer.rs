//! Entry point tying the store, loaders and resolvers together.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::fingerprint;
use crate::loaders::{AdminCodeLoader, CountryCodeLoader, FeatureCodeLoader, PlaceLoader};
use crate::models::{CountryCode, Coordinates, FeatureCode, LocationRequest};
use crate::resolve::{AdminCodeResolver, CountryResolver, PlaceResolver};
use crate::store::ReferenceStore;

/// Row counts of every reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub country_codes: i64,
    pub admin_codes: i64,
    pub feature_codes: i64,
    pub places: i64,
    pub alternate_names: i64,
}

pub struct Gazetteer {
    store: ReferenceStore,
    countries: Arc<CountryCodeLoader>,
    admin_codes: Arc<AdminCodeLoader>,
    features: Arc<FeatureCodeLoader>,
    places: Arc<PlaceLoader>,
    country_resolver: CountryResolver,
    place_resolver: PlaceResolver,
}

impl Gazetteer {
    pub async fn connect(config: &Config) -> Result<Self> {
        let store = ReferenceStore::connect(&config.database).await?;
        Ok(Self::with_store(store, config))
    }

    /// Wire loaders and resolvers over an existing store. Nothing is loaded yet.
    pub fn with_store(store: ReferenceStore, config: &Config) -> Self {
        let batch_size = config.ingest.batch_size;
        let sources = &config.sources;

        let countries = Arc::new(CountryCodeLoader::new(
            store.clone(),
            sources.country_codes.clone(),
            batch_size,
        ));
        let admin_codes = Arc::new(AdminCodeLoader::new(
            store.clone(),
            sources.admin_codes.clone(),
            batch_size,
        ));
        let features = Arc::new(FeatureCodeLoader::new(
            store.clone(),
            sources.feature_codes.clone(),
            batch_size,
        ));
        let places = Arc::new(PlaceLoader::new(
            store.clone(),
            sources.places.clone(),
            batch_size,
        ));

        let place_resolver = PlaceResolver::new(
            places.clone(),
            CountryResolver::new(countries.clone()),
            AdminCodeResolver::new(admin_codes.clone()),
        );

        Self {
            store,
            country_resolver: CountryResolver::new(countries.clone()),
            countries,
            admin_codes,
            features,
            places,
            place_resolver,
        }
    }

    /// Coordinates of the place the request describes.
    pub async fn resolve(&self, request: &LocationRequest) -> Result<Coordinates> {
        self.place_resolver.resolve(request).await
    }

    pub async fn resolve_country(&self, name: &str) -> Result<CountryCode> {
        self.country_resolver.resolve(name).await
    }

    pub fn fingerprint(&self, request: &LocationRequest) -> String {
        fingerprint::fingerprint(request)
    }

    /// Key under which the outcome of resolving `request` may be cached.
    pub fn lookup_key(&self, request: &LocationRequest) -> String {
        fingerprint::lookup_key(request)
    }

    pub async fn describe_feature(
        &self,
        feature_class: &str,
        code: &str,
    ) -> Result<Option<FeatureCode>> {
        self.features.lookup(feature_class, code).await
    }

    pub async fn alternate_names(&self, place_id: i64) -> Result<Vec<String>> {
        self.places.alternate_names(place_id).await
    }

    pub async fn ensure_all_loaded(&self) -> Result<()> {
        self.features.ensure_loaded().await?;
        self.countries.ensure_loaded().await?;
        self.admin_codes.ensure_loaded().await?;
        self.places.ensure_loaded().await
    }

    /// Truncate and reload every reference table. Each table is replaced in
    /// its own transaction; the first failure stops the reset.
    pub async fn reset_all(&self) -> Result<()> {
        info!("Resetting all reference tables");
        self.features.reset().await?;
        self.countries.reset().await?;
        self.admin_codes.reset().await?;
        self.places.reset().await?;
        info!("All reference tables reset");
        Ok(())
    }

    /// Row counts, loading any table that is still empty.
    pub async fn stats(&self) -> Result<TableStats> {
        self.ensure_all_loaded().await?;
        let names = self.store.schema().names();
        Ok(TableStats {
            country_codes: self.store.count_rows(&names.country_codes).await?,
            admin_codes: self.store.count_rows(&names.admin_codes).await?,
            feature_codes: self.store.count_rows(&names.feature_codes).await?,
            places: self.store.count_rows(&names.places).await?,
            alternate_names: self.store.count_rows(&names.alternate_names).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, GazetteerError};
    use crate::store::testing::temp_store;

    async fn gazetteer() -> (tempfile::TempDir, Gazetteer) {
        let (dir, store) = temp_store().await;
        (dir, Gazetteer::with_store(store, &Config::default()))
    }

    #[tokio::test]
    async fn test_resolve_and_fingerprint() {
        let (_dir, gazetteer) = gazetteer().await;
        let request = LocationRequest::new()
            .with_country("Canada")
            .with_province("manitoba")
            .with_city("Winnipeg");

        let coordinates = gazetteer.resolve(&request).await.unwrap();
        assert_eq!(
            coordinates,
            Coordinates {
                latitude: 49.8844,
                longitude: -97.14704
            }
        );
        assert_eq!(gazetteer.fingerprint(&request).len(), 40);
    }

    #[tokio::test]
    async fn test_errors_map_to_three_kinds() {
        let (_dir, gazetteer) = gazetteer().await;

        let invalid = gazetteer
            .resolve(&LocationRequest::new().with_county("rm of springfield"))
            .await
            .unwrap_err();
        assert_eq!(invalid.kind(), ErrorKind::InvalidRequest);

        let missing = gazetteer
            .resolve(&LocationRequest::new().with_country("Atlantis"))
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_stats_and_reset_all() {
        let (_dir, gazetteer) = gazetteer().await;

        let before = gazetteer.stats().await.unwrap();
        assert!(before.places > 0);
        assert!(before.alternate_names > 0);
        assert!(before.feature_codes > 0);

        gazetteer.reset_all().await.unwrap();
        assert_eq!(gazetteer.stats().await.unwrap(), before);

        gazetteer.ensure_all_loaded().await.unwrap();
        assert_eq!(gazetteer.stats().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_describe_feature_and_alternate_names() {
        let (_dir, gazetteer) = gazetteer().await;

        let capital = gazetteer.describe_feature("P", "PPLC").await.unwrap().unwrap();
        assert_eq!(capital.name, "capital of a political entity");
        assert_eq!(
            gazetteer.alternate_names(6183235).await.unwrap(),
            vec!["Vinnipeg", "Winnipeg", "YWG", "Виннипег"]
        );
        assert_eq!(
            gazetteer.resolve_country("mexico").await.unwrap().iso_alpha2.as_deref(),
            Some("MX")
        );
    }

    #[tokio::test]
    async fn test_missing_source_is_internal_and_retryable() {
        let (dir, store) = temp_store().await;
        let path = dir.path().join("CA.txt");
        let mut config = Config::default();
        config.sources.places = crate::source::SourceDocument::File(path.clone());
        let gazetteer = Gazetteer::with_store(store, &config);
        let request = LocationRequest::new().with_city("Winnipeg");

        let err = gazetteer.resolve(&request).await.unwrap_err();
        assert!(matches!(err, GazetteerError::SourceNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);

        std::fs::copy(
            concat!(env!("CARGO_MANIFEST_DIR"), "/data/CA.txt"),
            &path,
        )
        .unwrap();
        assert!(gazetteer.resolve(&request).await.is_ok());
    }
}
