use std::sync::Arc;

use crate::{
    config::{AppConfig, PhotoSettings, SearchSettings},
    db::{DbPool, OrmConn, orm_from_pool},
    geo::Geocoder,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub geocoder: Arc<dyn Geocoder>,
    pub photos: PhotoSettings,
    pub search: SearchSettings,
}

impl AppState {
    pub fn new(pool: DbPool, geocoder: Arc<dyn Geocoder>, config: &AppConfig) -> Self {
        Self {
            orm: orm_from_pool(&pool),
            pool,
            geocoder,
            photos: config.photos.clone(),
            search: config.search.clone(),
        }
    }
}
