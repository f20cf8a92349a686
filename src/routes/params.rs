use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const DEFAULT_TAKE: i64 = 20;
pub const MAX_TAKE: i64 = 100;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(DEFAULT_TAKE).clamp(1, MAX_TAKE);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GarageSearchQuery {
    /// Free text matched against name, description, city and address.
    pub q: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub owner_id: Option<Uuid>,
    /// Page size, default 20, at most 100.
    pub take: Option<i64>,
    pub skip: Option<i64>,
    /// Caller position for distance sorting.
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Address to geocode as the caller position when `lat`/`lon` are absent.
    pub near: Option<String>,
}

impl GarageSearchQuery {
    /// `(take, skip)` clamped to the allowed window.
    pub fn window(&self) -> (i64, i64) {
        let take = self.take.unwrap_or(DEFAULT_TAKE).clamp(1, MAX_TAKE);
        let skip = self.skip.unwrap_or(0).max(0);
        (take, skip)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingListQuery {
    pub user_id: Option<Uuid>,
    pub garage_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Matched against email and name.
    pub q: Option<String>,
}

impl UserQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewQuery {
    pub garage_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessageQuery {
    pub peer_id: Option<Uuid>,
    /// Epoch milliseconds; only newer messages are returned.
    pub since: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GeocodeQuery {
    pub q: Option<String>,
}

/// Trimmed value, `None` when empty.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `%value%` for ILIKE with the wildcards in `value` escaped.
pub fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_page_size() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(500),
        };
        assert_eq!(p.normalize(), (1, 100, 0));
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
    }

    #[test]
    fn huge_page_saturates_offset() {
        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        assert_eq!(p.normalize(), (i64::MAX, 100, i64::MAX));
    }

    #[test]
    fn search_window_bounds_take_and_skip() {
        let q = GarageSearchQuery {
            take: Some(1000),
            skip: Some(-5),
            ..Default::default()
        };
        assert_eq!(q.window(), (100, 0));
        assert_eq!(GarageSearchQuery::default().window(), (20, 0));
    }

    #[test]
    fn blank_filters_are_ignored() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" Utrecht ")), Some("Utrecht"));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Utrecht"), "%Utrecht%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern(r"c:\x"), r"%c:\\x%");
    }
}
