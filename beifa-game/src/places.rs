//! Static place and route catalog for the northern front.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Places in map order, west to east along the campaign.
pub const PLACE_ORDER: [&str; 7] = [
    "chengdu",
    "hanzhong",
    "qishan",
    "jieting",
    "longyou",
    "wuzhangyuan",
    "changan",
];

/// Route id, origin, destination.
pub const ROUTE_ENDPOINTS: [(&str, &str, &str); 8] = [
    ("hanzhong_to_jieting", "hanzhong", "jieting"),
    ("jieting_to_longyou", "jieting", "longyou"),
    ("longyou_ops", "longyou", "longyou"),
    ("longyou_to_qishan", "longyou", "qishan"),
    ("qishan_to_wuzhangyuan", "qishan", "wuzhangyuan"),
    ("wuzhangyuan_ops", "wuzhangyuan", "wuzhangyuan"),
    ("wuzhangyuan_to_changan", "wuzhangyuan", "changan"),
    ("changan_ops", "changan", "changan"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCatalog {
    places: Vec<String>,
    routes: BTreeMap<String, Route>,
}

impl PlaceCatalog {
    /// Build a catalog from arbitrary place and route tables.
    #[must_use]
    pub fn new<P, R>(places: P, routes: R) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        R: IntoIterator<Item = (String, Route)>,
    {
        Self {
            places: places.into_iter().map(Into::into).collect(),
            routes: routes.into_iter().collect(),
        }
    }

    /// The fixed catalog used by the shipped campaign.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            PLACE_ORDER,
            ROUTE_ENDPOINTS.iter().map(|(id, origin, destination)| {
                (
                    (*id).to_string(),
                    Route {
                        origin: (*origin).to_string(),
                        destination: (*destination).to_string(),
                    },
                )
            }),
        )
    }

    #[must_use]
    pub fn has_place(&self, place: &str) -> bool {
        self.places.iter().any(|known| known == place)
    }

    #[must_use]
    pub fn route(&self, route_id: &str) -> Option<&Route> {
        self.routes.get(route_id)
    }

    pub fn routes(&self) -> impl Iterator<Item = (&str, &Route)> {
        self.routes.iter().map(|(id, route)| (id.as_str(), route))
    }

    /// Map-order rank; unknown places sort last.
    #[must_use]
    pub fn rank(&self, place: &str) -> usize {
        self.places
            .iter()
            .position(|known| known == place)
            .unwrap_or(self.places.len())
    }

    /// Sort and dedupe a set of places into map order.
    pub fn sort_places(&self, places: &mut Vec<String>) {
        places.sort_by(|a, b| self.rank(a).cmp(&self.rank(b)).then_with(|| a.cmp(b)));
        places.dedup();
    }
}

impl Default for PlaceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_routes_start_at_known_places() {
        let catalog = PlaceCatalog::standard();
        for (id, route) in catalog.routes() {
            assert!(catalog.has_place(&route.origin), "{id} origin");
            assert!(catalog.has_place(&route.destination), "{id} destination");
        }
        assert_eq!(
            catalog.route("qishan_to_wuzhangyuan").map(|r| r.origin.as_str()),
            Some("qishan")
        );
    }

    #[test]
    fn sort_places_follows_map_order() {
        let catalog = PlaceCatalog::standard();
        let mut places = vec![
            "changan".to_string(),
            "chengdu".to_string(),
            "jieting".to_string(),
            "chengdu".to_string(),
        ];
        catalog.sort_places(&mut places);
        assert_eq!(places, vec!["chengdu", "jieting", "changan"]);
    }
}
