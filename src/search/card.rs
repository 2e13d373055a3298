use serde::Serialize;

use crate::model::types::Listing;
use crate::search::summary::format_currency;

/// Amenity strings shown per card, read from `aboutProperty`, `lift`, `parkingType` in order.
const MAX_AMENITIES: usize = 3;

/// Display record for one matched listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingCard {
    pub title: Option<String>,
    /// "City • Locality", with empty sides and the separator dropped.
    pub city_locality: String,
    pub bhk: Option<String>,
    pub price: Option<String>,
    pub project_name: Option<String>,
    pub possession_status: Option<String>,
    pub amenities: Vec<String>,
    pub cta_url: String,
}

pub fn to_card(listing: &Listing) -> ListingCard {
    let city_locality = [listing.city_name.as_deref(), listing.landmark.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" • ");

    let amenities = [
        listing.about_property.as_deref(),
        listing.lift.as_deref(),
        listing.parking_type.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|value| !value.trim().is_empty())
    .take(MAX_AMENITIES)
    .map(str::to_string)
    .collect();

    let slug = listing
        .slug
        .as_deref()
        .or(listing.project_name.as_deref())
        .unwrap_or_default();

    ListingCard {
        title: listing.project_name.clone(),
        city_locality,
        bhk: listing.custom_bhk.clone(),
        price: format_currency(listing.price),
        project_name: listing.project_name.clone(),
        possession_status: listing.status.clone(),
        amenities,
        cta_url: format!("/project/{}", slug.to_lowercase().replace(' ', "-")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_card() {
        let listing = Listing {
            id: "p1".into(),
            city_name: Some("Pune".into()),
            landmark: Some("Wakad".into()),
            project_name: Some("Skyline Heights".into()),
            custom_bhk: Some("2BHK".into()),
            status: Some("Ready".into()),
            price: Some(7_500_000.0),
            about_property: Some("Gym | Pool".into()),
            lift: Some("True".into()),
            parking_type: Some("Covered".into()),
            slug: Some("Skyline Heights Wakad".into()),
            ..Default::default()
        };
        let card = to_card(&listing);
        assert_eq!(card.city_locality, "Pune • Wakad");
        assert_eq!(card.price.as_deref(), Some("₹75.0 L"));
        assert_eq!(card.amenities, vec!["Gym | Pool", "True", "Covered"]);
        assert_eq!(card.cta_url, "/project/skyline-heights-wakad");
    }

    #[test]
    fn sparse_card_falls_back() {
        let listing = Listing {
            id: "p2".into(),
            landmark: Some("Baner".into()),
            project_name: Some("Green Acres".into()),
            parking_type: Some("  ".into()),
            lift: Some("False".into()),
            ..Default::default()
        };
        let card = to_card(&listing);
        assert_eq!(card.city_locality, "Baner");
        assert_eq!(card.price, None);
        assert_eq!(card.amenities, vec!["False"]);
        assert_eq!(card.cta_url, "/project/green-acres");

        let empty = to_card(&Listing::default());
        assert_eq!(empty.city_locality, "");
        assert_eq!(empty.title, None);
        assert_eq!(empty.cta_url, "/project/");
    }
}
