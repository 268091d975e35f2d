//! Maps an origin/destination pair to the route labels indices publish.

use crate::composite::COMPOSITE_KEYWORDS;

/// Destination regions and the words index publishers use for them.
const LANE_KEYWORDS: &[(&[&str], &[&str])] = &[
    (
        &["rotterdam", "hamburg", "antwerp", "felixstowe", "north europe", "europe"],
        &["North Europe", "Rotterdam", "Europe"],
    ),
    (
        &["genoa", "barcelona", "piraeus", "valencia", "mediterranean"],
        &["Mediterranean", "Genoa"],
    ),
    (
        &["los angeles", "long beach", "oakland", "seattle", "west coast", "uswc"],
        &["US West Coast", "USWC", "West America", "Los Angeles"],
    ),
    (
        &["new york", "savannah", "norfolk", "east coast", "usec"],
        &["US East Coast", "USEC", "East America", "New York"],
    ),
    (
        &["dubai", "jebel ali", "dammam", "persian gulf", "middle east"],
        &["Persian Gulf", "Middle East"],
    ),
    (
        &["sydney", "melbourne", "brisbane", "australia"],
        &["Australia"],
    ),
    (&["lagos", "tema", "west africa"], &["West Africa", "Africa"]),
    (
        &["durban", "cape town", "south africa"],
        &["South Africa", "Africa"],
    ),
    (
        &["santos", "buenos aires", "south america", "latin america"],
        &["South America", "Latin America"],
    ),
    (
        &["tokyo", "yokohama", "osaka", "kobe", "japan"],
        &["Japan"],
    ),
    (&["busan", "korea"], &["Korea"]),
    (
        &["singapore", "port klang", "ho chi minh", "bangkok", "southeast asia"],
        &["Southeast Asia"],
    ),
];

/// Route candidates for a lane, most specific first: literal lane labels,
/// then the destination region's keywords, then the family composite.
pub fn route_candidates(origin: &str, destination: &str) -> Vec<String> {
    let origin = origin.trim();
    let destination = destination.trim();
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |candidate: String| {
        if !candidate.trim().is_empty()
            && !candidates
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&candidate))
        {
            candidates.push(candidate);
        }
    };

    if !origin.is_empty() && !destination.is_empty() {
        push(format!("{origin}-{destination}"));
        push(format!("{origin} - {destination}"));
        push(format!("{origin} to {destination}"));
    }

    let lowered = destination.to_lowercase();
    if !lowered.is_empty() {
        for (places, keywords) in LANE_KEYWORDS {
            if places.iter().any(|place| lowered.contains(place)) {
                keywords.iter().for_each(|k| push(k.to_string()));
            }
        }
    }
    push(destination.to_string());

    COMPOSITE_KEYWORDS
        .iter()
        .for_each(|k| push(k.to_string()));
    candidates
}
