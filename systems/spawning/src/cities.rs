//! Built-in pool of geocoded city sites used when no custom pool is configured.

use transit_rush_core::{CitySite, GeoPoint};

const BUILTIN: [(&str, f64, f64); 32] = [
    ("Amsterdam", 52.3676, 4.9041),
    ("Athens", 37.9838, 23.7275),
    ("Barcelona", 41.3874, 2.1686),
    ("Belgrade", 44.7866, 20.4489),
    ("Berlin", 52.5200, 13.4050),
    ("Bratislava", 48.1486, 17.1077),
    ("Brussels", 50.8503, 4.3517),
    ("Bucharest", 44.4268, 26.1025),
    ("Budapest", 47.4979, 19.0402),
    ("Copenhagen", 55.6761, 12.5683),
    ("Dublin", 53.3498, -6.2603),
    ("Edinburgh", 55.9533, -3.1883),
    ("Frankfurt", 50.1109, 8.6821),
    ("Hamburg", 53.5511, 9.9937),
    ("Helsinki", 60.1699, 24.9384),
    ("Lisbon", 38.7223, -9.1393),
    ("Ljubljana", 46.0569, 14.5058),
    ("London", 51.5072, -0.1276),
    ("Lyon", 45.7640, 4.8357),
    ("Madrid", 40.4168, -3.7038),
    ("Milan", 45.4642, 9.1900),
    ("Munich", 48.1351, 11.5820),
    ("Oslo", 59.9139, 10.7522),
    ("Paris", 48.8566, 2.3522),
    ("Prague", 50.0755, 14.4378),
    ("Riga", 56.9496, 24.1052),
    ("Rome", 41.9028, 12.4964),
    ("Stockholm", 59.3293, 18.0686),
    ("Vienna", 48.2082, 16.3738),
    ("Vilnius", 54.6872, 25.2797),
    ("Warsaw", 52.2297, 21.0122),
    ("Zurich", 47.3769, 8.5417),
];

/// Returns the built-in European city pool in alphabetical order.
#[must_use]
pub fn builtin() -> Vec<CitySite> {
    BUILTIN
        .iter()
        .map(|&(name, latitude, longitude)| {
            CitySite::new(name, GeoPoint::new_unchecked(latitude, longitude))
        })
        .collect()
}
