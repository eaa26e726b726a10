// Halves go to the even neighbour: 3.125 gives 3.12, 9.375 gives 9.38.
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

// Block/challenge pages are served with a 200 status, only their content
// tells them apart from the listing.
const BLOCK_TEXT_MARKERS: [&'static str; 3] = [
    "just a moment",
    "cf-browser-verification",
    "checking your browser before accessing",
];

pub fn looks_like_block_page(html: &str) -> bool {
    let lower = html.to_lowercase();
    BLOCK_TEXT_MARKERS.iter().any(|marker| lower.contains(marker))
}
