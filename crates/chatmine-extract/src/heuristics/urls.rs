//! URL classification by host.

use chatmine_core::UrlType;

/// Classify a URL by substring inspection of its lowercase form.
pub fn classify_url(url: &str) -> UrlType {
    let url = url.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| url.contains(n));

    if has(&["tiktok.com", "vt.tiktok"]) {
        UrlType::Tiktok
    } else if has(&["youtube.com", "youtu.be"]) {
        UrlType::Youtube
    } else if has(&["instagram.com"]) {
        UrlType::Instagram
    } else if has(&["maps.google", "google.com/maps", "goo.gl/maps", "maps.app.goo.gl"]) {
        UrlType::GoogleMaps
    } else if has(&["airbnb"]) {
        UrlType::Airbnb
    } else if has(&["booking.com"]) {
        UrlType::Booking
    } else if has(&["tripadvisor"]) {
        UrlType::Tripadvisor
    } else if has(&["eventfinda", "ticketmaster", "eventbrite"]) {
        UrlType::Event
    } else {
        UrlType::Website
    }
}

/// Base confidence a URL of this type lends to its message.
pub fn base_confidence(url_type: UrlType) -> f64 {
    match url_type {
        UrlType::GoogleMaps => 0.7,
        UrlType::Airbnb => 0.8,
        UrlType::Booking => 0.8,
        UrlType::Tripadvisor => 0.75,
        UrlType::Event => 0.85,
        UrlType::Tiktok => 0.5,
        UrlType::Youtube => 0.4,
        UrlType::Instagram => 0.5,
        UrlType::Website => 0.3,
    }
}

/// The URL with the highest base confidence. Earlier URLs win ties.
pub fn best_url_type<S: AsRef<str>>(urls: &[S]) -> Option<UrlType> {
    urls.iter()
        .map(|u| classify_url(u.as_ref()))
        .fold(None, |best: Option<UrlType>, t| match best {
            Some(b) if base_confidence(b) >= base_confidence(t) => Some(b),
            _ => Some(t),
        })
}
