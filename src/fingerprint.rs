//! Stable keys for location requests.

use sha1::{Digest, Sha1};

use crate::models::LocationRequest;

/// SHA-1 of the request's present parts, joined with `|` in hierarchy order
/// and lowercased. Absent parts contribute nothing, so the same words in
/// different fields can share a fingerprint.
pub fn fingerprint(request: &LocationRequest) -> String {
    let joined = request.parts().collect::<Vec<_>>().join("|").to_lowercase();
    hex::encode(Sha1::digest(joined.as_bytes()))
}

/// Cache key for a lookup. Unlike [`fingerprint`] every part is tagged with
/// its field, so requests that resolve differently never share a key.
pub fn lookup_key(request: &LocationRequest) -> String {
    let tagged: Vec<(&str, String)> = request
        .tagged_parts()
        .map(|(field, value)| (field, value.to_lowercase()))
        .collect();
    // Tuples of plain strings always serialize.
    let encoded = serde_json::to_string(&tagged).unwrap_or_default();
    hex::encode(Sha1::digest(encoded.as_bytes()))
}
