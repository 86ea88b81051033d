//! Geocoder responses.

use serde_json::Value;

use super::address::{address_from_value, AddressMap};

/// One candidate returned by the external geocoder.
///
/// Built leniently from raw JSON: every field is optional because upstream
/// responses are best-effort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeResult {
    pub display_name: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub address: AddressMap,
}

impl GeocodeResult {
    /// Decode a single response object. Non-objects and error markers yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.contains_key("error") {
            return None;
        }
        Some(Self {
            display_name: obj
                .get("display_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            lat: obj.get("lat").and_then(coordinate_text),
            lon: obj.get("lon").and_then(coordinate_text),
            address: address_from_value(obj.get("address")),
        })
    }

    /// Decode a search response; anything but an array is an empty result set
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| items.iter().filter_map(Self::from_value).collect())
            .unwrap_or_default()
    }

    /// Parsed `(lon, lat)` if both coordinates are present and finite
    pub fn point(&self) -> Option<(f64, f64)> {
        let lat: f64 = self.lat.as_deref()?.trim().parse().ok()?;
        let lon: f64 = self.lon.as_deref()?.trim().parse().ok()?;
        (lat.is_finite() && lon.is_finite()).then_some((lon, lat))
    }
}

fn coordinate_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let value = json!({
            "display_name": "Kayathar, Thoothukkudi, Tamil Nadu, India",
            "lat": "8.95",
            "lon": 77.72,
            "address": { "state": "Tamil Nadu", "state_district": "Thoothukkudi" }
        });
        let result = GeocodeResult::from_value(&value).unwrap();
        assert_eq!(result.lat.as_deref(), Some("8.95"));
        assert_eq!(result.lon.as_deref(), Some("77.72"));
        assert_eq!(result.point(), Some((77.72, 8.95)));
        assert_eq!(result.address.len(), 2);
    }

    #[test]
    fn test_error_marker_and_garbage() {
        assert!(GeocodeResult::from_value(&json!({ "error": "HTTP 500" })).is_none());
        assert!(GeocodeResult::from_value(&json!("nope")).is_none());
        assert!(GeocodeResult::list_from_value(&json!({ "a": 1 })).is_empty());

        let partial = GeocodeResult::from_value(&json!({ "lat": "x" })).unwrap();
        assert_eq!(partial.point(), None);
    }
}
