//! Address component lookup shared by every source.
//!
//! Upstream address objects are schemaless, so they are kept as open string
//! maps. The fallback chains used to pull district/taluk/panchayat out of them
//! live here and nowhere else.

use std::collections::BTreeMap;

use serde_json::Value;

/// Free-form address components, keyed by upstream field name.
pub type AddressMap = BTreeMap<String, String>;

/// Administrative unit extracted from an address or a tag set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminField {
    /// District / ADM2
    District,
    /// Taluk, tehsil or block
    Taluk,
    /// Village panchayat / local body
    Panchayat,
}

impl AdminField {
    /// Keys of a geocoder `address` object, in priority order
    pub const fn geocoder_keys(self) -> &'static [&'static str] {
        match self {
            AdminField::District => &[
                "state_district",
                "district",
                "county",
                "city_district",
                "region",
            ],
            AdminField::Taluk => &["subdistrict", "taluk", "tehsil", "block", "county"],
            AdminField::Panchayat => &[
                "panchayat",
                "village_panchayat",
                "gram_panchayat",
                "grama_panchayat",
            ],
        }
    }

    /// Tags of a POI export element, in priority order
    pub const fn export_tags(self) -> &'static [&'static str] {
        match self {
            AdminField::District => &["addr:district", "is_in:county", "is_in:district", "county"],
            AdminField::Taluk => &[
                "addr:subdistrict",
                "is_in:subdistrict",
                "is_in:tehsil",
                "is_in:taluk",
                "subdistrict",
                "tehsil",
                "taluk",
                "block",
                "sub_district",
            ],
            AdminField::Panchayat => &[
                "panchayat",
                "addr:panchayat",
                "village_panchayat",
                "grampanchayat",
                "grama_panchayat",
                "panchayat_name",
            ],
        }
    }

    /// First non-blank geocoder address value for this field
    pub fn from_address(self, address: &AddressMap) -> Option<&str> {
        pick(address, self.geocoder_keys())
    }
}

/// First non-blank value among `keys`, in order
pub fn pick<'a, M>(map: &'a M, keys: &[&str]) -> Option<&'a str>
where
    M: Lookup,
{
    keys.iter()
        .filter_map(|key| map.lookup(key))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Read access shared by the string maps we pick from
pub trait Lookup {
    fn lookup(&self, key: &str) -> Option<&str>;
}

impl Lookup for AddressMap {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl<S: std::hash::BuildHasher> Lookup for std::collections::HashMap<String, String, S> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Convert an arbitrary JSON object into an address map.
///
/// Strings are kept as-is, numbers and booleans are stringified, anything else
/// is dropped.
pub fn address_from_value(value: Option<&Value>) -> AddressMap {
    let mut out = AddressMap::new();
    let Some(Value::Object(obj)) = value else {
        return out;
    };
    for (key, value) in obj {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        out.insert(key.clone(), text);
    }
    out
}
