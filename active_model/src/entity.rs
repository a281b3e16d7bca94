//! Typed records
//!
//! An `Entity` is a plain serde struct bound to one table. It converts to and
//! from the attribute bag, so callers work with named fields while the model
//! keeps its generic row handling.

use crate::attributes::Attributes;
use crate::errors::ModelError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait Entity: Serialize + DeserializeOwned {
    /// Backing table
    const TABLE: &'static str;

    /// Field order of the struct becomes attribute order
    fn to_attributes(&self) -> Result<Attributes, ModelError> {
        let encoded = serde_json::to_string(self)?;
        Ok(serde_json::from_str(&encoded)?)
    }

    fn from_attributes(attributes: &Attributes) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(attributes.clone().into_json())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Listing {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<i64>,
        title: String,
        price: i64,
    }

    impl Entity for Listing {
        const TABLE: &'static str = "listings";
    }

    #[test]
    fn new_entity_has_no_key_attribute() {
        let listing = Listing {
            id: None,
            title: "Casa".to_string(),
            price: 100,
        };
        let attributes = listing.to_attributes().unwrap();
        assert!(attributes.get("id").is_none());

        let keys: Vec<&String> = attributes.keys().collect();
        assert_eq!(keys, ["title", "price"]);
    }

    #[test]
    fn round_trip_through_attributes() {
        let mut attributes = Attributes::new();
        attributes.set("id", 4);
        attributes.set("title", "Apartamento");
        attributes.set("price", 250);

        let listing = Listing::from_attributes(&attributes).unwrap();
        assert_eq!(listing.id, Some(4));
        assert_eq!(listing.title, "Apartamento");
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let mut attributes = Attributes::new();
        attributes.set("title", "Terreno");
        assert!(matches!(
            Listing::from_attributes(&attributes),
            Err(ModelError::Serialization(_))
        ));
    }
}
