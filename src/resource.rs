//! Core trait implemented by every resource the client decodes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Trait that all listable resources must implement.
///
/// The id doubles as the pagination cursor: the next page of a list starts
/// after the id of the last element of the current one.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use invoice_kit::resource::ApiResource;
///
/// #[derive(Clone, Deserialize)]
/// pub struct Coupon {
///     pub id: String,
///     pub percent_off: u32,
/// }
///
/// impl ApiResource for Coupon {
///     fn id(&self) -> &str {
///         &self.id
///     }
///
///     fn object_name() -> &'static str {
///         "coupon"
///     }
/// }
/// ```
pub trait ApiResource: Send + Sync + DeserializeOwned + Clone {
    /// The service-assigned identifier.
    fn id(&self) -> &str;

    /// The `object` tag the service uses for this type. Used in logs.
    fn object_name() -> &'static str;
}

/// Marker returned by delete calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub id: String,
    pub deleted: bool,
}

/// Billing period boundaries, in epoch seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: i64,
    pub end: i64,
}

/// A reference that arrives either as a bare id or as the expanded object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    fn into_id(self) -> String {
        match self {
            Expandable::Id(id) | Expandable::Object { id } => id,
        }
    }
}

pub(crate) fn expandable_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Expandable::deserialize(deserializer).map(Expandable::into_id)
}

pub(crate) fn optional_expandable_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Expandable>::deserialize(deserializer)?.map(Expandable::into_id))
}

/// Decode `null` as the type's default. The service sends `"tax": null`
/// for invoices without a tax rate.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
