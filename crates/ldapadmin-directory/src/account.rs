//! Account entry model
//!
//! The typed view of an `inetOrgPerson` entry under the user container,
//! plus the attribute enumeration and the partial-update change set.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ChangesParseError;

/// Attributes of an account entry.
///
/// Each variant knows both its LDAP attribute name and the field name the
/// console uses when exchanging accounts as JSON. They only differ for
/// `org`, which is stored as `o`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountAttribute {
    Uid,
    GivenName,
    Surname,
    CommonName,
    Mail,
    TelephoneNumber,
    FacsimileTelephoneNumber,
    Mobile,
    Street,
    PostalCode,
    Locality,
    PostOfficeBox,
    PostalAddress,
    State,
    Org,
    Title,
    Description,
    RoomNumber,
    PhysicalDeliveryOfficeName,
}

impl AccountAttribute {
    /// Every attribute, in entry order.
    pub const ALL: [AccountAttribute; 19] = [
        AccountAttribute::Uid,
        AccountAttribute::GivenName,
        AccountAttribute::Surname,
        AccountAttribute::CommonName,
        AccountAttribute::Mail,
        AccountAttribute::TelephoneNumber,
        AccountAttribute::FacsimileTelephoneNumber,
        AccountAttribute::Mobile,
        AccountAttribute::Street,
        AccountAttribute::PostalCode,
        AccountAttribute::Locality,
        AccountAttribute::PostOfficeBox,
        AccountAttribute::PostalAddress,
        AccountAttribute::State,
        AccountAttribute::Org,
        AccountAttribute::Title,
        AccountAttribute::Description,
        AccountAttribute::RoomNumber,
        AccountAttribute::PhysicalDeliveryOfficeName,
    ];

    /// Name of the attribute in the directory schema.
    pub fn ldap_name(self) -> &'static str {
        match self {
            AccountAttribute::Uid => "uid",
            AccountAttribute::GivenName => "givenName",
            AccountAttribute::Surname => "sn",
            AccountAttribute::CommonName => "cn",
            AccountAttribute::Mail => "mail",
            AccountAttribute::TelephoneNumber => "telephoneNumber",
            AccountAttribute::FacsimileTelephoneNumber => "facsimileTelephoneNumber",
            AccountAttribute::Mobile => "mobile",
            AccountAttribute::Street => "street",
            AccountAttribute::PostalCode => "postalCode",
            AccountAttribute::Locality => "l",
            AccountAttribute::PostOfficeBox => "postOfficeBox",
            AccountAttribute::PostalAddress => "postalAddress",
            AccountAttribute::State => "st",
            AccountAttribute::Org => "o",
            AccountAttribute::Title => "title",
            AccountAttribute::Description => "description",
            AccountAttribute::RoomNumber => "roomNumber",
            AccountAttribute::PhysicalDeliveryOfficeName => "physicalDeliveryOfficeName",
        }
    }

    /// Name of the attribute in the console's JSON representation.
    pub fn field_name(self) -> &'static str {
        match self {
            AccountAttribute::Org => "org",
            other => other.ldap_name(),
        }
    }

    /// Parse an attribute from either its LDAP or its field name.
    ///
    /// LDAP attribute descriptions are case-insensitive, so is this.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| {
            attr.ldap_name().eq_ignore_ascii_case(name) || attr.field_name().eq_ignore_ascii_case(name)
        })
    }

    /// Whether callers may write this attribute directly.
    ///
    /// `uid` is immutable and `cn` is always derived from the name pair.
    pub fn is_settable(self) -> bool {
        !matches!(self, AccountAttribute::Uid | AccountAttribute::CommonName)
    }

    /// Whether this attribute feeds the derived common name.
    pub fn is_name_part(self) -> bool {
        matches!(self, AccountAttribute::GivenName | AccountAttribute::Surname)
    }
}

impl std::fmt::Display for AccountAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// An account stored in the directory.
///
/// Absent attributes are empty strings; the directory has no notion of a
/// present-but-null value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub uid: String,
    #[serde(rename = "givenName")]
    pub given_name: String,
    #[serde(rename = "sn")]
    pub surname: String,
    #[serde(rename = "cn")]
    pub common_name: String,
    pub mail: String,
    #[serde(rename = "telephoneNumber")]
    pub telephone_number: String,
    #[serde(rename = "facsimileTelephoneNumber")]
    pub facsimile_telephone_number: String,
    pub mobile: String,
    pub street: String,
    #[serde(rename = "postalCode")]
    pub postal_code: String,
    #[serde(rename = "l")]
    pub locality: String,
    #[serde(rename = "postOfficeBox")]
    pub post_office_box: String,
    #[serde(rename = "postalAddress")]
    pub postal_address: String,
    #[serde(rename = "st")]
    pub state: String,
    #[serde(alias = "o")]
    pub org: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "roomNumber")]
    pub room_number: String,
    #[serde(rename = "physicalDeliveryOfficeName")]
    pub physical_delivery_office_name: String,
}

impl Account {
    /// Create an account with its identity and name pair set.
    pub fn new(
        uid: impl Into<String>,
        given_name: impl Into<String>,
        surname: impl Into<String>,
    ) -> Self {
        let mut account = Self {
            uid: uid.into(),
            given_name: given_name.into(),
            surname: surname.into(),
            ..Self::default()
        };
        account.refresh_common_name();
        account
    }

    /// Set an attribute using builder pattern.
    #[must_use]
    pub fn with(mut self, attribute: AccountAttribute, value: impl Into<String>) -> Self {
        self.set(attribute, value);
        self
    }

    /// The common name for a given name and surname.
    pub fn compose_common_name(given_name: &str, surname: &str) -> String {
        format!("{given_name} {surname}")
    }

    /// Recompute `cn` from the current name pair.
    pub fn refresh_common_name(&mut self) {
        self.common_name = Self::compose_common_name(&self.given_name, &self.surname);
    }

    /// Get an attribute value (empty when absent).
    pub fn get(&self, attribute: AccountAttribute) -> &str {
        match attribute {
            AccountAttribute::Uid => &self.uid,
            AccountAttribute::GivenName => &self.given_name,
            AccountAttribute::Surname => &self.surname,
            AccountAttribute::CommonName => &self.common_name,
            AccountAttribute::Mail => &self.mail,
            AccountAttribute::TelephoneNumber => &self.telephone_number,
            AccountAttribute::FacsimileTelephoneNumber => &self.facsimile_telephone_number,
            AccountAttribute::Mobile => &self.mobile,
            AccountAttribute::Street => &self.street,
            AccountAttribute::PostalCode => &self.postal_code,
            AccountAttribute::Locality => &self.locality,
            AccountAttribute::PostOfficeBox => &self.post_office_box,
            AccountAttribute::PostalAddress => &self.postal_address,
            AccountAttribute::State => &self.state,
            AccountAttribute::Org => &self.org,
            AccountAttribute::Title => &self.title,
            AccountAttribute::Description => &self.description,
            AccountAttribute::RoomNumber => &self.room_number,
            AccountAttribute::PhysicalDeliveryOfficeName => &self.physical_delivery_office_name,
        }
    }

    /// Overwrite an attribute value.
    ///
    /// This is a raw setter: it does not recompute `cn`.
    pub fn set(&mut self, attribute: AccountAttribute, value: impl Into<String>) {
        let value = value.into();
        let slot = match attribute {
            AccountAttribute::Uid => &mut self.uid,
            AccountAttribute::GivenName => &mut self.given_name,
            AccountAttribute::Surname => &mut self.surname,
            AccountAttribute::CommonName => &mut self.common_name,
            AccountAttribute::Mail => &mut self.mail,
            AccountAttribute::TelephoneNumber => &mut self.telephone_number,
            AccountAttribute::FacsimileTelephoneNumber => &mut self.facsimile_telephone_number,
            AccountAttribute::Mobile => &mut self.mobile,
            AccountAttribute::Street => &mut self.street,
            AccountAttribute::PostalCode => &mut self.postal_code,
            AccountAttribute::Locality => &mut self.locality,
            AccountAttribute::PostOfficeBox => &mut self.post_office_box,
            AccountAttribute::PostalAddress => &mut self.postal_address,
            AccountAttribute::State => &mut self.state,
            AccountAttribute::Org => &mut self.org,
            AccountAttribute::Title => &mut self.title,
            AccountAttribute::Description => &mut self.description,
            AccountAttribute::RoomNumber => &mut self.room_number,
            AccountAttribute::PhysicalDeliveryOfficeName => &mut self.physical_delivery_office_name,
        };
        *slot = value;
    }

    /// Non-empty attributes, in entry order.
    pub fn present_attributes(&self) -> impl Iterator<Item = (AccountAttribute, &str)> {
        AccountAttribute::ALL
            .into_iter()
            .map(|attr| (attr, self.get(attr)))
            .filter(|(_, value)| !value.is_empty())
    }
}

/// A partial update: the attributes to overwrite and their new values.
///
/// A key present with an empty value clears the attribute; a key absent
/// from the set leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountChanges {
    values: BTreeMap<AccountAttribute, String>,
}

impl AccountChanges {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value using builder pattern.
    #[must_use]
    pub fn with(mut self, attribute: AccountAttribute, value: impl Into<String>) -> Self {
        self.set(attribute, value);
        self
    }

    /// Set a value.
    pub fn set(&mut self, attribute: AccountAttribute, value: impl Into<String>) {
        self.values.insert(attribute, value.into());
    }

    /// Get the requested value for an attribute, if any.
    pub fn get(&self, attribute: AccountAttribute) -> Option<&str> {
        self.values.get(&attribute).map(String::as_str)
    }

    /// Check if an attribute is part of the change set.
    pub fn contains(&self, attribute: AccountAttribute) -> bool {
        self.values.contains_key(&attribute)
    }

    /// Remove an attribute from the change set.
    pub fn remove(&mut self, attribute: AccountAttribute) -> Option<String> {
        self.values.remove(&attribute)
    }

    /// Iterate over the changes in attribute order.
    pub fn iter(&self) -> impl Iterator<Item = (AccountAttribute, &str)> {
        self.values.iter().map(|(attr, value)| (*attr, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the given name or surname changes.
    pub fn touches_name(&self) -> bool {
        self.values.keys().any(|attr| attr.is_name_part())
    }

    /// Attributes callers are not allowed to write.
    pub fn unsettable(&self) -> impl Iterator<Item = AccountAttribute> + '_ {
        self.values.keys().copied().filter(|attr| !attr.is_settable())
    }

    /// Overlay the changes onto an account.
    pub fn apply_to(&self, account: &mut Account) {
        for (attr, value) in self.iter() {
            account.set(attr, value);
        }
    }

    /// Build a change set from a JSON object keyed by attribute name.
    ///
    /// Values must be strings; unknown keys are rejected rather than
    /// silently dropped.
    pub fn from_json(value: &Value) -> Result<Self, ChangesParseError> {
        let object = value
            .as_object()
            .ok_or_else(|| ChangesParseError::new("expected a JSON object"))?;

        let mut changes = Self::new();
        for (key, raw) in object {
            let attribute = AccountAttribute::parse(key)
                .ok_or_else(|| ChangesParseError::new(format!("unknown attribute '{key}'")))?;
            let text = raw.as_str().ok_or_else(|| {
                ChangesParseError::new(format!("attribute '{key}' must be a string"))
            })?;
            changes.set(attribute, text);
        }
        Ok(changes)
    }
}

impl FromIterator<(AccountAttribute, String)> for AccountChanges {
    fn from_iter<T: IntoIterator<Item = (AccountAttribute, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
