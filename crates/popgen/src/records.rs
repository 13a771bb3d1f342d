//! Generated record types.
//!
//! Each person exists in two shapes: an embedded variant carried inside the
//! family document ([`Person`], [`Child`]) and a standalone variant written
//! to its own stream ([`PersonRecord`], [`ChildRecord`]). The embedded
//! copies omit the address and family back-reference because the family
//! document already carries them; the standalone copies are self-sufficient
//! for direct lookup.

use serde::Serialize;
use time::Date;
use uuid::Uuid;

use crate::generators::dates::{CardExpiry, yymmdd};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MaritalStatus {
    Single,
    Married,
    Separated,
    Divorced,
    Widowed,
}

impl MaritalStatus {
    /// True for the statuses where the spouses keep distinct households.
    pub fn separate_households(&self) -> bool {
        matches!(self, MaritalStatus::Separated | MaritalStatus::Divorced)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LivingStatus {
    Living,
    Deceased,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub street: String,
    pub town: String,
    pub county: String,
    pub state: String,
    pub post_code: String,
    pub country: String,
}

/// A deposit account at a bank.
#[derive(Debug, Clone, Serialize)]
pub struct BankAccount {
    pub bank: String,
    pub bicfi_code: String,
    pub swift_code: String,
    pub iban_structure: String,
    pub account_number: String,
    pub account_type: String,
}

/// A credit card issued by a bank on one of its supported networks.
#[derive(Debug, Clone, Serialize)]
pub struct CreditCard {
    pub card_holder: String,
    pub card_number: String,
    pub exp_date: CardExpiry,
    pub card_network: String,
    pub issuing_bank: String,
    pub iban_structure: String,
}

/// An adult's account list mixes deposit accounts and cards.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Account {
    Bank(BankAccount),
    Card(CreditCard),
}

/// Adult fields shared by the embedded and standalone variants.
#[derive(Debug, Clone, Serialize)]
pub struct Person {
    pub name: String,
    pub surname: String,
    pub national_id: String,
    pub gender: Gender,
    #[serde(with = "yymmdd")]
    pub dob: Date,
    pub marital_status: MaritalStatus,
    /// The spouse's national identifier, absent for single adults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<String>,
    pub status: LivingStatus,
    pub accounts: Vec<Account>,
}

/// Standalone adult record for the adults stream.
#[derive(Debug, Clone, Serialize)]
pub struct PersonRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub person: Person,
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_id: Option<Uuid>,
}

/// Child fields shared by the embedded and standalone variants. The parent
/// references are identifiers, not object links.
#[derive(Debug, Clone, Serialize)]
pub struct Child {
    pub name: String,
    pub surname: String,
    pub gender: Gender,
    #[serde(with = "yymmdd")]
    pub dob: Date,
    pub national_id: String,
    pub father_id: String,
    pub mother_id: String,
}

/// Standalone child record for the children stream.
#[derive(Debug, Clone, Serialize)]
pub struct ChildRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub child: Child,
    pub address: Address,
    pub family_id: Uuid,
}

/// Family document for the families stream. At least one spouse is always
/// present; separated and divorced families list only the custodial parent.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyRecord {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub husband: Option<Person>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wife: Option<Person>,
    pub address: Address,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Child>,
}
