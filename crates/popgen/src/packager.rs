//! Household packaging: turns weighted draws into fully linked record sets.
//!
//! One call to [`HouseholdFactory::generate`] resolves a single household
//! decision: a single adult, or a married/separated/divorced/widowed couple
//! with an optional run of children, each person emitted in both the
//! family-embedded and standalone variants with consistent back-references.

use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rand::Rng;
use time::Date;
use uuid::Uuid;

use crate::error::GenError;
use crate::generators::account::AccountFactory;
use crate::generators::address::AddressGenerator;
use crate::generators::dates::relative_birth_date;
use crate::generators::identity::{self, NationalIdGenerator, UniquenessScope};
use crate::options::DemographicOptions;
use crate::records::{
    Address, Child, ChildRecord, FamilyRecord, Gender, LivingStatus, MaritalStatus, Person,
    PersonRecord,
};
use crate::seed::banks::BankDirectory;
use crate::seed::geo::GeoDirectory;

/// Mean spouse age offset around the husband's birth date, in years.
const SPOUSE_AGE_GAP_YEARS: f64 = 4.0;
const SPOUSE_AGE_GAP_STD_DEV: f64 = 4.0;

/// Settings the factory needs from the run configuration.
#[derive(Debug, Clone)]
pub struct HouseholdConfig {
    pub locale: String,
    pub country: String,
    /// Mean age gap between mother and child, in years.
    pub age_gap_years: f64,
    /// Standard deviation of that gap, in years.
    pub age_gap_std_dev: f64,
}

impl Default for HouseholdConfig {
    fn default() -> Self {
        Self {
            locale: "en_IE".to_string(),
            country: "Ireland".to_string(),
            age_gap_years: 18.0,
            age_gap_std_dev: 4.5,
        }
    }
}

/// One generated household, split into the three output streams.
#[derive(Debug, Clone)]
pub struct Household {
    pub adults: Vec<PersonRecord>,
    pub children: Vec<ChildRecord>,
    pub family: Option<FamilyRecord>,
    /// Number of people in the household, used for batch accounting.
    pub members: usize,
}

/// Assembles households from weighted draws. Holds all per-run state:
/// option sets, reference directories, and the uniqueness scopes.
pub struct HouseholdFactory {
    config: HouseholdConfig,
    opts: DemographicOptions,
    accounts: AccountFactory,
    addresses: AddressGenerator,
    geo: GeoDirectory,
    banks: BankDirectory,
    ids: Box<dyn NationalIdGenerator>,
    national_ids: UniquenessScope,
    account_numbers: UniquenessScope,
    card_numbers: UniquenessScope,
}

impl HouseholdFactory {
    pub fn new(
        config: HouseholdConfig,
        geo: GeoDirectory,
        banks: BankDirectory,
    ) -> Result<Self, GenError> {
        Ok(Self {
            accounts: AccountFactory::new(&banks)?,
            addresses: AddressGenerator::new(config.country.clone(), &geo)?,
            ids: identity::for_locale(&config.locale)?,
            opts: DemographicOptions::census_2022(),
            config,
            geo,
            banks,
            national_ids: UniquenessScope::new(),
            account_numbers: UniquenessScope::new(),
            card_numbers: UniquenessScope::new(),
        })
    }

    /// Overrides the demographic option sets.
    pub fn with_demographics(mut self, opts: DemographicOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Generates one household anchored on the given (male) birth date.
    pub fn generate(&mut self, dob: Date, rng: &mut impl Rng) -> Result<Household, GenError> {
        let address = self.addresses.generate(&self.geo, rng);
        let marital = self.opts.marital.pick(rng);

        match marital {
            MaritalStatus::Single => self.single_household(dob, address, rng),
            status => self.family_household(dob, address, status, rng),
        }
    }

    fn single_household(
        &mut self,
        dob: Date,
        address: Address,
        rng: &mut impl Rng,
    ) -> Result<Household, GenError> {
        let name: String = FirstName().fake_with_rng(rng);
        let surname: String = LastName().fake_with_rng(rng);
        let gender = self.opts.gender.pick(rng);

        // A female single adult gets her own birth date offset around the
        // batch date, the same spread as a spouse would get.
        let dob = match gender {
            Gender::Male => dob,
            Gender::Female => {
                relative_birth_date(dob, SPOUSE_AGE_GAP_YEARS, SPOUSE_AGE_GAP_STD_DEV, rng)
            }
        };

        let national_id = self
            .ids
            .generate(dob, gender, &mut self.national_ids, rng)?;
        let accounts = self.accounts.portfolio(
            &self.banks,
            initial(&name),
            &surname,
            &mut self.account_numbers,
            &mut self.card_numbers,
            rng,
        )?;

        let adult = PersonRecord {
            id: Uuid::new_v4(),
            person: Person {
                name,
                surname,
                national_id,
                gender,
                dob,
                marital_status: MaritalStatus::Single,
                partner: None,
                status: LivingStatus::Living,
                accounts,
            },
            address,
            family_id: None,
        };

        Ok(Household {
            adults: vec![adult],
            children: Vec::new(),
            family: None,
            members: 1,
        })
    }

    fn family_household(
        &mut self,
        husband_dob: Date,
        address: Address,
        marital: MaritalStatus,
        rng: &mut impl Rng,
    ) -> Result<Household, GenError> {
        let family_id = Uuid::new_v4();
        let surname: String = LastName().fake_with_rng(rng);

        let wife_dob =
            relative_birth_date(husband_dob, SPOUSE_AGE_GAP_YEARS, SPOUSE_AGE_GAP_STD_DEV, rng);
        let husband_id =
            self.ids
                .generate(husband_dob, Gender::Male, &mut self.national_ids, rng)?;
        let wife_id = self
            .ids
            .generate(wife_dob, Gender::Female, &mut self.national_ids, rng)?;

        // Separated and divorced wives run their own household under their
        // own surname, in the same locality.
        let (wife_surname, wife_address) = if marital.separate_households() {
            let surname: String = LastName().fake_with_rng(rng);
            let address = self.addresses.street_address(
                address.town.clone(),
                address.county.clone(),
                address.state.clone(),
                rng,
            );
            (surname, address)
        } else {
            (surname.clone(), address.clone())
        };

        let mother_custody = self.opts.mother_custody.pick(rng);
        let child_address = if marital.separate_households() && mother_custody {
            wife_address.clone()
        } else {
            address.clone()
        };

        let children_count = if self.opts.has_children.pick(rng) {
            self.opts.children_count.pick(rng)
        } else {
            0
        };

        let mut embedded_children = Vec::with_capacity(children_count as usize);
        let mut standalone_children = Vec::with_capacity(children_count as usize);
        for _ in 0..children_count {
            let (child, record) = self.package_child(
                &surname,
                wife_dob,
                &husband_id,
                &wife_id,
                &child_address,
                family_id,
                rng,
            )?;
            embedded_children.push(child);
            standalone_children.push(record);
        }

        let (husband_status, wife_status) = if marital == MaritalStatus::Widowed {
            self.widowed_statuses(rng)
        } else {
            (LivingStatus::Living, LivingStatus::Living)
        };

        let (husband, husband_record) = self.package_adult(
            AdultDraw {
                surname,
                gender: Gender::Male,
                dob: husband_dob,
                national_id: husband_id,
                partner_id: wife_id.clone(),
                status: husband_status,
                address: address.clone(),
            },
            marital,
            family_id,
            rng,
        )?;
        let (wife, wife_record) = self.package_adult(
            AdultDraw {
                surname: wife_surname,
                gender: Gender::Female,
                dob: wife_dob,
                national_id: wife_id,
                partner_id: husband.national_id.clone(),
                status: wife_status,
                address: wife_address.clone(),
            },
            marital,
            family_id,
            rng,
        )?;

        let family = match marital {
            MaritalStatus::Married | MaritalStatus::Widowed => Some(FamilyRecord {
                id: family_id,
                husband: Some(husband),
                wife: Some(wife),
                address,
                children: embedded_children,
            }),
            // The family document exists only for the custodial household,
            // and only when there are children to list.
            MaritalStatus::Separated | MaritalStatus::Divorced => {
                if standalone_children.is_empty() {
                    None
                } else if mother_custody {
                    Some(FamilyRecord {
                        id: family_id,
                        husband: None,
                        wife: Some(wife),
                        address: wife_address,
                        children: embedded_children,
                    })
                } else {
                    Some(FamilyRecord {
                        id: family_id,
                        husband: Some(husband),
                        wife: None,
                        address,
                        children: embedded_children,
                    })
                }
            }
            MaritalStatus::Single => None,
        };

        let members = 2 + standalone_children.len();
        Ok(Household {
            adults: vec![husband_record, wife_record],
            children: standalone_children,
            family,
            members,
        })
    }

    /// Builds the embedded and standalone variants for one adult.
    fn package_adult(
        &mut self,
        draw: AdultDraw,
        marital: MaritalStatus,
        family_id: Uuid,
        rng: &mut impl Rng,
    ) -> Result<(Person, PersonRecord), GenError> {
        let name: String = FirstName().fake_with_rng(rng);
        let accounts = self.accounts.portfolio(
            &self.banks,
            initial(&name),
            &draw.surname,
            &mut self.account_numbers,
            &mut self.card_numbers,
            rng,
        )?;

        let person = Person {
            name,
            surname: draw.surname,
            national_id: draw.national_id,
            gender: draw.gender,
            dob: draw.dob,
            marital_status: marital,
            partner: Some(draw.partner_id),
            status: draw.status,
            accounts,
        };

        let record = PersonRecord {
            id: Uuid::new_v4(),
            person: person.clone(),
            address: draw.address,
            family_id: Some(family_id),
        };

        Ok((person, record))
    }

    fn package_child(
        &mut self,
        surname: &str,
        mother_dob: Date,
        father_id: &str,
        mother_id: &str,
        address: &Address,
        family_id: Uuid,
        rng: &mut impl Rng,
    ) -> Result<(Child, ChildRecord), GenError> {
        let gender = self.opts.gender.pick(rng);
        let dob = relative_birth_date(
            mother_dob,
            self.config.age_gap_years,
            self.config.age_gap_std_dev,
            rng,
        );
        let national_id = self
            .ids
            .generate(dob, gender, &mut self.national_ids, rng)?;
        let name: String = FirstName().fake_with_rng(rng);

        let child = Child {
            name,
            surname: surname.to_string(),
            gender,
            dob,
            national_id,
            father_id: father_id.to_string(),
            mother_id: mother_id.to_string(),
        };

        let record = ChildRecord {
            id: Uuid::new_v4(),
            child: child.clone(),
            address: address.clone(),
            family_id,
        };

        Ok((child, record))
    }

    /// Two independent living-status draws corrected to the single-Deceased
    /// invariant. Ties resolve deterministically: both Deceased revives the
    /// husband, both Living buries him.
    fn widowed_statuses(&self, rng: &mut impl Rng) -> (LivingStatus, LivingStatus) {
        let husband = self.opts.living_status.pick(rng);
        let wife = self.opts.living_status.pick(rng);

        match (husband, wife) {
            (LivingStatus::Deceased, LivingStatus::Deceased) => {
                (LivingStatus::Living, LivingStatus::Deceased)
            }
            (LivingStatus::Living, LivingStatus::Living) => {
                (LivingStatus::Deceased, LivingStatus::Living)
            }
            mixed => mixed,
        }
    }
}

/// Pre-drawn attributes for one adult of a couple.
struct AdultDraw {
    surname: String,
    gender: Gender,
    dob: Date,
    national_id: String,
    partner_id: String,
    status: LivingStatus,
    address: Address,
}

fn initial(name: &str) -> char {
    name.chars().next().unwrap_or('X')
}
