//! Check-in form workflow.
//!
//! `RegistrationForm` holds what an operator has typed so far and decides which
//! fields are editable, which catalog options are offered and when the form can
//! be submitted. The server runs the same `RegistrationDraft::validate` rules on
//! every create and update.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::FieldError;
use crate::services::catalog::Catalog;
use crate::services::plate_lookup::PlateLookup;
use crate::services::pricing::{self, PriceBreakdown};
use crate::utils::plate::{is_lookup_ready, is_valid_plate, normalize_plate};

pub const MIN_NATIONAL_ID_DIGITS: usize = 6;
pub const MIN_PHONE_DIGITS: usize = 10;

// Column widths of vehicle_records
pub const MAX_CLIENT_NAME_LEN: usize = 100;
pub const MAX_NATIONAL_ID_LEN: usize = 20;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_COLOR_LEN: usize = 30;
pub const MAX_PAYMENT_REFERENCE_LEN: usize = 100;

/// Fields a client-side form exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    ClientName,
    NationalId,
    Phone,
    Plate,
    Color,
    VehicleType,
    Service,
    Extras,
    PaymentReference,
    Notes,
}

/// Locked once a plate lookup finds a previous visit.
pub const LOCKED_ON_MATCH: [FormField; 5] = [
    FormField::ClientName,
    FormField::NationalId,
    FormField::Phone,
    FormField::Color,
    FormField::VehicleType,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStage {
    EnteringPlate,
    LookupPending,
    Prefilled,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(Uuid),
}

/// What the caller should do after the plate changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlateAction {
    /// Too short: downstream state was cleared.
    Reset,
    /// Queue a (debounced) lookup for this normalized plate.
    Lookup(String),
    /// Nothing to look up.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved: the form is empty again and the list should be reloaded.
    RefreshList,
    /// Not saved: the form keeps its values.
    KeepEditing { message: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("{0:?} is filled from the previous visit and cannot be edited")]
    Locked(FormField),
    #[error("enter a plate before filling the rest of the form")]
    NotReady,
    #[error("unknown {field:?} option {id}")]
    UnknownOption { field: FormField, id: i32 },
    #[error("service {0} is not offered for the selected vehicle type")]
    IncompatibleService(i32),
    #[error("a submission is already in progress")]
    InFlight,
    #[error("the form has invalid fields")]
    Invalid(Vec<FieldError>),
}

/// Values of one check-in, as typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationDraft {
    pub client_name: String,
    pub national_id: String,
    pub phone: String,
    pub plate: String,
    pub color: String,
    pub vehicle_type_id: Option<i32>,
    pub service_id: Option<i32>,
    #[serde(default)]
    pub extra_service_ids: Vec<i32>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

fn digit_count(value: &str) -> usize {
    value.chars().filter(char::is_ascii_digit).count()
}

fn too_long(value: &str, max: usize) -> bool {
    value.trim().chars().count() > max
}

fn length_error(field: &'static str, label: &str, max: usize) -> FieldError {
    FieldError::new(field, format!("{} must have at most {} characters", label, max))
}

impl RegistrationDraft {
    /// Every broken rule at once, in form order.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.client_name.trim().is_empty() {
            errors.push(FieldError::new("client_name", "Client name is required"));
        } else if too_long(&self.client_name, MAX_CLIENT_NAME_LEN) {
            errors.push(length_error("client_name", "Client name", MAX_CLIENT_NAME_LEN));
        }
        if digit_count(&self.national_id) < MIN_NATIONAL_ID_DIGITS {
            errors.push(FieldError::new(
                "national_id",
                format!("National ID must have at least {} digits", MIN_NATIONAL_ID_DIGITS),
            ));
        } else if too_long(&self.national_id, MAX_NATIONAL_ID_LEN) {
            errors.push(length_error("national_id", "National ID", MAX_NATIONAL_ID_LEN));
        }
        if digit_count(&self.phone) < MIN_PHONE_DIGITS {
            errors.push(FieldError::new(
                "phone",
                format!("Phone must have at least {} digits", MIN_PHONE_DIGITS),
            ));
        } else if too_long(&self.phone, MAX_PHONE_LEN) {
            errors.push(length_error("phone", "Phone", MAX_PHONE_LEN));
        }
        if !is_valid_plate(&normalize_plate(&self.plate)) {
            errors.push(FieldError::new("plate", "Plate must have between 5 and 8 characters"));
        }
        if self.color.trim().is_empty() {
            errors.push(FieldError::new("color", "Color is required"));
        } else if too_long(&self.color, MAX_COLOR_LEN) {
            errors.push(length_error("color", "Color", MAX_COLOR_LEN));
        }
        if self.vehicle_type_id.is_none() {
            errors.push(FieldError::new("vehicle_type_id", "Vehicle type is required"));
        }
        if self.service_id.is_none() {
            errors.push(FieldError::new("service_id", "Service is required"));
        }
        if let Some(reference) = &self.payment_reference {
            if too_long(reference, MAX_PAYMENT_REFERENCE_LEN) {
                errors.push(length_error(
                    "payment_reference",
                    "Payment reference",
                    MAX_PAYMENT_REFERENCE_LEN,
                ));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn clear_client(&mut self) {
        self.client_name.clear();
        self.national_id.clear();
        self.phone.clear();
        self.color.clear();
        self.vehicle_type_id = None;
        self.service_id = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationForm {
    mode: FormMode,
    stage: FormStage,
    draft: RegistrationDraft,
    locked: bool,
    submitting: bool,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self {
            mode: FormMode::Create,
            stage: FormStage::EnteringPlate,
            draft: RegistrationDraft::default(),
            locked: false,
            submitting: false,
        }
    }

    /// Start from a saved record. Everything stays editable.
    pub fn edit(id: Uuid, draft: RegistrationDraft) -> Self {
        Self {
            mode: FormMode::Edit(id),
            stage: FormStage::Manual,
            draft,
            locked: false,
            submitting: false,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn stage(&self) -> FormStage {
        self.stage
    }

    pub fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether the fields past the plate are shown.
    pub fn shows_details(&self) -> bool {
        matches!(self.stage, FormStage::Prefilled | FormStage::Manual)
    }

    pub fn is_locked(&self, field: FormField) -> bool {
        self.locked && LOCKED_ON_MATCH.contains(&field)
    }

    pub fn set_plate(&mut self, raw: &str) -> PlateAction {
        let plate = normalize_plate(raw);
        let changed = plate != self.draft.plate;
        self.draft.plate = plate.clone();

        if let FormMode::Edit(_) = self.mode {
            return PlateAction::Ignore;
        }

        if !is_lookup_ready(&plate) {
            self.draft.clear_client();
            self.draft.extra_service_ids.clear();
            self.locked = false;
            self.stage = FormStage::EnteringPlate;
            return PlateAction::Reset;
        }

        if !changed && self.stage != FormStage::EnteringPlate {
            return PlateAction::Ignore;
        }

        self.stage = FormStage::LookupPending;
        PlateAction::Lookup(plate)
    }

    /// Apply a lookup answer. Answers for a plate that is no longer in the form
    /// are dropped; returns whether the answer was applied.
    pub fn apply_lookup(&mut self, plate: &str, result: &PlateLookup, catalog: &Catalog) -> bool {
        if self.stage != FormStage::LookupPending || plate != self.draft.plate {
            return false;
        }

        match (&result.client_info, result.found) {
            (Some(info), true) => {
                self.draft.client_name = info.client_name.clone();
                self.draft.national_id = info.national_id.clone();
                self.draft.phone = info.phone.clone();
                self.draft.color = info.color.clone();
                self.draft.vehicle_type_id = result.vehicle_type_id;
                self.draft.service_id =
                    catalog.retain_service(self.draft.vehicle_type_id, self.draft.service_id);
                self.locked = true;
                self.stage = FormStage::Prefilled;
            }
            _ => self.enter_manual(),
        }
        true
    }

    /// A lookup that errored is handled like an unknown plate.
    pub fn lookup_failed(&mut self, plate: &str) -> bool {
        if self.stage != FormStage::LookupPending || plate != self.draft.plate {
            return false;
        }
        self.enter_manual();
        true
    }

    fn enter_manual(&mut self) {
        if self.locked {
            self.draft.clear_client();
        }
        self.locked = false;
        self.stage = FormStage::Manual;
    }

    fn ensure_editable(&self, field: FormField) -> Result<(), FormError> {
        if !self.shows_details() {
            return Err(FormError::NotReady);
        }
        if self.is_locked(field) {
            return Err(FormError::Locked(field));
        }
        Ok(())
    }

    pub fn set_text(&mut self, field: FormField, value: &str) -> Result<(), FormError> {
        if field == FormField::Plate {
            self.set_plate(value);
            return Ok(());
        }
        self.ensure_editable(field)?;

        let optional = |v: &str| {
            let v = v.trim();
            (!v.is_empty()).then(|| v.to_string())
        };
        match field {
            FormField::ClientName => self.draft.client_name = value.to_string(),
            FormField::NationalId => self.draft.national_id = value.trim().to_string(),
            FormField::Phone => self.draft.phone = value.trim().to_string(),
            FormField::Color => self.draft.color = value.to_string(),
            FormField::PaymentReference => self.draft.payment_reference = optional(value),
            FormField::Notes => self.draft.notes = optional(value),
            FormField::Plate | FormField::VehicleType | FormField::Service | FormField::Extras => {}
        }
        Ok(())
    }

    /// Pick a vehicle type; a selected service outside its category is cleared.
    pub fn select_vehicle_type(&mut self, id: i32, catalog: &Catalog) -> Result<(), FormError> {
        self.ensure_editable(FormField::VehicleType)?;
        if catalog.vehicle_type(id).is_none() {
            return Err(FormError::UnknownOption {
                field: FormField::VehicleType,
                id,
            });
        }
        self.draft.vehicle_type_id = Some(id);
        self.draft.service_id = catalog.retain_service(Some(id), self.draft.service_id);
        Ok(())
    }

    pub fn select_service(&mut self, id: Option<i32>, catalog: &Catalog) -> Result<(), FormError> {
        self.ensure_editable(FormField::Service)?;
        let Some(id) = id else {
            self.draft.service_id = None;
            return Ok(());
        };
        if catalog.service(id).is_none() {
            return Err(FormError::UnknownOption {
                field: FormField::Service,
                id,
            });
        }
        if catalog.retain_service(self.draft.vehicle_type_id, Some(id)).is_none() {
            return Err(FormError::IncompatibleService(id));
        }
        self.draft.service_id = Some(id);
        Ok(())
    }

    /// Flip an extra on or off; returns whether it is now selected.
    pub fn toggle_extra(&mut self, id: i32, catalog: &Catalog) -> Result<bool, FormError> {
        self.ensure_editable(FormField::Extras)?;
        if catalog.extra(id).is_none() {
            return Err(FormError::UnknownOption {
                field: FormField::Extras,
                id,
            });
        }
        let extras = &mut self.draft.extra_service_ids;
        if let Some(pos) = extras.iter().position(|e| *e == id) {
            extras.remove(pos);
            Ok(false)
        } else {
            extras.push(id);
            Ok(true)
        }
    }

    /// Live totals for the current selection.
    pub fn totals(&self, catalog: &Catalog, rate: Option<f64>) -> PriceBreakdown {
        let base = self
            .draft
            .service_id
            .and_then(|id| catalog.service(id))
            .map(|s| s.price);
        let extras: Vec<f64> = self
            .draft
            .extra_service_ids
            .iter()
            .filter_map(|id| catalog.extra(*id))
            .map(|e| e.price)
            .collect();
        pricing::quote(base, &extras, rate)
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && self.shows_details() && self.draft.validate().is_ok()
    }

    /// Freeze the form for a request; hands back the values to send.
    pub fn begin_submit(&mut self) -> Result<RegistrationDraft, FormError> {
        if self.submitting {
            return Err(FormError::InFlight);
        }
        if !self.shows_details() {
            return Err(FormError::NotReady);
        }
        self.draft.validate().map_err(FormError::Invalid)?;
        self.submitting = true;
        Ok(self.draft.clone())
    }

    pub fn finish_submit(&mut self, saved: bool) -> SubmitOutcome {
        self.submitting = false;
        if !saved {
            return SubmitOutcome::KeepEditing {
                message: "Could not save the record. Please try again.".to_string(),
            };
        }
        if self.mode == FormMode::Create {
            *self = Self::new();
        }
        SubmitOutcome::RefreshList
    }
}
