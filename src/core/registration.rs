//! Registration business logic - public sign-up and the confirmation page.
//!
//! A registration is accepted for the current edition only while registration
//! is open and the edition is below capacity. Answers are checked against the
//! edition's form fields.

use crate::{
    core::{
        collection::load_items,
        payload::{FieldType, FormFieldPayload},
        settings::get_settings,
    },
    entities::{ContentKind, Registration, registration},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};
use uuid::Uuid;

/// Form submitted by a participant
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    /// Participant name
    pub full_name: String,
    /// Participant email
    pub email: String,
    /// Answers keyed by form field label
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

/// What the confirmation page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationConfirmation {
    /// Code identifying the registration
    pub confirmation_code: String,
    /// Edition registered for
    pub year: i32,
    /// Participant name
    pub full_name: String,
    /// Participant email
    pub email: String,
    /// Event name
    pub event_name: String,
    /// Event start
    pub event_date: DateTime<Utc>,
    /// Fee to pay
    pub price: f64,
    /// How to pay
    pub payment_method: String,
    /// Payment instructions
    pub payment_details: String,
}

impl From<registration::Model> for RegistrationConfirmation {
    fn from(registration: registration::Model) -> Self {
        Self {
            confirmation_code: registration.confirmation_code,
            year: registration.year,
            full_name: registration.full_name,
            email: registration.email,
            event_name: registration.event_name,
            event_date: registration.event_date,
            price: registration.price,
            payment_method: registration.payment_method,
            payment_details: registration.payment_details,
        }
    }
}

fn reject(reason: impl Into<String>) -> Error {
    Error::RegistrationRejected {
        reason: reason.into(),
    }
}

fn is_plausible_email(email: &str) -> bool {
    email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    })
}

fn check_answers(
    fields: &[FormFieldPayload],
    answers: &BTreeMap<String, String>,
) -> Result<()> {
    for field in fields {
        let answer = answers
            .get(&field.label)
            .map(|a| a.trim())
            .filter(|a| !a.is_empty());
        match answer {
            None if field.required => {
                return Err(reject(format!("'{}' is required", field.label)));
            }
            Some(value) if field.field_type == FieldType::Select => {
                if !field.options.iter().any(|option| option == value) {
                    return Err(reject(format!(
                        "'{value}' is not a valid choice for '{}'",
                        field.label
                    )));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn new_confirmation_code() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_uppercase()
}

/// Number of registrations for `year`.
pub async fn count_for_year<C>(db: &C, year: i32) -> Result<u64>
where
    C: ConnectionTrait,
{
    Registration::find()
        .filter(registration::Column::Year.eq(year))
        .count(db)
        .await
        .map_err(Into::into)
}

/// All registrations for `year`, oldest first.
pub async fn list_for_year<C>(db: &C, year: i32) -> Result<Vec<registration::Model>>
where
    C: ConnectionTrait,
{
    Registration::find()
        .filter(registration::Column::Year.eq(year))
        .order_by_asc(registration::Column::CreatedAt)
        .order_by_asc(registration::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Registers a participant for the current edition.
///
/// # Errors
/// Returns `Error::RegistrationRejected` when registration is closed, the
/// edition is full, the name or email is missing, or a form answer is missing
/// or invalid
#[instrument(skip(db, form), fields(email = %form.email))]
pub async fn submit_registration(
    db: &DatabaseConnection,
    form: RegistrationForm,
) -> Result<RegistrationConfirmation> {
    let full_name = form.full_name.trim().to_string();
    let email = form.email.trim().to_lowercase();
    if full_name.is_empty() {
        return Err(reject("Name is required"));
    }
    if !is_plausible_email(&email) {
        return Err(reject(format!("'{email}' is not a valid email address")));
    }

    let txn = db.begin().await?;

    let settings = get_settings(&txn).await?;
    if !settings.registration_open {
        return Err(reject("Registration is closed"));
    }
    let year = settings.current_year;

    let taken = count_for_year(&txn, year).await?;
    if taken >= u64::try_from(settings.capacity).unwrap_or(0) {
        return Err(reject(format!(
            "Edition {year} is full ({} places)",
            settings.capacity
        )));
    }

    let fields = load_items(&txn, year, ContentKind::FormField)
        .await?
        .into_iter()
        .map(|model| serde_json::from_value::<FormFieldPayload>(model.payload))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    check_answers(&fields, &form.answers)?;

    let saved = registration::ActiveModel {
        year: Set(year),
        confirmation_code: Set(new_confirmation_code()),
        full_name: Set(full_name),
        email: Set(email),
        answers: Set(serde_json::to_value(&form.answers)?),
        event_name: Set(settings.event_name.clone()),
        event_date: Set(settings.event_date),
        price: Set(settings.price),
        payment_method: Set(settings.payment_method.clone()),
        payment_details: Set(settings.payment_details.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        "Registration {} accepted for {year} ({} of {})",
        saved.confirmation_code,
        taken + 1,
        settings.capacity
    );
    Ok(saved.into())
}

/// Looks up the confirmation for `code`, with the terms stored at submission.
///
/// # Errors
/// Returns `Error::ItemNotFound` if no registration has this code
pub async fn find_by_code<C>(db: &C, code: &str) -> Result<RegistrationConfirmation>
where
    C: ConnectionTrait,
{
    let registration = Registration::find()
        .filter(registration::Column::ConfirmationCode.eq(code.trim().to_uppercase()))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("registration", code))?;
    Ok(registration.into())
}
