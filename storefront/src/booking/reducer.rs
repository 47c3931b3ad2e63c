//! Booking wizard reducer.
//!
//! `CustomerDetails → CycleDetails → Confirmation`. Each `Next` validates the
//! current step, then persists it remotely; the step only advances when the
//! request succeeds. A request in flight blocks further `Next`s.

use super::state::{BookingAction, BookingState, CustomerField, CycleDraft, CycleEdit, WizardStep};
use super::submission::build_order_form;
use crate::city_gate::{CityInfo, ServiceArea};
use crate::environment::{AppEnvironment, Backend, IdentityProvider};
use crate::request::request_effect;
use crate::validation::{sanitize_phone, sanitize_pincode, validate_customer, FieldErrors, Rule, Validator};
use cyclecare_core::effect::Effect;
use cyclecare_core::reducer::Reducer;
use cyclecare_core::{smallvec, SmallVec};
use std::marker::PhantomData;

const SIGN_IN_REQUIRED: &str = "Sign in to continue booking";

/// Cycle step rule set.
///
/// Terms and the at-least-one-booked check are reported independently of
/// the per-cycle fields.
#[must_use]
pub fn validate_cycles(state: &BookingState) -> FieldErrors {
    let mut validator = Validator::new();
    for (index, cycle) in state.cycles.iter().enumerate() {
        validator = validator
            .field(&format!("cycles[{index}].brand"), "Cycle name", &cycle.brand, &[Rule::Required])
            .selected(&format!("cycles[{index}].type"), "cycle type", cycle.cycle_type, |_| true);
    }
    validator
        .require(
            "cycles",
            state.cycles.iter().any(|c| c.order),
            "Select at least one cycle to service",
        )
        .require("terms", state.terms_accepted, "Accept the terms and conditions to continue")
        .finish()
}

/// Booking wizard reducer.
#[derive(Debug, Clone, Copy)]
pub struct BookingReducer<B, I> {
    _env: PhantomData<fn() -> (B, I)>,
}

impl<B, I> BookingReducer<B, I> {
    /// Create a new booking reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self { _env: PhantomData }
    }
}

impl<B, I> Default for BookingReducer<B, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, I> BookingReducer<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    fn apply_pincode(state: &mut BookingState) {
        if state.customer.pincode.len() < 6 {
            state.area_warning = None;
            return;
        }
        let check = state.area.check(&state.customer.pincode);
        state.area_warning = check.warning();
        if let Some(info) = check.city() {
            state.customer.city = Some(info.id);
            state.city_info = Some(info.clone());
        }
    }

    fn resolve_city(state: &mut BookingState) {
        state.city_info = state
            .customer
            .city
            .and_then(|id| state.area.city(id))
            .map(CityInfo::from);
    }

    fn fault(state: &mut BookingState, message: String) -> SmallVec<[Effect<BookingAction>; 4]> {
        tracing::error!(%message, "Booking wizard reached an unexpected state");
        state.fault = Some(message);
        smallvec![Effect::None]
    }

    fn next(state: &mut BookingState, env: &AppEnvironment<B, I>) -> SmallVec<[Effect<BookingAction>; 4]> {
        if state.submitting {
            tracing::debug!("Ignoring Next while a request is in flight");
            return smallvec![Effect::None];
        }

        match state.step {
            WizardStep::CustomerDetails => {
                let area = &state.area;
                state.errors = validate_customer(&state.customer, |id| area.contains(*id));
                if !state.errors.is_empty() {
                    return smallvec![Effect::None];
                }
                let Some(user_id) = state.user_id.clone() else {
                    state.error = Some(SIGN_IN_REQUIRED.to_string());
                    return smallvec![Effect::None];
                };

                state.submitting = true;
                state.error = None;
                let backend = env.backend.clone();
                let customer = state.customer.clone();
                smallvec![request_effect(
                    async move { backend.update_customer(&user_id, &customer).await },
                    BookingAction::CustomerSaved,
                    BookingAction::CustomerSaveFailed,
                )]
            },

            WizardStep::CycleDetails => {
                state.errors = validate_cycles(state);
                if !state.errors.is_empty() {
                    return smallvec![Effect::None];
                }
                let Some(user_id) = state.user_id.clone() else {
                    state.error = Some(SIGN_IN_REQUIRED.to_string());
                    return smallvec![Effect::None];
                };
                let form = match build_order_form(state, &user_id) {
                    Ok(form) => form,
                    Err(e) => return Self::fault(state, format!("Could not package the booking: {e}")),
                };

                tracing::info!(
                    cycles = state.cycles.len(),
                    images = form.files.len(),
                    "Submitting booking"
                );
                state.submitting = true;
                state.error = None;
                let backend = env.backend.clone();
                smallvec![request_effect(
                    async move { backend.create_order(form).await },
                    BookingAction::OrderCreated,
                    BookingAction::OrderFailed,
                )]
            },

            WizardStep::Confirmation => smallvec![Effect::None],
        }
    }
}

impl<B, I> Reducer for BookingReducer<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    type State = BookingState;
    type Action = BookingAction;
    type Environment = AppEnvironment<B, I>;

    #[allow(clippy::too_many_lines)] // Flat dispatch over every wizard input
    fn reduce(
        &self,
        state: &mut BookingState,
        action: BookingAction,
        env: &AppEnvironment<B, I>,
    ) -> SmallVec<[Effect<BookingAction>; 4]> {
        match action {
            BookingAction::Start { user, service } => {
                let area = std::mem::take(&mut state.area);
                *state = BookingState {
                    area,
                    service: service.clone(),
                    ..BookingState::default()
                };
                for cycle in &mut state.cycles {
                    cycle.service.clone_from(&service);
                }
                if let Some(user) = user {
                    state.user_id = Some(user.id);
                    match user.customer {
                        Some(customer) => state.customer = customer,
                        None => state.customer.phone = sanitize_phone(&user.phone),
                    }
                }
                Self::resolve_city(state);
                smallvec![Effect::None]
            },

            BookingAction::UseCities(cities) => {
                state.area = ServiceArea::from_cities(&cities);
                Self::resolve_city(state);
                smallvec![Effect::None]
            },

            BookingAction::SetField { field, value } => {
                let customer = &mut state.customer;
                match field {
                    CustomerField::FirstName => customer.first_name = value,
                    CustomerField::LastName => customer.last_name = value,
                    CustomerField::Email => customer.email = value,
                    CustomerField::Phone => customer.phone = sanitize_phone(&value),
                    CustomerField::AddressLine1 => customer.address_line1 = value,
                    CustomerField::AddressLine2 => customer.address_line2 = value,
                    CustomerField::Landmark => customer.landmark = value,
                    CustomerField::Pincode => customer.pincode = sanitize_pincode(&value),
                }
                state.errors.clear(field.key());
                if field == CustomerField::Pincode {
                    Self::apply_pincode(state);
                }
                smallvec![Effect::None]
            },

            BookingAction::SelectCity { id } => {
                state.customer.city = Some(id);
                state.errors.clear("city");
                Self::resolve_city(state);
                smallvec![Effect::None]
            },

            BookingAction::SetLocation { lat, lng } => {
                state.customer.lat = Some(lat);
                state.customer.lng = Some(lng);
                smallvec![Effect::None]
            },

            BookingAction::AddCycle => {
                state.cycles.push(CycleDraft {
                    service: state.service.clone(),
                    ..Default::default()
                });
                smallvec![Effect::None]
            },

            BookingAction::RemoveCycle { index } => {
                if index >= state.cycles.len() {
                    return Self::fault(state, format!("Cycle {} does not exist", index + 1));
                }
                state.cycles.remove(index);
                // Per-cycle error keys are positional
                state.errors = FieldErrors::new();
                smallvec![Effect::None]
            },

            BookingAction::EditCycle { index, edit } => {
                let Some(cycle) = state.cycles.get_mut(index) else {
                    return Self::fault(state, format!("Cycle {} does not exist", index + 1));
                };
                match edit {
                    CycleEdit::Brand(brand) => {
                        cycle.brand = brand;
                        state.errors.clear(&format!("cycles[{index}].brand"));
                    },
                    CycleEdit::Type(cycle_type) => {
                        cycle.cycle_type = Some(cycle_type);
                        state.errors.clear(&format!("cycles[{index}].type"));
                    },
                    CycleEdit::Service(service) => cycle.service = Some(service),
                    CycleEdit::Ordered(order) => {
                        cycle.order = order;
                        state.errors.clear("cycles");
                    },
                    CycleEdit::Image(image) => cycle.image = Some(image),
                }
                smallvec![Effect::None]
            },

            BookingAction::SetTermsAccepted(accepted) => {
                state.terms_accepted = accepted;
                if accepted {
                    state.errors.clear("terms");
                }
                smallvec![Effect::None]
            },

            BookingAction::Next => Self::next(state, env),

            BookingAction::Back => {
                if state.submitting {
                    return smallvec![Effect::None];
                }
                if let Some(previous) = state.step.previous() {
                    state.step = previous;
                    state.errors = FieldErrors::new();
                    state.error = None;
                }
                smallvec![Effect::None]
            },

            BookingAction::CustomerSaved(user) => {
                if !state.submitting || state.step != WizardStep::CustomerDetails {
                    tracing::debug!("Dropping customer save for a reset wizard");
                    return smallvec![Effect::None];
                }
                tracing::debug!(user_id = %user.id, "Customer details saved");
                state.submitting = false;
                state.step = WizardStep::CycleDetails;
                smallvec![Effect::None]
            },

            BookingAction::CustomerSaveFailed(failure) => {
                if !state.submitting || state.step != WizardStep::CustomerDetails {
                    tracing::debug!(error = %failure, "Dropping customer save failure for a reset wizard");
                    return smallvec![Effect::None];
                }
                state.submitting = false;
                state.error = Some(failure.message);
                smallvec![Effect::None]
            },

            BookingAction::OrderCreated(order) => {
                if !state.submitting || state.step != WizardStep::CycleDetails {
                    tracing::debug!(order_id = %order.id, "Dropping order result for a reset wizard");
                    return smallvec![Effect::None];
                }
                tracing::info!(order_id = %order.id, "Booking placed");
                state.submitting = false;
                state.step = WizardStep::Confirmation;
                state.created_order = Some(order.id);
                smallvec![Effect::None]
            },

            BookingAction::OrderFailed(failure) => {
                if !state.submitting || state.step != WizardStep::CycleDetails {
                    tracing::debug!(error = %failure, "Dropping order failure for a reset wizard");
                    return smallvec![Effect::None];
                }
                tracing::warn!(error = %failure, "Booking submission failed");
                state.submitting = false;
                state.error = Some(failure.message);
                smallvec![Effect::None]
            },

            BookingAction::Reset => {
                let area = std::mem::take(&mut state.area);
                *state = BookingState {
                    area,
                    ..BookingState::default()
                };
                smallvec![Effect::None]
            },
        }
    }
}
